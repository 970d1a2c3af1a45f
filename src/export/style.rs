//! Cell Style Module
//!
//! セルの内容と位置から表示スタイルを決定するモジュール。
//! `(判定関数, スタイル)`の規則表を上から順に評価し、最初に一致した規則を採用します。

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder};

use super::grid::GridRow;
use super::layout::{COLUMN_HEADERS, DESCRIPTION_LABEL, TITLE};

const BODY_FONT: &str = "Arial";
const STEP_FONT: &str = "Consolas";

/// バナーの配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerColor {
    /// テスト手順（ティール）
    Instructions,
    /// Rule見出し（紫）
    Rule,
    /// Feature Background（オレンジ）
    Background,
    /// その他のセクション（スレート）
    Section,
}

impl BannerColor {
    /// 見出し文字列から配色を決定（先に一致したキーワードを優先）
    pub fn classify(text: &str) -> Self {
        if text.contains("TESTING INSTRUCTIONS") {
            BannerColor::Instructions
        } else if text.contains("RULE") {
            BannerColor::Rule
        } else if text.contains("FEATURE BACKGROUND") {
            BannerColor::Background
        } else {
            BannerColor::Section
        }
    }

    pub fn rgb(&self) -> u32 {
        match self {
            BannerColor::Instructions => 0x16A085,
            BannerColor::Rule => 0x8E44AD,
            BannerColor::Background => 0xE67E22,
            BannerColor::Section => 0x34495E,
        }
    }
}

/// ステップ行の配色区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepClass {
    Given,
    When,
    Then,
    /// And / But / `*`
    Continuation,
}

impl StepClass {
    /// (文字色, 背景色, 罫線色)
    fn colors(&self) -> (u32, u32, u32) {
        match self {
            StepClass::Given => (0x2E86AB, 0xEBF5FB, 0xD6EAF8),
            StepClass::When => (0x229954, 0xEAFAF1, 0xD5F4E6),
            StepClass::Then => (0xD68910, 0xFEF5E7, 0xFCF3CF),
            StepClass::Continuation => (0x7D3C98, 0xF4ECF7, 0xE8DAEF),
        }
    }
}

/// セルの表示スタイル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CellStyle {
    Title,
    HeaderLabel,
    HeaderValue,
    DescriptionLabel,
    DescriptionBody,
    Banner(BannerColor),
    Note,
    Tags,
    ScenarioBanner,
    ColumnHeader,
    Step(StepClass),
    NotesBanner,
    CaptureLabel,
    Bullet,
    CheckCell,
    NotesCell,
    /// 書式なし
    Plain,
}

/// 規則の判定に使うセル情報
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub row: u32,
    pub col: u16,
    pub value: &'a str,
    /// 直前の行（先頭行では`None`）
    pub previous: Option<&'a GridRow>,
}

type Predicate = fn(&CellContext<'_>) -> bool;

/// スタイル規則表（評価順）
const STYLE_RULES: &[(Predicate, CellStyle)] = &[
    (is_title, CellStyle::Title),
    (is_header_label, CellStyle::HeaderLabel),
    (is_header_value, CellStyle::HeaderValue),
    (is_description_label, CellStyle::DescriptionLabel),
    (is_description_body, CellStyle::DescriptionBody),
    (
        is_instructions_banner,
        CellStyle::Banner(BannerColor::Instructions),
    ),
    (is_rule_banner, CellStyle::Banner(BannerColor::Rule)),
    (
        is_background_banner,
        CellStyle::Banner(BannerColor::Background),
    ),
    (is_banner, CellStyle::Banner(BannerColor::Section)),
    (is_note, CellStyle::Note),
    (is_tags, CellStyle::Tags),
    (is_scenario_banner, CellStyle::ScenarioBanner),
    (is_column_header, CellStyle::ColumnHeader),
    (is_given_step, CellStyle::Step(StepClass::Given)),
    (is_when_step, CellStyle::Step(StepClass::When)),
    (is_then_step, CellStyle::Step(StepClass::Then)),
    (is_continuation_step, CellStyle::Step(StepClass::Continuation)),
    (is_notes_banner, CellStyle::NotesBanner),
    (is_capture_label, CellStyle::CaptureLabel),
    (is_bullet, CellStyle::Bullet),
    (is_check_cell, CellStyle::CheckCell),
    (is_notes_cell, CellStyle::NotesCell),
];

/// セルのスタイルを決定する
pub fn classify(cell: &CellContext<'_>) -> CellStyle {
    STYLE_RULES
        .iter()
        .find(|(matches, _)| matches(cell))
        .map(|(_, style)| *style)
        .unwrap_or(CellStyle::Plain)
}

fn is_header_row(cell: &CellContext<'_>) -> bool {
    (2..=5).contains(&cell.row)
}

fn is_title(cell: &CellContext<'_>) -> bool {
    cell.row == 0 && cell.value == TITLE
}

fn is_header_label(cell: &CellContext<'_>) -> bool {
    is_header_row(cell) && cell.col == 0
}

fn is_header_value(cell: &CellContext<'_>) -> bool {
    is_header_row(cell) && cell.col == 1
}

fn is_description_label(cell: &CellContext<'_>) -> bool {
    cell.col == 0 && cell.value == DESCRIPTION_LABEL
}

fn is_description_body(cell: &CellContext<'_>) -> bool {
    cell.col == 0
        && cell
            .previous
            .is_some_and(|previous| previous[0] == DESCRIPTION_LABEL)
}

fn is_banner(cell: &CellContext<'_>) -> bool {
    cell.value.contains("═══")
}

fn is_instructions_banner(cell: &CellContext<'_>) -> bool {
    is_banner(cell) && BannerColor::classify(cell.value) == BannerColor::Instructions
}

fn is_rule_banner(cell: &CellContext<'_>) -> bool {
    is_banner(cell) && BannerColor::classify(cell.value) == BannerColor::Rule
}

fn is_background_banner(cell: &CellContext<'_>) -> bool {
    is_banner(cell) && BannerColor::classify(cell.value) == BannerColor::Background
}

fn is_note(cell: &CellContext<'_>) -> bool {
    cell.col == 0 && cell.value.starts_with("These steps apply")
}

fn is_tags(cell: &CellContext<'_>) -> bool {
    cell.value.starts_with("Tags: @")
}

fn is_scenario_banner(cell: &CellContext<'_>) -> bool {
    cell.col == 0 && cell.value.starts_with("▸ ")
}

fn is_column_header(cell: &CellContext<'_>) -> bool {
    COLUMN_HEADERS.contains(&cell.value)
}

fn is_given_step(cell: &CellContext<'_>) -> bool {
    cell.value.starts_with("Given ")
}

fn is_when_step(cell: &CellContext<'_>) -> bool {
    cell.value.starts_with("When ")
}

fn is_then_step(cell: &CellContext<'_>) -> bool {
    cell.value.starts_with("Then ")
}

fn is_continuation_step(cell: &CellContext<'_>) -> bool {
    ["And ", "But ", "* "]
        .iter()
        .any(|marker| cell.value.starts_with(marker))
}

fn is_notes_banner(cell: &CellContext<'_>) -> bool {
    cell.value == "SCENARIO NOTES"
}

fn is_capture_label(cell: &CellContext<'_>) -> bool {
    const FIELDS: [&str; 4] = ["Status", "Tester Name", "Test Date", "Additional Comments"];
    cell.col == 0
        && FIELDS.iter().any(|field| {
            cell.value
                .strip_prefix(field)
                .is_some_and(|rest| rest.starts_with(':') || rest.starts_with(" ("))
        })
}

fn is_bullet(cell: &CellContext<'_>) -> bool {
    cell.col == 0 && cell.value.starts_with('•')
}

fn is_check_cell(cell: &CellContext<'_>) -> bool {
    (cell.col == 1 || cell.col == 2) && cell.value.is_empty()
}

fn is_notes_cell(cell: &CellContext<'_>) -> bool {
    cell.col == 3 && cell.value.is_empty()
}

impl CellStyle {
    /// rust_xlsxwriterの書式に変換（`Plain`は`None`）
    pub fn to_format(&self) -> Option<Format> {
        let format = match self {
            CellStyle::Plain => return None,
            CellStyle::Title => text(16.0, BODY_FONT)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x2C3E50))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::HeaderLabel => text(11.0, BODY_FONT)
                .set_bold()
                .set_background_color(Color::RGB(0xECF0F1))
                .set_align(FormatAlign::Right)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::HeaderValue => text(10.0, BODY_FONT)
                .set_background_color(Color::White)
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap()
                .set_border(FormatBorder::Thin)
                .set_border_color(Color::RGB(0xBDC3C7)),
            CellStyle::DescriptionLabel => text(10.0, BODY_FONT)
                .set_bold()
                .set_background_color(Color::RGB(0xECF0F1))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::DescriptionBody => text(10.0, BODY_FONT)
                .set_italic()
                .set_background_color(Color::RGB(0xFDFEFE))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::Top)
                .set_text_wrap()
                .set_border_top(FormatBorder::Thin)
                .set_border_top_color(Color::RGB(0xD5DBDB))
                .set_border_bottom(FormatBorder::Thin)
                .set_border_bottom_color(Color::RGB(0xD5DBDB)),
            CellStyle::Banner(color) => text(12.0, BODY_FONT)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(color.rgb()))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::Note => text(9.0, BODY_FONT)
                .set_italic()
                .set_font_color(Color::RGB(0x7F8C8D))
                .set_background_color(Color::RGB(0xF8F9F9))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::Tags => text(9.0, BODY_FONT)
                .set_italic()
                .set_font_color(Color::RGB(0x95A5A6))
                .set_background_color(Color::RGB(0xFAFAFA))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::ScenarioBanner => text(11.0, BODY_FONT)
                .set_bold()
                .set_font_color(Color::RGB(0x2C3E50))
                .set_background_color(Color::RGB(0xD6DBDF))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::ColumnHeader => text(10.0, BODY_FONT)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x34495E))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border_top(FormatBorder::Medium)
                .set_border_top_color(Color::RGB(0x2C3E50))
                .set_border_bottom(FormatBorder::Medium)
                .set_border_bottom_color(Color::RGB(0x2C3E50)),
            CellStyle::Step(class) => {
                let (font, fill, border) = class.colors();
                text(10.0, STEP_FONT)
                    .set_bold()
                    .set_font_color(Color::RGB(font))
                    .set_background_color(Color::RGB(fill))
                    .set_align(FormatAlign::Left)
                    .set_align(FormatAlign::Top)
                    .set_text_wrap()
                    .set_border(FormatBorder::Thin)
                    .set_border_color(Color::RGB(border))
            }
            CellStyle::NotesBanner => text(11.0, BODY_FONT)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0xD68910))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::CaptureLabel => text(10.0, BODY_FONT)
                .set_bold()
                .set_background_color(Color::RGB(0xFEF9E7))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            CellStyle::Bullet => text(10.0, BODY_FONT)
                .set_background_color(Color::RGB(0xEBF5FB))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            CellStyle::CheckCell => Format::new()
                .set_background_color(Color::White)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(Color::RGB(0xE5E8E8)),
            CellStyle::NotesCell => Format::new()
                .set_background_color(Color::RGB(0xF8F9F9))
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::Top)
                .set_text_wrap()
                .set_border(FormatBorder::Thin)
                .set_border_color(Color::RGB(0xE5E8E8)),
        };
        Some(format)
    }
}

fn text(size: f64, font: &str) -> Format {
    Format::new().set_font_name(font).set_font_size(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u16, value: &str) -> CellStyle {
        classify(&CellContext {
            row,
            col,
            value,
            previous: None,
        })
    }

    #[test]
    fn test_banner_color_priority() {
        assert_eq!(
            BannerColor::classify("═══ TESTING INSTRUCTIONS ═══"),
            BannerColor::Instructions
        );
        assert_eq!(
            BannerColor::classify("═══ RULE 2: Lockout ═══"),
            BannerColor::Rule
        );
        assert_eq!(
            BannerColor::classify("═══ FEATURE BACKGROUND ═══"),
            BannerColor::Background
        );
        // "RULES"も"RULE"を含むため紫になる
        assert_eq!(
            BannerColor::classify("═══ SCENARIOS (NOT IN RULES) ═══"),
            BannerColor::Rule
        );
        assert_eq!(BannerColor::classify("═══ OTHER ═══"), BannerColor::Section);
    }

    #[test]
    fn test_header_positions_take_priority() {
        assert_eq!(cell(0, 0, TITLE), CellStyle::Title);
        // ヘッダー行の「Test Date:」はキャプチャ欄ではなくラベル
        assert_eq!(cell(3, 0, "Test Date:"), CellStyle::HeaderLabel);
        assert_eq!(cell(3, 1, "October 19, 2026"), CellStyle::HeaderValue);
        assert_eq!(cell(40, 0, "Test Date:"), CellStyle::CaptureLabel);
    }

    #[test]
    fn test_step_classes() {
        assert_eq!(cell(20, 0, "Given a"), CellStyle::Step(StepClass::Given));
        assert_eq!(cell(20, 0, "When b"), CellStyle::Step(StepClass::When));
        assert_eq!(cell(20, 0, "Then c"), CellStyle::Step(StepClass::Then));
        assert_eq!(
            cell(20, 0, "And d"),
            CellStyle::Step(StepClass::Continuation)
        );
        assert_eq!(
            cell(20, 0, "But e"),
            CellStyle::Step(StepClass::Continuation)
        );
    }

    #[test]
    fn test_content_rules() {
        assert_eq!(cell(9, 0, "Description:"), CellStyle::DescriptionLabel);
        assert_eq!(
            cell(12, 0, "These steps apply to all scenarios below"),
            CellStyle::Note
        );
        assert_eq!(cell(15, 0, "Tags: @smoke"), CellStyle::Tags);
        assert_eq!(cell(16, 0, "▸ Scenario 1: ok"), CellStyle::ScenarioBanner);
        assert_eq!(cell(18, 2, "Fail"), CellStyle::ColumnHeader);
        assert_eq!(cell(30, 0, "SCENARIO NOTES"), CellStyle::NotesBanner);
        assert_eq!(cell(31, 0, "Status (Pass/Fail):"), CellStyle::CaptureLabel);
        assert_eq!(
            cell(50, 0, "• Add observations or issues in the Notes column"),
            CellStyle::Bullet
        );
    }

    #[test]
    fn test_empty_cells() {
        assert_eq!(cell(20, 1, ""), CellStyle::CheckCell);
        assert_eq!(cell(20, 2, ""), CellStyle::CheckCell);
        assert_eq!(cell(20, 3, ""), CellStyle::NotesCell);
        assert_eq!(cell(20, 0, ""), CellStyle::Plain);
        assert_eq!(cell(20, 0, "free text"), CellStyle::Plain);
    }

    #[test]
    fn test_description_body_uses_previous_row() {
        let previous: GridRow = [
            DESCRIPTION_LABEL.to_string(),
            String::new(),
            String::new(),
            String::new(),
        ];
        let style = classify(&CellContext {
            row: 8,
            col: 0,
            value: "Given it looks like a step",
            previous: Some(&previous),
        });
        assert_eq!(style, CellStyle::DescriptionBody);
    }

    #[test]
    fn test_plain_has_no_format() {
        assert!(CellStyle::Plain.to_format().is_none());
        assert!(CellStyle::Title.to_format().is_some());
        assert!(CellStyle::Step(StepClass::Then).to_format().is_some());
    }
}
