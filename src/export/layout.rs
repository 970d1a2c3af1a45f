//! Layout Module
//!
//! 正規化済みドキュメントを手動テスト記録シートの行構成に変換します。
//! 行は上から順に一度だけ追加され、座標の後処理は行いません。

use chrono::NaiveDate;

use super::grid::{ExportGrid, GridBuilder};
use crate::api::DateFormat;
use crate::document::{Background, Document, Rule, Scenario, Step};

pub(crate) const TITLE: &str = "MANUAL TEST FEATURE RECORD";
pub(crate) const DESCRIPTION_LABEL: &str = "Description:";
pub(crate) const FEATURE_BACKGROUND_BANNER: &str = "═══ FEATURE BACKGROUND ═══";
pub(crate) const FEATURE_BACKGROUND_NOTE: &str = "These steps apply to all scenarios below";
pub(crate) const RULE_BACKGROUND_NOTE: &str = "These steps apply to all scenarios in this rule";
pub(crate) const SCENARIOS_BANNER: &str = "═══ SCENARIOS (NOT IN RULES) ═══";
pub(crate) const INSTRUCTIONS_BANNER: &str = "═══ TESTING INSTRUCTIONS ═══";
pub(crate) const SCENARIO_NOTES: &str = "SCENARIO NOTES";
pub(crate) const COLUMN_HEADERS: [&str; 4] = ["Step", "Pass", "Fail", "Notes"];

pub(crate) const HEADER_LABELS: [&str; 4] =
    ["Feature Name:", "Test Date:", "Feature Link:", "Feature Tags:"];

pub(crate) const CAPTURE_LABELS: [&str; 4] = [
    "Status (Pass/Fail):",
    "Tester Name:",
    "Test Date:",
    "Additional Comments:",
];

pub(crate) const INSTRUCTIONS: [&str; 4] = [
    "• Check Pass or Fail checkbox for each step as you test",
    "• Add observations or issues in the Notes column",
    "• Fill out Scenario Notes section after each scenario",
    "• Color coding: Blue=Given (setup), Green=When (action), Orange=Then (verify), Purple=And/But",
];

/// シナリオ見出しの採番
#[derive(Debug, Clone, Copy)]
enum ScenarioLabel {
    InRule { rule: usize, scenario: usize },
    TopLevel { scenario: usize },
}

impl ScenarioLabel {
    fn text(&self) -> String {
        match self {
            ScenarioLabel::InRule { rule, scenario } => {
                format!("Rule {} - Scenario {}", rule, scenario)
            }
            ScenarioLabel::TopLevel { scenario } => format!("Scenario {}", scenario),
        }
    }
}

/// ドキュメントからエクスポートグリッドを生成する
///
/// # 引数
///
/// * `document` - 正規化済みドキュメント
/// * `url` - 「Feature Link」欄に表示するURL
/// * `generated_on` - 「Test Date」欄に表示する生成日
/// * `date_format` - 生成日の表示形式
pub fn build_grid(
    document: &Document,
    url: &str,
    generated_on: NaiveDate,
    date_format: &DateFormat,
) -> ExportGrid {
    let mut builder = GridBuilder::new();

    push_header(&mut builder, document, url, &date_format.format(generated_on));

    if !document.description.is_empty() {
        builder.push_banner(DESCRIPTION_LABEL);
        builder.push_banner(document.description.as_str());
        builder.push_blank();
    }

    if let Some(background) = &document.background {
        push_background(
            &mut builder,
            FEATURE_BACKGROUND_BANNER.to_string(),
            FEATURE_BACKGROUND_NOTE,
            background,
        );
    }

    for (idx, rule) in document.rules.iter().enumerate() {
        push_rule(&mut builder, rule, idx + 1);
    }

    if !document.scenarios.is_empty() {
        builder.push_blank();
        builder.push_banner(SCENARIOS_BANNER);
        builder.push_blank();
        for (idx, scenario) in document.scenarios.iter().enumerate() {
            push_scenario(
                &mut builder,
                scenario,
                ScenarioLabel::TopLevel { scenario: idx + 1 },
            );
        }
    }

    builder.push_blank();
    builder.push_banner(INSTRUCTIONS_BANNER);
    for bullet in INSTRUCTIONS {
        builder.push_banner(bullet);
    }

    builder.finish(generated_on)
}

/// タイトルと4つのラベル行からなるヘッダーブロック
fn push_header(builder: &mut GridBuilder, document: &Document, url: &str, date: &str) {
    builder.push_banner(TITLE);
    builder.push_blank();

    let values = [
        document.name.clone(),
        date.to_string(),
        url.to_string(),
        format_tags(&document.tags),
    ];
    for (label, value) in HEADER_LABELS.into_iter().zip(values) {
        builder.push_labeled(label, value);
    }

    builder.push_blank();
}

fn push_background(builder: &mut GridBuilder, banner: String, note: &str, background: &Background) {
    builder.push_banner(banner);
    builder.push_banner(note);
    builder.push_blank();
    for step in &background.steps {
        builder.push_text(step_text(step));
    }
    builder.push_blank();
}

fn push_rule(builder: &mut GridBuilder, rule: &Rule, number: usize) {
    builder.push_blank();
    builder.push_banner(format!("═══ RULE {}: {} ═══", number, rule.name));

    if !rule.description.is_empty() {
        builder.push_banner(rule.description.as_str());
    }
    if !rule.tags.is_empty() {
        builder.push_banner(format!("Tags: {}", format_tags(&rule.tags)));
    }
    builder.push_blank();

    if let Some(background) = &rule.background {
        push_background(
            builder,
            format!("═══ RULE {} BACKGROUND ═══", number),
            RULE_BACKGROUND_NOTE,
            background,
        );
    }

    for (idx, scenario) in rule.scenarios.iter().enumerate() {
        push_scenario(
            builder,
            scenario,
            ScenarioLabel::InRule {
                rule: number,
                scenario: idx + 1,
            },
        );
    }
}

fn push_scenario(builder: &mut GridBuilder, scenario: &Scenario, label: ScenarioLabel) {
    builder.push_blank();
    builder.push_banner(format!("▸ {}: {}", label.text(), scenario.name));
    if !scenario.tags.is_empty() {
        builder.push_banner(format!("Tags: {}", format_tags(&scenario.tags)));
    }
    builder.push_blank();

    builder.push_row(COLUMN_HEADERS.map(String::from));
    for step in &scenario.steps {
        builder.push_text(step_text(step));
    }

    builder.push_blank();
    builder.push_banner(SCENARIO_NOTES);
    for label in CAPTURE_LABELS {
        builder.push_banner(label);
    }
    builder.push_blank();
}

fn step_text(step: &Step) -> String {
    step.line()
}

/// `@a, @b`形式に整形
fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("@{}", tag))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellCoord, CellRange};
    use crate::export::grid::GridRow;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn step(keyword: &str, text: &str) -> Step {
        Step {
            keyword: keyword.to_string(),
            text: text.to_string(),
            doc_string: None,
            data_table: None,
        }
    }

    fn scenario(name: &str, steps: Vec<Step>) -> Scenario {
        Scenario {
            id: name.to_string(),
            name: name.to_string(),
            tags: vec![],
            steps,
            examples: None,
        }
    }

    fn document() -> Document {
        Document {
            id: "login".to_string(),
            name: "User Login".to_string(),
            description: String::new(),
            tags: vec![],
            language: "en".to_string(),
            background: None,
            rules: vec![],
            scenarios: vec![],
        }
    }

    fn column_a(grid: &ExportGrid) -> Vec<&str> {
        grid.rows().iter().map(|row| row[0].as_str()).collect()
    }

    #[test]
    fn test_header_block() {
        let mut doc = document();
        doc.tags = vec!["auth".to_string(), "smoke".to_string()];
        let grid = build_grid(&doc, "https://example.com/login", date(), &DateFormat::Long);
        let rows = grid.rows();

        assert_eq!(rows[0][0], TITLE);
        assert_eq!(rows[1], GridRow::default());
        assert_eq!(rows[2][0], "Feature Name:");
        assert_eq!(rows[2][1], "User Login");
        assert_eq!(rows[3][1], "October 19, 2026");
        assert_eq!(rows[4][1], "https://example.com/login");
        assert_eq!(rows[5][1], "@auth, @smoke");

        assert_eq!(grid.merges()[0], CellRange::row_span(0, 0, 3));
        for (idx, row) in (2..=5).enumerate() {
            assert_eq!(grid.merges()[idx + 1], CellRange::row_span(row, 1, 3));
        }
    }

    #[test]
    fn test_rule_scenario_sequence() {
        let mut doc = document();
        doc.rules.push(Rule {
            id: "r".to_string(),
            name: "Valid credentials".to_string(),
            description: String::new(),
            tags: vec![],
            background: None,
            scenarios: vec![scenario(
                "Successful login",
                vec![step("Given", "a user"), step("Then", "result")],
            )],
        });
        let grid = build_grid(&doc, "", date(), &DateFormat::Long);
        let column = column_a(&grid);

        let start = column
            .iter()
            .position(|text| *text == "═══ RULE 1: Valid credentials ═══")
            .unwrap();
        let banner = start
            + column[start..]
                .iter()
                .position(|text| text.starts_with('▸'))
                .unwrap();
        assert_eq!(column[banner], "▸ Rule 1 - Scenario 1: Successful login");

        let header = banner + 2;
        assert_eq!(
            grid.rows()[header],
            ["Step", "Pass", "Fail", "Notes"].map(String::from)
        );
        assert_eq!(column[header + 1], "Given a user");
        assert_eq!(column[header + 2], "Then result");
        assert_eq!(column[header + 3], "");
        assert_eq!(column[header + 4], SCENARIO_NOTES);
        assert_eq!(&column[header + 5..header + 9], &CAPTURE_LABELS);

        // ステップ行だけがチェックボックス対象
        assert_eq!(
            grid.step_rows(),
            vec![(header + 1) as u32, (header + 2) as u32]
        );
    }

    #[test]
    fn test_background_rows_get_checkboxes() {
        let mut doc = document();
        doc.background = Some(Background {
            name: "Background".to_string(),
            steps: vec![step("Given", "the app is running")],
        });
        let grid = build_grid(&doc, "", date(), &DateFormat::Long);
        let column = column_a(&grid);

        let banner = column
            .iter()
            .position(|text| *text == FEATURE_BACKGROUND_BANNER)
            .unwrap();
        assert_eq!(column[banner + 1], FEATURE_BACKGROUND_NOTE);
        assert_eq!(column[banner + 3], "Given the app is running");

        // Backgroundのステップ行もチェックボックス対象になる（既知の挙動）
        let row = (banner + 3) as u32;
        assert!(grid.checkboxes().contains(&CellCoord::new(row, 1)));
        assert!(grid.checkboxes().contains(&CellCoord::new(row, 2)));
    }

    #[test]
    fn test_rule_details_and_background() {
        let mut doc = document();
        doc.rules.push(Rule {
            id: "r".to_string(),
            name: "Lockout".to_string(),
            description: "After five failures".to_string(),
            tags: vec!["security".to_string()],
            background: Some(Background {
                name: "Background".to_string(),
                steps: vec![step("Given", "a locked account")],
            }),
            scenarios: vec![],
        });
        let grid = build_grid(&doc, "", date(), &DateFormat::Long);
        let column = column_a(&grid);

        let start = column
            .iter()
            .position(|text| *text == "═══ RULE 1: Lockout ═══")
            .unwrap();
        assert_eq!(column[start + 1], "After five failures");
        assert_eq!(column[start + 2], "Tags: @security");
        assert_eq!(column[start + 3], "");
        assert_eq!(column[start + 4], "═══ RULE 1 BACKGROUND ═══");
        assert_eq!(column[start + 5], RULE_BACKGROUND_NOTE);
        assert_eq!(column[start + 7], "Given a locked account");

        for offset in [0, 1, 2, 4, 5] {
            let row = (start + offset) as u32;
            assert!(grid.merges().contains(&CellRange::row_span(row, 0, 3)));
        }
    }

    #[test]
    fn test_top_level_scenarios_and_instructions() {
        let mut doc = document();
        doc.scenarios = vec![
            scenario("first", vec![step("When", "x")]),
            scenario("second", vec![]),
        ];
        doc.scenarios[1].tags = vec!["wip".to_string()];
        let grid = build_grid(&doc, "", date(), &DateFormat::Long);
        let column = column_a(&grid);

        assert!(column.contains(&SCENARIOS_BANNER));
        assert!(column.contains(&"▸ Scenario 1: first"));
        assert!(column.contains(&"▸ Scenario 2: second"));
        assert!(column.contains(&"Tags: @wip"));

        let last = column.len();
        assert_eq!(column[last - 5], INSTRUCTIONS_BANNER);
        assert_eq!(&column[last - 4..], &INSTRUCTIONS);
    }

    #[test]
    fn test_description_block() {
        let mut doc = document();
        doc.description = "Covers sign-in".to_string();
        let grid = build_grid(&doc, "", date(), &DateFormat::Iso8601);
        let column = column_a(&grid);

        assert_eq!(column[7], DESCRIPTION_LABEL);
        assert_eq!(column[8], "Covers sign-in");
        assert_eq!(column[9], "");
        assert_eq!(grid.rows()[3][1], "2026-10-19");
    }

    #[test]
    fn test_empty_document_has_no_step_rows() {
        let grid = build_grid(&document(), "", date(), &DateFormat::Long);
        assert!(grid.checkboxes().is_empty());
        assert!(!column_a(&grid).contains(&SCENARIOS_BANNER));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_step() -> impl Strategy<Value = Step> {
            (
                prop::sample::select(vec!["Given", "When", "Then", "And", "But"]),
                "[a-z ]{0,10}",
            )
                .prop_map(|(keyword, text)| step(keyword, &text))
        }

        fn arb_scenario() -> impl Strategy<Value = Scenario> {
            (
                "[a-z]{1,6}",
                prop::collection::vec("[a-z]{1,4}", 0..3),
                prop::collection::vec(arb_step(), 0..5),
            )
                .prop_map(|(name, tags, steps)| {
                    let mut scenario = scenario(&name, steps);
                    scenario.tags = tags;
                    scenario
                })
        }

        fn arb_background() -> impl Strategy<Value = Option<Background>> {
            prop::option::of(prop::collection::vec(arb_step(), 0..3).prop_map(|steps| {
                Background {
                    name: "Background".to_string(),
                    steps,
                }
            }))
        }

        fn arb_rule() -> impl Strategy<Value = Rule> {
            (
                "[a-z]{1,6}",
                "[a-z ]{0,8}",
                arb_background(),
                prop::collection::vec(arb_scenario(), 0..3),
            )
                .prop_map(|(name, description, background, scenarios)| Rule {
                    id: name.clone(),
                    name,
                    description,
                    tags: vec![],
                    background,
                    scenarios,
                })
        }

        fn arb_document() -> impl Strategy<Value = Document> {
            (
                "[a-z ]{0,8}",
                arb_background(),
                prop::collection::vec(arb_rule(), 0..3),
                prop::collection::vec(arb_scenario(), 0..3),
            )
                .prop_map(|(description, background, rules, scenarios)| {
                    let mut doc = document();
                    doc.description = description;
                    doc.background = background;
                    doc.rules = rules;
                    doc.scenarios = scenarios;
                    doc
                })
        }

        proptest! {
            #[test]
            fn test_export_is_deterministic(doc in arb_document(), day in 1u32..28) {
                let first = build_grid(&doc, "url", date(), &DateFormat::Long);
                let other_day = NaiveDate::from_ymd_opt(2025, 2, day).unwrap();
                let second = build_grid(&doc, "url", other_day, &DateFormat::Long);

                // 日付欄（行3）以外は一致する
                let strip = |grid: &ExportGrid| {
                    let mut rows = grid.rows().to_vec();
                    rows[3][1].clear();
                    rows
                };
                prop_assert_eq!(strip(&first), strip(&second));
                prop_assert_eq!(first.merges(), second.merges());
                prop_assert_eq!(first.checkboxes(), second.checkboxes());
            }

            #[test]
            fn test_merges_within_grid(doc in arb_document()) {
                let grid = build_grid(&doc, "url", date(), &DateFormat::Long);
                for range in grid.merges() {
                    prop_assert!((range.end.row as usize) < grid.row_count());
                    prop_assert!(range.start.row <= range.end.row);
                    prop_assert!(range.start.col <= range.end.col);
                    prop_assert!(range.end.col <= 3);
                }
            }

            #[test]
            fn test_checkboxes_on_step_rows(doc in arb_document()) {
                let grid = build_grid(&doc, "url", date(), &DateFormat::Long);
                for coord in grid.checkboxes() {
                    let row = &grid.rows()[coord.row as usize];
                    prop_assert!(coord.col == 1 || coord.col == 2);
                    prop_assert!(row[1].is_empty() && row[2].is_empty());
                    prop_assert!(["Given ", "When ", "Then ", "And ", "But "]
                        .iter()
                        .any(|marker| row[0].starts_with(marker)));
                }
            }

            #[test]
            fn test_every_step_has_checkboxes(doc in arb_document()) {
                let grid = build_grid(&doc, "url", date(), &DateFormat::Long);
                let background_steps = doc
                    .background
                    .iter()
                    .chain(doc.rules.iter().filter_map(|rule| rule.background.as_ref()))
                    .map(|background| background.steps.len())
                    .sum::<usize>();
                let scenario_steps = doc
                    .all_scenarios()
                    .map(|scenario| scenario.steps.len())
                    .sum::<usize>();
                prop_assert_eq!(
                    grid.checkboxes().len(),
                    2 * (background_steps + scenario_steps)
                );
            }
        }
    }
}
