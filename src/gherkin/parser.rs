//! FeatureParser Module
//!
//! `.feature`テキストを行単位で解析し、`GherkinDocument`構文木を構築します。
//! キーワードは英語のみをサポートします（`# language:`は記録のみ）。

use super::ast::{
    Background, DataTable, DocString, Examples, Feature, FeatureChild, GherkinDocument, Location,
    Rule, RuleChild, Scenario, Step, TableCell, TableRow, Tag,
};
use crate::error::FeatureSheetError;

/// 見出し行の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Feature,
    Rule,
    Background,
    Scenario,
    Examples,
}

/// 見出しキーワード（コロンの直前までの文字列）
const HEADER_KEYWORDS: &[(&str, HeaderKind)] = &[
    ("Feature", HeaderKind::Feature),
    ("Business Need", HeaderKind::Feature),
    ("Ability", HeaderKind::Feature),
    ("Rule", HeaderKind::Rule),
    ("Background", HeaderKind::Background),
    ("Scenario Outline", HeaderKind::Scenario),
    ("Scenario Template", HeaderKind::Scenario),
    ("Scenario", HeaderKind::Scenario),
    ("Example", HeaderKind::Scenario),
    ("Examples", HeaderKind::Examples),
    ("Scenarios", HeaderKind::Examples),
];

/// ステップキーワード（末尾の空白を含む）
const STEP_KEYWORDS: &[&str] = &["Given ", "When ", "Then ", "And ", "But ", "* "];

/// Doc Stringの区切り文字
const DOC_STRING_DELIMITERS: &[&str] = &["\"\"\"", "```"];

/// 現在解析中のブロック
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Feature,
    Rule,
    Background,
    Scenario,
    Examples,
}

/// 解析途中のDoc String
struct OpenDocString {
    delimiter: &'static str,
    indent: usize,
    media_type: Option<String>,
    lines: Vec<String>,
    location: Location,
}

impl OpenDocString {
    /// 開始区切り文字のインデント分だけ先頭の空白を取り除いて追加
    fn push_line(&mut self, raw: &str) {
        let mut cut = 0;
        for (removed, (idx, ch)) in raw.char_indices().enumerate() {
            if removed >= self.indent || !ch.is_whitespace() {
                break;
            }
            cut = idx + ch.len_utf8();
        }

        let line = &raw[cut..];
        let line = match self.delimiter {
            "```" => line.replace("\\`\\`\\`", "```"),
            _ => line.replace("\\\"\\\"\\\"", "\"\"\""),
        };
        self.lines.push(line);
    }

    fn finish(self) -> DocString {
        DocString {
            location: self.location,
            media_type: self.media_type,
            content: self.lines.join("\n"),
            delimiter: self.delimiter.to_string(),
        }
    }
}

/// Gherkinテキストパーサー
///
/// 1回の`parse`呼び出しで1つの`GherkinDocument`を構築します。
/// IDは連番で採番されるため、同じ入力からは常に同じ構文木が得られます。
pub(crate) struct FeatureParser {
    next_id: usize,
    language: Option<String>,
    feature: Option<Feature>,
    in_rule: bool,
    section: Section,
    pending_tags: Vec<Tag>,
    description: Option<Vec<String>>,
}

impl FeatureParser {
    /// 新しいFeatureParserを生成
    pub fn new() -> Self {
        Self {
            next_id: 0,
            language: None,
            feature: None,
            in_rule: false,
            section: Section::None,
            pending_tags: Vec::new(),
            description: None,
        }
    }

    /// テキスト全体を解析
    ///
    /// # 戻り値
    ///
    /// * `Ok(GherkinDocument)` - 解析成功（`Feature:`行がない場合は`feature`が`None`）
    /// * `Err(FeatureSheetError::Syntax)` - 構造が不正な場合
    pub fn parse(mut self, source: &str) -> Result<GherkinDocument, FeatureSheetError> {
        let mut doc_string: Option<OpenDocString> = None;

        for (idx, raw_line) in source.lines().enumerate() {
            let line_no = idx + 1;

            // Doc String内の行はキーワード判定を行わない
            if let Some(mut open) = doc_string.take() {
                if raw_line.trim() == open.delimiter {
                    self.attach_doc_string(open.finish(), line_no)?;
                } else {
                    open.push_line(raw_line);
                    doc_string = Some(open);
                }
                continue;
            }

            let trimmed = raw_line.trim();
            let indent = raw_line.chars().take_while(|c| c.is_whitespace()).count();
            let location = Location {
                line: line_no,
                column: Some(indent + 1),
            };

            if trimmed.is_empty() {
                if let Some(lines) = self.description.as_mut() {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                }
                continue;
            }

            if trimmed.starts_with('#') {
                if self.feature.is_none() {
                    if let Some(language) = parse_language(trimmed) {
                        self.language = Some(language);
                    }
                }
                continue;
            }

            if trimmed.starts_with('@') {
                self.close_description();
                let tags = parse_tags(trimmed, location, &mut self.next_id);
                self.pending_tags.extend(tags);
                continue;
            }

            if let Some((kind, keyword, name)) = match_header(trimmed) {
                self.close_description();
                self.open_header(kind, keyword, name, location)?;
                continue;
            }

            // Feature・Ruleの説明文は見出し・タグ・コメント行でのみ終わる
            if matches!(self.section, Section::Feature | Section::Rule) {
                if let Some(lines) = self.description.as_mut() {
                    lines.push(raw_line.trim_end().to_string());
                    continue;
                }
            }

            if let Some((keyword, text)) = match_step(trimmed) {
                self.close_description();
                self.push_step(keyword, text, location)?;
                continue;
            }

            if trimmed.starts_with('|') {
                self.close_description();
                self.push_table_row(split_table_cells(trimmed), location)?;
                continue;
            }

            if let Some(delimiter) = match_doc_string_delimiter(trimmed) {
                self.close_description();
                if self.last_step_mut().is_none() {
                    return Err(FeatureSheetError::syntax(
                        line_no,
                        "doc string without a preceding step",
                    ));
                }
                let media_type = trimmed[delimiter.len()..].trim();
                doc_string = Some(OpenDocString {
                    delimiter,
                    indent,
                    media_type: (!media_type.is_empty()).then(|| media_type.to_string()),
                    lines: Vec::new(),
                    location,
                });
                continue;
            }

            // 自由記述行
            if let Some(lines) = self.description.as_mut() {
                lines.push(raw_line.trim_end().to_string());
                continue;
            }
            if self.feature.is_none() {
                // Feature行より前の自由記述は無視する
                continue;
            }
            return Err(FeatureSheetError::syntax(
                line_no,
                format!("unexpected text: '{}'", trimmed),
            ));
        }

        if let Some(open) = doc_string {
            return Err(FeatureSheetError::syntax(
                open.location.line,
                "unterminated doc string",
            ));
        }

        self.close_description();

        Ok(GherkinDocument {
            uri: None,
            feature: self.feature,
        })
    }

    fn next_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    /// 見出し行を処理し、新しいノードを構文木に追加
    fn open_header(
        &mut self,
        kind: HeaderKind,
        keyword: &str,
        name: &str,
        location: Location,
    ) -> Result<(), FeatureSheetError> {
        let line = location.line;
        let tags = std::mem::take(&mut self.pending_tags);

        match kind {
            HeaderKind::Feature => {
                if self.feature.is_some() {
                    return Err(FeatureSheetError::syntax(
                        line,
                        "only one Feature is allowed per document",
                    ));
                }
                self.feature = Some(Feature {
                    location,
                    tags,
                    language: self.language.clone().unwrap_or_else(|| "en".to_string()),
                    keyword: keyword.to_string(),
                    name: name.to_string(),
                    description: String::new(),
                    children: Vec::new(),
                });
                self.section = Section::Feature;
            }
            HeaderKind::Rule => {
                let id = self.next_id();
                let feature = self
                    .feature
                    .as_mut()
                    .ok_or_else(|| FeatureSheetError::syntax(line, "Rule before Feature"))?;
                feature.children.push(FeatureChild {
                    rule: Some(Rule {
                        location,
                        tags,
                        keyword: keyword.to_string(),
                        name: name.to_string(),
                        description: String::new(),
                        children: Vec::new(),
                        id,
                    }),
                    ..Default::default()
                });
                self.in_rule = true;
                self.section = Section::Rule;
            }
            HeaderKind::Background => {
                if !tags.is_empty() {
                    return Err(FeatureSheetError::syntax(
                        line,
                        "tags are not allowed on Background",
                    ));
                }
                let background = Background {
                    location,
                    keyword: keyword.to_string(),
                    name: name.to_string(),
                    description: String::new(),
                    steps: Vec::new(),
                    id: self.next_id(),
                };
                self.push_child(Some(background), None, line)?;
                self.section = Section::Background;
            }
            HeaderKind::Scenario => {
                let scenario = Scenario {
                    location,
                    tags,
                    keyword: keyword.to_string(),
                    name: name.to_string(),
                    description: String::new(),
                    steps: Vec::new(),
                    examples: Vec::new(),
                    id: self.next_id(),
                };
                self.push_child(None, Some(scenario), line)?;
                self.section = Section::Scenario;
            }
            HeaderKind::Examples => {
                if !matches!(self.section, Section::Scenario | Section::Examples) {
                    return Err(FeatureSheetError::syntax(
                        line,
                        "Examples must follow a Scenario Outline",
                    ));
                }
                let examples = Examples {
                    location,
                    tags,
                    keyword: keyword.to_string(),
                    name: name.to_string(),
                    description: String::new(),
                    table_header: None,
                    table_body: Vec::new(),
                    id: self.next_id(),
                };
                let scenario = self
                    .last_scenario_mut()
                    .ok_or_else(|| FeatureSheetError::syntax(line, "Examples without a scenario"))?;
                scenario.examples.push(examples);
                self.section = Section::Examples;
            }
        }

        self.description = Some(Vec::new());
        Ok(())
    }

    /// BackgroundまたはScenarioを現在のコンテナ（FeatureかRule）に追加
    fn push_child(
        &mut self,
        background: Option<Background>,
        scenario: Option<Scenario>,
        line: usize,
    ) -> Result<(), FeatureSheetError> {
        if self.in_rule {
            let rule = self
                .current_rule_mut()
                .ok_or_else(|| FeatureSheetError::syntax(line, "missing Rule"))?;
            rule.children.push(RuleChild {
                background,
                scenario,
            });
        } else {
            let feature = self.feature.as_mut().ok_or_else(|| {
                FeatureSheetError::syntax(line, "Background or Scenario before Feature")
            })?;
            feature.children.push(FeatureChild {
                background,
                rule: None,
                scenario,
            });
        }
        Ok(())
    }

    fn push_step(
        &mut self,
        keyword: &str,
        text: &str,
        location: Location,
    ) -> Result<(), FeatureSheetError> {
        let step = Step {
            location,
            keyword: keyword.to_string(),
            text: text.to_string(),
            doc_string: None,
            data_table: None,
            id: self.next_id(),
        };
        let steps = self.current_steps_mut().ok_or_else(|| {
            FeatureSheetError::syntax(location.line, "step outside of a scenario or background")
        })?;
        steps.push(step);
        Ok(())
    }

    fn push_table_row(
        &mut self,
        values: Vec<String>,
        location: Location,
    ) -> Result<(), FeatureSheetError> {
        let row = TableRow {
            location,
            cells: values
                .into_iter()
                .map(|value| TableCell { location, value })
                .collect(),
            id: self.next_id(),
        };

        match self.section {
            Section::Examples => {
                let examples = self.last_examples_mut().ok_or_else(|| {
                    FeatureSheetError::syntax(location.line, "table row without Examples")
                })?;
                if examples.table_header.is_none() {
                    examples.table_header = Some(row);
                } else {
                    examples.table_body.push(row);
                }
            }
            Section::Background | Section::Scenario => {
                let step = self.last_step_mut().ok_or_else(|| {
                    FeatureSheetError::syntax(location.line, "table row without a preceding step")
                })?;
                step.data_table
                    .get_or_insert_with(|| DataTable {
                        location,
                        rows: Vec::new(),
                    })
                    .rows
                    .push(row);
            }
            _ => {
                return Err(FeatureSheetError::syntax(
                    location.line,
                    "table row outside of a step or Examples",
                ))
            }
        }
        Ok(())
    }

    fn attach_doc_string(&mut self, doc: DocString, line: usize) -> Result<(), FeatureSheetError> {
        let step = self
            .last_step_mut()
            .ok_or_else(|| FeatureSheetError::syntax(line, "doc string without a step"))?;
        step.doc_string = Some(doc);
        Ok(())
    }

    /// 収集中の説明文を確定し、現在のノードに設定
    fn close_description(&mut self) {
        let Some(mut lines) = self.description.take() else {
            return;
        };
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        let text = lines.join("\n");
        if let Some(slot) = self.description_slot() {
            *slot = text;
        }
    }

    fn description_slot(&mut self) -> Option<&mut String> {
        match self.section {
            Section::None => None,
            Section::Feature => self.feature.as_mut().map(|f| &mut f.description),
            Section::Rule => self.current_rule_mut().map(|r| &mut r.description),
            Section::Background => self.last_background_mut().map(|b| &mut b.description),
            Section::Scenario => self.last_scenario_mut().map(|s| &mut s.description),
            Section::Examples => self.last_examples_mut().map(|e| &mut e.description),
        }
    }

    fn current_rule_mut(&mut self) -> Option<&mut Rule> {
        if !self.in_rule {
            return None;
        }
        self.feature.as_mut()?.children.last_mut()?.rule.as_mut()
    }

    fn last_background_mut(&mut self) -> Option<&mut Background> {
        if self.in_rule {
            self.current_rule_mut()?
                .children
                .last_mut()?
                .background
                .as_mut()
        } else {
            self.feature
                .as_mut()?
                .children
                .last_mut()?
                .background
                .as_mut()
        }
    }

    fn last_scenario_mut(&mut self) -> Option<&mut Scenario> {
        if self.in_rule {
            self.current_rule_mut()?.children.last_mut()?.scenario.as_mut()
        } else {
            self.feature
                .as_mut()?
                .children
                .last_mut()?
                .scenario
                .as_mut()
        }
    }

    fn last_examples_mut(&mut self) -> Option<&mut Examples> {
        self.last_scenario_mut()?.examples.last_mut()
    }

    fn current_steps_mut(&mut self) -> Option<&mut Vec<Step>> {
        match self.section {
            Section::Background => self.last_background_mut().map(|b| &mut b.steps),
            Section::Scenario => self.last_scenario_mut().map(|s| &mut s.steps),
            _ => None,
        }
    }

    fn last_step_mut(&mut self) -> Option<&mut Step> {
        self.current_steps_mut()?.last_mut()
    }
}

/// `# language: xx`形式のコメントから言語コードを取り出す
fn parse_language(comment: &str) -> Option<String> {
    let body = comment.trim_start_matches('#').trim();
    let rest = body.strip_prefix("language")?.trim_start();
    let code = rest.strip_prefix(':')?.trim();
    (!code.is_empty()).then(|| code.to_string())
}

/// タグ行を解析（`#`以降はコメント）
fn parse_tags(line: &str, location: Location, next_id: &mut usize) -> Vec<Tag> {
    let mut tags = Vec::new();
    for token in line.split_whitespace() {
        if token.starts_with('#') {
            break;
        }
        if token.starts_with('@') {
            tags.push(Tag {
                location,
                name: token.to_string(),
                id: next_id.to_string(),
            });
            *next_id += 1;
        }
    }
    tags
}

/// 見出し行を判定し、(種類, キーワード, 名前)を返す
fn match_header(line: &str) -> Option<(HeaderKind, &'static str, &str)> {
    HEADER_KEYWORDS.iter().find_map(|(keyword, kind)| {
        let rest = line.strip_prefix(keyword)?.strip_prefix(':')?;
        Some((*kind, *keyword, rest.trim()))
    })
}

/// ステップ行を判定し、(キーワード, テキスト)を返す
fn match_step(line: &str) -> Option<(&'static str, &str)> {
    STEP_KEYWORDS.iter().find_map(|keyword| {
        let text = line.strip_prefix(keyword)?;
        Some((*keyword, text.trim()))
    })
}

fn match_doc_string_delimiter(line: &str) -> Option<&'static str> {
    DOC_STRING_DELIMITERS
        .iter()
        .copied()
        .find(|delimiter| line.starts_with(delimiter))
}

/// テーブル行をセルに分割
///
/// 最後の`|`以降は無視されます。セルは前後の空白を除去してからエスケープを解釈します。
fn split_table_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.trim().chars();

    // 先頭の'|'
    chars.next();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => {
                cells.push(unescape_cell(current.trim()));
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    cells
}

/// `\|`、`\n`、`\\`のエスケープを解釈
fn unescape_cell(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('|') => value.push('|'),
            Some('n') => value.push('\n'),
            Some('\\') => value.push('\\'),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}
