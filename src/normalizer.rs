//! Normalizer Module
//!
//! 構文木（`GherkinDocument`）を表示用の`Document`ツリーに変換するモジュール。
//! Featureの子リストを1回だけ走査し、各子をBackground / Rule / Scenarioの
//! いずれかに分類します。どれにも該当しない子は無視されます。

use crate::document::{Background, Document, Examples, Rule, Scenario, Step};
use crate::error::FeatureSheetError;
use crate::gherkin::{self, FeatureChild, GherkinDocument, RuleChild, Tag};

/// 言語が指定されていない場合の既定値
const DEFAULT_LANGUAGE: &str = "en";

/// 構文木の子ノードの分類
#[derive(Debug, Clone, Copy)]
enum ChildNode<'a> {
    Background(&'a gherkin::Background),
    Rule(&'a gherkin::Rule),
    Scenario(&'a gherkin::Scenario),
    Unknown,
}

impl FeatureChild {
    fn classify(&self) -> ChildNode<'_> {
        match (&self.background, &self.rule, &self.scenario) {
            (Some(background), _, _) => ChildNode::Background(background),
            (None, Some(rule), _) => ChildNode::Rule(rule),
            (None, None, Some(scenario)) => ChildNode::Scenario(scenario),
            (None, None, None) => ChildNode::Unknown,
        }
    }
}

impl RuleChild {
    fn classify(&self) -> ChildNode<'_> {
        match (&self.background, &self.scenario) {
            (Some(background), _) => ChildNode::Background(background),
            (None, Some(scenario)) => ChildNode::Scenario(scenario),
            (None, None) => ChildNode::Unknown,
        }
    }
}

/// 構文木を`Document`に変換する
///
/// # 引数
///
/// * `raw` - 構文解析済みのドキュメント
/// * `id` - ドキュメント識別子
///
/// # 戻り値
///
/// * `Ok(Document)` - 変換に成功した場合
/// * `Err(FeatureSheetError::MalformedDocument)` - Featureノードが存在しない場合
pub fn normalize(raw: &GherkinDocument, id: &str) -> Result<Document, FeatureSheetError> {
    let feature = raw
        .feature
        .as_ref()
        .ok_or_else(|| FeatureSheetError::MalformedDocument(id.to_string()))?;

    let mut background = None;
    let mut rules = Vec::new();
    let mut scenarios = Vec::new();

    for child in &feature.children {
        match child.classify() {
            // 複数ある場合は後勝ち
            ChildNode::Background(raw) => background = Some(normalize_background(raw)),
            ChildNode::Rule(raw) => rules.push(normalize_rule(raw)),
            ChildNode::Scenario(raw) => scenarios.push(normalize_scenario(raw)),
            ChildNode::Unknown => {}
        }
    }

    let language = if feature.language.trim().is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        feature.language.clone()
    };

    Ok(Document {
        id: id.to_string(),
        name: feature.name.clone(),
        description: feature.description.clone(),
        tags: normalize_tags(&feature.tags),
        language,
        background,
        rules,
        scenarios,
    })
}

fn normalize_rule(raw: &gherkin::Rule) -> Rule {
    let mut background = None;
    let mut scenarios = Vec::new();

    for child in &raw.children {
        match child.classify() {
            ChildNode::Background(raw) => background = Some(normalize_background(raw)),
            ChildNode::Scenario(raw) => scenarios.push(normalize_scenario(raw)),
            ChildNode::Rule(_) | ChildNode::Unknown => {}
        }
    }

    Rule {
        id: raw.id.clone(),
        name: raw.name.clone(),
        description: raw.description.clone(),
        tags: normalize_tags(&raw.tags),
        background,
        scenarios,
    }
}

fn normalize_background(raw: &gherkin::Background) -> Background {
    let name = if raw.name.is_empty() {
        "Background".to_string()
    } else {
        raw.name.clone()
    };

    Background {
        name,
        steps: raw.steps.iter().map(normalize_step).collect(),
    }
}

fn normalize_scenario(raw: &gherkin::Scenario) -> Scenario {
    let examples = if raw.examples.is_empty() {
        None
    } else {
        Some(raw.examples.iter().map(normalize_examples).collect())
    };

    Scenario {
        id: raw.id.clone(),
        name: raw.name.clone(),
        tags: normalize_tags(&raw.tags),
        steps: raw.steps.iter().map(normalize_step).collect(),
        examples,
    }
}

fn normalize_step(raw: &gherkin::Step) -> Step {
    Step {
        keyword: raw.keyword.trim().to_string(),
        text: raw.text.clone(),
        doc_string: raw.doc_string.as_ref().map(|doc| doc.content.clone()),
        data_table: raw
            .data_table
            .as_ref()
            .map(|table| table.rows.iter().map(|row| row.values()).collect()),
    }
}

fn normalize_examples(raw: &gherkin::Examples) -> Examples {
    let name = if raw.name.is_empty() {
        "Examples".to_string()
    } else {
        raw.name.clone()
    };

    Examples {
        name,
        table_header: raw
            .table_header
            .as_ref()
            .map(|row| row.values())
            .unwrap_or_default(),
        table_rows: raw.table_body.iter().map(|row| row.values()).collect(),
    }
}

/// タグ先頭の`@`を取り除く（順序を保持し、重複は除去しない）
fn normalize_tags(tags: &[Tag]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.name.strip_prefix('@').unwrap_or(&tag.name).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StepKeyword;
    use crate::gherkin::parse_feature;

    const SAMPLE: &str = "\
@auth @smoke
Feature: User login
  Users sign in with a password.

  Background:
    Given the login page is open

  Scenario Outline: Lockout
    Given <attempts> failed attempts
    Then the account is <state>

    Examples:
      | attempts | state    |
      | 3        | active   |
      | 5        | locked   |

  Rule: Valid credentials
    Background:
      Given a registered user

    @happy
    Scenario: Successful login
      When the user submits valid credentials
      Then the dashboard is shown
";

    #[test]
    fn test_normalize_sample() {
        let raw = parse_feature(SAMPLE).unwrap();
        let doc = normalize(&raw, "login").unwrap();

        assert_eq!(doc.id, "login");
        assert_eq!(doc.name, "User login");
        assert_eq!(doc.tags, vec!["auth", "smoke"]);
        assert_eq!(doc.language, "en");

        let background = doc.background.as_ref().unwrap();
        assert_eq!(background.name, "Background");
        assert_eq!(background.steps[0].line(), "Given the login page is open");

        assert_eq!(doc.rules.len(), 1);
        let rule = &doc.rules[0];
        assert_eq!(rule.name, "Valid credentials");
        assert_eq!(
            rule.background.as_ref().unwrap().steps[0].text,
            "a registered user"
        );
        assert_eq!(rule.scenarios.len(), 1);
        assert_eq!(rule.scenarios[0].tags, vec!["happy"]);
        assert!(rule.scenarios[0].examples.is_none());

        assert_eq!(doc.scenarios.len(), 1);
        let outline = &doc.scenarios[0];
        let examples = outline.examples.as_ref().unwrap();
        assert_eq!(examples[0].name, "Examples");
        assert_eq!(examples[0].table_header, vec!["attempts", "state"]);
        // 数値に見えるセルも文字列のまま
        assert_eq!(examples[0].table_rows[1], vec!["5", "locked"]);
    }

    #[test]
    fn test_normalize_missing_feature() {
        let raw = GherkinDocument::default();
        let result = normalize(&raw, "empty");
        assert!(matches!(
            result,
            Err(FeatureSheetError::MalformedDocument(ref id)) if id == "empty"
        ));
    }

    #[test]
    fn test_normalize_trims_keyword() {
        let json = r#"{"feature": {"name": "F", "children": [
            {"scenario": {"name": "s", "steps": [
                {"keyword": "Given\t ", "text": "  spaced text  "}
            ]}}
        ]}}"#;
        let raw = gherkin::parse_messages(json).unwrap();
        let doc = normalize(&raw, "f").unwrap();

        let step = &doc.scenarios[0].steps[0];
        assert_eq!(step.keyword, "Given");
        // テキストはそのまま保持
        assert_eq!(step.text, "  spaced text  ");
        assert_eq!(step.kind(), Some(StepKeyword::Given));
    }

    #[test]
    fn test_normalize_drops_unknown_children() {
        let json = r#"{"feature": {"name": "F", "children": [
            {"comment": {"text": "x"}},
            {"scenario": {"name": "kept"}},
            {}
        ]}}"#;
        let raw = gherkin::parse_messages(json).unwrap();
        let doc = normalize(&raw, "f").unwrap();

        assert_eq!(doc.scenarios.len(), 1);
        assert_eq!(doc.scenarios[0].name, "kept");
        assert!(doc.background.is_none());
        assert!(doc.rules.is_empty());
    }

    #[test]
    fn test_normalize_keeps_duplicate_tags() {
        let raw = parse_feature("@a @b @a\nFeature: Tags\n").unwrap();
        let doc = normalize(&raw, "tags").unwrap();
        assert_eq!(doc.tags, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_normalize_data_table_and_doc_string() {
        let source = "\
Feature: Tables
  Scenario: data
    Given these users
      | name  | role  |
      | alice | admin |
    And this payload
      \"\"\"json
      {\"ok\": true}
      \"\"\"
";
        let raw = parse_feature(source).unwrap();
        let doc = normalize(&raw, "tables").unwrap();
        let steps = &doc.scenarios[0].steps;

        assert_eq!(
            steps[0].data_table,
            Some(vec![
                vec!["name".to_string(), "role".to_string()],
                vec!["alice".to_string(), "admin".to_string()],
            ])
        );
        assert!(steps[0].doc_string.is_none());
        assert_eq!(steps[1].doc_string.as_deref(), Some("{\"ok\": true}"));
        assert!(steps[1].data_table.is_none());
    }

    #[test]
    fn test_normalize_language_from_header() {
        let raw = parse_feature("# language: en-GB\nFeature: Colour\n").unwrap();
        let doc = normalize(&raw, "colour").unwrap();
        assert_eq!(doc.language, "en-GB");
    }

    mod property_tests {
        use super::*;
        use crate::gherkin::{Feature, TableCell, TableRow};
        use proptest::prelude::*;

        fn raw_step() -> impl Strategy<Value = gherkin::Step> {
            (
                prop::sample::select(vec!["Given", "When", "Then", "And", "But", "*"]),
                "[ \t]{0,2}",
                "[a-z ]{0,12}",
            )
                .prop_map(|(keyword, padding, text)| gherkin::Step {
                    keyword: format!("{}{}", keyword, padding),
                    text,
                    ..Default::default()
                })
        }

        fn raw_row(width: usize) -> impl Strategy<Value = TableRow> {
            prop::collection::vec("[a-z0-9]{0,4}", width).prop_map(|values| TableRow {
                cells: values
                    .into_iter()
                    .map(|value| TableCell {
                        value,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            })
        }

        fn raw_examples() -> impl Strategy<Value = gherkin::Examples> {
            (1usize..4).prop_flat_map(|width| {
                (raw_row(width), prop::collection::vec(raw_row(width), 0..4)).prop_map(
                    |(header, body)| gherkin::Examples {
                        table_header: Some(header),
                        table_body: body,
                        ..Default::default()
                    },
                )
            })
        }

        fn raw_scenario() -> impl Strategy<Value = gherkin::Scenario> {
            (
                "[a-z]{1,8}",
                prop::collection::vec(raw_step(), 0..4),
                prop::collection::vec(raw_examples(), 0..2),
            )
                .prop_map(|(name, steps, examples)| gherkin::Scenario {
                    name,
                    steps,
                    examples,
                    ..Default::default()
                })
        }

        fn raw_rule_child() -> impl Strategy<Value = RuleChild> {
            prop_oneof![
                raw_scenario().prop_map(|scenario| RuleChild {
                    scenario: Some(scenario),
                    ..Default::default()
                }),
                prop::collection::vec(raw_step(), 0..3).prop_map(|steps| RuleChild {
                    background: Some(gherkin::Background {
                        steps,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                Just(RuleChild::default()),
            ]
        }

        fn raw_feature_child() -> impl Strategy<Value = FeatureChild> {
            prop_oneof![
                raw_scenario().prop_map(|scenario| FeatureChild {
                    scenario: Some(scenario),
                    ..Default::default()
                }),
                prop::collection::vec(raw_rule_child(), 0..4).prop_map(|children| {
                    FeatureChild {
                        rule: Some(gherkin::Rule {
                            children,
                            ..Default::default()
                        }),
                        ..Default::default()
                    }
                }),
                prop::collection::vec(raw_step(), 0..3).prop_map(|steps| FeatureChild {
                    background: Some(gherkin::Background {
                        steps,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                Just(FeatureChild::default()),
            ]
        }

        fn raw_document() -> impl Strategy<Value = GherkinDocument> {
            prop::collection::vec(raw_feature_child(), 0..6).prop_map(|children| {
                GherkinDocument {
                    uri: None,
                    feature: Some(Feature {
                        name: "Generated".to_string(),
                        children,
                        ..Default::default()
                    }),
                }
            })
        }

        /// 構文木中のシナリオノード数
        fn raw_scenario_count(raw: &GherkinDocument) -> usize {
            let Some(feature) = raw.feature.as_ref() else {
                return 0;
            };
            feature
                .children
                .iter()
                .map(|child| match (&child.background, &child.rule, &child.scenario) {
                    (None, None, Some(_)) => 1,
                    (None, Some(rule), _) => rule
                        .children
                        .iter()
                        .filter(|c| c.background.is_none() && c.scenario.is_some())
                        .count(),
                    _ => 0,
                })
                .sum()
        }

        proptest! {
            #[test]
            fn test_scenario_cardinality_preserved(raw in raw_document()) {
                let doc = normalize(&raw, "generated").unwrap();
                prop_assert_eq!(doc.scenario_count(), raw_scenario_count(&raw));
            }

            #[test]
            fn test_normalize_is_idempotent(raw in raw_document()) {
                let first = normalize(&raw, "generated").unwrap();
                let second = normalize(&raw, "generated").unwrap();
                prop_assert_eq!(first, second);
            }

            #[test]
            fn test_step_keywords_are_trimmed_vocabulary(raw in raw_document()) {
                let doc = normalize(&raw, "generated").unwrap();
                let backgrounds = doc
                    .background
                    .iter()
                    .chain(doc.rules.iter().filter_map(|rule| rule.background.as_ref()));
                let steps = doc
                    .all_scenarios()
                    .flat_map(|scenario| scenario.steps.iter())
                    .chain(backgrounds.flat_map(|background| background.steps.iter()));

                for step in steps {
                    prop_assert_eq!(step.keyword.trim(), step.keyword.as_str());
                    prop_assert!(step.kind().is_some());
                }
            }

            #[test]
            fn test_examples_rows_match_header(raw in raw_document()) {
                let doc = normalize(&raw, "generated").unwrap();
                for examples in doc.all_scenarios().filter_map(|s| s.examples.as_ref()).flatten() {
                    for row in &examples.table_rows {
                        prop_assert_eq!(row.len(), examples.table_header.len());
                    }
                }
            }
        }
    }
}
