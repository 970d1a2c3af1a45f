//! Document Model Module
//!
//! 正規化済みの表示用ドキュメントツリーを定義するモジュール。
//! Feature → {Background?, Rule*, Scenario*} → Step* / Examples* の構造を持ち、
//! 構築後は不変として扱います。

use serde::Serialize;

/// ルートドキュメント（Gherkin Feature）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `@`を除いたタグ（出現順、重複除去なし）
    pub tags: Vec<String>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    pub rules: Vec<Rule>,
    /// どのRuleにも属さないシナリオ
    pub scenarios: Vec<Scenario>,
}

/// シナリオのグループ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// このRule内のシナリオにのみ適用されるBackground
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    pub scenarios: Vec<Scenario>,
}

/// スコープ内のすべてのシナリオに暗黙的に前置されるステップ列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub name: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
    /// Scenario Outlineの場合のみ`Some`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Examples>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// 前後の空白を除去したキーワード（例: `Given`）
    pub keyword: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_table: Option<Vec<Vec<String>>>,
}

/// Scenario Outlineのパラメータ表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Examples {
    pub name: String,
    pub table_header: Vec<String>,
    pub table_rows: Vec<Vec<String>>,
}

/// ステップキーワードの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StepKeyword {
    /// 前提（セットアップ）
    Given,
    /// 操作
    When,
    /// 検証
    Then,
    /// 直前のキーワードの継続
    And,
    /// 直前のキーワードの否定的な継続
    But,
    /// `*`（箇条書き形式）
    Star,
}

impl StepKeyword {
    /// 行頭キーワードの語彙
    pub const ALL: [StepKeyword; 6] = [
        StepKeyword::Given,
        StepKeyword::When,
        StepKeyword::Then,
        StepKeyword::And,
        StepKeyword::But,
        StepKeyword::Star,
    ];

    /// キーワード文字列から分類を取得（前後の空白は無視）
    pub fn parse(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKeyword::Given => "Given",
            StepKeyword::When => "When",
            StepKeyword::Then => "Then",
            StepKeyword::And => "And",
            StepKeyword::But => "But",
            StepKeyword::Star => "*",
        }
    }
}

impl Step {
    /// キーワードの分類（語彙外の場合は`None`）
    pub fn kind(&self) -> Option<StepKeyword> {
        StepKeyword::parse(&self.keyword)
    }

    /// `"<keyword> <text>"`形式の1行表現
    pub fn line(&self) -> String {
        format!("{} {}", self.keyword, self.text)
    }
}

impl Document {
    /// Feature直下とRule内のシナリオを出現順に列挙
    pub fn all_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios
            .iter()
            .chain(self.rules.iter().flat_map(|rule| rule.scenarios.iter()))
    }

    /// シナリオの総数
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
            + self
                .rules
                .iter()
                .map(|rule| rule.scenarios.len())
                .sum::<usize>()
    }
}
