//! Catalog Module
//!
//! ドキュメントソースの読み込み・一覧表示を提供するモジュール。
//! 一覧表示では各ドキュメントを並列に読み込み、失敗したドキュメントは
//! ログに記録してスキップします。

use std::path::Path;

use chrono::Local;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::FeatureSheetError;
use crate::gherkin::parse_source;
use crate::normalizer::normalize;
use crate::source::{DirectorySource, DocumentSource, FileSource, ManifestEntry, RawDocument};

/// ステータスを表すタグ
const STATUS_TAGS: [&str; 4] = ["draft", "active", "completed", "deprecated"];

/// 機能分類の候補から除外するタグ
const NON_FEATURE_TAGS: [&str; 6] = ["draft", "active", "completed", "deprecated", "critical", "smoke"];

const DEFAULT_STATUS: &str = "Active";
const DEFAULT_FEATURE: &str = "General";

/// 一覧表示用の要約
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub id: String,
    /// Feature名
    pub title: String,
    /// タグから推定した機能分類（例: `@user-login` → `User Login`）
    pub feature: String,
    /// ステータスタグ（例: `@draft` → `Draft`）
    pub status: String,
    /// 更新日（YYYY-MM-DD）
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SuiteSummary {
    fn new(document: &Document, raw: &RawDocument) -> Self {
        let last_updated = raw
            .modified
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string();

        Self {
            id: document.id.clone(),
            title: document.name.clone(),
            feature: feature_label(&document.tags),
            status: status_label(&document.tags),
            last_updated,
            category: raw.category.clone(),
        }
    }
}

/// カテゴリごとの要約グループ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    /// カテゴリ名（未分類は`None`）
    pub category: Option<String>,
    pub suites: Vec<SuiteSummary>,
}

/// ドキュメントの読み込みと一覧表示のファサード
pub struct Catalog {
    source: Box<dyn DocumentSource>,
}

impl Catalog {
    /// 任意のソースからカタログを生成
    pub fn new<S: DocumentSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// パスからカタログを開く
    ///
    /// ディレクトリの場合は`DirectorySource`、ファイルの場合は`FileSource`を使用します。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeatureSheetError> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(Self::new(DirectorySource::open(path)?))
        } else {
            Ok(Self::new(FileSource::open(path)?))
        }
    }

    /// 取得可能なドキュメントの一覧
    pub fn entries(&self) -> Result<Vec<ManifestEntry>, FeatureSheetError> {
        self.source.entries()
    }

    /// ドキュメントを取得・解析・正規化する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Document)` - 読み込みに成功した場合
    /// * `Err(FeatureSheetError::NotFound)` - IDが存在しない場合
    /// * `Err(FeatureSheetError::MalformedDocument)` - Featureノードが存在しない場合
    pub fn load(&self, id: &str) -> Result<Document, FeatureSheetError> {
        self.load_with_raw(id).map(|(_, document)| document)
    }

    fn load_with_raw(&self, id: &str) -> Result<(RawDocument, Document), FeatureSheetError> {
        let raw = self.source.fetch(id)?;
        let tree = parse_source(&raw.text, raw.format)?;
        let document = normalize(&tree, id)?;
        debug!(
            id,
            rules = document.rules.len(),
            scenarios = document.scenario_count(),
            "loaded document"
        );
        Ok((raw, document))
    }

    /// すべてのドキュメントを並列に読み込む
    ///
    /// 読み込みに失敗したドキュメントは警告ログを出力してスキップします。
    pub fn load_all(&self) -> Result<Vec<Document>, FeatureSheetError> {
        let entries = self.source.entries()?;
        Ok(self
            .load_entries(&entries)
            .into_iter()
            .map(|(_, document)| document)
            .collect())
    }

    /// 一覧表示用の要約をマニフェスト順に返す
    ///
    /// 1件の失敗で一覧全体を失敗させず、該当エントリをスキップします。
    pub fn list(&self) -> Result<Vec<SuiteSummary>, FeatureSheetError> {
        let entries = self.source.entries()?;
        Ok(self
            .load_entries(&entries)
            .iter()
            .map(|(raw, document)| SuiteSummary::new(document, raw))
            .collect())
    }

    /// 要約をカテゴリごとにまとめる
    ///
    /// カテゴリは初出順に並び、未分類のグループは最後になります。
    pub fn list_by_category(&self) -> Result<Vec<CategoryGroup>, FeatureSheetError> {
        Ok(group_by_category(self.list()?))
    }

    fn load_entries(&self, entries: &[ManifestEntry]) -> Vec<(RawDocument, Document)> {
        entries
            .par_iter()
            .filter_map(|entry| match self.load_with_raw(&entry.id) {
                Ok(loaded) => Some(loaded),
                Err(err) => {
                    warn!(id = %entry.id, file = %entry.file, error = %err, "skipping document");
                    None
                }
            })
            .collect()
    }
}

fn group_by_category(summaries: Vec<SuiteSummary>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut uncategorized = Vec::new();

    for summary in summaries {
        let Some(category) = summary.category.clone() else {
            uncategorized.push(summary);
            continue;
        };
        match groups
            .iter_mut()
            .find(|group| group.category.as_deref() == Some(category.as_str()))
        {
            Some(group) => group.suites.push(summary),
            None => groups.push(CategoryGroup {
                category: Some(category),
                suites: vec![summary],
            }),
        }
    }

    if !uncategorized.is_empty() {
        groups.push(CategoryGroup {
            category: None,
            suites: uncategorized,
        });
    }
    groups
}

/// 最初のステータスタグを先頭大文字にして返す
fn status_label(tags: &[String]) -> String {
    tags.iter()
        .find(|tag| STATUS_TAGS.contains(&tag.to_lowercase().as_str()))
        .map(|tag| capitalize_first(tag))
        .unwrap_or_else(|| DEFAULT_STATUS.to_string())
}

/// 最初の分類タグを単語ごとに先頭大文字にして返す（`-`は空白に置換）
fn feature_label(tags: &[String]) -> String {
    tags.iter()
        .find(|tag| !NON_FEATURE_TAGS.contains(&tag.to_lowercase().as_str()))
        .map(|tag| title_case(&tag.replace('-', " ")))
        .unwrap_or_else(|| DEFAULT_FEATURE.to_string())
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 単語の先頭文字を大文字にする（単語は英数字と`_`の連続）
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word && !in_word {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
        in_word = is_word;
    }
    result
}
