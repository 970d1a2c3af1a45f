//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;

/// 入力ドキュメントの形式
///
/// 構文解析器の選択に使用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceFormat {
    /// Gherkinテキスト（`.feature`）
    Feature,

    /// Cucumber messages JSON（`GherkinDocument`オブジェクト、またはNDJSONエンベロープ）
    Messages,
}

impl SourceFormat {
    /// ファイル拡張子から形式を判定する
    ///
    /// `.json` / `.ndjson` はMessages、それ以外はFeatureとして扱います。
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") | Some("ndjson") => SourceFormat::Messages,
            _ => SourceFormat::Feature,
        }
    }
}

/// ISO 8601の日付形式
const ISO_8601: &str = "%Y-%m-%d";

/// 日付の出力形式
///
/// エクスポートシートの「Test Date」欄に表示する日付の形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DateFormat {
    /// 長い英語表記（デフォルト）
    ///
    /// 例: `October 19, 2026`
    #[default]
    Long,

    /// ISO 8601形式（YYYY-MM-DD）
    ///
    /// 例: `2026-10-19`
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use featuresheet::{DateFormat, ExporterBuilder};
    ///
    /// # fn main() -> Result<(), featuresheet::FeatureSheetError> {
    /// let exporter = ExporterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y年%m月%d日".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

impl DateFormat {
    /// 日付を文字列に変換する
    ///
    /// カスタム形式が日付から組み立てられない場合（時刻の指定子など）は
    /// ISO 8601形式で出力します。
    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            DateFormat::Long => date.format("%B %-d, %Y").to_string(),
            DateFormat::Iso8601 => date.format(ISO_8601).to_string(),
            DateFormat::Custom(pattern) => {
                let mut text = String::new();
                match write!(text, "{}", date.format(pattern)) {
                    Ok(()) => text,
                    Err(_) => date.format(ISO_8601).to_string(),
                }
            }
        }
    }
}

/// エクスポートの出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// XLSXワークブック（デフォルト）
    ///
    /// 書式、セル結合、Pass/Fail列のチェックボックス（TRUE/FALSEリスト）を含みます。
    #[default]
    Xlsx,

    /// CSV形式
    ///
    /// グリッドのセル値のみを出力します。結合範囲の子セルは空欄になります。
    Csv,

    /// JSON形式
    ///
    /// 行、結合範囲（A1記法）、チェックボックス位置を含むオブジェクトを出力します。
    Json,
}

impl OutputFormat {
    /// 出力ファイルの拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// 正規化済みドキュメントの表示形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum RenderFormat {
    /// Markdown形式（デフォルト）
    #[default]
    Markdown,

    /// JSON形式（camelCaseのフィールド名）
    Json,
}
