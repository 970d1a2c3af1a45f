//! Gherkin Module
//!
//! Gherkinドキュメントの構文解析を提供するモジュール。
//! `.feature`テキストは内蔵の行パーサーで、Cucumber messages JSONは
//! `serde_json`で、同じ構文木（`GherkinDocument`）に変換します。

mod ast;
mod parser;

pub use ast::{
    Background, DataTable, DocString, Examples, Feature, FeatureChild, GherkinDocument, Location,
    Rule, RuleChild, Scenario, Step, TableCell, TableRow, Tag,
};

use crate::api::SourceFormat;
use crate::error::FeatureSheetError;
use parser::FeatureParser;

/// `.feature`テキストを解析する
///
/// `Feature:`行が存在しない場合は、`feature`が`None`のドキュメントを返します。
pub fn parse_feature(source: &str) -> Result<GherkinDocument, FeatureSheetError> {
    FeatureParser::new().parse(source)
}

/// Cucumber messages JSONを解析する
///
/// `GherkinDocument`オブジェクト単体、または`{"gherkinDocument": {...}}`形式の
/// NDJSONエンベロープを受け付けます。最初の`gherkinDocument`エンベロープを採用し、
/// それ以外のエンベロープ（`source`、`pickle`など）は読み飛ばします。
pub fn parse_messages(source: &str) -> Result<GherkinDocument, FeatureSheetError> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(source) {
        return document_from_value(value).map(Option::unwrap_or_default);
    }

    for line in source.lines().filter(|line| !line.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line)?;
        if let Some(document) = envelope_document(&value)? {
            return Ok(document);
        }
    }

    Ok(GherkinDocument::default())
}

/// 形式に応じて構文解析器を選択する
pub fn parse_source(
    source: &str,
    format: SourceFormat,
) -> Result<GherkinDocument, FeatureSheetError> {
    match format {
        SourceFormat::Feature => parse_feature(source),
        SourceFormat::Messages => parse_messages(source),
    }
}

/// 単一のJSON値をドキュメントとして解釈する
fn document_from_value(
    value: serde_json::Value,
) -> Result<Option<GherkinDocument>, FeatureSheetError> {
    if let Some(document) = envelope_document(&value)? {
        return Ok(Some(document));
    }
    if value.get("feature").is_some() || value.get("uri").is_some() {
        return Ok(Some(serde_json::from_value(value)?));
    }
    Ok(None)
}

/// エンベロープから`gherkinDocument`を取り出す
fn envelope_document(
    value: &serde_json::Value,
) -> Result<Option<GherkinDocument>, FeatureSheetError> {
    match value.get("gherkinDocument") {
        Some(document) => Ok(Some(serde_json::from_value(document.clone())?)),
        None => Ok(None),
    }
}
