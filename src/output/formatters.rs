//! Output Formatters Implementation
//!
//! XLSX以外のグリッド出力フォーマットの実装を提供するモジュール。

use std::io::Write;

use serde::Serialize;

use crate::error::FeatureSheetError;
use crate::export::ExportGrid;
use crate::types::{column_letter, GRID_WIDTH};

/// CSV形式のフォーマッター
///
/// グリッドの4列をそのまま出力します。結合範囲の子セルは元々空欄です。
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn render<W: Write>(
        &self,
        grid: &ExportGrid,
        writer: &mut W,
    ) -> Result<(), FeatureSheetError> {
        for row in grid.rows() {
            let line = row
                .iter()
                .map(|cell| escape_csv(cell))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(writer, "{}", line)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// JSON出力の構造
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonGrid<'a> {
    generated_on: String,
    columns: Vec<String>,
    rows: &'a [crate::export::GridRow],
    /// A1形式の結合範囲
    merges: Vec<String>,
    /// A1形式のチェックボックスセル
    checkboxes: Vec<String>,
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        grid: &ExportGrid,
        writer: &mut W,
    ) -> Result<(), FeatureSheetError> {
        let output = JsonGrid {
            generated_on: grid.generated_on().format("%Y-%m-%d").to_string(),
            columns: (0..GRID_WIDTH as u16).map(column_letter).collect(),
            rows: grid.rows(),
            merges: grid
                .merges()
                .iter()
                .map(|range| range.to_a1_notation())
                .collect(),
            checkboxes: grid
                .checkboxes()
                .iter()
                .map(|coord| coord.to_a1_notation())
                .collect(),
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

/// CSV文字列をエスケープ
///
/// ダブルクォート、改行、カンマを含む場合はダブルクォートで囲み、
/// 内部のダブルクォートは2つにエスケープします。
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
