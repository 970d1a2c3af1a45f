//! Output Format Module
//!
//! Strategy Patternによるグリッド出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use std::io::Write;

use crate::api::OutputFormat;
use crate::error::FeatureSheetError;
use crate::export::{write_workbook, ExportGrid};

pub use formatters::*;

/// 出力フォーマッター（Strategy Pattern）
///
/// 各出力フォーマット（XLSX, CSV, JSON）をenumとして表現します。
#[derive(Debug, Clone)]
pub enum OutputFormatter {
    /// ワークシート名を保持するXLSX出力
    Xlsx { sheet_name: String },
    Csv,
    Json,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: OutputFormat, sheet_name: &str) -> Self {
        match format {
            OutputFormat::Xlsx => OutputFormatter::Xlsx {
                sheet_name: sheet_name.to_string(),
            },
            OutputFormat::Csv => OutputFormatter::Csv,
            OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// グリッドを指定されたフォーマットで出力する
    ///
    /// # 引数
    ///
    /// * `grid` - 出力するグリッド
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(FeatureSheetError)` - エラーが発生した場合
    pub fn render<W: Write>(
        &self,
        grid: &ExportGrid,
        writer: &mut W,
    ) -> Result<(), FeatureSheetError> {
        match self {
            OutputFormatter::Xlsx { sheet_name } => {
                let bytes = write_workbook(grid, sheet_name)?;
                writer.write_all(&bytes)?;
                writer.flush()?;
                Ok(())
            }
            OutputFormatter::Csv => CsvFormatter.render(grid, writer),
            OutputFormatter::Json => JsonFormatter.render(grid, writer),
        }
    }
}
