//! Workbook Writer Module
//!
//! `ExportGrid`を`rust_xlsxwriter`でXLSXワークブックに書き出すモジュール。

use rust_xlsxwriter::{DataValidation, Format, Workbook, Worksheet};
use tracing::debug;

use super::grid::ExportGrid;
use super::style::{classify, CellContext};
use crate::error::FeatureSheetError;
use crate::types::{CellCoord, GRID_WIDTH};

/// 列幅（文字数単位、Step / Pass / Fail / Notes）
pub(crate) const COLUMN_WIDTHS: [f64; GRID_WIDTH] = [100.0, 8.0, 8.0, 50.0];

/// 通常の行の高さ（ポイント）
pub(crate) const ROW_HEIGHT: f64 = 20.0;

/// タイトル行の高さ（ポイント）
pub(crate) const TITLE_ROW_HEIGHT: f64 = 32.0;

/// チェックボックスの選択肢
const CHECKBOX_VALUES: [&str; 2] = ["TRUE", "FALSE"];

/// グリッドをXLSXとしてバイト列に書き出す
///
/// # 引数
///
/// * `grid` - 書き出すグリッド
/// * `sheet_name` - ワークシート名
///
/// # 戻り値
///
/// * `Ok(Vec<u8>)` - XLSXファイルの内容
/// * `Err(FeatureSheetError::Xlsx)` - 書き出しに失敗した場合
pub fn write_workbook(grid: &ExportGrid, sheet_name: &str) -> Result<Vec<u8>, FeatureSheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    write_layout(worksheet, grid)?;
    write_cells(worksheet, grid)?;
    write_checkboxes(worksheet, grid)?;

    debug!(
        rows = grid.row_count(),
        merges = grid.merges().len(),
        checkboxes = grid.checkboxes().len(),
        "workbook written"
    );

    Ok(workbook.save_to_buffer()?)
}

/// 列幅と行の高さを設定
fn write_layout(worksheet: &mut Worksheet, grid: &ExportGrid) -> Result<(), FeatureSheetError> {
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    for row in 0..grid.row_count() as u32 {
        let height = if row == 0 { TITLE_ROW_HEIGHT } else { ROW_HEIGHT };
        worksheet.set_row_height(row, height)?;
    }
    Ok(())
}

/// セルの値と書式を書き込む
///
/// 結合範囲は左上セルの書式で`merge_range`として書き込み、範囲内の他のセルは書き込みません。
fn write_cells(worksheet: &mut Worksheet, grid: &ExportGrid) -> Result<(), FeatureSheetError> {
    let mut previous = None;

    for (row_idx, row) in grid.rows().iter().enumerate() {
        let row_num = row_idx as u32;

        for (col_idx, value) in row.iter().enumerate() {
            let coord = CellCoord::new(row_num, col_idx as u16);
            if grid.is_merge_child(coord) {
                continue;
            }

            let style = classify(&CellContext {
                row: row_num,
                col: coord.col,
                value: value.as_str(),
                previous,
            });
            let format = style.to_format();

            if let Some(range) = grid.merge_at(coord) {
                let format = format.unwrap_or_else(Format::new);
                worksheet.merge_range(
                    range.start.row,
                    range.start.col,
                    range.end.row,
                    range.end.col,
                    value,
                    &format,
                )?;
                continue;
            }

            match (&format, value.is_empty()) {
                (Some(format), true) => {
                    worksheet.write_blank(row_num, coord.col, format)?;
                }
                (Some(format), false) => {
                    worksheet.write_string_with_format(row_num, coord.col, value, format)?;
                }
                (None, false) => {
                    worksheet.write_string(row_num, coord.col, value)?;
                }
                (None, true) => {}
            }
        }

        previous = Some(row);
    }

    Ok(())
}

/// チェックボックス（TRUE/FALSEのリスト入力規則）を設定
fn write_checkboxes(worksheet: &mut Worksheet, grid: &ExportGrid) -> Result<(), FeatureSheetError> {
    if grid.checkboxes().is_empty() {
        return Ok(());
    }

    let validation = DataValidation::new().allow_list_strings(&CHECKBOX_VALUES)?;
    for coord in grid.checkboxes() {
        worksheet.add_data_validation(coord.row, coord.col, coord.row, coord.col, &validation)?;
    }
    Ok(())
}
