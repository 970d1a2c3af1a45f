//! Export Grid Module
//!
//! エクスポート用の4列グリッドと、その構築器を提供するモジュール。
//! 行の追加は`GridBuilder`だけが行い、結合範囲は行を追加した直後の
//! 行番号で記録されます。チェックボックス位置は完成したグリッドの
//! 内容から判定します。

use chrono::NaiveDate;

use crate::types::{CellCoord, CellRange, GRID_WIDTH, LAST_COL};

/// 1行分のセル（Step / Pass / Fail / Notes）
pub type GridRow = [String; GRID_WIDTH];

/// チェックボックス対象行とみなすA列の先頭キーワード
pub(crate) const STEP_MARKERS: &[&str] = &["Given ", "When ", "Then ", "And ", "But ", "* "];

/// チェックボックスを配置する列（Pass / Fail）
const CHECKBOX_COLUMNS: [u16; 2] = [1, 2];

/// エクスポートグリッド
///
/// 行データ、結合範囲、チェックボックス位置を保持します。
/// すべての結合範囲とチェックボックス位置は、グリッド内に存在する座標を参照します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportGrid {
    rows: Vec<GridRow>,
    merges: Vec<CellRange>,
    checkboxes: Vec<CellCoord>,
    generated_on: NaiveDate,
}

impl ExportGrid {
    /// 行データ
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    /// 結合範囲（追加順）
    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// チェックボックスを配置するセル（行順、Pass列→Fail列の順）
    pub fn checkboxes(&self) -> &[CellCoord] {
        &self.checkboxes
    }

    /// 生成日
    pub fn generated_on(&self) -> NaiveDate {
        self.generated_on
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// セルの値を取得（範囲外は`None`）
    pub fn cell(&self, coord: CellCoord) -> Option<&str> {
        self.rows
            .get(coord.row as usize)?
            .get(coord.col as usize)
            .map(String::as_str)
    }

    /// 指定座標を左上とする結合範囲を取得
    pub fn merge_at(&self, coord: CellCoord) -> Option<&CellRange> {
        self.merges.iter().find(|range| range.start == coord)
    }

    /// 指定座標が結合範囲の左上以外のセルかどうか
    pub fn is_merge_child(&self, coord: CellCoord) -> bool {
        self.merges
            .iter()
            .any(|range| range.contains(coord) && range.start != coord)
    }

    /// ステップ行の行番号を列挙
    pub fn step_rows(&self) -> Vec<u32> {
        find_step_rows(&self.rows)
    }
}

/// 行を順番に追加してグリッドを構築する
///
/// 現在の行番号は`rows.len()`そのものであり、行を追加するメソッドだけが更新します。
#[derive(Debug, Default)]
pub(crate) struct GridBuilder {
    rows: Vec<GridRow>,
    merges: Vec<CellRange>,
}

impl GridBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 行を追加し、その行番号を返す
    pub fn push_row(&mut self, cells: GridRow) -> u32 {
        self.rows.push(cells);
        (self.rows.len() - 1) as u32
    }

    /// A列のみに値を持つ行を追加
    pub fn push_text(&mut self, text: impl Into<String>) -> u32 {
        self.push_row([text.into(), String::new(), String::new(), String::new()])
    }

    /// 空行（区切り）を追加
    pub fn push_blank(&mut self) -> u32 {
        self.push_row(Default::default())
    }

    /// 全列を結合したバナー行を追加
    pub fn push_banner(&mut self, text: impl Into<String>) -> u32 {
        let row = self.push_text(text);
        self.merges.push(CellRange::row_span(row, 0, LAST_COL));
        row
    }

    /// A列にラベル、B〜D列を結合して値を置く行を追加
    pub fn push_labeled(&mut self, label: impl Into<String>, value: impl Into<String>) -> u32 {
        let row = self.push_row([label.into(), value.into(), String::new(), String::new()]);
        self.merges.push(CellRange::row_span(row, 1, LAST_COL));
        row
    }

    /// 構築を完了し、チェックボックス位置を判定してグリッドを返す
    pub fn finish(self, generated_on: NaiveDate) -> ExportGrid {
        let checkboxes = find_step_rows(&self.rows)
            .into_iter()
            .flat_map(|row| CHECKBOX_COLUMNS.map(|col| CellCoord::new(row, col)))
            .collect();

        ExportGrid {
            rows: self.rows,
            merges: self.merges,
            checkboxes,
            generated_on,
        }
    }
}

/// ステップ行かどうかを判定
///
/// A列がステップキーワードで始まり、B列とC列がともに空文字列の行が該当します。
/// Backgroundのステップ行もこの条件を満たすため対象になります。
pub(crate) fn is_step_row(row: &GridRow) -> bool {
    STEP_MARKERS.iter().any(|marker| row[0].starts_with(marker))
        && row[1].is_empty()
        && row[2].is_empty()
}

/// 出力済みの行からステップ行を探す
fn find_step_rows(rows: &[GridRow]) -> Vec<u32> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| is_step_row(row))
        .map(|(idx, _)| idx as u32)
        .collect()
}
