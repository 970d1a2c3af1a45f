//! Grid Coordinate Types
//!
//! エクスポートグリッドのセル座標と結合範囲。行は0始まり、列は`0..GRID_WIDTH`。

use std::fmt;

use serde::Serialize;

/// グリッドの列数（Step / Pass / Fail / Notes）
pub const GRID_WIDTH: usize = 4;

/// 最終列のインデックス
pub(crate) const LAST_COL: u16 = (GRID_WIDTH - 1) as u16;

/// 列番号をExcelの列名に変換（0 → `A`, 26 → `AA`）
pub(crate) fn column_letter(col: u16) -> String {
    let mut letters = Vec::new();
    let mut n = u32::from(col) + 1;
    while n > 0 {
        let digit = ((n - 1) % 26) as u8;
        letters.push(char::from(b'A' + digit));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellCoord {
    pub row: u32,
    pub col: u16,
}

impl CellCoord {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// `B14`のようなA1形式
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row + 1)
    }
}

/// 矩形のセル範囲（エクスポートでは常に1行内の結合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// `row`行の`first_col..=last_col`
    pub fn row_span(row: u32, first_col: u16, last_col: u16) -> Self {
        Self::new(CellCoord::new(row, first_col), CellCoord::new(row, last_col))
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        (self.start.row..=self.end.row).contains(&coord.row)
            && (self.start.col..=self.end.col).contains(&coord.col)
    }

    /// (行数, 列数)
    pub fn size(&self) -> (u32, u16) {
        (
            self.end.row - self.start.row + 1,
            self.end.col - self.start.col + 1,
        )
    }

    /// `A1:D1`形式
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}
