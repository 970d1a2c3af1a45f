//! Export Module
//!
//! 正規化済みドキュメントを手動テスト記録シートに変換するモジュール。
//!
//! - `layout`: ドキュメントを行・結合範囲・チェックボックス位置に変換
//! - `style`: セル内容に基づく書式の決定
//! - `workbook`: `rust_xlsxwriter`によるXLSX書き出し

mod grid;
mod layout;
mod style;
mod workbook;

pub use grid::{ExportGrid, GridRow};
pub use layout::build_grid;
pub use style::{classify, BannerColor, CellContext, CellStyle, StepClass};
pub use workbook::write_workbook;

use chrono::NaiveDate;

/// 出力ファイル名を生成する
///
/// Feature名の英数字以外をハイフンに置き換えて小文字化し、
/// `-test-record-<YYYY-MM-DD>.<ext>`を付加します。
///
/// # 使用例
///
/// ```rust,no_run
/// use chrono::NaiveDate;
/// use featuresheet::export::file_name;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// assert_eq!(
///     file_name("User Login", date, "xlsx"),
///     "user-login-test-record-2026-10-19.xlsx"
/// );
/// ```
pub fn file_name(feature_name: &str, date: NaiveDate, extension: &str) -> String {
    let slug: String = feature_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    format!(
        "{}-test-record-{}.{}",
        slug,
        date.format("%Y-%m-%d"),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("User Login", date(), "xlsx"),
            "user-login-test-record-2026-03-07.xlsx"
        );
    }

    #[test]
    fn test_file_name_replaces_each_character() {
        // 連続する記号はまとめずに1文字ずつ置換
        assert_eq!(
            file_name("Cart: add/remove", date(), "csv"),
            "cart--add-remove-test-record-2026-03-07.csv"
        );
        assert_eq!(
            file_name("Café", date(), "json"),
            "caf--test-record-2026-03-07.json"
        );
    }

    #[test]
    fn test_file_name_empty_feature() {
        assert_eq!(file_name("", date(), "xlsx"), "-test-record-2026-03-07.xlsx");
    }
}
