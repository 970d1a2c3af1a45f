//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// featuresheetクレート全体で使用するエラー型
///
/// ドキュメントの取得、構文解析、正規化、エクスポート処理中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ファイル読み込み失敗など）
/// - `NotFound`: 指定されたIDに対応するドキュメントが存在しない
/// - `MalformedDocument`: 構文解析は成功したがFeatureノードが存在しない
/// - `Syntax`: Gherkinテキストの構造が不正
/// - `Json`: Cucumber messages JSONやマニフェストの解析エラー
/// - `Xlsx`: ワークブックの書き出しエラー（rust_xlsxwriter由来）
/// - `Config`: 設定の検証に失敗したエラー
/// - `SecurityViolation`: サイズ制限やパス検証に違反したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use featuresheet::FeatureSheetError;
///
/// fn read_feature(path: &str) -> Result<String, FeatureSheetError> {
///     let text = std::fs::read_to_string(path)?;  // Ioエラーが自動的に変換される
///     Ok(text)
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FeatureSheetError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 指定されたIDのドキュメントが存在しない
    ///
    /// 一覧表示では呼び出し側に伝播せず、該当エントリをスキップします。
    #[error("Document not found: {0}")]
    NotFound(String),

    /// ルートのFeatureノードを持たないドキュメント
    ///
    /// 部分的なドキュメントは返さず、このエラーで失敗します。
    #[error("Malformed document '{0}': no feature node found")]
    MalformedDocument(String),

    /// Gherkinテキストの構文エラー
    #[error("Syntax error at line {line}: {message}")]
    Syntax {
        /// エラーが発生した行番号（1始まり）
        line: usize,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// JSONの解析・生成エラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ワークブック書き出し時のエラー
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// 設定の検証に失敗したエラー
    ///
    /// `ExporterBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、シート名が長すぎる場合や、
    /// カスタム日付形式が空の場合などです。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use featuresheet::{ExporterBuilder, FeatureSheetError};
    ///
    /// let result = ExporterBuilder::new()
    ///     .with_sheet_name("bad/name")
    ///     .build();
    ///
    /// match result {
    ///     Err(FeatureSheetError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ドキュメントサイズ上限の超過や、マニフェスト内の
    /// パストラバーサルを検出した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl FeatureSheetError {
    /// 構文エラーを生成するヘルパー
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        FeatureSheetError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// ドキュメントが存在しないことを表すエラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeatureSheetError::NotFound(_))
    }
}
