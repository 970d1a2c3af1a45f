//! Security Module
//!
//! ドキュメントソースに対するセキュリティ制限を実装するモジュール。
//! マニフェスト経由のパストラバーサルと、巨大な入力ファイルによるメモリ枯渇への対策を提供します。

use crate::error::FeatureSheetError;

/// セキュリティ設定
///
/// ドキュメント読み込み時のセキュリティ制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// 単一ドキュメントの最大サイズ（バイト）
    /// デフォルト: 16MiB (16_777_216 bytes)
    pub max_document_size: u64,
    /// マニフェストの最大エントリ数
    /// デフォルト: 10000
    pub max_manifest_entries: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_document_size: 16_777_216, // 16MiB
            max_manifest_entries: 10_000,
        }
    }
}

impl SecurityConfig {
    /// デフォルトのセキュリティ設定を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 最大ドキュメントサイズを変更
    pub fn with_max_document_size(mut self, bytes: u64) -> Self {
        self.max_document_size = bytes;
        self
    }

    /// ドキュメントサイズを検証
    ///
    /// # 引数
    ///
    /// * `name` - エラーメッセージに含めるドキュメント名
    /// * `size` - ドキュメントのサイズ（バイト）
    pub fn check_document_size(&self, name: &str, size: u64) -> Result<(), FeatureSheetError> {
        if size > self.max_document_size {
            return Err(FeatureSheetError::SecurityViolation(format!(
                "Document '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, self.max_document_size
            )));
        }
        Ok(())
    }

    /// マニフェストのエントリ数を検証
    pub fn check_manifest_entries(&self, count: usize) -> Result<(), FeatureSheetError> {
        if count > self.max_manifest_entries {
            return Err(FeatureSheetError::SecurityViolation(format!(
                "Manifest has too many entries: {} (max: {})",
                count, self.max_manifest_entries
            )));
        }
        Ok(())
    }
}

/// マニフェストに記載されたファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、ソースディレクトリからの相対パスのみを許可します。
///
/// # 引数
///
/// * `path` - 検証するファイルパス
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(FeatureSheetError::SecurityViolation)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_manifest_path(path: &str) -> Result<(), FeatureSheetError> {
    let violation = |message: String| Err(FeatureSheetError::SecurityViolation(message));

    // 空のパスは拒否
    if path.is_empty() {
        return violation("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Unix形式の`/`やWindows形式のドライブレター）
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || has_drive {
        return violation(format!("Absolute path is not allowed: {}", path));
    }

    // `..`を含むパスを拒否（ディレクトリトラバーサル攻撃）
    if path.contains("..") {
        return violation(format!("Path traversal detected: {}", path));
    }

    // `\`を含むパスを拒否（Windows形式のパスセパレータ）
    if path.contains('\\') {
        return violation(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
