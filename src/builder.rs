//! Builder Module
//!
//! Fluent Builder APIを提供し、`Exporter`インスタンスを段階的に構築する。

use std::fmt::Write as _;
use std::io::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate};
use rayon::prelude::*;
use tracing::debug;

use crate::api::{DateFormat, OutputFormat};
use crate::document::Document;
use crate::error::FeatureSheetError;
use crate::export::{build_grid, file_name, ExportGrid};
use crate::output::OutputFormatter;

/// 既定のワークシート名
pub const DEFAULT_SHEET_NAME: &str = "Test Execution";

/// ワークシート名の最大文字数（Excelの制限）
const MAX_SHEET_NAME_LEN: usize = 31;

/// ワークシート名に使用できない文字
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// エクスポート処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ExportConfig {
    /// 「Test Date」欄の日付形式
    pub date_format: DateFormat,

    /// 生成日（`None`の場合は実行時のローカル日付）
    pub generated_on: Option<NaiveDate>,

    /// ワークシート名
    pub sheet_name: String,

    /// 出力フォーマット
    pub output_format: OutputFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: DateFormat::Long,
            generated_on: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_format: OutputFormat::Xlsx,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Exporter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use featuresheet::{DateFormat, ExporterBuilder, OutputFormat};
///
/// # fn main() -> Result<(), featuresheet::FeatureSheetError> {
/// let exporter = ExporterBuilder::new()
///     .with_date_format(DateFormat::Iso8601)
///     .with_output_format(OutputFormat::Csv)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExporterBuilder {
    /// 内部設定（構築中）
    config: ExportConfig,
}

impl Default for ExporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 日付形式: 長い英語表記（例: `October 19, 2026`）
    /// - 生成日: 実行時のローカル日付
    /// - ワークシート名: `Test Execution`
    /// - 出力フォーマット: XLSX
    pub fn new() -> Self {
        Self {
            config: ExportConfig::default(),
        }
    }

    /// 「Test Date」欄の日付形式を指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use featuresheet::{DateFormat, ExporterBuilder};
    ///
    /// let builder = ExporterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d/%m/%Y".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 生成日を固定する
    ///
    /// 指定しない場合は実行時のローカル日付を使用します。
    /// 出力を再現可能にしたい場合（テストなど）に使用します。
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.config.generated_on = Some(date);
        self
    }

    /// ワークシート名を指定する
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = name.into();
        self
    }

    /// 出力フォーマットを指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use featuresheet::{ExporterBuilder, OutputFormat};
    ///
    /// let builder = ExporterBuilder::new()
    ///     .with_output_format(OutputFormat::Json);
    /// ```
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// 設定を検証し、`Exporter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Exporter)`: 設定が有効な場合
    /// * `Err(FeatureSheetError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * カスタム日付形式が空、または不正な書式指定子を含む
    /// * ワークシート名が空、31文字を超える、または`[]:*?/\`を含む
    pub fn build(self) -> Result<Exporter, FeatureSheetError> {
        // 1. カスタム日付形式の検証
        if let DateFormat::Custom(ref pattern) = self.config.date_format {
            validate_date_pattern(pattern)?;
        }

        // 2. ワークシート名の検証
        validate_sheet_name(&self.config.sheet_name)?;

        Ok(Exporter {
            config: self.config,
        })
    }
}

fn validate_date_pattern(pattern: &str) -> Result<(), FeatureSheetError> {
    let invalid = || FeatureSheetError::Config(format!("Invalid date format string: '{}'", pattern));

    if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    // テスト用の日付でフォーマット試行
    let test_date = NaiveDate::from_ymd_opt(2025, 1, 1)
        .ok_or_else(|| FeatureSheetError::Config("Failed to create test date".to_string()))?;
    // 時刻などの指定子は日付だけでは埋められず、fmt::Errorになる
    let mut rendered = String::new();
    write!(rendered, "{}", test_date.format(pattern)).map_err(|_| invalid())?;
    if rendered.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

fn validate_sheet_name(name: &str) -> Result<(), FeatureSheetError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(FeatureSheetError::Config(format!(
            "Sheet name must be 1-{} characters: '{}'",
            MAX_SHEET_NAME_LEN, name
        )));
    }
    if let Some(ch) = name.chars().find(|ch| INVALID_SHEET_CHARS.contains(ch)) {
        return Err(FeatureSheetError::Config(format!(
            "Sheet name contains invalid character '{}': '{}'",
            ch, name
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(FeatureSheetError::Config(format!(
            "Sheet name cannot start or end with an apostrophe: '{}'",
            name
        )));
    }
    Ok(())
}

/// エクスポート処理のファサード
///
/// 正規化済みドキュメントを手動テスト記録シートに変換するメインエントリーポイントです。
///
/// # 使用例
///
/// ```rust,no_run
/// use featuresheet::{Catalog, ExporterBuilder};
///
/// # fn main() -> Result<(), featuresheet::FeatureSheetError> {
/// let catalog = Catalog::open("features")?;
/// let document = catalog.load("login")?;
///
/// let exporter = ExporterBuilder::new().build()?;
/// let bytes = exporter.export_to_buffer(&document, "https://example.com/login")?;
/// std::fs::write(exporter.file_name(&document), bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Exporter {
    /// エクスポート設定
    config: ExportConfig,
}

impl Exporter {
    /// 生成日（固定されていない場合は本日のローカル日付）
    pub fn generated_on(&self) -> NaiveDate {
        self.config
            .generated_on
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// 出力フォーマット
    pub fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }

    /// ドキュメントからエクスポートグリッドを生成する
    pub fn grid(&self, document: &Document, url: &str) -> ExportGrid {
        build_grid(document, url, self.generated_on(), &self.config.date_format)
    }

    /// ドキュメントを設定されたフォーマットで書き出す
    ///
    /// # 引数
    ///
    /// * `document` - 正規化済みドキュメント
    /// * `url` - 「Feature Link」欄に表示するURL
    /// * `output` - 出力先のライター
    pub fn export<W: Write>(
        &self,
        document: &Document,
        url: &str,
        output: W,
    ) -> Result<(), FeatureSheetError> {
        let grid = self.grid(document, url);
        self.render_grid(document, &grid, output)
    }

    fn render_grid<W: Write>(
        &self,
        document: &Document,
        grid: &ExportGrid,
        mut output: W,
    ) -> Result<(), FeatureSheetError> {
        debug!(
            id = %document.id,
            rows = grid.row_count(),
            format = ?self.config.output_format,
            "exporting document"
        );

        let formatter =
            OutputFormatter::from_format(self.config.output_format, &self.config.sheet_name);
        formatter.render(grid, &mut output)
    }

    /// ドキュメントをバイト列として書き出す
    pub fn export_to_buffer(
        &self,
        document: &Document,
        url: &str,
    ) -> Result<Vec<u8>, FeatureSheetError> {
        let mut buffer = Vec::new();
        self.export(document, url, &mut buffer)?;
        Ok(buffer)
    }

    /// ドキュメントを書き出し、`(ファイル名, 内容)`の組を返す
    ///
    /// 生成日は1回だけ決定し、「Test Date」欄とファイル名の両方に使います。
    pub fn export_named(
        &self,
        document: &Document,
        url: &str,
    ) -> Result<(String, Vec<u8>), FeatureSheetError> {
        let grid = self.grid(document, url);
        let mut buffer = Vec::new();
        self.render_grid(document, &grid, &mut buffer)?;
        Ok((self.file_name_on(document, grid.generated_on()), buffer))
    }

    /// 複数のドキュメントを並列に書き出す
    ///
    /// 結果は入力と同じ順序で、`(ファイル名, 内容)`の組として返します。
    /// いずれかの書き出しに失敗した場合は最初のエラーを返します。
    pub fn export_all<F>(
        &self,
        documents: &[Document],
        url_for: F,
    ) -> Result<Vec<(String, Vec<u8>)>, FeatureSheetError>
    where
        F: Fn(&Document) -> String + Sync,
    {
        documents
            .par_iter()
            .map(|document| self.export_named(document, &url_for(document)))
            .collect()
    }

    /// 出力ファイル名（`<slug>-test-record-<YYYY-MM-DD>.<ext>`）
    pub fn file_name(&self, document: &Document) -> String {
        self.file_name_on(document, self.generated_on())
    }

    fn file_name_on(&self, document: &Document, date: NaiveDate) -> String {
        file_name(&document.name, date, self.config.output_format.extension())
    }
}
