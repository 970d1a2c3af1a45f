//! Document Source Module
//!
//! IDからドキュメントのテキストを取得する機能を提供するモジュール。
//! ディレクトリ内の`manifest.json`（または`*.feature`ファイルの一覧）を
//! IDとファイルの対応表として使用します。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::SourceFormat;
use crate::error::FeatureSheetError;
use crate::security::{validate_manifest_path, SecurityConfig};

/// マニフェストのファイル名
pub const MANIFEST_FILE: &str = "manifest.json";

/// マニフェストがない場合に収集する拡張子
const FEATURE_EXTENSION: &str = "feature";

/// マニフェストの1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    /// ソースディレクトリからの相対パス
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// `manifest.json`の内容
///
/// ```json
/// {"testSuites": [{"id": "login", "file": "login.feature", "category": "Auth"}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub test_suites: Vec<ManifestEntry>,
}

impl Manifest {
    /// JSON文字列からマニフェストを読み込む
    pub fn from_json(text: &str) -> Result<Self, FeatureSheetError> {
        Ok(serde_json::from_str(text)?)
    }

    /// IDでエントリを検索
    pub fn find(&self, id: &str) -> Option<&ManifestEntry> {
        self.test_suites.iter().find(|entry| entry.id == id)
    }

    /// すべてのエントリのパスを検証
    fn validate(&self, security: &SecurityConfig) -> Result<(), FeatureSheetError> {
        security.check_manifest_entries(self.test_suites.len())?;
        for entry in &self.test_suites {
            validate_manifest_path(&entry.file)?;
        }
        Ok(())
    }
}

/// 取得したドキュメントのテキストと付随情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: String,
    pub text: String,
    pub format: SourceFormat,
    pub category: Option<String>,
    /// ファイルの更新日（取得できない場合は`None`）
    pub modified: Option<NaiveDate>,
}

/// ドキュメントの取得元
///
/// 一覧表示では複数スレッドから同時に`fetch`が呼ばれます。
pub trait DocumentSource: Send + Sync {
    /// 取得可能なドキュメントの一覧（表示順）
    fn entries(&self) -> Result<Vec<ManifestEntry>, FeatureSheetError>;

    /// IDに対応するドキュメントを取得
    ///
    /// 未知のIDの場合は`FeatureSheetError::NotFound`を返します。
    fn fetch(&self, id: &str) -> Result<RawDocument, FeatureSheetError>;
}

/// ディレクトリをドキュメントの取得元とするソース
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    manifest: Manifest,
    security: SecurityConfig,
}

impl DirectorySource {
    /// ディレクトリを開く
    ///
    /// `manifest.json`が存在すればそれを使用し、存在しなければ
    /// ディレクトリ直下の`*.feature`ファイルをファイル名順に一覧化します（IDはファイル名の語幹）。
    pub fn open(root: impl AsRef<Path>) -> Result<Self, FeatureSheetError> {
        Self::open_with_config(root, SecurityConfig::default())
    }

    /// セキュリティ設定を指定してディレクトリを開く
    pub fn open_with_config(
        root: impl AsRef<Path>,
        security: SecurityConfig,
    ) -> Result<Self, FeatureSheetError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(FeatureSheetError::NotFound(root.display().to_string()));
        }

        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.is_file() {
            let text = read_limited(&manifest_path, &security)?;
            let manifest = Manifest::from_json(&text)?;
            manifest.validate(&security)?;
            manifest
        } else {
            scan_features(&root, &security)?
        };

        debug!(
            root = %root.display(),
            entries = manifest.test_suites.len(),
            "opened document directory"
        );

        Ok(Self {
            root,
            manifest,
            security,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl DocumentSource for DirectorySource {
    fn entries(&self) -> Result<Vec<ManifestEntry>, FeatureSheetError> {
        Ok(self.manifest.test_suites.clone())
    }

    fn fetch(&self, id: &str) -> Result<RawDocument, FeatureSheetError> {
        let entry = self
            .manifest
            .find(id)
            .ok_or_else(|| FeatureSheetError::NotFound(id.to_string()))?;
        let path = self.root.join(&entry.file);
        read_document(&path, id, entry.category.clone(), &self.security)
    }
}

/// 単一ファイルをドキュメントの取得元とするソース
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    entry: ManifestEntry,
    security: SecurityConfig,
}

impl FileSource {
    /// ファイルを開く（IDはファイル名の語幹）
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeatureSheetError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(FeatureSheetError::NotFound(path.display().to_string()));
        }

        let id = file_stem(&path);
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            entry: ManifestEntry {
                id,
                file,
                category: None,
            },
            security: SecurityConfig::default(),
        })
    }

    /// セキュリティ設定を変更
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    /// ドキュメントID
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

impl DocumentSource for FileSource {
    fn entries(&self) -> Result<Vec<ManifestEntry>, FeatureSheetError> {
        Ok(vec![self.entry.clone()])
    }

    fn fetch(&self, id: &str) -> Result<RawDocument, FeatureSheetError> {
        if id != self.entry.id {
            return Err(FeatureSheetError::NotFound(id.to_string()));
        }
        read_document(&self.path, id, None, &self.security)
    }
}

/// マニフェストがないディレクトリから`*.feature`ファイルを収集
fn scan_features(root: &Path, security: &SecurityConfig) -> Result<Manifest, FeatureSheetError> {
    let mut files: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(FEATURE_EXTENSION))
        })
        .collect();
    files.sort();
    security.check_manifest_entries(files.len())?;

    let test_suites = files
        .iter()
        .map(|path| ManifestEntry {
            id: file_stem(path),
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            category: None,
        })
        .collect();

    Ok(Manifest { test_suites })
}

/// サイズ制限を確認してからファイルを読み込む
fn read_limited(path: &Path, security: &SecurityConfig) -> Result<String, FeatureSheetError> {
    let size = fs::metadata(path)?.len();
    security.check_document_size(&path.display().to_string(), size)?;
    Ok(fs::read_to_string(path)?)
}

fn read_document(
    path: &Path,
    id: &str,
    category: Option<String>,
    security: &SecurityConfig,
) -> Result<RawDocument, FeatureSheetError> {
    let metadata = fs::metadata(path)?;
    security.check_document_size(id, metadata.len())?;

    let text = fs::read_to_string(path)?;
    let modified = metadata
        .modified()
        .ok()
        .map(|time| DateTime::<Local>::from(time).date_naive());

    debug!(id, path = %path.display(), bytes = text.len(), "fetched document");

    Ok(RawDocument {
        id: id.to_string(),
        text,
        format: SourceFormat::from_path(path),
        category,
        modified,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
