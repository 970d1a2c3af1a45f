//! featuresheet - Gherkin feature files to manual test execution workbooks
//!
//! This crate parses Gherkin feature files (or Cucumber messages JSON), normalizes
//! them into a display-ready document tree, and exports each document as a manual
//! test record: an XLSX worksheet with merged banner rows, styled steps and
//! Pass/Fail checkbox columns. The same grid can be written as CSV or JSON, and
//! documents can be rendered as Markdown for review.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use featuresheet::{Catalog, ExporterBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open a directory of `.feature` files (or one with a manifest.json)
//!     let catalog = Catalog::open("features")?;
//!     let document = catalog.load("login")?;
//!
//!     // Create an exporter with default settings (XLSX, long test date)
//!     let exporter = ExporterBuilder::new().build()?;
//!
//!     let output = File::create(exporter.file_name(&document))?;
//!     exporter.export(&document, "https://example.com/features/login", output)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Listing Documents
//!
//! ```rust,no_run
//! use featuresheet::Catalog;
//!
//! # fn main() -> Result<(), featuresheet::FeatureSheetError> {
//! let catalog = Catalog::open("features")?;
//! for summary in catalog.list()? {
//!     println!("{} [{}] {}", summary.title, summary.status, summary.last_updated);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use featuresheet::{DateFormat, ExporterBuilder, OutputFormat};
//!
//! # fn main() -> Result<(), featuresheet::FeatureSheetError> {
//! let exporter = ExporterBuilder::new()
//!     .with_date_format(DateFormat::Iso8601)
//!     .with_generated_on(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"))
//!     .with_sheet_name("Regression")
//!     .with_output_format(OutputFormat::Csv)
//!     .build()?;
//! # let _ = exporter;
//! # Ok(())
//! # }
//! ```

mod api;
mod builder;
mod catalog;
mod document;
mod error;
pub mod export;
pub mod gherkin;
mod normalizer;
mod output;
mod render;
mod security;
mod source;
mod types;

// 公開API
pub use api::{DateFormat, OutputFormat, RenderFormat, SourceFormat};
pub use builder::{Exporter, ExporterBuilder, DEFAULT_SHEET_NAME};
pub use catalog::{Catalog, CategoryGroup, SuiteSummary};
pub use document::{Background, Document, Examples, Rule, Scenario, Step, StepKeyword};
pub use error::FeatureSheetError;
pub use normalizer::normalize;
pub use output::{CsvFormatter, JsonFormatter, OutputFormatter};
pub use render::{render, render_to_string};
pub use security::SecurityConfig;
pub use source::{
    DirectorySource, DocumentSource, FileSource, Manifest, ManifestEntry, RawDocument,
    MANIFEST_FILE,
};
pub use types::{CellCoord, CellRange, GRID_WIDTH};
