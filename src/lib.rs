//! tablezero - Loss-faithful tabular ingestion and export for CSV, Excel and PDF files
//!
//! This crate decodes an uploaded file (CSV, XLS, XLSX or PDF) into a single
//! canonical table of strings and re-encodes that table as CSV, XLSX or a styled
//! PDF report. Cell text is never trimmed, coerced or reformatted: what the source
//! stores is what the table holds.
//!
//! PDF input is not table extraction. It is a best-effort text recovery that never
//! fails, and is reported as [`DecodeOutcome::BestEffort`] so callers can tell it
//! apart from a real structured decode.
//!
//! # Quick Start
//!
//! ```rust
//! use tablezero::ExportFormat;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = tablezero::parse(b"name,age\nAda,36\n", "people.csv")?;
//!     let table = outcome.table();
//!     assert_eq!(table.headers(), ["name".to_string(), "age".to_string()].as_slice());
//!     assert_eq!(table.rows(), &[vec!["Ada".to_string(), "36".to_string()]]);
//!
//!     let file = tablezero::export(table, ExportFormat::Xlsx)?;
//!     assert_eq!(file.file_name, "people.xlsx");
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::fs::File;
//! use tablezero::{BlankRowPolicy, IngestorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ingestor = IngestorBuilder::new()
//!         .with_max_input_size(10 * 1024 * 1024)
//!         .with_blank_row_policy(BlankRowPolicy::Keep)
//!         .strict_content_type(true)
//!         .build()?;
//!
//!     let input = File::open("report.xlsx")?;
//!     let outcome = ingestor.decode_reader(input, "report.xlsx", None)?;
//!     println!("{} rows", outcome.table().row_count());
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod error;
mod naming;
mod output;
mod parser;
mod router;
mod security;
mod types;

// 公開API
pub use api::{
    BlankRowPolicy, CsvLineMode, DecodeOutcome, ExportFormat, ExportedFile, RecoveryStatus,
    SourceFormat, Utf8Policy,
};
pub use builder::{Ingestor, IngestorBuilder};
pub use error::TableError;
pub use naming::export_file_name;
pub use parser::{CONTENT_HEADER, NOTHING_EXTRACTED_MESSAGE, PARSE_FAILED_MESSAGE};
pub use security::DEFAULT_MAX_INPUT_SIZE;
pub use types::CanonicalTable;

/// デフォルト設定で入力ファイルをデコードする
///
/// Content-Typeは指定せず、ファイル名の拡張子だけで形式を判定します。
pub fn parse(bytes: &[u8], file_name: &str) -> Result<DecodeOutcome, TableError> {
    Ingestor::new(builder::IngestorConfig::default()).decode(bytes, file_name, None)
}

/// デフォルト設定でテーブルをエクスポートする
pub fn export(table: &CanonicalTable, format: ExportFormat) -> Result<ExportedFile, TableError> {
    Ingestor::new(builder::IngestorConfig::default()).export(table, format)
}
