//! Parser Module
//!
//! 入力形式ごとのデコーダー。いずれも入力全体をメモリ上に置いて1パスで処理します。

mod delimited;
mod document;
mod workbook;

pub(crate) use delimited::DelimitedTextParser;
pub(crate) use document::DocumentTextRecovery;
pub use document::{CONTENT_HEADER, NOTHING_EXTRACTED_MESSAGE, PARSE_FAILED_MESSAGE};
pub(crate) use workbook::WorkbookParser;
