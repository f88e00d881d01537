//! Output Format Module
//!
//! Strategy Patternによるエクスポート形式の抽象化を提供するモジュール。

mod formatters;
mod pdf;

use crate::api::ExportFormat;
use crate::error::TableError;
use crate::types::CanonicalTable;

pub use formatters::*;
pub use pdf::PdfFormatter;

/// エクスポーター（Strategy Pattern）
///
/// 各エクスポート形式（CSV, XLSX, PDF）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum Exporter {
    Csv,
    Xlsx,
    Pdf,
}

impl Exporter {
    /// エクスポート形式からエクスポーターを生成
    pub fn from_format(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Csv => Exporter::Csv,
            ExportFormat::Xlsx => Exporter::Xlsx,
            ExportFormat::Pdf => Exporter::Pdf,
        }
    }

    /// テーブルを指定された形式のバイト列に変換する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<u8>)` - エンコードされたファイル内容
    /// * `Err(TableError::EncodeFailure)` - 出力形式の制約を超えた場合など
    pub fn render(&self, table: &CanonicalTable) -> Result<Vec<u8>, TableError> {
        match self {
            Exporter::Csv => Ok(CsvFormatter.render(table)),
            Exporter::Xlsx => XlsxFormatter.render(table),
            Exporter::Pdf => PdfFormatter.render(table),
        }
    }
}
