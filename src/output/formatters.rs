//! Output Formatters Implementation
//!
//! 各エクスポート形式の実装を提供するモジュール。

use std::borrow::Cow;

use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::error::TableError;
use crate::types::CanonicalTable;

/// XLSXの最大行数
const XLSX_MAX_ROWS: usize = 1_048_576;
/// XLSXの最大列数
const XLSX_MAX_COLS: usize = 16_384;
/// 書き出すシート名
const XLSX_SHEET_NAME: &str = "Data";

/// CSV形式のフォーマッター
///
/// ヘッダー行を先頭に、各レコードを`,`で連結し、レコード間を`\n`で区切ります。
/// 末尾に改行は付けません。
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn render(&self, table: &CanonicalTable) -> Vec<u8> {
        let lines: Vec<String> = table
            .records()
            .map(|record| {
                record
                    .iter()
                    .map(|cell| escape_csv(cell))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();

        lines.join("\n").into_bytes()
    }
}

/// XLSX形式のフォーマッター
///
/// ヘッダー行と各行を文字列セルとして単一シートに書き込みます。
/// `=`で始まる値も数式ではなく文字列として保存されます。
/// 空セルは書式付きの空白セルとして書き込むため、シートの`<dimension>`は
/// 常にテーブル全体の矩形になります。
pub struct XlsxFormatter;

impl XlsxFormatter {
    pub fn render(&self, table: &CanonicalTable) -> Result<Vec<u8>, TableError> {
        let record_count = table.row_count() + 1;
        if record_count > XLSX_MAX_ROWS {
            return Err(TableError::EncodeFailure(format!(
                "table has {} rows including header (max: {})",
                record_count, XLSX_MAX_ROWS
            )));
        }
        if table.column_count() > XLSX_MAX_COLS {
            return Err(TableError::EncodeFailure(format!(
                "table has {} columns (max: {})",
                table.column_count(),
                XLSX_MAX_COLS
            )));
        }

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(XLSX_SHEET_NAME)?;
        // 既定書式の空白セルは出力されないため、文字列書式を付ける
        let blank = Format::new().set_num_format("@");

        for (row_idx, record) in table.records().enumerate() {
            for (col_idx, cell) in record.iter().enumerate() {
                // 上限チェック済みのため変換は失敗しない
                let (row, col) = (row_idx as u32, col_idx as u16);
                if cell.is_empty() {
                    worksheet.write_blank(row, col, &blank)?;
                } else {
                    worksheet.write_string(row, col, cell)?;
                }
            }
        }

        let bytes = workbook.save_to_buffer()?;
        debug!(
            rows = record_count,
            columns = table.column_count(),
            bytes = bytes.len(),
            "rendered xlsx"
        );
        Ok(bytes)
    }
}

/// CSV文字列をエスケープ
///
/// カンマ、ダブルクォート、改行（`\n`/`\r`）を含む場合はダブルクォートで囲み、
/// 内部のダブルクォートは2つにエスケープします。
pub(crate) fn escape_csv(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}
