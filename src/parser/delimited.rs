//! Delimited Text Parser
//!
//! CSVテキストを`CanonicalTable`に変換するデコーダー。
//! 値の解釈は一切行わず、フィールド文字列をそのまま保持します。

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::api::{CsvLineMode, SourceFormat, Utf8Policy};
use crate::error::TableError;
use crate::types::CanonicalTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 1レコード分の走査結果
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRecord {
    fields: Vec<String>,
    /// 元のテキストが空白のみだったか
    blank: bool,
}

/// CSVデコーダー
#[derive(Debug, Clone, Copy)]
pub(crate) struct DelimitedTextParser {
    line_mode: CsvLineMode,
    utf8_policy: Utf8Policy,
}

impl DelimitedTextParser {
    pub fn new(line_mode: CsvLineMode, utf8_policy: Utf8Policy) -> Self {
        Self {
            line_mode,
            utf8_policy,
        }
    }

    /// CSVバイト列をデコードする
    ///
    /// 先頭のレコードがヘッダー、以降の空白でないレコードがデータ行になります。
    /// 各行はヘッダー数に合わせて埋めるか切り詰められます。
    pub fn decode(&self, bytes: &[u8], source_name: &str) -> Result<CanonicalTable, TableError> {
        let text = self.decode_text(bytes)?;

        let records = match self.line_mode {
            CsvLineMode::QuoteAware => scan_records(&text),
            CsvLineMode::LineFirst => split_lines_then_scan(&text),
        };

        let mut records = records.into_iter();
        let headers = match records.next() {
            Some(record) => record.fields,
            None => return Ok(CanonicalTable::new(Vec::new(), Vec::new(), source_name)),
        };

        let mut dropped = 0usize;
        let rows: Vec<Vec<String>> = records
            .filter_map(|record| {
                if record.blank {
                    dropped += 1;
                    None
                } else {
                    Some(record.fields)
                }
            })
            .collect();

        debug!(
            columns = headers.len(),
            rows = rows.len(),
            blank_lines_dropped = dropped,
            "decoded delimited text"
        );
        Ok(CanonicalTable::new(headers, rows, source_name))
    }

    fn decode_text<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, TableError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match self.utf8_policy {
            Utf8Policy::Strict => std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
                TableError::decode(
                    SourceFormat::Csv,
                    format!("invalid UTF-8 sequence at byte {}", e.valid_up_to()),
                )
            }),
            Utf8Policy::Lossy => {
                let text = String::from_utf8_lossy(bytes);
                if let Cow::Owned(_) = text {
                    warn!("invalid UTF-8 in delimited text replaced with U+FFFD");
                }
                Ok(text)
            }
        }
    }
}

/// バッファ全体を1つの状態機械で走査する
///
/// 状態は{通常, 引用中}の2つ。引用中の`""`はリテラルの`"`になります。
/// 引用の外側の`\n`と`\r\n`だけがレコードを終了させ、
/// 引用中の改行はフィールドの文字としてそのまま残ります。
fn scan_records(text: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut has_content = false;
    let mut pending = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        pending = true;
        match c {
            '"' => {
                has_content = true;
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                has_content = true;
                fields.push(std::mem::take(&mut field));
            }
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                records.push(RawRecord {
                    fields: std::mem::take(&mut fields),
                    blank: !has_content,
                });
                has_content = false;
                pending = false;
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {
                chars.next();
                fields.push(std::mem::take(&mut field));
                records.push(RawRecord {
                    fields: std::mem::take(&mut fields),
                    blank: !has_content,
                });
                has_content = false;
                pending = false;
            }
            _ => {
                if !c.is_whitespace() {
                    has_content = true;
                }
                field.push(c);
            }
        }
    }

    // 改行で終わらない最後のレコード（閉じていない引用も末尾で終了させる）
    if pending {
        fields.push(field);
        records.push(RawRecord {
            fields,
            blank: !has_content,
        });
    }

    records
}

/// 先に`\r?\n`で行分割してから各行を走査する（旧来の挙動）
///
/// 改行を含む引用フィールドは行の境界で分断されます。
fn split_lines_then_scan(text: &str) -> Vec<RawRecord> {
    if text.is_empty() {
        return Vec::new();
    }

    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| {
            scan_records(line).pop().unwrap_or(RawRecord {
                fields: vec![String::new()],
                blank: true,
            })
        })
        .collect()
}
