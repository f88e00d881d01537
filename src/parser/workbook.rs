//! Workbook Parser
//!
//! calamineを使用して、スプレッドシート（XLS/XLSX）の先頭シートを
//! `CanonicalTable`に変換するデコーダー。
//! 書式・数式・日付の解釈は行わず、保存されている生の値を文字列化します。

use std::io::{Cursor, Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, Dimensions, Range, Reader, Sheets};
use tracing::debug;

use crate::api::{BlankRowPolicy, SourceFormat};
use crate::error::TableError;
use crate::security::SecurityConfig;
use crate::types::CanonicalTable;

/// ワークブックパーサー
///
/// 入力形式はcalamineが内容から自動判定するため、拡張子が`.xls`でも
/// 中身がOOXMLであれば（その逆も）読み込めます。
#[derive(Debug, Clone)]
pub(crate) struct WorkbookParser<'a> {
    security: &'a SecurityConfig,
    blank_rows: BlankRowPolicy,
}

impl<'a> WorkbookParser<'a> {
    pub fn new(security: &'a SecurityConfig, blank_rows: BlankRowPolicy) -> Self {
        Self {
            security,
            blank_rows,
        }
    }

    /// 先頭シートをデコードする
    ///
    /// # 引数
    ///
    /// * `bytes` - スプレッドシートファイル全体
    /// * `format` - ルーティングで決定した形式（エラー報告用）
    /// * `source_name` - 元のファイル名
    ///
    /// # 戻り値
    ///
    /// * `Ok(CanonicalTable)` - 使用範囲の1行目がヘッダー、以降がデータ行
    /// * `Err(TableError::DecodeFailure)` - コンテナが壊れている場合
    /// * `Err(TableError::SecurityViolation)` - アーカイブ検査に失敗した場合
    pub fn decode(
        &self,
        bytes: &[u8],
        format: SourceFormat,
        source_name: &str,
    ) -> Result<CanonicalTable, TableError> {
        // ZIPコンテナの場合は展開前にディレクトリを検査
        self.security.inspect_archive(bytes, format)?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| TableError::decode(format, e.to_string()))?;

        // 先頭シート（ドキュメント順でインデックス0）のみ
        let sheet_name = match workbook.sheet_names().first() {
            Some(name) => name.clone(),
            None => {
                debug!(source_name, "workbook has no sheets");
                return Ok(CanonicalTable::new(Vec::new(), Vec::new(), source_name));
            }
        };
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| TableError::decode(format, e.to_string()))?;
        let declared = declared_dimensions(&mut workbook, &sheet_name);

        Ok(self.range_to_table(&range, declared, source_name))
    }

    /// 使用範囲を座標順に走査してテーブルを構築する
    ///
    /// calamineの範囲は値を持つセルだけで決まるため、書式のみの空セルで
    /// 広げられたシートの`<dimension>`があれば、その矩形まで範囲を広げます。
    /// 範囲外の座標は空文字列になります。
    fn range_to_table(
        &self,
        range: &Range<Data>,
        declared: Option<Dimensions>,
        source_name: &str,
    ) -> CanonicalTable {
        let (Some(mut start), Some(mut end)) = (range.start(), range.end()) else {
            return CanonicalTable::new(Vec::new(), Vec::new(), source_name);
        };
        if let Some(dim) = declared {
            start = (start.0.min(dim.start.0), start.1.min(dim.start.1));
            end = (end.0.max(dim.end.0), end.1.max(dim.end.1));
        }

        let record_at = |row: u32| -> Vec<String> {
            (start.1..=end.1)
                .map(|col| range.get_value((row, col)).map(stringify_cell).unwrap_or_default())
                .collect()
        };

        let headers = record_at(start.0);

        let mut dropped = 0usize;
        let mut rows = Vec::new();
        for row in (start.0 + 1)..=end.0 {
            let record = record_at(row);
            if self.blank_rows == BlankRowPolicy::Drop
                && record.iter().all(|cell| cell.trim().is_empty())
            {
                dropped += 1;
                continue;
            }
            rows.push(record);
        }

        debug!(
            ?start,
            ?end,
            columns = headers.len(),
            rows = rows.len(),
            blank_rows_dropped = dropped,
            "decoded first sheet"
        );
        CanonicalTable::new(headers, rows, source_name)
    }
}

/// XLSXシートが宣言する`<dimension>`（他の形式では`None`）
fn declared_dimensions<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet_name: &str,
) -> Option<Dimensions> {
    match workbook {
        Sheets::Xlsx(xlsx) => xlsx
            .worksheet_cells_reader(sheet_name)
            .ok()
            .map(|reader| reader.dimensions()),
        _ => None,
    }
}

/// セルの生の値を文字列化する
///
/// 日付セルは書式を適用せず、保存されているシリアル値をそのまま出力します。
pub(crate) fn stringify_cell(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Empty => String::new(),
    }
}

/// 数値を最短の10進表記にする
///
/// 絶対値が`1e21`以上、または`1e-6`未満の場合は指数表記（`1e+21`、`1.5e-7`）。
/// `-0`は`0`になります。
pub(crate) fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude.is_finite() && (magnitude >= 1e21 || magnitude < 1e-6) {
        let exp = format!("{:e}", value);
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        };
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn test_stringify_raw_values() {
        assert_eq!(stringify_cell(&Data::String(" 007 ".to_string())), " 007 ");
        assert_eq!(stringify_cell(&Data::Int(42)), "42");
        assert_eq!(stringify_cell(&Data::Float(36.0)), "36");
        assert_eq!(stringify_cell(&Data::Float(1.5)), "1.5");
        assert_eq!(stringify_cell(&Data::Float(-0.25)), "-0.25");
        assert_eq!(stringify_cell(&Data::Bool(true)), "true");
        assert_eq!(stringify_cell(&Data::Bool(false)), "false");
        assert_eq!(stringify_cell(&Data::Empty), "");
    }

    #[test]
    fn test_stringify_error_literal() {
        assert_eq!(stringify_cell(&Data::Error(CellErrorType::Div0)), "#DIV/0!");
        assert_eq!(stringify_cell(&Data::Error(CellErrorType::NA)), "#N/A");
    }

    #[test]
    fn test_stringify_iso_text_kept() {
        assert_eq!(
            stringify_cell(&Data::DateTimeIso("2024-01-31T00:00:00".to_string())),
            "2024-01-31T00:00:00"
        );
        assert_eq!(
            stringify_cell(&Data::DurationIso("PT1H".to_string())),
            "PT1H"
        );
    }

    #[test]
    fn test_range_to_table_drops_blank_rows() {
        let mut range = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("a".to_string()));
        range.set_value((0, 1), Data::String("b".to_string()));
        range.set_value((1, 0), Data::String("  ".to_string()));
        range.set_value((2, 0), Data::Int(1));
        range.set_value((3, 1), Data::Float(2.5));

        let security = SecurityConfig::default();
        let table = WorkbookParser::new(&security, BlankRowPolicy::Drop)
            .range_to_table(&range, None, "book.xlsx");

        assert_eq!(table.headers(), ["a".to_string(), "b".to_string()].as_slice());
        assert_eq!(
            table.rows(),
            &[
                vec!["1".to_string(), String::new()],
                vec![String::new(), "2.5".to_string()],
            ]
        );
    }

    #[test]
    fn test_range_to_table_keeps_blank_rows() {
        let mut range = Range::new((0, 0), (2, 0));
        range.set_value((0, 0), Data::String("h".to_string()));
        range.set_value((2, 0), Data::String("x".to_string()));

        let security = SecurityConfig::default();
        let table = WorkbookParser::new(&security, BlankRowPolicy::Keep)
            .range_to_table(&range, None, "book.xlsx");

        assert_eq!(
            table.rows(),
            &[vec![String::new()], vec!["x".to_string()]]
        );
    }

    #[test]
    fn test_range_to_table_empty() {
        let range: Range<Data> = Range::empty();
        let security = SecurityConfig::default();
        let table = WorkbookParser::new(&security, BlankRowPolicy::Drop)
            .range_to_table(&range, None, "book.xlsx");
        assert!(table.is_empty());

        // 値のないシートは宣言された`A1`があっても空
        let declared = Dimensions {
            start: (0, 0),
            end: (0, 0),
        };
        let table = WorkbookParser::new(&security, BlankRowPolicy::Drop)
            .range_to_table(&range, Some(declared), "book.xlsx");
        assert!(table.is_empty());
    }

    #[test]
    fn test_range_to_table_widens_to_declared_dimensions() {
        // 値はB2のみ、シートはA1:C3を宣言
        let mut range = Range::new((1, 1), (1, 1));
        range.set_value((1, 1), Data::String("x".to_string()));
        let declared = Dimensions {
            start: (0, 0),
            end: (2, 2),
        };

        let security = SecurityConfig::default();
        let table = WorkbookParser::new(&security, BlankRowPolicy::Keep)
            .range_to_table(&range, Some(declared), "book.xlsx");

        assert_eq!(table.headers(), vec![String::new(); 3].as_slice());
        assert_eq!(
            table.rows(),
            &[
                vec![String::new(), "x".to_string(), String::new()],
                vec![String::new(); 3],
            ]
        );
    }

    #[test]
    fn test_format_number_exponent_ranges() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(123456.789), "123456.789");
    }

    #[test]
    fn test_decode_garbage_fails() {
        let security = SecurityConfig::default();
        let result = WorkbookParser::new(&security, BlankRowPolicy::Drop).decode(
            b"this is not a spreadsheet",
            SourceFormat::Xlsx,
            "bad.xlsx",
        );
        match result {
            Err(TableError::DecodeFailure { format, .. }) => assert_eq!(format, SourceFormat::Xlsx),
            other => panic!("Expected DecodeFailure, got {:?}", other),
        }
    }
}
