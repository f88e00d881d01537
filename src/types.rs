//! Types Module
//!
//! すべてのデコーダー・エンコーダーが共有する正規テーブル型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// 形式に依存しない矩形の文字列テーブル
///
/// デコード成功ごとに1つ構築され、以降は変更されません。
/// エンコーダーは`&CanonicalTable`として何度でも参照できます。
///
/// # 不変条件
///
/// - すべての行の長さは`headers().len()`と等しい
/// - セルは常に`String`。空セルは空文字列
/// - トリム、大文字小文字の変換、数値・日付の解釈は一切行わない
/// - 行の順序は入力のまま
///
/// # 使用例
///
/// ```rust
/// use tablezero::CanonicalTable;
///
/// let table = CanonicalTable::new(
///     vec!["name".to_string(), "age".to_string()],
///     vec![vec!["Ada".to_string()]],
///     "people.csv",
/// );
/// // 短い行は空文字列で埋められる
/// assert_eq!(table.rows()[0], vec!["Ada".to_string(), String::new()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TableFields")]
pub struct CanonicalTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    source_name: String,
}

/// デシリアライズ用の未検証の構成要素
///
/// 行幅の不変条件は`CanonicalTable::new`を通して回復させます。
#[derive(Deserialize)]
struct TableFields {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    source_name: String,
}

impl From<TableFields> for CanonicalTable {
    fn from(fields: TableFields) -> Self {
        CanonicalTable::new(fields.headers, fields.rows, fields.source_name)
    }
}

impl CanonicalTable {
    /// テーブルを構築する
    ///
    /// 各行はヘッダー数に合わせて空文字列で埋めるか、切り詰めます。
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        source_name: impl Into<String>,
    ) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            headers,
            rows,
            source_name: source_name.into(),
        }
    }

    /// 1列・1行のメッセージテーブルを構築する
    pub(crate) fn single_cell(header: &str, cell: &str, source_name: &str) -> Self {
        Self::new(
            vec![header.to_string()],
            vec![vec![cell.to_string()]],
            source_name,
        )
    }

    /// ヘッダー行
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// データ行（ヘッダーを含まない）
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// 元のファイル名
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// 列数
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// データ行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// ヘッダーもデータ行もないかどうか
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// ヘッダー行を先頭に含めたレコードの列挙
    pub fn records(&self) -> impl Iterator<Item = &[String]> {
        std::iter::once(self.headers.as_slice()).chain(self.rows.iter().map(Vec::as_slice))
    }

    /// 構成要素に分解する
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>, String) {
        (self.headers, self.rows, self.source_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_pads_short_rows() {
        let table = CanonicalTable::new(strings(&["a", "b", "c"]), vec![strings(&["1"])], "t.csv");
        assert_eq!(table.rows()[0], strings(&["1", "", ""]));
    }

    #[test]
    fn test_new_truncates_long_rows() {
        let table = CanonicalTable::new(
            strings(&["a", "b"]),
            vec![strings(&["1", "2", "3", "4"])],
            "t.csv",
        );
        assert_eq!(table.rows()[0], strings(&["1", "2"]));
    }

    #[test]
    fn test_cells_are_not_trimmed() {
        let table = CanonicalTable::new(
            strings(&[" a "]),
            vec![strings(&["  007 "])],
            "t.csv",
        );
        assert_eq!(table.headers()[0], " a ");
        assert_eq!(table.rows()[0][0], "  007 ");
    }

    #[test]
    fn test_empty_and_duplicate_headers_allowed() {
        let table = CanonicalTable::new(strings(&["", "x", "x"]), vec![], "t.csv");
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 0);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_records_starts_with_headers() {
        let table = CanonicalTable::new(
            strings(&["h"]),
            vec![strings(&["r1"]), strings(&["r2"])],
            "t.csv",
        );
        let records: Vec<&[String]> = table.records().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], strings(&["h"]).as_slice());
        assert_eq!(records[2], strings(&["r2"]).as_slice());
    }

    #[test]
    fn test_deserialize_normalizes_ragged_rows() {
        let json = r#"{"headers":["a","b"],"rows":[["1"],["1","2","3"]],"source_name":"t.csv"}"#;
        let table: CanonicalTable = serde_json::from_str(json).unwrap();
        assert_eq!(
            table.rows(),
            &[strings(&["1", ""]), strings(&["1", "2"])]
        );
        assert_eq!(table.source_name(), "t.csv");
    }

    #[test]
    fn test_serde_round_trip() {
        let table = CanonicalTable::new(strings(&["x"]), vec![strings(&["1"])], "r.xlsx");
        let json = serde_json::to_string(&table).unwrap();
        let back: CanonicalTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_single_cell() {
        let table = CanonicalTable::single_cell("Content", "message", "doc.pdf");
        assert_eq!(table.headers(), strings(&["Content"]).as_slice());
        assert_eq!(table.rows(), &[strings(&["message"])]);
        assert_eq!(table.source_name(), "doc.pdf");
    }

    // プロパティベーステスト: 行幅の不変条件
    #[allow(unused_doc_comments)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[allow(unused_doc_comments)]
        /// どんな不揃いの行を渡しても、すべての行がヘッダー幅になることを検証します。
        proptest! {
            #[test]
            fn test_row_width_invariant(
                width in 0usize..8,
                rows in proptest::collection::vec(
                    proptest::collection::vec("[a-z]{0,3}", 0..12),
                    0..10
                )
            ) {
                let headers: Vec<String> = (0..width).map(|i| format!("h{}", i)).collect();
                let original = rows.clone();
                let table = CanonicalTable::new(headers, rows, "p.csv");

                prop_assert_eq!(table.row_count(), original.len());
                for (row, source) in table.rows().iter().zip(original.iter()) {
                    prop_assert_eq!(row.len(), width);
                    // 先頭のセルは入力のまま保持される
                    let kept = width.min(source.len());
                    prop_assert_eq!(&row[..kept], &source[..kept]);
                }
            }
        }
    }
}
