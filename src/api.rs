//! Public API Types
//!
//! 公開APIで使用する列挙型・結果型を定義するモジュール。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CanonicalTable;

/// 入力ファイルの形式
///
/// ファイル名の拡張子（大文字小文字を区別しない）から決定されます。
/// Content-Typeは補助的な受け入れチェックにのみ使用されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// カンマ区切りテキスト（`.csv`）
    Csv,
    /// Excel 97-2003 バイナリ（`.xls`）
    Xls,
    /// Office Open XML スプレッドシート（`.xlsx`）
    Xlsx,
    /// PDF（`.pdf`）。ベストエフォートのテキスト回収のみ
    Pdf,
}

impl SourceFormat {
    /// 拡張子から形式を判定する（大文字小文字を区別しない）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xls" => Some(SourceFormat::Xls),
            "xlsx" => Some(SourceFormat::Xlsx),
            "pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }

    /// 正規の拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xls => "xls",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Pdf => "pdf",
        }
    }

    /// この形式として受け入れるContent-Type（先頭が代表値）
    ///
    /// CSVはブラウザ/OSによって`application/vnd.ms-excel`や`text/plain`で
    /// 申告されることがあるため、別名も受け入れます。
    pub fn content_types(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Csv => &[
                "text/csv",
                "application/csv",
                "text/plain",
                "application/vnd.ms-excel",
            ],
            SourceFormat::Xls => &["application/vnd.ms-excel"],
            SourceFormat::Xlsx => {
                &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"]
            }
            SourceFormat::Pdf => &["application/pdf"],
        }
    }

    /// 構造化された表を生成する形式かどうか（PDFのみ`false`）
    pub fn is_structured(&self) -> bool {
        !matches!(self, SourceFormat::Pdf)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// エクスポート形式
///
/// `CanonicalTable`を書き出す先のコンテナ形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// CSV形式
    ///
    /// ```csv
    /// name,age
    /// "Grace, M",85
    /// ```
    Csv,

    /// XLSX形式（単一シート`Data`）
    Xlsx,

    /// 装飾付きの表としてレンダリングしたPDF
    ///
    /// 入力PDFの再エンコードではなく、任意のテーブルを表形式で描画したものです。
    Pdf,
}

impl ExportFormat {
    /// 出力ファイルの拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// 出力データのMIMEタイプ
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// CSVのレコード分割方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CsvLineMode {
    /// バッファ全体を1つの状態機械で走査する（デフォルト）
    ///
    /// 引用符の外側の`\n`/`\r\n`だけをレコード終端として扱います。
    /// 引用符内の改行はフィールドの一部としてそのまま保持されます。
    #[default]
    QuoteAware,

    /// 先に`\r?\n`で行分割してから各行を走査する（旧来の挙動）
    ///
    /// 改行を含む引用フィールドは2つのレコードに分断されます。
    /// 過去のデータと同じ分割結果が必要な場合のみ使用してください。
    LineFirst,
}

/// 空行（全セルが空または空白のみ）の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum BlankRowPolicy {
    /// 空行を捨てる（デフォルト）
    ///
    /// データ中に意図的に置かれた空行も消えます。
    #[default]
    Drop,

    /// スプレッドシートの空行を保持する
    ///
    /// CSVの空行はレコードを持たないため、この設定でも常に捨てられます。
    Keep,
}

/// CSVテキストのUTF-8デコード方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Utf8Policy {
    /// 不正なUTF-8シーケンスを`DecodeFailure`とする（デフォルト）
    #[default]
    Strict,

    /// 不正なシーケンスをU+FFFDに置換して続行する
    Lossy,
}

/// ベストエフォート回収の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    /// テキストを回収できた
    Recovered,
    /// 読めるテキストが見つからなかった
    NothingExtracted,
    /// 入力の読み込み中に失敗した
    Failed,
}

/// デコード結果
///
/// 本物の表抽出（CSV/スプレッドシート）と、PDFからの劣化したテキスト回収を
/// 呼び出し側が区別できるよう、タグ付きで返します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeOutcome {
    /// 構造化された表として抽出された
    Structured(CanonicalTable),

    /// ベストエフォートのテキスト回収（表構造の再構成ではない）
    BestEffort {
        /// 回収結果の1列テーブル（ヘッダーは`Content`）
        table: CanonicalTable,
        /// 回収の状態
        status: RecoveryStatus,
    },
}

impl DecodeOutcome {
    /// テーブルへの参照
    pub fn table(&self) -> &CanonicalTable {
        match self {
            DecodeOutcome::Structured(table) => table,
            DecodeOutcome::BestEffort { table, .. } => table,
        }
    }

    /// テーブルを取り出す
    pub fn into_table(self) -> CanonicalTable {
        match self {
            DecodeOutcome::Structured(table) => table,
            DecodeOutcome::BestEffort { table, .. } => table,
        }
    }

    /// ベストエフォート回収の結果かどうか
    pub fn is_best_effort(&self) -> bool {
        matches!(self, DecodeOutcome::BestEffort { .. })
    }

    /// ベストエフォート回収の状態（構造化抽出の場合は`None`）
    pub fn recovery_status(&self) -> Option<RecoveryStatus> {
        match self {
            DecodeOutcome::Structured(_) => None,
            DecodeOutcome::BestEffort { status, .. } => Some(*status),
        }
    }
}

/// エクスポート結果
///
/// 呼び出し側はこのバイト列を`file_name`で保存します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// エンコード済みのバイト列
    pub bytes: Vec<u8>,
    /// 出力ファイル名（`export_file_name`で導出）
    pub file_name: String,
    /// MIMEタイプ
    pub mime_type: &'static str,
}
