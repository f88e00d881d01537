//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

use crate::api::SourceFormat;

/// tablezeroクレート全体で使用するエラー型
///
/// 入力ファイルの振り分け、デコード、エクスポート処理中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `FileTooLarge`: 入力がサイズ上限を超えた（デコード前に検出）
/// - `UnsupportedFormat`: 拡張子（またはContent-Type）が対応外
/// - `DecodeFailure`: CSV/スプレッドシートの内容が不正
/// - `SecurityViolation`: アーカイブ検査で危険な構造を検出
/// - `EncodeFailure`: XLSX/PDFの書き出しに失敗
/// - `Config`: ビルダー設定の検証に失敗
/// - `Io`: 呼び出し元から渡されたストリームの読み込みに失敗
///
/// PDF（不透明ドキュメント）のデコードは`DecodeFailure`を返しません。
/// 失敗は説明文を含む1セルのテーブルに変換されます。
///
/// # 使用例
///
/// ```rust,no_run
/// use tablezero::TableError;
///
/// match tablezero::parse(b"hello", "notes.txt") {
///     Err(TableError::UnsupportedFormat(ext)) => println!("unsupported: {}", ext),
///     _ => {}
/// }
/// ```
#[derive(Error, Debug)]
pub enum TableError {
    /// 入力サイズが上限を超えたエラー
    ///
    /// デコード処理を開始する前に検出されます。リトライはしません。
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge {
        /// 入力のバイト数（ストリームの場合は上限+1で打ち切った値）
        size: u64,
        /// 許容される最大バイト数
        max: u64,
    },

    /// 対応していないファイル形式
    ///
    /// 拡張子が`csv`/`xls`/`xlsx`/`pdf`以外の場合、または
    /// 厳格モードでContent-Typeが拡張子と矛盾する場合に発生します。
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 構造化フォーマット（CSV・スプレッドシート）のデコード失敗
    #[error("Failed to decode {format} file: {message}")]
    DecodeFailure {
        /// デコード対象の形式
        format: SourceFormat,
        /// 詳細メッセージ
        message: String,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb、パストラバーサルなどを含むアーカイブを検出した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// エクスポート（XLSX/PDF書き出し）の失敗
    #[error("Failed to encode output: {0}")]
    EncodeFailure(String),

    /// 設定の検証に失敗したエラー
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use tablezero::{IngestorBuilder, TableError};
    ///
    /// let result = IngestorBuilder::new().with_max_input_size(0).build();
    ///
    /// match result {
    ///     Err(TableError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub(crate) fn decode(format: SourceFormat, message: impl Into<String>) -> Self {
        TableError::DecodeFailure {
            format,
            message: message.into(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for TableError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        TableError::EncodeFailure(format!("xlsx writer: {}", err))
    }
}

impl From<lopdf::Error> for TableError {
    fn from(err: lopdf::Error) -> Self {
        TableError::EncodeFailure(format!("pdf writer: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: TableError = io_err.into();

        match error {
            TableError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_file_too_large_display() {
        let error = TableError::FileTooLarge {
            size: 52_428_801,
            max: 52_428_800,
        };
        let msg = error.to_string();
        assert!(msg.starts_with("File too large"));
        assert!(msg.contains("52428801"));
        assert!(msg.contains("52428800"));
    }

    #[test]
    fn test_decode_failure_display() {
        let error = TableError::decode(SourceFormat::Xlsx, "truncated archive");
        let msg = error.to_string();
        assert!(msg.contains("Failed to decode xlsx file"));
        assert!(msg.contains("truncated archive"));

        match error {
            TableError::DecodeFailure { format, message } => {
                assert_eq!(format, SourceFormat::Xlsx);
                assert_eq!(message, "truncated archive");
            }
            _ => panic!("Expected DecodeFailure"),
        }
    }

    #[test]
    fn test_xlsx_writer_error_conversion() {
        let error: TableError = rust_xlsxwriter::XlsxError::RowColumnLimitError.into();
        match error {
            TableError::EncodeFailure(msg) => assert!(msg.starts_with("xlsx writer")),
            _ => panic!("Expected EncodeFailure"),
        }
    }

    // エラーメッセージのフォーマット確認
    #[test]
    fn test_all_error_formats() {
        let io_err: TableError = io::Error::other("test io").into();
        assert!(io_err.to_string().starts_with("IO error"));

        let unsupported = TableError::UnsupportedFormat("txt".to_string());
        assert_eq!(unsupported.to_string(), "Unsupported format: txt");

        let security = TableError::SecurityViolation("too many files".to_string());
        assert!(security.to_string().starts_with("Security violation"));

        let encode = TableError::EncodeFailure("sheet too wide".to_string());
        assert!(encode.to_string().starts_with("Failed to encode output"));

        let config = TableError::Config("test config".to_string());
        assert!(config.to_string().starts_with("Configuration error"));
    }
}
