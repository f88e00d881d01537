//! Opaque Document Parser
//!
//! PDFからのベストエフォートのテキスト回収。
//!
//! これは表抽出器ではありません。PDFの構造（ページ、コンテンツストリーム、
//! フォントのエンコーディング）は一切解釈せず、バイト列をUTF-8として読み、
//! 読めそうな文字の連続だけを拾い集めて1列のテーブルにします。
//! 圧縮されたストリームや画像ベースのPDFからはほとんど何も回収できません。
//!
//! このデコーダーはエラーを返しません。失敗は説明文を含む1セルのテーブルになります。

use std::io::Read;

use tracing::{debug, warn};

use crate::api::{DecodeOutcome, RecoveryStatus};
use crate::types::CanonicalTable;

/// 回収結果テーブルのヘッダー
pub const CONTENT_HEADER: &str = "Content";

/// テキストを回収できなかった場合のセル
pub const NOTHING_EXTRACTED_MESSAGE: &str =
    "PDF content could not be extracted as text. The file may contain images or complex formatting.";

/// 読み込みに失敗した場合のセル
pub const PARSE_FAILED_MESSAGE: &str = "Error parsing PDF file. Please try a different file.";

/// 不透明ドキュメントのデコーダー（デコード専用）
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DocumentTextRecovery;

impl DocumentTextRecovery {
    /// 入力全体を読み、回収したテキストを1列のテーブルとして返す
    ///
    /// 常に`DecodeOutcome::BestEffort`を返します。
    pub fn decode<R: Read>(&self, mut input: R, source_name: &str) -> DecodeOutcome {
        let mut buffer = Vec::new();
        if let Err(e) = input.read_to_end(&mut buffer) {
            warn!(source_name, error = %e, "failed to read document, returning placeholder");
            return DecodeOutcome::BestEffort {
                table: CanonicalTable::single_cell(CONTENT_HEADER, PARSE_FAILED_MESSAGE, source_name),
                status: RecoveryStatus::Failed,
            };
        }

        let text = recover_text(&buffer);
        if text.trim().is_empty() {
            debug!(source_name, "no readable text runs in document");
            return DecodeOutcome::BestEffort {
                table: CanonicalTable::single_cell(
                    CONTENT_HEADER,
                    NOTHING_EXTRACTED_MESSAGE,
                    source_name,
                ),
                status: RecoveryStatus::NothingExtracted,
            };
        }

        let rows: Vec<Vec<String>> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).trim())
            .filter(|line| !line.is_empty())
            .map(|line| vec![line.to_string()])
            .collect();

        debug!(source_name, lines = rows.len(), "recovered document text");
        DecodeOutcome::BestEffort {
            table: CanonicalTable::new(vec![CONTENT_HEADER.to_string()], rows, source_name),
            status: RecoveryStatus::Recovered,
        }
    }
}

/// 回収対象の文字クラス
///
/// ASCII英数字、空白、および`. , ; : ! ? - ( )`。
fn is_recoverable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '-' | '(' | ')')
}

/// バイト列をUTF-8（置換文字を許容）として読み、回収対象の最長連続部分を
/// 半角スペース1つで連結する
fn recover_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    decoded
        .split(|c: char| !is_recoverable(c))
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
