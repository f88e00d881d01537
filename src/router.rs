//! Format Router Module
//!
//! ファイル名の拡張子からデコーダーを選択し、サイズ上限を適用するモジュール。
//! Content-Typeはブラウザ/OSによって揺れるため、振り分けのキーには使わず、
//! 補助的な受け入れチェックにのみ使用します。

use tracing::{debug, warn};

use crate::api::SourceFormat;
use crate::builder::IngestorConfig;
use crate::error::TableError;

/// 汎用（形式を示さない）Content-Type
const GENERIC_CONTENT_TYPES: &[&str] = &["", "application/octet-stream"];

/// 入力を振り分けて、デコードすべき形式を返す
///
/// チェックの順序:
///
/// 1. サイズ上限（上限ちょうどは許可）
/// 2. 拡張子（`csv`/`xls`/`xlsx`/`pdf`以外は`UnsupportedFormat`）
/// 3. Content-Type（既定では不一致を警告ログに残すだけ）
pub(crate) fn route(
    size: u64,
    file_name: &str,
    content_type: Option<&str>,
    config: &IngestorConfig,
) -> Result<SourceFormat, TableError> {
    config.security.check_input_size(size)?;

    let ext = extension_of(file_name)
        .ok_or_else(|| TableError::UnsupportedFormat(format!("'{}' has no extension", file_name)))?;
    let format = SourceFormat::from_extension(ext)
        .ok_or_else(|| TableError::UnsupportedFormat(ext.to_ascii_lowercase()))?;

    if let Some(declared) = content_type {
        check_content_type(format, declared, config.strict_content_type)?;
    }

    debug!(file_name, %format, size, "routed input");
    Ok(format)
}

/// ファイル名の拡張子（最後の`.`より後ろ）
///
/// `.`を含まない名前や、末尾が`.`の名前は`None`になります。
pub(crate) fn extension_of(file_name: &str) -> Option<&str> {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Content-Typeのessence部分（パラメーターを除き、小文字化）
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn check_content_type(
    format: SourceFormat,
    declared: &str,
    strict: bool,
) -> Result<(), TableError> {
    let essence = essence(declared);
    if GENERIC_CONTENT_TYPES.contains(&essence.as_str()) {
        return Ok(());
    }
    if format.content_types().contains(&essence.as_str()) {
        return Ok(());
    }

    if strict {
        return Err(TableError::UnsupportedFormat(format!(
            "content type '{}' does not match .{} file",
            essence, format
        )));
    }

    warn!(
        content_type = %essence,
        %format,
        "declared content type does not match extension, routing by extension"
    );
    Ok(())
}
