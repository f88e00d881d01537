//! Security Module
//!
//! 入力サイズの上限と、スプレッドシート（ZIPコンテナ）の事前検査を提供します。
//! ZIP bomb攻撃、パストラバーサル攻撃への対策です。

use std::io::Cursor;

use tracing::debug;
use zip::ZipArchive;

use crate::api::SourceFormat;
use crate::error::TableError;

/// 入力ファイルの最大サイズ（50 MiB）
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 52_428_800;

/// ZIPローカルファイルヘッダーのシグネチャ
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 50MiB (52_428_800 bytes)
    pub max_input_size: u64,
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GiB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MiB (104_857_600 bytes)
    pub max_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_decompressed_size: 1_073_741_824, // 1GiB
            max_file_count: 10_000,
            max_file_size: 104_857_600, // 100MiB
        }
    }
}

impl SecurityConfig {
    /// 入力サイズの上限チェック
    ///
    /// デコード処理を開始する前に呼び出します。上限ちょうどは許可されます。
    pub fn check_input_size(&self, size: u64) -> Result<(), TableError> {
        if size > self.max_input_size {
            return Err(TableError::FileTooLarge {
                size,
                max: self.max_input_size,
            });
        }
        Ok(())
    }

    /// ZIPコンテナのディレクトリを検査する
    ///
    /// ZIPのシグネチャで始まらない入力（BIFF形式の`.xls`など）は検査対象外です。
    /// 宣言された展開後サイズを使うため、データの展開は行いません。
    ///
    /// ディレクトリ自体が読めない（途中で切れている等）場合は、危険な構造ではなく
    /// 壊れたコンテナとして`format`の`DecodeFailure`を返します。
    pub fn inspect_archive(&self, bytes: &[u8], format: SourceFormat) -> Result<(), TableError> {
        if !bytes.starts_with(ZIP_MAGIC) {
            return Ok(());
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| TableError::decode(format, format!("unreadable ZIP container: {}", e)))?;

        // ファイル数の上限
        if archive.len() > self.max_file_count {
            return Err(TableError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                archive.len(),
                self.max_file_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(|e| {
                TableError::decode(format, format!("unreadable ZIP entry {}: {}", i, e))
            })?;

            // パストラバーサル対策
            let file_name = file.name();
            validate_zip_path(file_name).map_err(|e| {
                TableError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            let file_size = file.size();
            if file_size > self.max_file_size {
                return Err(TableError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    file_name, file_size, self.max_file_size
                )));
            }

            total_decompressed_size = total_decompressed_size
                .checked_add(file_size)
                .ok_or_else(|| {
                    TableError::SecurityViolation(
                        "Total decompressed size calculation overflow".to_string(),
                    )
                })?;

            if total_decompressed_size > self.max_decompressed_size {
                return Err(TableError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, self.max_decompressed_size
                )));
            }
        }

        debug!(
            entries = archive.len(),
            decompressed = total_decompressed_size,
            "archive passed inspection"
        );
        Ok(())
    }
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、ZIPエントリのパスを検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    if path.starts_with('/') || has_drive {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
