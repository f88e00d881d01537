//! Builder Module
//!
//! Fluent Builder APIを提供し、`Ingestor`インスタンスを段階的に構築する。

use std::io::Read;

use tracing::{debug, info};

use crate::api::{
    BlankRowPolicy, CsvLineMode, DecodeOutcome, ExportFormat, ExportedFile, SourceFormat,
    Utf8Policy,
};
use crate::error::TableError;
use crate::naming::export_file_name;
use crate::output::Exporter;
use crate::parser::{DelimitedTextParser, DocumentTextRecovery, WorkbookParser};
use crate::router;
use crate::security::SecurityConfig;
use crate::types::CanonicalTable;

/// 取り込み処理の設定を保持する内部構造体
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestorConfig {
    /// サイズ上限とアーカイブ検査の制限
    pub security: SecurityConfig,

    /// CSVのレコード分割方式
    pub csv_line_mode: CsvLineMode,

    /// スプレッドシートの空白行の扱い
    pub blank_row_policy: BlankRowPolicy,

    /// CSVの不正なUTF-8の扱い
    pub utf8_policy: Utf8Policy,

    /// Content-Typeの不一致を拒否するか
    pub strict_content_type: bool,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            security: SecurityConfig::default(),
            csv_line_mode: CsvLineMode::QuoteAware,
            blank_row_policy: BlankRowPolicy::Drop,
            utf8_policy: Utf8Policy::Strict,
            strict_content_type: false,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use tablezero::{CsvLineMode, IngestorBuilder};
///
/// # fn main() -> Result<(), tablezero::TableError> {
/// let ingestor = IngestorBuilder::new()
///     .with_max_input_size(1024 * 1024)
///     .with_csv_line_mode(CsvLineMode::LineFirst)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IngestorBuilder {
    config: IngestorConfig,
}

impl Default for IngestorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 入力サイズ上限: 50 MiB（52,428,800バイト）
    /// - CSVのレコード分割: クォートを考慮
    /// - スプレッドシートの空白行: 除去
    /// - 不正なUTF-8: エラー
    /// - Content-Typeの不一致: 警告のみ
    pub fn new() -> Self {
        Self {
            config: IngestorConfig::default(),
        }
    }

    /// 入力サイズの上限（バイト）を指定する
    ///
    /// 上限ちょうどのサイズは許可されます。
    pub fn with_max_input_size(mut self, max: u64) -> Self {
        self.config.security.max_input_size = max;
        self
    }

    /// CSVのレコード分割方式を指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use tablezero::{CsvLineMode, IngestorBuilder};
    ///
    /// // 改行で先に分割する（クォート内の改行もレコード境界になる）
    /// let builder = IngestorBuilder::new()
    ///     .with_csv_line_mode(CsvLineMode::LineFirst);
    /// ```
    pub fn with_csv_line_mode(mut self, mode: CsvLineMode) -> Self {
        self.config.csv_line_mode = mode;
        self
    }

    /// スプレッドシートの空白行の扱いを指定する
    ///
    /// CSVの空白行は常に除去されます。
    pub fn with_blank_row_policy(mut self, policy: BlankRowPolicy) -> Self {
        self.config.blank_row_policy = policy;
        self
    }

    /// CSVに含まれる不正なUTF-8の扱いを指定する
    pub fn with_utf8_policy(mut self, policy: Utf8Policy) -> Self {
        self.config.utf8_policy = policy;
        self
    }

    /// Content-Typeと拡張子の不一致を拒否するかを指定する
    ///
    /// # 引数
    ///
    /// * `strict: bool`:
    ///   * `true`: 不一致を`UnsupportedFormat`として拒否
    ///   * `false`: 警告ログを出して拡張子で振り分ける（デフォルト）
    pub fn strict_content_type(mut self, strict: bool) -> Self {
        self.config.strict_content_type = strict;
        self
    }

    /// 設定を検証し、`Ingestor`インスタンスを構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Ingestor)` - 設定が有効な場合
    /// * `Err(TableError::Config)` - 入力サイズの上限が0の場合
    pub fn build(self) -> Result<Ingestor, TableError> {
        if self.config.security.max_input_size == 0 {
            return Err(TableError::Config(
                "max input size must be greater than zero".to_string(),
            ));
        }

        Ok(Ingestor::new(self.config))
    }
}

/// 取り込みとエクスポートを実行する構造体
///
/// 状態を持たないため、同じインスタンスを複数スレッドから共有できます。
///
/// # 使用例
///
/// ```rust
/// use tablezero::{ExportFormat, IngestorBuilder};
///
/// # fn main() -> Result<(), tablezero::TableError> {
/// let ingestor = IngestorBuilder::new().build()?;
/// let outcome = ingestor.decode(b"a,b\n1,2", "data.csv", Some("text/csv"))?;
/// let file = ingestor.export(outcome.table(), ExportFormat::Xlsx)?;
/// assert_eq!(file.file_name, "data.xlsx");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: IngestorConfig,
}

impl Ingestor {
    pub(crate) fn new(config: IngestorConfig) -> Self {
        Self { config }
    }

    /// 入力ファイルをデコードする
    ///
    /// # 引数
    ///
    /// * `bytes` - ファイル全体
    /// * `file_name` - 元のファイル名（拡張子で形式を判定）
    /// * `content_type` - 宣言されたContent-Type（任意）
    ///
    /// # 戻り値
    ///
    /// * `Ok(DecodeOutcome::Structured)` - CSV/スプレッドシートの場合
    /// * `Ok(DecodeOutcome::BestEffort)` - PDFの場合（失敗も1セルのテーブルになる）
    /// * `Err(TableError)` - サイズ超過、未対応の形式、デコード失敗など
    pub fn decode(
        &self,
        bytes: &[u8],
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<DecodeOutcome, TableError> {
        let format = router::route(bytes.len() as u64, file_name, content_type, &self.config)?;

        let outcome = match format {
            SourceFormat::Csv => DecodeOutcome::Structured(
                DelimitedTextParser::new(self.config.csv_line_mode, self.config.utf8_policy)
                    .decode(bytes, file_name)?,
            ),
            SourceFormat::Xls | SourceFormat::Xlsx => DecodeOutcome::Structured(
                WorkbookParser::new(&self.config.security, self.config.blank_row_policy)
                    .decode(bytes, format, file_name)?,
            ),
            SourceFormat::Pdf => DocumentTextRecovery.decode(bytes, file_name),
        };

        info!(
            file_name,
            %format,
            columns = outcome.table().column_count(),
            rows = outcome.table().row_count(),
            best_effort = outcome.is_best_effort(),
            "decoded input"
        );
        Ok(outcome)
    }

    /// リーダーから入力を読み込んでデコードする
    ///
    /// 上限+1バイトまでしか読み込まないため、巨大なストリームも全体を
    /// メモリに載せることなく`FileTooLarge`になります。
    /// その場合のエラーの`size`は実際のサイズではなく、読み込んだバイト数です。
    pub fn decode_reader<R: Read>(
        &self,
        reader: R,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<DecodeOutcome, TableError> {
        let limit = self.config.security.max_input_size.saturating_add(1);
        let mut buffer = Vec::new();
        reader.take(limit).read_to_end(&mut buffer)?;
        debug!(file_name, bytes = buffer.len(), "read input stream");

        self.decode(&buffer, file_name, content_type)
    }

    /// テーブルを指定形式のファイルとしてエクスポートする
    ///
    /// ファイル名は元のファイル名の拡張子を置き換えたものになります。
    ///
    /// # 戻り値
    ///
    /// * `Ok(ExportedFile)` - バイト列、ファイル名、MIMEタイプ
    /// * `Err(TableError::EncodeFailure)` - 出力形式の制約を超えた場合など
    pub fn export(
        &self,
        table: &CanonicalTable,
        format: ExportFormat,
    ) -> Result<ExportedFile, TableError> {
        let bytes = Exporter::from_format(format).render(table)?;
        let file_name = export_file_name(table.source_name(), format.extension());

        info!(%file_name, bytes = bytes.len(), "exported table");
        Ok(ExportedFile {
            bytes,
            file_name,
            mime_type: format.mime_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RecoveryStatus;
    use crate::security::DEFAULT_MAX_INPUT_SIZE;
    use std::io::Cursor;

    #[test]
    fn test_ingestor_builder_new() {
        let builder = IngestorBuilder::new();
        assert_eq!(builder.config.security.max_input_size, DEFAULT_MAX_INPUT_SIZE);
        assert_eq!(builder.config.csv_line_mode, CsvLineMode::QuoteAware);
        assert_eq!(builder.config.blank_row_policy, BlankRowPolicy::Drop);
        assert_eq!(builder.config.utf8_policy, Utf8Policy::Strict);
        assert!(!builder.config.strict_content_type);
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = IngestorBuilder::new()
            .with_max_input_size(10)
            .with_csv_line_mode(CsvLineMode::LineFirst)
            .with_blank_row_policy(BlankRowPolicy::Keep)
            .with_utf8_policy(Utf8Policy::Lossy)
            .strict_content_type(true);

        assert_eq!(builder.config.security.max_input_size, 10);
        assert_eq!(builder.config.csv_line_mode, CsvLineMode::LineFirst);
        assert_eq!(builder.config.blank_row_policy, BlankRowPolicy::Keep);
        assert_eq!(builder.config.utf8_policy, Utf8Policy::Lossy);
        assert!(builder.config.strict_content_type);
    }

    #[test]
    fn test_build_success() {
        assert!(IngestorBuilder::new().build().is_ok());
    }

    #[test]
    fn test_build_with_zero_max_size() {
        match IngestorBuilder::new().with_max_input_size(0).build() {
            Err(TableError::Config(msg)) => assert!(msg.contains("max input size")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_csv_is_structured() {
        let ingestor = IngestorBuilder::new().build().unwrap();
        let outcome = ingestor.decode(b"a,b\n1,2\n", "t.csv", None).unwrap();
        assert!(!outcome.is_best_effort());
        assert_eq!(outcome.table().source_name(), "t.csv");
        assert_eq!(outcome.table().rows(), &[vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_decode_pdf_is_best_effort() {
        let ingestor = IngestorBuilder::new().build().unwrap();
        let outcome = ingestor.decode(b"Hello PDF", "doc.pdf", None).unwrap();
        assert_eq!(outcome.recovery_status(), Some(RecoveryStatus::Recovered));
    }

    #[test]
    fn test_decode_reader_stops_after_limit() {
        let ingestor = IngestorBuilder::new().with_max_input_size(8).build().unwrap();

        let ok = ingestor.decode_reader(Cursor::new(b"a,b\n1,2\n".to_vec()), "t.csv", None);
        assert!(ok.is_ok());

        match ingestor.decode_reader(Cursor::new(vec![b'x'; 1000]), "t.csv", None) {
            Err(TableError::FileTooLarge { size, max }) => {
                assert_eq!(size, 9);
                assert_eq!(max, 8);
            }
            other => panic!("Expected FileTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_export_names_and_mime() {
        let ingestor = IngestorBuilder::new().build().unwrap();
        let table = CanonicalTable::new(vec!["a".to_string()], vec![], "report.v2.xlsx");

        let csv = ingestor.export(&table, ExportFormat::Csv).unwrap();
        assert_eq!(csv.file_name, "report.v2.csv");
        assert_eq!(csv.mime_type, "text/csv;charset=utf-8");
        assert_eq!(csv.bytes, b"a".to_vec());

        let pdf = ingestor.export(&table, ExportFormat::Pdf).unwrap();
        assert_eq!(pdf.file_name, "report.v2.pdf");
        assert_eq!(pdf.mime_type, "application/pdf");
    }

    #[test]
    fn test_ingestor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Ingestor>();
        assert_send_sync::<CanonicalTable>();
    }
}
