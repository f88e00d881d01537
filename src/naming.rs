//! Export Naming Module
//!
//! 入力ファイル名と出力拡張子から、出力ファイル名を導出する。

/// 出力ファイル名を導出する
///
/// 最後の`.拡張子`を取り除いたベース名に、`target_extension`を付けます。
/// `.`を含まない名前、または先頭の`.`しか持たない名前（例: `.csv`）は
/// 全体をベース名として扱います。
///
/// # 使用例
///
/// ```rust
/// use tablezero::export_file_name;
///
/// assert_eq!(export_file_name("report.2024.xlsx", "csv"), "report.2024.csv");
/// assert_eq!(export_file_name("README", "pdf"), "README.pdf");
/// ```
pub fn export_file_name(source_name: &str, target_extension: &str) -> String {
    let base = match source_name.rfind('.') {
        Some(idx) if idx > 0 => &source_name[..idx],
        _ => source_name,
    };
    format!("{}.{}", base, target_extension)
}
