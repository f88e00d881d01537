//! PDF Table Renderer
//!
//! `CanonicalTable`を装飾付きの表としてPDFに描画する。
//! 入力PDFの再エンコードではなく、任意のテーブルの表示用レンダリングです。

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::TableError;
use crate::types::CanonicalTable;

// A4縦（ポイント）
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

const MARGIN: f32 = 28.0;
const TITLE_BASELINE: f32 = PAGE_HEIGHT - 57.0;
const SOURCE_BASELINE: f32 = PAGE_HEIGHT - 85.0;
/// 1ページ目の表の上端（タイトルの下）
const FIRST_TABLE_TOP: f32 = PAGE_HEIGHT - 113.0;
/// 2ページ目以降の表の上端
const TABLE_TOP: f32 = PAGE_HEIGHT - MARGIN;

const TITLE_FONT_SIZE: f32 = 16.0;
const SOURCE_FONT_SIZE: f32 = 10.0;
const CELL_FONT_SIZE: f32 = 8.0;
const CELL_PADDING: f32 = 2.0;
const ROW_HEIGHT: f32 = CELL_FONT_SIZE + CELL_PADDING * 2.0 + 2.0;
/// Helveticaの平均文字幅（em比）。列幅からの切り詰めに使う概算
const AVG_CHAR_WIDTH: f32 = 0.5;

const HEADER_FILL: [f32; 3] = [59.0 / 255.0, 130.0 / 255.0, 246.0 / 255.0];
const STRIPE_FILL: [f32; 3] = [248.0 / 255.0, 250.0 / 255.0, 252.0 / 255.0];

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// PDF形式のフォーマッター
pub struct PdfFormatter;

impl PdfFormatter {
    pub fn render(&self, table: &CanonicalTable) -> Result<Vec<u8>, TableError> {
        let layout = TableLayout::new(table.column_count());
        let pages = layout.paginate(table.row_count());

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => regular_id,
                FONT_BOLD => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for (page_idx, rows) in pages.iter().enumerate() {
            let mut ops = Vec::new();
            let top = if page_idx == 0 {
                title_block(&mut ops, table.source_name());
                FIRST_TABLE_TOP
            } else {
                TABLE_TOP
            };
            layout.draw_page(&mut ops, table, rows.clone(), top);

            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = add_page(&mut doc, pages_id, content_id);
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(PAGE_WIDTH),
                    real(PAGE_HEIGHT),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| TableError::EncodeFailure(format!("failed to write pdf: {}", e)))?;
        debug!(pages = page_count, bytes = bytes.len(), "rendered pdf");
        Ok(bytes)
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content_id: ObjectId) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}

/// 列幅と1ページあたりの行数
#[derive(Debug, Clone, Copy)]
struct TableLayout {
    columns: usize,
    column_width: f32,
}

impl TableLayout {
    fn new(columns: usize) -> Self {
        let usable = PAGE_WIDTH - MARGIN * 2.0;
        let column_width = if columns == 0 {
            usable
        } else {
            usable / columns as f32
        };
        Self {
            columns,
            column_width,
        }
    }

    /// 表の上端から下余白までに入るデータ行数（ヘッダー行を除く）
    fn rows_fitting(top: f32) -> usize {
        let slots = ((top - MARGIN) / ROW_HEIGHT).floor() as usize;
        slots.saturating_sub(1).max(1)
    }

    /// データ行をページごとの範囲に分割する（空のテーブルでも1ページ）
    fn paginate(&self, row_count: usize) -> Vec<std::ops::Range<usize>> {
        let mut pages = Vec::new();
        let mut start = 0;
        let mut capacity = Self::rows_fitting(FIRST_TABLE_TOP);
        loop {
            let end = (start + capacity).min(row_count);
            pages.push(start..end);
            if end >= row_count {
                break;
            }
            start = end;
            capacity = Self::rows_fitting(TABLE_TOP);
        }
        pages
    }

    /// ヘッダー帯と指定範囲のデータ行を描画する
    fn draw_page(
        &self,
        ops: &mut Vec<Operation>,
        table: &CanonicalTable,
        rows: std::ops::Range<usize>,
        top: f32,
    ) {
        if self.columns == 0 {
            return;
        }
        let width = self.column_width * self.columns as f32;

        // ヘッダー帯
        let header_bottom = top - ROW_HEIGHT;
        fill_rect(ops, HEADER_FILL, MARGIN, header_bottom, width, ROW_HEIGHT);
        self.draw_cells(ops, table.headers(), header_bottom, FONT_BOLD, [1.0, 1.0, 1.0]);

        for (offset, row_idx) in rows.enumerate() {
            let bottom = header_bottom - ROW_HEIGHT * (offset + 1) as f32;
            if row_idx % 2 == 1 {
                fill_rect(ops, STRIPE_FILL, MARGIN, bottom, width, ROW_HEIGHT);
            }
            self.draw_cells(ops, &table.rows()[row_idx], bottom, FONT_REGULAR, [0.0, 0.0, 0.0]);
        }
    }

    fn draw_cells(
        &self,
        ops: &mut Vec<Operation>,
        cells: &[String],
        bottom: f32,
        font: &str,
        color: [f32; 3],
    ) {
        let max_chars =
            ((self.column_width - CELL_PADDING * 2.0) / (CELL_FONT_SIZE * AVG_CHAR_WIDTH)).floor();
        let max_chars = max_chars.max(1.0) as usize;

        for (col_idx, cell) in cells.iter().enumerate() {
            let x = MARGIN + self.column_width * col_idx as f32 + CELL_PADDING;
            let y = bottom + CELL_PADDING + 2.0;
            let text = fit_to_width(cell, max_chars);
            if text.is_empty() {
                continue;
            }
            show_text(ops, font, CELL_FONT_SIZE, color, x, y, encode_win_ansi(&text));
        }
    }
}

/// 1ページ目のタイトルと元ファイル名
fn title_block(ops: &mut Vec<Operation>, source_name: &str) {
    show_text(
        ops,
        FONT_BOLD,
        TITLE_FONT_SIZE,
        [0.0, 0.0, 0.0],
        MARGIN,
        TITLE_BASELINE,
        encode_win_ansi("Data Export"),
    );
    show_text(
        ops,
        FONT_REGULAR,
        SOURCE_FONT_SIZE,
        [0.0, 0.0, 0.0],
        MARGIN,
        SOURCE_BASELINE,
        encode_win_ansi(&format!("Source: {}", source_name)),
    );
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn fill_rect(ops: &mut Vec<Operation>, rgb: [f32; 3], x: f32, y: f32, w: f32, h: f32) {
    ops.push(Operation::new("rg", rgb.iter().map(|c| real(*c)).collect()));
    ops.push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
    ops.push(Operation::new("f", vec![]));
}

fn show_text(
    ops: &mut Vec<Operation>,
    font: &str,
    size: f32,
    rgb: [f32; 3],
    x: f32,
    y: f32,
    text: Vec<u8>,
) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("rg", rgb.iter().map(|c| real(*c)).collect()));
    ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(size)]));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    ops.push(Operation::new("ET", vec![]));
}

/// セル文字列を1行に収める
///
/// 改行は空白に置き換え、列幅を超える分は`...`で切り詰めます。
fn fit_to_width(cell: &str, max_chars: usize) -> String {
    let single_line: String = cell
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    if max_chars <= 3 {
        return single_line.chars().take(max_chars).collect();
    }
    let mut clipped: String = single_line.chars().take(max_chars - 3).collect();
    clipped.push_str("...");
    clipped
}

/// WinAnsiEncoding用のバイト列に変換する
///
/// ASCIIとLatin-1補助（U+00A0〜U+00FF）以外の文字は`?`になります。
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
