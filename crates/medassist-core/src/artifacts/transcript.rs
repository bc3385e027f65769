//! Transcript document — a plain Helvetica PDF of the conversation log.
//!
//! Layout is computed by [`paginate`] (pure) and rendered by
//! [`render_pdf`] with lopdf.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, StringFormat, Stream};

use crate::error::CaseError;

/// US letter, in points.
pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;
pub const LEFT_MARGIN: i64 = 30;
pub const FONT_SIZE: i64 = 10;
/// Baseline of the timestamp header (first page only).
pub const HEADER_Y: i64 = PAGE_HEIGHT - 40;
/// Baseline of the first transcript row on the first page.
pub const FIRST_ROW_Y: i64 = PAGE_HEIGHT - 60;
/// Baseline of the first row on continuation pages.
pub const CONTINUATION_ROW_Y: i64 = PAGE_HEIGHT - 40;
pub const LINE_STEP: i64 = 14;
/// A new page starts once the cursor drops below this.
pub const BOTTOM_LIMIT: i64 = 40;
/// Characters per row before wrapping. Fits the printable width at 10pt.
pub const WRAP_COLUMNS: usize = 100;

/// One text row at a fixed baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedRow {
    pub y: i64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLayout {
    pub header: Option<String>,
    pub rows: Vec<PlacedRow>,
}

/// Header text for a document produced at `timestamp`.
pub fn header_text(timestamp: chrono::DateTime<chrono::Local>) -> String {
    format!("Conversation Log - {}", timestamp.format("%Y-%m-%d %H:%M:%S"))
}

/// Word-wrap a line to `columns` characters. Words longer than a row are
/// split. An empty line stays one empty row.
pub fn wrap_line(line: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > columns {
            if current_len > 0 {
                rows.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(columns);
            rows.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > columns && current_len > 0 {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Lay transcript lines out on pages. The header sits on the first page
/// only; every line appears, wrapped, in order.
pub fn paginate(lines: &[String], header: &str) -> Vec<PageLayout> {
    let mut pages = vec![PageLayout {
        header: Some(header.to_string()),
        rows: Vec::new(),
    }];
    let mut y = FIRST_ROW_Y;

    for line in lines {
        for row in wrap_line(line, WRAP_COLUMNS) {
            if y < BOTTOM_LIMIT {
                pages.push(PageLayout::default());
                y = CONTINUATION_ROW_Y;
            }
            if let Some(page) = pages.last_mut() {
                page.rows.push(PlacedRow { y, text: row });
            }
            y -= LINE_STEP;
        }
    }
    pages
}

/// WinAnsi covers Latin-1; anything outside it prints as `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u32 as u8 } else { b'?' })
        .collect()
}

fn text_ops(ops: &mut Vec<Operation>, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
    ops.push(Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_text(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Build the PDF for `pages` in memory.
pub fn build_document(pages: &[PageLayout]) -> Result<Document, CaseError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut ops = Vec::new();
        if let Some(ref header) = page.header {
            text_ops(&mut ops, HEADER_Y, header);
        }
        for row in &page.rows {
            text_ops(&mut ops, row.y, &row.text);
        }

        let content = Content { operations: ops }
            .encode()
            .map_err(|e| CaseError::Artifact(format!("failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

/// Render the transcript to `path`.
pub fn render_pdf(lines: &[String], header: &str, path: &Path) -> Result<usize, CaseError> {
    let pages = paginate(lines, header);
    let mut doc = build_document(&pages)?;
    doc.save(path)
        .map_err(|e| CaseError::Artifact(format!("failed to write {}: {}", path.display(), e)))?;
    Ok(pages.len())
}
