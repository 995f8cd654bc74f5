// PDF writer
//
// Builds a flow layout (title, date line, content lines, bordered table,
// signature) as positioned drawing operations, then renders them with
// printpdf's built-in Helvetica faces. Built-in fonts cover Latin-1 only.

use crate::error::{Error, Result};
use crate::template::{DataMap, DataValue};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 15.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const PT_TO_MM: f32 = 0.3528;
/// Mean Helvetica glyph width as a fraction of the font size
const GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A positioned drawing operation. Coordinates are millimetres from the
/// bottom-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Pages of drawing operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfLayout {
    pub pages: Vec<Vec<PdfOp>>,
}

impl PdfLayout {
    /// Every text string in drawing order
    pub fn texts(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flatten()
            .filter_map(|op| match op {
                PdfOp::Text { text, .. } => Some(text.as_str()),
                PdfOp::Rect { .. } => None,
            })
            .collect()
    }
}

/// Top-down flow cursor with automatic page breaks
struct Flow {
    layout: PdfLayout,
    /// Distance of the cursor from the page bottom
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            layout: PdfLayout {
                pages: vec![Vec::new()],
            },
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn page(&mut self) -> &mut Vec<PdfOp> {
        if self.layout.pages.is_empty() {
            self.layout.pages.push(Vec::new());
        }
        let last = self.layout.pages.len() - 1;
        &mut self.layout.pages[last]
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < BOTTOM_MARGIN {
            self.layout.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn ln(&mut self, height: f32) {
        self.y -= height;
        if self.y < BOTTOM_MARGIN {
            self.layout.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    /// A cell at `x` of the given width; the cursor does not move
    #[allow(clippy::too_many_arguments)]
    fn cell(
        &mut self,
        x: f32,
        width: f32,
        height: f32,
        text: &str,
        size: f32,
        bold: bool,
        align: Align,
        border: bool,
    ) {
        let top = self.y;
        if border {
            self.page().push(PdfOp::Rect {
                x,
                y: top - height,
                width,
                height,
            });
        }
        if text.is_empty() {
            return;
        }
        let text_x = match align {
            Align::Left => x + 1.0,
            Align::Center => x + ((width - text_width(text, size)) / 2.0).max(0.0),
        };
        // baseline sits about a third of the way up the cell
        let baseline = top - height / 2.0 - size * PT_TO_MM / 3.0;
        self.page().push(PdfOp::Text {
            x: text_x,
            y: baseline,
            size,
            bold,
            text: text.to_string(),
        });
    }

    /// A full-width line of text followed by a line break
    fn line(&mut self, height: f32, text: &str, size: f32, bold: bool, align: Align) {
        self.ensure(height);
        self.cell(MARGIN, CONTENT_WIDTH, height, text, size, bold, align, false);
        self.ln(height);
    }

    fn table(&mut self, rows: &[Vec<String>]) {
        let Some(header) = rows.first() else { return };
        let columns = header.len().max(1);
        let col_width = CONTENT_WIDTH / columns as f32;

        self.ln(5.0);
        self.ensure(7.0);
        for (i, text) in header.iter().enumerate() {
            let x = MARGIN + i as f32 * col_width;
            self.cell(x, col_width, 7.0, text, 11.0, true, Align::Center, true);
        }
        self.ln(7.0);

        for row in &rows[1..] {
            self.ensure(6.0);
            for (i, text) in row.iter().enumerate() {
                let x = MARGIN + i as f32 * col_width;
                self.cell(x, col_width, 6.0, text, 10.0, false, Align::Left, true);
            }
            self.ln(6.0);
        }
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH * PT_TO_MM
}

/// Lay out a PDF document from a data map
///
/// Recognised keys: `title`, `date`, `content` (split on newlines; blank
/// lines become short gaps), `table_data` and `signature`.
pub fn layout_document(data: &DataMap) -> PdfLayout {
    let mut flow = Flow::new();

    if let Some(title) = data.text("title") {
        flow.line(10.0, &title, 16.0, true, Align::Center);
        flow.ln(5.0);
    }

    if let Some(date) = data.text("date") {
        flow.line(5.0, &format!("Date: {}", date), 10.0, false, Align::Left);
        flow.ln(5.0);
    }

    if let Some(content) = data.get("content") {
        let content = match content {
            DataValue::List(items) => items
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.inline_text(),
        };
        for line in content.split('\n') {
            if line.trim().is_empty() {
                flow.ln(3.0);
            } else {
                flow.line(7.0, line, 12.0, false, Align::Left);
            }
        }
    }

    if let Some(rows) = data.table("table_data") {
        flow.table(&rows);
    }

    if let Some(signature) = data.text("signature") {
        flow.ln(10.0);
        flow.line(5.0, &format!("Signature: {}", signature), 10.0, false, Align::Left);
    }

    flow.layout
}

/// Render a layout to a PDF file
pub fn write_pdf(layout: &PdfLayout, title: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::pdf(e.to_string()))?;

    for (index, ops) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        draw_page(&layer, ops, &regular, &bold);
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| Error::pdf(e.to_string()))?;
    tracing::debug!("Wrote PDF {}", path.display());
    Ok(())
}

fn draw_page(
    layer: &PdfLayerReference,
    ops: &[PdfOp],
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    layer.set_outline_thickness(0.2);
    for op in ops {
        match op {
            PdfOp::Text {
                x,
                y,
                size,
                bold: is_bold,
                text,
            } => {
                let font = if *is_bold { bold } else { regular };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font);
            }
            PdfOp::Rect {
                x,
                y,
                width,
                height,
            } => {
                let corners = [
                    (*x, *y),
                    (*x + *width, *y),
                    (*x + *width, *y + *height),
                    (*x, *y + *height),
                ];
                let line = Line {
                    points: corners
                        .iter()
                        .map(|(px, py)| (Point::new(Mm(*px), Mm(*py)), false))
                        .collect(),
                    is_closed: true,
                };
                layer.add_line(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_order() {
        let data = DataMap::new()
            .with("title", "Invoice")
            .with("date", "2024-01-15")
            .with("content", "Line one\n\nLine two")
            .with("signature", "J. Smith");
        let layout = layout_document(&data);
        assert_eq!(
            layout.texts(),
            vec![
                "Invoice",
                "Date: 2024-01-15",
                "Line one",
                "Line two",
                "Signature: J. Smith"
            ]
        );
    }

    #[test]
    fn test_title_is_bold_and_centered() {
        let layout = layout_document(&DataMap::new().with("title", "T"));
        match &layout.pages[0][0] {
            PdfOp::Text { x, size, bold, .. } => {
                assert!(*bold);
                assert_eq!(*size, 16.0);
                assert!(*x > PAGE_WIDTH / 2.0 - 5.0);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_table_cells_have_borders() {
        let data = DataMap::from_json_str(r#"{"table_data": [["A", "B"], ["1", "2"], ["3", ""]]}"#)
            .unwrap();
        let layout = layout_document(&data);
        let rects = layout.pages[0]
            .iter()
            .filter(|op| matches!(op, PdfOp::Rect { .. }))
            .count();
        assert_eq!(rects, 6);
        // empty cell keeps its border but has no text
        assert_eq!(layout.texts(), vec!["A", "B", "1", "2", "3"]);
    }

    #[test]
    fn test_long_content_breaks_pages() {
        let content = (0..60).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let layout = layout_document(&DataMap::new().with("content", content));
        assert!(layout.pages.len() >= 2);
        for page in &layout.pages {
            for op in page {
                if let PdfOp::Text { y, .. } = op {
                    assert!(*y >= BOTTOM_MARGIN - 7.0);
                }
            }
        }
    }

    #[test]
    fn test_empty_data_gives_one_blank_page() {
        let layout = layout_document(&DataMap::new());
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].is_empty());
    }

    #[test]
    fn test_write_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        let layout = layout_document(&DataMap::new().with("title", "Hello"));
        write_pdf(&layout, "Hello", &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
