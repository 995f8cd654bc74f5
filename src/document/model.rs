// In-memory document model
//
// A document is an ordered list of blocks. Paragraphs hold formatted runs,
// tables hold rows of cells which in turn hold paragraphs and nested tables.
// Templates are loaded into this model, mutated in place, then written back
// out. Property XML read from a template (`w:pPr`, `w:rPr`, `w:tblPr`, ...)
// is kept verbatim in the `properties` fields and wins over the modelled
// fields when the document is written.

use serde::{Deserialize, Serialize};

/// A word-processing document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Body content in document order
    pub blocks: Vec<Block>,
}

/// A body-level element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// A paragraph: an ordered sequence of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph style id (`Title`, `Heading1`, `ListBullet`, ...)
    pub style: Option<String>,
    pub runs: Vec<Run>,
    /// Raw `<w:pPr>` element from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

/// A contiguous span of text sharing one set of formatting attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
    /// Raw `<w:rPr>` element from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

/// Run-level formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormat {
    /// Font size in points
    pub size: Option<f32>,
    /// Font family
    pub font: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// A table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table style id
    pub style: Option<String>,
    pub rows: Vec<TableRow>,
    /// Raw `<w:tblPr>` element from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
    /// Raw `<w:tblGrid>` element (column widths) from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
}

/// A table row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    /// Raw `<w:trPr>` element from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

/// A table cell: paragraphs and nested tables in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
    /// Raw `<w:tcPr>` element (width, span, merge, shading) from a template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a heading. Level 0 is the document title.
    pub fn add_heading(&mut self, text: &str, level: u8) -> &mut Paragraph {
        let style = if level == 0 {
            "Title".to_string()
        } else {
            format!("Heading{}", level.min(9))
        };
        self.push_paragraph(Paragraph::with_style(text, &style))
    }

    /// Append a plain paragraph
    pub fn add_paragraph(&mut self, text: &str) -> &mut Paragraph {
        self.push_paragraph(Paragraph::new(text))
    }

    /// Append an already-built paragraph
    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        self.blocks.push(Block::Paragraph(paragraph));
        match self.blocks.last_mut() {
            Some(Block::Paragraph(p)) => p,
            _ => unreachable!("a paragraph was just pushed"),
        }
    }

    /// Append a table built from rows of cell text
    pub fn add_table(&mut self, rows: &[Vec<String>], style: Option<&str>) -> &mut Table {
        let table = Table {
            style: style.map(str::to_string),
            rows: rows
                .iter()
                .map(|row| TableRow {
                    cells: row.iter().map(|text| TableCell::new(text)).collect(),
                    ..TableRow::default()
                })
                .collect(),
            ..Table::default()
        };
        self.blocks.push(Block::Table(table));
        match self.blocks.last_mut() {
            Some(Block::Table(t)) => t,
            _ => unreachable!("a table was just pushed"),
        }
    }

    /// Body-level paragraphs (not those inside tables)
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// Tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Every paragraph in document order, including those inside table
    /// cells at any nesting depth
    pub fn all_paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut out = Vec::new();
        collect_paragraphs(&mut self.blocks, &mut out);
        out
    }

    /// Plain text of the whole document, one line per paragraph
    pub fn text(&self) -> String {
        block_lines(&self.blocks).join("\n")
    }
}

fn collect_paragraphs<'a>(blocks: &'a mut [Block], out: &mut Vec<&'a mut Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(t) => {
                for row in &mut t.rows {
                    for cell in &mut row.cells {
                        collect_paragraphs(&mut cell.blocks, out);
                    }
                }
            }
        }
    }
}

/// One line per paragraph, one tab-separated line per table row
fn block_lines(blocks: &[Block]) -> Vec<String> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph(p) => lines.push(p.text()),
            Block::Table(t) => {
                for row in &t.rows {
                    let cells: Vec<String> = row.cells.iter().map(|c| c.text()).collect();
                    lines.push(cells.join("\t"));
                }
            }
        }
    }
    lines
}

impl Paragraph {
    /// A paragraph holding one unformatted run (no run for empty text)
    pub fn new(text: &str) -> Self {
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![Run::new(text)]
        };
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn with_style(text: &str, style: &str) -> Self {
        let mut paragraph = Self::new(text);
        paragraph.style = Some(style.to_string());
        paragraph
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn add_run(&mut self, run: Run) -> &mut Run {
        self.runs.push(run);
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    /// Drop every run, keeping the paragraph style
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

impl Run {
    pub fn new(text: &str) -> Self {
        Self::with_format(text, RunFormat::default())
    }

    pub fn with_format(text: &str, format: RunFormat) -> Self {
        Self {
            text: text.to_string(),
            format,
            properties: None,
        }
    }
}

impl TableCell {
    pub fn new(text: &str) -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::new(text))],
            properties: None,
        }
    }

    /// Paragraphs directly inside the cell
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn text(&self) -> String {
        block_lines(&self.blocks).join("\n")
    }
}

impl Table {
    /// Cell text as a 2-D grid
    pub fn grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.text()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_heading_styles() {
        let mut doc = Document::new();
        doc.add_heading("Contract", 0);
        doc.add_heading("Terms", 2);
        let styles: Vec<_> = doc.paragraphs().map(|p| p.style.clone()).collect();
        assert_eq!(
            styles,
            vec![Some("Title".to_string()), Some("Heading2".to_string())]
        );
    }

    #[test]
    fn test_empty_paragraph_has_no_runs() {
        let p = Paragraph::new("");
        assert!(p.runs.is_empty());
        assert!(p.is_blank());
    }

    #[test]
    fn test_paragraph_text_concatenates_runs() {
        let mut p = Paragraph::new("Hello, ");
        p.add_run(Run::new("{{name"));
        p.add_run(Run::new("}}"));
        assert_eq!(p.text(), "Hello, {{name}}");
    }

    #[test]
    fn test_all_paragraphs_includes_table_cells() {
        let mut doc = Document::new();
        doc.add_paragraph("intro");
        doc.add_table(
            &[
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ],
            None,
        );
        assert_eq!(doc.all_paragraphs_mut().len(), 5);
        assert_eq!(doc.paragraphs().count(), 1);
    }

    #[test]
    fn test_table_grid() {
        let mut doc = Document::new();
        let rows = vec![vec!["Name".to_string(), "Qty".to_string()]];
        doc.add_table(&rows, Some("TableGrid"));
        let table = doc.tables().next().unwrap();
        assert_eq!(table.grid(), rows);
        assert_eq!(table.style.as_deref(), Some("TableGrid"));
    }

    #[test]
    fn test_nested_table_paragraphs_are_reachable() {
        let mut inner = Table::default();
        inner.rows.push(TableRow {
            cells: vec![TableCell::new("{{inner}}")],
            ..TableRow::default()
        });
        let mut outer = TableCell::new("outer");
        outer.blocks.push(Block::Table(inner));

        let mut doc = Document::new();
        doc.blocks.push(Block::Table(Table {
            rows: vec![TableRow {
                cells: vec![outer],
                ..TableRow::default()
            }],
            ..Table::default()
        }));

        let texts: Vec<String> = doc.all_paragraphs_mut().iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["outer", "{{inner}}"]);
        assert_eq!(doc.text(), "outer\n{{inner}}");
    }

    #[test]
    fn test_document_text() {
        let mut doc = Document::new();
        doc.add_heading("Title", 0);
        doc.add_table(&[vec!["x".to_string(), "y".to_string()]], None);
        assert_eq!(doc.text(), "Title\nx\ty");
    }
}
