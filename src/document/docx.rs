// Word package reader/writer
//
// A .docx file is a zip of XML parts. Only `word/document.xml` is modelled;
// every other part (styles, numbering, headers, media) is carried through
// byte-for-byte so a filled template keeps its look. Inside the body,
// paragraph, run, table, row and cell properties are kept as raw XML and
// written back unchanged. Drawings and other embedded objects inside the
// body are not modelled and are dropped.

use crate::document::{Block, Document, Paragraph, Run, RunFormat, Table, TableCell, TableRow};
use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DOCUMENT_PART: &str = "word/document.xml";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const DEFAULT_ROOT_TAG: &str = r#"<w:document xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#;

const DEFAULT_SECTION: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="850" w:bottom="1134" w:left="1701" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:sz w:val="56"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="100"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style><w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style><w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style><w:style w:type="table" w:styleId="LightGridAccent1"><w:name w:val="Light Grid Accent 1"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="8" w:space="0" w:color="4F81BD"/><w:left w:val="single" w:sz="8" w:space="0" w:color="4F81BD"/><w:bottom w:val="single" w:sz="8" w:space="0" w:color="4F81BD"/><w:right w:val="single" w:sz="8" w:space="0" w:color="4F81BD"/><w:insideH w:val="single" w:sz="8" w:space="0" w:color="4F81BD"/><w:insideV w:val="single" w:sz="8" w:space="0" w:color="4F81BD"/></w:tblBorders></w:tblPr><w:tblStylePr w:type="firstRow"><w:rPr><w:b/></w:rPr></w:tblStylePr></w:style></w:styles>"#;

/// Total text width used to split grid columns, in twentieths of a point
const TEXT_WIDTH_TWIPS: usize = 9355;

/// A Word package: the modelled body plus every other part verbatim
#[derive(Debug, Clone)]
pub struct DocxPackage {
    pub document: Document,
    /// `<w:document ...>` start tag, namespaces included
    root_tag: String,
    /// Body-level section properties (page size, margins)
    section: Option<String>,
    /// Every part except the main document, in archive order
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Wrap a document in a minimal package with built-in styles
    pub fn new(document: Document) -> Self {
        let parts = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels".to_string(), PACKAGE_RELS.as_bytes().to_vec()),
            (
                "word/_rels/document.xml.rels".to_string(),
                DOCUMENT_RELS.as_bytes().to_vec(),
            ),
            ("word/styles.xml".to_string(), STYLES.as_bytes().to_vec()),
        ];
        Self {
            document,
            root_tag: DEFAULT_ROOT_TAG.to_string(),
            section: Some(DEFAULT_SECTION.to_string()),
            parts,
        }
    }

    /// Open a package from disk
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a package from any seekable source
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut main_xml: Option<String> = None;
        let mut parts = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if name == DOCUMENT_PART {
                let mut xml = String::new();
                entry.read_to_string(&mut xml)?;
                main_xml = Some(xml);
            } else {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                parts.push((name, bytes));
            }
        }

        let xml = main_xml
            .ok_or_else(|| Error::document(format!("package has no {}", DOCUMENT_PART)))?;

        Ok(Self {
            document: parse_document_xml(&xml)?,
            root_tag: root_tag(&xml).unwrap_or_else(|| DEFAULT_ROOT_TAG.to_string()),
            section: section_properties(&xml),
            parts,
        })
    }

    /// Write the package to disk, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        tracing::debug!("Wrote Word package {}", path.display());
        Ok(())
    }

    /// Serialize the package into any seekable sink
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // content types first, as Word expects
        let (first, rest): (Vec<_>, Vec<_>) = self
            .parts
            .iter()
            .partition(|(name, _)| name == "[Content_Types].xml");

        for (name, bytes) in first {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        zip.start_file(DOCUMENT_PART, options)?;
        let xml = write_document_xml(&self.document, &self.root_tag, self.section.as_deref());
        zip.write_all(xml.as_bytes())?;

        for (name, bytes) in rest {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }

        zip.finish()?;
        Ok(())
    }
}

fn root_tag(xml: &str) -> Option<String> {
    let start = xml.find("<w:document")?;
    let end = xml[start..].find('>')? + start;
    let tag = &xml[start..=end];
    // a self-closing root has no body to fill
    if tag.ends_with("/>") {
        return None;
    }
    Some(tag.to_string())
}

fn section_properties(xml: &str) -> Option<String> {
    let start = xml.rfind("<w:sectPr")?;
    let tail = &xml[start..];
    if let Some(end) = tail.find("</w:sectPr>") {
        return Some(tail[..end + "</w:sectPr>".len()].to_string());
    }
    let end = tail.find("/>")?;
    Some(tail[..end + 2].to_string())
}

fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// On/off properties (`<w:b/>`, `<w:b w:val="0"/>`)
fn toggle(e: &BytesStart) -> bool {
    !matches!(attr(e, "w:val").as_deref(), Some("0") | Some("false") | Some("off"))
}

/// Property elements kept verbatim on the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Props {
    Paragraph,
    Run,
    Table,
    Grid,
    Row,
    Cell,
}

/// A table being read; nested tables stack on top of their parent
#[derive(Default)]
struct TableFrame {
    table: Table,
    row: Option<TableRow>,
    cell: Option<TableCell>,
}

#[derive(Default)]
struct BodyParser {
    blocks: Vec<Block>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_text: bool,
    tables: Vec<TableFrame>,
}

impl BodyParser {
    /// Whether `name` opens a property element that belongs to the
    /// element currently being read
    fn property_kind(&self, name: &[u8]) -> Option<Props> {
        let frame = self.tables.last();
        let outside_paragraph = self.paragraph.is_none();
        match name {
            b"w:pPr" if self.paragraph.is_some() && self.run.is_none() => Some(Props::Paragraph),
            b"w:rPr" if self.run.is_some() => Some(Props::Run),
            b"w:tblPr" if frame.is_some_and(|f| f.row.is_none()) => Some(Props::Table),
            b"w:tblGrid" if frame.is_some_and(|f| f.row.is_none()) => Some(Props::Grid),
            b"w:trPr" if frame.is_some_and(|f| f.row.is_some() && f.cell.is_none()) => Some(Props::Row),
            b"w:tcPr" if outside_paragraph && frame.is_some_and(|f| f.cell.is_some()) => {
                Some(Props::Cell)
            }
            _ => None,
        }
    }

    /// Store a raw property element and read the fields the model knows
    fn properties(&mut self, kind: Props, raw: &str) -> Result<()> {
        let owned = Some(raw.to_string());
        match kind {
            Props::Paragraph => {
                if let Some(p) = self.paragraph.as_mut() {
                    for_each_child(raw, |e| {
                        if e.name().as_ref() == b"w:pStyle" && p.style.is_none() {
                            p.style = attr(e, "w:val");
                        }
                    })?;
                    p.properties = owned;
                }
            }
            Props::Run => {
                if let Some(run) = self.run.as_mut() {
                    for_each_child(raw, |e| run_property(&mut run.format, e))?;
                    run.properties = owned;
                }
            }
            Props::Table => {
                if let Some(frame) = self.tables.last_mut() {
                    let table = &mut frame.table;
                    for_each_child(raw, |e| {
                        if e.name().as_ref() == b"w:tblStyle" {
                            table.style = attr(e, "w:val");
                        }
                    })?;
                    table.properties = owned;
                }
            }
            Props::Grid => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.table.grid = owned;
                }
            }
            Props::Row => {
                if let Some(row) = self.tables.last_mut().and_then(|f| f.row.as_mut()) {
                    row.properties = owned;
                }
            }
            Props::Cell => {
                if let Some(cell) = self.tables.last_mut().and_then(|f| f.cell.as_mut()) {
                    cell.properties = owned;
                }
            }
        }
        Ok(())
    }

    fn open(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:p" => self.paragraph = Some(Paragraph::default()),
            b"w:r" if self.paragraph.is_some() => self.run = Some(Run::default()),
            b"w:t" => self.in_text = self.run.is_some(),
            b"w:tbl" => self.tables.push(TableFrame::default()),
            b"w:tr" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.row = Some(TableRow::default());
                }
            }
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.cell = Some(TableCell::default());
                }
            }
            _ => {}
        }
    }

    fn empty(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:p" => {
                self.paragraph = Some(Paragraph::default());
                self.finish_paragraph();
            }
            b"w:tab" => self.push_text("\t"),
            b"w:br" | b"w:cr" => self.push_text("\n"),
            b"w:tc" => {
                if let Some(row) = self.tables.last_mut().and_then(|f| f.row.as_mut()) {
                    row.cells.push(TableCell::default());
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:p" => self.finish_paragraph(),
            b"w:r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    if !run.text.is_empty() {
                        paragraph.runs.push(run);
                    }
                }
            }
            b"w:t" => self.in_text = false,
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let (Some(cell), Some(row)) = (frame.cell.take(), frame.row.as_mut()) {
                        row.cells.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let Some(row) = frame.row.take() {
                        frame.table.rows.push(row);
                    }
                }
            }
            b"w:tbl" => {
                if let Some(frame) = self.tables.pop() {
                    self.push_block(Block::Table(frame.table));
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn finish_paragraph(&mut self) {
        self.run = None;
        if let Some(paragraph) = self.paragraph.take() {
            self.push_block(Block::Paragraph(paragraph));
        }
    }

    /// Body blocks go to the document, blocks inside a table to its open cell
    fn push_block(&mut self, block: Block) {
        match self.tables.last_mut() {
            Some(frame) => {
                // content between cells has nowhere to go
                if let Some(cell) = frame.cell.as_mut() {
                    cell.blocks.push(block);
                }
            }
            None => self.blocks.push(block),
        }
    }
}

fn run_property(format: &mut RunFormat, e: &BytesStart) {
    match e.name().as_ref() {
        b"w:b" => format.bold = toggle(e),
        b"w:i" => format.italic = toggle(e),
        b"w:u" => format.underline = attr(e, "w:val").as_deref() != Some("none"),
        b"w:sz" => {
            format.size = attr(e, "w:val")
                .and_then(|v| v.parse::<f32>().ok())
                .map(|half_points| half_points / 2.0);
        }
        b"w:rFonts" => {
            format.font = attr(e, "w:ascii").or_else(|| attr(e, "w:hAnsi"));
        }
        _ => {}
    }
}

/// Visit the direct children of a captured property element
fn for_each_child(raw: &str, mut visit: impl FnMut(&BytesStart)) -> Result<()> {
    let mut reader = Reader::from_str(raw);
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 1 {
                    visit(&e);
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 {
                    visit(&e);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Elements whose subtree is skipped entirely
fn is_opaque(name: &[u8]) -> bool {
    matches!(
        name,
        b"w:drawing" | b"w:pict" | b"w:object" | b"mc:AlternateContent" | b"w:sectPr" | b"w:instrText"
    )
}

/// Parse the body of `word/document.xml` into the document model
pub fn parse_document_xml(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut parser = BodyParser::default();

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                if is_opaque(e.name().as_ref()) {
                    reader.read_to_end(e.name())?;
                    continue;
                }
                if let Some(kind) = parser.property_kind(e.name().as_ref()) {
                    reader.read_to_end(e.name())?;
                    let end = reader.buffer_position() as usize;
                    parser.properties(kind, &xml[start..end])?;
                    continue;
                }
                parser.open(&e);
            }
            Event::Empty(e) => {
                if let Some(kind) = parser.property_kind(e.name().as_ref()) {
                    let end = reader.buffer_position() as usize;
                    parser.properties(kind, &xml[start..end])?;
                    continue;
                }
                parser.empty(&e);
            }
            Event::End(e) => parser.close(e.name().as_ref()),
            Event::Text(t) => {
                if parser.in_text {
                    let text = t.unescape()?;
                    parser.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(Document {
        blocks: parser.blocks,
    })
}

/// Render the document model as `word/document.xml`
pub fn write_document_xml(doc: &Document, root_tag: &str, section: Option<&str>) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(root_tag);
    xml.push_str("<w:body>");
    write_blocks(&mut xml, &doc.blocks);
    if let Some(section) = section {
        xml.push_str(section);
    }
    xml.push_str("</w:body></w:document>");
    xml
}

fn write_blocks(xml: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => write_paragraph(xml, p),
            Block::Table(t) => write_table(xml, t),
        }
    }
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) {
    xml.push_str("<w:p>");
    match (&paragraph.properties, &paragraph.style) {
        (Some(raw), _) => xml.push_str(raw),
        (None, Some(style)) => {
            xml.push_str(&format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, escape(style)));
        }
        (None, None) => {}
    }
    for run in &paragraph.runs {
        write_run(xml, run);
    }
    xml.push_str("</w:p>");
}

fn write_run(xml: &mut String, run: &Run) {
    xml.push_str("<w:r>");
    match &run.properties {
        Some(raw) => xml.push_str(raw),
        None => write_run_props(xml, &run.format),
    }

    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        for (j, segment) in line.split('\t').enumerate() {
            if j > 0 {
                xml.push_str("<w:tab/>");
            }
            if !segment.is_empty() {
                xml.push_str(r#"<w:t xml:space="preserve">"#);
                xml.push_str(&escape(segment));
                xml.push_str("</w:t>");
            }
        }
    }

    xml.push_str("</w:r>");
}

fn write_run_props(xml: &mut String, format: &RunFormat) {
    if *format == RunFormat::default() {
        return;
    }
    xml.push_str("<w:rPr>");
    if let Some(font) = &format.font {
        let font = escape(font);
        xml.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
            font
        ));
    }
    if format.bold {
        xml.push_str("<w:b/>");
    }
    if format.italic {
        xml.push_str("<w:i/>");
    }
    if let Some(size) = format.size {
        let half_points = (size * 2.0).round() as u32;
        xml.push_str(&format!(r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, half_points));
    }
    if format.underline {
        xml.push_str(r#"<w:u w:val="single"/>"#);
    }
    xml.push_str("</w:rPr>");
}

fn write_table(xml: &mut String, table: &Table) {
    let columns = table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    let width = TEXT_WIDTH_TWIPS / columns.max(1);

    xml.push_str("<w:tbl>");
    match &table.properties {
        Some(raw) => xml.push_str(raw),
        None => {
            xml.push_str("<w:tblPr>");
            if let Some(style) = &table.style {
                xml.push_str(&format!(r#"<w:tblStyle w:val="{}"/>"#, escape(style)));
            }
            xml.push_str(r#"<w:tblW w:w="0" w:type="auto"/><w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/></w:tblPr>"#);
        }
    }

    match &table.grid {
        Some(raw) => xml.push_str(raw),
        None => {
            xml.push_str("<w:tblGrid>");
            for _ in 0..columns {
                xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, width));
            }
            xml.push_str("</w:tblGrid>");
        }
    }

    for row in &table.rows {
        xml.push_str("<w:tr>");
        if let Some(raw) = &row.properties {
            xml.push_str(raw);
        }
        for cell in &row.cells {
            xml.push_str("<w:tc>");
            match &cell.properties {
                Some(raw) => xml.push_str(raw),
                None => xml.push_str(&format!(
                    r#"<w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>"#,
                    width
                )),
            }
            write_blocks(xml, &cell.blocks);
            // a cell must end with a paragraph
            if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
                xml.push_str("<w:p/>");
            }
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr>");
    }

    xml.push_str("</w:tbl>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{resolve_document, DataMap, MissPolicy};
    use std::io::Cursor;

    fn round_trip(package: &DocxPackage) -> DocxPackage {
        let mut buffer = Cursor::new(Vec::new());
        package.write_to(&mut buffer).unwrap();
        buffer.set_position(0);
        DocxPackage::from_reader(buffer).unwrap()
    }

    #[test]
    fn test_parse_runs_and_formatting() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>Terms</w:t></w:r></w:p>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:b/><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve">Dear {{client</w:t></w:r><w:r><w:t>_name}} &amp; co</w:t></w:r></w:p>
<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>
</w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].style.as_deref(), Some("Heading1"));
        // paragraph-mark formatting is not a run
        assert!(!paragraphs[0].runs[0].format.bold);

        let runs = &paragraphs[1].runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].format.size, Some(14.0));
        assert_eq!(runs[0].format.font.as_deref(), Some("Arial"));
        assert!(runs[0].format.bold);
        assert_eq!(paragraphs[1].text(), "Dear {{client_name}} & co");
    }

    #[test]
    fn test_parse_table_cells() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>
<w:tr><w:tc><w:p><w:r><w:t>{{date}}</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
</w:tbl>
<w:p/>
</w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        let table = doc.tables().next().unwrap();
        assert_eq!(table.style.as_deref(), Some("TableGrid"));
        assert_eq!(table.grid(), vec![vec!["{{date}}".to_string(), String::new()]]);
        assert_eq!(doc.paragraphs().count(), 1);
    }

    #[test]
    fn test_tabs_and_breaks() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p></w:body></w:document>"#;
        let doc = parse_document_xml(xml).unwrap();
        assert_eq!(doc.text(), "a\tb\nc");
    }

    #[test]
    fn test_drawings_are_skipped() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:drawing><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:drawing><w:t>outer</w:t></w:r></w:p></w:body></w:document>"#;
        let doc = parse_document_xml(xml).unwrap();
        assert_eq!(doc.text(), "outer");
    }

    #[test]
    fn test_new_package_round_trip() {
        let mut doc = Document::new();
        doc.add_heading("Report", 0);
        let p = doc.add_paragraph("");
        p.add_run(Run::with_format(
            "Total <5> & more",
            RunFormat {
                size: Some(12.5),
                font: Some("Times New Roman".to_string()),
                bold: true,
                italic: true,
                underline: true,
            },
        ));
        doc.add_table(
            &[
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["Bolt".to_string(), "10".to_string()],
            ],
            Some("LightGridAccent1"),
        );

        let loaded = round_trip(&DocxPackage::new(doc.clone())).document;
        assert_eq!(loaded.text(), doc.text());
        let styles: Vec<_> = loaded.paragraphs().map(|p| p.style.clone()).collect();
        assert_eq!(styles, vec![Some("Title".to_string()), None]);

        let run = &loaded.paragraphs().nth(1).unwrap().runs[0];
        assert_eq!(
            run.format,
            RunFormat {
                size: Some(12.5),
                font: Some("Times New Roman".to_string()),
                bold: true,
                italic: true,
                underline: true,
            }
        );
        assert_eq!(
            loaded.tables().next().unwrap().style.as_deref(),
            Some("LightGridAccent1")
        );
    }

    #[test]
    fn test_untouched_formatting_survives_resolution() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:color w:val="FF0000"/><w:b/></w:rPr><w:t>INVOICE</w:t></w:r></w:p>
<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:rPr><w:color w:val="00FF00"/><w:sz w:val="24"/></w:rPr><w:t>Client: {{client}}</w:t></w:r></w:p>
</w:body></w:document>"#;
        let mut doc = parse_document_xml(xml).unwrap();
        let data = DataMap::new().with("client", "ACME");
        assert_eq!(resolve_document(&mut doc, &data, MissPolicy::Empty), 1);

        let out = write_document_xml(&doc, DEFAULT_ROOT_TAG, None);
        assert!(out.contains(r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:color w:val="FF0000"/><w:b/></w:rPr>"#));
        // the resolved paragraph keeps its paragraph properties
        assert!(out.contains(r#"<w:jc w:val="right"/>"#));
        // its collapsed run keeps only size and font
        assert_eq!(out.matches("w:color").count(), 1);
        assert!(out.contains(r#"<w:sz w:val="24"/>"#));
        assert!(out.contains("Client: ACME"));
    }

    #[test]
    fn test_table_layout_survives_round_trip() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:jc w:val="center"/></w:tblPr><w:tblGrid><w:gridCol w:w="2000"/><w:gridCol w:w="7000"/></w:tblGrid>
<w:tr><w:trPr><w:tblHeader/></w:trPr><w:tc><w:tcPr><w:gridSpan w:val="2"/><w:shd w:fill="D9D9D9"/></w:tcPr><w:p><w:r><w:t>{{title}}</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p/></w:tc><w:tc><w:tcPr><w:tcW w:w="7000" w:type="dxa"/></w:tcPr><w:p><w:r><w:t>body</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl><w:p/>
</w:body></w:document>"#;
        let mut doc = parse_document_xml(xml).unwrap();
        resolve_document(&mut doc, &DataMap::new().with("title", "Summary"), MissPolicy::Empty);

        let out = write_document_xml(&doc, DEFAULT_ROOT_TAG, None);
        for fragment in [
            r#"<w:tblPr><w:tblStyle w:val="TableGrid"/><w:jc w:val="center"/></w:tblPr>"#,
            r#"<w:tblGrid><w:gridCol w:w="2000"/><w:gridCol w:w="7000"/></w:tblGrid>"#,
            r#"<w:trPr><w:tblHeader/></w:trPr>"#,
            r#"<w:tcPr><w:gridSpan w:val="2"/><w:shd w:fill="D9D9D9"/></w:tcPr>"#,
            r#"<w:tcPr><w:vMerge w:val="restart"/></w:tcPr>"#,
            r#"<w:tcPr><w:tcW w:w="7000" w:type="dxa"/></w:tcPr>"#,
        ] {
            assert!(out.contains(fragment), "missing {}", fragment);
        }
        assert!(out.contains("Summary"));
    }

    #[test]
    fn test_nested_tables_are_kept() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>
<w:tbl><w:tblPr><w:tblStyle w:val="Inner"/></w:tblPr><w:tr><w:tc><w:p><w:r><w:t>{{inner}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p/></w:tc></w:tr></w:tbl>
</w:body></w:document>"#;
        let mut doc = parse_document_xml(xml).unwrap();
        let outer = doc.tables().next().unwrap();
        let cell = &outer.rows[0].cells[0];
        assert_eq!(cell.blocks.len(), 3);
        assert!(matches!(&cell.blocks[1], Block::Table(t) if t.style.as_deref() == Some("Inner")));

        resolve_document(&mut doc, &DataMap::new().with("inner", "deep"), MissPolicy::Empty);
        let reparsed = parse_document_xml(&write_document_xml(&doc, DEFAULT_ROOT_TAG, None)).unwrap();
        assert_eq!(reparsed.text(), "outer\ndeep\n");
        let cell = &reparsed.tables().next().unwrap().rows[0].cells[0];
        assert_eq!(cell.blocks.len(), 3);
        assert!(matches!(&cell.blocks[1], Block::Table(t) if t.properties.is_some()));
    }

    #[test]
    fn test_template_parts_are_preserved() {
        let package = DocxPackage::new(Document::new());
        let loaded = round_trip(&package);
        let names: Vec<_> = loaded.parts.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"word/styles.xml"));
        assert!(names.contains(&"[Content_Types].xml"));
        assert_eq!(loaded.section.as_deref(), Some(DEFAULT_SECTION));
    }

    #[test]
    fn test_missing_document_part() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        buffer.set_position(0);
        let err = DocxPackage::from_reader(buffer).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = DocxPackage::open(Path::new("/nonexistent/template.docx")).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn test_root_tag_and_section() {
        let xml = r#"<?xml?><w:document xmlns:w="x" mc:Ignorable="w14"><w:body><w:sectPr/></w:body></w:document>"#;
        assert_eq!(
            root_tag(xml).as_deref(),
            Some(r#"<w:document xmlns:w="x" mc:Ignorable="w14">"#)
        );
        assert_eq!(section_properties(xml).as_deref(), Some("<w:sectPr/>"));
    }
}
