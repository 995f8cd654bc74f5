// Spreadsheet writer
//
// Sheets are laid out in memory first (cells, merges, column widths) and
// then written with rust_xlsxwriter. Keeping the layout separate lets the
// placement rules be checked without reading a workbook back.

use crate::error::Result;
use crate::template::{DataMap, DataValue, Scalar};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook};
use std::collections::BTreeMap;
use std::path::Path;

/// Widest a column is auto-sized to, in character units
const MAX_COLUMN_WIDTH: f64 = 50.0;

/// Last column (D) spanned by a sheet title
const TITLE_LAST_COL: u16 = 3;

const TABLE_HEADER_FILL: u32 = 0xCCCCCC;
const REPORT_HEADER_FILL: u32 = 0x4472C4;

/// Headers of the financial report table
pub const REPORT_HEADERS: [&str; 4] = ["Indicator", "Value", "Unit", "Note"];

/// Unit used when a report row names none
pub const DEFAULT_UNIT: &str = "RUB";

/// Visual role of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellStyle {
    #[default]
    Plain,
    /// 16 pt bold, centered
    Title,
    /// Bold on grey fill, centered
    TableHeader,
    /// Bold white on blue fill
    ReportHeader,
}

/// A cell placed on a sheet. Rows and columns are zero-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: Scalar,
    pub style: CellStyle,
    /// Thin border on all four sides
    pub border: bool,
    /// Merge across to this column on the same row
    pub merge_to: Option<u16>,
}

impl Cell {
    fn new(row: u32, col: u16, value: impl Into<Scalar>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
            style: CellStyle::Plain,
            border: false,
            merge_to: None,
        }
    }

    fn styled(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }
}

/// One worksheet ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub cells: Vec<Cell>,
    /// Column index to width in character units
    pub widths: BTreeMap<u16, f64>,
}

impl SheetLayout {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            widths: BTreeMap::new(),
        }
    }

    /// Cell at a position, if one was placed there
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Size every used column to its longest value plus padding, capped
    fn fit_columns(&mut self) {
        let mut longest: BTreeMap<u16, usize> = BTreeMap::new();
        for cell in &self.cells {
            let len = cell.value.to_string().chars().count();
            let entry = longest.entry(cell.col).or_insert(0);
            *entry = (*entry).max(len);
        }
        self.widths = longest
            .into_iter()
            .map(|(col, len)| (col, (len as f64 + 2.0).min(MAX_COLUMN_WIDTH)))
            .collect();
    }

    /// Border every non-empty cell
    fn border_filled_cells(&mut self) {
        for cell in &mut self.cells {
            if !cell.value.to_string().is_empty() {
                cell.border = true;
            }
        }
    }
}

/// Lay out the general-purpose sheet: title, table, key/value block
///
/// Recognised keys: `sheet_name`, `title`, `table_data` (first row =
/// headers) and `additional_data` (a record).
pub fn table_sheet(data: &DataMap) -> SheetLayout {
    let name = data.text("sheet_name").unwrap_or_else(|| "Sheet1".to_string());
    let mut sheet = SheetLayout::new(&name);
    let mut row: u32 = 0;

    if let Some(title) = data.text("title") {
        let mut cell = Cell::new(row, 0, title).styled(CellStyle::Title);
        cell.merge_to = Some(TITLE_LAST_COL);
        sheet.cells.push(cell);
        row += 2;
    }

    let table = match data.get("table_data") {
        Some(DataValue::Table(rows)) if !rows.is_empty() => Some(rows),
        _ => None,
    };

    if let Some(rows) = table {
        for (col, header) in rows[0].iter().enumerate() {
            sheet.cells.push(
                Cell::new(row, col as u16, header.to_string()).styled(CellStyle::TableHeader),
            );
        }
        row += 1;

        for values in &rows[1..] {
            for (col, value) in values.iter().enumerate() {
                sheet.cells.push(Cell::new(row, col as u16, value.clone()));
            }
            row += 1;
        }
    }

    if let Some(DataValue::Record(extra)) = data.get("additional_data") {
        row += 1;
        for (key, value) in extra {
            sheet.cells.push(Cell::new(row, 0, key.as_str()));
            sheet.cells.push(Cell::new(row, 1, value.to_string()));
            row += 1;
        }
    }

    sheet.fit_columns();
    if table.is_some() {
        sheet.border_filled_cells();
    }
    sheet
}

/// Lay out the financial report sheet
///
/// Recognised keys: `report_title`, `date` and `financial_data` (records
/// with `name`, `value`, `unit`, `note`).
pub fn report_sheet(data: &DataMap) -> SheetLayout {
    let mut sheet = SheetLayout::new("Report");

    let title = data
        .text("report_title")
        .unwrap_or_else(|| "Financial Report".to_string());
    let mut title_cell = Cell::new(0, 0, title).styled(CellStyle::Title);
    title_cell.merge_to = Some(TITLE_LAST_COL);
    sheet.cells.push(title_cell);

    let date = data.text("date").unwrap_or_default();
    sheet
        .cells
        .push(Cell::new(1, 0, format!("Generated: {}", date)));

    if let Some(DataValue::Records(items)) = data.get("financial_data") {
        let mut row: u32 = 3;
        for (col, header) in REPORT_HEADERS.iter().enumerate() {
            sheet
                .cells
                .push(Cell::new(row, col as u16, *header).styled(CellStyle::ReportHeader));
        }
        row += 1;

        for item in items {
            let field = |key: &str| item.get(key).cloned();
            sheet.cells.push(Cell::new(row, 0, field("name").unwrap_or(Scalar::from(""))));
            sheet.cells.push(Cell::new(row, 1, field("value").unwrap_or(Scalar::from(""))));
            sheet.cells.push(Cell::new(
                row,
                2,
                field("unit").unwrap_or(Scalar::from(DEFAULT_UNIT)),
            ));
            sheet.cells.push(Cell::new(row, 3, field("note").unwrap_or(Scalar::from(""))));
            row += 1;
        }
    }

    sheet.fit_columns();
    sheet
}

fn cell_format(cell: &Cell) -> Format {
    let mut format = match cell.style {
        CellStyle::Plain => Format::new(),
        CellStyle::Title => Format::new()
            .set_bold()
            .set_font_size(16)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter),
        CellStyle::TableHeader => Format::new()
            .set_bold()
            .set_background_color(Color::RGB(TABLE_HEADER_FILL))
            .set_pattern(FormatPattern::Solid)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter),
        CellStyle::ReportHeader => Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(REPORT_HEADER_FILL))
            .set_pattern(FormatPattern::Solid),
    };
    if cell.border {
        format = format.set_border(FormatBorder::Thin);
    }
    format
}

/// Write a single-sheet workbook
pub fn write_workbook(sheet: &SheetLayout, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.name)?;

    for cell in &sheet.cells {
        let format = cell_format(cell);
        if let Some(last_col) = cell.merge_to {
            worksheet.merge_range(
                cell.row,
                cell.col,
                cell.row,
                last_col,
                &cell.value.to_string(),
                &format,
            )?;
            continue;
        }
        match &cell.value {
            Scalar::Text(s) => {
                worksheet.write_string_with_format(cell.row, cell.col, s, &format)?;
            }
            Scalar::Integer(i) => {
                worksheet.write_number_with_format(cell.row, cell.col, *i as f64, &format)?;
            }
            Scalar::Float(x) => {
                worksheet.write_number_with_format(cell.row, cell.col, *x, &format)?;
            }
            Scalar::Bool(b) => {
                worksheet.write_boolean_with_format(cell.row, cell.col, *b, &format)?;
            }
        }
    }

    for (col, width) in &sheet.widths {
        worksheet.set_column_width(*col, *width)?;
    }

    workbook.save(path)?;
    tracing::debug!("Wrote workbook {}", path.display());
    Ok(())
}
