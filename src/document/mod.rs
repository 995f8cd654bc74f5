// Document model and the Word, spreadsheet and PDF writers

pub mod docx;
mod model;
pub mod pdf;
pub mod xlsx;

pub use docx::DocxPackage;
pub use model::*;
pub use pdf::{layout_document, write_pdf, PdfLayout};
pub use xlsx::{report_sheet, table_sheet, write_workbook, SheetLayout};
