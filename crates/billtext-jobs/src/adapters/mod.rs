//! Extraction adapter implementations.

mod command;
pub mod office_convert;
pub mod pdf_text;
pub mod spreadsheet;
pub mod text_native;
pub mod word_legacy;

pub use office_convert::OfficeConvertAdapter;
pub use pdf_text::PdfTextAdapter;
pub use spreadsheet::SpreadsheetAdapter;
pub use text_native::TextNativeAdapter;
pub use word_legacy::WordLegacyAdapter;
