//! XLSX import/export for [`sheetml_model::Workbook`].
//!
//! Two layers:
//!
//! - [`XlsxPackage`]: Open Packaging Convention (OPC) ZIP handling that inflates the
//!   package into memory (part name -> bytes), with size limits for untrusted input.
//! - [`write_workbook_to_package`]/[`read_workbook_from_package`]: SpreadsheetML
//!   encode/decode. Every part is regenerated from the model on save and the model is
//!   rebuilt from parts on load.

mod color;
mod comments;
mod content_types;
mod package;
mod path;
mod read;
mod relationships;
mod rich_text;
mod shared_strings;
mod styles;
mod tables;
mod theme;
mod workbook;
mod write;
mod xml;
mod zip_util;

pub use package::{XlsxError, XlsxPackage, XlsxPackageLimits};
pub use read::{
    read_workbook_from_bytes, read_workbook_from_bytes_with_options, read_workbook_from_package,
};
pub use write::{
    write_workbook_to_bytes, write_workbook_to_bytes_with_options, write_workbook_to_package,
};

/// Options for reading a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XlsxReadOptions {
    pub limits: XlsxPackageLimits,
}

/// ZIP compression used for every part on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum XlsxCompression {
    #[default]
    Deflated,
    Stored,
}

impl XlsxCompression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            XlsxCompression::Deflated => zip::CompressionMethod::Deflated,
            XlsxCompression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Options for writing a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XlsxWriteOptions {
    pub compression: XlsxCompression,
}
