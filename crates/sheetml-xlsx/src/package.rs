use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use thiserror::Error;

use crate::zip_util::{
    part_name_key, read_entry_with_budget, InflateBudget, DEFAULT_MAX_PART_BYTES,
    DEFAULT_MAX_TOTAL_BYTES,
};
use crate::{XlsxReadOptions, XlsxWriteOptions};

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml error: {0}")]
    RoXml(#[from] roxmltree::Error),
    #[error("xml attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("missing required attribute: {0}")]
    MissingAttr(&'static str),
    #[error("missing xlsx part: {0}")]
    MissingPart(String),
    #[error("invalid xlsx: {0}")]
    Invalid(String),
    #[error(
        "xlsx package part is too large to load safely: {part} is {size} bytes (max {max} bytes)"
    )]
    PartTooLarge { part: String, size: u64, max: u64 },
    #[error("xlsx package is too large to load safely: {total} bytes uncompressed (max {max})")]
    PackageTooLarge { total: u64, max: u64 },
    #[error(transparent)]
    Workbook(#[from] sheetml_model::WorkbookError),
    #[error(transparent)]
    Sheet(#[from] sheetml_model::SheetError),
    #[error(transparent)]
    Style(#[from] sheetml_model::StyleError),
}

/// Size limits enforced while inflating a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlsxPackageLimits {
    /// Maximum allowed uncompressed bytes for any single part.
    pub max_part_bytes: u64,
    /// Maximum allowed uncompressed bytes across the whole package.
    pub max_total_bytes: u64,
}

impl Default for XlsxPackageLimits {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

/// An Open Packaging Convention container held fully in memory
/// (part name -> bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XlsxPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl XlsxPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XlsxError> {
        Self::from_bytes_with_options(bytes, &XlsxReadOptions::default())
    }

    pub fn from_bytes_with_options(
        bytes: &[u8],
        options: &XlsxReadOptions,
    ) -> Result<Self, XlsxError> {
        let limits = options.limits;
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;

        let mut parts = BTreeMap::new();
        let mut budget = InflateBudget::new(limits.max_total_bytes);
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if !file.is_file() {
                continue;
            }

            // Entry names in valid packages never start with `/`; tolerate producers that use
            // one (or `\` separators) by storing the canonical form.
            let name = file
                .name()
                .trim_start_matches(['/', '\\'])
                .replace('\\', "/");
            let buf = read_entry_with_budget(&mut file, &name, limits.max_part_bytes, &mut budget)?;
            parts.insert(name, buf);
        }

        log::debug!("inflated {} package parts", parts.len());
        Ok(Self { parts })
    }

    /// Bytes of `name`. Exact matches win; otherwise the lookup ignores ASCII case,
    /// separator style, leading slashes and percent-encoding.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        if let Some(bytes) = self.parts.get(name.strip_prefix('/').unwrap_or(name)) {
            return Some(bytes.as_slice());
        }
        let key = part_name_key(name);
        self.parts
            .iter()
            .find(|(candidate, _)| part_name_key(candidate) == key)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Canonical name of the stored part matching `name` (see [`XlsxPackage::part`]).
    pub(crate) fn resolve_part_name(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix('/').unwrap_or(name);
        if let Some((stored, _)) = self.parts.get_key_value(name) {
            return Some(stored.as_str());
        }
        let key = part_name_key(name);
        self.parts
            .keys()
            .find(|candidate| part_name_key(candidate) == key)
            .map(String::as_str)
    }

    pub fn set_part(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.parts.insert(name.into(), bytes);
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }

    pub fn write_to_bytes(&self) -> Result<Vec<u8>, XlsxError> {
        self.write_to_bytes_with_options(&XlsxWriteOptions::default())
    }

    pub fn write_to_bytes_with_options(
        &self,
        options: &XlsxWriteOptions,
    ) -> Result<Vec<u8>, XlsxError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf, options)?;
        Ok(buf)
    }

    pub fn write_to<W: Write>(&self, mut w: W, options: &XlsxWriteOptions) -> Result<(), XlsxError> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let file_options = zip::write::FileOptions::<()>::default()
            .compression_method(options.compression.method());

        // `[Content_Types].xml` leads the archive so streaming consumers can sniff it.
        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name.as_str() == crate::content_types::CONTENT_TYPES_PART)
            .chain(
                self.parts
                    .iter()
                    .filter(|(name, _)| name.as_str() != crate::content_types::CONTENT_TYPES_PART),
            );
        for (name, bytes) in ordered {
            zip.start_file(name.as_str(), file_options)?;
            zip.write_all(bytes)?;
        }

        let cursor = zip.finish()?;
        w.write_all(&cursor.into_inner())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::XlsxCompression;

    fn package() -> XlsxPackage {
        let mut pkg = XlsxPackage::new();
        pkg.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        pkg.set_part("xl/workbook.xml", b"<workbook/>".to_vec());
        pkg
    }

    #[test]
    fn lookups_tolerate_producer_quirks() {
        let pkg = package();
        assert_eq!(pkg.part("xl/workbook.xml"), Some(&b"<workbook/>"[..]));
        assert_eq!(pkg.part("/XL/Workbook.xml"), Some(&b"<workbook/>"[..]));
        assert_eq!(pkg.part("xl\\workbook.xml"), Some(&b"<workbook/>"[..]));
        assert_eq!(pkg.part("xl/styles.xml"), None);
        assert_eq!(pkg.resolve_part_name("XL/WORKBOOK.XML"), Some("xl/workbook.xml"));
    }

    #[test]
    fn zip_round_trip_with_both_compressions() {
        let pkg = package();
        for compression in [XlsxCompression::Deflated, XlsxCompression::Stored] {
            let bytes = pkg
                .write_to_bytes_with_options(&XlsxWriteOptions { compression })
                .unwrap();
            let back = XlsxPackage::from_bytes(&bytes).unwrap();
            assert_eq!(back, pkg);
        }
    }

    #[test]
    fn content_types_is_the_first_entry() {
        let bytes = package().write_to_bytes().unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.by_index(0).unwrap().name(), "[Content_Types].xml");
    }

    #[test]
    fn limits_come_from_read_options() {
        let bytes = package().write_to_bytes().unwrap();
        let options = XlsxReadOptions {
            limits: XlsxPackageLimits {
                max_part_bytes: 4,
                ..Default::default()
            },
        };
        let err = XlsxPackage::from_bytes_with_options(&bytes, &options).unwrap_err();
        assert!(matches!(err, XlsxError::PartTooLarge { max: 4, .. }));
    }
}
