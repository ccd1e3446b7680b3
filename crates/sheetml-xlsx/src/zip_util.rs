use std::io::Read;

use zip::read::ZipFile;

use crate::XlsxError;

/// Default maximum uncompressed size of any single part inflated into memory.
pub(crate) const DEFAULT_MAX_PART_BYTES: u64 = 256 * 1024 * 1024; // 256MiB

/// Default maximum uncompressed bytes across every part of a package.
pub(crate) const DEFAULT_MAX_TOTAL_BYTES: u64 = 512 * 1024 * 1024; // 512MiB

/// Canonical form of a part name for tolerant lookups.
///
/// Percent-decodes valid `%xx` sequences, strips leading `/` or `\`, maps `\`
/// to `/` and ASCII-lowercases. Producers disagree on all four.
pub(crate) fn part_name_key(name: &str) -> Vec<u8> {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let mut bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut leading = true;
    while let Some(&b) = bytes.first() {
        let decoded = match (b, bytes.get(1).copied(), bytes.get(2).copied()) {
            (b'%', Some(hi), Some(lo)) => match (hex_val(hi), hex_val(lo)) {
                (Some(hi), Some(lo)) => {
                    bytes = &bytes[3..];
                    (hi << 4) | lo
                }
                _ => {
                    bytes = &bytes[1..];
                    b
                }
            },
            _ => {
                bytes = &bytes[1..];
                b
            }
        };
        if leading && matches!(decoded, b'/' | b'\\') {
            continue;
        }
        leading = false;
        out.push(if decoded == b'\\' {
            b'/'
        } else {
            decoded.to_ascii_lowercase()
        });
    }
    out
}

/// Running total of inflated bytes for one package read.
#[derive(Debug, Clone)]
pub(crate) struct InflateBudget {
    max_total_bytes: u64,
    used_bytes: u64,
}

impl InflateBudget {
    pub(crate) fn new(max_total_bytes: u64) -> Self {
        Self {
            max_total_bytes,
            used_bytes: 0,
        }
    }

    fn remaining(&self) -> u64 {
        self.max_total_bytes.saturating_sub(self.used_bytes)
    }

    fn too_large(&self, extra: u64) -> XlsxError {
        XlsxError::PackageTooLarge {
            total: self.used_bytes.saturating_add(extra),
            max: self.max_total_bytes,
        }
    }
}

/// Inflate one ZIP entry, enforcing both the per-part and the package limit.
///
/// The declared size is only a fast path; reads are capped at `limit + 1`
/// bytes so forged size fields cannot inflate past the limit.
pub(crate) fn read_entry_with_budget(
    file: &mut ZipFile<'_>,
    part: &str,
    max_part_bytes: u64,
    budget: &mut InflateBudget,
) -> Result<Vec<u8>, XlsxError> {
    let declared = file.size();
    if declared > max_part_bytes {
        return Err(XlsxError::PartTooLarge {
            part: part.to_string(),
            size: declared,
            max: max_part_bytes,
        });
    }
    let remaining = budget.remaining();
    if declared > remaining {
        return Err(budget.too_large(declared));
    }

    let limit = max_part_bytes.min(remaining);
    let mut buf = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
    let observed = buf.len() as u64;
    if observed > limit {
        if limit == max_part_bytes {
            return Err(XlsxError::PartTooLarge {
                part: part.to_string(),
                size: observed,
                max: max_part_bytes,
            });
        }
        return Err(budget.too_large(observed));
    }
    budget.used_bytes += observed;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Cursor, Write};

    use zip::write::FileOptions;
    use zip::{ZipArchive, ZipWriter};

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn keys_ignore_case_separators_and_escapes() {
        assert_eq!(part_name_key("XL\\Workbook.xml"), b"xl/workbook.xml");
        assert_eq!(part_name_key("/xl/workbook.xml"), b"xl/workbook.xml");
        assert_eq!(
            part_name_key("%2Fxl%2Fworksheets%2Fsheet%201.xml"),
            b"xl/worksheets/sheet 1.xml"
        );
        assert_eq!(part_name_key("100%"), b"100%");
    }

    #[test]
    fn part_limit_is_enforced() {
        let bytes = build_zip(&[("a.txt", b"hello world")]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut budget = InflateBudget::new(1024);

        let mut file = archive.by_index(0).unwrap();
        let err = read_entry_with_budget(&mut file, "a.txt", 10, &mut budget).unwrap_err();
        assert!(matches!(err, XlsxError::PartTooLarge { size: 11, max: 10, .. }));
    }

    #[test]
    fn total_budget_spans_parts() {
        let bytes = build_zip(&[("a.txt", b"hello"), ("b.txt", b"world")]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut budget = InflateBudget::new(8);

        let mut first = archive.by_index(0).unwrap();
        assert_eq!(
            read_entry_with_budget(&mut first, "a.txt", 100, &mut budget).unwrap(),
            b"hello"
        );
        drop(first);
        let mut second = archive.by_index(1).unwrap();
        let err = read_entry_with_budget(&mut second, "b.txt", 100, &mut budget).unwrap_err();
        assert!(matches!(err, XlsxError::PackageTooLarge { max: 8, .. }));
    }
}
