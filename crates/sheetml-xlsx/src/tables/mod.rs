//! Table parts (`xl/tables/tableN.xml`), linked from worksheet relationships.

mod xml;

pub(crate) use xml::{parse_table, write_table_xml};

/// Package part name of the `n`th table (1-based across the workbook).
pub(crate) fn table_part_name(n: usize) -> String {
    format!("xl/tables/table{n}.xml")
}
