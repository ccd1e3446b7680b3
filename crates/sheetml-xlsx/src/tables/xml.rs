use quick_xml::{de::from_str, se::to_string};
use serde::{Deserialize, Serialize};
use sheetml_model::{CellRef, Range, Table, TableColumn, TableStyleInfo};

use crate::xml::{SPREADSHEETML_NS, XML_DECLARATION};
use crate::XlsxError;

#[derive(Debug, Deserialize)]
#[serde(rename = "table")]
struct TableXml {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@displayName")]
    display_name: String,
    #[serde(rename = "@ref")]
    reference: String,
    #[serde(rename = "@headerRowCount")]
    header_row_count: Option<u32>,
    #[serde(rename = "@totalsRowCount")]
    totals_row_count: Option<u32>,
    #[serde(rename = "autoFilter")]
    auto_filter: Option<AutoFilterXml>,
    #[serde(rename = "tableColumns")]
    table_columns: TableColumnsXml,
    #[serde(rename = "tableStyleInfo")]
    style_info: Option<TableStyleInfoXml>,
}

#[derive(Debug, Deserialize)]
struct TableColumnsXml {
    #[serde(rename = "tableColumn", default)]
    columns: Vec<TableColumnXml>,
}

#[derive(Debug, Deserialize)]
struct TableColumnXml {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableStyleInfoXml {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@showFirstColumn")]
    show_first_column: Option<u8>,
    #[serde(rename = "@showLastColumn")]
    show_last_column: Option<u8>,
    #[serde(rename = "@showRowStripes")]
    show_row_stripes: Option<u8>,
    #[serde(rename = "@showColumnStripes")]
    show_column_stripes: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct AutoFilterXml {
    #[serde(rename = "@ref")]
    _reference: Option<String>,
}

pub(crate) fn parse_table(xml: &str) -> Result<Table, XlsxError> {
    let table: TableXml = from_str(xml).map_err(|e| XlsxError::Invalid(e.to_string()))?;
    let range = Range::from_a1(&table.reference).map_err(|e| XlsxError::Invalid(e.to_string()))?;

    let style = table.style_info.map(|s| TableStyleInfo {
        name: s.name.unwrap_or_default(),
        show_first_column: s.show_first_column.unwrap_or(0) != 0,
        show_last_column: s.show_last_column.unwrap_or(0) != 0,
        show_row_stripes: s.show_row_stripes.unwrap_or(0) != 0,
        show_column_stripes: s.show_column_stripes.unwrap_or(0) != 0,
    });

    Ok(Table {
        id: table.id,
        name: table.name.unwrap_or_else(|| table.display_name.clone()),
        display_name: table.display_name,
        range,
        header_row_count: table.header_row_count.unwrap_or(1),
        totals_row_count: table.totals_row_count.unwrap_or(0),
        columns: table
            .table_columns
            .columns
            .into_iter()
            .map(|c| TableColumn {
                id: c.id,
                name: c.name,
            })
            .collect(),
        style,
        auto_filter: table.auto_filter.is_some(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename = "table")]
struct TableXmlOut<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@displayName")]
    display_name: &'a str,
    #[serde(rename = "@ref")]
    reference: String,
    #[serde(rename = "@headerRowCount", skip_serializing_if = "Option::is_none")]
    header_row_count: Option<u32>,
    #[serde(rename = "@totalsRowCount", skip_serializing_if = "Option::is_none")]
    totals_row_count: Option<u32>,
    #[serde(rename = "autoFilter", skip_serializing_if = "Option::is_none")]
    auto_filter: Option<AutoFilterXmlOut>,
    #[serde(rename = "tableColumns")]
    table_columns: TableColumnsXmlOut<'a>,
    #[serde(rename = "tableStyleInfo", skip_serializing_if = "Option::is_none")]
    style_info: Option<TableStyleInfoXmlOut<'a>>,
}

#[derive(Debug, Serialize)]
struct TableColumnsXmlOut<'a> {
    #[serde(rename = "@count")]
    count: u32,
    #[serde(rename = "tableColumn")]
    columns: Vec<TableColumnXmlOut<'a>>,
}

#[derive(Debug, Serialize)]
struct TableColumnXmlOut<'a> {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct TableStyleInfoXmlOut<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@showFirstColumn")]
    show_first_column: u8,
    #[serde(rename = "@showLastColumn")]
    show_last_column: u8,
    #[serde(rename = "@showRowStripes")]
    show_row_stripes: u8,
    #[serde(rename = "@showColumnStripes")]
    show_column_stripes: u8,
}

#[derive(Debug, Serialize)]
struct AutoFilterXmlOut {
    #[serde(rename = "@ref")]
    reference: String,
}

/// The filter covers the header and data rows, never the totals row.
fn auto_filter_range(table: &Table) -> Range {
    let end_row = table
        .range
        .end
        .row
        .saturating_sub(table.totals_row_count)
        .max(table.range.start.row);
    Range::new(table.range.start, CellRef::new(end_row, table.range.end.col))
}

pub(crate) fn write_table_xml(table: &Table) -> Result<String, XlsxError> {
    let xml = TableXmlOut {
        xmlns: SPREADSHEETML_NS,
        id: table.id,
        name: &table.name,
        display_name: &table.display_name,
        reference: table.range.to_string(),
        header_row_count: (table.header_row_count != 1).then_some(table.header_row_count),
        totals_row_count: (table.totals_row_count != 0).then_some(table.totals_row_count),
        auto_filter: (table.auto_filter && table.header_row_count > 0).then(|| AutoFilterXmlOut {
            reference: auto_filter_range(table).to_string(),
        }),
        table_columns: TableColumnsXmlOut {
            count: table.columns.len() as u32,
            columns: table
                .columns
                .iter()
                .map(|c| TableColumnXmlOut {
                    id: c.id,
                    name: &c.name,
                })
                .collect(),
        },
        style_info: table.style.as_ref().map(|s| TableStyleInfoXmlOut {
            name: &s.name,
            show_first_column: s.show_first_column as u8,
            show_last_column: s.show_last_column as u8,
            show_row_stripes: s.show_row_stripes as u8,
            show_column_stripes: s.show_column_stripes as u8,
        }),
    };

    let body = to_string(&xml).map_err(|e| XlsxError::Invalid(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}{body}"))
}
