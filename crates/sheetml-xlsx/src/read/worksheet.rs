use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use sheetml_model::{
    Cell, CellRef, CellValue, ErrorValue, HeaderFooterSettings, Hyperlink, HyperlinkTarget,
    Orientation, Pane, PanePosition, PaperSize, Range, RichText, Row, SheetError, StringValue,
    Worksheet, EXCEL_MAX_COLS, MAX_OUTLINE_LEVEL,
};

use crate::relationships::Relationship;
use crate::rich_text::{parse_rich_text, read_text};
use crate::xml::{attr_value, parse_xml_bool};
use crate::XlsxError;

/// Package state the worksheet parser needs to validate references.
pub(super) struct SheetContext<'a> {
    pub rels: &'a [Relationship],
    /// Entries in the shared strings table; `None` when the package has none.
    pub shared_string_count: Option<usize>,
    pub style_count: usize,
}

/// Parts referenced from the worksheet that the caller loads afterwards.
#[derive(Debug, Default)]
pub(super) struct SheetLinks {
    pub table_rel_ids: Vec<String>,
}

#[derive(Debug, Default)]
struct RawCell {
    reference: Option<String>,
    style: Option<u32>,
    cell_type: Option<String>,
    formula: Option<RawFormula>,
    value: Option<String>,
    inline: Option<RichText>,
}

#[derive(Debug, Default)]
struct RawFormula {
    text: String,
    kind: Option<String>,
    reference: Option<String>,
}

#[derive(Clone, Copy)]
enum Breaks {
    Rows,
    Columns,
}

/// Stream a worksheet part into `sheet`.
pub(super) fn read_worksheet_xml(
    xml: &[u8],
    sheet: &mut Worksheet,
    ctx: &SheetContext<'_>,
) -> Result<SheetLinks, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut links = SheetLinks::default();

    let mut current_row = 0u32;
    let mut next_row = 0u32;
    let mut next_col = 0u32;
    let mut breaks: Option<Breaks> = None;
    let mut seen_view = false;
    // Only the first `sheetView` (workbook view 0) is kept.
    let mut in_first_view = false;
    let mut shared_formula_cells = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let raw = raw_cell(&e)?;
                let at = cell_position(&raw, current_row, next_col);
                next_col = at.col + 1;
                shared_formula_cells += apply_cell(sheet, at, raw, ctx)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let mut raw = raw_cell(&e)?;
                read_cell_body(&mut reader, &mut raw)?;
                let at = cell_position(&raw, current_row, next_col);
                next_col = at.col + 1;
                shared_formula_cells += apply_cell(sheet, at, raw, ctx)?;
            }
            Event::Start(e) if is_header_footer_part(e.local_name().as_ref()) => {
                let name = e.local_name().as_ref().to_vec();
                let text = read_text(&mut reader, &name)?;
                if let Some(slot) = header_footer_slot(&mut sheet.header_footer, &name) {
                    *slot = Some(text);
                }
            }
            Event::End(e) if matches!(e.local_name().as_ref(), b"rowBreaks" | b"colBreaks") => {
                breaks = None;
            }
            Event::Start(e) if e.local_name().as_ref() == b"sheetView" => {
                if !seen_view {
                    seen_view = true;
                    in_first_view = true;
                    read_sheet_view(sheet, &e)?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetView" => in_first_view = false,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = match attr_value(&e, b"r")?.and_then(|v| v.parse::<u32>().ok()) {
                        Some(r) if r >= 1 => r - 1,
                        _ => next_row,
                    };
                    next_row = current_row + 1;
                    next_col = 0;
                    let row = sheet.row_mut_or_create(current_row)?;
                    apply_row_attrs(row, &e, ctx)?;
                }
                b"col" => read_col(sheet, &e, ctx)?,
                b"sheetView" if !seen_view => {
                    seen_view = true;
                    read_sheet_view(sheet, &e)?;
                }
                b"pane" if in_first_view => read_pane(sheet, &e)?,
                b"selection" if in_first_view => read_selection(sheet, &e)?,
                b"outlinePr" => {
                    sheet.outline.summary_below = flag_or(&e, b"summaryBelow", true)?;
                    sheet.outline.summary_right = flag_or(&e, b"summaryRight", true)?;
                    sheet.outline.show_outline_symbols =
                        flag_or(&e, b"showOutlineSymbols", true)?;
                }
                b"pageSetUpPr" => {
                    sheet.page_setup.fit_to_page = flag_or(&e, b"fitToPage", false)?;
                    sheet.page_setup.auto_page_breaks = flag_or(&e, b"autoPageBreaks", true)?;
                }
                b"printOptions" => {
                    let print = &mut sheet.print_options;
                    print.horizontal_centered = flag_or(&e, b"horizontalCentered", false)?;
                    print.vertical_centered = flag_or(&e, b"verticalCentered", false)?;
                    print.grid_lines = flag_or(&e, b"gridLines", false)?;
                    print.headings = flag_or(&e, b"headings", false)?;
                }
                b"pageMargins" => {
                    let margins = &mut sheet.page_margins;
                    for (name, slot) in [
                        (&b"left"[..], &mut margins.left),
                        (&b"right"[..], &mut margins.right),
                        (&b"top"[..], &mut margins.top),
                        (&b"bottom"[..], &mut margins.bottom),
                        (&b"header"[..], &mut margins.header),
                        (&b"footer"[..], &mut margins.footer),
                    ] {
                        if let Some(inches) = attr_value(&e, name)?.and_then(|v| v.parse().ok()) {
                            *slot = inches;
                        }
                    }
                }
                b"pageSetup" => read_page_setup(sheet, &e)?,
                b"sheetFormatPr" => {
                    if let Some(height) = attr_value(&e, b"defaultRowHeight")?
                        .and_then(|v| v.parse::<f32>().ok())
                    {
                        sheet.default_row_height_points = height;
                    }
                    sheet.default_column_width = attr_value(&e, b"defaultColWidth")?
                        .and_then(|v| v.parse::<f32>().ok());
                }
                b"mergeCell" => {
                    let reference = attr_value(&e, b"ref")?.unwrap_or_default();
                    match Range::from_a1(&reference) {
                        Ok(range) => {
                            if let Err(err) = sheet.add_merged_region(range) {
                                log::warn!("{}: skipping merged region {range}: {err}", sheet.name());
                            }
                        }
                        Err(err) => {
                            log::warn!("{}: bad merged region {reference:?}: {err}", sheet.name())
                        }
                    }
                }
                b"hyperlink" => read_hyperlink(sheet, &e, ctx)?,
                b"headerFooter" => {
                    sheet.header_footer.different_odd_even = attr_value(&e, b"differentOddEven")?
                        .is_some_and(|v| parse_xml_bool(&v));
                    sheet.header_footer.different_first = attr_value(&e, b"differentFirst")?
                        .is_some_and(|v| parse_xml_bool(&v));
                }
                b"rowBreaks" => breaks = Some(Breaks::Rows),
                b"colBreaks" => breaks = Some(Breaks::Columns),
                b"brk" => {
                    let id = attr_value(&e, b"id")?.and_then(|v| v.parse::<u32>().ok());
                    let result = match (breaks, id) {
                        (Some(Breaks::Rows), Some(id)) if id > 0 => sheet.set_row_break(id - 1),
                        (Some(Breaks::Columns), Some(id)) if id > 0 => {
                            sheet.set_column_break(id - 1)
                        }
                        _ => Ok(()),
                    };
                    if let Err(err) = result {
                        log::warn!("{}: skipping page break: {err}", sheet.name());
                    }
                }
                b"tablePart" => links.table_rel_ids.extend(attr_value(&e, b"id")?),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if shared_formula_cells > 0 {
        log::warn!(
            "{}: {shared_formula_cells} cells use shared formulas; only their cached values were kept",
            sheet.name()
        );
    }
    Ok(links)
}

/// Boolean attribute, `default` when absent.
fn flag_or(e: &BytesStart<'_>, name: &[u8], default: bool) -> Result<bool, XlsxError> {
    Ok(attr_value(e, name)?.map_or(default, |v| parse_xml_bool(&v)))
}

fn cell_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<CellRef>, XlsxError> {
    Ok(attr_value(e, name)?.and_then(|v| CellRef::from_a1(&v).ok()))
}

fn read_sheet_view(sheet: &mut Worksheet, e: &BytesStart<'_>) -> Result<(), XlsxError> {
    sheet.tab_selected = flag_or(e, b"tabSelected", false)?;
    let view = &mut sheet.view;
    view.show_formulas = flag_or(e, b"showFormulas", false)?;
    view.show_grid_lines = flag_or(e, b"showGridLines", true)?;
    view.show_row_col_headers = flag_or(e, b"showRowColHeaders", true)?;
    view.top_left_cell = cell_attr(e, b"topLeftCell")?;
    if let Some(zoom) = attr_value(e, b"zoomScale")?.and_then(|v| v.parse::<u16>().ok()) {
        if let Err(err) = sheet.set_zoom(zoom) {
            log::warn!("{}: {err}", sheet.name());
        }
    }
    Ok(())
}

fn read_pane(sheet: &mut Worksheet, e: &BytesStart<'_>) -> Result<(), XlsxError> {
    let split = |name: &[u8]| -> Result<f64, XlsxError> {
        Ok(attr_value(e, name)?
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0))
    };
    let x_split = split(b"xSplit")?;
    let y_split = split(b"ySplit")?;
    let frozen = matches!(
        attr_value(e, b"state")?.as_deref(),
        Some("frozen" | "frozenSplit")
    );
    let top_left = match cell_attr(e, b"topLeftCell")? {
        Some(cell) => cell,
        None if frozen => CellRef::new(y_split as u32, x_split as u32),
        None => CellRef::new(0, 0),
    };
    let active_pane = attr_value(e, b"activePane")?
        .and_then(|v| PanePosition::from_ooxml(&v))
        .unwrap_or_default();
    sheet.view.pane = Some(if frozen {
        Pane {
            active_pane,
            ..Pane::frozen(x_split as u32, y_split as u32, top_left)
        }
    } else {
        Pane::split(x_split, y_split, top_left, active_pane)
    });
    Ok(())
}

/// A view has one selection per pane; the active pane's wins.
fn read_selection(sheet: &mut Worksheet, e: &BytesStart<'_>) -> Result<(), XlsxError> {
    let Some(cell) = cell_attr(e, b"activeCell")? else {
        return Ok(());
    };
    let pane = attr_value(e, b"pane")?
        .and_then(|v| PanePosition::from_ooxml(&v))
        .unwrap_or_default();
    let active = sheet
        .view
        .pane
        .as_ref()
        .map_or(PanePosition::TopLeft, |p| p.active_pane);
    if pane == active || sheet.view.active_cell.is_none() {
        sheet.view.active_cell = Some(cell);
    }
    Ok(())
}

fn read_page_setup(sheet: &mut Worksheet, e: &BytesStart<'_>) -> Result<(), XlsxError> {
    let number = |name: &[u8]| -> Result<Option<u16>, XlsxError> {
        Ok(attr_value(e, name)?.and_then(|v| v.parse::<u16>().ok()))
    };
    let setup = &mut sheet.page_setup;
    if let Some(code) = number(b"paperSize")? {
        setup.paper_size = PaperSize { code };
    }
    if let Some(scale) = number(b"scale")? {
        setup.scale = scale;
    }
    if let Some(width) = number(b"fitToWidth")? {
        setup.fit_to_width = width;
    }
    if let Some(height) = number(b"fitToHeight")? {
        setup.fit_to_height = height;
    }
    if let Some(orientation) = attr_value(e, b"orientation")? {
        setup.orientation = Orientation::from_ooxml(&orientation);
    }
    Ok(())
}

fn is_header_footer_part(name: &[u8]) -> bool {
    matches!(
        name,
        b"oddHeader" | b"oddFooter" | b"evenHeader" | b"evenFooter" | b"firstHeader" | b"firstFooter"
    )
}

fn header_footer_slot<'a>(
    settings: &'a mut HeaderFooterSettings,
    name: &[u8],
) -> Option<&'a mut Option<String>> {
    Some(match name {
        b"oddHeader" => &mut settings.odd_header,
        b"oddFooter" => &mut settings.odd_footer,
        b"evenHeader" => &mut settings.even_header,
        b"evenFooter" => &mut settings.even_footer,
        b"firstHeader" => &mut settings.first_header,
        b"firstFooter" => &mut settings.first_footer,
        _ => return None,
    })
}

fn raw_cell(e: &BytesStart<'_>) -> Result<RawCell, XlsxError> {
    Ok(RawCell {
        reference: attr_value(e, b"r")?,
        style: attr_value(e, b"s")?.and_then(|v| v.parse().ok()),
        cell_type: attr_value(e, b"t")?,
        ..RawCell::default()
    })
}

fn read_cell_body<R: BufRead>(reader: &mut Reader<R>, raw: &mut RawCell) -> Result<(), XlsxError> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"f" => {
                let mut formula = raw_formula(&e)?;
                formula.text = read_text(reader, b"f")?;
                raw.formula = Some(formula);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"f" => {
                raw.formula = Some(raw_formula(&e)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                raw.value = Some(read_text(reader, b"v")?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"is" => {
                raw.inline = Some(parse_rich_text(reader, b"is")?);
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => return Err(XlsxError::Invalid("unterminated <c> element".to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn raw_formula(e: &BytesStart<'_>) -> Result<RawFormula, XlsxError> {
    Ok(RawFormula {
        text: String::new(),
        kind: attr_value(e, b"t")?,
        reference: attr_value(e, b"ref")?,
    })
}

/// Cells may omit `r`; they then follow the previous cell in the row.
fn cell_position(raw: &RawCell, row: u32, next_col: u32) -> CellRef {
    match raw.reference.as_deref().map(CellRef::from_a1) {
        Some(Ok(at)) => at,
        Some(Err(err)) => {
            log::warn!("bad cell reference {:?}: {err}", raw.reference);
            CellRef::new(row, next_col)
        }
        None => CellRef::new(row, next_col),
    }
}

fn cell_value(raw: &mut RawCell, at: CellRef, ctx: &SheetContext<'_>) -> CellValue {
    let text = raw.value.take();
    match raw.cell_type.as_deref() {
        None | Some("n") => match text.as_deref().map(str::trim) {
            None | Some("") => CellValue::Blank,
            Some(text) => text.parse::<f64>().map(CellValue::Number).unwrap_or_else(|_| {
                log::warn!("{at}: {text:?} is not a number");
                CellValue::Blank
            }),
        },
        Some("s") => {
            let index = text.as_deref().and_then(|v| v.trim().parse::<u32>().ok());
            match (index, ctx.shared_string_count) {
                (Some(index), Some(count)) if (index as usize) < count => {
                    CellValue::String(StringValue::Shared(index))
                }
                _ => {
                    log::warn!("{at}: shared string reference {text:?} is out of range");
                    CellValue::Blank
                }
            }
        }
        Some("inlineStr") => match raw.inline.take() {
            Some(rich) => CellValue::String(StringValue::Inline(rich)),
            None => text.map_or(CellValue::Blank, |t| {
                CellValue::String(StringValue::Inline(RichText::from(t)))
            }),
        },
        Some("str") => text.map_or(CellValue::Blank, |t| {
            CellValue::String(StringValue::Inline(RichText::from(t)))
        }),
        Some("b") => text.map_or(CellValue::Blank, |t| {
            CellValue::Boolean(parse_xml_bool(t.trim()))
        }),
        Some("e") => match text.as_deref().map(|t| t.trim().parse::<ErrorValue>()) {
            Some(Ok(error)) => CellValue::Error(error),
            Some(Err(_)) => {
                log::warn!("{at}: unknown error literal {text:?}");
                CellValue::Blank
            }
            None => CellValue::Blank,
        },
        Some("d") => {
            log::warn!("{at}: ISO 8601 date cell kept as text");
            text.map_or(CellValue::Blank, |t| {
                CellValue::String(StringValue::Inline(RichText::from(t)))
            })
        }
        Some(other) => {
            log::warn!("{at}: unknown cell type {other:?}");
            CellValue::Blank
        }
    }
}

/// Store one parsed cell; returns 1 when only a shared-formula result was kept.
fn apply_cell(
    sheet: &mut Worksheet,
    at: CellRef,
    mut raw: RawCell,
    ctx: &SheetContext<'_>,
) -> Result<usize, XlsxError> {
    let value = cell_value(&mut raw, at, ctx);
    // `<f t="shared" si="n"/>` without text: the formula lives on the master cell.
    let shared_dependent = raw.formula.as_ref().is_some_and(|f| {
        f.kind.as_deref() == Some("shared") && f.text.trim().is_empty()
    });

    let array_range = raw.formula.as_ref().and_then(|f| {
        if f.kind.as_deref() != Some("array") || f.text.trim().is_empty() {
            return None;
        }
        let reference = f.reference.as_deref().unwrap_or_default();
        Range::from_a1(reference)
            .map_err(|err| log::warn!("{at}: bad array formula range {reference:?}: {err}"))
            .ok()
    });

    let mut formula = raw
        .formula
        .take()
        .filter(|f| !f.text.trim().is_empty())
        .map(|f| f.text);
    if let (Some(range), Some(text)) = (array_range, formula.as_deref()) {
        match sheet.set_array_formula(text, range) {
            Ok(_) => formula = None,
            Err(err) => log::warn!("{at}: array formula kept as a plain formula: {err}"),
        }
    }

    let cell = sheet.cell_mut_or_create(at)?;
    if let Some(text) = formula {
        if cell.is_part_of_array_formula_group() {
            log::warn!("{at}: ignoring formula on a member of an array formula");
            cell.set_cached_value(value);
        } else {
            set_formula_cell(cell, value, &text)?;
        }
    } else if cell.is_part_of_array_formula_group() {
        cell.set_cached_value(value);
    } else {
        cell.set_value(value).map_err(SheetError::from)?;
    }

    if let Some(style) = raw.style {
        if (style as usize) < ctx.style_count {
            cell.set_style_id(style);
        } else {
            log::warn!("{at}: style index {style} is out of range");
        }
    }

    Ok(usize::from(shared_dependent))
}

fn set_formula_cell(cell: &mut Cell, value: CellValue, text: &str) -> Result<(), XlsxError> {
    cell.set_value(value).map_err(SheetError::from)?;
    cell.set_formula(Some(text)).map_err(SheetError::from)?;
    Ok(())
}

fn apply_row_attrs(
    row: &mut Row,
    e: &BytesStart<'_>,
    ctx: &SheetContext<'_>,
) -> Result<(), XlsxError> {
    let flag = |name: &[u8]| -> Result<bool, XlsxError> {
        Ok(attr_value(e, name)?.is_some_and(|v| parse_xml_bool(&v)))
    };

    if flag(b"customFormat")? {
        match attr_value(e, b"s")?.and_then(|v| v.parse::<u32>().ok()) {
            Some(style) if (style as usize) < ctx.style_count => row.set_style_id(Some(style)),
            Some(style) => log::warn!("row {}: style index {style} is out of range", row.index() + 1),
            None => {}
        }
    }
    if flag(b"customHeight")? {
        if let Some(points) = attr_value(e, b"ht")?.and_then(|v| v.parse::<f32>().ok()) {
            if let Err(err) = row.set_height_in_points(points) {
                log::warn!("row {}: {err}", row.index() + 1);
            }
        }
    }
    row.set_hidden(flag(b"hidden")?);
    row.set_collapsed(flag(b"collapsed")?);
    if let Some(level) = attr_value(e, b"outlineLevel")?.and_then(|v| v.parse::<u8>().ok()) {
        if let Err(err) = row.set_outline_level(level) {
            log::warn!("row {}: {err}", row.index() + 1);
        }
    }
    Ok(())
}

fn read_col(
    sheet: &mut Worksheet,
    e: &BytesStart<'_>,
    ctx: &SheetContext<'_>,
) -> Result<(), XlsxError> {
    let min = attr_value(e, b"min")?.and_then(|v| v.parse::<u32>().ok());
    let max = attr_value(e, b"max")?.and_then(|v| v.parse::<u32>().ok());
    let (Some(min), Some(max)) = (min, max) else {
        log::warn!("{}: skipping <col> without min/max", sheet.name());
        return Ok(());
    };
    if min == 0 || min > max {
        log::warn!("{}: skipping <col> with span {min}..{max}", sheet.name());
        return Ok(());
    }

    let width = attr_value(e, b"width")?.and_then(|v| v.parse::<f32>().ok());
    let style = match attr_value(e, b"style")?.and_then(|v| v.parse::<u32>().ok()) {
        Some(style) if (style as usize) < ctx.style_count => Some(style).filter(|s| *s != 0),
        Some(style) => {
            log::warn!("{}: column style index {style} is out of range", sheet.name());
            None
        }
        None => None,
    };
    let hidden = attr_value(e, b"hidden")?.is_some_and(|v| parse_xml_bool(&v));
    let collapsed = attr_value(e, b"collapsed")?.is_some_and(|v| parse_xml_bool(&v));
    let outline_level = attr_value(e, b"outlineLevel")?
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0)
        .min(MAX_OUTLINE_LEVEL);

    for col in (min - 1)..max.min(EXCEL_MAX_COLS) {
        let props = sheet.column_mut(col)?;
        props.width = width;
        props.style_id = style;
        props.hidden = hidden;
        props.outline_level = outline_level;
        props.collapsed = collapsed;
    }
    Ok(())
}

fn read_hyperlink(
    sheet: &mut Worksheet,
    e: &BytesStart<'_>,
    ctx: &SheetContext<'_>,
) -> Result<(), XlsxError> {
    let Some(range) = attr_value(e, b"ref")?.and_then(|r| Range::from_a1(&r).ok()) else {
        log::warn!("{}: skipping hyperlink with a bad ref", sheet.name());
        return Ok(());
    };

    let external = attr_value(e, b"id")?.and_then(|id| {
        let rel = ctx.rels.iter().find(|rel| rel.id == id);
        if rel.is_none() {
            log::warn!("{}: hyperlink relationship {id} is missing", sheet.name());
        }
        rel.map(|rel| HyperlinkTarget::from_relationship_target(&rel.target))
    });
    let target = match external {
        Some(target) => target,
        None => match attr_value(e, b"location")? {
            Some(location) => HyperlinkTarget::Document(location),
            None => return Ok(()),
        },
    };

    let mut link = Hyperlink::new(range, target);
    link.display = attr_value(e, b"display")?;
    link.tooltip = attr_value(e, b"tooltip")?;
    sheet.add_hyperlink(link)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    const NS: &str = r#"xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn read(body: &str, shared_string_count: Option<usize>) -> Worksheet {
        let xml = format!("<worksheet {NS}>{body}</worksheet>");
        let mut sheet = Worksheet::new(1, "Sheet1");
        let ctx = SheetContext {
            rels: &[],
            shared_string_count,
            style_count: 2,
        };
        read_worksheet_xml(xml.as_bytes(), &mut sheet, &ctx).unwrap();
        sheet
    }

    fn value_at(sheet: &Worksheet, a1: &str) -> CellValue {
        sheet
            .cell(CellRef::from_a1(a1).unwrap())
            .map(|c| c.value().clone())
            .unwrap_or(CellValue::Blank)
    }

    #[test]
    fn cell_types_are_decoded() {
        let sheet = read(
            r#"<sheetData><row r="1">
<c r="A1"><v>2.5</v></c>
<c r="B1" t="s"><v>1</v></c>
<c r="C1" t="inlineStr"><is><t>hi</t></is></c>
<c r="D1" t="b"><v>1</v></c>
<c r="E1" t="e"><v>#N/A</v></c>
<c r="F1" t="str"><f>"x"&amp;"y"</f><v>xy</v></c>
</row></sheetData>"#,
            Some(2),
        );

        assert_eq!(value_at(&sheet, "A1"), CellValue::Number(2.5));
        assert_eq!(value_at(&sheet, "B1"), CellValue::String(StringValue::Shared(1)));
        assert_eq!(
            value_at(&sheet, "C1"),
            CellValue::String(StringValue::Inline(RichText::new("hi")))
        );
        assert_eq!(value_at(&sheet, "D1"), CellValue::Boolean(true));
        assert_eq!(value_at(&sheet, "E1"), CellValue::Error(ErrorValue::NA));
        let f1 = sheet.cell(CellRef::from_a1("F1").unwrap()).unwrap();
        assert_eq!(f1.formula(), Some(r#""x"&"y""#));
        assert_eq!(
            f1.value(),
            &CellValue::String(StringValue::Inline(RichText::new("xy")))
        );
    }

    #[test]
    fn dangling_references_degrade_to_blank() {
        let sheet = read(
            r#"<sheetData><row r="1"><c r="A1" t="s" s="9"><v>5</v></c><c r="B1" t="x"><v>1</v></c></row></sheetData>"#,
            Some(1),
        );
        let a1 = sheet.cell(CellRef::from_a1("A1").unwrap()).unwrap();
        assert_eq!(a1.value(), &CellValue::Blank);
        assert_eq!(a1.style_id(), 0);
        assert_eq!(value_at(&sheet, "B1"), CellValue::Blank);
    }

    #[test]
    fn array_groups_are_rebuilt() {
        let sheet = read(
            r#"<sheetData>
<row r="4"><c r="C4"><f t="array" ref="C4:C5">A4:A5*2</f><v>2</v></c></row>
<row r="5"><c r="C5"><v>4</v></c></row>
</sheetData>"#,
            None,
        );
        let anchor = sheet.cell(CellRef::from_a1("C4").unwrap()).unwrap();
        assert!(anchor.is_array_formula_anchor());
        assert_eq!(anchor.formula(), Some("A4:A5*2"));
        assert_eq!(anchor.value(), &CellValue::Number(2.0));
        let member = sheet.cell(CellRef::from_a1("C5").unwrap()).unwrap();
        assert_eq!(member.formula(), None);
        assert_eq!(member.array_formula_range(), Range::from_a1("C4:C5").ok());
        assert_eq!(member.value(), &CellValue::Number(4.0));
    }

    #[test]
    fn missing_cell_references_follow_the_previous_cell() {
        let sheet = read(
            r#"<sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c r="C2"><v>3</v></c><c><v>4</v></c></row></sheetData>"#,
            None,
        );
        assert_eq!(value_at(&sheet, "B1"), CellValue::Number(2.0));
        assert_eq!(value_at(&sheet, "D2"), CellValue::Number(4.0));
    }

    #[test]
    fn sheet_properties_are_read() {
        let sheet = read(
            r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews>
<sheetFormatPr defaultRowHeight="18" defaultColWidth="12.5"/>
<cols><col min="2" max="3" width="30" customWidth="1" style="1" hidden="1"/></cols>
<sheetData><row r="2" ht="24" customHeight="1" outlineLevel="2" hidden="1"/></sheetData>
<mergeCells count="1"><mergeCell ref="A1:B2"/></mergeCells>
<hyperlinks><hyperlink ref="D4" location="Other!A1" display="go"/></hyperlinks>
<headerFooter differentFirst="1"><oddHeader>&amp;CTitle</oddHeader><firstFooter>Page &amp;P</firstFooter></headerFooter>
<rowBreaks count="1" manualBreakCount="1"><brk id="10" max="16383" man="1"/></rowBreaks>
<colBreaks count="1" manualBreakCount="1"><brk id="3" max="1048575" man="1"/></colBreaks>"#,
            None,
        );

        assert!(sheet.tab_selected);
        assert_eq!(sheet.default_row_height_points, 18.0);
        assert_eq!(sheet.default_column_width, Some(12.5));
        let (col, props) = sheet.columns().next().unwrap();
        assert_eq!(col, 1);
        assert_eq!(props.width, Some(30.0));
        assert_eq!(props.style_id, Some(1));
        assert!(props.hidden);
        assert_eq!(sheet.columns().count(), 2);

        let row = sheet.rows().next().unwrap();
        assert_eq!(row.index(), 1);
        assert_eq!(row.height_in_points(), Some(24.0));
        assert_eq!(row.outline_level(), 2);
        assert!(row.is_hidden());

        assert_eq!(sheet.merged_regions(), &[Range::from_a1("A1:B2").unwrap()]);
        let link = &sheet.hyperlinks()[0];
        assert_eq!(link.target, HyperlinkTarget::Document("Other!A1".to_string()));
        assert_eq!(link.display.as_deref(), Some("go"));
        assert_eq!(sheet.header_footer.odd_header.as_deref(), Some("&CTitle"));
        assert_eq!(sheet.header_footer.first_footer.as_deref(), Some("Page &P"));
        assert!(sheet.header_footer.different_first);
        assert_eq!(sheet.row_breaks().collect::<Vec<_>>(), vec![9]);
        assert_eq!(sheet.column_breaks().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn view_print_and_outline_settings_are_read() {
        let sheet = read(
            r#"<sheetPr><outlinePr summaryBelow="0" summaryRight="0"/><pageSetUpPr fitToPage="1" autoPageBreaks="0"/></sheetPr>
<sheetViews><sheetView showFormulas="1" showGridLines="0" showRowColHeaders="0" topLeftCell="B5" zoomScale="75" workbookViewId="0">
<pane xSplit="2" ySplit="1" topLeftCell="C2" activePane="bottomRight" state="frozen"/>
<selection pane="topRight" activeCell="D1" sqref="D1"/>
<selection pane="bottomRight" activeCell="E7" sqref="E7"/>
</sheetView><sheetView workbookViewId="1"><pane ySplit="9" state="frozen"/></sheetView></sheetViews>
<cols><col min="1" max="2" outlineLevel="1" collapsed="1"/></cols>
<printOptions verticalCentered="1" headings="1"/>
<pageMargins left="0.25" right="0.25" top="1" bottom="1" header="0.5" footer="0.5"/>
<pageSetup paperSize="9" scale="80" fitToWidth="2" fitToHeight="0" orientation="landscape"/>"#,
            None,
        );

        let view = &sheet.view;
        assert!(view.show_formulas);
        assert!(!view.show_grid_lines);
        assert!(!view.show_row_col_headers);
        assert_eq!(view.zoom_scale, 75);
        assert_eq!(view.top_left_cell, CellRef::from_a1("B5").ok());
        assert_eq!(view.active_cell, CellRef::from_a1("E7").ok());
        assert_eq!(
            view.pane,
            Some(Pane::frozen(2, 1, CellRef::from_a1("C2").unwrap()))
        );

        assert!(!sheet.outline.summary_below);
        assert!(!sheet.outline.summary_right);
        assert!(sheet.outline.show_outline_symbols);
        let (_, col) = sheet.columns().next().unwrap();
        assert_eq!((col.outline_level, col.collapsed), (1, true));

        let setup = &sheet.page_setup;
        assert!(setup.fit_to_page);
        assert!(!setup.auto_page_breaks);
        assert_eq!(setup.paper_size, PaperSize::A4);
        assert_eq!((setup.scale, setup.fit_to_width, setup.fit_to_height), (80, 2, 0));
        assert_eq!(setup.orientation, Orientation::Landscape);
        assert!(sheet.print_options.vertical_centered);
        assert!(sheet.print_options.headings);
        assert!(!sheet.print_options.grid_lines);
        assert_eq!(sheet.page_margins.left, 0.25);
        assert_eq!(sheet.page_margins.footer, 0.5);
    }

    #[test]
    fn out_of_range_zoom_keeps_the_default() {
        let sheet = read(
            r#"<sheetViews><sheetView zoomScale="900" workbookViewId="0"/></sheetViews>"#,
            None,
        );
        assert_eq!(sheet.view.zoom_scale, 100);
        assert_eq!(sheet.view.pane, None);
    }

    #[test]
    fn overlapping_merged_regions_in_a_file_are_skipped() {
        let sheet = read(
            r#"<sheetData/><mergeCells count="3"><mergeCell ref="A1:B2"/><mergeCell ref="B2:C3"/><mergeCell ref="D1:E1"/></mergeCells>"#,
            None,
        );
        assert_eq!(
            sheet.merged_regions(),
            &[
                Range::from_a1("A1:B2").unwrap(),
                Range::from_a1("D1:E1").unwrap(),
            ]
        );
    }
}
