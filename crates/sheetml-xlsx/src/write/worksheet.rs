use sheetml_model::{
    Cell, CellRef, CellValue, ColumnProps, HeaderFooterSettings, HyperlinkTarget, PageSetup,
    Range, RichText, SharedStringTable, SheetView, StringValue, Worksheet,
    DEFAULT_ROW_HEIGHT_POINTS, EXCEL_MAX_COLS, EXCEL_MAX_ROWS,
};

use crate::relationships::{RelationshipsWriter, REL_TYPE_HYPERLINK};
use crate::rich_text::push_rich_text;
use crate::xml::{
    escape_text, format_f64, push_attr, push_text_element, RELATIONSHIPS_NS, SPREADSHEETML_NS,
    XML_DECLARATION,
};

/// Cell payload after the `t` attribute has been chosen.
enum CellBody<'a> {
    Empty,
    Value(String),
    Inline(&'a RichText),
}

/// Render one worksheet part.
///
/// External hyperlink targets are registered on `rels`; `table_rel_ids` must
/// already be present there.
pub(super) fn write_worksheet_xml(
    sheet: &Worksheet,
    shared_strings: Option<&SharedStringTable>,
    rels: &mut RelationshipsWriter,
    table_rel_ids: &[String],
) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(
        r#"<worksheet xmlns="{SPREADSHEETML_NS}" xmlns:r="{RELATIONSHIPS_NS}">"#
    ));

    push_sheet_pr(&mut out, sheet);

    out.push_str("<dimension");
    push_attr(&mut out, "ref", used_range(sheet));
    out.push_str("/>");

    push_sheet_view(&mut out, &sheet.view, sheet.tab_selected);

    out.push_str("<sheetFormatPr");
    if let Some(width) = sheet.default_column_width {
        push_attr(&mut out, "defaultColWidth", width);
    }
    push_attr(&mut out, "defaultRowHeight", sheet.default_row_height_points);
    if sheet.default_row_height_points != DEFAULT_ROW_HEIGHT_POINTS {
        push_attr(&mut out, "customHeight", 1);
    }
    let row_level = sheet.max_row_outline_level();
    if row_level > 0 {
        push_attr(&mut out, "outlineLevelRow", row_level);
    }
    let col_level = sheet.max_column_outline_level();
    if col_level > 0 {
        push_attr(&mut out, "outlineLevelCol", col_level);
    }
    out.push_str("/>");

    push_cols(&mut out, sheet);
    push_sheet_data(&mut out, sheet, shared_strings);

    if !sheet.merged_regions().is_empty() {
        out.push_str("<mergeCells");
        push_attr(&mut out, "count", sheet.merged_regions().len());
        out.push('>');
        for range in sheet.merged_regions() {
            out.push_str("<mergeCell");
            push_attr(&mut out, "ref", range);
            out.push_str("/>");
        }
        out.push_str("</mergeCells>");
    }

    if !sheet.hyperlinks().is_empty() {
        out.push_str("<hyperlinks>");
        for link in sheet.hyperlinks() {
            out.push_str("<hyperlink");
            push_attr(&mut out, "ref", link.range);
            match (&link.target, link.target.relationship_target()) {
                (HyperlinkTarget::Document(location), _) => {
                    push_attr(&mut out, "location", location);
                }
                (_, Some(target)) => {
                    let id = rels.add_external(REL_TYPE_HYPERLINK, target);
                    push_attr(&mut out, "r:id", id);
                }
                (_, None) => {}
            }
            if let Some(display) = &link.display {
                push_attr(&mut out, "display", display);
            }
            if let Some(tooltip) = &link.tooltip {
                push_attr(&mut out, "tooltip", tooltip);
            }
            out.push_str("/>");
        }
        out.push_str("</hyperlinks>");
    }

    let print = &sheet.print_options;
    if !print.is_default() {
        out.push_str("<printOptions");
        for (name, on) in [
            ("horizontalCentered", print.horizontal_centered),
            ("verticalCentered", print.vertical_centered),
            ("headings", print.headings),
            ("gridLines", print.grid_lines),
        ] {
            if on {
                push_attr(&mut out, name, 1);
            }
        }
        out.push_str("/>");
    }

    let margins = &sheet.page_margins;
    out.push_str("<pageMargins");
    push_attr(&mut out, "left", margins.left);
    push_attr(&mut out, "right", margins.right);
    push_attr(&mut out, "top", margins.top);
    push_attr(&mut out, "bottom", margins.bottom);
    push_attr(&mut out, "header", margins.header);
    push_attr(&mut out, "footer", margins.footer);
    out.push_str("/>");

    push_page_setup(&mut out, &sheet.page_setup);

    if !sheet.header_footer.is_empty() {
        push_header_footer(&mut out, &sheet.header_footer);
    }

    let row_breaks: Vec<u32> = sheet.row_breaks().collect();
    push_breaks(&mut out, "rowBreaks", &row_breaks, EXCEL_MAX_COLS - 1);
    let col_breaks: Vec<u32> = sheet.column_breaks().collect();
    push_breaks(&mut out, "colBreaks", &col_breaks, EXCEL_MAX_ROWS - 1);

    if !table_rel_ids.is_empty() {
        out.push_str("<tableParts");
        push_attr(&mut out, "count", table_rel_ids.len());
        out.push('>');
        for id in table_rel_ids {
            out.push_str("<tablePart");
            push_attr(&mut out, "r:id", id);
            out.push_str("/>");
        }
        out.push_str("</tableParts>");
    }

    out.push_str("</worksheet>");
    out
}

fn used_range(sheet: &Worksheet) -> Range {
    let mut bounds: Option<(CellRef, CellRef)> = None;
    for cell in sheet.iter_cells() {
        let at = cell.address();
        bounds = Some(match bounds {
            None => (at, at),
            Some((min, max)) => (
                CellRef::new(min.row.min(at.row), min.col.min(at.col)),
                CellRef::new(max.row.max(at.row), max.col.max(at.col)),
            ),
        });
    }
    let (start, end) = bounds.unwrap_or((CellRef::new(0, 0), CellRef::new(0, 0)));
    Range::new(start, end)
}

/// Consecutive columns with identical properties share one `<col>`.
fn push_cols(out: &mut String, sheet: &Worksheet) {
    let mut spans: Vec<(u32, u32, &ColumnProps)> = Vec::new();
    for (col, props) in sheet.columns() {
        if props.is_default() {
            continue;
        }
        match spans.last_mut() {
            Some((_, last, prev)) if *last + 1 == col && *prev == props => *last = col,
            _ => spans.push((col, col, props)),
        }
    }
    if spans.is_empty() {
        return;
    }

    out.push_str("<cols>");
    for (first, last, props) in spans {
        out.push_str("<col");
        push_attr(out, "min", first + 1);
        push_attr(out, "max", last + 1);
        if let Some(width) = props.width {
            push_attr(out, "width", width);
            push_attr(out, "customWidth", 1);
        }
        if let Some(style) = props.style_id {
            push_attr(out, "style", style);
        }
        if props.hidden {
            push_attr(out, "hidden", 1);
        }
        if props.outline_level > 0 {
            push_attr(out, "outlineLevel", props.outline_level);
        }
        if props.collapsed {
            push_attr(out, "collapsed", 1);
        }
        out.push_str("/>");
    }
    out.push_str("</cols>");
}

/// `outlinePr` and `pageSetUpPr`, omitted when both hold Excel's defaults.
fn push_sheet_pr(out: &mut String, sheet: &Worksheet) {
    let outline = &sheet.outline;
    let setup = &sheet.page_setup;
    if outline.is_default() && !setup.fit_to_page && setup.auto_page_breaks {
        return;
    }
    out.push_str("<sheetPr>");
    if !outline.is_default() {
        out.push_str("<outlinePr");
        for (name, on) in [
            ("summaryBelow", outline.summary_below),
            ("summaryRight", outline.summary_right),
            ("showOutlineSymbols", outline.show_outline_symbols),
        ] {
            if !on {
                push_attr(out, name, 0);
            }
        }
        out.push_str("/>");
    }
    if setup.fit_to_page || !setup.auto_page_breaks {
        out.push_str("<pageSetUpPr");
        if !setup.auto_page_breaks {
            push_attr(out, "autoPageBreaks", 0);
        }
        if setup.fit_to_page {
            push_attr(out, "fitToPage", 1);
        }
        out.push_str("/>");
    }
    out.push_str("</sheetPr>");
}

fn push_sheet_view(out: &mut String, view: &SheetView, tab_selected: bool) {
    out.push_str("<sheetViews><sheetView");
    if view.show_formulas {
        push_attr(out, "showFormulas", 1);
    }
    if !view.show_grid_lines {
        push_attr(out, "showGridLines", 0);
    }
    if !view.show_row_col_headers {
        push_attr(out, "showRowColHeaders", 0);
    }
    if tab_selected {
        push_attr(out, "tabSelected", 1);
    }
    if let Some(cell) = view.top_left_cell {
        push_attr(out, "topLeftCell", cell);
    }
    if view.zoom_scale != 100 {
        push_attr(out, "zoomScale", view.zoom_scale);
    }
    push_attr(out, "workbookViewId", 0);
    if view.pane.is_none() && view.active_cell.is_none() {
        out.push_str("/></sheetViews>");
        return;
    }
    out.push('>');

    if let Some(pane) = &view.pane {
        out.push_str("<pane");
        if pane.x_split > 0.0 {
            push_attr(out, "xSplit", pane.x_split);
        }
        if pane.y_split > 0.0 {
            push_attr(out, "ySplit", pane.y_split);
        }
        push_attr(out, "topLeftCell", pane.top_left_cell);
        push_attr(out, "activePane", pane.active_pane.to_ooxml());
        push_attr(out, "state", if pane.frozen { "frozen" } else { "split" });
        out.push_str("/>");
    }
    if let Some(cell) = view.active_cell {
        out.push_str("<selection");
        if let Some(pane) = &view.pane {
            push_attr(out, "pane", pane.active_pane.to_ooxml());
        }
        push_attr(out, "activeCell", cell);
        push_attr(out, "sqref", cell);
        out.push_str("/>");
    }
    out.push_str("</sheetView></sheetViews>");
}

fn push_page_setup(out: &mut String, setup: &PageSetup) {
    let defaults = PageSetup::default();
    if setup.orientation == defaults.orientation
        && setup.paper_size == defaults.paper_size
        && setup.scale == defaults.scale
        && setup.fit_to_width == defaults.fit_to_width
        && setup.fit_to_height == defaults.fit_to_height
    {
        return;
    }
    out.push_str("<pageSetup");
    if setup.paper_size != defaults.paper_size {
        push_attr(out, "paperSize", setup.paper_size.code);
    }
    if setup.scale != defaults.scale {
        push_attr(out, "scale", setup.scale);
    }
    if setup.fit_to_width != defaults.fit_to_width {
        push_attr(out, "fitToWidth", setup.fit_to_width);
    }
    if setup.fit_to_height != defaults.fit_to_height {
        push_attr(out, "fitToHeight", setup.fit_to_height);
    }
    push_attr(out, "orientation", setup.orientation.to_ooxml());
    out.push_str("/>");
}

fn push_sheet_data(out: &mut String, sheet: &Worksheet, shared_strings: Option<&SharedStringTable>) {
    out.push_str("<sheetData>");
    for row in sheet.rows() {
        out.push_str("<row");
        push_attr(out, "r", row.index() + 1);
        if let Some(style) = row.style_id() {
            push_attr(out, "s", style);
            push_attr(out, "customFormat", 1);
        }
        if let Some(points) = row.height_in_points() {
            push_attr(out, "ht", points);
            push_attr(out, "customHeight", 1);
        }
        if row.is_hidden() {
            push_attr(out, "hidden", 1);
        }
        if row.outline_level() > 0 {
            push_attr(out, "outlineLevel", row.outline_level());
        }
        if row.is_collapsed() {
            push_attr(out, "collapsed", 1);
        }

        let mut cells = row.cells().peekable();
        if cells.peek().is_none() {
            out.push_str("/>");
            continue;
        }
        out.push('>');
        for cell in cells {
            push_cell(out, cell, shared_strings);
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData>");
}

fn push_cell(out: &mut String, cell: &Cell, shared_strings: Option<&SharedStringTable>) {
    // Formula results (array members included) are cached as plain text.
    let computed = cell.formula().is_some() || cell.is_part_of_array_formula_group();

    let (cell_type, body) = match cell.value() {
        CellValue::Blank => (None, CellBody::Empty),
        CellValue::Number(n) => match format_f64(*n) {
            Some(text) => (None, CellBody::Value(text)),
            None => {
                log::warn!("{}: non-finite number written as #NUM!", cell.address());
                (Some("e"), CellBody::Value("#NUM!".to_string()))
            }
        },
        CellValue::Boolean(b) => (Some("b"), CellBody::Value(if *b { "1" } else { "0" }.into())),
        CellValue::Error(e) => (Some("e"), CellBody::Value(e.as_str().to_string())),
        CellValue::String(StringValue::Shared(index)) => {
            match shared_strings.and_then(|table| table.get(*index)) {
                Some(text) if computed => {
                    (Some("str"), CellBody::Value(text.plain_text().to_string()))
                }
                Some(_) => (Some("s"), CellBody::Value(index.to_string())),
                None => {
                    log::warn!(
                        "{}: shared string {index} is not in the table; writing a blank cell",
                        cell.address()
                    );
                    (None, CellBody::Empty)
                }
            }
        }
        CellValue::String(StringValue::Inline(text)) if computed => {
            (Some("str"), CellBody::Value(text.plain_text().to_string()))
        }
        CellValue::String(StringValue::Inline(text)) => (Some("inlineStr"), CellBody::Inline(text)),
    };

    out.push_str("<c");
    push_attr(out, "r", cell.address());
    if cell.style_id() != 0 {
        push_attr(out, "s", cell.style_id());
    }
    if let Some(t) = cell_type {
        push_attr(out, "t", t);
    }

    let formula = cell.formula();
    if formula.is_none() && matches!(body, CellBody::Empty) {
        out.push_str("/>");
        return;
    }
    out.push('>');

    if let Some(formula) = formula {
        out.push_str("<f");
        if let Some(range) = cell
            .array_formula_range()
            .filter(|_| cell.is_array_formula_anchor())
        {
            push_attr(out, "t", "array");
            push_attr(out, "ref", range);
        }
        out.push('>');
        out.push_str(&escape_text(formula));
        out.push_str("</f>");
    }

    match body {
        CellBody::Empty => {}
        CellBody::Value(text) => push_text_element(out, "v", &text),
        CellBody::Inline(text) => {
            out.push_str("<is>");
            push_rich_text(out, text);
            out.push_str("</is>");
        }
    }
    out.push_str("</c>");
}

fn push_header_footer(out: &mut String, settings: &HeaderFooterSettings) {
    out.push_str("<headerFooter");
    if settings.different_odd_even {
        push_attr(out, "differentOddEven", 1);
    }
    if settings.different_first {
        push_attr(out, "differentFirst", 1);
    }
    out.push('>');
    for (name, text) in [
        ("oddHeader", &settings.odd_header),
        ("oddFooter", &settings.odd_footer),
        ("evenHeader", &settings.even_header),
        ("evenFooter", &settings.even_footer),
        ("firstHeader", &settings.first_header),
        ("firstFooter", &settings.first_footer),
    ] {
        if let Some(text) = text {
            push_text_element(out, name, text);
        }
    }
    out.push_str("</headerFooter>");
}

/// `<brk id>` is the 1-based index of the row (column) the break follows.
fn push_breaks(out: &mut String, tag: &str, breaks: &[u32], max: u32) {
    if breaks.is_empty() {
        return;
    }
    out.push('<');
    out.push_str(tag);
    push_attr(out, "count", breaks.len());
    push_attr(out, "manualBreakCount", breaks.len());
    out.push('>');
    for index in breaks {
        out.push_str("<brk");
        push_attr(out, "id", index + 1);
        push_attr(out, "max", max);
        push_attr(out, "man", 1);
        out.push_str("/>");
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    use sheetml_model::{ErrorValue, Hyperlink, Orientation};

    fn sheet() -> Worksheet {
        Worksheet::new(1, "Sheet1")
    }

    fn xml_of(sheet: &Worksheet) -> String {
        let mut rels = RelationshipsWriter::new();
        write_worksheet_xml(sheet, None, &mut rels, &[])
    }

    #[test]
    fn array_members_carry_only_cached_values() {
        let mut ws = sheet();
        ws.set_array_formula("=A4:A6*B4:B6", Range::from_a1("C4:C6").unwrap())
            .unwrap();
        ws.cell_mut(CellRef::from_a1("C5").unwrap())
            .unwrap()
            .set_cached_value(12.0);

        let xml = xml_of(&ws);
        assert!(xml.contains(r#"<c r="C4"><f t="array" ref="C4:C6">A4:A6*B4:B6</f></c>"#));
        assert!(xml.contains(r#"<c r="C5"><v>12</v></c>"#));
        assert_eq!(xml.matches("<f").count(), 1);
    }

    #[test]
    fn formula_text_results_use_str() {
        let mut ws = sheet();
        let cell = ws.cell_mut_or_create(CellRef::from_a1("A1").unwrap()).unwrap();
        cell.set_value(StringValue::Inline(RichText::new("ab"))).unwrap();
        cell.set_formula(Some("CONCAT(\"a\",\"b\")")).unwrap();

        let xml = xml_of(&ws);
        assert!(xml.contains(
            r#"<c r="A1" t="str"><f>CONCAT("a","b")</f><v>ab</v></c>"#
        ));
    }

    #[test]
    fn non_finite_numbers_become_num_errors() {
        let mut ws = sheet();
        ws.cell_mut_or_create(CellRef::from_a1("B2").unwrap())
            .unwrap()
            .set_value(f64::INFINITY)
            .unwrap();
        ws.cell_mut_or_create(CellRef::from_a1("B3").unwrap())
            .unwrap()
            .set_value(ErrorValue::Div0)
            .unwrap();

        let xml = xml_of(&ws);
        assert!(xml.contains(r#"<c r="B2" t="e"><v>#NUM!</v></c>"#));
        assert!(xml.contains(r#"<c r="B3" t="e"><v>#DIV/0!</v></c>"#));
        assert!(xml.contains(r#"<dimension ref="B2:B3"/>"#));
    }

    #[test]
    fn columns_with_equal_props_are_grouped() {
        let mut ws = sheet();
        for col in 1..=3 {
            ws.set_column_width(col, 20.5).unwrap();
        }
        ws.set_column_hidden(5, true).unwrap();

        let xml = xml_of(&ws);
        assert!(xml.contains(
            r#"<cols><col min="2" max="4" width="20.5" customWidth="1"/><col min="6" max="6" hidden="1"/></cols>"#
        ));
    }

    #[test]
    fn frozen_pane_and_print_layout_are_written_in_schema_order() {
        let mut ws = sheet();
        ws.create_freeze_pane(1, 2, 1, 2).unwrap();
        ws.set_active_cell(CellRef::from_a1("C4").unwrap()).unwrap();
        ws.set_zoom(150).unwrap();
        ws.view.show_grid_lines = false;
        ws.print_options.horizontal_centered = true;
        ws.print_options.grid_lines = true;
        ws.page_setup.fit_to_page = true;
        ws.page_setup.fit_to_height = 0;
        ws.page_setup.orientation = Orientation::Landscape;
        ws.outline.summary_below = false;
        ws.group_rows(1, 3).unwrap();
        ws.group_columns(2, 2).unwrap();

        let xml = xml_of(&ws);
        assert!(xml.contains(
            r#"<sheetPr><outlinePr summaryBelow="0"/><pageSetUpPr fitToPage="1"/></sheetPr>"#
        ));
        assert!(xml.contains(
            r#"<sheetView showGridLines="0" zoomScale="150" workbookViewId="0"><pane xSplit="1" ySplit="2" topLeftCell="B3" activePane="bottomRight" state="frozen"/><selection pane="bottomRight" activeCell="C4" sqref="C4"/></sheetView>"#
        ));
        assert!(xml.contains(r#"outlineLevelRow="1" outlineLevelCol="1"/>"#));
        assert!(xml.contains(r#"<col min="3" max="3" outlineLevel="1"/>"#));
        assert!(xml.contains(
            r#"<printOptions horizontalCentered="1" gridLines="1"/><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><pageSetup fitToHeight="0" orientation="landscape"/>"#
        ));
        let order: Vec<usize> = [
            "<sheetPr>",
            "<dimension",
            "<sheetViews>",
            "<sheetFormatPr",
            "<cols>",
        ]
        .iter()
        .map(|tag| xml.find(tag).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_sheets_skip_optional_layout_elements() {
        let xml = xml_of(&sheet());
        assert!(!xml.contains("<sheetPr"));
        assert!(!xml.contains("<pageSetup"));
        assert!(!xml.contains("<printOptions"));
        assert!(xml.contains(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#));
        assert!(xml.contains("<pageMargins "));
    }

    #[test]
    fn external_links_get_relationships() {
        let mut ws = sheet();
        let range = Range::from_a1("A1").unwrap();
        ws.add_hyperlink(Hyperlink::new(
            range,
            HyperlinkTarget::Url("https://example.com/?a=1&b=2".to_string()),
        ))
        .unwrap();
        ws.add_hyperlink(Hyperlink::new(
            Range::from_a1("A2").unwrap(),
            HyperlinkTarget::Document("Sheet2!B4".to_string()),
        ))
        .unwrap();
        ws.set_row_break(9).unwrap();

        let mut rels = RelationshipsWriter::new();
        let xml = write_worksheet_xml(&ws, None, &mut rels, &[]);
        assert!(xml.contains(r#"<hyperlink ref="A1" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<hyperlink ref="A2" location="Sheet2!B4"/>"#));
        assert!(xml.contains(r#"<brk id="10" max="16383" man="1"/>"#));
        assert!(rels.to_xml().contains(r#"TargetMode="External""#));
    }
}
