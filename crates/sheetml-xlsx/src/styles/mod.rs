//! `xl/styles.xml` for the cell-format pipeline.
//!
//! SpreadsheetML stores cell formats as `xf` records in `cellXfs`; cells point at
//! them by index through `s=`. The registry keeps the same indices, so both
//! directions are a straight table copy: no remapping of cell style ids.

use roxmltree::{Document, Node};
use sheetml_model::{
    builtin_format_code, Alignment, ArgbColor, Border, BorderEdge, BorderStyle, CellProtection,
    Color, Fill, FillPattern, Font, HorizontalAlignment, IndexedPalette, NumberFormatTable,
    StyleRecord, StyleRegistry, Underline, VerticalAlignment,
};

use crate::color::{color_from_attrs, push_color};
use crate::xml::{parse_xml_bool, push_attr, SPREADSHEETML_NS, XML_DECLARATION};
use crate::XlsxError;

pub(crate) const STYLES_PART: &str = "xl/styles.xml";

pub(crate) fn write_styles_xml(styles: &StyleRegistry) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(r#"<styleSheet xmlns="{SPREADSHEETML_NS}">"#));

    let formats: Vec<(u16, &str)> = styles.number_formats().explicit().collect();
    if !formats.is_empty() {
        out.push_str(&format!(r#"<numFmts count="{}">"#, formats.len()));
        for (id, code) in formats {
            out.push_str("<numFmt");
            push_attr(&mut out, "numFmtId", id);
            push_attr(&mut out, "formatCode", code);
            out.push_str("/>");
        }
        out.push_str("</numFmts>");
    }

    out.push_str(&format!(r#"<fonts count="{}">"#, styles.fonts().len()));
    for font in styles.fonts() {
        write_font(&mut out, font);
    }
    out.push_str("</fonts>");

    out.push_str(&format!(r#"<fills count="{}">"#, styles.fills().len()));
    for fill in styles.fills() {
        write_fill(&mut out, fill);
    }
    out.push_str("</fills>");

    out.push_str(&format!(r#"<borders count="{}">"#, styles.borders().len()));
    for border in styles.borders() {
        write_border(&mut out, border);
    }
    out.push_str("</borders>");

    out.push_str(
        r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    );
    out.push_str(&format!(r#"<cellXfs count="{}">"#, styles.cell_formats().len()));
    for record in styles.cell_formats() {
        write_xf(&mut out, record);
    }
    out.push_str("</cellXfs>");
    out.push_str(
        r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    );

    if !styles.palette.is_default() {
        out.push_str("<colors><indexedColors>");
        for color in styles.palette.colors() {
            out.push_str(&format!(r#"<rgbColor rgb="{}"/>"#, color.to_hex()));
        }
        out.push_str("</indexedColors></colors>");
    }

    out.push_str("</styleSheet>");
    out
}

fn write_font(out: &mut String, font: &Font) {
    out.push_str("<font>");
    if font.bold {
        out.push_str("<b/>");
    }
    if font.italic {
        out.push_str("<i/>");
    }
    if font.strike {
        out.push_str("<strike/>");
    }
    if let Some(underline) = font.underline {
        match underline.to_ooxml() {
            Some(val) => out.push_str(&format!(r#"<u val="{val}"/>"#)),
            None => out.push_str("<u/>"),
        }
    }
    out.push_str(&format!(r#"<sz val="{}"/>"#, f64::from(font.size_100pt) / 100.0));
    if let Some(color) = &font.color {
        push_color(out, "color", color);
    }
    out.push_str("<name");
    push_attr(out, "val", &font.name);
    out.push_str("/>");
    out.push_str("</font>");
}

fn write_fill(out: &mut String, fill: &Fill) {
    out.push_str("<fill><patternFill");
    push_attr(out, "patternType", fill.pattern.to_ooxml());
    if fill.fg_color.is_none() && fill.bg_color.is_none() {
        out.push_str("/></fill>");
        return;
    }
    out.push('>');
    if let Some(color) = &fill.fg_color {
        push_color(out, "fgColor", color);
    }
    if let Some(color) = &fill.bg_color {
        push_color(out, "bgColor", color);
    }
    out.push_str("</patternFill></fill>");
}

fn write_border(out: &mut String, border: &Border) {
    out.push_str("<border>");
    for (tag, edge) in [
        ("left", &border.left),
        ("right", &border.right),
        ("top", &border.top),
        ("bottom", &border.bottom),
    ] {
        write_border_edge(out, tag, edge);
    }
    out.push_str("<diagonal/></border>");
}

fn write_border_edge(out: &mut String, tag: &str, edge: &BorderEdge) {
    out.push('<');
    out.push_str(tag);
    if edge.style != BorderStyle::None {
        push_attr(out, "style", edge.style.to_ooxml());
    }
    match &edge.color {
        Some(color) => {
            out.push('>');
            push_color(out, "color", color);
            out.push_str(&format!("</{tag}>"));
        }
        None => out.push_str("/>"),
    }
}

fn write_xf(out: &mut String, record: &StyleRecord) {
    out.push_str("<xf");
    push_attr(out, "numFmtId", record.num_fmt_id);
    push_attr(out, "fontId", record.font_id);
    push_attr(out, "fillId", record.fill_id);
    push_attr(out, "borderId", record.border_id);
    push_attr(out, "xfId", 0);
    if record.num_fmt_id != 0 {
        push_attr(out, "applyNumberFormat", 1);
    }
    if record.font_id != 0 {
        push_attr(out, "applyFont", 1);
    }
    if record.fill_id != 0 {
        push_attr(out, "applyFill", 1);
    }
    if record.border_id != 0 {
        push_attr(out, "applyBorder", 1);
    }
    let alignment = !record.alignment.is_default();
    let protection = record.protection != CellProtection::default();
    if alignment {
        push_attr(out, "applyAlignment", 1);
    }
    if protection {
        push_attr(out, "applyProtection", 1);
    }
    if !alignment && !protection {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if alignment {
        write_alignment(out, &record.alignment);
    }
    if protection {
        out.push_str("<protection");
        if !record.protection.locked {
            push_attr(out, "locked", 0);
        }
        if record.protection.hidden {
            push_attr(out, "hidden", 1);
        }
        out.push_str("/>");
    }
    out.push_str("</xf>");
}

fn write_alignment(out: &mut String, alignment: &Alignment) {
    out.push_str("<alignment");
    if let Some(horizontal) = alignment.horizontal {
        push_attr(out, "horizontal", horizontal.to_ooxml());
    }
    if let Some(vertical) = alignment.vertical {
        push_attr(out, "vertical", vertical.to_ooxml());
    }
    if alignment.text_rotation != 0 {
        push_attr(out, "textRotation", alignment.text_rotation);
    }
    if alignment.wrap_text {
        push_attr(out, "wrapText", 1);
    }
    if alignment.indent != 0 {
        push_attr(out, "indent", alignment.indent);
    }
    if alignment.shrink_to_fit {
        push_attr(out, "shrinkToFit", 1);
    }
    out.push_str("/>");
}

// ---- reading ----------------------------------------------------------------

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn node_color(node: Node<'_, '_>) -> Option<Color> {
    color_from_attrs(|name| node.attribute(name).map(str::to_string))
}

/// `<b/>`-style flags: present means true unless `val` says otherwise.
fn flag(node: Node<'_, '_>, name: &str) -> bool {
    child(node, name).is_some_and(|n| n.attribute("val").map_or(true, parse_xml_bool))
}

fn attr_u32(node: Node<'_, '_>, name: &str) -> u32 {
    node.attribute(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

pub(crate) fn parse_styles_xml(xml: &[u8]) -> Result<StyleRegistry, XlsxError> {
    let xml = std::str::from_utf8(xml)?;
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let mut number_formats = NumberFormatTable::new();
    if let Some(num_fmts) = child(root, "numFmts") {
        for num_fmt in children(num_fmts, "numFmt") {
            let (Some(id), Some(code)) = (
                num_fmt.attribute("numFmtId").and_then(|v| v.parse::<u16>().ok()),
                num_fmt.attribute("formatCode"),
            ) else {
                log::warn!("skipping malformed numFmt");
                continue;
            };
            if builtin_format_code(id) != Some(code) {
                number_formats.put(id, code);
            }
        }
    }

    let fonts: Vec<Font> = child(root, "fonts")
        .map(|n| children(n, "font").map(parse_font).collect())
        .unwrap_or_default();
    let fills: Vec<Fill> = child(root, "fills")
        .map(|n| children(n, "fill").map(parse_fill).collect())
        .unwrap_or_default();
    let borders: Vec<Border> = child(root, "borders")
        .map(|n| children(n, "border").map(parse_border).collect())
        .unwrap_or_default();

    let defaults = StyleRegistry::new();
    let font_count = effective_len(fonts.len(), defaults.fonts().len());
    let fill_count = effective_len(fills.len(), defaults.fills().len());
    let border_count = effective_len(borders.len(), defaults.borders().len());

    let mut cell_formats = Vec::new();
    if let Some(cell_xfs) = child(root, "cellXfs") {
        for (index, xf) in children(cell_xfs, "xf").enumerate() {
            let mut record = parse_xf(xf);
            sanitize_id(&mut record.font_id, font_count, "font", index);
            sanitize_id(&mut record.fill_id, fill_count, "fill", index);
            sanitize_id(&mut record.border_id, border_count, "border", index);
            if !number_formats.contains(record.num_fmt_id) {
                log::warn!(
                    "cell format {index} references unknown number format {}; using General",
                    record.num_fmt_id
                );
                record.num_fmt_id = 0;
            }
            cell_formats.push(record);
        }
    }

    let palette = child(root, "colors")
        .and_then(|colors| child(colors, "indexedColors"))
        .map(|indexed| {
            IndexedPalette::from_colors(
                children(indexed, "rgbColor")
                    .map(|n| {
                        n.attribute("rgb")
                            .and_then(ArgbColor::from_hex)
                            .unwrap_or(ArgbColor(0xFF000000))
                    })
                    .collect(),
            )
        })
        .unwrap_or_default();

    Ok(StyleRegistry::from_parts(
        fonts,
        fills,
        borders,
        cell_formats,
        number_formats,
        palette,
    )?)
}

fn effective_len(len: usize, default_len: usize) -> u32 {
    if len == 0 {
        default_len as u32
    } else {
        len as u32
    }
}

fn sanitize_id(id: &mut u32, count: u32, what: &str, xf: usize) {
    if *id >= count {
        log::warn!("cell format {xf} references unknown {what} {id}; using {what} 0");
        *id = 0;
    }
}

fn parse_font(node: Node<'_, '_>) -> Font {
    let defaults = Font::default();
    Font {
        name: child(node, "name")
            .and_then(|n| n.attribute("val"))
            .map(str::to_string)
            .unwrap_or(defaults.name),
        size_100pt: child(node, "sz")
            .and_then(|n| n.attribute("val"))
            .and_then(|v| v.parse::<f64>().ok())
            .map(|points| (points * 100.0).round().clamp(0.0, f64::from(u16::MAX)) as u16)
            .unwrap_or(defaults.size_100pt),
        bold: flag(node, "b"),
        italic: flag(node, "i"),
        strike: flag(node, "strike"),
        underline: child(node, "u").and_then(|n| Underline::from_ooxml(n.attribute("val"))),
        color: child(node, "color").and_then(node_color),
    }
}

fn parse_fill(node: Node<'_, '_>) -> Fill {
    let Some(pattern_fill) = child(node, "patternFill") else {
        log::warn!("unsupported fill (gradient fills are not modelled); using an empty fill");
        return Fill::default();
    };
    let pattern = pattern_fill
        .attribute("patternType")
        .map(|v| {
            FillPattern::from_ooxml(v).unwrap_or_else(|| {
                log::warn!("unknown fill pattern {v:?}");
                FillPattern::None
            })
        })
        .unwrap_or_default();
    Fill {
        pattern,
        fg_color: child(pattern_fill, "fgColor").and_then(node_color),
        bg_color: child(pattern_fill, "bgColor").and_then(node_color),
    }
}

fn parse_border(node: Node<'_, '_>) -> Border {
    let edge = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| child(node, name))
            .map(|n| BorderEdge {
                style: n
                    .attribute("style")
                    .and_then(BorderStyle::from_ooxml)
                    .unwrap_or_default(),
                color: child(n, "color").and_then(node_color),
            })
            .unwrap_or_default()
    };
    Border {
        left: edge(&["left", "start"]),
        right: edge(&["right", "end"]),
        top: edge(&["top"]),
        bottom: edge(&["bottom"]),
    }
}

fn parse_xf(node: Node<'_, '_>) -> StyleRecord {
    let alignment = child(node, "alignment")
        .map(|n| Alignment {
            horizontal: n.attribute("horizontal").and_then(HorizontalAlignment::from_ooxml),
            vertical: n.attribute("vertical").and_then(VerticalAlignment::from_ooxml),
            wrap_text: n.attribute("wrapText").is_some_and(parse_xml_bool),
            shrink_to_fit: n.attribute("shrinkToFit").is_some_and(parse_xml_bool),
            indent: n
                .attribute("indent")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            text_rotation: n
                .attribute("textRotation")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        })
        .unwrap_or_default();
    let protection = child(node, "protection")
        .map(|n| CellProtection {
            locked: n.attribute("locked").map_or(true, parse_xml_bool),
            hidden: n.attribute("hidden").is_some_and(parse_xml_bool),
        })
        .unwrap_or_default();
    StyleRecord {
        num_fmt_id: node
            .attribute("numFmtId")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0),
        font_id: attr_u32(node, "fontId"),
        fill_id: attr_u32(node, "fillId"),
        border_id: attr_u32(node, "borderId"),
        alignment,
        protection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn sample_registry() -> StyleRegistry {
        let mut styles = StyleRegistry::new();
        let font = styles.intern_font(Font {
            bold: true,
            underline: Some(Underline::Double),
            color: Some(Color::rgb(ArgbColor(0xFFFF0000))),
            ..Font::default()
        });
        let fill = styles.intern_fill(Fill::solid(Color::theme(4).with_tint(0.4)));
        let border = styles.intern_border(Border::all(BorderStyle::Thin, Some(Color::indexed(8))));
        let num_fmt = styles.intern_number_format("0.000%").unwrap();
        styles
            .intern_style(
                StyleRecord::default()
                    .with_font(font)
                    .with_fill(fill)
                    .with_border(border)
                    .with_num_fmt(num_fmt)
                    .with_alignment(Alignment {
                        horizontal: Some(HorizontalAlignment::Center),
                        wrap_text: true,
                        text_rotation: 45,
                        ..Alignment::default()
                    }),
            )
            .unwrap();
        styles
            .intern_style(StyleRecord {
                protection: CellProtection {
                    locked: false,
                    hidden: true,
                },
                ..StyleRecord::default()
            })
            .unwrap();
        styles.palette.set(10, ArgbColor(0xFF00FF00));
        styles
    }

    #[test]
    fn registry_round_trips_with_stable_indices() {
        let styles = sample_registry();
        let back = parse_styles_xml(write_styles_xml(&styles).as_bytes()).unwrap();

        assert_eq!(back.fonts(), styles.fonts());
        assert_eq!(back.fills(), styles.fills());
        assert_eq!(back.borders(), styles.borders());
        assert_eq!(back.cell_formats(), styles.cell_formats());
        assert_eq!(back.number_formats(), styles.number_formats());
        assert_eq!(back.palette, styles.palette);
    }

    #[test]
    fn custom_number_formats_are_listed() {
        let xml = write_styles_xml(&sample_registry());
        assert!(xml.contains(r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="0.000%"/></numFmts>"#));
        assert!(xml.contains(r#"<protection locked="0" hidden="1"/>"#));
    }

    #[test]
    fn dangling_component_ids_fall_back_to_defaults() {
        let xml = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1"><font><sz val="11"/><name val="Arial"/></font></fonts>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="999" fontId="7" fillId="0" borderId="0"/>
  </cellXfs>
</styleSheet>"#;
        let styles = parse_styles_xml(xml.as_bytes()).unwrap();
        assert_eq!(styles.cell_formats().len(), 2);
        assert_eq!(styles.cell_formats()[1], StyleRecord::default());
        assert_eq!(styles.fonts()[0].name, "Arial");
        assert_eq!(styles.fonts()[0].color, None);
    }
}
