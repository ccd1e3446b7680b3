use sheetml_model::{ArgbColor, Color, ColorKind};

use crate::xml::push_attr;

/// Append `<tag .../>` carrying `color`.
pub(crate) fn push_color(out: &mut String, tag: &str, color: &Color) {
    out.push('<');
    out.push_str(tag);
    match color.kind() {
        ColorKind::Auto => push_attr(out, "auto", 1),
        ColorKind::Indexed(index) => push_attr(out, "indexed", index),
        ColorKind::Rgb(argb) => push_attr(out, "rgb", argb.to_hex()),
        ColorKind::Theme(index) => push_attr(out, "theme", index),
    }
    if let Some(tint) = color.tint() {
        push_attr(out, "tint", tint);
    }
    out.push_str("/>");
}

/// Build a color from the attributes of a `<color>`-shaped element.
///
/// `attr` looks an attribute up by local name. Returns `None` when the
/// element names no color at all.
pub(crate) fn color_from_attrs(attr: impl Fn(&str) -> Option<String>) -> Option<Color> {
    let mut color = if let Some(rgb) = attr("rgb") {
        match ArgbColor::from_hex(&rgb) {
            Some(argb) => Color::rgb(argb),
            None => {
                log::warn!("ignoring malformed rgb color {rgb:?}");
                return None;
            }
        }
    } else if let Some(theme) = attr("theme").and_then(|v| v.parse().ok()) {
        Color::theme(theme)
    } else if let Some(indexed) = attr("indexed").and_then(|v| v.parse().ok()) {
        Color::indexed(indexed)
    } else if attr("auto").is_some_and(|v| crate::xml::parse_xml_bool(&v)) {
        Color::auto()
    } else {
        return None;
    };
    if let Some(tint) = attr("tint").and_then(|v| v.parse::<f64>().ok()) {
        color.set_tint(Some(tint));
    }
    Some(color)
}
