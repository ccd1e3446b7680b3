//! `xl/theme/theme1.xml`: only the color scheme is modelled; font and format
//! schemes are written as fixed Office defaults.

use roxmltree::Document;
use sheetml_model::{ArgbColor, ThemeColorSlot, ThemePalette};

use crate::xml::{DRAWINGML_NS, XML_DECLARATION};
use crate::XlsxError;

pub(crate) const THEME_PART: &str = "xl/theme/theme1.xml";

const FONT_SCHEME: &str = concat!(
    r#"<a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Cambria"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    r#"</a:fontScheme>"#,
);

const FORMAT_SCHEME: &str = concat!(
    r#"<a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"</a:fillStyleLst>"#,
    r#"<a:lnStyleLst>"#,
    r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"</a:lnStyleLst>"#,
    r#"<a:effectStyleLst>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"</a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"</a:bgFillStyleLst>"#,
    r#"</a:fmtScheme>"#,
);

/// Scheme order inside `<a:clrScheme>`; differs from the theme index order.
const SCHEME_ORDER: [ThemeColorSlot; 12] = [
    ThemeColorSlot::Dk1,
    ThemeColorSlot::Lt1,
    ThemeColorSlot::Dk2,
    ThemeColorSlot::Lt2,
    ThemeColorSlot::Accent1,
    ThemeColorSlot::Accent2,
    ThemeColorSlot::Accent3,
    ThemeColorSlot::Accent4,
    ThemeColorSlot::Accent5,
    ThemeColorSlot::Accent6,
    ThemeColorSlot::Hlink,
    ThemeColorSlot::FolHlink,
];

pub(crate) fn write_theme_xml(palette: &ThemePalette) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(
        r#"<a:theme xmlns:a="{DRAWINGML_NS}" name="Office Theme"><a:themeElements>"#
    ));
    out.push_str(r#"<a:clrScheme name="Office">"#);
    for slot in SCHEME_ORDER {
        let tag = slot.scheme_element();
        let rgb = palette.get(slot).0 & 0x00FF_FFFF;
        out.push_str(&format!(r#"<a:{tag}><a:srgbClr val="{rgb:06X}"/></a:{tag}>"#));
    }
    out.push_str("</a:clrScheme>");
    out.push_str(FONT_SCHEME);
    out.push_str(FORMAT_SCHEME);
    out.push_str("</a:themeElements></a:theme>");
    out
}

/// Read the color scheme of a theme part. Missing entries keep their defaults.
pub(crate) fn parse_theme_palette(theme_xml: &[u8]) -> Result<ThemePalette, XlsxError> {
    let xml = std::str::from_utf8(theme_xml)?;
    let doc = Document::parse(xml)?;

    let mut palette = ThemePalette::default();
    let Some(clr_scheme) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "clrScheme")
    else {
        return Ok(palette);
    };

    for slot in ThemeColorSlot::ALL {
        if let Some(color) = parse_clr_scheme_entry(clr_scheme, slot.scheme_element()) {
            palette.set(slot, color);
        }
    }
    Ok(palette)
}

fn parse_clr_scheme_entry(clr_scheme: roxmltree::Node<'_, '_>, name: &str) -> Option<ArgbColor> {
    let entry = clr_scheme
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == name)?;
    let clr = entry.children().find(|n| n.is_element())?;

    match clr.tag_name().name() {
        "srgbClr" => clr.attribute("val").and_then(ArgbColor::from_hex),
        "sysClr" => clr
            .attribute("lastClr")
            .and_then(ArgbColor::from_hex)
            .or_else(|| match clr.attribute("val") {
                Some("windowText") => Some(ArgbColor(0xFF000000)),
                Some("window") => Some(ArgbColor(0xFFFFFFFF)),
                _ => None,
            }),
        other => {
            log::warn!("unsupported theme color element <{other}> for {name}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parses_palette_from_theme_xml() {
        let theme = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:sysClr val="windowText" lastClr="111111"/></a:dk1>
      <a:lt1><a:sysClr val="window"/></a:lt1>
      <a:accent1><a:srgbClr val="010203"/></a:accent1>
      <a:folHlink><a:srgbClr val="161718"/></a:folHlink>
    </a:clrScheme>
  </a:themeElements>
</a:theme>"#;

        let palette = parse_theme_palette(theme.as_bytes()).unwrap();
        assert_eq!(palette.dk1, ArgbColor(0xFF111111));
        assert_eq!(palette.lt1, ArgbColor(0xFFFFFFFF));
        assert_eq!(palette.accent1, ArgbColor(0xFF010203));
        assert_eq!(palette.fol_hlink, ArgbColor(0xFF161718));
        assert_eq!(palette.accent2, ThemePalette::default().accent2);
    }

    #[test]
    fn written_theme_round_trips() {
        let mut palette = ThemePalette::default();
        palette.set(ThemeColorSlot::Accent3, ArgbColor(0xFF123456));

        let xml = write_theme_xml(&palette);
        assert!(xml.contains(r#"<a:accent3><a:srgbClr val="123456"/></a:accent3>"#));
        assert_eq!(parse_theme_palette(xml.as_bytes()).unwrap(), palette);
    }
}
