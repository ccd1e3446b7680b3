use serde::{Deserialize, Serialize};

use crate::Range;

/// Where a hyperlink points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum HyperlinkTarget {
    /// External URL (`http://...`), stored through a relationship.
    Url(String),
    /// E-mail address; serialized as a `mailto:` relationship target.
    Email(String),
    /// Path to a local or network file.
    File(String),
    /// Location inside this workbook (`Sheet2!A1`, a defined name).
    Document(String),
}

impl HyperlinkTarget {
    /// True when the target lives outside the package (needs a relationship).
    pub fn is_external(&self) -> bool {
        !matches!(self, HyperlinkTarget::Document(_))
    }

    /// Relationship target string for external links.
    pub fn relationship_target(&self) -> Option<String> {
        match self {
            HyperlinkTarget::Url(url) => Some(url.clone()),
            HyperlinkTarget::Email(address) => Some(if address.starts_with("mailto:") {
                address.clone()
            } else {
                format!("mailto:{address}")
            }),
            HyperlinkTarget::File(path) => Some(path.clone()),
            HyperlinkTarget::Document(_) => None,
        }
    }

    /// Classify a relationship target read back from a package.
    pub fn from_relationship_target(target: &str) -> Self {
        if let Some(address) = target.strip_prefix("mailto:") {
            HyperlinkTarget::Email(address.to_string())
        } else if target.contains("://") {
            HyperlinkTarget::Url(target.to_string())
        } else {
            HyperlinkTarget::File(target.to_string())
        }
    }
}

/// A hyperlink anchored on a cell range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub range: Range,
    pub target: HyperlinkTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl Hyperlink {
    pub fn new(range: Range, target: HyperlinkTarget) -> Self {
        Self {
            range,
            target,
            display: None,
            tooltip: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_targets_round_trip_through_mailto() {
        let target = HyperlinkTarget::Email("dev@example.com".into());
        let rel = target.relationship_target().unwrap();
        assert_eq!(rel, "mailto:dev@example.com");
        assert_eq!(HyperlinkTarget::from_relationship_target(&rel), target);
        assert!(!HyperlinkTarget::Document("Sheet2!A1".into()).is_external());
    }
}
