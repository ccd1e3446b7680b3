use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Spreadsheet error codes a cell can hold (`t="e"` cells).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorValue {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
    GettingData,
}

impl ErrorValue {
    pub const ALL: [ErrorValue; 8] = [
        ErrorValue::Null,
        ErrorValue::Div0,
        ErrorValue::Value,
        ErrorValue::Ref,
        ErrorValue::Name,
        ErrorValue::Num,
        ErrorValue::NA,
        ErrorValue::GettingData,
    ];

    /// Canonical error literal as it appears in cells and formulas.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorValue::Null => "#NULL!",
            ErrorValue::Div0 => "#DIV/0!",
            ErrorValue::Value => "#VALUE!",
            ErrorValue::Ref => "#REF!",
            ErrorValue::Name => "#NAME?",
            ErrorValue::Num => "#NUM!",
            ErrorValue::NA => "#N/A",
            ErrorValue::GettingData => "#GETTING_DATA",
        }
    }

    /// BIFF-compatible numeric error code.
    pub const fn code(self) -> u8 {
        match self {
            ErrorValue::Null => 0x00,
            ErrorValue::Div0 => 0x07,
            ErrorValue::Value => 0x0F,
            ErrorValue::Ref => 0x17,
            ErrorValue::Name => 0x1D,
            ErrorValue::Num => 0x24,
            ErrorValue::NA => 0x2A,
            ErrorValue::GettingData => 0x2B,
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text is not a known error literal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown error literal: {0}")]
pub struct UnknownErrorLiteral(pub String);

impl FromStr for ErrorValue {
    type Err = UnknownErrorLiteral;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ErrorValue::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownErrorLiteral(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_parse_back() {
        for err in ErrorValue::ALL {
            assert_eq!(err.as_str().parse::<ErrorValue>().unwrap(), err);
        }
        assert_eq!("#n/a".parse::<ErrorValue>().unwrap(), ErrorValue::NA);
        assert!("#BOGUS!".parse::<ErrorValue>().is_err());
    }
}
