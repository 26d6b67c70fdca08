use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Amount text that cannot be read as a decimal currency value.
    AmountParse { value: String, reason: String },
    /// Amount outside the representable cent range.
    AmountOverflow { value: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmountParse { value, reason } => {
                write!(f, "cannot parse amount '{value}': {reason}")
            }
            Self::AmountOverflow { value } => write!(f, "amount '{value}' is out of range"),
        }
    }
}

impl std::error::Error for ReconError {}
