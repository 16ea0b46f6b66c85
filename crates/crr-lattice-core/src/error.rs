use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Degenerate model: {0}")]
    DegenerateModel(String),

    #[error("Arbitrage: risk-neutral probability {probability} lies outside [0, 1]")]
    Arbitrage { probability: Decimal },

    #[error("Numerical overflow in {context}")]
    NumericalOverflow { context: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LatticeError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        LatticeError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        LatticeError::NumericalOverflow {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for LatticeError {
    fn from(e: serde_json::Error) -> Self {
        LatticeError::Serialization(e.to_string())
    }
}
