use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spot and option values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates and yields expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions
pub type Years = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every pricing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    /// Nodes in one lattice, (N+1)(N+2)/2
    pub lattice_nodes: usize,
    pub precision: String,
}

/// Wrap a pricing result with its methodology, assumptions and run metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    lattice_nodes: usize,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            lattice_nodes,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
