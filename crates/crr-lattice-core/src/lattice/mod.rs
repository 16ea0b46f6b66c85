pub mod output;
pub mod params;
pub mod pricer;
pub mod tree;

pub use output::{
    european_parity_gap, price_lattice, put_call_parity_gap, LatticeInput, LatticeOutput,
    NodeRecord,
};
pub use params::{
    ArbitragePolicy, ArbitrageWarning, DerivedConstants, ExerciseStyle, ModelParameters, MAX_STEPS,
};
pub use pricer::{
    create_pricer, ExerciseDecision, LatticePricer, LatticeValuation, OptionKind, PayoffValuation,
};
pub use tree::Triangular;
