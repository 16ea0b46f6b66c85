use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use crr_lattice_core::lattice::{self, LatticeInput, LatticePricer};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_input(input_json: &str) -> NapiResult<LatticeInput> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lattice pricing
// ---------------------------------------------------------------------------

/// Full pricing envelope (root values, constants, boundary, every node) as JSON.
#[napi]
pub fn price_lattice(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let output = lattice::price_lattice(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// (C − P) − (S0·e^(−qT) − K·e^(−rT)) for the root of the lattice, as a
/// decimal string. `null` for American style, matching `priceLattice`.
#[napi]
pub fn put_call_parity_gap(input_json: String) -> NapiResult<Option<String>> {
    let input = parse_input(&input_json)?;
    let pricer = LatticePricer::with_policy(input.parameters.clone(), input.arbitrage_policy)
        .map_err(to_napi_error)?;
    let valuation = pricer.run().map_err(to_napi_error)?;
    let gap: Option<Decimal> =
        lattice::european_parity_gap(&input.parameters, &valuation).map_err(to_napi_error)?;
    Ok(gap.map(|g| g.to_string()))
}

/// `(step, up_count): value` lines for the put lattice.
#[napi]
pub fn put_value_listing(input_json: String) -> NapiResult<Vec<String>> {
    let input = parse_input(&input_json)?;
    let pricer = LatticePricer::with_policy(input.parameters, input.arbitrage_policy)
        .map_err(to_napi_error)?;
    Ok(pricer.run().map_err(to_napi_error)?.put_value_listing())
}
