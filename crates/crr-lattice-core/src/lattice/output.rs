use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::params::{ArbitragePolicy, DerivedConstants, ExerciseStyle, ModelParameters};
use super::pricer::{ExerciseDecision, LatticePricer, LatticeValuation, OptionKind};
use crate::error::LatticeError;
use crate::math::exp_decimal;
use crate::types::*;
use crate::LatticeResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeInput {
    #[serde(flatten)]
    pub parameters: ModelParameters,
    #[serde(default)]
    pub arbitrage_policy: ArbitragePolicy,
}

/// One lattice node with both payoffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub step: usize,
    pub up_count: usize,
    pub spot: Money,
    pub put_value: Money,
    pub put_decision: ExerciseDecision,
    pub call_value: Money,
    pub call_decision: ExerciseDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeOutput {
    pub put_value: Money,
    pub call_value: Money,
    pub constants: DerivedConstants,
    pub put_early_exercise_nodes: usize,
    pub call_early_exercise_nodes: usize,
    /// (C − P) − (S0·e^(−qT) − K·e^(−rT)); European only
    pub put_call_parity_gap: Option<Money>,
    pub put_exercise_boundary: Vec<Option<Money>>,
    pub call_exercise_boundary: Vec<Option<Money>>,
    pub nodes: Vec<NodeRecord>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Flatten the three lattices into records, step then up-count order.
pub fn node_records(valuation: &LatticeValuation) -> Vec<NodeRecord> {
    let put_values = valuation.put_values();
    let call_values = valuation.call_values();
    let put_flags = valuation.put_exercise_flags();
    let call_flags = valuation.call_exercise_flags();

    valuation
        .lattice()
        .iter()
        .map(|((step, up_count), spot)| NodeRecord {
            step,
            up_count,
            spot: *spot,
            put_value: put_values[(step, up_count)],
            put_decision: put_flags[(step, up_count)],
            call_value: call_values[(step, up_count)],
            call_decision: call_flags[(step, up_count)],
        })
        .collect()
}

/// Deviation of the root values from European put-call parity.
pub fn put_call_parity_gap(
    params: &ModelParameters,
    valuation: &LatticeValuation,
) -> LatticeResult<Money> {
    let forward_spot = discounted(params.spot, params.dividend_yield, params.time_to_maturity)
        .ok_or_else(|| LatticeError::overflow("S·e^(−qT)"))?;
    let pv_strike = discounted(params.strike, params.interest_rate, params.time_to_maturity)
        .ok_or_else(|| LatticeError::overflow("K·e^(−rT)"))?;
    let call = valuation.payoff(OptionKind::Call).root_value();
    let put = valuation.payoff(OptionKind::Put).root_value();
    forward_spot
        .checked_sub(pv_strike)
        .and_then(|carry| (call - put).checked_sub(carry))
        .ok_or_else(|| LatticeError::overflow("put-call parity gap"))
}

/// Parity gap for European runs; None for American, where early exercise
/// breaks the parity identity.
pub fn european_parity_gap(
    params: &ModelParameters,
    valuation: &LatticeValuation,
) -> LatticeResult<Option<Money>> {
    match params.style {
        ExerciseStyle::European => put_call_parity_gap(params, valuation).map(Some),
        ExerciseStyle::American => Ok(None),
    }
}

/// amount·e^(−rate·t); None on overflow, including inside exp.
fn discounted(amount: Money, rate: Rate, t: Years) -> Option<Money> {
    let factor = exp_decimal(-rate.checked_mul(t)?).ok()?;
    amount.checked_mul(factor)
}

// ---------------------------------------------------------------------------
// Public API: price_lattice
// ---------------------------------------------------------------------------

pub fn price_lattice(input: &LatticeInput) -> LatticeResult<ComputationOutput<LatticeOutput>> {
    let start = Instant::now();
    let params = &input.parameters;

    let pricer = LatticePricer::with_policy(params.clone(), input.arbitrage_policy)?;
    let valuation = pricer.run()?;

    let parity_gap = european_parity_gap(params, &valuation)?;

    let put = valuation.payoff(OptionKind::Put);
    let call = valuation.payoff(OptionKind::Call);
    let lattice_nodes = valuation.lattice().node_count();

    let output = LatticeOutput {
        put_value: put.root_value(),
        call_value: call.root_value(),
        constants: pricer.constants().clone(),
        put_early_exercise_nodes: put.early_exercise_count(),
        call_early_exercise_nodes: call.early_exercise_count(),
        put_call_parity_gap: parity_gap,
        put_exercise_boundary: valuation.exercise_boundary(OptionKind::Put),
        call_exercise_boundary: valuation.exercise_boundary(OptionKind::Call),
        nodes: node_records(&valuation),
    };

    let methodology = match params.style {
        ExerciseStyle::European => "CRR Binomial Lattice (European)",
        ExerciseStyle::American => "CRR Binomial Lattice with early exercise",
    };

    let warnings = pricer.warnings().iter().map(|w| w.to_string()).collect();
    let assumptions = serde_json::json!({
        "model": "Cox-Ross-Rubinstein",
        "steps": params.steps,
        "time_to_maturity": params.time_to_maturity.to_string(),
        "risk_free_rate": params.interest_rate.to_string(),
        "volatility": params.volatility.to_string(),
        "dividend_yield": params.dividend_yield.to_string(),
        "exercise_style": params.style,
        "arbitrage_policy": input.arbitrage_policy,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &assumptions,
        warnings,
        elapsed,
        lattice_nodes,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn input(style: ExerciseStyle) -> LatticeInput {
        LatticeInput {
            parameters: ModelParameters {
                steps: 4,
                time_to_maturity: dec!(2),
                strike: dec!(90),
                spot: dec!(100),
                volatility: dec!(0.2),
                interest_rate: dec!(0.05),
                dividend_yield: dec!(0),
                style,
            },
            arbitrage_policy: ArbitragePolicy::Warn,
        }
    }

    #[test]
    fn test_price_lattice_envelope() {
        let out = price_lattice(&input(ExerciseStyle::European)).unwrap();
        assert_eq!(out.metadata.lattice_nodes, 15);
        assert_eq!(out.result.nodes.len(), 15);
        assert!(out.warnings.is_empty());
        assert_eq!(out.methodology, "CRR Binomial Lattice (European)");
        // Four-step reference: put 3.7945, call 22.3591
        assert!((out.result.put_value - dec!(3.7944800079714165)).abs() < dec!(0.00000001));
        assert!((out.result.call_value - dec!(22.359112384735063)).abs() < dec!(0.00000001));
        let gap = out.result.put_call_parity_gap.unwrap();
        assert!(gap.abs() < dec!(0.000000000001));
        assert_eq!(out.result.put_exercise_boundary.len(), 5);
    }

    #[test]
    fn test_parity_gap_overflow_is_an_error() {
        let base = input(ExerciseStyle::European);
        let valuation = LatticePricer::new(base.parameters.clone())
            .unwrap()
            .run()
            .unwrap();
        // e^(−qT) = e^2000 leaves the Decimal range
        let mut params = base.parameters;
        params.dividend_yield = dec!(-1000);
        let err = put_call_parity_gap(&params, &valuation).unwrap_err();
        assert!(matches!(err, LatticeError::NumericalOverflow { .. }));
    }

    #[test]
    fn test_discounted_reports_overflow_as_none() {
        assert_eq!(discounted(dec!(100), dec!(0), dec!(5)), Some(dec!(100)));
        assert!(discounted(dec!(100), dec!(-1000), dec!(2)).is_none());
        assert!(discounted(dec!(100), dec!(10000000000000000000), dec!(10000000000000000000)).is_none());
    }

    #[test]
    fn test_european_parity_gap_follows_style() {
        for style in [ExerciseStyle::European, ExerciseStyle::American] {
            let params = input(style).parameters;
            let valuation = LatticePricer::new(params.clone()).unwrap().run().unwrap();
            let gap = european_parity_gap(&params, &valuation).unwrap();
            match style {
                ExerciseStyle::European => assert!(gap.unwrap().abs() < dec!(0.000000000001)),
                ExerciseStyle::American => assert!(gap.is_none()),
            }
        }
    }

    #[test]
    fn test_american_has_no_parity_gap() {
        let out = price_lattice(&input(ExerciseStyle::American)).unwrap();
        assert!(out.result.put_call_parity_gap.is_none());
        assert_eq!(out.methodology, "CRR Binomial Lattice with early exercise");
    }

    #[test]
    fn test_node_records_order_and_root() {
        let out = price_lattice(&input(ExerciseStyle::European)).unwrap();
        let first = &out.result.nodes[0];
        assert_eq!((first.step, first.up_count), (0, 0));
        assert_eq!(first.spot, dec!(100));
        assert_eq!(first.put_value, out.result.put_value);
        let last = out.result.nodes.last().unwrap();
        assert_eq!((last.step, last.up_count), (4, 4));
        assert_eq!(last.put_value, Decimal::ZERO);
        assert_eq!(last.call_decision, ExerciseDecision::Exercise);
    }

    #[test]
    fn test_arbitrage_warning_reaches_envelope() {
        let mut i = input(ExerciseStyle::European);
        i.parameters.volatility = dec!(0.01);
        i.parameters.interest_rate = dec!(0.5);
        let out = price_lattice(&i).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("risk-neutral probability"));

        i.arbitrage_policy = ArbitragePolicy::Reject;
        let err = price_lattice(&i).unwrap_err();
        assert!(matches!(err, LatticeError::Arbitrage { .. }));
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let json = serde_json::json!({
            "steps": 4,
            "time_to_maturity": "2",
            "strike": "90",
            "spot": "100",
            "volatility": "0.2",
            "interest_rate": "0.05",
            "style": "european"
        });
        let parsed: LatticeInput = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.parameters.dividend_yield, Decimal::ZERO);
        assert_eq!(parsed.arbitrage_policy, ArbitragePolicy::Warn);
        assert_eq!(parsed.parameters, input(ExerciseStyle::European).parameters);
    }

    #[test]
    fn test_output_serializes_decisions_lowercase() {
        let out = price_lattice(&input(ExerciseStyle::American)).unwrap();
        let value = serde_json::to_value(&out).unwrap();
        let decision = &value["result"]["nodes"][0]["put_decision"];
        assert!(decision == "hold" || decision == "exercise");
    }
}
