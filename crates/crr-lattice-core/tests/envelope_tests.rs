use crr_lattice_core::lattice::{
    price_lattice, ArbitragePolicy, ExerciseDecision, ExerciseStyle, LatticeInput,
    ModelParameters, NodeRecord,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const YAML_INPUT: &str = r#"
steps: 4
time_to_maturity: "2"
strike: "90"
spot: "100"
volatility: "0.2"
interest_rate: "0.05"
dividend_yield: "0"
style: european
arbitrage_policy: reject
"#;

#[test]
fn test_yaml_input_parses_into_parameters() {
    let input: LatticeInput = serde_yaml::from_str(YAML_INPUT).unwrap();
    assert_eq!(
        input.parameters,
        ModelParameters {
            steps: 4,
            time_to_maturity: dec!(2),
            strike: dec!(90),
            spot: dec!(100),
            volatility: dec!(0.2),
            interest_rate: dec!(0.05),
            dividend_yield: Decimal::ZERO,
            style: ExerciseStyle::European,
        }
    );
    assert_eq!(input.arbitrage_policy, ArbitragePolicy::Reject);
}

#[test]
fn test_json_numbers_accepted() {
    let input: LatticeInput = serde_json::from_str(
        r#"{"steps": 2, "time_to_maturity": 1, "strike": 100, "spot": 100,
            "volatility": 0.3, "interest_rate": 0.02, "style": "American"}"#,
    )
    .unwrap();
    assert_eq!(input.parameters.volatility, dec!(0.3));
    assert_eq!(input.parameters.style, ExerciseStyle::American);
}

#[test]
fn test_envelope_nodes_for_small_tree() {
    let input: LatticeInput = serde_yaml::from_str(YAML_INPUT).unwrap();
    let out = price_lattice(&input).unwrap();
    let nodes = &out.result.nodes;

    let steps: Vec<(usize, usize)> = nodes.iter().map(|n| (n.step, n.up_count)).collect();
    assert_eq!(
        steps,
        vec![
            (0, 0),
            (1, 0),
            (1, 1),
            (2, 0),
            (2, 1),
            (2, 2),
            (3, 0),
            (3, 1),
            (3, 2),
            (3, 3),
            (4, 0),
            (4, 1),
            (4, 2),
            (4, 3),
            (4, 4),
        ]
    );

    // Top terminal node: deep in the money for the call, worthless put
    let top: &NodeRecord = nodes.last().unwrap();
    assert_eq!(top.put_value, Decimal::ZERO);
    assert_eq!(top.put_decision, ExerciseDecision::Hold);
    assert_eq!(top.call_value, top.spot - dec!(90));
    assert_eq!(top.call_decision, ExerciseDecision::Exercise);
}

#[test]
fn test_envelope_metadata_and_assumptions() {
    let input: LatticeInput = serde_yaml::from_str(YAML_INPUT).unwrap();
    let out = price_lattice(&input).unwrap();
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert_eq!(out.metadata.lattice_nodes, 15);
    assert_eq!(out.assumptions["steps"], 4);
    assert_eq!(out.assumptions["exercise_style"], "european");
    assert_eq!(out.assumptions["arbitrage_policy"], "reject");

    let json = serde_json::to_value(&out).unwrap();
    // Decimals serialise as strings
    assert!(json["result"]["put_value"].is_string());
    assert!(json["result"]["constants"]["probability"].is_string());
}
