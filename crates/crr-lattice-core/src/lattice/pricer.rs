use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::params::{
    ArbitragePolicy, ArbitrageWarning, DerivedConstants, ExerciseStyle, ModelParameters,
};
use super::tree::Triangular;
use crate::error::LatticeError;
use crate::types::{Money, Rate, Years};
use crate::LatticeResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Put,
    Call,
}

impl OptionKind {
    /// Unfloored payoff of immediate exercise: K − S for a put, S − K for a call.
    pub fn payoff(self, spot: Money, strike: Money) -> Money {
        match self {
            OptionKind::Put => strike - spot,
            OptionKind::Call => spot - strike,
        }
    }
}

/// Whether exercising at a node beats holding for one more step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseDecision {
    Exercise,
    Hold,
}

/// Value and exercise-flag lattices for one payoff.
#[derive(Debug, Clone, Serialize)]
pub struct PayoffValuation {
    kind: OptionKind,
    values: Triangular<Money>,
    decisions: Triangular<ExerciseDecision>,
}

impl PayoffValuation {
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn values(&self) -> &Triangular<Money> {
        &self.values
    }

    pub fn decisions(&self) -> &Triangular<ExerciseDecision> {
        &self.decisions
    }

    /// Option value at inception, V[0,0].
    pub fn root_value(&self) -> Money {
        self.values[(0, 0)]
    }

    /// Nodes before maturity flagged for exercise.
    pub fn early_exercise_count(&self) -> usize {
        let maturity = self.decisions.steps();
        self.decisions
            .iter()
            .filter(|((i, _), d)| *i < maturity && **d == ExerciseDecision::Exercise)
            .count()
    }
}

/// Everything one pricing run produces. Owns its storage.
#[derive(Debug, Clone, Serialize)]
pub struct LatticeValuation {
    style: ExerciseStyle,
    strike: Money,
    spots: Triangular<Money>,
    put: PayoffValuation,
    call: PayoffValuation,
}

impl LatticeValuation {
    pub fn style(&self) -> ExerciseStyle {
        self.style
    }

    /// Spot price S[i,j] at every node.
    pub fn lattice(&self) -> &Triangular<Money> {
        &self.spots
    }

    pub fn put_values(&self) -> &Triangular<Money> {
        self.put.values()
    }

    pub fn call_values(&self) -> &Triangular<Money> {
        self.call.values()
    }

    pub fn put_exercise_flags(&self) -> &Triangular<ExerciseDecision> {
        self.put.decisions()
    }

    pub fn call_exercise_flags(&self) -> &Triangular<ExerciseDecision> {
        self.call.decisions()
    }

    pub fn payoff(&self, kind: OptionKind) -> &PayoffValuation {
        match kind {
            OptionKind::Put => &self.put,
            OptionKind::Call => &self.call,
        }
    }

    /// Early-exercise boundary, one entry per step.
    ///
    /// Among nodes flagged `Exercise` with positive intrinsic value, the spot
    /// closest to the strike: the highest for a put, the lowest for a call.
    /// `None` where no such node exists at that step.
    pub fn exercise_boundary(&self, kind: OptionKind) -> Vec<Option<Money>> {
        let decisions = self.payoff(kind).decisions();
        (0..=self.spots.steps())
            .map(|i| {
                let exercised = (0..=i).filter_map(|j| {
                    let spot = self.spots[(i, j)];
                    let in_the_money = kind.payoff(spot, self.strike) > Decimal::ZERO;
                    (decisions[(i, j)] == ExerciseDecision::Exercise && in_the_money)
                        .then_some(spot)
                });
                match kind {
                    OptionKind::Put => exercised.max(),
                    OptionKind::Call => exercised.min(),
                }
            })
            .collect()
    }

    /// `(step, up_count): value` lines for the put lattice, maturity first.
    pub fn put_value_listing(&self) -> Vec<String> {
        let values = self.put_values();
        (0..=values.steps())
            .rev()
            .flat_map(|i| (0..=i).map(move |j| format!("({i}, {j}): {}", values[(i, j)])))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Pricer
// ---------------------------------------------------------------------------

/// Cox-Ross-Rubinstein lattice pricer.
///
/// Construction validates the parameters and derives the per-step
/// constants; `run` builds and values a fresh lattice on every call.
#[derive(Debug, Clone)]
pub struct LatticePricer {
    params: ModelParameters,
    constants: DerivedConstants,
    warnings: Vec<ArbitrageWarning>,
}

impl LatticePricer {
    pub fn new(params: ModelParameters) -> LatticeResult<Self> {
        Self::with_policy(params, ArbitragePolicy::default())
    }

    pub fn with_policy(params: ModelParameters, policy: ArbitragePolicy) -> LatticeResult<Self> {
        params.validate()?;
        let constants = DerivedConstants::derive(&params)?;

        debug!(
            steps = params.steps,
            delta_t = %constants.delta_t,
            up = %constants.up,
            down = %constants.down,
            probability = %constants.probability,
            "derived lattice constants"
        );

        let mut warnings = Vec::new();
        if let Some(warning) = constants.arbitrage_check() {
            match policy {
                ArbitragePolicy::Reject => {
                    return Err(LatticeError::Arbitrage {
                        probability: warning.probability,
                    });
                }
                ArbitragePolicy::Warn => {
                    warn!(probability = %warning.probability, "{warning}");
                    warnings.push(warning);
                }
            }
        }

        Ok(LatticePricer {
            params,
            constants,
            warnings,
        })
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.params
    }

    pub fn constants(&self) -> &DerivedConstants {
        &self.constants
    }

    pub fn warnings(&self) -> &[ArbitrageWarning] {
        &self.warnings
    }

    /// Build the price lattice once and value it for both payoffs.
    pub fn run(&self) -> LatticeResult<LatticeValuation> {
        let spots = build_price_lattice(
            self.params.spot,
            self.params.steps as usize,
            &self.constants,
        )?;
        let put = backward_induction(&spots, &self.params, &self.constants, OptionKind::Put)?;
        let call = backward_induction(&spots, &self.params, &self.constants, OptionKind::Call)?;

        debug!(
            nodes = spots.node_count(),
            put = %put.root_value(),
            call = %call.root_value(),
            "lattice valued"
        );

        Ok(LatticeValuation {
            style: self.params.style,
            strike: self.params.strike,
            spots,
            put,
            call,
        })
    }
}

/// Positional constructor over the eight model parameters.
#[allow(clippy::too_many_arguments)]
pub fn create_pricer(
    steps: u32,
    time_to_maturity: Years,
    strike: Money,
    spot: Money,
    volatility: Rate,
    interest_rate: Rate,
    dividend_yield: Rate,
    style: ExerciseStyle,
) -> LatticeResult<LatticePricer> {
    LatticePricer::new(ModelParameters {
        steps,
        time_to_maturity,
        strike,
        spot,
        volatility,
        interest_rate,
        dividend_yield,
        style,
    })
}

// ---------------------------------------------------------------------------
// Lattice internals
// ---------------------------------------------------------------------------

/// S[0,0] = S0; S[i,0] = S[i−1,0]·d; S[i,j] = S[i−1,j−1]·u for j ≥ 1.
fn build_price_lattice(
    spot: Money,
    steps: usize,
    constants: &DerivedConstants,
) -> LatticeResult<Triangular<Money>> {
    let mut lattice = Triangular::with_steps(steps);
    lattice.push_row(vec![spot]);

    for i in 1..=steps {
        let mut row = Vec::with_capacity(i + 1);
        for j in 0..=i {
            let price = if j == 0 {
                lattice[(i - 1, 0)].checked_mul(constants.down)
            } else {
                lattice[(i - 1, j - 1)].checked_mul(constants.up)
            };
            let price = price
                .ok_or_else(|| LatticeError::overflow(&format!("spot at node ({i}, {j})")))?;
            row.push(price);
        }
        lattice.push_row(row);
    }

    Ok(lattice)
}

/// exp(−r·Δt)·(p·V_up + (1−p)·V_down)
fn continuation_value(
    constants: &DerivedConstants,
    value_up: Money,
    value_down: Money,
) -> Option<Money> {
    let p = constants.probability;
    let expected = p
        .checked_mul(value_up)?
        .checked_add(Decimal::ONE.checked_sub(p)?.checked_mul(value_down)?)?;
    constants.discount.checked_mul(expected)
}

/// Value one payoff from maturity back to inception.
fn backward_induction(
    spots: &Triangular<Money>,
    params: &ModelParameters,
    constants: &DerivedConstants,
    kind: OptionKind,
) -> LatticeResult<PayoffValuation> {
    let steps = spots.steps();
    let mut value_rows: Vec<Vec<Money>> = Vec::with_capacity(steps + 1);
    let mut decision_rows: Vec<Vec<ExerciseDecision>> = Vec::with_capacity(steps + 1);

    for i in (0..=steps).rev() {
        let mut values = Vec::with_capacity(i + 1);
        let mut decisions = Vec::with_capacity(i + 1);

        for j in 0..=i {
            let intrinsic = kind.payoff(spots[(i, j)], params.strike);

            let mut value = match value_rows.last() {
                // Maturity
                None => intrinsic.max(Decimal::ZERO),
                Some(next) => continuation_value(constants, next[j + 1], next[j])
                    .ok_or_else(|| {
                        LatticeError::overflow(&format!("{kind:?} value at node ({i}, {j})"))
                    })?
                    .max(Decimal::ZERO),
            };

            let decision = if value > intrinsic {
                ExerciseDecision::Hold
            } else {
                ExerciseDecision::Exercise
            };

            if params.style == ExerciseStyle::American {
                value = value.max(intrinsic).max(Decimal::ZERO);
            }

            values.push(value);
            decisions.push(decision);
        }

        value_rows.push(values);
        decision_rows.push(decisions);
    }

    Ok(PayoffValuation {
        kind,
        values: Triangular::from_reversed_rows(value_rows),
        decisions: Triangular::from_reversed_rows(decision_rows),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
