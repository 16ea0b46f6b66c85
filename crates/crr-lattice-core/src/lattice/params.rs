use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LatticeError;
use crate::math::{exp_decimal, sqrt_decimal};
use crate::types::{Money, Rate, Years};
use crate::LatticeResult;

/// Largest supported step count. Storage is the full triangle for three
/// lattices, so this bounds a run at a few tens of millions of nodes.
pub const MAX_STEPS: u32 = 5_000;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Lowercase on the wire; the capitalised names are still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStyle {
    #[serde(alias = "European")]
    European,
    #[serde(alias = "American")]
    American,
}

/// What to do when the risk-neutral probability falls outside [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArbitragePolicy {
    #[default]
    Warn,
    Reject,
}

/// The eight contract and market inputs of a pricing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub steps: u32,
    pub time_to_maturity: Years,
    pub strike: Money,
    pub spot: Money,
    pub volatility: Rate,
    pub interest_rate: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
    pub style: ExerciseStyle,
}

/// Per-step constants derived once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedConstants {
    /// Δt = T / N
    pub delta_t: Years,
    /// u = exp(σ·√Δt)
    pub up: Decimal,
    /// d = 1 / u
    pub down: Decimal,
    /// p = (exp((r−q)·Δt) − d) / (u − d)
    pub probability: Decimal,
    /// exp(−r·Δt)
    pub discount: Decimal,
}

/// Risk-neutral probability outside [0, 1]: the model admits arbitrage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageWarning {
    pub probability: Decimal,
}

impl fmt::Display for ArbitrageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "risk-neutral probability {} lies outside [0, 1]; lattice values are not arbitrage-free",
            self.probability.round_dp(8)
        )
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl ModelParameters {
    pub fn validate(&self) -> LatticeResult<()> {
        if self.steps < 1 {
            return Err(LatticeError::invalid("steps", "must be at least 1"));
        }
        if self.steps > MAX_STEPS {
            return Err(LatticeError::invalid(
                "steps",
                &format!("must not exceed {MAX_STEPS}"),
            ));
        }
        if self.time_to_maturity <= Decimal::ZERO {
            return Err(LatticeError::invalid("time_to_maturity", "must be positive"));
        }
        if self.strike <= Decimal::ZERO {
            return Err(LatticeError::invalid("strike", "must be positive"));
        }
        if self.spot <= Decimal::ZERO {
            return Err(LatticeError::invalid("spot", "must be positive"));
        }
        if self.volatility < Decimal::ZERO {
            return Err(LatticeError::invalid("volatility", "must be non-negative"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Derived constants
// ---------------------------------------------------------------------------

impl DerivedConstants {
    /// Derive Δt, u, d, p and the one-step discount factor.
    ///
    /// Expects validated parameters. Fails with `DegenerateModel` when the up
    /// and down factors coincide, which happens at zero volatility.
    pub fn derive(params: &ModelParameters) -> LatticeResult<Self> {
        let delta_t = params.time_to_maturity / Decimal::from(params.steps);
        let vol_step = params
            .volatility
            .checked_mul(sqrt_decimal(delta_t))
            .ok_or_else(|| LatticeError::overflow("σ·√Δt"))?;
        let up = exp_decimal(vol_step)?;
        let down = Decimal::ONE / up;

        let spread = up - down;
        if spread.is_zero() {
            return Err(LatticeError::DegenerateModel(format!(
                "up and down factors coincide (u = d = {up}); volatility {} gives no price movement",
                params.volatility
            )));
        }

        let drift = params
            .interest_rate
            .checked_sub(params.dividend_yield)
            .and_then(|carry| carry.checked_mul(delta_t))
            .ok_or_else(|| LatticeError::overflow("(r − q)·Δt"))?;
        let growth = exp_decimal(drift)?;
        let probability = growth
            .checked_sub(down)
            .and_then(|excess| excess.checked_div(spread))
            .ok_or_else(|| LatticeError::overflow("risk-neutral probability"))?;
        let rate_step = params
            .interest_rate
            .checked_mul(delta_t)
            .ok_or_else(|| LatticeError::overflow("r·Δt"))?;
        let discount = exp_decimal(-rate_step)?;

        Ok(DerivedConstants {
            delta_t,
            up,
            down,
            probability,
            discount,
        })
    }

    /// Some(warning) when p is outside [0, 1].
    pub fn arbitrage_check(&self) -> Option<ArbitrageWarning> {
        if self.probability < Decimal::ZERO || self.probability > Decimal::ONE {
            Some(ArbitrageWarning {
                probability: self.probability,
            })
        } else {
            None
        }
    }
}
