use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use crr_lattice_core::lattice::{
    self, ArbitragePolicy, ExerciseStyle, LatticeInput, LatticePricer, ModelParameters,
};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StyleArg {
    European,
    American,
}

impl From<StyleArg> for ExerciseStyle {
    fn from(s: StyleArg) -> Self {
        match s {
            StyleArg::European => ExerciseStyle::European,
            StyleArg::American => ExerciseStyle::American,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Warn,
    Reject,
}

impl From<PolicyArg> for ArbitragePolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Warn => ArbitragePolicy::Warn,
            PolicyArg::Reject => ArbitragePolicy::Reject,
        }
    }
}

/// Arguments for lattice pricing
#[derive(Args, Debug)]
#[command(allow_hyphen_values = true)]
pub struct PriceArgs {
    /// Number of lattice steps N
    #[arg(long)]
    pub steps: Option<u32>,

    /// Time to maturity in years
    #[arg(long, alias = "time-to-maturity")]
    pub maturity: Option<Decimal>,

    /// Strike price
    #[arg(long)]
    pub strike: Option<Decimal>,

    /// Current spot price of the underlying
    #[arg(long)]
    pub spot: Option<Decimal>,

    /// Annualised volatility (e.g. 0.2 for 20%)
    #[arg(long, alias = "vol")]
    pub volatility: Option<Decimal>,

    /// Continuously compounded risk-free rate
    #[arg(long, alias = "interest-rate")]
    pub rate: Option<Decimal>,

    /// Continuous dividend yield
    #[arg(long, default_value = "0")]
    pub dividend_yield: Decimal,

    /// Exercise style
    #[arg(long, value_enum, default_value = "european")]
    pub style: StyleArg,

    /// Risk-neutral probability outside [0, 1]: warn and continue, or reject
    #[arg(long, value_enum, default_value = "warn")]
    pub arbitrage_policy: PolicyArg,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// File input first, then piped stdin, then individual flags.
pub fn resolve_input(args: PriceArgs) -> Result<LatticeInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    input_from_flags(args)
}

fn input_from_flags(args: PriceArgs) -> Result<LatticeInput, Box<dyn std::error::Error>> {
    Ok(LatticeInput {
        parameters: ModelParameters {
            steps: args.steps.ok_or("--steps is required (or provide --input)")?,
            time_to_maturity: args
                .maturity
                .ok_or("--maturity is required (or provide --input)")?,
            strike: args.strike.ok_or("--strike is required (or provide --input)")?,
            spot: args.spot.ok_or("--spot is required (or provide --input)")?,
            volatility: args
                .volatility
                .ok_or("--volatility is required (or provide --input)")?,
            interest_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            dividend_yield: args.dividend_yield,
            style: args.style.into(),
        },
        arbitrage_policy: args.arbitrage_policy.into(),
    })
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lattice_input = resolve_input(args)?;
    let result = lattice::price_lattice(&lattice_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_put_values(args: PriceArgs) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let lattice_input = resolve_input(args)?;
    let pricer =
        LatticePricer::with_policy(lattice_input.parameters, lattice_input.arbitrage_policy)?;
    Ok(pricer.run()?.put_value_listing())
}
