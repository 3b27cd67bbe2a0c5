//! Moneta CLI
//!
//! Sums money terms in mixed currencies and reduces them through an
//! exchange-rate bank.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moneta_common::Currency;
use moneta_fx::{Bank, BankConfig};

mod scenario;

use scenario::{build_expression, Scenario};

/// Moneta CLI
#[derive(Parser, Debug)]
#[command(name = "moneta")]
#[command(about = "Reduce multi-currency money expressions")]
struct Args {
    /// Rate sheet JSON file (defaults to $MONETA_RATE_SHEET)
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Extra rate as FROM:TO:RATE, e.g. CHF:USD:2 (repeatable)
    #[arg(long = "rate", value_parser = parse_rate_spec)]
    extra_rates: Vec<RateSpec>,

    /// Target currency
    #[arg(long, default_value = "USD")]
    to: String,

    /// Multiply the whole expression before reducing
    #[arg(long)]
    times: Option<i64>,

    /// Built-in scenario name or scenario JSON file
    #[arg(short, long)]
    scenario: Option<String>,

    /// Terms to add, e.g. "5:USD" "10:CHF"
    terms: Vec<String>,
}

/// A rate given on the command line.
#[derive(Debug, Clone, PartialEq)]
struct RateSpec {
    from: Currency,
    to: Currency,
    rate: Decimal,
}

fn parse_rate_spec(s: &str) -> Result<RateSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [from, to, rate] = parts.as_slice() else {
        return Err(format!("expected FROM:TO:RATE, got {:?}", s));
    };

    Ok(RateSpec {
        from: Currency::parse(from).map_err(|e| e.to_string())?,
        to: Currency::parse(to).map_err(|e| e.to_string())?,
        rate: rate
            .parse()
            .map_err(|e| format!("invalid rate {:?}: {}", rate, e))?,
    })
}

fn init_logging(config: &BankConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_bank(config: &BankConfig, extra_rates: &[RateSpec]) -> anyhow::Result<Bank> {
    let bank = config.build_bank().context("loading rates")?;

    for spec in extra_rates {
        bank.add_rate(spec.from.clone(), spec.to.clone(), spec.rate)
            .with_context(|| format!("registering {}/{}", spec.from, spec.to))?;
    }

    Ok(bank)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = BankConfig::from_env();
    if let Some(path) = &args.rates {
        config.rate_sheet_path = Some(path.clone());
    }
    if let Err(e) = config.validate() {
        bail!("Configuration error: {}", e);
    }

    init_logging(&config);

    let bank = build_bank(&config, &args.extra_rates)?;
    info!(rates = bank.len(), "Bank ready");

    if let Some(name) = &args.scenario {
        let scenario = Scenario::load(name)?;
        info!(scenario = %scenario.name, "{}", scenario.description);

        let outcomes = scenario.run(&bank)?;
        for outcome in outcomes {
            match outcome.result {
                Ok(total) => println!("{} = {}", outcome.expression, total),
                Err(e) => println!("{} ! {} ({})", outcome.expression, e, e.error_code()),
            }
        }
        return Ok(());
    }

    if args.terms.is_empty() {
        bail!("nothing to reduce: pass terms such as 5:USD 10:CHF, or --scenario");
    }

    let target = Currency::parse(&args.to)?;
    let mut expression = build_expression(&args.terms)?;
    if let Some(k) = args.times {
        expression = expression.times(k)?;
    }

    let frozen = bank.freeze();
    match frozen.reduce(&expression, &target) {
        Ok(total) => {
            println!("{}", total);
            Ok(())
        }
        Err(e) => {
            error!(code = e.error_code(), "Reduction failed");
            Err(e.into())
        }
    }
}
