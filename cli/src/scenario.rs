//! Scripted evaluation scenarios.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use moneta_common::{Currency, Expression, MonetaryError, Money};
use moneta_fx::Bank;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// An evaluation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Register a rate with the bank.
    AddRate {
        from: String,
        to: String,
        rate: Decimal,
    },
    /// Sum the terms, reduce to `target` and check the outcome.
    Reduce {
        terms: Vec<String>,
        target: String,
        expect: Expectation,
    },
}

/// Expected outcome of a reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expectation {
    /// Reduction succeeds with this amount, e.g. `"10 USD"`.
    Amount(String),
    /// Reduction fails for lack of a rate for this pair.
    RateNotFound { from: String, to: String },
}

/// Result of running one reduction step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Rendered expression terms.
    pub expression: String,
    /// What the reduction produced.
    pub result: Result<Money, MonetaryError>,
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario file by path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "franc-dollar" => Ok(Self::franc_dollar()),
            "missing-rate" => Ok(Self::missing_rate()),
            path if Path::new(path).is_file() => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("reading scenario {}", path))?;
                serde_json::from_str(&contents).with_context(|| format!("parsing scenario {}", path))
            }
            _ => Err(anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Names of the built-in scenarios.
    pub fn builtin_names() -> &'static [&'static str] {
        &["franc-dollar", "missing-rate"]
    }

    /// Five dollars plus ten francs at two francs to the dollar.
    fn franc_dollar() -> Self {
        Self {
            name: "franc-dollar".to_string(),
            description: "Mixed USD and CHF addition reduced to USD".to_string(),
            steps: vec![
                ScenarioStep::AddRate {
                    from: "CHF".to_string(),
                    to: "USD".to_string(),
                    rate: Decimal::TWO,
                },
                ScenarioStep::Reduce {
                    terms: vec!["10 CHF".to_string()],
                    target: "USD".to_string(),
                    expect: Expectation::Amount("5 USD".to_string()),
                },
                ScenarioStep::Reduce {
                    terms: vec!["5 USD".to_string(), "10 CHF".to_string()],
                    target: "USD".to_string(),
                    expect: Expectation::Amount("10 USD".to_string()),
                },
                ScenarioStep::Reduce {
                    terms: vec!["5 USD".to_string(), "10 CHF".to_string(), "5 USD".to_string()],
                    target: "USD".to_string(),
                    expect: Expectation::Amount("15 USD".to_string()),
                },
            ],
        }
    }

    /// Conversions that have no registered rate, including the inverse pair.
    fn missing_rate() -> Self {
        Self {
            name: "missing-rate".to_string(),
            description: "Reductions that fail for lack of a rate".to_string(),
            steps: vec![
                ScenarioStep::AddRate {
                    from: "CHF".to_string(),
                    to: "USD".to_string(),
                    rate: Decimal::TWO,
                },
                ScenarioStep::Reduce {
                    terms: vec!["10 CHF".to_string()],
                    target: "GBP".to_string(),
                    expect: Expectation::RateNotFound {
                        from: "CHF".to_string(),
                        to: "GBP".to_string(),
                    },
                },
                ScenarioStep::Reduce {
                    terms: vec!["5 USD".to_string()],
                    target: "CHF".to_string(),
                    expect: Expectation::RateNotFound {
                        from: "USD".to_string(),
                        to: "CHF".to_string(),
                    },
                },
            ],
        }
    }

    /// Run every step against `bank`, failing on the first unmet expectation.
    pub fn run(&self, bank: &Bank) -> anyhow::Result<Vec<StepOutcome>> {
        info!(scenario = %self.name, steps = self.steps.len(), "Running scenario");
        let mut outcomes = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                ScenarioStep::AddRate { from, to, rate } => {
                    bank.add_rate(Currency::parse(from)?, Currency::parse(to)?, *rate)
                        .with_context(|| format!("step {}", index + 1))?;
                }
                ScenarioStep::Reduce {
                    terms,
                    target,
                    expect,
                } => {
                    let expression = build_expression(terms)?;
                    let target = Currency::parse(target)?;
                    let result = bank.reduce(&expression, &target);
                    check(expect, &result).with_context(|| format!("step {}", index + 1))?;
                    outcomes.push(StepOutcome {
                        expression: terms.join(" + "),
                        result,
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

/// Parse terms such as `"5 USD"` and fold them into a left-nested sum.
pub fn build_expression<S: AsRef<str>>(terms: &[S]) -> anyhow::Result<Expression> {
    let mut terms = terms.iter().map(|term| {
        term.as_ref()
            .parse::<Money>()
            .with_context(|| format!("invalid term {:?}", term.as_ref()))
    });

    let first = terms.next().ok_or_else(|| anyhow!("at least one term is required"))??;
    terms.try_fold(Expression::from(first), |expr, term| Ok(expr.plus(term?)))
}

fn check(expect: &Expectation, result: &Result<Money, MonetaryError>) -> anyhow::Result<()> {
    match (expect, result) {
        (Expectation::Amount(expected), Ok(actual)) => {
            let expected: Money = expected.parse()?;
            if &expected != actual {
                bail!("expected {}, got {}", expected, actual);
            }
        }
        (Expectation::RateNotFound { from, to }, Err(MonetaryError::RateNotFound { pair })) => {
            if pair.from != Currency::parse(from)? || pair.to != Currency::parse(to)? {
                bail!("expected missing rate {}/{}, got {}", from, to, pair);
            }
        }
        (_, Ok(actual)) => bail!("expected failure, got {}", actual),
        (_, Err(err)) => bail!("unexpected error: {}", err),
    }
    Ok(())
}
