//! Exchange-rate bank: the registry of directional rates and the entry point
//! for reducing expressions.

use std::collections::HashMap;
use std::sync::Arc;

use moneta_common::{
    Currency, CurrencyPair, ExchangeRates, Expression, MonetaryError, MonetaryResult, Money, Rate,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

/// Immutable table of directional rates.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<CurrencyPair, Rate>,
}

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if no pairs are registered.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Check if an explicit rate exists for the ordered pair.
    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(pair)
    }

    /// Registered pairs in sorted order.
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        let mut pairs: Vec<CurrencyPair> = self.rates.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    fn insert(&mut self, pair: CurrencyPair, rate: Rate) -> Option<Rate> {
        self.rates.insert(pair, rate)
    }
}

impl ExchangeRates for RateTable {
    fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        if from == to {
            return Ok(Rate::ONE);
        }

        let pair = CurrencyPair::new(from, to);
        match self.rates.get(&pair) {
            Some(rate) => Ok(*rate),
            None => Err(MonetaryError::RateNotFound { pair }),
        }
    }
}

/// Registry of exchange rates.
///
/// Populate with [`Bank::add_rate`] during setup, then reduce expressions with
/// [`Bank::reduce`]. The table is published as an immutable snapshot: adding a
/// rate replaces the snapshot (copy-on-write) and never disturbs a reduction
/// already in progress. Use [`Bank::freeze`] to hand out a read-only bank once
/// setup is complete.
#[derive(Debug, Default)]
pub struct Bank {
    table: RwLock<Arc<RateTable>>,
}

impl Bank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rate for converting `from` into `to`.
    ///
    /// `rate` is the number of `from` units worth one `to` unit. Overwrites any
    /// earlier rate for the same ordered pair and returns it. The inverse pair
    /// is not touched. Identity pairs are accepted but ignored, since the
    /// identity rate is always one.
    pub fn add_rate(
        &self,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        rate: Decimal,
    ) -> MonetaryResult<Option<Rate>> {
        let pair = CurrencyPair::new(from, to);
        let rate = Rate::for_pair(&pair, rate)?;

        if pair.is_identity() {
            warn!(pair = %pair, rate = %rate, "Ignoring identity rate");
            return Ok(None);
        }

        let mut table = self.table.write();
        let previous = Arc::make_mut(&mut table).insert(pair.clone(), rate);

        match previous {
            Some(old) => debug!(pair = %pair, old = %old, new = %rate, "Overwrote rate"),
            None => info!(pair = %pair, rate = %rate, "Registered rate"),
        }

        Ok(previous)
    }

    /// Look up the rate for converting `from` into `to`.
    ///
    /// Always one for identical currencies. Lookup is directional: a rate for
    /// `CHF/USD` does not answer `USD/CHF`.
    pub fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        self.snapshot().rate(from, to)
    }

    /// Reduce an expression to a single amount in `to`.
    ///
    /// The whole reduction runs against the table as it was on entry.
    #[instrument(skip_all, fields(target = %to))]
    pub fn reduce(&self, expression: &Expression, to: &Currency) -> MonetaryResult<Money> {
        let table = self.snapshot();
        expression.reduce(table.as_ref(), to)
    }

    /// The currently published table.
    pub fn snapshot(&self) -> Arc<RateTable> {
        self.table.read().clone()
    }

    /// Publish the current table as a read-only bank.
    pub fn freeze(&self) -> FrozenBank {
        let table = self.snapshot();
        info!(rates = table.len(), "Froze rate table");
        FrozenBank { table }
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Check if no pairs are registered.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Check if an explicit rate exists for the ordered pair.
    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.table.read().contains(pair)
    }

    /// Registered pairs in sorted order.
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        self.table.read().pairs()
    }
}

impl ExchangeRates for Bank {
    fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        Bank::rate(self, from, to)
    }
}

/// A read-only bank that can be cloned and shared across threads freely.
#[derive(Debug, Clone)]
pub struct FrozenBank {
    table: Arc<RateTable>,
}

impl FrozenBank {
    /// Look up the rate for converting `from` into `to`.
    pub fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        self.table.rate(from, to)
    }

    /// Reduce an expression to a single amount in `to`.
    pub fn reduce(&self, expression: &Expression, to: &Currency) -> MonetaryResult<Money> {
        expression.reduce(self.table.as_ref(), to)
    }

    /// The underlying table.
    pub fn table(&self) -> &RateTable {
        &self.table
    }
}

impl ExchangeRates for FrozenBank {
    fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
        FrozenBank::rate(self, from, to)
    }
}
