//! Deferred arithmetic over money in mixed currencies.

use std::mem;
use std::sync::{Arc, OnceLock};

use crate::error::{MonetaryError, MonetaryResult};
use crate::monetary::{Currency, Money};
use crate::rate::ExchangeRates;

/// A monetary computation: either a concrete amount or a pending sum.
///
/// Trees are immutable once built. Subtrees are reference counted, so the
/// same expression may appear under several sums without copying.
///
/// Building, scaling, reducing, comparing, and dropping walk the tree with
/// explicit stacks and accept any depth. `Debug` output is derived and
/// recurses, so avoid `{:?}` on trees nested hundreds of thousands deep.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A concrete amount.
    Money(Money),
    /// Deferred addition of two subexpressions.
    Sum(Sum),
}

/// Deferred addition of two expressions, possibly in different currencies.
#[derive(Debug, Clone)]
pub struct Sum {
    left: Arc<Expression>,
    right: Arc<Expression>,
}

impl Sum {
    /// Create a new sum node.
    pub fn new(left: impl Into<Expression>, right: impl Into<Expression>) -> Self {
        Self {
            left: Arc::new(left.into()),
            right: Arc::new(right.into()),
        }
    }

    /// Left operand.
    pub fn left(&self) -> &Expression {
        &self.left
    }

    /// Right operand.
    pub fn right(&self) -> &Expression {
        &self.right
    }

    /// Reduce both operands to `to` and add the results.
    ///
    /// Callers normally go through `Bank::reduce` in `moneta-fx`, which pins
    /// one rate snapshot for the whole evaluation.
    pub fn reduce<R>(&self, rates: &R, to: &Currency) -> MonetaryResult<Money>
    where
        R: ExchangeRates + ?Sized,
    {
        reduce_sum(self, rates, to)
    }
}

// Placeholder swapped in for children while a sum is being torn down.
fn detached() -> Arc<Expression> {
    static DETACHED: OnceLock<Arc<Expression>> = OnceLock::new();
    DETACHED
        .get_or_init(|| Arc::new(Expression::Money(Money::zero(Currency::usd()))))
        .clone()
}

impl Drop for Sum {
    // Unlinks children iteratively so dropping a deep tree cannot exhaust the stack.
    fn drop(&mut self) {
        let mut pending = vec![
            mem::replace(&mut self.left, detached()),
            mem::replace(&mut self.right, detached()),
        ];

        while let Some(node) = pending.pop() {
            if let Ok(Expression::Sum(mut sum)) = Arc::try_unwrap(node) {
                pending.push(mem::replace(&mut sum.left, detached()));
                pending.push(mem::replace(&mut sum.right, detached()));
            }
        }
    }
}

impl Expression {
    /// Defer addition of `other` to this expression.
    pub fn plus(self, other: impl Into<Expression>) -> Expression {
        Expression::Sum(Sum::new(self, other))
    }

    /// Scale every amount in the tree by `multiplier`.
    ///
    /// The result has the same shape; a sum scales each of its operands.
    pub fn times(&self, multiplier: i64) -> MonetaryResult<Expression> {
        let mut work = vec![Step::Visit(self)];
        let mut built: Vec<Expression> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Visit(Expression::Money(m)) => {
                    built.push(Expression::Money(m.times(multiplier)?));
                }
                Step::Visit(Expression::Sum(sum)) => {
                    work.push(Step::Add);
                    work.push(Step::Visit(sum.right()));
                    work.push(Step::Visit(sum.left()));
                }
                Step::Add => {
                    let (Some(right), Some(left)) = (built.pop(), built.pop()) else {
                        unreachable!("every Add follows two scaled operands");
                    };
                    built.push(Expression::Sum(Sum::new(left, right)));
                }
            }
        }

        let Some(scaled) = built.pop() else {
            unreachable!("the root is always scaled");
        };
        Ok(scaled)
    }

    /// Collapse the tree into one amount expressed in `to`.
    ///
    /// Leaves are converted individually (each rounded on its own) and then
    /// summed. The first failing leaf, in left-to-right order, aborts the
    /// whole reduction.
    ///
    /// Callers normally go through `Bank::reduce` in `moneta-fx`, which pins
    /// one rate snapshot for the whole evaluation.
    pub fn reduce<R>(&self, rates: &R, to: &Currency) -> MonetaryResult<Money>
    where
        R: ExchangeRates + ?Sized,
    {
        match self {
            Expression::Money(m) => m.reduce(rates, to),
            Expression::Sum(sum) => reduce_sum(sum, rates, to),
        }
    }

    /// Number of money leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Expression::Money(_) => count += 1,
                Expression::Sum(sum) => {
                    stack.push(&sum.right);
                    stack.push(&sum.left);
                }
            }
        }
        count
    }

    /// The leaf amount, if this expression is a single value.
    pub fn as_money(&self) -> Option<&Money> {
        match self {
            Expression::Money(m) => Some(m),
            Expression::Sum(_) => None,
        }
    }
}

impl PartialEq for Expression {
    // Structural comparison; shared subtrees are skipped by pointer.
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            match (a, b) {
                (Expression::Money(x), Expression::Money(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (Expression::Sum(x), Expression::Sum(y)) => {
                    if !Arc::ptr_eq(&x.right, &y.right) {
                        pending.push((x.right(), y.right()));
                    }
                    if !Arc::ptr_eq(&x.left, &y.left) {
                        pending.push((x.left(), y.left()));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Expression {}

impl PartialEq for Sum {
    fn eq(&self, other: &Self) -> bool {
        self.left() == other.left() && self.right() == other.right()
    }
}

impl Eq for Sum {}

impl From<Money> for Expression {
    fn from(m: Money) -> Self {
        Expression::Money(m)
    }
}

impl From<&Money> for Expression {
    fn from(m: &Money) -> Self {
        Expression::Money(m.clone())
    }
}

impl From<Sum> for Expression {
    fn from(sum: Sum) -> Self {
        Expression::Sum(sum)
    }
}

enum Step<'a> {
    Visit(&'a Expression),
    Add,
}

// Post-order evaluation with an explicit work stack.
fn reduce_sum<R>(root: &Sum, rates: &R, to: &Currency) -> MonetaryResult<Money>
where
    R: ExchangeRates + ?Sized,
{
    let mut work = vec![Step::Add, Step::Visit(root.right()), Step::Visit(root.left())];
    let mut amounts: Vec<i64> = Vec::new();

    while let Some(step) = work.pop() {
        match step {
            Step::Visit(Expression::Money(m)) => {
                amounts.push(m.reduce(rates, to)?.amount);
            }
            Step::Visit(Expression::Sum(sum)) => {
                work.push(Step::Add);
                work.push(Step::Visit(sum.right()));
                work.push(Step::Visit(sum.left()));
            }
            Step::Add => {
                let (Some(right), Some(left)) = (amounts.pop(), amounts.pop()) else {
                    unreachable!("every Add follows two visited operands");
                };
                let total = left
                    .checked_add(right)
                    .ok_or_else(|| MonetaryError::overflow("sum"))?;
                amounts.push(total);
            }
        }
    }

    let amount = amounts.pop().unwrap_or_default();
    Ok(Money::new(amount, to.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monetary::{money, CurrencyPair};
    use crate::rate::Rate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FixedRates(HashMap<CurrencyPair, Rate>);

    impl FixedRates {
        fn with(mut self, from: &str, to: &str, rate: rust_decimal::Decimal) -> Self {
            self.0
                .insert(CurrencyPair::new(from, to), Rate::new(rate).unwrap());
            self
        }
    }

    impl ExchangeRates for FixedRates {
        fn rate(&self, from: &Currency, to: &Currency) -> MonetaryResult<Rate> {
            if from == to {
                return Ok(Rate::ONE);
            }
            let pair = CurrencyPair::new(from, to);
            self.0
                .get(&pair)
                .copied()
                .ok_or(MonetaryError::RateNotFound { pair })
        }
    }

    #[test]
    fn test_plus_builds_sum_without_adding() {
        let five = money(5, "USD");
        let expr = five.plus(money(5, "USD"));

        let Expression::Sum(sum) = &expr else {
            panic!("expected a sum");
        };
        assert_eq!(sum.left(), &Expression::Money(money(5, "USD")));
        assert_eq!(sum.right(), &Expression::Money(money(5, "USD")));
    }

    #[test]
    fn test_reduce_money_same_currency_needs_no_rate() {
        let rates = FixedRates::default();

        let result = money(1, "USD").reduce(&rates, &Currency::usd()).unwrap();
        assert_eq!(result, money(1, "USD"));
    }

    #[test]
    fn test_reduce_sum_mixed_currencies() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let sum = money(5, "USD").plus(money(10, "CHF"));

        assert_eq!(sum.reduce(&rates, &Currency::usd()).unwrap(), money(10, "USD"));
    }

    #[test]
    fn test_sum_plus_money() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let sum = money(5, "USD").plus(money(10, "CHF")).plus(money(5, "USD"));

        assert_eq!(sum.reduce(&rates, &Currency::usd()).unwrap(), money(15, "USD"));
        assert_eq!(sum.leaf_count(), 3);
    }

    #[test]
    fn test_sum_times() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let sum = money(5, "USD").plus(money(10, "CHF")).times(2).unwrap();

        assert_eq!(sum.reduce(&rates, &Currency::usd()).unwrap(), money(20, "USD"));
        assert_eq!(sum.leaf_count(), 2);
    }

    #[test]
    fn test_missing_rate_propagates_from_nested_child() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let expr = money(5, "USD").plus(money(10, "CHF").plus(money(1, "GBP")));

        let err = expr.reduce(&rates, &Currency::usd()).unwrap_err();
        assert_eq!(
            err,
            MonetaryError::RateNotFound {
                pair: CurrencyPair::new("GBP", "USD")
            }
        );
    }

    #[test]
    fn test_sum_overflow() {
        let rates = FixedRates::default();
        let expr = money(i64::MAX, "USD").plus(money(1, "USD"));

        assert_eq!(
            expr.reduce(&rates, &Currency::usd()).unwrap_err(),
            MonetaryError::Overflow { operation: "sum" }
        );
    }

    #[test]
    fn test_shared_subtree() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let shared = money(4, "CHF").plus(money(1, "USD"));
        let expr = shared.clone().plus(shared);

        assert_eq!(expr.reduce(&rates, &Currency::usd()).unwrap(), money(6, "USD"));
    }

    #[test]
    fn test_deep_tree_reduces_and_drops() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let mut expr = Expression::from(money(0, "USD"));
        for _ in 0..200_000 {
            expr = expr.plus(money(2, "CHF"));
        }

        assert_eq!(
            expr.reduce(&rates, &Currency::usd()).unwrap(),
            money(200_000, "USD")
        );
        assert_eq!(expr.leaf_count(), 200_001);
        drop(expr);
    }

    #[test]
    fn test_teardown_placeholder_is_valid_money() {
        let placeholder = detached();
        let Expression::Money(m) = placeholder.as_ref() else {
            panic!("placeholder must be a leaf");
        };
        assert!(m.is_zero());
        assert!(Currency::parse(m.currency.code()).is_ok());
    }

    #[test]
    fn test_deep_tree_times() {
        let rates = FixedRates::default().with("CHF", "USD", dec!(2));
        let mut expr = Expression::from(money(1, "USD"));
        for _ in 0..200_000 {
            expr = expr.plus(money(2, "CHF"));
        }

        let doubled = expr.times(2).unwrap();
        assert_eq!(doubled.leaf_count(), 200_001);
        assert_eq!(
            doubled.reduce(&rates, &Currency::usd()).unwrap(),
            money(400_002, "USD")
        );
    }

    #[test]
    fn test_deep_tree_times_overflow() {
        let mut expr = Expression::from(money(1, "USD"));
        for _ in 0..200_000 {
            expr = expr.plus(money(1, "USD"));
        }
        expr = expr.plus(money(i64::MAX, "USD"));

        assert_eq!(
            expr.times(2).unwrap_err(),
            MonetaryError::Overflow { operation: "times" }
        );
    }

    #[test]
    fn test_deep_tree_equality() {
        let build = |last: i64| {
            let mut expr = Expression::from(money(0, "USD"));
            for _ in 0..200_000 {
                expr = expr.plus(money(1, "CHF"));
            }
            expr.plus(money(last, "CHF"))
        };

        assert_eq!(build(7), build(7));
        assert_ne!(build(7), build(8));
    }

    #[test]
    fn test_equality_distinguishes_shape() {
        let left_leaning = money(1, "USD").plus(money(2, "USD")).plus(money(3, "USD"));
        let right_leaning = money(1, "USD").plus(money(2, "USD").plus(money(3, "USD")));

        assert_ne!(left_leaning, right_leaning);
        assert_eq!(left_leaning.clone(), left_leaning);
    }
}
