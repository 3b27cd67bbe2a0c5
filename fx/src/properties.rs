//! Property tests for reduction through a bank.

use moneta_common::{money, Currency, Expression, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::bank::Bank;

const CODES: [&str; 3] = ["USD", "CHF", "EUR"];

fn any_money() -> impl Strategy<Value = Money> {
    (-1_000_000i64..1_000_000, 0..CODES.len()).prop_map(|(amount, idx)| money(amount, CODES[idx]))
}

fn any_target() -> impl Strategy<Value = Currency> {
    (0..CODES.len()).prop_map(|idx| Currency::new(CODES[idx]))
}

// Every ordered pair among CODES gets a positive rate.
fn full_bank(rates: &[u32]) -> Bank {
    let bank = Bank::new();
    let mut next = rates.iter().cycle();
    for from in CODES {
        for to in CODES {
            if from != to {
                let hundredths = next.next().copied().unwrap_or(100);
                bank.add_rate(from, to, Decimal::new(i64::from(hundredths), 2))
                    .unwrap();
            }
        }
    }
    bank
}

fn any_rates() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..10_000, 6)
}

proptest! {
    #[test]
    fn identity(m in any_money(), rates in any_rates()) {
        let bank = full_bank(&rates);
        let expr = Expression::from(m.clone());

        prop_assert_eq!(bank.reduce(&expr, &m.currency).unwrap(), m.clone());
        prop_assert_eq!(Bank::new().reduce(&expr, &m.currency).unwrap(), m);
    }

    #[test]
    fn commutative(a in any_money(), b in any_money(), to in any_target(), rates in any_rates()) {
        let bank = full_bank(&rates);

        let ab = bank.reduce(&a.plus(b.clone()), &to).unwrap();
        let ba = bank.reduce(&b.plus(a), &to).unwrap();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn associative(
        a in any_money(),
        b in any_money(),
        c in any_money(),
        to in any_target(),
        rates in any_rates()
    ) {
        let bank = full_bank(&rates);

        let left = a.plus(b.clone()).plus(c.clone());
        let right = a.plus(b.plus(c));
        prop_assert_eq!(bank.reduce(&left, &to).unwrap(), bank.reduce(&right, &to).unwrap());
    }

    #[test]
    fn scaling(m in any_money(), k in -1_000i64..1_000) {
        let bank = Bank::new();
        let scaled = Expression::from(m.times(k).unwrap());

        let reduced = bank.reduce(&scaled, &m.currency).unwrap();
        prop_assert_eq!(reduced.amount, m.amount * k);
        prop_assert_eq!(reduced.currency, m.currency);
    }

    #[test]
    fn missing_rate_always_fails(amount in -1_000i64..1_000) {
        let bank = Bank::new();
        bank.add_rate("CHF", "USD", Decimal::TWO).unwrap();

        let expr = Expression::from(money(amount, "CHF"));
        prop_assert!(bank.reduce(&expr, &Currency::gbp()).is_err());
        prop_assert!(bank.rate(&Currency::usd(), &Currency::chf()).is_err());
    }
}
