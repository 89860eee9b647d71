use crate::Money;
use rust_decimal::RoundingStrategy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Amounts partitioned by currency code. Never summed across currencies.
///
/// Entries exist only for currencies with a non-zero balance: adding zero is a
/// no-op and an entry that nets out to zero is dropped, so the empty map is the
/// zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CurrencyAmounts(BTreeMap<String, Money>);

impl CurrencyAmounts {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn add(&mut self, currency: &str, amount: Money) {
        if amount.is_zero() {
            return;
        }
        let balance = self.0.entry(currency.to_string()).or_default();
        *balance += amount;
        if balance.is_zero() {
            self.0.remove(currency);
        }
    }

    pub fn get(&self, currency: &str) -> Money {
        self.0.get(currency).copied().unwrap_or_default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Money)> {
        self.0.iter().map(|(code, amount)| (code.as_str(), *amount))
    }
}

impl fmt::Display for CurrencyAmounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0.00");
        }
        for (i, (code, amount)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let amount =
                amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            write!(f, "{amount:.2} {code}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_never_stored() {
        let mut amounts = CurrencyAmounts::new();
        amounts.add("USD", Money::ZERO);
        assert!(amounts.is_zero());

        amounts.add("USD", Money::new(70, 2));
        amounts.add("USD", Money::new(-70, 2));
        assert!(amounts.is_empty());
        assert_eq!(amounts.get("USD"), Money::ZERO);
    }

    #[test]
    fn keeps_currencies_apart() {
        let mut amounts = CurrencyAmounts::new();
        amounts.add("USD", Money::new(1250, 2));
        amounts.add("EUR", Money::new(3, 0));
        amounts.add("USD", Money::new(-250, 2));
        assert_eq!(amounts.len(), 2);
        assert_eq!(amounts.get("USD"), Money::new(10, 0));
        assert_eq!(amounts.to_string(), "3.00 EUR, 10.00 USD");
    }

    #[test]
    fn empty_displays_as_zero() {
        assert_eq!(CurrencyAmounts::new().to_string(), "0.00");
    }

    #[test]
    fn display_rounds_to_cents() {
        let mut amounts = CurrencyAmounts::new();
        amounts.add("EUR", Money::new(2999, 3));
        amounts.add("USD", Money::new(2105, 3));
        amounts.add("GBP", Money::new(-1234, 3));
        assert_eq!(amounts.to_string(), "3.00 EUR, -1.23 GBP, 2.11 USD");
        assert_eq!(amounts.get("EUR"), Money::new(2999, 3));
    }
}
