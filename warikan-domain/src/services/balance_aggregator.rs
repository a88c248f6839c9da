use std::cmp::Ordering;

use crate::{
    error::InvalidInput,
    model::{BalanceAccumulator, Ledger, MemberBalances, Money, RawAmount, RawBalances},
    services::LedgerValidator,
};

/// How a folded balance exactly halfway between two integers is rounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundingMode {
    /// Ties toward positive infinity (2.5 -> 3, -2.5 -> -2).
    #[default]
    HalfUp,
    /// Ties away from zero (2.5 -> 3, -2.5 -> -3).
    HalfAwayFromZero,
    /// Ties to the nearest even integer (2.5 -> 2, 3.5 -> 4).
    HalfEven,
}

impl RoundingMode {
    /// Rounds an exact amount to an integer. `None` only when the result
    /// leaves the `i128` range.
    pub fn round(self, value: &RawAmount) -> Option<i128> {
        // Ratio keeps the denominator positive, so Euclidean division floors.
        let (numer, denom) = (*value.numer(), *value.denom());
        let floor = numer.div_euclid(denom);
        let below = numer.rem_euclid(denom);
        let above = denom - below;

        let round_up = match below.cmp(&above) {
            Ordering::Less => false,
            Ordering::Greater => true,
            Ordering::Equal => match self {
                Self::HalfUp => true,
                Self::HalfAwayFromZero => floor >= 0,
                Self::HalfEven => floor % 2 != 0,
            },
        };
        if round_up { floor.checked_add(1) } else { Some(floor) }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationContext {
    pub rounding_mode: RoundingMode,
}

/// Folds a ledger into one integer balance per roster member.
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Validates the ledger and computes rounded balances in roster order.
    pub fn compute<'a>(
        &self,
        ledger: &'a Ledger,
        context: AggregationContext,
    ) -> Result<MemberBalances<'a>, InvalidInput> {
        let raw = self.compute_raw(ledger)?;
        round_balances(raw, context.rounding_mode)
    }

    /// Validates the ledger and returns the unrounded balances.
    pub fn compute_raw<'a>(&self, ledger: &'a Ledger) -> Result<RawBalances<'a>, InvalidInput> {
        LedgerValidator.validate(ledger)?;

        tracing::debug!(
            member_count = ledger.members.len(),
            expense_count = ledger.expenses.len(),
            "Balance aggregation started"
        );

        let mut accumulator = BalanceAccumulator::new(ledger.member_names());
        for expense in &ledger.expenses {
            accumulator.apply(expense)?;
        }
        Ok(accumulator.into_raw_balances())
    }
}

/// Rounds each balance independently. The rounded total may drift from zero.
///
/// `i64::MIN` is rejected along with overflow so every balance has a
/// representable magnitude.
pub fn round_balances(
    raw: RawBalances<'_>,
    rounding_mode: RoundingMode,
) -> Result<MemberBalances<'_>, InvalidInput> {
    raw.into_iter()
        .map(|(member, balance)| {
            rounding_mode
                .round(&balance)
                .and_then(|rounded| i64::try_from(rounded).ok())
                .filter(|rounded| *rounded != i64::MIN)
                .map(|rounded| (member, Money::from_i64(rounded)))
                .ok_or_else(|| InvalidInput::BalanceOutOfRange {
                    name: member.to_owned(),
                })
        })
        .collect()
}

/// Computes rounded balances with the default context.
pub fn compute_balances(ledger: &Ledger) -> Result<MemberBalances<'_>, InvalidInput> {
    BalanceAggregator.compute(ledger, AggregationContext::default())
}
