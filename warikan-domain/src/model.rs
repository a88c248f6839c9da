use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use indexmap::IndexMap;
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedSub};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidInput, MemberRole};

/// Exact unrounded amount. Shares stay fractions until rounding.
pub type RawAmount = Ratio<i128>;

/// Rounded balance per member, in roster order.
pub type MemberBalances<'a> = IndexMap<&'a str, Money>;

/// Unrounded balance per member, in roster order.
pub type RawBalances<'a> = IndexMap<&'a str, RawAmount>;

/// A snapshot of the shared ledger: the roster plus every expense in entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub members: Vec<String>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub payer: String,
    pub amount: Decimal,
    /// Split targets. Repeated entries take one share each.
    pub payees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(i64);

pub struct BalanceAccumulator<'a> {
    balances: RawBalances<'a>,
    applied: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transfer<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub amount: Money,
}

/// Outcome of planning: the transfers and the balances left once they are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement<'a> {
    pub new_balances: MemberBalances<'a>,
    pub transfers: Vec<Transfer<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReport<'a> {
    pub balances: MemberBalances<'a>,
    pub settlement: Settlement<'a>,
}

impl Ledger {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            expenses: Vec::new(),
        }
    }

    pub fn with_expense(mut self, expense: Expense) -> Self {
        self.expenses.push(expense);
        self
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.iter().map(String::as_str)
    }
}

impl Expense {
    pub fn new<I, S>(payer: impl Into<String>, amount: Decimal, payees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payer: payer.into(),
            amount,
            payees: payees.into_iter().map(Into::into).collect(),
            purpose: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

impl Money {
    pub const ZERO: Self = Self(0);

    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    pub fn amount(self) -> i64 {
        self.0
    }

    /// Magnitude as `u64`, defined for `i64::MIN` too.
    pub fn unsigned_abs(self) -> u64 {
        self.0.unsigned_abs()
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn signum(self) -> i64 {
        self.0.signum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'m> Sum<&'m Money> for Money {
    fn sum<I: Iterator<Item = &'m Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl<'a> BalanceAccumulator<'a> {
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let balances = members
            .into_iter()
            .map(|member| (member, RawAmount::from_integer(0)))
            .collect();

        Self {
            balances,
            applied: 0,
        }
    }

    /// Credits the payer in full and debits one share per payee entry.
    ///
    /// The expense is checked against the roster before any balance moves.
    pub fn apply(&mut self, expense: &Expense) -> Result<(), InvalidInput> {
        let index = self.applied;
        self.applied += 1;

        if expense.amount.is_sign_negative() && !expense.amount.is_zero() {
            return Err(InvalidInput::NegativeAmount {
                expense: index,
                amount: expense.amount,
            });
        }
        self.ensure_member(&expense.payer, MemberRole::Payer, index)?;
        if expense.payees.is_empty() {
            return Err(InvalidInput::EmptyPayees { expense: index });
        }
        for payee in &expense.payees {
            self.ensure_member(payee, MemberRole::Payee, index)?;
        }

        let overflow = || InvalidInput::BalanceOverflow { expense: index };
        let amount = exact_amount(expense.amount);
        let share = amount
            .checked_div(&RawAmount::from_integer(expense.payees.len() as i128))
            .ok_or_else(overflow)?;

        self.adjust(&expense.payer, |balance| balance.checked_add(&amount))
            .ok_or_else(overflow)?;
        for payee in &expense.payees {
            self.adjust(payee, |balance| balance.checked_sub(&share))
                .ok_or_else(overflow)?;
        }
        Ok(())
    }

    pub fn raw_balances(&self) -> &RawBalances<'a> {
        &self.balances
    }

    pub fn into_raw_balances(self) -> RawBalances<'a> {
        self.balances
    }

    /// Number of expenses folded so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    fn ensure_member(
        &self,
        name: &str,
        role: MemberRole,
        expense: usize,
    ) -> Result<(), InvalidInput> {
        if self.balances.contains_key(name) {
            return Ok(());
        }
        Err(InvalidInput::UnknownMember {
            name: name.to_owned(),
            expense,
            role,
        })
    }

    fn adjust<F>(&mut self, member: &str, step: F) -> Option<()>
    where
        F: FnOnce(&RawAmount) -> Option<RawAmount>,
    {
        let balance = self.balances.get_mut(member)?;
        *balance = step(balance)?;
        Some(())
    }
}

impl Settlement<'_> {
    /// Members whose balance the planner could not match.
    pub fn residuals(&self) -> impl Iterator<Item = (&str, Money)> + '_ {
        self.new_balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(member, balance)| (*member, *balance))
    }

    /// Sum of the unmatched balances, widened so it cannot overflow.
    pub fn residual_total(&self) -> i128 {
        self.new_balances
            .values()
            .map(|balance| i128::from(balance.amount()))
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.new_balances.values().all(|balance| balance.is_zero())
    }
}

/// `Decimal` carries at most 28 fractional digits, so `10^scale` fits in `i128`.
pub fn exact_amount(amount: Decimal) -> RawAmount {
    RawAmount::new(amount.mantissa(), 10_i128.pow(amount.scale()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decimal(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn whole(value: i128) -> RawAmount {
        RawAmount::from_integer(value)
    }

    #[test]
    fn accumulator_starts_with_zero_for_every_member_in_roster_order() {
        let accumulator = BalanceAccumulator::new(["C", "A", "B"]);

        let members: Vec<&str> = accumulator.raw_balances().keys().copied().collect();
        assert_eq!(members, vec!["C", "A", "B"]);
        assert!(accumulator.raw_balances().values().all(|b| *b == whole(0)));
    }

    #[test]
    fn apply_credits_payer_and_debits_each_payee() {
        let expense = Expense::new("A", decimal(90), ["A", "B", "C"]);
        let mut accumulator = BalanceAccumulator::new(["A", "B", "C"]);

        accumulator.apply(&expense).expect("apply should succeed");

        let balances = accumulator.raw_balances();
        assert_eq!(balances["A"], whole(60));
        assert_eq!(balances["B"], whole(-30));
        assert_eq!(balances["C"], whole(-30));
        assert_eq!(accumulator.applied(), 1);
    }

    #[test]
    fn apply_counts_repeated_payees_in_the_divisor() {
        let expense = Expense::new("A", decimal(90), ["B", "B", "C"]);
        let mut accumulator = BalanceAccumulator::new(["A", "B", "C"]);

        accumulator.apply(&expense).expect("apply should succeed");

        let balances = accumulator.raw_balances();
        assert_eq!(balances["A"], whole(90));
        assert_eq!(balances["B"], whole(-60));
        assert_eq!(balances["C"], whole(-30));
    }

    #[test]
    fn repeated_non_terminating_shares_stay_exact() {
        let expense = Expense::new("A", decimal(7), ["B", "B", "B", "C", "C", "C"]);
        let mut accumulator = BalanceAccumulator::new(["A", "B", "C"]);

        accumulator.apply(&expense).expect("apply should succeed");

        let balances = accumulator.raw_balances();
        assert_eq!(balances["A"], whole(7));
        assert_eq!(balances["B"], RawAmount::new(-7, 2));
        assert_eq!(balances["C"], RawAmount::new(-7, 2));
    }

    #[test]
    fn fractional_amount_converts_exactly() {
        assert_eq!(exact_amount(Decimal::new(1005, 2)), RawAmount::new(201, 20));
        assert_eq!(exact_amount(Decimal::new(-25, 1)), RawAmount::new(-5, 2));
        assert_eq!(exact_amount(Decimal::ZERO), whole(0));
    }

    #[rstest]
    #[case::empty_payees(
        Expense::new("A", decimal(50), Vec::<String>::new()),
        InvalidInput::EmptyPayees { expense: 0 }
    )]
    #[case::unknown_payer(
        Expense::new("Z", decimal(50), ["A"]),
        InvalidInput::UnknownMember { name: "Z".into(), expense: 0, role: MemberRole::Payer }
    )]
    #[case::unknown_payee(
        Expense::new("A", decimal(50), ["A", "Z"]),
        InvalidInput::UnknownMember { name: "Z".into(), expense: 0, role: MemberRole::Payee }
    )]
    #[case::negative_amount(
        Expense::new("A", decimal(-50), ["A"]),
        InvalidInput::NegativeAmount { expense: 0, amount: decimal(-50) }
    )]
    fn apply_rejects_inconsistent_expense_without_moving_balances(
        #[case] expense: Expense,
        #[case] expected: InvalidInput,
    ) {
        let mut accumulator = BalanceAccumulator::new(["A", "B"]);

        assert_eq!(accumulator.apply(&expense), Err(expected));
        assert_eq!(accumulator.applied(), 1);
        let members: Vec<&str> = accumulator.raw_balances().keys().copied().collect();
        assert_eq!(members, vec!["A", "B"]);
        assert!(accumulator.raw_balances().values().all(|b| *b == whole(0)));
    }

    #[test]
    fn apply_reports_overflow_with_expense_index() {
        // Coprime payee counts over a 28-digit amount push the denominator past i128.
        let tiny = Decimal::new(1, 28);
        let expenses: Vec<Expense> = [7usize, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43]
            .into_iter()
            .map(|count| {
                let payees = std::iter::once("A").chain(std::iter::repeat_n("B", count - 1));
                Expense::new("A", tiny, payees)
            })
            .collect();
        let mut accumulator = BalanceAccumulator::new(["A", "B"]);

        let result = expenses
            .iter()
            .try_for_each(|expense| accumulator.apply(expense));

        assert!(matches!(result, Err(InvalidInput::BalanceOverflow { .. })));
    }

    #[rstest]
    #[case::all_zero(&[0, 0, 0], true, 0)]
    #[case::single_residual(&[1, 0, 0], false, 1)]
    #[case::mixed_residuals(&[2, 0, -3], false, -1)]
    #[case::beyond_i64(&[i64::MAX, i64::MAX, 0], false, 2 * i128::from(i64::MAX))]
    fn settlement_reports_residuals(
        #[case] remaining: &[i64],
        #[case] complete: bool,
        #[case] total: i128,
    ) {
        let names = ["A", "B", "C"];
        let settlement = Settlement {
            new_balances: names
                .iter()
                .copied()
                .zip(remaining.iter().map(|&value| Money::from_i64(value)))
                .collect(),
            transfers: Vec::new(),
        };

        assert_eq!(settlement.is_complete(), complete);
        assert_eq!(settlement.residual_total(), total);
        assert_eq!(
            settlement.residuals().count(),
            remaining.iter().filter(|value| **value != 0).count()
        );
    }

    #[test]
    fn unsigned_abs_covers_the_full_range() {
        assert_eq!(Money::from_i64(i64::MIN).unsigned_abs(), 1u64 << 63);
        assert_eq!(Money::from_i64(-5).unsigned_abs(), 5);
    }

    #[test]
    fn ledger_deserializes_snapshot_without_expenses() {
        let ledger: Ledger =
            serde_json::from_str(r#"{"members": ["A", "B"]}"#).expect("snapshot should parse");

        assert_eq!(ledger.members, vec!["A".to_string(), "B".to_string()]);
        assert!(ledger.expenses.is_empty());
    }

    #[test]
    fn ledger_deserializes_numeric_amounts_and_optional_purpose() {
        let ledger: Ledger = serde_json::from_str(
            r#"{
                "members": ["A", "B"],
                "expenses": [
                    {"payer": "A", "amount": 12.5, "payees": ["A", "B"], "purpose": "lunch"},
                    {"payer": "B", "amount": 40, "payees": ["A"]}
                ]
            }"#,
        )
        .expect("snapshot should parse");

        assert_eq!(ledger.expenses[0].amount, Decimal::new(125, 1));
        assert_eq!(ledger.expenses[0].purpose.as_deref(), Some("lunch"));
        assert_eq!(ledger.expenses[1].amount, decimal(40));
        assert_eq!(ledger.expenses[1].purpose, None);
    }
}
