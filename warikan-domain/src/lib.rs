#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod services;

pub use error::{InvalidInput, MemberRole};
pub use model::{
    BalanceAccumulator, Expense, Ledger, MemberBalances, Money, RawAmount, RawBalances, Settlement,
    SettlementReport, Transfer, exact_amount,
};
pub use services::{
    AggregationContext, BalanceAggregator, LedgerValidator, RoundingMode, SettlementPlanner,
    compute_balances, plan_transfers, settle_ledger,
};
