pub mod balance_aggregator;
pub mod ledger_validator;
pub mod settle_ledger;
pub mod settlement_planner;

pub use balance_aggregator::{
    AggregationContext, BalanceAggregator, RoundingMode, compute_balances, round_balances,
};
pub use ledger_validator::LedgerValidator;
pub use settle_ledger::settle_ledger;
pub use settlement_planner::{SettlementPlanner, plan_transfers};
