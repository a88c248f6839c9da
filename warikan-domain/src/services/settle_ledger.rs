use crate::{
    error::InvalidInput,
    model::{Ledger, SettlementReport},
    services::{AggregationContext, BalanceAggregator, SettlementPlanner},
};

/// Runs validation, aggregation and planning over one ledger snapshot.
pub fn settle_ledger(
    ledger: &Ledger,
    context: AggregationContext,
) -> Result<SettlementReport<'_>, InvalidInput> {
    let balances = BalanceAggregator.compute(ledger, context)?;
    let settlement = SettlementPlanner.plan(&balances);
    Ok(SettlementReport {
        balances,
        settlement,
    })
}
