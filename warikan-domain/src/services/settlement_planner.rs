use std::collections::VecDeque;

use crate::model::{MemberBalances, Money, Settlement, Transfer};

/// Greedy first-in-first-out settlement planner.
///
/// Creditors and debtors are matched in balance-map order without sorting by
/// size, so the plan is deterministic but not minimal in transfer count.
pub struct SettlementPlanner;

impl SettlementPlanner {
    /// Plans transfers for `balances` and reports what remains unmatched.
    ///
    /// When the balances do not sum to zero, the smaller side is drained and
    /// the excess stays in `Settlement::new_balances`.
    pub fn plan<'a>(&self, balances: &MemberBalances<'a>) -> Settlement<'a> {
        // Remaining amounts are unsigned so `i64::MIN` keeps its magnitude.
        let mut creditors: VecDeque<(&'a str, u64)> = VecDeque::new();
        let mut debtors: VecDeque<(&'a str, u64)> = VecDeque::new();
        for (&member, &balance) in balances {
            if balance.is_positive() {
                creditors.push_back((member, balance.unsigned_abs()));
            } else if balance.is_negative() {
                debtors.push_back((member, balance.unsigned_abs()));
            }
        }

        tracing::debug!(
            member_count = balances.len(),
            creditor_count = creditors.len(),
            debtor_count = debtors.len(),
            "Settlement planning started"
        );

        let mut transfers = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));
        let mut new_balances = balances.clone();

        while let (Some(creditor), Some(debtor)) = (creditors.front_mut(), debtors.front_mut()) {
            let remaining = creditor.1.min(debtor.1);
            creditor.1 -= remaining;
            debtor.1 -= remaining;

            // Never above a creditor balance, which is at most `i64::MAX`.
            let amount = Money::from_i64(i64::try_from(remaining).unwrap_or(i64::MAX));
            transfers.push(Transfer {
                from: debtor.0,
                to: creditor.0,
                amount,
            });
            if let Some(balance) = new_balances.get_mut(creditor.0) {
                *balance -= amount;
            }
            if let Some(balance) = new_balances.get_mut(debtor.0) {
                *balance += amount;
            }

            let creditor_settled = creditor.1 == 0;
            let debtor_settled = debtor.1 == 0;
            if creditor_settled {
                creditors.pop_front();
            }
            if debtor_settled {
                debtors.pop_front();
            }
        }

        let settlement = Settlement {
            new_balances,
            transfers,
        };
        if !settlement.is_complete() {
            tracing::warn!(
                residual_total = %settlement.residual_total(),
                residual_member_count = settlement.residuals().count(),
                transfer_count = settlement.transfers.len(),
                "Settlement plan left unmatched balances"
            );
        }
        settlement
    }
}

/// Plans transfers only, discarding the residual report.
pub fn plan_transfers<'a>(balances: &MemberBalances<'a>) -> Vec<Transfer<'a>> {
    SettlementPlanner.plan(balances).transfers
}
