use crate::{
    error::{InvalidInput, MemberRole},
    model::Ledger,
};
use fxhash::FxHashSet;

/// Rejects ledgers the aggregator cannot fold meaningfully.
pub struct LedgerValidator;

impl LedgerValidator {
    /// Checks the roster, then every expense in ledger order, stopping at the
    /// first violation.
    pub fn validate(&self, ledger: &Ledger) -> Result<(), InvalidInput> {
        let mut roster: FxHashSet<&str> = FxHashSet::default();
        for member in ledger.member_names() {
            if !roster.insert(member) {
                return Err(reject(InvalidInput::DuplicateMember {
                    name: member.to_owned(),
                }));
            }
        }

        for (expense_index, expense) in ledger.expenses.iter().enumerate() {
            if expense.amount.is_sign_negative() && !expense.amount.is_zero() {
                return Err(reject(InvalidInput::NegativeAmount {
                    expense: expense_index,
                    amount: expense.amount,
                }));
            }

            if !roster.contains(expense.payer.as_str()) {
                return Err(reject(InvalidInput::UnknownMember {
                    name: expense.payer.clone(),
                    expense: expense_index,
                    role: MemberRole::Payer,
                }));
            }

            if expense.payees.is_empty() {
                return Err(reject(InvalidInput::EmptyPayees {
                    expense: expense_index,
                }));
            }

            if let Some(unknown) = expense
                .payees
                .iter()
                .find(|payee| !roster.contains(payee.as_str()))
            {
                return Err(reject(InvalidInput::UnknownMember {
                    name: unknown.clone(),
                    expense: expense_index,
                    role: MemberRole::Payee,
                }));
            }
        }

        Ok(())
    }
}

fn reject(err: InvalidInput) -> InvalidInput {
    tracing::debug!(error = %err, "Ledger rejected");
    err
}
