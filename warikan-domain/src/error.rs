use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

/// Which side of an expense referenced a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Payer,
    Payee,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payer => f.write_str("payer"),
            Self::Payee => f.write_str("payee"),
        }
    }
}

/// A malformed or inconsistent ledger snapshot.
///
/// Expense indexes are zero-based positions in `Ledger::expenses`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("member `{name}` appears more than once in the roster")]
    DuplicateMember { name: String },
    #[error("expense #{expense} references unknown {role} `{name}`")]
    UnknownMember {
        name: String,
        expense: usize,
        role: MemberRole,
    },
    #[error("expense #{expense} has no payees")]
    EmptyPayees { expense: usize },
    #[error("expense #{expense} has a negative amount ({amount})")]
    NegativeAmount { expense: usize, amount: Decimal },
    #[error("balances overflowed while applying expense #{expense}")]
    BalanceOverflow { expense: usize },
    #[error("balance of `{name}` is too large to settle")]
    BalanceOutOfRange { name: String },
}
