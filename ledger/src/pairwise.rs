//! Pairwise balance resolution between exactly two users.

use serde::Serialize;
use tracing::debug;

use splitledger_common::{Amount, Expense, PairKey, Result, Settlement, UserId};

use crate::accumulator::{self, BalanceAccumulator, PairEntry};
use crate::split;

/// The net position between two users, with the records that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseBalance {
    /// The viewing user.
    pub user_a: UserId,
    /// The counterparty.
    pub user_b: UserId,
    /// Positive means `user_b` owes `user_a`; negative the reverse.
    pub balance: Amount,
    /// Expenses involving both users.
    pub expenses: Vec<Expense>,
    /// Settlements between the two users.
    pub settlements: Vec<Settlement>,
}

impl PairwiseBalance {
    /// Check whether the pair is fully settled.
    pub fn is_settled(&self) -> bool {
        self.balance.is_zero()
    }
}

/// Compute the net balance between two users across the given records,
/// regardless of group: every shared expense and every settlement between
/// them counts.
///
/// Only the debt between the two contributes: each expense adds the
/// counterparty's share toward whichever of the two paid it; an expense paid
/// by a third party creates no debt between them. No records at all means
/// the pair is settled, not an error. A user queried against themselves is
/// settled by definition.
pub fn resolve(
    user_a: &UserId,
    user_b: &UserId,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Result<PairwiseBalance> {
    if user_a == user_b {
        return Ok(PairwiseBalance {
            user_a: user_a.clone(),
            user_b: user_b.clone(),
            balance: Amount::zero(),
            expenses: Vec::new(),
            settlements: Vec::new(),
        });
    }

    let pair = PairKey::new(user_a.clone(), user_b.clone());
    let mut acc = BalanceAccumulator::new();
    let mut contributing_expenses = Vec::new();
    let mut contributing_settlements = Vec::new();

    for expense in expenses {
        if !(expense.involves(user_a) && expense.involves(user_b)) {
            continue;
        }
        split::validate_shares(expense)?;
        if expense.paid_by == *user_a {
            acc.push(PairEntry::debt(user_a, user_b, expense.share_of(user_b)));
        } else if expense.paid_by == *user_b {
            acc.push(PairEntry::debt(user_b, user_a, expense.share_of(user_a)));
        }
        contributing_expenses.push(expense.clone());
    }

    for settlement in settlements {
        if !settlement.is_between(user_a, user_b) {
            continue;
        }
        acc.push(PairEntry::from_settlement(settlement));
        contributing_settlements.push(settlement.clone());
    }

    let balance = accumulator::oriented(&pair, acc.balance(&pair), user_a);
    debug!(
        pair = %pair,
        balance = %balance,
        expenses = contributing_expenses.len(),
        settlements = contributing_settlements.len(),
        "Resolved pairwise balance"
    );

    Ok(PairwiseBalance {
        user_a: user_a.clone(),
        user_b: user_b.clone(),
        balance,
        expenses: contributing_expenses,
        settlements: contributing_settlements,
    })
}
