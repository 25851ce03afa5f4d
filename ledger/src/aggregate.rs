//! User aggregate balances across every counterparty.

use serde::Serialize;
use tracing::debug;

use splitledger_common::{Amount, Expense, Result, Settlement, UserId};

use crate::accumulator::{self, BalanceAccumulator, PairEntry};
use crate::split;

/// A counterparty and the (positive) amount outstanding with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterpartyBalance {
    /// The other user.
    pub counterparty: UserId,
    /// Amount outstanding; always positive.
    pub amount: Amount,
}

/// Outstanding debts, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OweDetails {
    /// Counterparties this user owes, largest debt first.
    pub you_owe: Vec<CounterpartyBalance>,
    /// Counterparties who owe this user, largest first.
    pub owed_to_you: Vec<CounterpartyBalance>,
}

/// One user's total position across all counterparties and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAggregate {
    /// The user.
    pub user_id: UserId,
    /// Sum of every pairwise balance; positive means others owe this user.
    pub total_balance: Amount,
    /// Per-counterparty breakdown.
    pub owe_details: OweDetails,
}

/// Compute a user's aggregate position over the given records.
///
/// A single accumulator pass restricted to pairs involving the user;
/// canonical pair keying makes a counterparty reachable through both peer
/// expenses and shared groups accumulate into one balance, so nothing is
/// double counted.
pub fn resolve(
    user_id: &UserId,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Result<UserAggregate> {
    let mut acc = BalanceAccumulator::new();

    for expense in expenses {
        if !expense.involves(user_id) {
            continue;
        }
        split::validate_shares(expense)?;
        if expense.paid_by == *user_id {
            for share in &expense.shares {
                if share.user_id == *user_id {
                    continue;
                }
                acc.push(PairEntry::debt(user_id, &share.user_id, share.amount));
            }
        } else {
            let own_share = expense.share_of(user_id);
            if !own_share.is_zero() {
                acc.push(PairEntry::debt(&expense.paid_by, user_id, own_share));
            }
        }
    }

    for settlement in settlements {
        if !settlement.involves(user_id) {
            continue;
        }
        acc.push(PairEntry::from_settlement(settlement));
    }

    let mut total_balance = Amount::zero();
    let mut you_owe = Vec::new();
    let mut owed_to_you = Vec::new();

    for (pair, amount) in acc.balances() {
        let counterparty = match pair.other(user_id) {
            Some(user) => user.clone(),
            None => continue,
        };
        let oriented = accumulator::oriented(pair, *amount, user_id);
        total_balance += oriented;
        if oriented.is_negative() {
            you_owe.push(CounterpartyBalance {
                counterparty,
                amount: oriented.abs(),
            });
        } else if oriented.is_positive() {
            owed_to_you.push(CounterpartyBalance {
                counterparty,
                amount: oriented,
            });
        }
    }

    sort_counterparties(&mut you_owe);
    sort_counterparties(&mut owed_to_you);

    debug!(
        user_id = %user_id,
        total_balance = %total_balance,
        debts = you_owe.len(),
        credits = owed_to_you.len(),
        "Resolved user aggregate"
    );

    Ok(UserAggregate {
        user_id: user_id.clone(),
        total_balance,
        owe_details: OweDetails {
            you_owe,
            owed_to_you,
        },
    })
}

fn sort_counterparties(balances: &mut [CounterpartyBalance]) {
    balances.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.counterparty.cmp(&b.counterparty))
    });
}
