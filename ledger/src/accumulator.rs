//! The balance accumulator: an order-independent fold of pair contributions
//! into net balances.

use std::collections::HashMap;

use splitledger_common::{Amount, Expense, PairKey, Result, Settlement, UserId};

use crate::split;

/// A single signed contribution against a canonical user pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    pair: PairKey,
    amount: Amount,
}

impl PairEntry {
    /// A debt: `debtor` owes `creditor` the given amount.
    pub fn debt(creditor: &UserId, debtor: &UserId, amount: Amount) -> Self {
        let pair = PairKey::new(creditor.clone(), debtor.clone());
        let amount = if pair.first() == creditor {
            amount
        } else {
            -amount
        };
        Self { pair, amount }
    }

    /// A direct payment from `payer` to `receiver`. Reduces the payer's debt
    /// to the receiver; over-payment simply flips the sign past zero.
    pub fn payment(payer: &UserId, receiver: &UserId, amount: Amount) -> Self {
        Self::debt(payer, receiver, amount)
    }

    /// The entry for a settlement record.
    pub fn from_settlement(settlement: &Settlement) -> Self {
        Self::payment(
            &settlement.paid_by,
            &settlement.received_by,
            settlement.amount,
        )
    }

    /// The canonical pair this entry contributes to.
    pub fn pair(&self) -> &PairKey {
        &self.pair
    }

    /// The canonically signed amount: positive means the pair's second user
    /// owes the first.
    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Entries for every debt an expense creates between its payer and the other
/// participants. Validates the expense's share invariants first.
pub fn expense_entries(expense: &Expense) -> Result<Vec<PairEntry>> {
    split::validate_shares(expense)?;
    Ok(expense
        .shares
        .iter()
        .filter(|share| share.user_id != expense.paid_by)
        .map(|share| PairEntry::debt(&expense.paid_by, &share.user_id, share.amount))
        .collect())
}

/// Re-orient a canonically signed balance to a viewer's perspective:
/// positive means the counterparty owes the viewer. Zero when the viewer is
/// not part of the pair.
pub fn oriented(pair: &PairKey, balance: Amount, viewer: &UserId) -> Amount {
    if pair.first() == viewer {
        balance
    } else if pair.second() == viewer {
        -balance
    } else {
        Amount::zero()
    }
}

/// Accumulates pair contributions into net balances.
///
/// The fold is associative and commutative: input order never changes the
/// result, and partial accumulators merge losslessly, so large record sets
/// may be folded incrementally or in parallel partitions.
#[derive(Debug, Clone, Default)]
pub struct BalanceAccumulator {
    totals: HashMap<PairKey, Amount>,
}

impl BalanceAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry.
    pub fn push(&mut self, entry: PairEntry) {
        *self.totals.entry(entry.pair).or_insert(Amount::zero()) += entry.amount;
    }

    /// Fold a sequence of entries.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = PairEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Merge a partial accumulator into this one.
    pub fn merge(mut self, other: BalanceAccumulator) -> Self {
        for (pair, amount) in other.totals {
            *self.totals.entry(pair).or_insert(Amount::zero()) += amount;
        }
        self
    }

    /// Net balance for a pair; zero when the pair never appeared.
    pub fn balance(&self, pair: &PairKey) -> Amount {
        self.totals.get(pair).copied().unwrap_or_else(Amount::zero)
    }

    /// All net balances, keyed by canonical pair.
    pub fn balances(&self) -> &HashMap<PairKey, Amount> {
        &self.totals
    }

    /// Consume the accumulator, yielding the net balances.
    pub fn into_balances(self) -> HashMap<PairKey, Amount> {
        self.totals
    }
}

/// Fold a sequence of entries into net balances in one call.
pub fn accumulate(entries: impl IntoIterator<Item = PairEntry>) -> HashMap<PairKey, Amount> {
    let mut acc = BalanceAccumulator::new();
    acc.extend(entries);
    acc.into_balances()
}
