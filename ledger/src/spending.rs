//! Spending summaries derived from a user's expense participation.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use splitledger_common::{Amount, Expense, UserId};

/// One calendar month's spending total.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySpending {
    /// Month number, 1-12.
    pub month: u32,
    /// The user's own share of that month's expenses.
    pub total: Amount,
}

/// A user's own share of every expense they participate in during the given
/// year. Measures what they consumed, not the cash they fronted.
pub fn total_spent(user_id: &UserId, year: i32, expenses: &[Expense]) -> Amount {
    expenses
        .iter()
        .filter(|e| e.created_at.year() == year)
        .map(|e| e.share_of(user_id))
        .sum()
}

/// The same total bucketed per calendar month, ascending. Months without
/// activity are omitted.
pub fn monthly_spending(user_id: &UserId, year: i32, expenses: &[Expense]) -> Vec<MonthlySpending> {
    let mut buckets: BTreeMap<u32, Amount> = BTreeMap::new();
    for expense in expenses {
        if expense.created_at.year() != year {
            continue;
        }
        let share = expense.share_of(user_id);
        if share.is_zero() {
            continue;
        }
        *buckets
            .entry(expense.created_at.month())
            .or_insert(Amount::zero()) += share;
    }
    buckets
        .into_iter()
        .map(|(month, total)| MonthlySpending { month, total })
        .collect()
}
