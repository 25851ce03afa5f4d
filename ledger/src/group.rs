//! Group-scoped balance aggregation.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use splitledger_common::{Amount, Expense, GroupId, Result, Settlement, UserId};

use crate::accumulator::{self, expense_entries, BalanceAccumulator, PairEntry};

/// An amount due between a member and one other member of the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDue {
    /// The other member.
    pub member_id: UserId,
    /// Amount due; always positive.
    pub amount: Amount,
}

/// One member's position within the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberBalance {
    /// The member.
    pub member_id: UserId,
    /// Net against the rest of the group combined: positive means the group
    /// owes this member, negative means they owe the group.
    pub net: Amount,
    /// Members this member owes, largest debt first.
    pub owes_to: Vec<MemberDue>,
    /// Members who owe this member, largest first.
    pub owed_by: Vec<MemberDue>,
}

/// Per-member balances for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBalanceReport {
    /// The group.
    pub group_id: GroupId,
    /// One entry per member, in roster order.
    pub members: Vec<MemberBalance>,
}

impl GroupBalanceReport {
    /// Sum of all member nets. Zero for a closed group with no external
    /// payers; the canonical correctness check for the whole ledger.
    pub fn net_sum(&self) -> Amount {
        self.members.iter().map(|m| m.net).sum()
    }

    /// Look up one member's balance.
    pub fn member(&self, member_id: &UserId) -> Option<&MemberBalance> {
        self.members.iter().find(|m| m.member_id == *member_id)
    }
}

/// Compute every member's net balance against the rest of the group.
///
/// Scoping is strictly by each record's own group tag: records carrying a
/// different tag (or none) are ignored, so two members' unrelated personal
/// expenses never pollute the group's internal ledger. Members with no
/// recorded activity appear with a zero balance; users the records mention
/// beyond the given roster are appended so the report stays closed.
pub fn resolve(
    group_id: &GroupId,
    members: &[UserId],
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Result<GroupBalanceReport> {
    let mut acc = BalanceAccumulator::new();

    for expense in expenses {
        if !expense.in_group(group_id) {
            continue;
        }
        acc.extend(expense_entries(expense)?);
    }
    for settlement in settlements {
        if !settlement.in_group(group_id) {
            continue;
        }
        acc.push(PairEntry::from_settlement(settlement));
    }

    let mut roster: Vec<UserId> = Vec::new();
    let mut seen: BTreeSet<UserId> = BTreeSet::new();
    for member in members {
        if seen.insert(member.clone()) {
            roster.push(member.clone());
        }
    }
    let mut extras: BTreeSet<UserId> = BTreeSet::new();
    for pair in acc.balances().keys() {
        for user in [pair.first(), pair.second()] {
            if !seen.contains(user) {
                extras.insert(user.clone());
            }
        }
    }
    roster.extend(extras);

    let balances = acc.into_balances();
    let mut nets: HashMap<UserId, Amount> = HashMap::new();
    for (pair, amount) in &balances {
        *nets.entry(pair.first().clone()).or_insert(Amount::zero()) += *amount;
        *nets.entry(pair.second().clone()).or_insert(Amount::zero()) -= *amount;
    }

    let member_balances: Vec<MemberBalance> = roster
        .into_iter()
        .map(|member_id| {
            let mut owes_to = Vec::new();
            let mut owed_by = Vec::new();
            for (pair, amount) in &balances {
                let counterparty = match pair.other(&member_id) {
                    Some(user) => user,
                    None => continue,
                };
                let oriented = accumulator::oriented(pair, *amount, &member_id);
                if oriented.is_negative() {
                    owes_to.push(MemberDue {
                        member_id: counterparty.clone(),
                        amount: oriented.abs(),
                    });
                } else if oriented.is_positive() {
                    owed_by.push(MemberDue {
                        member_id: counterparty.clone(),
                        amount: oriented,
                    });
                }
            }
            sort_dues(&mut owes_to);
            sort_dues(&mut owed_by);

            MemberBalance {
                net: nets.get(&member_id).copied().unwrap_or_else(Amount::zero),
                member_id,
                owes_to,
                owed_by,
            }
        })
        .collect();

    debug!(
        group_id = %group_id,
        members = member_balances.len(),
        "Resolved group balances"
    );

    Ok(GroupBalanceReport {
        group_id: group_id.clone(),
        members: member_balances,
    })
}

fn sort_dues(dues: &mut [MemberDue]) {
    dues.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });
}
