//! In-memory reference implementation of the store ports.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use splitledger_common::{
    Expense, ExpenseId, Group, GroupId, Result, Settlement, SettlementId, UserId, UserProfile,
};

use crate::ports::{IdentityProvider, LedgerStore, MembershipProvider};

/// In-memory ledger store backed by concurrent maps.
///
/// Used by tests and the simulator; a deployment substitutes a persistent
/// implementation behind the same port. Query results are sorted by
/// creation time (then ID), so repeated reads over unchanged data are
/// identical.
#[derive(Debug, Default)]
pub struct MemoryStore {
    expenses: DashMap<ExpenseId, Expense>,
    settlements: DashMap<SettlementId, Settlement>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored expenses.
    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    /// Number of stored settlements.
    pub fn settlement_count(&self) -> usize {
        self.settlements.len()
    }

    fn collect_expenses(&self, mut filter: impl FnMut(&Expense) -> bool) -> Vec<Expense> {
        let mut matches: Vec<Expense> = self
            .expenses
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        matches
    }

    fn collect_settlements(&self, mut filter: impl FnMut(&Settlement) -> bool) -> Vec<Settlement> {
        let mut matches: Vec<Settlement> = self
            .settlements
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        matches
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_expense(&self, expense: Expense) -> Result<()> {
        debug!(expense_id = %expense.id, "Inserting expense");
        self.expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn insert_settlement(&self, settlement: Settlement) -> Result<()> {
        debug!(settlement_id = %settlement.id, "Inserting settlement");
        self.settlements.insert(settlement.id, settlement);
        Ok(())
    }

    async fn expenses_involving(&self, user: &UserId) -> Result<Vec<Expense>> {
        Ok(self.collect_expenses(|e| e.involves(user)))
    }

    async fn expenses_between(&self, a: &UserId, b: &UserId) -> Result<Vec<Expense>> {
        Ok(self.collect_expenses(|e| e.involves(a) && e.involves(b)))
    }

    async fn expenses_for_group(&self, group: &GroupId) -> Result<Vec<Expense>> {
        Ok(self.collect_expenses(|e| e.in_group(group)))
    }

    async fn settlements_involving(&self, user: &UserId) -> Result<Vec<Settlement>> {
        Ok(self.collect_settlements(|s| s.involves(user)))
    }

    async fn settlements_between(&self, a: &UserId, b: &UserId) -> Result<Vec<Settlement>> {
        Ok(self.collect_settlements(|s| s.is_between(a, b)))
    }

    async fn settlements_for_group(&self, group: &GroupId) -> Result<Vec<Settlement>> {
        Ok(self.collect_settlements(|s| s.in_group(group)))
    }
}

/// In-memory membership and identity directory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<UserId, UserProfile>,
    groups: DashMap<GroupId, Group>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or refresh a user profile.
    pub fn upsert_user(&self, profile: UserProfile) {
        self.users.insert(profile.id.clone(), profile);
    }

    /// Register or replace a group.
    pub fn upsert_group(&self, group: Group) {
        self.groups.insert(group.id.clone(), group);
    }
}

#[async_trait]
impl MembershipProvider for MemoryDirectory {
    async fn group(&self, group: &GroupId) -> Result<Option<Group>> {
        Ok(self.groups.get(group).map(|entry| entry.value().clone()))
    }

    async fn is_member(&self, user: &UserId, group: &GroupId) -> Result<bool> {
        Ok(self
            .groups
            .get(group)
            .map(|entry| entry.value().is_member(user))
            .unwrap_or(false))
    }

    async fn groups_for(&self, user: &UserId) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .filter(|entry| entry.value().is_member(user))
            .map(|entry| entry.value().clone())
            .collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(groups)
    }
}

#[async_trait]
impl IdentityProvider for MemoryDirectory {
    async fn profile(&self, user: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.users.get(user).map(|entry| entry.value().clone()))
    }
}
