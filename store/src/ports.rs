//! Ports to the external persistence, membership, and identity collaborators.

use async_trait::async_trait;

use splitledger_common::{Expense, Group, GroupId, Result, Settlement, UserId, UserProfile};

/// Append/query store for ledger records.
///
/// Records are immutable once inserted; there is no update or delete.
/// Implementations must provide read-after-write consistency: once an insert
/// returns, every subsequent query by any caller observes the record.
/// Transient failures are retried (with backoff) inside the implementation,
/// never by the callers folding balances.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append an expense record.
    async fn insert_expense(&self, expense: Expense) -> Result<()>;

    /// Append a settlement record.
    async fn insert_settlement(&self, settlement: Settlement) -> Result<()>;

    /// Every expense the user paid for or holds a share in.
    async fn expenses_involving(&self, user: &UserId) -> Result<Vec<Expense>>;

    /// Every expense involving both users, group-tagged or not.
    async fn expenses_between(&self, a: &UserId, b: &UserId) -> Result<Vec<Expense>>;

    /// Every expense tagged with the group.
    async fn expenses_for_group(&self, group: &GroupId) -> Result<Vec<Expense>>;

    /// Every settlement the user paid or received.
    async fn settlements_involving(&self, user: &UserId) -> Result<Vec<Settlement>>;

    /// Every settlement between the two users, in either direction.
    async fn settlements_between(&self, a: &UserId, b: &UserId) -> Result<Vec<Settlement>>;

    /// Every settlement tagged with the group.
    async fn settlements_for_group(&self, group: &GroupId) -> Result<Vec<Settlement>>;
}

/// Group membership oracle. Membership administration happens elsewhere; the
/// ledger core only asks questions.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Look up a group and its member set.
    async fn group(&self, group: &GroupId) -> Result<Option<Group>>;

    /// Check whether the user belongs to the group.
    async fn is_member(&self, user: &UserId, group: &GroupId) -> Result<bool>;

    /// Every group the user belongs to.
    async fn groups_for(&self, user: &UserId) -> Result<Vec<Group>>;
}

/// Identity lookup, used only to enrich output with display attributes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up a user's display profile.
    async fn profile(&self, user: &UserId) -> Result<Option<UserProfile>>;
}
