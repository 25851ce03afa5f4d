//! Ledger record types: expenses, settlements, and their participants.
//!
//! Records are append-only. Balances are never stored; every balance view is
//! re-derived from these records at read time.

use crate::{Amount, ExpenseId, GroupId, SettlementId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// The rule used to divide an expense's total among its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitStrategy {
    /// Total divided evenly, remainder assigned deterministically.
    Equal,
    /// Caller-supplied amount per participant.
    Exact,
    /// Caller-supplied percentage weight per participant.
    Percentage,
}

/// One participant's share of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseShare {
    /// The participant this share belongs to.
    pub user_id: UserId,
    /// The amount of the total this participant is responsible for.
    pub amount: Amount,
}

impl ExpenseShare {
    /// Create a new share.
    pub fn new(user_id: UserId, amount: Amount) -> Self {
        Self { user_id, amount }
    }
}

/// A recorded shared expense. Immutable after creation.
///
/// Invariant: `shares` is non-empty, share users are distinct, and the share
/// amounts sum to `amount` within the rounding tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique expense identifier.
    pub id: ExpenseId,
    /// Human-readable description.
    pub description: String,
    /// Total amount of the expense.
    pub amount: Amount,
    /// The user who fronted the money.
    pub paid_by: UserId,
    /// Group this expense belongs to; `None` for a peer-to-peer expense.
    pub group_id: Option<GroupId>,
    /// How the total was divided.
    pub split_strategy: SplitStrategy,
    /// Materialized per-participant shares.
    pub shares: Vec<ExpenseShare>,
    /// When the expense was recorded.
    pub created_at: Timestamp,
}

impl Expense {
    /// Create a new expense record.
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        paid_by: UserId,
        group_id: Option<GroupId>,
        split_strategy: SplitStrategy,
        shares: Vec<ExpenseShare>,
    ) -> Self {
        Self {
            id: ExpenseId::new(),
            description: description.into(),
            amount,
            paid_by,
            group_id,
            split_strategy,
            shares,
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check whether the user paid for or holds a share of this expense.
    pub fn involves(&self, user: &UserId) -> bool {
        self.paid_by == *user || self.shares.iter().any(|s| s.user_id == *user)
    }

    /// The user's own share of the total; zero when they hold none.
    pub fn share_of(&self, user: &UserId) -> Amount {
        self.shares
            .iter()
            .find(|s| s.user_id == *user)
            .map(|s| s.amount)
            .unwrap_or_else(Amount::zero)
    }

    /// Number of participants holding a share.
    pub fn participant_count(&self) -> usize {
        self.shares.len()
    }

    /// Check whether this expense is tagged with the given group.
    pub fn in_group(&self, group: &GroupId) -> bool {
        self.group_id.as_ref() == Some(group)
    }
}

/// A recorded direct payment between two users. Immutable after creation.
///
/// Invariant: `paid_by != received_by` and `amount > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique settlement identifier.
    pub id: SettlementId,
    /// Amount paid.
    pub amount: Amount,
    /// Optional free-form note.
    pub note: Option<String>,
    /// The user who paid.
    pub paid_by: UserId,
    /// The user who received the payment.
    pub received_by: UserId,
    /// Group debt context this payment reduces; `None` for a peer debt.
    pub group_id: Option<GroupId>,
    /// When the settlement was recorded.
    pub created_at: Timestamp,
}

impl Settlement {
    /// Create a new settlement record.
    pub fn new(
        amount: Amount,
        note: Option<String>,
        paid_by: UserId,
        received_by: UserId,
        group_id: Option<GroupId>,
    ) -> Self {
        Self {
            id: SettlementId::new(),
            amount,
            note,
            paid_by,
            received_by,
            group_id,
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check whether the user is the payer or the receiver.
    pub fn involves(&self, user: &UserId) -> bool {
        self.paid_by == *user || self.received_by == *user
    }

    /// Check whether this settlement is between the two given users,
    /// in either direction.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (self.paid_by == *a && self.received_by == *b)
            || (self.paid_by == *b && self.received_by == *a)
    }

    /// Check whether this settlement is tagged with the given group.
    pub fn in_group(&self, group: &GroupId) -> bool {
        self.group_id.as_ref() == Some(group)
    }
}

/// Display attributes for a user, supplied by the identity provider.
/// Used only to enrich output, never for balance math.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address, if known.
    pub email: Option<String>,
    /// Avatar image URL, if known.
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Create a new profile.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            avatar_url: None,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the avatar URL.
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// A group of users sharing expenses.
///
/// The member set is owned by the membership subsystem and treated as given
/// input per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique group identifier.
    pub id: GroupId,
    /// Group name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered member list.
    pub members: Vec<UserId>,
}

impl Group {
    /// Create a new group.
    pub fn new(id: GroupId, name: impl Into<String>, members: Vec<UserId>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            members,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check whether the user belongs to this group.
    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }
}
