//! Settlement and expense writers: the only mutation paths into the store.
//!
//! Each write is a single-record append validated up front; there is no
//! derived state to invalidate afterwards, so failure is all-or-nothing at
//! the store boundary.

use std::sync::Arc;

use tracing::{info, instrument};

use splitledger_common::{
    Amount, Expense, GroupId, LedgerError, Result, Settlement, UserId,
};
use splitledger_ledger::split::{self, SplitSpec};
use splitledger_store::{IdentityProvider, LedgerStore, MembershipProvider};

use crate::config::ServiceConfig;

/// A settlement awaiting validation and recording.
#[derive(Debug, Clone)]
pub struct SettlementDraft {
    /// Amount paid; must be positive.
    pub amount: Amount,
    /// Optional free-form note.
    pub note: Option<String>,
    /// The paying user.
    pub paid_by: UserId,
    /// The receiving user.
    pub received_by: UserId,
    /// Group debt context this payment reduces, if any.
    pub group_id: Option<GroupId>,
}

impl SettlementDraft {
    /// Create a draft with the required fields.
    pub fn new(amount: Amount, paid_by: UserId, received_by: UserId) -> Self {
        Self {
            amount,
            note: None,
            paid_by,
            received_by,
            group_id: None,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Scope the settlement to a group debt.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// An expense awaiting validation and recording.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    /// Human-readable description.
    pub description: String,
    /// Total amount; must be positive.
    pub amount: Amount,
    /// The user who fronted the money.
    pub paid_by: UserId,
    /// Group this expense belongs to, if any.
    pub group_id: Option<GroupId>,
    /// How to divide the total.
    pub split: SplitSpec,
}

impl ExpenseDraft {
    /// Create a draft with the required fields.
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        paid_by: UserId,
        split: SplitSpec,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            paid_by,
            group_id: None,
            split,
        }
    }

    /// Scope the expense to a group.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// Validates and records settlements.
pub struct SettlementWriter {
    store: Arc<dyn LedgerStore>,
    membership: Arc<dyn MembershipProvider>,
    identity: Arc<dyn IdentityProvider>,
    config: ServiceConfig,
}

impl SettlementWriter {
    /// Create a new writer.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        membership: Arc<dyn MembershipProvider>,
        identity: Arc<dyn IdentityProvider>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            membership,
            identity,
            config,
        }
    }

    /// Validate and append a settlement record.
    #[instrument(skip(self, draft), fields(payer = %draft.paid_by, receiver = %draft.received_by))]
    pub async fn record(&self, draft: SettlementDraft) -> Result<Settlement> {
        if !draft.amount.is_positive() {
            return Err(LedgerError::invalid_settlement("amount must be positive"));
        }
        if draft.paid_by == draft.received_by {
            return Err(LedgerError::invalid_settlement(
                "payer and receiver must differ",
            ));
        }
        if let Some(note) = &draft.note {
            if note.len() > self.config.max_note_length {
                return Err(LedgerError::invalid_settlement(format!(
                    "note exceeds {} characters",
                    self.config.max_note_length
                )));
            }
        }

        require_user(self.identity.as_ref(), &draft.paid_by).await?;
        require_user(self.identity.as_ref(), &draft.received_by).await?;

        if let Some(group_id) = &draft.group_id {
            require_members(
                self.membership.as_ref(),
                group_id,
                [&draft.paid_by, &draft.received_by],
            )
            .await?;
        }

        let settlement = Settlement::new(
            draft.amount,
            draft.note,
            draft.paid_by,
            draft.received_by,
            draft.group_id,
        );
        self.store.insert_settlement(settlement.clone()).await?;

        info!(
            settlement_id = %settlement.id,
            amount = %settlement.amount,
            "Settlement recorded"
        );
        Ok(settlement)
    }
}

/// Validates and records expenses.
pub struct ExpenseWriter {
    store: Arc<dyn LedgerStore>,
    membership: Arc<dyn MembershipProvider>,
    identity: Arc<dyn IdentityProvider>,
    config: ServiceConfig,
}

impl ExpenseWriter {
    /// Create a new writer.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        membership: Arc<dyn MembershipProvider>,
        identity: Arc<dyn IdentityProvider>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            membership,
            identity,
            config,
        }
    }

    /// Validate and append an expense record.
    ///
    /// Shares are built from the draft's split spec and the sum invariant is
    /// re-checked on the assembled record, so a malformed expense is rejected
    /// before anything is persisted.
    #[instrument(skip(self, draft), fields(payer = %draft.paid_by))]
    pub async fn record(&self, draft: ExpenseDraft) -> Result<Expense> {
        if draft.description.trim().is_empty() {
            return Err(LedgerError::invalid_expense("description is required"));
        }
        if draft.description.len() > self.config.max_description_length {
            return Err(LedgerError::invalid_expense(format!(
                "description exceeds {} characters",
                self.config.max_description_length
            )));
        }

        let shares = split::build_shares(draft.amount, &draft.split, self.config.minor_unit_scale)?;
        if shares.len() > self.config.max_participants {
            return Err(LedgerError::invalid_expense(format!(
                "participant count exceeds {}",
                self.config.max_participants
            )));
        }

        require_user(self.identity.as_ref(), &draft.paid_by).await?;
        for share in &shares {
            require_user(self.identity.as_ref(), &share.user_id).await?;
        }

        if let Some(group_id) = &draft.group_id {
            let participants =
                std::iter::once(&draft.paid_by).chain(shares.iter().map(|s| &s.user_id));
            require_members(self.membership.as_ref(), group_id, participants).await?;
        }

        let expense = Expense::new(
            draft.description,
            draft.amount,
            draft.paid_by,
            draft.group_id,
            draft.split.strategy(),
            shares,
        );
        split::validate_shares(&expense)?;
        self.store.insert_expense(expense.clone()).await?;

        info!(
            expense_id = %expense.id,
            amount = %expense.amount,
            participants = expense.participant_count(),
            "Expense recorded"
        );
        Ok(expense)
    }
}

async fn require_user(identity: &dyn IdentityProvider, user: &UserId) -> Result<()> {
    identity
        .profile(user)
        .await?
        .map(|_| ())
        .ok_or_else(|| LedgerError::UnknownUser(user.clone()))
}

async fn require_members<'a>(
    membership: &dyn MembershipProvider,
    group_id: &GroupId,
    users: impl IntoIterator<Item = &'a UserId>,
) -> Result<()> {
    membership
        .group(group_id)
        .await?
        .ok_or_else(|| LedgerError::UnknownGroup(group_id.clone()))?;

    for user in users {
        if !membership.is_member(user, group_id).await? {
            return Err(LedgerError::MembershipMismatch {
                user: user.clone(),
                group: group_id.clone(),
            });
        }
    }
    Ok(())
}
