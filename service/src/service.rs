//! The ledger service facade: request-scoped balance views over the store.
//!
//! Every read recomputes from source records scoped to the pair, group, or
//! user in question; nothing derived is cached or persisted, so concurrent
//! writes can never leave a stale aggregate behind.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use splitledger_common::{
    Amount, Expense, Group, GroupId, LedgerError, Result, Settlement, UserId, UserProfile,
};
use splitledger_ledger::{aggregate, group, pairwise, spending};
use splitledger_ledger::{GroupBalanceReport, MonthlySpending, UserAggregate};
use splitledger_store::{IdentityProvider, LedgerStore, MembershipProvider};

use crate::config::ServiceConfig;
use crate::writer::{ExpenseDraft, ExpenseWriter, SettlementDraft, SettlementWriter};

/// The net position between the viewer and one counterparty, with the
/// records that produced it and the counterparty's display profile.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseBalanceView {
    /// Positive means the counterparty owes the viewer.
    pub balance: Amount,
    /// Expenses shared by the two users.
    pub expenses: Vec<Expense>,
    /// Settlements between the two users.
    pub settlements: Vec<Settlement>,
    /// The counterparty.
    pub other_user: UserProfile,
}

/// A group's internal ledger with member display profiles.
#[derive(Debug, Clone, Serialize)]
pub struct GroupBalancesView {
    /// The group.
    pub group: Group,
    /// Per-member balances.
    pub report: GroupBalanceReport,
    /// Display profiles for members known to the identity provider.
    pub profiles: HashMap<UserId, UserProfile>,
}

/// A user's aggregate position with counterparty display profiles.
#[derive(Debug, Clone, Serialize)]
pub struct UserAggregateView {
    /// The aggregate balances.
    pub aggregate: UserAggregate,
    /// Display profiles for counterparties known to the identity provider.
    pub profiles: HashMap<UserId, UserProfile>,
}

/// One group's net balance from a single member's point of view.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    /// The group.
    pub group: Group,
    /// The member's net within the group; positive means the group owes them.
    pub balance: Amount,
}

/// The balance ledger service.
///
/// Reads are stateless request-scoped computations; the two writers are the
/// only mutation paths. Collaborators sit behind ports so deployments swap
/// in their own persistence, membership, and identity implementations.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    membership: Arc<dyn MembershipProvider>,
    identity: Arc<dyn IdentityProvider>,
    settlement_writer: SettlementWriter,
    expense_writer: ExpenseWriter,
}

impl LedgerService {
    /// Create a new service over the given collaborators.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        membership: Arc<dyn MembershipProvider>,
        identity: Arc<dyn IdentityProvider>,
        config: ServiceConfig,
    ) -> Self {
        let settlement_writer = SettlementWriter::new(
            store.clone(),
            membership.clone(),
            identity.clone(),
            config.clone(),
        );
        let expense_writer = ExpenseWriter::new(
            store.clone(),
            membership.clone(),
            identity.clone(),
            config,
        );

        Self {
            store,
            membership,
            identity,
            settlement_writer,
            expense_writer,
        }
    }

    /// Net balance between the viewer and one counterparty, across all
    /// shared expenses and settlements regardless of group.
    #[instrument(skip(self))]
    pub async fn pairwise_balance(
        &self,
        viewer: &UserId,
        other: &UserId,
    ) -> Result<PairwiseBalanceView> {
        self.require_user(viewer).await?;
        let other_user = self.require_user(other).await?;

        let (expenses, settlements) = tokio::try_join!(
            self.store.expenses_between(viewer, other),
            self.store.settlements_between(viewer, other),
        )?;

        let resolved = pairwise::resolve(viewer, other, &expenses, &settlements)?;
        Ok(PairwiseBalanceView {
            balance: resolved.balance,
            expenses: resolved.expenses,
            settlements: resolved.settlements,
            other_user,
        })
    }

    /// Every member's net balance within one group, with the full pairwise
    /// breakdown for settlement-flow displays.
    #[instrument(skip(self))]
    pub async fn group_balances(&self, group_id: &GroupId) -> Result<GroupBalancesView> {
        let group = self
            .membership
            .group(group_id)
            .await?
            .ok_or_else(|| LedgerError::UnknownGroup(group_id.clone()))?;

        let (expenses, settlements) = tokio::try_join!(
            self.store.expenses_for_group(group_id),
            self.store.settlements_for_group(group_id),
        )?;

        let report = group::resolve(group_id, &group.members, &expenses, &settlements)?;
        let profiles = self.profiles_for(group.members.iter()).await?;

        Ok(GroupBalancesView {
            group,
            report,
            profiles,
        })
    }

    /// One user's total balance and outstanding debts across every
    /// counterparty, peer and group-derived alike.
    #[instrument(skip(self))]
    pub async fn user_aggregate(&self, user_id: &UserId) -> Result<UserAggregateView> {
        self.require_user(user_id).await?;

        let (expenses, settlements) = tokio::try_join!(
            self.store.expenses_involving(user_id),
            self.store.settlements_involving(user_id),
        )?;

        let aggregate = aggregate::resolve(user_id, &expenses, &settlements)?;
        let counterparties = aggregate
            .owe_details
            .you_owe
            .iter()
            .chain(aggregate.owe_details.owed_to_you.iter())
            .map(|c| c.counterparty.clone())
            .collect::<Vec<_>>();
        let profiles = self.profiles_for(counterparties.iter()).await?;

        Ok(UserAggregateView {
            aggregate,
            profiles,
        })
    }

    /// Per-group net balance for every group the user belongs to.
    #[instrument(skip(self))]
    pub async fn user_groups_summary(&self, user_id: &UserId) -> Result<Vec<GroupSummary>> {
        self.require_user(user_id).await?;

        let groups = self.membership.groups_for(user_id).await?;
        let mut summaries = Vec::with_capacity(groups.len());
        for group in groups {
            let (expenses, settlements) = tokio::try_join!(
                self.store.expenses_for_group(&group.id),
                self.store.settlements_for_group(&group.id),
            )?;
            let report = group::resolve(&group.id, &group.members, &expenses, &settlements)?;
            let balance = report
                .member(user_id)
                .map(|m| m.net)
                .unwrap_or_else(Amount::zero);
            summaries.push(GroupSummary { group, balance });
        }
        Ok(summaries)
    }

    /// The user's own share of the year's expenses.
    #[instrument(skip(self))]
    pub async fn total_spent(&self, user_id: &UserId, year: i32) -> Result<Amount> {
        self.require_user(user_id).await?;
        let expenses = self.store.expenses_involving(user_id).await?;
        Ok(spending::total_spent(user_id, year, &expenses))
    }

    /// The user's own share of the year's expenses, per calendar month.
    #[instrument(skip(self))]
    pub async fn monthly_spending(
        &self,
        user_id: &UserId,
        year: i32,
    ) -> Result<Vec<MonthlySpending>> {
        self.require_user(user_id).await?;
        let expenses = self.store.expenses_involving(user_id).await?;
        Ok(spending::monthly_spending(user_id, year, &expenses))
    }

    /// Validate and record a settlement.
    pub async fn create_settlement(&self, draft: SettlementDraft) -> Result<Settlement> {
        self.settlement_writer.record(draft).await
    }

    /// Validate and record an expense.
    pub async fn create_expense(&self, draft: ExpenseDraft) -> Result<Expense> {
        self.expense_writer.record(draft).await
    }

    async fn require_user(&self, user: &UserId) -> Result<UserProfile> {
        self.identity
            .profile(user)
            .await?
            .ok_or_else(|| LedgerError::UnknownUser(user.clone()))
    }

    async fn profiles_for<'a>(
        &self,
        users: impl Iterator<Item = &'a UserId>,
    ) -> Result<HashMap<UserId, UserProfile>> {
        let mut profiles = HashMap::new();
        for user in users {
            if let Some(profile) = self.identity.profile(user).await? {
                profiles.insert(user.clone(), profile);
            }
        }
        Ok(profiles)
    }
}
