//! Scenario generation and execution.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use splitledger_common::{Amount, ExpenseShare, Group, GroupId, UserId, UserProfile};
use splitledger_ledger::split::{PercentageWeight, SplitSpec};
use splitledger_service::{ExpenseDraft, LedgerService, ServiceConfig, SettlementDraft};
use splitledger_store::{MemoryDirectory, MemoryStore};

/// Scenario parameters.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of users.
    pub users: usize,
    /// Number of groups.
    pub groups: usize,
    /// Number of expenses to record.
    pub expenses: usize,
    /// Number of settlements to record.
    pub settlements: usize,
    /// Seed for the generator.
    pub seed: u64,
}

/// Results of one simulation run.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    /// Seed the run was generated from.
    pub seed: u64,
    /// Expenses accepted by the writer.
    pub expenses_recorded: usize,
    /// Settlements accepted by the writer.
    pub settlements_recorded: usize,
    /// Groups whose ledgers were verified to net to zero.
    pub groups_verified: usize,
    /// Sum of every user's positive aggregate balance.
    pub total_outstanding: Amount,
}

/// Generate a scenario, push it through the service, and verify the
/// resulting balance views.
pub async fn run(config: ScenarioConfig) -> anyhow::Result<ScenarioReport> {
    anyhow::ensure!(config.users >= 2, "at least two users are required");

    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(MemoryDirectory::new());
    let service = LedgerService::new(
        store,
        directory.clone(),
        directory.clone(),
        ServiceConfig::default(),
    );

    let mut rng = StdRng::seed_from_u64(config.seed);

    let users: Vec<UserId> = (0..config.users)
        .map(|i| UserId::new(format!("user-{i:02}")))
        .collect();
    for (i, user) in users.iter().enumerate() {
        directory.upsert_user(
            UserProfile::new(user.clone(), format!("User {i:02}"))
                .with_email(format!("user{i:02}@example.com")),
        );
    }

    let groups: Vec<Group> = (0..config.groups)
        .map(|i| {
            let mut members = users.clone();
            members.shuffle(&mut rng);
            let size = rng.gen_range(2..=members.len());
            members.truncate(size);
            Group::new(
                GroupId::new(format!("group-{i:02}")),
                format!("Group {i:02}"),
                members,
            )
        })
        .collect();
    for group in &groups {
        directory.upsert_group(group.clone());
    }

    let mut expenses_recorded = 0;
    for n in 0..config.expenses {
        let draft = random_expense(&mut rng, n, &users, &groups);
        service.create_expense(draft).await?;
        expenses_recorded += 1;
    }

    let mut settlements_recorded = 0;
    for _ in 0..config.settlements {
        let payer = users[rng.gen_range(0..users.len())].clone();
        let receiver = loop {
            let candidate = users[rng.gen_range(0..users.len())].clone();
            if candidate != payer {
                break candidate;
            }
        };
        let amount = Amount::from_minor_units(rng.gen_range(100..50_000), 2);
        let mut draft = SettlementDraft::new(amount, payer, receiver);
        if rng.gen_bool(0.5) {
            if let Some(group) = groups
                .iter()
                .find(|g| g.is_member(&draft.paid_by) && g.is_member(&draft.received_by))
            {
                draft = draft.with_group(group.id.clone());
            }
        }
        service.create_settlement(draft).await?;
        settlements_recorded += 1;
    }

    let mut groups_verified = 0;
    for group in &groups {
        let view = service.group_balances(&group.id).await?;
        let net_sum = view.report.net_sum();
        anyhow::ensure!(
            net_sum.is_zero(),
            "group {} nets sum to {net_sum}, expected zero",
            group.id
        );
        debug!(
            group_id = %group.id,
            members = view.report.members.len(),
            "Group ledger balanced"
        );
        groups_verified += 1;
    }

    let mut total_outstanding = Amount::zero();
    for user in &users {
        let view = service.user_aggregate(user).await?;
        if view.aggregate.total_balance.is_positive() {
            total_outstanding += view.aggregate.total_balance;
        }
        let _ = service.user_groups_summary(user).await?;
    }

    let forward = service.pairwise_balance(&users[0], &users[1]).await?;
    let backward = service.pairwise_balance(&users[1], &users[0]).await?;
    anyhow::ensure!(
        forward.balance == -backward.balance,
        "pairwise balances disagree between viewpoints"
    );

    info!(
        expenses = expenses_recorded,
        settlements = settlements_recorded,
        "Scenario complete"
    );

    Ok(ScenarioReport {
        seed: config.seed,
        expenses_recorded,
        settlements_recorded,
        groups_verified,
        total_outstanding,
    })
}

fn random_expense(
    rng: &mut StdRng,
    n: usize,
    users: &[UserId],
    groups: &[Group],
) -> ExpenseDraft {
    // Roughly half the expenses land in a group when one exists.
    let group = if !groups.is_empty() && rng.gen_bool(0.5) {
        Some(groups[rng.gen_range(0..groups.len())].clone())
    } else {
        None
    };
    let pool: &[UserId] = group.as_ref().map(|g| g.members.as_slice()).unwrap_or(users);

    let mut participants = pool.to_vec();
    participants.shuffle(rng);
    let size = rng.gen_range(2..=participants.len().min(5));
    participants.truncate(size);
    let payer = participants[rng.gen_range(0..participants.len())].clone();

    let total_minor: i64 = rng.gen_range(500..200_000);
    let total = Amount::from_minor_units(total_minor, 2);

    let split = match rng.gen_range(0..3) {
        0 => SplitSpec::Equal {
            participants: participants.clone(),
        },
        1 => {
            let cuts = partition(rng, total_minor, participants.len());
            SplitSpec::Exact {
                shares: participants
                    .iter()
                    .zip(cuts)
                    .map(|(user, minor)| {
                        ExpenseShare::new(user.clone(), Amount::from_minor_units(minor, 2))
                    })
                    .collect(),
            }
        }
        _ => {
            let cuts = partition(rng, 100, participants.len());
            SplitSpec::Percentage {
                weights: participants
                    .iter()
                    .zip(cuts)
                    .map(|(user, percent)| {
                        PercentageWeight::new(user.clone(), Decimal::from(percent))
                    })
                    .collect(),
            }
        }
    };

    let mut draft = ExpenseDraft::new(format!("expense-{n:03}"), total, payer, split);
    if let Some(group) = group {
        draft = draft.with_group(group.id);
    }
    draft
}

/// Split `total` into `parts` non-negative integers that sum to it exactly.
fn partition(rng: &mut StdRng, total: i64, parts: usize) -> Vec<i64> {
    let mut cuts: Vec<i64> = (0..parts - 1).map(|_| rng.gen_range(0..=total)).collect();
    cuts.sort_unstable();
    let mut result = Vec::with_capacity(parts);
    let mut prev = 0;
    for cut in cuts {
        result.push(cut - prev);
        prev = cut;
    }
    result.push(total - prev);
    result
}
