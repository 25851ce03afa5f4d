//! End-to-end tests for the ledger service over the in-memory store.

use std::sync::Arc;

use rust_decimal_macros::dec;

use splitledger_common::{Amount, Group, GroupId, LedgerError, UserId, UserProfile};
use splitledger_ledger::split::{PercentageWeight, SplitSpec};
use splitledger_service::{ExpenseDraft, LedgerService, ServiceConfig, SettlementDraft};
use splitledger_store::{MemoryDirectory, MemoryStore};

fn user(id: &str) -> UserId {
    UserId::new(id)
}

fn service_with_users(ids: &[&str]) -> (LedgerService, Arc<MemoryDirectory>) {
    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(MemoryDirectory::new());
    for id in ids {
        directory.upsert_user(UserProfile::new(user(id), id.to_uppercase()));
    }
    let service = LedgerService::new(
        store,
        directory.clone(),
        directory.clone(),
        ServiceConfig::default(),
    );
    (service, directory)
}

fn equal_split(participants: &[&str]) -> SplitSpec {
    SplitSpec::Equal {
        participants: participants.iter().map(|p| user(p)).collect(),
    }
}

#[tokio::test]
async fn test_equal_dinner_then_settlement() {
    let (service, _) = service_with_users(&["p1", "p2", "p3"]);

    service
        .create_expense(ExpenseDraft::new(
            "Dinner",
            Amount::from_major(300),
            user("p1"),
            equal_split(&["p1", "p2", "p3"]),
        ))
        .await
        .unwrap();

    let p1_p2 = service
        .pairwise_balance(&user("p1"), &user("p2"))
        .await
        .unwrap();
    assert_eq!(p1_p2.balance, Amount::from_major(100));
    assert_eq!(p1_p2.other_user.name, "P2");

    let p1_p3 = service
        .pairwise_balance(&user("p1"), &user("p3"))
        .await
        .unwrap();
    assert_eq!(p1_p3.balance, Amount::from_major(100));

    service
        .create_settlement(SettlementDraft::new(
            Amount::from_major(100),
            user("p2"),
            user("p1"),
        ))
        .await
        .unwrap();

    let p1_p2 = service
        .pairwise_balance(&user("p1"), &user("p2"))
        .await
        .unwrap();
    assert_eq!(p1_p2.balance, Amount::zero());
    assert_eq!(p1_p2.settlements.len(), 1);
}

#[tokio::test]
async fn test_four_member_group_balances() {
    let (service, directory) = service_with_users(&["m1", "m2", "m3", "m4"]);
    let group_id = GroupId::new("trip");
    directory.upsert_group(Group::new(
        group_id.clone(),
        "Goa Trip",
        vec![user("m1"), user("m2"), user("m3"), user("m4")],
    ));

    service
        .create_expense(
            ExpenseDraft::new(
                "Villa",
                Amount::from_major(400),
                user("m1"),
                equal_split(&["m1", "m2", "m3", "m4"]),
            )
            .with_group(group_id.clone()),
        )
        .await
        .unwrap();

    let view = service.group_balances(&group_id).await.unwrap();
    let report = &view.report;

    assert_eq!(
        report.member(&user("m1")).unwrap().net,
        Amount::from_major(300)
    );
    for member in ["m2", "m3", "m4"] {
        assert_eq!(
            report.member(&user(member)).unwrap().net,
            Amount::from_major(-100)
        );
    }
    assert_eq!(report.net_sum(), Amount::zero());
    assert_eq!(view.profiles.len(), 4);
}

#[tokio::test]
async fn test_group_ledger_ignores_personal_records() {
    let (service, directory) = service_with_users(&["m1", "m2"]);
    let group_id = GroupId::new("flat");
    directory.upsert_group(Group::new(
        group_id.clone(),
        "Flatmates",
        vec![user("m1"), user("m2")],
    ));

    service
        .create_expense(
            ExpenseDraft::new(
                "Rent",
                Amount::from_major(100),
                user("m1"),
                equal_split(&["m1", "m2"]),
            )
            .with_group(group_id.clone()),
        )
        .await
        .unwrap();

    // A personal expense and settlement between the same two users.
    service
        .create_expense(ExpenseDraft::new(
            "Movie",
            Amount::from_major(80),
            user("m2"),
            equal_split(&["m1", "m2"]),
        ))
        .await
        .unwrap();
    service
        .create_settlement(SettlementDraft::new(
            Amount::from_major(40),
            user("m1"),
            user("m2"),
        ))
        .await
        .unwrap();

    // Group view only sees the rent.
    let view = service.group_balances(&group_id).await.unwrap();
    assert_eq!(
        view.report.member(&user("m1")).unwrap().net,
        Amount::from_major(50)
    );

    // Pairwise view nets everything: +50 rent, -40 movie, +40 settlement.
    let pair = service
        .pairwise_balance(&user("m1"), &user("m2"))
        .await
        .unwrap();
    assert_eq!(pair.balance, Amount::from_major(50));
}

#[tokio::test]
async fn test_user_aggregate_and_groups_summary() {
    let (service, directory) = service_with_users(&["p1", "p2", "p3"]);
    let group_id = GroupId::new("trip");
    directory.upsert_group(Group::new(
        group_id.clone(),
        "Trip",
        vec![user("p1"), user("p2")],
    ));

    service
        .create_expense(
            ExpenseDraft::new(
                "Hotel",
                Amount::from_major(200),
                user("p1"),
                equal_split(&["p1", "p2"]),
            )
            .with_group(group_id.clone()),
        )
        .await
        .unwrap();
    service
        .create_expense(ExpenseDraft::new(
            "Groceries",
            Amount::from_major(90),
            user("p3"),
            equal_split(&["p1", "p3"]),
        ))
        .await
        .unwrap();

    let view = service.user_aggregate(&user("p1")).await.unwrap();
    let aggregate = &view.aggregate;

    // p2 owes 100; p1 owes p3 45.
    assert_eq!(aggregate.total_balance, Amount::from_major(55));
    assert_eq!(aggregate.owe_details.owed_to_you.len(), 1);
    assert_eq!(aggregate.owe_details.owed_to_you[0].counterparty, user("p2"));
    assert_eq!(aggregate.owe_details.you_owe.len(), 1);
    assert_eq!(aggregate.owe_details.you_owe[0].amount, Amount::from_major(45));
    assert!(view.profiles.contains_key(&user("p2")));

    let summaries = service.user_groups_summary(&user("p1")).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].group.id, group_id);
    assert_eq!(summaries[0].balance, Amount::from_major(100));
}

#[tokio::test]
async fn test_percentage_expense_records_exact_shares() {
    let (service, _) = service_with_users(&["p1", "p2"]);

    let expense = service
        .create_expense(ExpenseDraft::new(
            "Consulting dinner",
            Amount::from_major(150),
            user("p1"),
            SplitSpec::Percentage {
                weights: vec![
                    PercentageWeight::new(user("p1"), dec!(60)),
                    PercentageWeight::new(user("p2"), dec!(40)),
                ],
            },
        ))
        .await
        .unwrap();

    let share_sum: Amount = expense.shares.iter().map(|s| s.amount).sum();
    assert_eq!(share_sum, expense.amount);

    let pair = service
        .pairwise_balance(&user("p1"), &user("p2"))
        .await
        .unwrap();
    assert_eq!(pair.balance.value(), dec!(60));
}

#[tokio::test]
async fn test_settlement_validation() {
    let (service, _) = service_with_users(&["p1", "p2"]);

    let err = service
        .create_settlement(SettlementDraft::new(
            Amount::zero(),
            user("p1"),
            user("p2"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSettlement { .. }));

    let err = service
        .create_settlement(SettlementDraft::new(
            Amount::from_major(10),
            user("p1"),
            user("p1"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSettlement { .. }));

    let err = service
        .create_settlement(SettlementDraft::new(
            Amount::from_major(10),
            user("p1"),
            user("ghost"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnknownUser(_)));
}

#[tokio::test]
async fn test_group_settlement_requires_membership() {
    let (service, directory) = service_with_users(&["m1", "m2", "outsider"]);
    let group_id = GroupId::new("trip");
    directory.upsert_group(Group::new(
        group_id.clone(),
        "Trip",
        vec![user("m1"), user("m2")],
    ));

    let err = service
        .create_settlement(
            SettlementDraft::new(Amount::from_major(10), user("m1"), user("outsider"))
                .with_group(group_id.clone()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MembershipMismatch { .. }));

    let err = service
        .create_settlement(
            SettlementDraft::new(Amount::from_major(10), user("m1"), user("m2"))
                .with_group(GroupId::new("missing")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnknownGroup(_)));
}

#[tokio::test]
async fn test_expense_validation() {
    let (service, _) = service_with_users(&["p1", "p2"]);

    let err = service
        .create_expense(ExpenseDraft::new(
            "",
            Amount::from_major(100),
            user("p1"),
            equal_split(&["p1", "p2"]),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidExpense { .. }));

    let err = service
        .create_expense(ExpenseDraft::new(
            "Nothing",
            Amount::zero(),
            user("p1"),
            equal_split(&["p1", "p2"]),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidExpense { .. }));

    let err = service
        .create_expense(ExpenseDraft::new(
            "Ghost dinner",
            Amount::from_major(100),
            user("p1"),
            equal_split(&["p1", "ghost"]),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnknownUser(_)));

    // Exact shares that do not reach the total are rejected pre-insert.
    let err = service
        .create_expense(ExpenseDraft::new(
            "Drifted",
            Amount::from_major(100),
            user("p1"),
            SplitSpec::Exact {
                shares: vec![
                    splitledger_common::ExpenseShare::new(user("p1"), Amount::from_major(30)),
                    splitledger_common::ExpenseShare::new(user("p2"), Amount::from_major(30)),
                ],
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvariantViolation { .. }));

    let aggregate = service.user_aggregate(&user("p1")).await.unwrap();
    assert_eq!(aggregate.aggregate.total_balance, Amount::zero());
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let (service, _) = service_with_users(&["p1", "p2", "p3"]);

    service
        .create_expense(ExpenseDraft::new(
            "Dinner",
            Amount::from_major(301),
            user("p1"),
            equal_split(&["p1", "p2", "p3"]),
        ))
        .await
        .unwrap();

    let first = service.user_aggregate(&user("p1")).await.unwrap();
    let second = service.user_aggregate(&user("p1")).await.unwrap();
    assert_eq!(first.aggregate, second.aggregate);

    let pair_first = service
        .pairwise_balance(&user("p1"), &user("p2"))
        .await
        .unwrap();
    let pair_second = service
        .pairwise_balance(&user("p1"), &user("p2"))
        .await
        .unwrap();
    assert_eq!(pair_first.balance, pair_second.balance);
}

#[tokio::test]
async fn test_spending_summaries() {
    let (service, _) = service_with_users(&["p1", "p2"]);

    service
        .create_expense(ExpenseDraft::new(
            "Lunch",
            Amount::from_major(80),
            user("p2"),
            equal_split(&["p1", "p2"]),
        ))
        .await
        .unwrap();

    let year = {
        use chrono::Datelike;
        chrono::Utc::now().year()
    };
    let spent = service.total_spent(&user("p1"), year).await.unwrap();
    assert_eq!(spent, Amount::from_major(40));

    let months = service.monthly_spending(&user("p1"), year).await.unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].total, Amount::from_major(40));

    assert_eq!(
        service.total_spent(&user("p1"), year - 1).await.unwrap(),
        Amount::zero()
    );
}
