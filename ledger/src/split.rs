//! Split resolution: from a split strategy to per-participant shares and
//! signed contributions.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use splitledger_common::{
    Amount, Expense, ExpenseShare, LedgerError, Result, SplitStrategy, UserId,
};

/// Tolerance when validating that share amounts sum to an expense total:
/// one hundredth of a unit per share, absorbing rounding in caller input.
pub fn share_sum_tolerance(share_count: usize) -> Amount {
    Amount::from_minor_units(share_count as i64, 2)
}

/// A participant's weight in a percentage split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentageWeight {
    /// The participant.
    pub user_id: UserId,
    /// Percentage of the total, 0-100.
    pub percent: Decimal,
}

impl PercentageWeight {
    /// Create a new weight.
    pub fn new(user_id: UserId, percent: Decimal) -> Self {
        Self { user_id, percent }
    }
}

/// Caller input describing how an expense total should be divided.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitSpec {
    /// Divide the total evenly among the participants.
    Equal { participants: Vec<UserId> },
    /// Use the given amount for each participant.
    Exact { shares: Vec<ExpenseShare> },
    /// Divide by percentage weight; weights must sum to exactly 100.
    Percentage { weights: Vec<PercentageWeight> },
}

impl SplitSpec {
    /// The strategy tag recorded on expenses built from this spec.
    pub fn strategy(&self) -> SplitStrategy {
        match self {
            SplitSpec::Equal { .. } => SplitStrategy::Equal,
            SplitSpec::Exact { .. } => SplitStrategy::Exact,
            SplitSpec::Percentage { .. } => SplitStrategy::Percentage,
        }
    }

    /// The participants named by this spec.
    pub fn participants(&self) -> Vec<&UserId> {
        match self {
            SplitSpec::Equal { participants } => participants.iter().collect(),
            SplitSpec::Exact { shares } => shares.iter().map(|s| &s.user_id).collect(),
            SplitSpec::Percentage { weights } => weights.iter().map(|w| &w.user_id).collect(),
        }
    }

    /// Number of participants named by this spec.
    pub fn participant_count(&self) -> usize {
        self.participants().len()
    }
}

/// Build materialized shares from a split spec.
///
/// Rounding remainders are distributed one unit (at `unit_scale`) at a time
/// to the first participants in ascending user-id order, so recomputing over
/// the same input always yields identical shares and the shares always sum
/// to the total exactly.
pub fn build_shares(
    total: Amount,
    spec: &SplitSpec,
    unit_scale: u32,
) -> Result<Vec<ExpenseShare>> {
    if !total.is_positive() {
        return Err(LedgerError::invalid_expense("total must be positive"));
    }
    if !total.fits_unit(unit_scale) {
        return Err(LedgerError::invalid_expense(format!(
            "total {total} is not representable at unit scale {unit_scale}"
        )));
    }
    check_participants(&spec.participants())?;

    match spec {
        SplitSpec::Equal { participants } => {
            let mut ordered = participants.clone();
            ordered.sort();
            Ok(split_even(total, ordered, unit_scale))
        }
        SplitSpec::Exact { shares } => {
            if shares.iter().any(|s| s.amount.is_negative()) {
                return Err(LedgerError::invalid_expense(
                    "share amounts must not be negative",
                ));
            }
            let share_sum: Amount = shares.iter().map(|s| s.amount).sum();
            if (share_sum - total).abs() > share_sum_tolerance(shares.len()) {
                return Err(LedgerError::InvariantViolation { total, share_sum });
            }
            Ok(shares.clone())
        }
        SplitSpec::Percentage { weights } => {
            if weights.iter().any(|w| w.percent < Decimal::ZERO) {
                return Err(LedgerError::invalid_expense(
                    "percentage weights must not be negative",
                ));
            }
            let weight_sum: Decimal = weights.iter().map(|w| w.percent).sum();
            if weight_sum != Decimal::ONE_HUNDRED {
                return Err(LedgerError::invalid_expense(format!(
                    "percentage weights sum to {weight_sum}, expected 100"
                )));
            }

            let mut ordered = weights.clone();
            ordered.sort_by(|a, b| a.user_id.cmp(&b.user_id));

            let mut shares: Vec<ExpenseShare> = ordered
                .into_iter()
                .map(|w| {
                    let raw = Amount::new(total.value() * w.percent / Decimal::ONE_HUNDRED);
                    ExpenseShare::new(w.user_id, raw.floor_to_unit(unit_scale))
                })
                .collect();
            let allocated: Amount = shares.iter().map(|s| s.amount).sum();
            distribute_remainder(&mut shares, total - allocated, unit_scale);
            Ok(shares)
        }
    }
}

/// Validate a stored expense's share invariants: shares are present, each
/// participant appears once, and the amounts sum to the total within
/// tolerance. A failure indicates a caller bug upstream and is never retried.
pub fn validate_shares(expense: &Expense) -> Result<()> {
    let users: Vec<&UserId> = expense.shares.iter().map(|s| &s.user_id).collect();
    check_participants(&users)?;

    let share_sum: Amount = expense.shares.iter().map(|s| s.amount).sum();
    if (share_sum - expense.amount).abs() > share_sum_tolerance(expense.shares.len()) {
        return Err(LedgerError::InvariantViolation {
            total: expense.amount,
            share_sum,
        });
    }
    Ok(())
}

/// Resolve an expense into signed contributions per participant.
///
/// The payer's contribution is the net amount fronted on behalf of others
/// (`total - own share`, own share zero when the payer holds none); every
/// other participant's contribution is the negated share they owe the payer.
pub fn resolve(expense: &Expense) -> Result<BTreeMap<UserId, Amount>> {
    validate_shares(expense)?;

    let mut contributions = BTreeMap::new();
    for share in &expense.shares {
        if share.user_id != expense.paid_by {
            contributions.insert(share.user_id.clone(), -share.amount);
        }
    }
    let own_share = expense.share_of(&expense.paid_by);
    contributions.insert(expense.paid_by.clone(), expense.amount - own_share);

    debug!(
        expense_id = %expense.id,
        participants = contributions.len(),
        "Resolved expense contributions"
    );
    Ok(contributions)
}

fn check_participants(users: &[&UserId]) -> Result<()> {
    if users.is_empty() {
        return Err(LedgerError::invalid_expense(
            "at least one participant is required",
        ));
    }
    let mut seen = BTreeSet::new();
    for user in users {
        if !seen.insert(*user) {
            return Err(LedgerError::invalid_expense(format!(
                "duplicate participant: {user}"
            )));
        }
    }
    Ok(())
}

fn split_even(total: Amount, participants: Vec<UserId>, unit_scale: u32) -> Vec<ExpenseShare> {
    let count = Decimal::from(participants.len() as u64);
    let base = Amount::new(total.value() / count).floor_to_unit(unit_scale);
    let mut shares: Vec<ExpenseShare> = participants
        .into_iter()
        .map(|user_id| ExpenseShare::new(user_id, base))
        .collect();
    distribute_remainder(&mut shares, total - base * count, unit_scale);
    shares
}

fn distribute_remainder(shares: &mut [ExpenseShare], mut leftover: Amount, unit_scale: u32) {
    let unit = Amount::unit(unit_scale);
    for share in shares.iter_mut() {
        if leftover < unit {
            break;
        }
        share.amount += unit;
        leftover -= unit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use splitledger_common::SplitStrategy;

    fn users(ids: &[&str]) -> Vec<UserId> {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    fn amounts(shares: &[ExpenseShare]) -> Vec<Decimal> {
        shares.iter().map(|s| s.amount.value()).collect()
    }

    #[test]
    fn test_equal_split_exact_division() {
        let spec = SplitSpec::Equal {
            participants: users(&["p1", "p2", "p3"]),
        };
        let shares = build_shares(Amount::from_major(300), &spec, 2).unwrap();

        assert_eq!(amounts(&shares), vec![dec!(100), dec!(100), dec!(100)]);
    }

    #[test]
    fn test_equal_split_whole_unit_remainder() {
        let spec = SplitSpec::Equal {
            participants: users(&["p3", "p1", "p2"]),
        };
        let shares = build_shares(Amount::from_major(301), &spec, 0).unwrap();

        // First participant in ascending id order absorbs the remainder.
        assert_eq!(shares[0].user_id, UserId::new("p1"));
        assert_eq!(amounts(&shares), vec![dec!(101), dec!(100), dec!(100)]);
    }

    #[test]
    fn test_equal_split_minor_unit_remainder() {
        let spec = SplitSpec::Equal {
            participants: users(&["p1", "p2", "p3"]),
        };
        let shares = build_shares(Amount::from_major(301), &spec, 2).unwrap();

        assert_eq!(
            amounts(&shares),
            vec![dec!(100.34), dec!(100.33), dec!(100.33)]
        );
        let sum: Amount = shares.iter().map(|s| s.amount).sum();
        assert_eq!(sum, Amount::from_major(301));
    }

    #[test]
    fn test_exact_split_validates_sum() {
        let spec = SplitSpec::Exact {
            shares: vec![
                ExpenseShare::new(UserId::new("p1"), Amount::from_major(60)),
                ExpenseShare::new(UserId::new("p2"), Amount::from_major(20)),
            ],
        };
        let err = build_shares(Amount::from_major(100), &spec, 2).unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation { .. }));
    }

    #[test]
    fn test_exact_split_passes_through() {
        let spec = SplitSpec::Exact {
            shares: vec![
                ExpenseShare::new(UserId::new("p1"), Amount::from_major(75)),
                ExpenseShare::new(UserId::new("p2"), Amount::from_major(25)),
            ],
        };
        let shares = build_shares(Amount::from_major(100), &spec, 2).unwrap();
        assert_eq!(amounts(&shares), vec![dec!(75), dec!(25)]);
    }

    #[test]
    fn test_percentage_split() {
        let spec = SplitSpec::Percentage {
            weights: vec![
                PercentageWeight::new(UserId::new("p2"), dec!(30)),
                PercentageWeight::new(UserId::new("p1"), dec!(50)),
                PercentageWeight::new(UserId::new("p3"), dec!(20)),
            ],
        };
        let shares = build_shares(Amount::from_major(200), &spec, 2).unwrap();

        assert_eq!(shares[0].user_id, UserId::new("p1"));
        assert_eq!(amounts(&shares), vec![dec!(100), dec!(60), dec!(40)]);
    }

    #[test]
    fn test_percentage_split_distributes_remainder() {
        let spec = SplitSpec::Percentage {
            weights: vec![
                PercentageWeight::new(UserId::new("p1"), dec!(33)),
                PercentageWeight::new(UserId::new("p2"), dec!(33)),
                PercentageWeight::new(UserId::new("p3"), dec!(34)),
            ],
        };
        let total = Amount::from_str("0.10").unwrap();
        let shares = build_shares(total, &spec, 2).unwrap();

        // 33% of 0.10 floors to 0.03; the leftover cent goes to p1.
        assert_eq!(
            amounts(&shares),
            vec![dec!(0.04), dec!(0.03), dec!(0.03)]
        );
        let sum: Amount = shares.iter().map(|s| s.amount).sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn test_percentage_weights_must_sum_to_100() {
        let spec = SplitSpec::Percentage {
            weights: vec![
                PercentageWeight::new(UserId::new("p1"), dec!(50)),
                PercentageWeight::new(UserId::new("p2"), dec!(40)),
            ],
        };
        let err = build_shares(Amount::from_major(100), &spec, 2).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidExpense { .. }));
    }

    #[test]
    fn test_duplicate_participant_rejected() {
        let spec = SplitSpec::Equal {
            participants: users(&["p1", "p1"]),
        };
        let err = build_shares(Amount::from_major(100), &spec, 2).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidExpense { .. }));
    }

    #[test]
    fn test_resolve_contributions() {
        let expense = Expense::new(
            "Dinner",
            Amount::from_major(300),
            UserId::new("p1"),
            None,
            SplitStrategy::Equal,
            vec![
                ExpenseShare::new(UserId::new("p1"), Amount::from_major(100)),
                ExpenseShare::new(UserId::new("p2"), Amount::from_major(100)),
                ExpenseShare::new(UserId::new("p3"), Amount::from_major(100)),
            ],
        );

        let contributions = resolve(&expense).unwrap();
        assert_eq!(
            contributions[&UserId::new("p1")],
            Amount::from_major(200)
        );
        assert_eq!(
            contributions[&UserId::new("p2")],
            Amount::from_major(-100)
        );
        assert_eq!(
            contributions[&UserId::new("p3")],
            Amount::from_major(-100)
        );
    }

    #[test]
    fn test_resolve_payer_without_share() {
        let expense = Expense::new(
            "Taxi",
            Amount::from_major(50),
            UserId::new("p9"),
            None,
            SplitStrategy::Exact,
            vec![
                ExpenseShare::new(UserId::new("p1"), Amount::from_major(25)),
                ExpenseShare::new(UserId::new("p2"), Amount::from_major(25)),
            ],
        );

        let contributions = resolve(&expense).unwrap();
        assert_eq!(contributions[&UserId::new("p9")], Amount::from_major(50));
        assert_eq!(contributions[&UserId::new("p1")], Amount::from_major(-25));
    }

    #[test]
    fn test_resolve_rejects_drifted_shares() {
        let expense = Expense::new(
            "Broken",
            Amount::from_major(100),
            UserId::new("p1"),
            None,
            SplitStrategy::Exact,
            vec![
                ExpenseShare::new(UserId::new("p1"), Amount::from_major(40)),
                ExpenseShare::new(UserId::new("p2"), Amount::from_major(40)),
            ],
        );

        let err = resolve(&expense).unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation { .. }));
    }
}
