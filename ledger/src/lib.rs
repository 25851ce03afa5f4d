//! Splitledger Ledger Core
//!
//! Pure balance computation over immutable expense and settlement records:
//! split resolution, the order-independent balance accumulator, and the
//! pairwise, group, and user-aggregate resolvers. No I/O lives here; callers
//! gather the records, this crate folds them.

pub mod accumulator;
pub mod aggregate;
pub mod group;
pub mod pairwise;
pub mod spending;
pub mod split;

pub use accumulator::{BalanceAccumulator, PairEntry};
pub use aggregate::{CounterpartyBalance, OweDetails, UserAggregate};
pub use group::{GroupBalanceReport, MemberBalance, MemberDue};
pub use pairwise::PairwiseBalance;
pub use spending::MonthlySpending;
pub use split::{PercentageWeight, SplitSpec};
