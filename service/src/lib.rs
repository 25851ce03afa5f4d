//! Splitledger Service
//!
//! The request-scoped facade over the ledger core: balance views computed
//! from source records on every read, and the settlement/expense writers
//! that append them.

pub mod config;
pub mod service;
pub mod writer;

pub use config::ServiceConfig;
pub use service::{
    GroupBalancesView, GroupSummary, LedgerService, PairwiseBalanceView, UserAggregateView,
};
pub use writer::{ExpenseDraft, ExpenseWriter, SettlementDraft, SettlementWriter};
