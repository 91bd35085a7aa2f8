//! Domain module
//!
//! Core domain types: roles, principals and ledger vocabulary.

pub mod context;
pub mod error;
pub mod ledger;
pub mod role;

pub use context::RequestContext;
pub use error::DomainError;
pub use ledger::{
    AnomalyStatus, PaymentType, SettlementStatus, TalanganStatus, TransactionStatus, WaStatus,
};
pub use role::{Principal, Role};
