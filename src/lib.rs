//! Budget Tracker Library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod repository;

mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, DomainError, ExpenseCategory, OperationContext};
pub use error::AppError;
