//! Subscription domain module
//!
//! Contains the persisted entity and the database access layer.

pub mod db;
pub mod models;

pub use db::{CostFilter, SubscriptionDb};
pub use models::Subscription;
