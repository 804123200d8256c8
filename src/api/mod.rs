//! API module
//!
//! Contains HTTP request handlers for the subscription endpoints

pub mod subscriptions;
