//! Subscription data model
//!
//! Defines the persisted subscription entity and its JSON representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's subscription to a named service
///
/// Dates are month-precision: always midnight UTC on the first day of the
/// month. `end_date` of `None` means the subscription is open-ended.
/// `deleted_at` marks soft deletion and never appears in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Unique identifier, immutable after creation
    pub id: Uuid,
    /// Name of the subscribed service
    pub service_name: String,
    /// Monthly price in minor currency units, non-negative
    pub price: i64,
    /// Identifier of the owning user (opaque, no foreign key)
    pub user_id: Uuid,
    /// First month of the subscription
    pub start_date: DateTime<Utc>,
    /// Last month of the subscription, if it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; set rows are invisible to normal queries
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Create a new subscription with server-assigned timestamps
    pub fn new(
        id: Uuid,
        service_name: String,
        price: i64,
        user_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            service_name,
            price,
            user_id,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
