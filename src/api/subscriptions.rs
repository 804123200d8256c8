//! Subscription API handlers
//!
//! Contains HTTP request handlers for subscription CRUD operations and the
//! total-cost aggregation endpoint.

use crate::dates::{end_of_month, parse_month_year};
use crate::error::AppError;
use crate::subscriptions::{CostFilter, Subscription, SubscriptionDb};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Create subscription request
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Optional client-supplied id; generated server-side when absent
    pub id: Option<Uuid>,
    /// Name of the subscribed service (non-empty)
    pub service_name: String,
    /// Monthly price in minor currency units (non-negative)
    pub price: i64,
    /// Owning user's id (UUID string)
    pub user_id: String,
    /// First month, `MM-YYYY`
    pub start_date: String,
    /// Optional last month, `MM-YYYY`
    pub end_date: Option<String>,
}

/// Update subscription request; every field is optional
///
/// For `service_name`, `user_id` and `start_date` an empty string counts as
/// "not provided". `price` updates on presence alone, since zero is a valid
/// price. `end_date` is three-way: absent leaves the stored value, an empty
/// string clears it, anything else replaces it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubscriptionRequest {
    /// New service name
    pub service_name: Option<String>,
    /// New price
    pub price: Option<i64>,
    /// New owning user id (UUID string)
    pub user_id: Option<String>,
    /// New first month, `MM-YYYY`
    pub start_date: Option<String>,
    /// New last month (`MM-YYYY`), or empty string to clear
    pub end_date: Option<String>,
}

/// Pagination query parameters
///
/// Kept as raw strings so unparsable values silently fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Page number, default 1
    pub page: Option<String>,
    /// Page size, default 10
    pub limit: Option<String>,
}

/// Pagination metadata echoed back with a list page
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// Requested page number
    pub page: i64,
    /// Requested page size
    pub limit: i64,
    /// Total number of non-deleted subscriptions
    pub total: i64,
}

/// Subscriptions list response
#[derive(Debug, Serialize)]
pub struct ListSubscriptionsResponse {
    /// The requested page of subscriptions
    pub data: Vec<Subscription>,
    /// Pagination metadata
    pub pagination: Pagination,
}

/// Total-cost query parameters
#[derive(Debug, Default, Deserialize)]
pub struct TotalCostQuery {
    /// Start of the period, `MM-YYYY`
    pub start_date: Option<String>,
    /// End of the period, `MM-YYYY`
    pub end_date: Option<String>,
    /// Restrict to this user (UUID string)
    pub user_id: Option<String>,
    /// Restrict to this exact service name
    pub service_name: Option<String>,
}

/// Filters echoed back by the total-cost endpoint, as received on the wire
#[derive(Debug, Serialize)]
pub struct AppliedFilters {
    /// Raw `start_date` parameter
    pub start_date: String,
    /// Raw `end_date` parameter
    pub end_date: String,
    /// Raw `user_id` parameter
    pub user_id: String,
    /// Raw `service_name` parameter
    pub service_name: String,
}

/// Total-cost response
#[derive(Debug, Serialize)]
pub struct TotalCostResponse {
    /// Sum of prices over the filtered subscriptions
    pub total_cost: i64,
    /// The filters that were applied
    pub filters: AppliedFilters,
}

fn parse_subscription_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::Validation("invalid subscription ID format".to_string()))
}

fn parse_start_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_month_year(raw).map_err(|_| {
        AppError::Validation("invalid start_date format, expected MM-YYYY".to_string())
    })
}

fn parse_end_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_month_year(raw)
        .map_err(|_| AppError::Validation("invalid end_date format, expected MM-YYYY".to_string()))
}

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("invalid user_id format".to_string()))
}

/// POST /api/v1/subscriptions - Create a new subscription
pub async fn create_subscription(
    State(db): State<Arc<SubscriptionDb>>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    if request.service_name.is_empty() {
        return Err(AppError::Validation(
            "service_name must not be empty".to_string(),
        ));
    }
    if request.price < 0 {
        return Err(AppError::Validation(
            "price must be a non-negative integer".to_string(),
        ));
    }

    let user_id = parse_user_id(&request.user_id)?;
    let start_date = parse_start_date(&request.start_date)?;
    let end_date = match request.end_date.as_deref() {
        Some(raw) if !raw.is_empty() => Some(parse_end_date(raw)?),
        _ => None,
    };

    let subscription = Subscription::new(
        request.id.unwrap_or_else(Uuid::new_v4),
        request.service_name,
        request.price,
        user_id,
        start_date,
        end_date,
    );
    db.create(&subscription).await?;

    info!("Created subscription with ID: {}", subscription.id);
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// GET /api/v1/subscriptions/:id - Get a subscription by ID
pub async fn get_subscription(
    State(db): State<Arc<SubscriptionDb>>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>, AppError> {
    let subscription_id = parse_subscription_id(&id)?;

    let subscription = db
        .find_by_id(subscription_id)
        .await?
        .ok_or(AppError::SubscriptionNotFound(subscription_id))?;

    info!("Retrieved subscription: {}", subscription_id);
    Ok(Json(subscription))
}

/// PUT /api/v1/subscriptions/:id - Partially update a subscription
pub async fn update_subscription(
    State(db): State<Arc<SubscriptionDb>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> Result<Json<Subscription>, AppError> {
    let subscription_id = parse_subscription_id(&id)?;

    let mut subscription = db
        .find_by_id(subscription_id)
        .await?
        .ok_or(AppError::SubscriptionNotFound(subscription_id))?;

    if let Some(service_name) = request.service_name.filter(|s| !s.is_empty()) {
        subscription.service_name = service_name;
    }
    if let Some(price) = request.price {
        if price < 0 {
            return Err(AppError::Validation(
                "price must be a non-negative integer".to_string(),
            ));
        }
        subscription.price = price;
    }
    if let Some(raw) = request.user_id.as_deref().filter(|s| !s.is_empty()) {
        subscription.user_id = parse_user_id(raw)?;
    }
    if let Some(raw) = request.start_date.as_deref().filter(|s| !s.is_empty()) {
        subscription.start_date = parse_start_date(raw)?;
    }
    match request.end_date.as_deref() {
        // Explicit empty string clears the end date; an absent field keeps it
        Some("") => subscription.end_date = None,
        Some(raw) => subscription.end_date = Some(parse_end_date(raw)?),
        None => {}
    }

    subscription.updated_at = Utc::now();
    db.update(&subscription).await?;

    info!("Updated subscription: {}", subscription_id);
    Ok(Json(subscription))
}

/// DELETE /api/v1/subscriptions/:id - Soft-delete a subscription
pub async fn delete_subscription(
    State(db): State<Arc<SubscriptionDb>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let subscription_id = parse_subscription_id(&id)?;

    let subscription = db
        .find_by_id(subscription_id)
        .await?
        .ok_or(AppError::SubscriptionNotFound(subscription_id))?;
    db.soft_delete(subscription.id).await?;

    info!("Deleted subscription: {}", subscription_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/subscriptions - List subscriptions with pagination
pub async fn list_subscriptions(
    State(db): State<Arc<SubscriptionDb>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListSubscriptionsResponse>, AppError> {
    let page: i64 = query
        .page
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let limit: i64 = query
        .limit
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or(10);
    let offset = page.saturating_sub(1).saturating_mul(limit);

    let total = db.count().await?;
    let data = db.list(limit, offset).await?;

    info!("Listed subscriptions: page={page}, limit={limit}, total={total}");
    Ok(Json(ListSubscriptionsResponse {
        data,
        pagination: Pagination { page, limit, total },
    }))
}

/// GET /api/v1/subscriptions/total-cost - Sum subscription prices over a period
///
/// All filters are optional. A one-sided period collapses to that single
/// month's window before the overlap test.
pub async fn total_cost(
    State(db): State<Arc<SubscriptionDb>>,
    Query(query): Query<TotalCostQuery>,
) -> Result<Json<TotalCostResponse>, AppError> {
    let user_id = match query.user_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_user_id(raw)?),
        None => None,
    };
    let service_name = query.service_name.clone().filter(|s| !s.is_empty());

    let start_raw = query.start_date.as_deref().filter(|s| !s.is_empty());
    let end_raw = query.end_date.as_deref().filter(|s| !s.is_empty());
    let period = match (start_raw, end_raw) {
        (Some(start), Some(end)) => {
            let start_of_period = parse_start_date(start)?;
            let end_of_period = end_of_month(parse_end_date(end)?);
            Some((start_of_period, end_of_period))
        }
        (Some(start), None) => {
            let month = parse_start_date(start)?;
            Some((month, end_of_month(month)))
        }
        (None, Some(end)) => {
            let month = parse_end_date(end)?;
            Some((month, end_of_month(month)))
        }
        (None, None) => None,
    };

    let filter = CostFilter {
        user_id,
        service_name,
        period,
    };
    let total_cost = db.total_cost(&filter).await?;

    info!("Calculated total cost: {total_cost}");
    Ok(Json(TotalCostResponse {
        total_cost,
        filters: AppliedFilters {
            start_date: query.start_date.unwrap_or_default(),
            end_date: query.end_date.unwrap_or_default(),
            user_id: query.user_id.unwrap_or_default(),
            service_name: query.service_name.unwrap_or_default(),
        },
    }))
}
