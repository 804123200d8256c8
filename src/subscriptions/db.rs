//! Subscription database operations
//!
//! Handles all database interactions for subscription records. Reads always
//! exclude soft-deleted rows; deletion only sets `deleted_at`.

use crate::error::AppError;
use crate::subscriptions::models::Subscription;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, service_name, price, user_id, start_date, end_date, created_at, updated_at, deleted_at";

/// Filter for the total-cost aggregation query
///
/// `period` is the requested interval as `(start_of_period, end_of_period)`;
/// a subscription matches when its active interval overlaps that window.
#[derive(Debug, Default)]
pub struct CostFilter {
    /// Restrict to subscriptions owned by this user
    pub user_id: Option<Uuid>,
    /// Restrict to subscriptions with exactly this service name
    pub service_name: Option<String>,
    /// Restrict to subscriptions overlapping this date window
    pub period: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Database connection pool for subscription operations
pub struct SubscriptionDb {
    pool: SqlitePool,
}

impl SubscriptionDb {
    /// Initialize the connection pool and run migrations
    ///
    /// `database_url` is a SQLite connection string; a bare file path is
    /// accepted and prefixed with `sqlite:`. The database file is created
    /// when missing.
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let connection_string = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite:{database_url}")
        };

        // Ensure the parent directory exists for file-backed databases
        if let Some(path) = connection_string.strip_prefix("sqlite:") {
            if let Some(parent) = PathBuf::from(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite database at: {}", database_url);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_subscriptions.sql");
        sqlx::raw_sql(migration_sql).execute(&self.pool).await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Insert a new subscription row
    pub async fn create(&self, subscription: &Subscription) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO subscriptions \
             (id, service_name, price, user_id, start_date, end_date, created_at, updated_at, deleted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(subscription.id)
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(subscription.user_id)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .bind(subscription.deleted_at)
        .execute(&self.pool)
        .await?;

        debug!("Created subscription: {}", subscription.id);
        Ok(())
    }

    /// Fetch a subscription by id, excluding soft-deleted rows
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SELECT_COLUMNS} FROM subscriptions WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Persist the mutable fields of an existing subscription
    pub async fn update(&self, subscription: &Subscription) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE subscriptions \
             SET service_name = ?, price = ?, user_id = ?, start_date = ?, end_date = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(subscription.user_id)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.updated_at)
        .bind(subscription.id)
        .execute(&self.pool)
        .await?;

        debug!("Updated subscription: {}", subscription.id);
        Ok(())
    }

    /// Soft-delete a subscription by setting its `deleted_at` timestamp
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE subscriptions SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("Soft-deleted subscription: {}", id);
        Ok(())
    }

    /// Fetch a page of non-deleted subscriptions in store order
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SELECT_COLUMNS} FROM subscriptions WHERE deleted_at IS NULL LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Count all non-deleted subscriptions
    pub async fn count(&self) -> Result<i64, AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

    /// Sum the price of non-deleted subscriptions matching `filter`
    ///
    /// The date window uses the overlap predicate: a subscription counts when
    /// it started on or before the end of the window and either has no end
    /// date or ends on or after the start of the window. An empty result sums
    /// to zero.
    pub async fn total_cost(&self, filter: &CostFilter) -> Result<i64, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COALESCE(SUM(price), 0) FROM subscriptions WHERE deleted_at IS NULL",
        );

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }

        if let Some(service_name) = &filter.service_name {
            query.push(" AND service_name = ").push_bind(service_name);
        }

        if let Some((start_of_period, end_of_period)) = filter.period {
            query
                .push(" AND start_date <= ")
                .push_bind(end_of_period)
                .push(" AND (end_date IS NULL OR end_date >= ")
                .push_bind(start_of_period)
                .push(")");
        }

        let total: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(total)
    }
}
