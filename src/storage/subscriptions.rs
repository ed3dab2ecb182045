use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::{
    month::{months_overlap, Month},
    new_subscription::NewSubscription,
    price::Price,
    service_name::ServiceName,
    subscription::Subscription,
};
use crate::storage::{
    filter::{Conditions, SubscriptionFilter},
    QueryTimeout, StoreError,
};

const SELECT_SUBSCRIPTIONS: &str = r#"
    SELECT id, service_name, price, user_id, start_month, end_month, created_at, updated_at
    FROM subscriptions"#;

const SELECT_BILLABLE: &str = r#"
    SELECT price, start_month, end_month
    FROM subscriptions"#;

/// Window used by the billing summary, both bounds inclusive.
#[derive(Debug, Clone)]
pub struct SummaryFilter {
    pub from: Month,
    pub to: Month,
    pub subscriptions: SubscriptionFilter,
}

/// The part of a row that contributes to a billing summary.
#[derive(Debug, Clone, Copy)]
pub struct BillableRow {
    pub price: i32,
    pub start_month: Month,
    pub end_month: Option<Month>,
}

#[tracing::instrument(
    name = "Insert a new subscription into the database",
    skip(subscription, db_pool),
    fields(
        user_id = %subscription.user_id,
        service_name = %subscription.service_name.as_ref()
    )
)]
pub async fn insert_subscription(
    db_pool: &PgPool,
    timeout: QueryTimeout,
    subscription: &NewSubscription,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let query = sqlx::query(
        r#"
        INSERT INTO subscriptions (id, service_name, price, user_id, start_month, end_month, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        "#,
    )
    .bind(id)
    .bind(subscription.service_name.as_ref())
    .bind(subscription.price.value())
    .bind(subscription.user_id)
    .bind(subscription.start_month.first_day())
    .bind(subscription.end_month.map(|month| month.first_day()))
    .bind(now)
    .execute(db_pool);

    timeout.bound(query).await.map_err(|err| {
        tracing::error!("Failed to insert subscription: {:?}", err);
        err
    })?;

    Ok(id)
}

#[tracing::instrument(name = "Fetch a subscription by id", skip(db_pool))]
pub async fn get_subscription(
    db_pool: &PgPool,
    timeout: QueryTimeout,
    subscription_id: Uuid,
) -> Result<Subscription, StoreError> {
    let sql = format!("{} WHERE id = $1", SELECT_SUBSCRIPTIONS);
    let query = sqlx::query(&sql)
        .bind(subscription_id)
        .try_map(subscription_from_row)
        .fetch_one(db_pool);

    timeout.bound(query).await.map_err(|err| {
        if !matches!(err, StoreError::NotFound) {
            tracing::error!("Failed to fetch subscription: {:?}", err);
        }
        err
    })
}

/// Lists subscriptions matching `filter`, newest first.
#[tracing::instrument(name = "List subscriptions", skip(db_pool))]
pub async fn list_subscriptions(
    db_pool: &PgPool,
    timeout: QueryTimeout,
    filter: &SubscriptionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Subscription>, StoreError> {
    let mut builder = Conditions::new(SELECT_SUBSCRIPTIONS)
        .matching(filter)
        .finish();

    builder
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let query = builder
        .build()
        .try_map(subscription_from_row)
        .fetch_all(db_pool);

    timeout.bound(query).await.map_err(|err| {
        tracing::error!("Failed to list subscriptions: {:?}", err);
        err
    })
}

/// Replaces every mutable field of the subscription. A missing id is not an
/// error: nothing is updated.
#[tracing::instrument(
    name = "Replace a subscription",
    skip(subscription, db_pool),
    fields(
        user_id = %subscription.user_id,
        service_name = %subscription.service_name.as_ref()
    )
)]
pub async fn update_subscription(
    db_pool: &PgPool,
    timeout: QueryTimeout,
    subscription_id: Uuid,
    subscription: &NewSubscription,
) -> Result<(), StoreError> {
    let query = sqlx::query(
        r#"
        UPDATE subscriptions
        SET service_name = $2, price = $3, user_id = $4, start_month = $5, end_month = $6, updated_at = $7
        WHERE id = $1
        "#,
    )
    .bind(subscription_id)
    .bind(subscription.service_name.as_ref())
    .bind(subscription.price.value())
    .bind(subscription.user_id)
    .bind(subscription.start_month.first_day())
    .bind(subscription.end_month.map(|month| month.first_day()))
    .bind(Utc::now())
    .execute(db_pool);

    let result = timeout.bound(query).await.map_err(|err| {
        tracing::error!("Failed to update subscription: {:?}", err);
        err
    })?;

    if result.rows_affected() == 0 {
        tracing::warn!("No subscription updated, id {} does not exist", subscription_id);
    }

    Ok(())
}

/// Deletes the subscription. A missing id is not an error.
#[tracing::instrument(name = "Delete a subscription", skip(db_pool))]
pub async fn delete_subscription(
    db_pool: &PgPool,
    timeout: QueryTimeout,
    subscription_id: Uuid,
) -> Result<(), StoreError> {
    let query = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .execute(db_pool);

    let result = timeout.bound(query).await.map_err(|err| {
        tracing::error!("Failed to delete subscription: {:?}", err);
        err
    })?;

    if result.rows_affected() == 0 {
        tracing::warn!("No subscription deleted, id {} does not exist", subscription_id);
    }

    Ok(())
}

/// Total billed over `[from, to]`: every matching row contributes its price
/// once per overlapping month.
#[tracing::instrument(
    name = "Compute subscriptions summary",
    skip(db_pool, filter),
    fields(
        from = %filter.from,
        to = %filter.to,
        user_id = ?filter.subscriptions.user_id,
        service_name = ?filter.subscriptions.service_name
    )
)]
pub async fn summarize_subscriptions(
    db_pool: &PgPool,
    timeout: QueryTimeout,
    filter: &SummaryFilter,
) -> Result<i64, StoreError> {
    let mut builder = Conditions::new(SELECT_BILLABLE)
        .active_between(filter.from, filter.to)
        .matching(&filter.subscriptions)
        .finish();

    let query = builder
        .build()
        .try_map(|row: PgRow| {
            Ok(BillableRow {
                price: row.try_get("price")?,
                start_month: Month::from_date(row.try_get::<NaiveDate, _>("start_month")?),
                end_month: row
                    .try_get::<Option<NaiveDate>, _>("end_month")?
                    .map(Month::from_date),
            })
        })
        .fetch_all(db_pool);

    let rows = timeout.bound(query).await.map_err(|err| {
        tracing::error!("Failed to compute summary: {:?}", err);
        err
    })?;
    let total = billed_total(&rows, filter.from, filter.to);

    tracing::info!("Summary total = {}", total);

    Ok(total)
}

pub fn billed_total(rows: &[BillableRow], from: Month, to: Month) -> i64 {
    rows.iter()
        .map(|row| i64::from(row.price) * months_overlap(row.start_month, row.end_month, from, to))
        .sum()
}

fn subscription_from_row(row: PgRow) -> Result<Subscription, sqlx::Error> {
    let service_name =
        ServiceName::parse(row.try_get("service_name")?).map_err(|err| sqlx::Error::Decode(err.into()))?;
    let price = Price::parse(i64::from(row.try_get::<i32, _>("price")?))
        .map_err(|err| sqlx::Error::Decode(err.into()))?;

    Ok(Subscription {
        id: row.try_get("id")?,
        service_name,
        price,
        user_id: row.try_get("user_id")?,
        start_month: Month::from_date(row.try_get("start_month")?),
        end_month: row
            .try_get::<Option<NaiveDate>, _>("end_month")?
            .map(Month::from_date),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
