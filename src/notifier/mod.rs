//! Notification engine.
//!
//! Detects low-stock and expiration conditions and emits at most one
//! notification per (resource, recipient, kind) within the dedup window.
//! Each evaluation walks Condition-Met, then Throttle-Check, then either
//! suppresses or inserts a row and dispatches email.
//!
//! Three entry points:
//!
//! - [`check_low_stock_on_write`] runs synchronously after a resource
//!   create/update and is deliberately unthrottled. Repeated writes that
//!   keep crossing the threshold emit repeated notifications.
//! - [`run_low_stock_scan`] is the periodic sweep, throttled per resource,
//!   recipient, and kind by the configured window.
//! - [`run_expiration_scan`] matches days-until-expiration against a fixed
//!   descending trigger list, deduped per UTC calendar day.
//!
//! Fan-out goes to every member of the owner's group, or just the owner
//! when they have none. Per-resource failures inside a scan are logged and
//! the scan moves on.

pub mod jobs;

use crate::AppState;
use crate::api::models::notifications::NotificationKind;
use crate::db::errors::DbError;
use crate::db::handlers::repository::Repository;
use crate::db::handlers::{Categories, Notifications, Resources, Users};
use crate::db::models::notifications::NotificationCreateDBRequest;
use crate::db::models::resources::ResourceDBResponse;
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use chrono::{Duration, NaiveDate, Utc};
use tracing::instrument;

/// Days before expiration at which an alert fires. Descending; the first
/// match wins and the loop breaks, so at most one trigger fires per
/// resource per run.
pub const EXPIRATION_TRIGGER_DAYS: [i64; 12] = [30, 28, 21, 14, 7, 6, 5, 4, 3, 2, 1, 0];

/// Everybody who should hear about a resource: the owner's group members,
/// or just the owner if they are groupless.
async fn recipients(
    conn: &mut sqlx::SqliteConnection,
    resource: &ResourceDBResponse,
) -> Result<Vec<UserDBResponse>, DbError> {
    let mut users = Users::new(conn);
    let owner = users
        .get_by_id(resource.owner_user_id)
        .await?
        .ok_or(DbError::NotFound)?;

    match owner.group_id {
        Some(group_id) => users.list_by_group(group_id).await,
        None => Ok(vec![owner]),
    }
}

/// Insert the notification row, then hand the email off to a background
/// task. The row is the source of truth; a failed send only logs.
async fn emit(
    state: &AppState,
    recipient: &UserDBResponse,
    resource: &ResourceDBResponse,
    kind: NotificationKind,
    message: String,
) -> Result<(), DbError> {
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| DbError::Other(e.into()))?;
    Notifications::new(&mut conn)
        .create(&NotificationCreateDBRequest {
            user_id: recipient.id,
            resource_id: Some(resource.id),
            kind: kind.to_string(),
            message: message.clone(),
        })
        .await?;

    if let Some(email) = state.email.clone() {
        let to_email = recipient.email.clone();
        let to_name = recipient.username.clone();
        let subject = format!("Stockroom alert: {}", resource.name);
        tokio::spawn(async move {
            if let Err(e) = email
                .send_notification(&to_email, &to_name, &subject, &message)
                .await
            {
                tracing::warn!(email = %to_email, error = %e, "Failed to send notification email");
            }
        });
    }

    Ok(())
}

/// Synchronous low-stock check after a resource write. No throttle: this is
/// a one-shot post-write reaction, not the periodic scan.
#[instrument(skip(state, resource), fields(resource_id = resource.id))]
pub async fn check_low_stock_on_write(state: &AppState, resource: &ResourceDBResponse) {
    if let Err(e) = low_stock_on_write_inner(state, resource).await {
        tracing::warn!(resource_id = resource.id, error = %e, "Post-write low-stock check failed");
    }
}

async fn low_stock_on_write_inner(
    state: &AppState,
    resource: &ResourceDBResponse,
) -> Result<(), Error> {
    if !resource.is_low_stock() {
        return Ok(());
    }

    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    let category = Categories::new(&mut conn)
        .get_by_id(resource.category_id)
        .await?
        .ok_or(Error::NotFound("category"))?;
    if !category.enable_quantity || !category.enable_low_stock_threshold {
        return Ok(());
    }

    let message = low_stock_message(resource);
    for recipient in recipients(&mut conn, resource).await? {
        emit(state, &recipient, resource, NotificationKind::LowStock, message.clone()).await?;
    }
    Ok(())
}

/// One pass of the periodic low-stock scan. Returns how many notifications
/// were emitted.
#[instrument(skip(state))]
pub async fn run_low_stock_scan(state: &AppState) -> Result<u64, Error> {
    let throttle = Duration::from_std(state.config.notifications.low_stock_throttle)
        .map_err(anyhow::Error::from)?;
    let since = Utc::now() - throttle;
    let kind = NotificationKind::LowStockPeriodicCheck;

    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    let low = Resources::new(&mut conn).list_low_stock().await?;

    let mut emitted = 0;
    for resource in &low {
        let targets = match recipients(&mut conn, resource).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(resource_id = resource.id, error = %e, "Skipping resource in low-stock scan");
                continue;
            }
        };

        // Recipients do not share dedup state; each is throttled on their own.
        for recipient in targets {
            let already = Notifications::new(&mut conn)
                .exists_since(resource.id, recipient.id, &kind.to_string(), since)
                .await;
            match already {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(resource_id = resource.id, user_id = recipient.id, error = %e,
                        "Throttle lookup failed, skipping");
                    continue;
                }
            }

            let message = low_stock_message(resource);
            if let Err(e) = emit(state, &recipient, resource, kind, message).await {
                tracing::warn!(resource_id = resource.id, user_id = recipient.id, error = %e,
                    "Failed to emit low-stock notification");
                continue;
            }
            emitted += 1;
        }
    }

    tracing::debug!(candidates = low.len(), emitted, "Low-stock scan finished");
    Ok(emitted)
}

/// One pass of the expiration scan for the given UTC calendar day. Returns
/// how many notifications were emitted.
#[instrument(skip(state))]
pub async fn run_expiration_scan(state: &AppState, today: NaiveDate) -> Result<u64, Error> {
    let mut conn = state.db.acquire().await.map_err(anyhow::Error::from)?;
    let expiring = Resources::new(&mut conn).list_with_expiration().await?;

    let mut emitted = 0;
    for resource in &expiring {
        let Some(expiration) = resource.expiration_date else {
            continue;
        };
        // Whole days between UTC midnights; negative means already expired.
        let days_until = (expiration - today).num_days();

        let Some(kind) = expiration_kind(days_until) else {
            continue;
        };

        let targets = match recipients(&mut conn, resource).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(resource_id = resource.id, error = %e, "Skipping resource in expiration scan");
                continue;
            }
        };

        for recipient in targets {
            let already = Notifications::new(&mut conn)
                .exists_on_day(resource.id, recipient.id, &kind.to_string(), today)
                .await;
            match already {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(resource_id = resource.id, user_id = recipient.id, error = %e,
                        "Dedup lookup failed, skipping");
                    continue;
                }
            }

            let message = expiration_message(resource, days_until);
            if let Err(e) = emit(state, &recipient, resource, kind, message).await {
                tracing::warn!(resource_id = resource.id, user_id = recipient.id, error = %e,
                    "Failed to emit expiration notification");
                continue;
            }
            emitted += 1;
        }
    }

    tracing::debug!(candidates = expiring.len(), emitted, "Expiration scan finished");
    Ok(emitted)
}

/// Match days-until-expiration against the trigger list. First match wins.
fn expiration_kind(days_until: i64) -> Option<NotificationKind> {
    for trigger in EXPIRATION_TRIGGER_DAYS {
        if days_until == trigger {
            return Some(if trigger == 0 {
                NotificationKind::ExpirationToday
            } else {
                NotificationKind::ExpirationDaysPrior(trigger as u32)
            });
        }
    }
    None
}

fn low_stock_message(resource: &ResourceDBResponse) -> String {
    format!(
        "Resource '{}' is low on stock: {} left (threshold {})",
        resource.name, resource.quantity, resource.low_stock_threshold
    )
}

fn expiration_message(resource: &ResourceDBResponse, days_until: i64) -> String {
    match days_until {
        0 => format!("Resource '{}' expires today", resource.name),
        1 => format!("Resource '{}' expires tomorrow", resource.name),
        n => format!("Resource '{}' expires in {n} days", resource.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::categories::CategoryCreateDBRequest;
    use crate::db::models::resources::ResourceCreateDBRequest;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::api::models::users::Role;
    use crate::db::models::notifications::NotificationFilter;
    use crate::test_utils;
    use sqlx::SqlitePool;

    async fn seed_category(pool: &SqlitePool, name: &str, flags: (bool, bool, bool)) -> i64 {
        let mut conn = pool.acquire().await.unwrap();
        Categories::new(&mut conn)
            .create(&CategoryCreateDBRequest {
                name: name.to_string(),
                enable_quantity: flags.0,
                enable_low_stock_threshold: flags.1,
                enable_expiration_date: flags.2,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_user(pool: &SqlitePool, username: &str, group_id: Option<i64>) -> UserDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                role: Role::User,
                group_id,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn seed_resource(
        pool: &SqlitePool,
        category_id: i64,
        owner: i64,
        quantity: i64,
        threshold: i64,
        expiration: Option<chrono::NaiveDate>,
    ) -> ResourceDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        Resources::new(&mut conn)
            .create(&ResourceCreateDBRequest {
                name: "widget".to_string(),
                category_id,
                quantity,
                low_stock_threshold: threshold,
                description: None,
                expiration_date: expiration,
                owner_user_id: owner,
            })
            .await
            .unwrap()
    }

    async fn notifications_for(pool: &SqlitePool, user_id: i64) -> Vec<crate::db::models::notifications::NotificationDBResponse> {
        let mut conn = pool.acquire().await.unwrap();
        Notifications::new(&mut conn)
            .list(&NotificationFilter { user_id, unread_only: false, limit: 100, offset: 0 })
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn post_write_check_emits_exactly_one_low_stock_row(pool: SqlitePool) {
        let state = test_utils::state(pool.clone());
        let category = seed_category(&pool, "c", (true, true, false)).await;
        let user = seed_user(&pool, "alice", None).await;
        let resource = seed_resource(&pool, category, user.id, 10, 5, None).await;

        // Quantity 10 is above threshold 5; nothing fires.
        check_low_stock_on_write(&state, &resource).await;
        assert!(notifications_for(&pool, user.id).await.is_empty());

        let updated = {
            let mut conn = pool.acquire().await.unwrap();
            Resources::new(&mut conn)
                .update(
                    resource.id,
                    &crate::db::models::resources::ResourceUpdateDBRequest {
                        quantity: Some(3),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
        };

        check_low_stock_on_write(&state, &updated).await;
        let rows = notifications_for(&pool, user.id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "low_stock");
        assert_eq!(rows[0].resource_id, Some(resource.id));
    }

    #[sqlx::test]
    async fn post_write_check_is_unthrottled(pool: SqlitePool) {
        let state = test_utils::state(pool.clone());
        let category = seed_category(&pool, "c", (true, true, false)).await;
        let user = seed_user(&pool, "bob", None).await;
        let resource = seed_resource(&pool, category, user.id, 2, 5, None).await;

        // Two writes crossing the threshold emit two rows; the one-shot
        // path deliberately has no dedup window.
        check_low_stock_on_write(&state, &resource).await;
        check_low_stock_on_write(&state, &resource).await;
        assert_eq!(notifications_for(&pool, user.id).await.len(), 2);
    }

    #[sqlx::test]
    async fn post_write_check_respects_category_flags(pool: SqlitePool) {
        let state = test_utils::state(pool.clone());
        let category = seed_category(&pool, "untracked", (false, false, false)).await;
        let user = seed_user(&pool, "carol", None).await;
        let resource = seed_resource(&pool, category, user.id, 0, 5, None).await;

        check_low_stock_on_write(&state, &resource).await;
        assert!(notifications_for(&pool, user.id).await.is_empty());
    }

    #[sqlx::test]
    async fn periodic_scan_is_throttled_within_window(pool: SqlitePool) {
        let state = test_utils::state(pool.clone());
        let category = seed_category(&pool, "c", (true, true, false)).await;
        let user = seed_user(&pool, "dave", None).await;
        seed_resource(&pool, category, user.id, 0, 5, None).await;

        assert_eq!(run_low_stock_scan(&state).await.unwrap(), 1);
        // Second run inside the 23.5h window is suppressed.
        assert_eq!(run_low_stock_scan(&state).await.unwrap(), 0);

        let rows = notifications_for(&pool, user.id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "low_stock_periodic_check");
    }

    #[sqlx::test]
    async fn scan_fans_out_to_group_members(pool: SqlitePool) {
        let state = test_utils::state(pool.clone());

        let group_id = {
            let mut conn = pool.acquire().await.unwrap();
            seed_group(&mut conn).await
        };
        let category = seed_category(&pool, "c", (true, true, false)).await;
        let owner = seed_user(&pool, "erin", Some(group_id)).await;
        let mate = seed_user(&pool, "frank", Some(group_id)).await;
        let outsider = seed_user(&pool, "gail", None).await;
        seed_resource(&pool, category, owner.id, 1, 5, None).await;

        assert_eq!(run_low_stock_scan(&state).await.unwrap(), 2);
        assert_eq!(notifications_for(&pool, owner.id).await.len(), 1);
        assert_eq!(notifications_for(&pool, mate.id).await.len(), 1);
        assert!(notifications_for(&pool, outsider.id).await.is_empty());
    }

    async fn seed_group(conn: &mut sqlx::SqliteConnection) -> i64 {
        crate::db::handlers::Groups::new(conn)
            .create(&crate::db::models::groups::GroupCreateDBRequest { name: "lab".into() })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    async fn expiration_scan_matches_trigger_days(pool: SqlitePool) {
        let state = test_utils::state(pool.clone());
        let category = seed_category(&pool, "c", (false, false, true)).await;
        let user = seed_user(&pool, "hana", None).await;

        let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        seed_resource(&pool, category, user.id, 0, 0, Some(today)).await;
        seed_resource(&pool, category, user.id, 0, 0, today.checked_add_days(chrono::Days::new(7))).await;
        // 8 days out is not a trigger day; nothing fires for this one.
        seed_resource(&pool, category, user.id, 0, 0, today.checked_add_days(chrono::Days::new(8))).await;

        assert_eq!(run_expiration_scan(&state, today).await.unwrap(), 2);

        let kinds: Vec<String> = notifications_for(&pool, user.id)
            .await
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert!(kinds.contains(&"expiration_today".to_string()));
        assert!(kinds.contains(&"expiration_7_days_prior".to_string()));

        // Same calendar day: dedup suppresses everything.
        assert_eq!(run_expiration_scan(&state, today).await.unwrap(), 0);
    }

    #[test_log::test]
    fn trigger_matching_is_exact_and_first_match_only() {
        assert_eq!(expiration_kind(0), Some(NotificationKind::ExpirationToday));
        assert_eq!(expiration_kind(30), Some(NotificationKind::ExpirationDaysPrior(30)));
        assert_eq!(expiration_kind(8), None);
        assert_eq!(expiration_kind(-1), None);
        assert_eq!(expiration_kind(31), None);
    }
}
