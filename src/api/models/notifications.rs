//! API models for notifications, including the kind taxonomy.

use crate::db::models::notifications::NotificationDBResponse;
use crate::types::{NotificationId, ResourceId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// What a notification is about. Stored as a string in the log so the
/// engine's dedup queries can match on it.
///
/// `LowStock` comes from the synchronous post-write check and is never
/// throttled; `LowStockPeriodicCheck` comes from the background scan and is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    LowStock,
    LowStockPeriodicCheck,
    /// Expiration is `days` whole days away.
    ExpirationDaysPrior(u32),
    ExpirationToday,
    General,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::LowStock => write!(f, "low_stock"),
            NotificationKind::LowStockPeriodicCheck => write!(f, "low_stock_periodic_check"),
            NotificationKind::ExpirationDaysPrior(days) => {
                write!(f, "expiration_{days}_days_prior")
            }
            NotificationKind::ExpirationToday => write!(f, "expiration_today"),
            NotificationKind::General => write!(f, "general"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_stock" => return Ok(NotificationKind::LowStock),
            "low_stock_periodic_check" => return Ok(NotificationKind::LowStockPeriodicCheck),
            "expiration_today" => return Ok(NotificationKind::ExpirationToday),
            "general" => return Ok(NotificationKind::General),
            _ => {}
        }
        if let Some(days) = s
            .strip_prefix("expiration_")
            .and_then(|rest| rest.strip_suffix("_days_prior"))
        {
            return days
                .parse::<u32>()
                .map(NotificationKind::ExpirationDaysPrior)
                .map_err(|_| format!("unknown notification kind: {s}"));
        }
        Err(format!("unknown notification kind: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub user_id: UserId,
    pub resource_id: Option<ResourceId>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationDBResponse> for NotificationResponse {
    fn from(n: NotificationDBResponse) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            resource_id: n.resource_id,
            kind: n.kind,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Query parameters for listing notifications.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct NotificationListParams {
    /// Only return unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_roundtrip() {
        let kinds = [
            NotificationKind::LowStock,
            NotificationKind::LowStockPeriodicCheck,
            NotificationKind::ExpirationDaysPrior(7),
            NotificationKind::ExpirationDaysPrior(30),
            NotificationKind::ExpirationToday,
            NotificationKind::General,
        ];
        for kind in kinds {
            let parsed: NotificationKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_kind_strings_are_rejected() {
        assert!("".parse::<NotificationKind>().is_err());
        assert!("expiration_x_days_prior".parse::<NotificationKind>().is_err());
        assert!("low_stock_extra".parse::<NotificationKind>().is_err());
    }
}
