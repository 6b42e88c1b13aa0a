// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TargetAssigned,
    LeadAssigned,
    LeadUpdated,
    ImportFinished,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

impl NotificationQuery {
    pub fn page_size(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(NotificationQuery::default().page_size(), DEFAULT_PAGE_SIZE);
        let huge = NotificationQuery { unread_only: false, limit: Some(10_000) };
        assert_eq!(huge.page_size(), MAX_PAGE_SIZE);
        let zero = NotificationQuery { unread_only: true, limit: Some(0) };
        assert_eq!(zero.page_size(), 1);
    }

    #[test]
    fn kind_uses_snake_case_on_the_wire() {
        let kinds = [
            (NotificationKind::TargetAssigned, "\"target_assigned\""),
            (NotificationKind::LeadAssigned, "\"lead_assigned\""),
            (NotificationKind::LeadUpdated, "\"lead_updated\""),
            (NotificationKind::ImportFinished, "\"import_finished\""),
            (NotificationKind::System, "\"system\""),
        ];
        for (kind, json) in kinds {
            assert_eq!(serde_json::to_string(&kind).unwrap(), json);
            assert_eq!(serde_json::from_str::<NotificationKind>(json).unwrap(), kind);
        }
    }
}
