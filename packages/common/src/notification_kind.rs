#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an in-app notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DOCUMENT_SUBMITTED"))]
    DocumentSubmitted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REVIEW_RECEIVED"))]
    ReviewReceived,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "GRADE_RECEIVED"))]
    GradeReceived,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "GRADE_ASSIGNED"))]
    GradeAssigned,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DEADLINE_REMINDER"))]
    DeadlineReminder,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REVISION_REQUESTED"))]
    RevisionRequested,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DOCUMENT_APPROVED"))]
    DocumentApproved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "GRADE_RELEASED"))]
    GradeReleased,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DEADLINE_ADDED"))]
    DeadlineAdded,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DEADLINE_APPROACHING"))]
    DeadlineApproaching,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SYSTEM_ANNOUNCEMENT"))]
    SystemAnnouncement,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentSubmitted => "DOCUMENT_SUBMITTED",
            Self::ReviewReceived => "REVIEW_RECEIVED",
            Self::GradeReceived => "GRADE_RECEIVED",
            Self::GradeAssigned => "GRADE_ASSIGNED",
            Self::DeadlineReminder => "DEADLINE_REMINDER",
            Self::RevisionRequested => "REVISION_REQUESTED",
            Self::DocumentApproved => "DOCUMENT_APPROVED",
            Self::GradeReleased => "GRADE_RELEASED",
            Self::DeadlineAdded => "DEADLINE_ADDED",
            Self::DeadlineApproaching => "DEADLINE_APPROACHING",
            Self::SystemAnnouncement => "SYSTEM_ANNOUNCEMENT",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
