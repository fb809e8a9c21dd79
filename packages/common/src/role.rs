#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::parse::ParseEnumError;

/// Role of a user account. Each user has exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "STUDENT"))]
    Student,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SUPERVISOR"))]
    Supervisor,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "EVALUATOR"))]
    Evaluator,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FYP_COMMITTEE"))]
    FypCommittee,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Self::Student,
        Self::Supervisor,
        Self::Evaluator,
        Self::FypCommittee,
    ];

    const NAMES: &'static [&'static str] = &["STUDENT", "SUPERVISOR", "EVALUATOR", "FYP_COMMITTEE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Supervisor => "SUPERVISOR",
            Self::Evaluator => "EVALUATOR",
            Self::FypCommittee => "FYP_COMMITTEE",
        }
    }

    /// Staff roles may read every document; students only their own.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Self::Student)
    }

    /// Roles allowed to record rubric grades.
    pub fn can_grade(&self) -> bool {
        matches!(self, Self::Evaluator | Self::FypCommittee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s, Self::NAMES))
    }
}
