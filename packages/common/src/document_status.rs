#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::parse::ParseEnumError;

/// Position of a document in the review pipeline.
///
/// Only a subset of these values is ever written by the review transition
/// table; `SupervisorApproved`, `UnderSupervisorReview`,
/// `UnderFypCommitteeReview` and `FypCommitteeApproved` are accepted on the
/// wire and by the committee status override but never produced by a review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DRAFT"))]
    Draft,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SUBMITTED"))]
    Submitted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "UNDER_SUPERVISOR_REVIEW"))]
    UnderSupervisorReview,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SUPERVISOR_APPROVED"))]
    SupervisorApproved,
    #[cfg_attr(
        feature = "sea-orm",
        sea_orm(string_value = "SUPERVISOR_REVISION_REQUESTED")
    )]
    SupervisorRevisionRequested,
    #[cfg_attr(
        feature = "sea-orm",
        sea_orm(string_value = "UNDER_EVALUATION_COMMITTEE_REVIEW")
    )]
    UnderEvaluationCommitteeReview,
    #[cfg_attr(
        feature = "sea-orm",
        sea_orm(string_value = "EVALUATION_COMMITTEE_APPROVED")
    )]
    EvaluationCommitteeApproved,
    #[cfg_attr(
        feature = "sea-orm",
        sea_orm(string_value = "EVALUATION_COMMITTEE_REVISION_REQUESTED")
    )]
    EvaluationCommitteeRevisionRequested,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "UNDER_FYP_COMMITTEE_REVIEW"))]
    UnderFypCommitteeReview,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FYP_COMMITTEE_APPROVED"))]
    FypCommitteeApproved,
    #[cfg_attr(
        feature = "sea-orm",
        sea_orm(string_value = "FYP_COMMITTEE_REVISION_REQUESTED")
    )]
    FypCommitteeRevisionRequested,
    /// Accepted by the FYP committee, or every grade released.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FINAL_APPROVED"))]
    FinalApproved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REJECTED"))]
    Rejected,
}

impl DocumentStatus {
    pub const ALL: &'static [DocumentStatus] = &[
        Self::Draft,
        Self::Submitted,
        Self::UnderSupervisorReview,
        Self::SupervisorApproved,
        Self::SupervisorRevisionRequested,
        Self::UnderEvaluationCommitteeReview,
        Self::EvaluationCommitteeApproved,
        Self::EvaluationCommitteeRevisionRequested,
        Self::UnderFypCommitteeReview,
        Self::FypCommitteeApproved,
        Self::FypCommitteeRevisionRequested,
        Self::FinalApproved,
        Self::Rejected,
    ];

    const NAMES: &'static [&'static str] = &[
        "DRAFT",
        "SUBMITTED",
        "UNDER_SUPERVISOR_REVIEW",
        "SUPERVISOR_APPROVED",
        "SUPERVISOR_REVISION_REQUESTED",
        "UNDER_EVALUATION_COMMITTEE_REVIEW",
        "EVALUATION_COMMITTEE_APPROVED",
        "EVALUATION_COMMITTEE_REVISION_REQUESTED",
        "UNDER_FYP_COMMITTEE_REVIEW",
        "FYP_COMMITTEE_APPROVED",
        "FYP_COMMITTEE_REVISION_REQUESTED",
        "FINAL_APPROVED",
        "REJECTED",
    ];

    /// No review may move a document out of a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalApproved | Self::Rejected)
    }

    /// A new upload while in one of these statuses sends the document back to draft.
    pub fn is_revision_requested(&self) -> bool {
        matches!(
            self,
            Self::SupervisorRevisionRequested
                | Self::EvaluationCommitteeRevisionRequested
                | Self::FypCommitteeRevisionRequested
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderSupervisorReview => "UNDER_SUPERVISOR_REVIEW",
            Self::SupervisorApproved => "SUPERVISOR_APPROVED",
            Self::SupervisorRevisionRequested => "SUPERVISOR_REVISION_REQUESTED",
            Self::UnderEvaluationCommitteeReview => "UNDER_EVALUATION_COMMITTEE_REVIEW",
            Self::EvaluationCommitteeApproved => "EVALUATION_COMMITTEE_APPROVED",
            Self::EvaluationCommitteeRevisionRequested => {
                "EVALUATION_COMMITTEE_REVISION_REQUESTED"
            }
            Self::UnderFypCommitteeReview => "UNDER_FYP_COMMITTEE_REVIEW",
            Self::FypCommitteeApproved => "FYP_COMMITTEE_APPROVED",
            Self::FypCommitteeRevisionRequested => "FYP_COMMITTEE_REVISION_REQUESTED",
            Self::FinalApproved => "FINAL_APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl FromStr for DocumentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("document status", s, Self::NAMES))
    }
}

/// The four built-in kinds of deliverable. Documents may instead carry a
/// free-form custom type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PROPOSAL"))]
    Proposal,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DESIGN_DOCUMENT"))]
    DesignDocument,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TEST_DOCUMENT"))]
    TestDocument,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "THESIS"))]
    Thesis,
}

impl DocumentType {
    pub const ALL: &'static [DocumentType] = &[
        Self::Proposal,
        Self::DesignDocument,
        Self::TestDocument,
        Self::Thesis,
    ];

    const NAMES: &'static [&'static str] =
        &["PROPOSAL", "DESIGN_DOCUMENT", "TEST_DOCUMENT", "THESIS"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposal => "PROPOSAL",
            Self::DesignDocument => "DESIGN_DOCUMENT",
            Self::TestDocument => "TEST_DOCUMENT",
            Self::Thesis => "THESIS",
        }
    }

    /// Human-readable label used in notification text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Proposal => "Proposal",
            Self::DesignDocument => "Design Document",
            Self::TestDocument => "Test Document",
            Self::Thesis => "Thesis",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("document type", s, Self::NAMES))
    }
}
