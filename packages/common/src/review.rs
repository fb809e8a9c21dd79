//! Review decisions and the status transition table they drive.
//!
//! The table is the single source of truth for how a review moves a
//! document. It is a pure lookup keyed on `(reviewer role, decision)`;
//! persistence and notification delivery live in the server.

#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document_status::DocumentStatus;
use crate::parse::ParseEnumError;
use crate::role::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "APPROVED"))]
    Approved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REVISION_REQUESTED"))]
    RevisionRequested,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REJECTED"))]
    Rejected,
}

impl ReviewDecision {
    pub const ALL: &'static [ReviewDecision] =
        &[Self::Approved, Self::RevisionRequested, Self::Rejected];

    const NAMES: &'static [&'static str] = &["APPROVED", "REVISION_REQUESTED", "REJECTED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::RevisionRequested => "REVISION_REQUESTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewDecision {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("review decision", s, Self::NAMES))
    }
}

/// Who hears about a transition once it has been committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanOut {
    /// Nobody.
    Nobody,
    /// Every user with the EVALUATOR role.
    Evaluators,
    /// The document's owners: its group's members, or the uploading student.
    Owners,
    /// The owners plus the document's assigned supervisor.
    OwnersAndSupervisor,
}

/// Outcome of a single review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub status: DocumentStatus,
    /// Re-open the document for resubmission (`is_submitted = false`).
    pub reopen: bool,
    pub fan_out: FanOut,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("role {0} cannot review documents")]
    NotAReviewer(Role),
    #[error("document is already {0} and cannot be reviewed")]
    Terminal(DocumentStatus),
}

/// Looks up the transition for a reviewer role and decision.
///
/// Only the net status is returned; the intermediate approval statuses are
/// never produced.
pub fn transition(role: Role, decision: ReviewDecision) -> Result<Transition, TransitionError> {
    use DocumentStatus as S;
    use ReviewDecision as D;

    let (status, reopen, fan_out) = match (role, decision) {
        (Role::Supervisor, D::Approved) => (S::UnderEvaluationCommitteeReview, false, FanOut::Evaluators),
        (Role::Supervisor, D::RevisionRequested) => (S::SupervisorRevisionRequested, false, FanOut::Owners),
        (Role::Supervisor, D::Rejected) => (S::Rejected, false, FanOut::Owners),
        (Role::Evaluator, D::Approved) => (S::EvaluationCommitteeApproved, false, FanOut::Nobody),
        (Role::Evaluator, D::RevisionRequested) => (
            S::EvaluationCommitteeRevisionRequested,
            true,
            FanOut::OwnersAndSupervisor,
        ),
        (Role::Evaluator, D::Rejected) => (S::Rejected, false, FanOut::Owners),
        (Role::FypCommittee, D::Approved) => (S::FinalApproved, false, FanOut::Nobody),
        (Role::FypCommittee, D::RevisionRequested) => (S::FypCommitteeRevisionRequested, false, FanOut::Owners),
        (Role::FypCommittee, D::Rejected) => (S::Rejected, false, FanOut::Owners),
        (Role::Student, _) => return Err(TransitionError::NotAReviewer(role)),
    };

    Ok(Transition {
        status,
        reopen,
        fan_out,
    })
}

/// Applies a review to a document currently in `current`.
///
/// Terminal documents cannot be reviewed again.
pub fn apply(
    current: DocumentStatus,
    role: Role,
    decision: ReviewDecision,
) -> Result<Transition, TransitionError> {
    let next = transition(role, decision)?;
    if current.is_terminal() {
        return Err(TransitionError::Terminal(current));
    }
    Ok(next)
}
