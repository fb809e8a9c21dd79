pub mod document_status;
pub mod grading;
pub mod notification_kind;
mod parse;
pub mod review;
pub mod role;
pub mod storage;

pub use document_status::{DocumentStatus, DocumentType};
pub use grading::{Aggregate, LetterGrade, TranscriptTotals};
pub use notification_kind::NotificationKind;
pub use parse::ParseEnumError;
pub use review::{FanOut, ReviewDecision, Transition, TransitionError};
pub use role::Role;
