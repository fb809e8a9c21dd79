pub mod chat_message;
pub mod deadline;
pub mod document;
pub mod document_version;
pub mod grade;
pub mod notification;
pub mod project_group;
pub mod review;
pub mod user;
