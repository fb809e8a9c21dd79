pub mod auth;
pub mod deadline;
pub mod document;
pub mod grade;
pub mod group;
pub mod notification;
pub mod review;
pub mod user;
