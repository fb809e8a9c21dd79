
mod deadlines;
mod documents;
mod grades;
mod groups;
mod notifications;
mod reviews;
mod users;
