pub mod artifacts;
pub mod auth;
pub mod documents;
pub mod forum;
pub mod notifications;
pub mod quizzes;
pub mod sites;
pub mod translations;
pub mod users;
