pub mod auth;
pub mod catalog;
pub mod reviews;
pub mod users;
