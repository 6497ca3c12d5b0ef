pub mod auth;
pub mod expenses;
