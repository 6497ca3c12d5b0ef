pub mod expenses;
pub mod repository;
pub mod users;
