pub mod expenses;
pub mod users;
