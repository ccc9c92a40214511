pub mod admin;
pub mod forms;
