pub mod admin;
pub mod auth;
pub mod health;
pub mod letters;
pub mod pages;
pub mod search;
