pub mod letters;
pub mod pdf;
pub mod search;
pub mod throttle;
