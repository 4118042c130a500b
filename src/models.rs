pub mod auth;
pub mod dashboard;
pub mod interaction;
pub mod lead;
pub mod property;
