//! API endpoint handlers. Business logic lives in `CoreState`.

pub mod health;
pub mod reports;
