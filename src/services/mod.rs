//! Narrow ports to the third-party services the report flow depends on.
//!
//! Both ports are synchronous; async callers go through
//! `tokio::task::spawn_blocking`.

pub mod mailer;
pub mod purchase;

pub use mailer::*;
pub use purchase::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Purchase not found: {0}")]
    PurchaseNotFound(String),

    #[error("Purchase {checkout_id} is not complete (status: {status})")]
    PurchaseIncomplete { checkout_id: String, status: String },

    #[error("Purchase is for a different product")]
    ProductMismatch,

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Mask an address for logs: `ada@example.com` → `a**@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            let stars = "*".repeat(local.chars().count().saturating_sub(1).max(1));
            format!("{first}{stars}@{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_local_part() {
        assert_eq!(mask_email("ada@example.com"), "a**@example.com");
        assert_eq!(mask_email("x@example.com"), "x*@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
