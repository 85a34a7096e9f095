use serde::Deserialize;

use super::ServiceError;

const POLAR_API_URL: &str = "https://api.polar.sh";

/// Checkout statuses that mean the customer has paid
const PAID_STATUSES: &[&str] = &["succeeded", "confirmed"];

/// Prefix accepted by `DevVerifier`
pub const DEV_CHECKOUT_PREFIX: &str = "dev_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPurchase {
    pub checkout_id: String,
    /// `None` only for development purchases
    pub customer_email: Option<String>,
    pub product_id: String,
}

/// Verify-purchase port
pub trait PurchaseVerifier: Send + Sync {
    fn verify(&self, checkout_id: &str) -> Result<VerifiedPurchase, ServiceError>;
}

/// Polar checkout lookup
pub struct PolarVerifier {
    base_url: String,
    access_token: String,
    product_id: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct PolarCheckout {
    id: String,
    status: String,
    customer_email: Option<String>,
    product_id: String,
}

impl PolarVerifier {
    pub fn new(
        access_token: &str,
        product_id: &str,
        base_url: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url
                .unwrap_or(POLAR_API_URL)
                .trim_end_matches('/')
                .to_string(),
            access_token: access_token.to_string(),
            product_id: product_id.to_string(),
            client,
        })
    }

    fn check(&self, checkout: PolarCheckout) -> Result<VerifiedPurchase, ServiceError> {
        if !PAID_STATUSES.contains(&checkout.status.as_str()) {
            return Err(ServiceError::PurchaseIncomplete {
                checkout_id: checkout.id,
                status: checkout.status,
            });
        }
        if checkout.product_id != self.product_id {
            return Err(ServiceError::ProductMismatch);
        }
        let customer_email = checkout
            .customer_email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ServiceError::Rejected("checkout has no customer email".into()))?;

        Ok(VerifiedPurchase {
            checkout_id: checkout.id,
            customer_email: Some(customer_email),
            product_id: checkout.product_id,
        })
    }
}

impl PurchaseVerifier for PolarVerifier {
    fn verify(&self, checkout_id: &str) -> Result<VerifiedPurchase, ServiceError> {
        let well_formed = !checkout_id.is_empty()
            && checkout_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(ServiceError::Rejected("invalid checkout id".into()));
        }

        let url = format!("{}/v1/checkouts/{checkout_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::PurchaseNotFound(checkout_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let checkout: PolarCheckout = response
            .json()
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        self.check(checkout)
    }
}

/// Local development verifier: any `dev_*` checkout id counts as paid.
pub struct DevVerifier;

impl PurchaseVerifier for DevVerifier {
    fn verify(&self, checkout_id: &str) -> Result<VerifiedPurchase, ServiceError> {
        if !checkout_id.starts_with(DEV_CHECKOUT_PREFIX) {
            return Err(ServiceError::PurchaseNotFound(checkout_id.to_string()));
        }
        tracing::warn!(checkout_id, "Accepting development checkout without payment");
        Ok(VerifiedPurchase {
            checkout_id: checkout_id.to_string(),
            customer_email: None,
            product_id: "dev".to_string(),
        })
    }
}
