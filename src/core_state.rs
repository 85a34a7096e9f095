//! Transport-agnostic application state and the report use cases.
//!
//! `CoreState` is shared behind an `Arc` by every request handler. All
//! operations are synchronous (SQLite, PBKDF2, blocking HTTP); async
//! callers run them through `tokio::task::spawn_blocking`.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::crypto::{
    CryptoError, MasterSecret, ReportSealer, SealedBlob, TokenClaims, TokenError, TokenPurpose,
    TokenSigner,
};
use crate::db::{DatabaseError, ReportListing, ReportRecord, ReportStore, SqliteReportStore};
use crate::genome::{parse_upload, GenomeError, ParseStats, SourceFormat};
use crate::report::{Report, ReportError, ReportPreview};
use crate::services::{
    mask_email, report_link_email, DevVerifier, LogMailer, Mailer, PolarVerifier,
    PurchaseVerifier, ResendMailer, ServiceError,
};

const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Upload rejected: {0}")]
    Genome(#[from] GenomeError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Checkout id is required")]
    MissingCheckout,
    #[error("Email does not match the purchase")]
    EmailMismatch,
    #[error("Checkout {0} has already been redeemed")]
    AlreadyRedeemed(String),
    #[error("Report not found")]
    NotFound,
}

/// Result of a free upload
#[derive(Debug, Clone, Serialize)]
pub struct PreviewOutcome {
    pub format: SourceFormat,
    pub stats: ParseStats,
    pub preview: ReportPreview,
}

/// Returned once after a purchase is redeemed
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub report_id: Uuid,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub insight_count: usize,
}

pub struct CoreState {
    config: AppConfig,
    signer: TokenSigner,
    sealer: ReportSealer,
    store: Arc<dyn ReportStore>,
    mailer: Arc<dyn Mailer>,
    verifier: Arc<dyn PurchaseVerifier>,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ReportStore>,
        mailer: Arc<dyn Mailer>,
        verifier: Arc<dyn PurchaseVerifier>,
    ) -> Result<Self, CoreError> {
        let subkeys = MasterSecret::new(&config.secret)?.derive_subkeys()?;
        let signer = TokenSigner::new(subkeys.token_key);
        let sealer = ReportSealer::new(&subkeys.sealing_passphrase, config.pbkdf2_iterations);

        Ok(Self {
            config,
            signer,
            sealer,
            store,
            mailer,
            verifier,
        })
    }

    /// Wire the production adapters selected by `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let store: Arc<dyn ReportStore> =
            Arc::new(SqliteReportStore::open(&config.database_path())?);

        let mailer: Arc<dyn Mailer> = match &config.resend {
            Some(resend) => Arc::new(ResendMailer::new(
                &resend.api_key,
                &resend.from,
                config.http_timeout_secs,
            )?),
            None => {
                tracing::warn!("GENI_RESEND_API_KEY not set, emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        let verifier: Arc<dyn PurchaseVerifier> = match &config.polar {
            Some(polar) => Arc::new(PolarVerifier::new(
                &polar.access_token,
                &polar.product_id,
                polar.api_url.as_deref(),
                config.http_timeout_secs,
            )?),
            None => {
                tracing::warn!("GENI_POLAR_TOKEN not set, only dev_ checkouts are accepted");
                Arc::new(DevVerifier)
            }
        };

        Self::new(config, store, mailer, verifier)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse an upload and return the paywalled view. Nothing is stored.
    pub fn preview(&self, upload: &[u8]) -> Result<PreviewOutcome, CoreError> {
        let genome = parse_upload(upload)?;
        let report = Report::build(&genome);
        let preview = ReportPreview::from_report(&report);

        tracing::info!(
            format = genome.format.as_str(),
            snps = report.snp_count,
            insights = report.insights.len(),
            "Preview generated"
        );

        Ok(PreviewOutcome {
            format: genome.format,
            stats: genome.stats,
            preview,
        })
    }

    /// Redeem a paid checkout: build, seal and store the full report, then
    /// email the access link.
    pub fn purchase(
        &self,
        upload: &[u8],
        checkout_id: &str,
        email: &str,
    ) -> Result<PurchaseReceipt, CoreError> {
        let email = normalize_email(email)?;
        let checkout_id = checkout_id.trim();
        if checkout_id.is_empty() {
            return Err(CoreError::MissingCheckout);
        }

        let purchase = self.verifier.verify(checkout_id)?;
        if let Some(customer) = &purchase.customer_email {
            if !customer.trim().eq_ignore_ascii_case(&email) {
                tracing::warn!(
                    checkout_id,
                    supplied = %mask_email(&email),
                    "Purchase email mismatch"
                );
                return Err(CoreError::EmailMismatch);
            }
        }

        if self.store.find_by_checkout(checkout_id)?.is_some() {
            return Err(CoreError::AlreadyRedeemed(checkout_id.to_string()));
        }

        let genome = parse_upload(upload)?;
        let report = Report::build(&genome);
        let json = report.to_json_bytes()?;
        let sealed = self.sealer.seal(report.id, &json)?;

        let record = ReportRecord {
            id: report.id,
            owner_email: email.clone(),
            checkout_id: checkout_id.to_string(),
            source_format: report.source_format,
            insight_count: report.insights.len(),
            sealed: sealed.to_bytes(),
            created_at: Utc::now(),
        };
        match self.store.insert(&record) {
            Ok(()) => {}
            // Lost a race with a concurrent redemption of the same checkout
            Err(DatabaseError::ConstraintViolation(_)) => {
                return Err(CoreError::AlreadyRedeemed(checkout_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        let issued = self.signer.issue(
            report.id,
            &email,
            TokenPurpose::ReportAccess,
            self.token_ttl(),
        )?;

        tracing::info!(
            report_id = %report.id,
            checkout_id,
            owner = %mask_email(&email),
            insights = record.insight_count,
            "Report purchased and sealed"
        );

        if let Err(e) = self.send_link(&email, report.id, &issued.token) {
            tracing::error!(report_id = %report.id, error = %e, "Failed to email report link");
        }

        Ok(PurchaseReceipt {
            report_id: report.id,
            access_token: issued.token,
            expires_at: issued.claims.expires_at(),
            insight_count: record.insight_count,
        })
    }

    /// Check a bearer token and return its claims.
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, CoreError> {
        Ok(self.signer.verify(token, TokenPurpose::ReportAccess)?)
    }

    /// Load and decrypt a stored report.
    pub fn fetch(&self, report_id: Uuid) -> Result<Report, CoreError> {
        let record = self.store.find(&report_id)?.ok_or(CoreError::NotFound)?;
        let blob = SealedBlob::from_bytes(&record.sealed)?;
        let json = self.sealer.open(report_id, &blob)?;
        let report = Report::from_json_bytes(&json)?;

        tracing::info!(%report_id, "Report opened");
        Ok(report)
    }

    /// Erase a stored report.
    pub fn delete(&self, report_id: Uuid) -> Result<(), CoreError> {
        match self.store.delete(&report_id) {
            Ok(()) => {
                tracing::info!(%report_id, "Report erased");
                Ok(())
            }
            Err(DatabaseError::NotFound { .. }) => Err(CoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Reports owned by the same address, newest first.
    pub fn library(&self, email: &str) -> Result<Vec<ReportListing>, CoreError> {
        let email = normalize_email(email)?;
        Ok(self.store.list_for_owner(&email)?)
    }

    /// Issue and email a fresh access link for an already-redeemed checkout.
    /// An unknown checkout and a wrong address look the same to the caller.
    pub fn resend_link(&self, checkout_id: &str, email: &str) -> Result<(), CoreError> {
        let email = normalize_email(email)?;
        let checkout_id = checkout_id.trim();
        if checkout_id.is_empty() {
            return Err(CoreError::MissingCheckout);
        }

        let record = self
            .store
            .find_by_checkout(checkout_id)?
            .filter(|r| r.owner_email == email)
            .ok_or(CoreError::NotFound)?;

        let issued = self.signer.issue(
            record.id,
            &email,
            TokenPurpose::ReportAccess,
            self.token_ttl(),
        )?;
        self.send_link(&email, record.id, &issued.token)?;

        tracing::info!(report_id = %record.id, owner = %mask_email(&email), "Report link resent");
        Ok(())
    }

    fn token_ttl(&self) -> Duration {
        Duration::hours(self.config.token_ttl_hours)
    }

    fn send_link(&self, email: &str, report_id: Uuid, token: &str) -> Result<(), ServiceError> {
        let link = self.config.report_link(&report_id, token);
        let message = report_link_email(email, &link, self.config.token_ttl_hours);
        self.mailer.send(&message)
    }
}

/// Trim, lowercase and shape-check an address.
pub fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_SHAPE.is_match(&email) {
        return Err(CoreError::InvalidEmail);
    }
    Ok(email)
}
