// File: crates/tailortalk_gcal/src/auth.rs
use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{parse_service_account_key, read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use tailortalk_config::{GcalConfig, SECRET_MARKER};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

static CALENDAR_HUB: OnceCell<Arc<HubType>> = OnceCell::const_new();

#[derive(Error, Debug)]
pub enum GcalAuthError {
    #[error("No Google Calendar credentials configured (set gcal.credentials_base64 or gcal.key_path)")]
    MissingCredentials,
    #[error("Credentials are not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("Failed to load service account key: {0}")]
    InvalidKey(#[source] std::io::Error),
    #[error("Failed to build authenticator: {0}")]
    Authenticator(#[source] std::io::Error),
    #[error("Failed to load TLS root certificates: {0}")]
    Tls(#[source] std::io::Error),
}

/// Where the service account key comes from.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CredentialSource {
    Inline(Vec<u8>),
    KeyFile(PathBuf),
}

/// Inline base64 credentials win over a key file.
pub(crate) fn credential_source(config: &GcalConfig) -> Result<CredentialSource, GcalAuthError> {
    let configured = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != SECRET_MARKER)
            .map(str::to_string)
    };

    if let Some(encoded) = configured(&config.credentials_base64) {
        return Ok(CredentialSource::Inline(STANDARD.decode(encoded)?));
    }
    if let Some(path) = configured(&config.key_path) {
        return Ok(CredentialSource::KeyFile(PathBuf::from(path)));
    }
    Err(GcalAuthError::MissingCredentials)
}

pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, GcalAuthError> {
    let sa_key = match credential_source(config)? {
        CredentialSource::Inline(json) => {
            parse_service_account_key(json).map_err(GcalAuthError::InvalidKey)?
        }
        CredentialSource::KeyFile(path) => read_service_account_key(&path)
            .await
            .map_err(GcalAuthError::InvalidKey)?,
    };

    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(GcalAuthError::Authenticator)?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(GcalAuthError::Tls)?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    Ok(CalendarHub::new(client, auth))
}

/// The process-wide hub, authenticated on first use.
///
/// A failed initialization is not cached; the next caller tries again.
pub async fn shared_calendar_hub(config: &GcalConfig) -> Result<Arc<HubType>, GcalAuthError> {
    CALENDAR_HUB
        .get_or_try_init(|| async {
            info!("Authenticating Google Calendar service account");
            create_calendar_hub(config).await.map(Arc::new)
        })
        .await
        .cloned()
}
