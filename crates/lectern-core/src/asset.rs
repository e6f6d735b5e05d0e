//! Bundled database asset resolution and fingerprinting
//!
//! The app ships a prebuilt SQLite database as a bundled asset. This module
//! owns the fingerprint type used to detect a changed bundle, the resolved
//! asset descriptor, and the `AssetSource` seam that turns the platform's
//! asset contract into bytes on disk.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Result type for asset/sync operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Content fingerprint of a bundled asset (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetFingerprint(String);

impl AssetFingerprint {
    /// Compute the SHA-256 fingerprint of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        AssetFingerprint(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for AssetFingerprint {
    type Error = SyncError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SyncError::InvalidFingerprint(s));
        }
        Ok(AssetFingerprint(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for AssetFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved bundled asset: where to fetch it and what it should hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundledAsset {
    pub uri: String,
    pub fingerprint: AssetFingerprint,
}

/// Persisted record of the last successful local synchronization.
///
/// Only the fingerprint participates in the availability decision; the
/// timestamp is operational metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub fingerprint: AssetFingerprint,
    pub synced_at: DateTime<Utc>,
}

/// Platform seam for the bundled database asset.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Resolve the bundle to a fetchable location and its content fingerprint.
    async fn resolve(&self) -> SyncResult<BundledAsset>;

    /// Fetch the resolved asset's bytes.
    async fn fetch(&self, asset: &BundledAsset) -> SyncResult<Vec<u8>>;
}

/// Asset source that downloads the bundle over HTTP.
pub struct HttpAssetSource {
    descriptor: BundledAsset,
    client: reqwest::Client,
}

impl HttpAssetSource {
    /// Describe a downloadable bundle by URL and expected fingerprint.
    pub fn new(uri: impl Into<String>, fingerprint: AssetFingerprint) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        HttpAssetSource {
            descriptor: BundledAsset {
                uri: uri.into(),
                fingerprint,
            },
            client,
        }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn resolve(&self) -> SyncResult<BundledAsset> {
        Ok(self.descriptor.clone())
    }

    async fn fetch(&self, asset: &BundledAsset) -> SyncResult<Vec<u8>> {
        let response = self
            .client
            .get(&asset.uri)
            .send()
            .await
            .map_err(|e| SyncError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Download(format!(
                "{} answered {}",
                asset.uri,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
