//! Network reachability probe
//!
//! Query fallback to the remote engine is gated on reachability: there is
//! no point demoting the session to remote mode when the device is offline.
//! `None` means the platform cannot answer, which the gate treats the same
//! as unreachable.

use async_trait::async_trait;

/// Answers whether the internet is currently reachable.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn internet_is_available(&self) -> Option<bool>;
}

/// Reachability probe that sends a HEAD request to a configured URL.
///
/// Any HTTP answer at all counts as reachable; only transport failures
/// count against availability.
pub struct HttpReachability {
    probe_url: String,
    client: reqwest::Client,
}

impl HttpReachability {
    pub fn new(probe_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        HttpReachability {
            probe_url: probe_url.into(),
            client,
        }
    }
}

#[async_trait]
impl Reachability for HttpReachability {
    async fn internet_is_available(&self) -> Option<bool> {
        match self.client.head(&self.probe_url).send().await {
            Ok(_) => Some(true),
            Err(_) => Some(false),
        }
    }
}
