use async_trait::async_trait;

use crate::domain::errors::Result;

/// Port for the local selective-forwarding media engine
#[async_trait]
pub trait LocalMediaEngine: Send + Sync {
    /// Hand an SDP offer to the engine; returns the playable local path
    async fn publish_offer(&self, path_hint: &str, offer_sdp: &str) -> Result<String>;
}
