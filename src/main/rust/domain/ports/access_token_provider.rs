use async_trait::async_trait;

use crate::domain::errors::Result;

/// Port for the credential collaborator that authorizes command API calls
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self, redirect_hint: Option<&str>) -> Result<String>;
}
