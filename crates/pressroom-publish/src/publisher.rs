use async_trait::async_trait;
use pressroom_core::Platform;
use serde::Serialize;

use crate::error::PublishError;
use crate::post::PublishPost;

/// Where a post ended up on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePost {
    pub remote_id: String,
    pub url: Option<String>,
}

/// A blogging platform that can receive posts.
#[async_trait]
pub trait BlogPublisher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Creates a new post.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on auth, transport, or API failure.
    async fn publish(&self, post: &PublishPost) -> Result<RemotePost, PublishError>;

    /// Replaces an existing post.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Unsupported`] unless the platform overrides it.
    async fn update(&self, remote_id: &str, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let _ = (remote_id, post);
        Err(PublishError::Unsupported {
            platform: self.platform(),
            operation: "updating posts",
        })
    }

    /// Checks the credentials and returns the account or site name.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Unauthorized`] when the credentials are
    /// rejected.
    async fn verify(&self) -> Result<String, PublishError>;
}
