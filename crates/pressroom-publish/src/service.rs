//! Routes posts to the configured platform publishers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pressroom_core::{AppConfig, Platform};
use pressroom_shopify::AdminClient;

use crate::error::PublishError;
use crate::platforms::{
    GhostPublisher, MediumPublisher, ShopifyPublisher, WebflowPublisher, WordPressPublisher,
};
use crate::post::PublishPost;
use crate::publisher::{BlogPublisher, RemotePost};

/// The result of publishing to one platform.
#[derive(Debug)]
pub struct PlatformOutcome {
    pub platform: Platform,
    pub result: Result<RemotePost, PublishError>,
}

impl PlatformOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Holds one publisher per configured platform.
///
/// Publishing is never retried here: a failed create may still have created
/// the post remotely, and a blind retry would duplicate it.
#[derive(Clone)]
pub struct BlogIntegrationService {
    publishers: BTreeMap<Platform, Arc<dyn BlogPublisher>>,
    delay: Duration,
}

impl BlogIntegrationService {
    #[must_use]
    pub fn new(delay_between_platforms: Duration) -> Self {
        Self {
            publishers: BTreeMap::new(),
            delay: delay_between_platforms,
        }
    }

    /// Builds a publisher for every platform whose credentials are present.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::InvalidCredentials`] for a malformed Ghost
    /// key, or an HTTP/Shopify error if a client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, PublishError> {
        let timeout = config.http_timeout_secs;
        let ua = config.user_agent.as_str();
        let mut service = Self::new(Duration::from_millis(config.publish_delay_ms));

        if let Some(shopify) = config.shopify() {
            let client = AdminClient::new(
                &shopify.store_domain,
                &shopify.admin_access_token,
                &shopify.api_version,
                timeout,
            )?
            .with_storefront_url(&shopify.storefront_url)
            .with_retry(config.max_retries, config.retry_backoff_base_secs);
            service.insert(Arc::new(ShopifyPublisher::new(
                client,
                shopify.default_blog_id.clone(),
            )));
        }
        if let Some(wp) = &config.platforms.wordpress {
            service.insert(Arc::new(WordPressPublisher::new(
                &wp.base_url,
                &wp.username,
                &wp.app_password,
                timeout,
                ua,
            )?));
        }
        if let Some(ghost) = &config.platforms.ghost {
            service.insert(Arc::new(GhostPublisher::new(
                &ghost.base_url,
                &ghost.admin_api_key,
                timeout,
                ua,
            )?));
        }
        if let Some(medium) = &config.platforms.medium {
            service.insert(Arc::new(MediumPublisher::new(
                &medium.integration_token,
                timeout,
                ua,
            )?));
        }
        if let Some(webflow) = &config.platforms.webflow {
            service.insert(Arc::new(WebflowPublisher::new(
                &webflow.api_token,
                &webflow.collection_id,
                timeout,
                ua,
            )?));
        }

        Ok(service)
    }

    /// Registers `publisher`, replacing any existing one for its platform.
    pub fn insert(&mut self, publisher: Arc<dyn BlogPublisher>) {
        self.publishers.insert(publisher.platform(), publisher);
    }

    /// Configured platforms in [`Platform`] order.
    #[must_use]
    pub fn configured_platforms(&self) -> Vec<Platform> {
        self.publishers.keys().copied().collect()
    }

    #[must_use]
    pub fn is_configured(&self, platform: Platform) -> bool {
        self.publishers.contains_key(&platform)
    }

    fn publisher(&self, platform: Platform) -> Result<&Arc<dyn BlogPublisher>, PublishError> {
        self.publishers
            .get(&platform)
            .ok_or(PublishError::NotConfigured(platform))
    }

    /// # Errors
    ///
    /// Returns [`PublishError::NotConfigured`] or the publisher's error.
    pub async fn publish(&self, platform: Platform, post: &PublishPost) -> Result<RemotePost, PublishError> {
        let remote = self.publisher(platform)?.publish(post).await?;
        tracing::info!(
            %platform,
            slug = %post.slug,
            remote_id = %remote.remote_id,
            draft = post.draft,
            "published post"
        );
        Ok(remote)
    }

    /// Publishes to each platform in turn, sleeping the configured delay
    /// between platforms.
    ///
    /// A failure on one platform is recorded and the rest still run. Returns
    /// one outcome per distinct platform, in request order.
    pub async fn publish_to_many(&self, platforms: &[Platform], post: &PublishPost) -> Vec<PlatformOutcome> {
        self.publish_or_update_many(platforms, &BTreeMap::new(), post)
            .await
    }

    /// Like [`Self::publish_to_many`], but platforms with an entry in
    /// `existing` get their remote copy updated instead of a new post.
    ///
    /// Creates and updates share one pass, so request order and the delay
    /// between platforms hold for both.
    pub async fn publish_or_update_many(
        &self,
        platforms: &[Platform],
        existing: &BTreeMap<Platform, String>,
        post: &PublishPost,
    ) -> Vec<PlatformOutcome> {
        let mut outcomes: Vec<PlatformOutcome> = Vec::with_capacity(platforms.len());

        for &platform in platforms {
            if outcomes.iter().any(|o| o.platform == platform) {
                continue;
            }
            if !outcomes.is_empty() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let result = match existing.get(&platform) {
                Some(remote_id) => self.update(platform, remote_id, post).await,
                None => self.publish(platform, post).await,
            };
            if let Err(e) = &result {
                tracing::warn!(
                    %platform,
                    slug = %post.slug,
                    update = existing.contains_key(&platform),
                    error = %e,
                    "publish failed"
                );
            }
            outcomes.push(PlatformOutcome { platform, result });
        }

        outcomes
    }

    /// # Errors
    ///
    /// Returns [`PublishError::NotConfigured`], [`PublishError::Unsupported`]
    /// for platforms without edits, or the publisher's error.
    pub async fn update(
        &self,
        platform: Platform,
        remote_id: &str,
        post: &PublishPost,
    ) -> Result<RemotePost, PublishError> {
        let remote = self.publisher(platform)?.update(remote_id, post).await?;
        tracing::info!(%platform, slug = %post.slug, remote_id, "updated post");
        Ok(remote)
    }

    /// # Errors
    ///
    /// Returns [`PublishError::NotConfigured`] or the publisher's error.
    pub async fn verify(&self, platform: Platform) -> Result<String, PublishError> {
        self.publisher(platform)?.verify().await
    }
}

impl std::fmt::Debug for BlogIntegrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogIntegrationService")
            .field("platforms", &self.configured_platforms())
            .field("delay", &self.delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::post::ArticleContent;

    struct Fake {
        platform: Platform,
        fail: bool,
        calls: Arc<Mutex<Vec<(&'static str, Platform)>>>,
    }

    #[async_trait]
    impl BlogPublisher for Fake {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn publish(&self, _post: &PublishPost) -> Result<RemotePost, PublishError> {
            self.calls.lock().unwrap().push(("publish", self.platform));
            if self.fail {
                return Err(PublishError::Api {
                    platform: self.platform,
                    status: 500,
                    message: "boom".to_owned(),
                });
            }
            Ok(RemotePost {
                remote_id: format!("{}-1", self.platform),
                url: None,
            })
        }

        async fn update(&self, remote_id: &str, _post: &PublishPost) -> Result<RemotePost, PublishError> {
            if self.platform == Platform::Medium {
                return Err(PublishError::Unsupported {
                    platform: self.platform,
                    operation: "updating posts",
                });
            }
            self.calls.lock().unwrap().push(("update", self.platform));
            Ok(RemotePost {
                remote_id: remote_id.to_owned(),
                url: None,
            })
        }

        async fn verify(&self) -> Result<String, PublishError> {
            Ok("fake".to_owned())
        }
    }

    type Calls = Arc<Mutex<Vec<(&'static str, Platform)>>>;

    fn service(calls: &Calls) -> BlogIntegrationService {
        let mut service = BlogIntegrationService::new(Duration::ZERO);
        for (platform, fail) in [(Platform::Ghost, true), (Platform::Medium, false), (Platform::WordPress, false)] {
            service.insert(Arc::new(Fake {
                platform,
                fail,
                calls: Arc::clone(calls),
            }));
        }
        service
    }

    fn post() -> PublishPost {
        PublishPost::from_article(
            &ArticleContent {
                title: "T",
                slug: "t",
                body_markdown: "Body",
                ..ArticleContent::default()
            },
            false,
        )
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let service = service(&calls);

        let outcomes = service
            .publish_to_many(
                &[Platform::Medium, Platform::Ghost, Platform::Webflow, Platform::Medium, Platform::WordPress],
                &post(),
            )
            .await;

        let platforms: Vec<Platform> = outcomes.iter().map(|o| o.platform).collect();
        assert_eq!(
            platforms,
            vec![Platform::Medium, Platform::Ghost, Platform::Webflow, Platform::WordPress]
        );
        assert!(outcomes[0].is_success());
        assert!(matches!(outcomes[1].result, Err(PublishError::Api { status: 500, .. })));
        assert!(matches!(
            outcomes[2].result,
            Err(PublishError::NotConfigured(Platform::Webflow))
        ));
        assert!(outcomes[3].is_success());
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ("publish", Platform::Medium),
                ("publish", Platform::Ghost),
                ("publish", Platform::WordPress)
            ]
        );
    }

    #[tokio::test]
    async fn updates_and_creates_keep_request_order() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let service = service(&calls);
        let existing = BTreeMap::from([(Platform::WordPress, "wp-9".to_owned())]);

        let outcomes = service
            .publish_or_update_many(&[Platform::Medium, Platform::WordPress], &existing, &post())
            .await;

        let platforms: Vec<Platform> = outcomes.iter().map(|o| o.platform).collect();
        assert_eq!(platforms, vec![Platform::Medium, Platform::WordPress]);
        assert_eq!(outcomes[1].result.as_ref().unwrap().remote_id, "wp-9");
        assert_eq!(
            *calls.lock().unwrap(),
            vec![("publish", Platform::Medium), ("update", Platform::WordPress)]
        );
    }

    #[tokio::test]
    async fn delay_applies_between_updates_too() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut service = service(&calls);
        service.delay = Duration::from_millis(150);
        let existing = BTreeMap::from([
            (Platform::WordPress, "wp-9".to_owned()),
            (Platform::Ghost, "gh-3".to_owned()),
        ]);

        let started = std::time::Instant::now();
        let outcomes = service
            .publish_or_update_many(&[Platform::WordPress, Platform::Ghost], &existing, &post())
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn medium_update_is_unsupported() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let err = service(&calls)
            .update(Platform::Medium, "abc", &post())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::Unsupported {
                platform: Platform::Medium,
                ..
            }
        ));
    }

    #[test]
    fn configured_platforms_are_ordered() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        assert_eq!(
            service(&calls).configured_platforms(),
            vec![Platform::WordPress, Platform::Ghost, Platform::Medium]
        );
    }
}
