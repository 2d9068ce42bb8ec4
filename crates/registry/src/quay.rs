use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use wharfhook_core::config::RegistryConfig;

use crate::{TagResolver, Tagger};

fn tag_url(host: &str, repository: &str, tag: &str) -> String {
    format!("https://{host}/v1/repositories/{repository}/tags/{tag}")
}

/// [`TagResolver`] backed by the Quay registry API. The tag endpoint returns
/// the image identifier as a JSON-encoded string body.
pub struct QuayTagResolver {
    host: String,
    client: reqwest::Client,
}

impl QuayTagResolver {
    pub fn new(config: &RegistryConfig) -> Self {
        Self { host: config.host.clone(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl TagResolver for QuayTagResolver {
    async fn resolve(&self, repository: &str, tag: &str) -> Result<String> {
        let response = self.client.get(tag_url(&self.host, repository, tag)).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Unsuccessful request: {}", status);
        }
        let image_id: String = response.json().await?;
        Ok(image_id)
    }
}

/// [`Tagger`] backed by the Quay registry API: an authenticated, idempotent
/// PUT of the image identifier to the tag endpoint.
pub struct QuayTagger {
    host: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl QuayTagger {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let (username, password) = config
            .auth
            .split_once(':')
            .context("Registry auth must be a colon-delimited user:password pair")?;
        Ok(Self {
            host: config.host.clone(),
            username: username.to_string(),
            password: password.to_string(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Tagger for QuayTagger {
    async fn tag(&self, repository: &str, image_id: &str, tag: &str) -> Result<()> {
        tracing::debug!("Tagging {}/{} -> {}", repository, tag, image_id);
        let response = self
            .client
            .put(tag_url(&self.host, repository, tag))
            .basic_auth(&self.username, Some(&self.password))
            .json(&image_id)
            .send()
            .await?;
        let status = response.status();
        if status.as_u16() >= 300 {
            bail!("Unsuccessful request: {}", status);
        }
        Ok(())
    }
}
