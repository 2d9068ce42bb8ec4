use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use wharfhook_core::{
    config::GitHubConfig,
    models::{split_repository, CommitStatus},
};

/// Capability for creating commit statuses against a source-control hosting
/// API. Exactly one status record per call; errors are propagated unmodified
/// and never retried here.
#[async_trait]
pub trait CommitStatusSink: Send + Sync {
    async fn create(&self, status: &CommitStatus) -> Result<()>;
}

/// In-memory [`CommitStatusSink`] that appends to an ordered record list.
/// Not safe for concurrent mutation across shared test cases without
/// external coordination; give each test its own instance.
#[derive(Default)]
pub struct MemoryStatusSink {
    statuses: Mutex<Vec<CommitStatus>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self { Self::default() }

    pub fn recorded(&self) -> Vec<CommitStatus> { self.statuses.lock().unwrap().clone() }

    pub fn reset(&self) { self.statuses.lock().unwrap().clear() }
}

#[async_trait]
impl CommitStatusSink for MemoryStatusSink {
    async fn create(&self, status: &CommitStatus) -> Result<()> {
        self.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }
}

/// [`CommitStatusSink`] backed by the GitHub commit status API.
pub struct GitHubStatusSink {
    client: Octocrab,
}

impl GitHubStatusSink {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(config.token.clone())
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CommitStatusSink for GitHubStatusSink {
    async fn create(&self, status: &CommitStatus) -> Result<()> {
        let (owner, name) = split_repository(&status.repository)?;
        let body = serde_json::json!({
            "state": status.state.as_str(),
            "target_url": status.target_url,
            "description": status.description,
            "context": status.context,
        });
        tracing::debug!(
            "Creating {} status for {}/{}@{}",
            status.state,
            owner,
            name,
            status.git_ref
        );
        let _: serde_json::Value = self
            .client
            .post(format!("/repos/{owner}/{name}/statuses/{}", status.git_ref), Some(&body))
            .await?;
        Ok(())
    }
}
