use serde::Deserialize;
use wharfhook_core::models::{BuildEvent, BuildState};

/// Quay-style build notification payload. The reported state is not part of
/// the payload; the registry encodes it in the webhook path instead.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildPayload {
    /// `owner/name` source repository.
    pub repository: String,
    /// Link to the build page, used as the status target URL.
    pub homepage: String,
    /// Tags the registry applied to the built image.
    #[serde(default)]
    pub docker_tags: Vec<String>,
    /// What triggered the build, e.g. `github` or `manual`.
    pub trigger_kind: Option<String>,
    pub trigger_metadata: Option<TriggerMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerMetadata {
    /// Fully qualified git reference, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}

impl BuildPayload {
    /// Whether the build was started by hand rather than by a recognized
    /// automated trigger. Manual builds carry no usable git metadata.
    pub fn manually_triggered(&self) -> bool {
        if self.trigger_kind.as_deref() == Some("manual") {
            return true;
        }
        !matches!(&self.trigger_metadata, Some(TriggerMetadata { git_ref: Some(_) }))
    }

    /// Normalize into a [`BuildEvent`], or `None` for manually triggered
    /// builds, which never reach the handler.
    pub fn into_event(self, state: BuildState) -> Option<BuildEvent> {
        if self.manually_triggered() {
            return None;
        }
        let git_ref = strip_ref_prefix(
            self.trigger_metadata.as_ref().and_then(|m| m.git_ref.as_deref())?,
        )
        .to_string();
        Some(BuildEvent {
            repository: self.repository,
            git_ref,
            state,
            build_url: self.homepage,
            registry_tag: self.docker_tags.into_iter().next(),
        })
    }
}

/// Strip the `refs/heads/` or `refs/tags/` qualifier, leaving the label.
fn strip_ref_prefix(git_ref: &str) -> &str {
    git_ref
        .strip_prefix("refs/heads/")
        .or_else(|| git_ref.strip_prefix("refs/tags/"))
        .unwrap_or(git_ref)
}
