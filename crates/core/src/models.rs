use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// Context label identifying this integration in commit status UIs.
pub const STATUS_CONTEXT: &str = "Docker Image";

/// A build state outside the recognized enumeration. Rejected before any
/// side effect occurs, so it stays distinguishable from adapter errors.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unrecognized build state {0:?}")]
pub struct UnrecognizedState(pub String);

/// A repository that does not split into non-empty `owner/name` segments.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("malformed repository {0:?}, expected owner/name")]
pub struct MalformedRepository(pub String);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Pending,
    Success,
    Failure,
}

impl BuildState {
    pub const fn variants() -> &'static [Self] { &[Self::Pending, Self::Success, Self::Failure] }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Human-readable description shown alongside the commit status.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "The Docker image is building",
            Self::Success => "The Docker image was built",
            Self::Failure => "The Docker image failed to build",
        }
    }
}

impl FromStr for BuildState {
    type Err = UnrecognizedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(UnrecognizedState(s.to_string())),
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Normalized record of one registry build-completion notification.
/// Constructed by the webhook layer, consumed exactly once by the handler.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildEvent {
    /// `owner/name` source repository.
    pub repository: String,
    /// Commit-ish the build was triggered from; may be a branch-qualified label.
    pub git_ref: String,
    pub state: BuildState,
    /// Link back to the build, used as the status target URL.
    pub build_url: String,
    /// Registry tag the build produced, when the payload carried one.
    pub registry_tag: Option<String>,
}

/// A GitHub commit status. Write-once: sent to the sink, then discarded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommitStatus {
    pub repository: String,
    pub git_ref: String,
    pub state: BuildState,
    pub context: String,
    pub description: String,
    pub target_url: String,
}

impl CommitStatus {
    pub fn for_event(event: &BuildEvent) -> Self {
        Self {
            repository: event.repository.clone(),
            git_ref: event.git_ref.clone(),
            state: event.state,
            context: STATUS_CONTEXT.to_string(),
            description: event.state.description().to_string(),
            target_url: event.build_url.clone(),
        }
    }
}

/// Split `owner/name` into its two segments. Anything else is a hard error,
/// not a silent skip.
pub fn split_repository(repository: &str) -> Result<(&str, &str), MalformedRepository> {
    match repository.split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((owner, name))
        }
        _ => Err(MalformedRepository(repository.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_from_str() {
        let cases: &[(&str, Option<BuildState>)] = &[
            ("pending", Some(BuildState::Pending)),
            ("success", Some(BuildState::Success)),
            ("failure", Some(BuildState::Failure)),
            ("foo", None),
            ("", None),
            ("Pending", None),
        ];
        for &(s, expected) in cases {
            assert_eq!(BuildState::from_str(s).ok(), expected, "state {s:?}");
        }
    }

    #[test]
    fn test_build_state_descriptions() {
        for state in BuildState::variants() {
            assert!(!state.description().is_empty());
        }
        assert_eq!(BuildState::Pending.description(), "The Docker image is building");
        assert_eq!(BuildState::Success.description(), "The Docker image was built");
        assert_eq!(BuildState::Failure.description(), "The Docker image failed to build");
    }

    #[test]
    fn test_split_repository() {
        let cases: &[(&str, Option<(&str, &str)>)] = &[
            ("ejholmes/docker-statsd", Some(("ejholmes", "docker-statsd"))),
            ("owner/name", Some(("owner", "name"))),
            ("no-slash", None),
            ("/name", None),
            ("owner/", None),
            ("a/b/c", None),
            ("", None),
        ];
        for &(repo, expected) in cases {
            assert_eq!(split_repository(repo).ok(), expected, "repository {repo:?}");
        }
    }

    #[test]
    fn test_status_for_event() {
        let event = BuildEvent {
            repository: "ejholmes/docker-statsd".to_string(),
            git_ref: "long-f1fb3b0".to_string(),
            state: BuildState::Pending,
            build_url: "https://quay.io/repository/ejholmes/docker-statsd/build/123".to_string(),
            registry_tag: Some("long-f1fb3b0".to_string()),
        };
        let status = CommitStatus::for_event(&event);
        assert_eq!(status.repository, "ejholmes/docker-statsd");
        assert_eq!(status.git_ref, "long-f1fb3b0");
        assert_eq!(status.state, BuildState::Pending);
        assert_eq!(status.context, STATUS_CONTEXT);
        assert_eq!(status.description, "The Docker image is building");
        assert_eq!(status.target_url, event.build_url);
    }
}
