use std::sync::Arc;

use anyhow::{Context, Result};
use wharfhook_core::models::{BuildEvent, BuildState, CommitStatus};
use wharfhook_github::{CommitStatusSink, MemoryStatusSink};
use wharfhook_registry::{MemoryTagResolver, MemoryTagger, TagResolver, Tagger};

/// Capability slots for [`BuildEventHandler`]. Each omitted slot falls back
/// to its in-memory variant independently, so the handler is always
/// constructible and safely callable with partial configuration.
#[derive(Default)]
pub struct HandlerOptions {
    pub statuses: Option<Arc<dyn CommitStatusSink>>,
    pub resolver: Option<Arc<dyn TagResolver>>,
    pub tagger: Option<Arc<dyn Tagger>>,
}

/// Stateless orchestrator for normalized build events: creates a commit
/// status for every event, and stabilizes the built image's tags on success.
#[derive(Clone)]
pub struct BuildEventHandler {
    statuses: Arc<dyn CommitStatusSink>,
    resolver: Arc<dyn TagResolver>,
    tagger: Arc<dyn Tagger>,
}

impl Default for BuildEventHandler {
    fn default() -> Self { Self::new(HandlerOptions::default()) }
}

impl BuildEventHandler {
    pub fn new(options: HandlerOptions) -> Self {
        Self {
            statuses: options.statuses.unwrap_or_else(|| Arc::new(MemoryStatusSink::new())),
            resolver: options.resolver.unwrap_or_else(|| Arc::new(MemoryTagResolver::new())),
            tagger: options.tagger.unwrap_or_else(|| Arc::new(MemoryTagger::new())),
        }
    }

    /// Handle one build event. Strictly sequential: status creation first,
    /// then (on success) tag stabilization. The first failure aborts the
    /// remainder and is returned to the caller.
    pub async fn handle(&self, event: &BuildEvent) -> Result<()> {
        self.statuses.create(&CommitStatus::for_event(event)).await?;

        if event.state == BuildState::Success {
            self.stabilize_tags(event).await?;
        }
        Ok(())
    }

    /// Resolve the built tag to its immutable image identifier, then tag the
    /// image with the triggering commit reference and with the identifier
    /// itself, so it stays pullable by either even though the registry only
    /// supports pulling by tag name.
    async fn stabilize_tags(&self, event: &BuildEvent) -> Result<()> {
        let tag = event
            .registry_tag
            .as_deref()
            .with_context(|| format!("Build event for {} has no registry tag", event.repository))?;
        let image_id = self.resolver.resolve(&event.repository, tag).await?;
        tracing::info!("Resolved {}:{} to image {}", event.repository, tag, image_id);

        self.tagger.tag(&event.repository, &image_id, &event.git_ref).await?;
        self.tagger.tag(&event.repository, &image_id, &image_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;
    use async_trait::async_trait;
    use wharfhook_core::models::STATUS_CONTEXT;
    use wharfhook_registry::AppliedTag;

    use super::*;

    fn event(state: BuildState) -> BuildEvent {
        BuildEvent {
            repository: "ejholmes/docker-statsd".to_string(),
            git_ref: "long-f1fb3b0".to_string(),
            state,
            build_url: "https://quay.io/repository/ejholmes/docker-statsd/build/1".to_string(),
            registry_tag: Some("long-f1fb3b0".to_string()),
        }
    }

    struct Harness {
        statuses: Arc<MemoryStatusSink>,
        resolver: Arc<MemoryTagResolver>,
        tagger: Arc<MemoryTagger>,
        handler: BuildEventHandler,
    }

    fn harness() -> Harness {
        let statuses = Arc::new(MemoryStatusSink::new());
        let resolver = Arc::new(MemoryTagResolver::new());
        let tagger = Arc::new(MemoryTagger::new());
        let handler = BuildEventHandler::new(HandlerOptions {
            statuses: Some(statuses.clone()),
            resolver: Some(resolver.clone()),
            tagger: Some(tagger.clone()),
        });
        Harness { statuses, resolver, tagger, handler }
    }

    struct FailingSink;

    #[async_trait]
    impl CommitStatusSink for FailingSink {
        async fn create(&self, _status: &CommitStatus) -> Result<()> {
            bail!("status API unavailable")
        }
    }

    struct CountingFailingTagger {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tagger for CountingFailingTagger {
        async fn tag(&self, _repository: &str, _image_id: &str, _tag: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            bail!("Unsuccessful request: 500 Internal Server Error")
        }
    }

    #[tokio::test]
    async fn test_pending_creates_status_only() {
        let h = harness();
        h.handler.handle(&event(BuildState::Pending)).await.unwrap();

        let recorded = h.statuses.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].repository, "ejholmes/docker-statsd");
        assert_eq!(recorded[0].git_ref, "long-f1fb3b0");
        assert_eq!(recorded[0].state, BuildState::Pending);
        assert_eq!(recorded[0].context, STATUS_CONTEXT);
        assert_eq!(recorded[0].description, BuildState::Pending.description());
        assert!(h.tagger.applied().is_empty());
    }

    #[tokio::test]
    async fn test_failure_creates_status_only() {
        let h = harness();
        h.handler.handle(&event(BuildState::Failure)).await.unwrap();

        let recorded = h.statuses.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].state, BuildState::Failure);
        assert_eq!(recorded[0].description, "The Docker image failed to build");
        assert!(h.tagger.applied().is_empty());
    }

    #[tokio::test]
    async fn test_success_stabilizes_tags() {
        let h = harness();
        h.resolver.insert("ejholmes/docker-statsd", "long-f1fb3b0", "1234");
        h.handler.handle(&event(BuildState::Success)).await.unwrap();

        // Status first, then commit ref tag, then the self-referential tag.
        let recorded = h.statuses.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].state, BuildState::Success);

        let applied = h.tagger.applied();
        assert_eq!(applied, vec![
            AppliedTag {
                repository: "ejholmes/docker-statsd".to_string(),
                image_id: "1234".to_string(),
                tag: "long-f1fb3b0".to_string(),
            },
            AppliedTag {
                repository: "ejholmes/docker-statsd".to_string(),
                image_id: "1234".to_string(),
                tag: "1234".to_string(),
            },
        ]);
        let mapping = h.tagger.mapping();
        assert_eq!(mapping.get("long-f1fb3b0").map(String::as_str), Some("1234"));
        assert_eq!(mapping.get("1234").map(String::as_str), Some("1234"));
    }

    #[tokio::test]
    async fn test_status_failure_aborts_tagging() {
        let tagger = Arc::new(MemoryTagger::new());
        let handler = BuildEventHandler::new(HandlerOptions {
            statuses: Some(Arc::new(FailingSink)),
            resolver: None,
            tagger: Some(tagger.clone()),
        });

        let err = handler.handle(&event(BuildState::Success)).await.unwrap_err();
        assert_eq!(err.to_string(), "status API unavailable");
        assert!(tagger.applied().is_empty());
    }

    #[tokio::test]
    async fn test_first_tag_failure_aborts_second() {
        let statuses = Arc::new(MemoryStatusSink::new());
        let resolver = Arc::new(MemoryTagResolver::new());
        resolver.insert("ejholmes/docker-statsd", "long-f1fb3b0", "1234");
        let tagger = Arc::new(CountingFailingTagger { calls: AtomicUsize::new(0) });
        let handler = BuildEventHandler::new(HandlerOptions {
            statuses: Some(statuses.clone()),
            resolver: Some(resolver),
            tagger: Some(tagger.clone()),
        });

        assert!(handler.handle(&event(BuildState::Success)).await.is_err());
        // The status was already created; the second tag write never happens.
        assert_eq!(statuses.recorded().len(), 1);
        assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_registry_tag_is_an_error() {
        let h = harness();
        let mut ev = event(BuildState::Success);
        ev.registry_tag = None;

        assert!(h.handler.handle(&ev).await.is_err());
        // Status creation still happened before the tagging path failed.
        assert_eq!(h.statuses.recorded().len(), 1);
        assert!(h.tagger.applied().is_empty());
    }

    #[tokio::test]
    async fn test_default_handler_is_callable() {
        // All capabilities default to in-memory variants.
        let handler = BuildEventHandler::default();
        handler.handle(&event(BuildState::Success)).await.unwrap();
    }
}
