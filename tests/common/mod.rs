#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use playhead::{
    Config, ContentRecord, EventBus, OrchestratorDeps, PlaybackOrchestrator, PlaybackState,
    ProgressRecord, QualityVariant,
};

use mocks::{MockNavigator, MockStore};

/// Config tuned for tests: the save interval never fires on its own, so only
/// delta-triggered and explicit writes reach the store.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.progress.save_interval_ms = 60_000;
    config.progress.min_delta_seconds = 5.0;
    config.progress.completion_threshold = 90.0;
    config.playback.auto_advance_delay_secs = 1;
    config
}

pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn deps(
    store: Arc<MockStore>,
    navigator: Arc<MockNavigator>,
    config: Config,
) -> (OrchestratorDeps, Arc<EventBus>) {
    init_tracing();
    let bus = Arc::new(EventBus::new());
    (
        OrchestratorDeps {
            store,
            navigator,
            bus: bus.clone(),
            config,
        },
        bus,
    )
}

pub fn self_hosted_episode() -> ContentRecord {
    ContentRecord {
        id: "ep1".to_string(),
        title: "Episode 1".to_string(),
        direct_url: Some("https://cdn.example/ep1.mp4".to_string()),
        quality_variants: vec![
            QualityVariant {
                label: "1080p".to_string(),
                url: "https://cdn.example/ep1-1080.mp4".to_string(),
            },
            QualityVariant {
                label: "720p".to_string(),
                url: "https://cdn.example/ep1-720.mp4".to_string(),
            },
        ],
        next_episode_id: Some("ep2".to_string()),
        ..Default::default()
    }
}

pub async fn wait_for_state<F>(
    orchestrator: &PlaybackOrchestrator,
    timeout: Duration,
    predicate: F,
) -> bool
where
    F: Fn(&PlaybackState) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(state) = orchestrator.state().await
            && predicate(&state)
        {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(5)).await;
    }
}

pub async fn wait_for_progress<F>(
    orchestrator: &PlaybackOrchestrator,
    timeout: Duration,
    predicate: F,
) -> bool
where
    F: Fn(&ProgressRecord) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate(&orchestrator.progress()) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(5)).await;
    }
}
