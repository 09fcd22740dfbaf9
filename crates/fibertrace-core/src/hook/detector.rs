//! Bounded renderer detection.
//!
//! The detector never sleeps. The caller drives it with [`RendererDetector::poll`]
//! on its own timer, spaced by [`RendererDetector::interval`].

use std::sync::Arc;
use std::time::Duration;

use fibertrace_config::{HookConfig, HostEnvironment};
use fibertrace_protocols::{DevtoolsHook, HookError, RendererId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Result of one detection poll.
#[derive(Debug)]
pub enum DetectionStatus {
    /// Nothing registered yet; `attempt` polls have been made.
    Waiting { attempt: u32 },
    Detected(Vec<RendererId>),
    /// Reported exactly once when the attempts run out.
    Failed(HookError),
    /// Gave up, or nothing is expected in this environment.
    Idle,
}

#[derive(Debug, Default)]
struct Progress {
    attempts: u32,
    done: bool,
}

/// Polls a hook until a renderer registers or the attempt bound is hit.
pub struct RendererDetector {
    hook: Arc<dyn DevtoolsHook>,
    max_attempts: u32,
    interval: Duration,
    environment: HostEnvironment,
    progress: Mutex<Progress>,
}

impl RendererDetector {
    pub fn new(hook: Arc<dyn DevtoolsHook>, config: &HookConfig) -> Self {
        Self {
            hook,
            max_attempts: config.detection_attempts.max(1),
            interval: Duration::from_millis(config.detection_interval_ms),
            environment: config.environment,
            progress: Mutex::new(Progress::default()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn attempts(&self) -> u32 {
        self.progress.lock().attempts
    }

    pub fn poll(&self) -> DetectionStatus {
        let renderers: Vec<RendererId> = self.hook.renderers().into_iter().map(|(id, _)| id).collect();
        let mut progress = self.progress.lock();
        if !renderers.is_empty() {
            if !progress.done {
                info!(count = renderers.len(), "Renderer detected");
            }
            progress.done = true;
            return DetectionStatus::Detected(renderers);
        }
        if progress.done {
            return DetectionStatus::Idle;
        }

        progress.attempts += 1;
        if progress.attempts < self.max_attempts {
            debug!(attempt = progress.attempts, "No renderer registered yet");
            return DetectionStatus::Waiting {
                attempt: progress.attempts,
            };
        }

        progress.done = true;
        if self.environment == HostEnvironment::Production {
            debug!("No renderer in production environment; staying idle");
            return DetectionStatus::Idle;
        }
        let err = HookError::HookUnavailable {
            attempts: progress.attempts,
        };
        warn!(error = %err, "Renderer detection failed");
        DetectionStatus::Failed(err)
    }

    /// Start over after a reported failure.
    pub fn reset(&self) {
        *self.progress.lock() = Progress::default();
    }
}

#[cfg(test)]
mod tests {
    use fibertrace_testkit::MemoryHost;

    use super::*;
    use crate::hook::GlobalHook;

    fn config(attempts: u32, environment: HostEnvironment) -> HookConfig {
        HookConfig {
            detection_attempts: attempts,
            environment,
            ..HookConfig::default()
        }
    }

    #[test]
    fn test_detects_registered_renderer() {
        let hook = Arc::new(GlobalHook::new());
        let id = hook.inject(Arc::new(MemoryHost::new()));
        let detector = RendererDetector::new(hook, &config(3, HostEnvironment::Development));
        assert!(matches!(detector.poll(), DetectionStatus::Detected(ids) if ids == vec![id]));
    }

    #[test]
    fn test_failure_is_reported_once() {
        let hook = Arc::new(GlobalHook::new());
        let detector = RendererDetector::new(hook, &config(3, HostEnvironment::Development));

        assert!(matches!(detector.poll(), DetectionStatus::Waiting { attempt: 1 }));
        assert!(matches!(detector.poll(), DetectionStatus::Waiting { attempt: 2 }));
        assert!(matches!(
            detector.poll(),
            DetectionStatus::Failed(HookError::HookUnavailable { attempts: 3 })
        ));
        assert!(matches!(detector.poll(), DetectionStatus::Idle));
        assert!(matches!(detector.poll(), DetectionStatus::Idle));
    }

    #[test]
    fn test_production_environment_stays_silent() {
        let hook = Arc::new(GlobalHook::new());
        let detector = RendererDetector::new(hook, &config(1, HostEnvironment::Production));
        assert!(matches!(detector.poll(), DetectionStatus::Idle));
    }

    #[test]
    fn test_reset_allows_retry() {
        let hook = Arc::new(GlobalHook::new());
        let detector = RendererDetector::new(hook.clone(), &config(1, HostEnvironment::Development));
        assert!(matches!(detector.poll(), DetectionStatus::Failed(_)));

        detector.reset();
        assert_eq!(detector.attempts(), 0);
        hook.inject(Arc::new(MemoryHost::new()));
        assert!(matches!(detector.poll(), DetectionStatus::Detected(_)));
    }

    #[test]
    fn test_late_registration_after_failure_is_still_detected() {
        let hook = Arc::new(GlobalHook::new());
        let detector = RendererDetector::new(hook.clone(), &config(1, HostEnvironment::Development));
        assert!(matches!(detector.poll(), DetectionStatus::Failed(_)));
        hook.inject(Arc::new(MemoryHost::new()));
        assert!(matches!(detector.poll(), DetectionStatus::Detected(_)));
    }

    #[test]
    fn test_interval_from_config() {
        let detector = RendererDetector::new(
            Arc::new(GlobalHook::new()),
            &HookConfig {
                detection_interval_ms: 250,
                ..HookConfig::default()
            },
        );
        assert_eq!(detector.interval(), Duration::from_millis(250));
    }
}
