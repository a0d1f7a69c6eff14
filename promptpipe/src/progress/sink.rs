//! Progress sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, Level};

use super::ProgressEvent;

/// Trait for sinks that receive progress events.
///
/// Sinks must tolerate being called from the polling loop's task context;
/// a slow sink delays the next status query.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Delivers an event asynchronously.
    async fn emit(&self, event: &ProgressEvent);

    /// Delivers an event without blocking.
    ///
    /// This method should never raise; errors are logged and suppressed.
    fn try_emit(&self, event: &ProgressEvent);
}

/// A sink that discards all events.
///
/// Used as the default when the caller does not care about progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

#[async_trait]
impl ProgressSink for NoOpProgressSink {
    async fn emit(&self, _event: &ProgressEvent) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event: &ProgressEvent) {
        // Intentionally empty - discards all events
    }
}

/// A sink that logs events through the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingProgressSink {
    level: Level,
}

impl Default for LoggingProgressSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingProgressSink {
    /// Creates a logging sink at the given level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &ProgressEvent) {
        match self.level {
            Level::DEBUG => {
                debug!(stage = %event.stage, message = %event.message, "progress");
            }
            _ => {
                info!(stage = %event.stage, message = %event.message, "progress");
            }
        }
    }
}

#[async_trait]
impl ProgressSink for LoggingProgressSink {
    async fn emit(&self, event: &ProgressEvent) {
        self.log_event(event);
    }

    fn try_emit(&self, event: &ProgressEvent) {
        self.log_event(event);
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    events: parking_lot::RwLock<Vec<ProgressEvent>>,
}

impl CollectingProgressSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.read().clone()
    }

    /// Returns the collected stage labels in order.
    #[must_use]
    pub fn stages(&self) -> Vec<super::ProgressStage> {
        self.events.read().iter().map(|e| e.stage).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl ProgressSink for CollectingProgressSink {
    async fn emit(&self, event: &ProgressEvent) {
        self.events.write().push(event.clone());
    }

    fn try_emit(&self, event: &ProgressEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressStage;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpProgressSink;
        sink.emit(&ProgressEvent::new(ProgressStage::InvokeModel, "x"))
            .await;
        sink.try_emit(&ProgressEvent::new(ProgressStage::InvokeModel, "x"));
        // Should not panic
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingProgressSink::default();
        sink.emit(&ProgressEvent::new(ProgressStage::BuildRequest, "compiling"))
            .await;
        sink.try_emit(&ProgressEvent::new(ProgressStage::BuildRequest, "compiling"));
        // Should not panic
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingProgressSink::new();
        assert!(sink.is_empty());

        sink.emit(&ProgressEvent::new(ProgressStage::FetchConfiguration, "a"))
            .await;
        sink.try_emit(&ProgressEvent::new(ProgressStage::InvokeModel, "b"));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.stages(),
            vec![ProgressStage::FetchConfiguration, ProgressStage::InvokeModel]
        );

        sink.clear();
        assert!(sink.is_empty());
    }
}
