use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};
use tokio::runtime::{Builder, Handle};

/// Builder for risk engine telemetry sinks.
pub struct RiskTelemetryBuilder {
    component: String,
    log_path: Option<PathBuf>,
    log_sink: Option<Arc<dyn LogSink>>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl RiskTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            log_path: None,
            log_sink: None,
            event_publisher: None,
        }
    }

    /// Logs to a JSON-lines file at `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Logs to an arbitrary sink. Takes precedence over [`RiskTelemetryBuilder::log_path`].
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<RiskTelemetry> {
        let sink: Option<Arc<dyn LogSink>> = match (self.log_sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => Some(Arc::new(JsonLogger::new(path)?)),
            (None, None) => None,
        };
        Ok(RiskTelemetry {
            inner: Arc::new(TelemetryInner {
                component: self.component,
                sink,
                event: self.event_publisher.map(EventHandle::new),
            }),
        })
    }
}

/// Best-effort telemetry handle shared across engine components.
#[derive(Clone)]
pub struct RiskTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for RiskTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskTelemetry")
            .field("component", &self.inner.component)
            .field("logs", &self.inner.sink.is_some())
            .field("events", &self.inner.event.is_some())
            .finish()
    }
}

struct TelemetryInner {
    component: String,
    sink: Option<Arc<dyn LogSink>>,
    event: Option<EventHandle>,
}

struct EventHandle {
    publisher: Arc<dyn EventPublisher>,
}

impl EventHandle {
    const fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    fn publish(&self, record: EventRecord) -> Result<()> {
        if let Ok(handle) = Handle::try_current() {
            let publisher = Arc::clone(&self.publisher);
            handle.spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("risk telemetry event publish failed: {err:?}");
                }
            });
            return Ok(());
        }
        // Outside any runtime: publish on a throwaway runtime dropped before returning.
        Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(self.publisher.publish(record))
    }
}

impl RiskTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(component: impl Into<String>) -> RiskTelemetryBuilder {
        RiskTelemetryBuilder::new(component)
    }

    /// Component name stamped on records and events.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.inner.component
    }

    /// Logs structured metadata.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(sink) = &self.inner.sink {
            let record =
                LogRecord::new(&self.inner.component, level, message).with_metadata(metadata);
            sink.write(&record)?;
        }
        Ok(())
    }

    /// Emits an event on the bus.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(handle) = &self.inner.event {
            handle.publish(EventRecord::new(
                self.inner.component.clone(),
                event_type,
                payload,
            ))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_event_bus::MemoryEventBus;
    use shared_logging::MemoryLogSink;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_log_and_event() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("risk.log");
        let bus = Arc::new(MemoryEventBus::new(16));
        let telemetry = RiskTelemetry::builder("risk")
            .log_path(&path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "risk_report_completed", json!({ "risk_score": 82 }))
            .unwrap();
        telemetry
            .event("risk.report.completed", json!({ "risk_score": 82 }))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("risk_report_completed"));
        assert_eq!(bus.snapshot().len(), 1);
        assert_eq!(bus.snapshot()[0].source, "risk");
    }

    #[test]
    fn sink_takes_precedence_over_path() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("unused.log");
        let sink = Arc::new(MemoryLogSink::new());
        let telemetry = RiskTelemetry::builder("risk")
            .log_path(&path)
            .log_sink(sink.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Warn, "model_unavailable", json!({}))
            .unwrap();
        assert!(sink.contains("model_unavailable"));
        assert!(!path.exists());
    }

    #[test]
    fn sync_publish_leaves_no_runtime_behind() {
        let bus = Arc::new(MemoryEventBus::new(4));
        let telemetry = RiskTelemetry::builder("risk")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry.event("risk.model.ready", json!({ "origin": "trained" })).unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move { drop(telemetry) });
        assert_eq!(bus.events_of("risk.model.ready").len(), 1);
    }

    #[test]
    fn silent_without_sinks() {
        let telemetry = RiskTelemetry::builder("risk").build().unwrap();
        assert!(telemetry.log(LogLevel::Info, "noop", json!({})).is_ok());
        assert!(telemetry.event("risk.noop", json!({})).is_ok());
    }
}
