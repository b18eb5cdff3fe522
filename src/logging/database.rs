//! Database-backed logger
//!
//! [`DatabaseLogLayer`] turns every tracing event into a [`LogRecord`] and
//! hands it to a writer task over an unbounded channel. The writer inserts
//! the record through the [`LogStore`]. Records that cannot be delivered or
//! stored are re-emitted on the console logger; nothing propagates to the
//! caller.

use crate::stores::log::{LogRecord, LogStore};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Collects the fields of an event as JSON, keeping `message` apart
#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}

/// Replay a record on the console logger
fn emit_on_console(console: &Dispatch, record: &LogRecord, reason: &str) {
    tracing::dispatcher::with_default(console, || {
        let (message, context) = (record.message.as_str(), record.context.as_str());
        match record.level.as_str() {
            "ERROR" => tracing::error!(context, reason, "{message}"),
            "WARN" => tracing::warn!(context, reason, "{message}"),
            "DEBUG" => tracing::debug!(context, reason, "{message}"),
            "TRACE" => tracing::trace!(context, reason, "{message}"),
            _ => tracing::info!(context, reason, "{message}"),
        }
    });
}

/// Layer forwarding events to the log store writer
pub struct DatabaseLogLayer {
    sender: mpsc::UnboundedSender<LogRecord>,
    console: Dispatch,
}

impl DatabaseLogLayer {
    pub fn new(sender: mpsc::UnboundedSender<LogRecord>, console: Dispatch) -> Self {
        Self { sender, console }
    }

    fn record_for(event: &Event<'_>) -> LogRecord {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        visitor
            .fields
            .insert("target".to_string(), Value::String(metadata.target().to_string()));

        LogRecord::new(
            metadata.level().as_str(),
            visitor.message.unwrap_or_default(),
            Value::Object(visitor.fields),
        )
    }
}

impl<S: Subscriber> Layer<S> for DatabaseLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let record = Self::record_for(event);
        if let Err(mpsc::error::SendError(record)) = self.sender.send(record) {
            emit_on_console(&self.console, &record, "log writer stopped");
        }
    }
}

/// Build the database logger and spawn its writer task
///
/// Must be called from within a Tokio runtime. The writer runs with the
/// console logger as its default so that database activity during inserts
/// never feeds back into this logger.
pub fn database_dispatch(store: Arc<LogStore>, console: Dispatch, level: LevelFilter) -> Dispatch {
    let (sender, mut receiver) = mpsc::unbounded_channel::<LogRecord>();

    let writer_console = console.clone();
    tokio::spawn(
        async move {
            while let Some(record) = receiver.recv().await {
                if let Err(e) = store.insert(&record).await {
                    emit_on_console(&writer_console, &record, &e.to_string());
                }
            }
        }
        .with_subscriber(console.clone()),
    );

    let layer = DatabaseLogLayer::new(sender, console);
    Dispatch::new(tracing_subscriber::registry().with(layer.with_filter(level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::log::LogStoreOptions;
    use crate::stores::{memory_db, Store};
    use std::time::Duration;

    async fn log_store() -> Arc<LogStore> {
        let store = LogStore::new(
            memory_db().await,
            LogStoreOptions {
                log_table_name: "t_log".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();
        Arc::new(store)
    }

    async fn wait_for_rows(store: &LogStore, expected: i64) -> i64 {
        for _ in 0..50 {
            let count = store.count().await.unwrap();
            if count >= expected {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        store.count().await.unwrap()
    }

    #[tokio::test]
    async fn test_events_are_persisted_with_fields() {
        let store = log_store().await;
        let dispatch = database_dispatch(store.clone(), Dispatch::none(), LevelFilter::INFO);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(user = "ada", attempts = 3, "signed in");
            tracing::debug!("filtered out");
        });

        assert_eq!(wait_for_rows(&store, 1).await, 1);
        let records = store.recent(10).await.unwrap();
        assert_eq!(records[0].level, "INFO");
        assert_eq!(records[0].message, "signed in");

        let context: Value = serde_json::from_str(&records[0].context).unwrap();
        assert_eq!(context["user"], "ada");
        assert_eq!(context["attempts"], 3);
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let layer = DatabaseLogLayer::new(sender, Dispatch::none());
        let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer));

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!("nobody is listening");
        });
    }
}
