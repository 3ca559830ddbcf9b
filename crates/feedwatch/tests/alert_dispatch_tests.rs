//! Transitions reach sinks through `notify_offline`/`notify_recovered`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwatch::{
    Alert, AlertError, AlertSink, ClientKey, MonotonicClock, TokioScheduler, Watchdog,
};

/// Sink with its own notify operations; `deliver` is never expected.
#[derive(Default)]
struct CountingSink {
    offline: AtomicUsize,
    recovered: AtomicUsize,
    delivered: AtomicUsize,
}

#[async_trait]
impl AlertSink for CountingSink {
    async fn deliver(&self, _alert: &Alert) -> Result<(), AlertError> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn notify_offline(
        &self,
        _key: &ClientKey,
        _last_ping: DateTime<Utc>,
    ) -> Result<(), AlertError> {
        self.offline.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn notify_recovered(
        &self,
        _key: &ClientKey,
        _last_ping: DateTime<Utc>,
    ) -> Result<(), AlertError> {
        self.recovered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_transitions_use_notify_operations() -> Result<()> {
    let sink = Arc::new(CountingSink::default());
    let watchdog = Watchdog::new(
        Arc::new(TokioScheduler::current()?),
        sink.clone(),
        Arc::new(MonotonicClock::new()),
    )?;
    let key = ClientKey::new("a@x.com", "box1");

    watchdog.ping(key.clone(), 5);
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(sink.offline.load(Ordering::SeqCst), 1);

    assert!(watchdog.ping(key, 5).was_offline);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(sink.recovered.load(Ordering::SeqCst), 1);
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 0);
    Ok(())
}
