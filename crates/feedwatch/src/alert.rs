//! Online/offline notifications.
//!
//! The watchdog hands every state transition to an [`AlertSink`] on a
//! separate task, outside the registry lock. Delivery failures are logged and
//! dropped; they never feed back into client state.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::client::ClientKey;
use crate::error::AlertError;

/// Which transition an [`Alert`] announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Offline,
    Recovered,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Offline => write!(f, "offline"),
            AlertKind::Recovered => write!(f, "online"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub key: ClientKey,
    /// Last accepted ping: the one before the outage for `Offline`, the one
    /// that ended it for `Recovered`.
    pub last_ping: DateTime<Utc>,
}

impl Alert {
    pub fn offline(key: ClientKey, last_ping: DateTime<Utc>) -> Self {
        Self { kind: AlertKind::Offline, key, last_ping }
    }

    pub fn recovered(key: ClientKey, last_ping: DateTime<Utc>) -> Self {
        Self { kind: AlertKind::Recovered, key, last_ping }
    }

    pub fn subject(&self) -> String {
        match self.kind {
            AlertKind::Offline => format!("[{}] DOWN!", self.key.client),
            AlertKind::Recovered => format!("[{}] Back Online", self.key.client),
        }
    }

    pub fn body(&self) -> String {
        let seen = self.last_ping.format("%Y-%m-%d %H:%M:%S UTC");
        match self.kind {
            AlertKind::Offline => {
                format!("Host '{}' is down! It has not been seen since {seen}.", self.key.client)
            }
            AlertKind::Recovered => {
                format!("Host '{}' is back online as of {seen}.", self.key.client)
            }
        }
    }

    /// Plain-text MIME message addressed to the alert's email, suitable for
    /// `sendmail -t`.
    pub fn to_message(&self) -> String {
        format!(
            "Content-Type: text/plain; charset=\"utf-8\"\n\
             MIME-Version: 1.0\n\
             Content-Transfer-Encoding: 8bit\n\
             To: {}\n\
             Subject: {}\n\
             \n\
             {}\n",
            self.key.email,
            encode_header(&self.subject()),
            self.body()
        )
    }
}

/// RFC 2047 encoded word for header values that are not plain ASCII.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_owned()
    } else {
        format!("=?utf-8?B?{}?=", BASE64_STANDARD.encode(value))
    }
}

/// Delivers alerts somewhere. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError>;

    async fn notify_offline(
        &self,
        key: &ClientKey,
        last_ping: DateTime<Utc>,
    ) -> Result<(), AlertError> {
        self.deliver(&Alert::offline(key.clone(), last_ping)).await
    }

    async fn notify_recovered(
        &self,
        key: &ClientKey,
        last_ping: DateTime<Utc>,
    ) -> Result<(), AlertError> {
        self.deliver(&Alert::recovered(key.clone(), last_ping)).await
    }
}

/// Hand `alert` to `sink` on `runtime` without waiting for it.
pub(crate) fn dispatch(runtime: &Handle, sink: Arc<dyn AlertSink>, alert: Alert) {
    runtime.spawn(async move {
        info!(
            "Emailing {:?} about host {:?} in state {}",
            alert.key.email, alert.key.client, alert.kind
        );

        let delivery = match alert.kind {
            AlertKind::Offline => sink.notify_offline(&alert.key, alert.last_ping).await,
            AlertKind::Recovered => sink.notify_recovered(&alert.key, alert.last_ping).await,
        };

        if let Err(error) = delivery {
            warn!(client = %alert.key, kind = %alert.kind, "Alert delivery failed: {error}");
        }
    });
}

/// Pipes alerts into a sendmail-compatible binary (`sendmail -t -oi`).
#[derive(Debug, Clone)]
pub struct SendmailSink {
    program: PathBuf,
    timeout: Duration,
}

impl SendmailSink {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }
}

impl Default for SendmailSink {
    fn default() -> Self {
        Self::new("sendmail", Self::DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl AlertSink for SendmailSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut child = Command::new(&self.program)
            .args(["-t", "-oi"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().ok_or(AlertError::StdinUnavailable)?;
        let message = alert.to_message();

        let delivery = async {
            stdin.write_all(message.as_bytes()).await?;
            // sendmail reads until EOF
            drop(stdin);
            child.wait().await
        };

        let status = tokio::time::timeout(self.timeout, delivery)
            .await
            .map_err(|_| AlertError::Timeout(self.timeout))??;

        if status.success() { Ok(()) } else { Err(AlertError::Exit(status)) }
    }
}

/// Writes alerts to the log instead of sending them anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        match alert.kind {
            AlertKind::Offline => {
                warn!(to = %alert.key.email, "{}: {}", alert.subject(), alert.body());
            }
            AlertKind::Recovered => {
                info!(to = %alert.key.email, "{}: {}", alert.subject(), alert.body());
            }
        }
        Ok(())
    }
}

/// Keeps every delivered alert in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    alerts: Mutex<Vec<Alert>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn count(&self, key: &ClientKey, kind: AlertKind) -> usize {
        self.alerts.lock().iter().filter(|alert| alert.kind == kind && &alert.key == key).count()
    }
}

#[async_trait]
impl AlertSink for MemorySink {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        self.alerts.lock().push(alert.clone());
        Ok(())
    }
}
