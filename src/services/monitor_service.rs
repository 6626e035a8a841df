//! src/services/monitor_service.rs
//!
//! BackupMonitor: one check from listing to (at most) one notification.
//! The monitor holds no state between invocations; every run rebuilds its
//! view of the bucket from the listing.

use crate::{
    config::MonitorConfig,
    models::{
        event::InvocationEvent,
        notification::{CheckOutcome, Notification},
    },
    services::{
        lister_service::{ListError, ObjectLister},
        notifier_service::{Notifier, NotifyError},
        report, scanner, staleness,
    },
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    List(#[from] ListError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Runs backup checks against one bucket.
///
/// Cheap to clone; clones share configuration, lister and notifier.
#[derive(Clone)]
pub struct BackupMonitor {
    config: Arc<MonitorConfig>,
    lister: Arc<dyn ObjectLister>,
    notifier: Arc<dyn Notifier>,
}

impl BackupMonitor {
    pub fn new(
        config: MonitorConfig,
        lister: Arc<dyn ObjectLister>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            lister,
            notifier,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run a check using today's UTC date.
    pub async fn run_now(&self, event: &InvocationEvent) -> MonitorResult<CheckOutcome> {
        self.run(event, Utc::now().date_naive()).await
    }

    /// Run a check as of `today`.
    ///
    /// - Test-mode events always send a report of the latest dates.
    /// - Otherwise a report is sent only if some prefix is stale.
    ///
    /// Listing and delivery failures propagate; no partial scan is ever
    /// evaluated.
    pub async fn run(
        &self,
        event: &InvocationEvent,
        today: NaiveDate,
    ) -> MonitorResult<CheckOutcome> {
        let bucket = self.config.bucket.as_str();
        info!(bucket, test_email = event.test_email, %today, "starting backup check");

        let latest = scanner::latest_dates_by_prefix(self.lister.list_keys(bucket)).await?;

        if event.test_email {
            let message_id = self
                .deliver(report::test_report(&self.config, &latest))
                .await?;
            return Ok(CheckOutcome {
                message_id: Some(message_id),
                prefixes: latest.len(),
                stale: 0,
            });
        }

        let stale = staleness::stale_dates_by_prefix(&latest, today, self.config.max_age_days);
        if stale.is_empty() {
            info!(bucket, prefixes = latest.len(), "all backups are recent");
            return Ok(CheckOutcome {
                message_id: None,
                prefixes: latest.len(),
                stale: 0,
            });
        }

        for (prefix, date) in &stale {
            warn!(bucket, prefix = %prefix, %date, "backup is stale");
        }
        let message_id = self
            .deliver(report::stale_report(&self.config, &latest))
            .await?;

        Ok(CheckOutcome {
            message_id: Some(message_id),
            prefixes: latest.len(),
            stale: stale.len(),
        })
    }

    async fn deliver(&self, notification: Notification) -> MonitorResult<String> {
        let message_id = self.notifier.send(&notification).await?;
        info!(
            message_id = %message_id,
            recipient = %notification.recipient,
            subject = %notification.subject,
            "report sent"
        );
        Ok(message_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::lister_service::StaticLister;
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream, StreamExt};
    use std::sync::Mutex;

    /// Keeps every message it is asked to send.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) sent: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<String, NotifyError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(notification.clone());
            Ok(format!("msg-{}", sent.len()))
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, notification: &Notification) -> Result<String, NotifyError> {
            Err(NotifyError::Send {
                recipient: notification.recipient.clone(),
                message: "throttled".into(),
            })
        }
    }

    /// Yields a few keys and then fails, like a listing cut off mid-page.
    struct FailingLister;

    impl ObjectLister for FailingLister {
        fn list_keys<'a>(&'a self, bucket: &'a str) -> BoxStream<'a, Result<String, ListError>> {
            stream::iter(vec![
                Ok("a/x.20200101T000000Z.manifest.gpg".to_string()),
                Err(ListError::Store {
                    bucket: bucket.to_string(),
                    message: "connection reset".into(),
                }),
            ])
            .boxed()
        }
    }

    pub(crate) fn config() -> MonitorConfig {
        MonitorConfig {
            bucket: "backups".into(),
            max_age_days: 30,
            sender: "monitor@example.com".into(),
            recipient: "ops@example.com".into(),
            endpoint_url: None,
        }
    }

    pub(crate) fn monitor_with(
        keys: &[&str],
        notifier: Arc<dyn Notifier>,
    ) -> BackupMonitor {
        BackupMonitor::new(
            config(),
            Arc::new(StaticLister::new(keys.iter().copied())),
            notifier,
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_stale_prefix_sends_one_alert_listing_everything() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor_with(
            &[
                "a/x.20240215T000000Z.manifest.gpg",
                "b/x.20240115T000000Z.manifest.gpg",
            ],
            notifier.clone(),
        );

        let outcome = monitor
            .run(&InvocationEvent::default(), date(2024, 3, 1))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckOutcome {
                message_id: Some("msg-1".into()),
                prefixes: 2,
                stale: 1,
            }
        );
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Missing recent backups: backups");
        assert!(sent[0].body.contains("* 2024-02-15: backups/a\n"));
        assert!(sent[0].body.contains("* 2024-01-15: backups/b\n"));
    }

    #[tokio::test]
    async fn test_recent_backups_send_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor_with(&["a/x.20240215T000000Z.manifest.gpg"], notifier.clone());

        let outcome = monitor
            .run(&InvocationEvent::default(), date(2024, 3, 1))
            .await
            .unwrap();

        assert_eq!(outcome.message_id, None);
        assert_eq!(outcome.prefixes, 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_staleness_boundary_is_strict() {
        let today = date(2024, 3, 1);

        let notifier = Arc::new(RecordingNotifier::default());
        // 2024-01-31 is exactly 30 days before 2024-03-01.
        let monitor = monitor_with(&["a/x.20240131T000000Z.manifest.gpg"], notifier.clone());
        let outcome = monitor.run(&InvocationEvent::default(), today).await.unwrap();
        assert_eq!(outcome.message_id, None);

        let monitor = monitor_with(&["a/x.20240130T000000Z.manifest.gpg"], notifier.clone());
        let outcome = monitor.run(&InvocationEvent::default(), today).await.unwrap();
        assert_eq!(outcome.stale, 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor_with(&[], notifier.clone());

        let outcome = monitor
            .run(&InvocationEvent::default(), date(2024, 3, 1))
            .await
            .unwrap();
        assert_eq!(outcome.message_id, None);
        assert!(notifier.sent.lock().unwrap().is_empty());

        let outcome = monitor
            .run(&InvocationEvent::test_email(), date(2024, 3, 1))
            .await
            .unwrap();
        assert_eq!(outcome.message_id.as_deref(), Some("msg-1"));
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Backup monitor results: backups");
        assert!(sent[0].body.ends_with("There are no backups!"));
    }

    #[tokio::test]
    async fn test_test_mode_reports_even_when_fresh() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor_with(
            &["a/x.20240229T000000Z.manifest.gpg", "a/file.manifest.gpg"],
            notifier.clone(),
        );

        let outcome = monitor
            .run(&InvocationEvent::test_email(), date(2024, 3, 1))
            .await
            .unwrap();

        assert_eq!(outcome.message_id.as_deref(), Some("msg-1"));
        assert_eq!(outcome.stale, 0);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(
            sent[0].body,
            "Most recent backups in bucket 'backups':\n* 2024-02-29: backups/a\n"
        );
    }

    #[tokio::test]
    async fn test_listing_failure_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = BackupMonitor::new(config(), Arc::new(FailingLister), notifier.clone());

        let err = monitor
            .run(&InvocationEvent::test_email(), date(2024, 3, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::List(_)));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_propagates() {
        let monitor = monitor_with(
            &["a/x.20200101T000000Z.manifest.gpg"],
            Arc::new(FailingNotifier),
        );

        let err = monitor
            .run(&InvocationEvent::default(), date(2024, 3, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Notify(_)));
        assert!(err.to_string().contains("throttled"));
    }
}
