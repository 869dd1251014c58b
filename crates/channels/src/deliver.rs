use std::{sync::Arc, time::Duration};

use {
    futures::future::join_all,
    tracing::{debug, warn},
    voicewatch_presence::SinkInvocation,
};

use crate::{
    DeliveryError, Result,
    sink::{ChannelPostSink, DirectMessageSink, EmailSink, PushSink},
};

/// Bounded retry settings applied per invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::from_millis(500),
        }
    }
}

/// Outcome counts for one batch of invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    /// No sink configured for the invocation.
    pub skipped: usize,
}

enum Outcome {
    Delivered,
    Failed,
    Skipped,
}

/// Runs sink invocations concurrently. A failing sink never stops the
/// others and never surfaces past [`Deliverer::deliver_all`].
#[derive(Default, Clone)]
pub struct Deliverer {
    direct: Option<Arc<dyn DirectMessageSink>>,
    channel: Option<Arc<dyn ChannelPostSink>>,
    email: Option<Arc<dyn EmailSink>>,
    push: Option<Arc<dyn PushSink>>,
    retry: RetryPolicy,
}

impl Deliverer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_direct_message(mut self, sink: Arc<dyn DirectMessageSink>) -> Self {
        self.direct = Some(sink);
        self
    }

    #[must_use]
    pub fn with_channel_post(mut self, sink: Arc<dyn ChannelPostSink>) -> Self {
        self.channel = Some(sink);
        self
    }

    #[must_use]
    pub fn with_email(mut self, sink: Arc<dyn EmailSink>) -> Self {
        self.email = Some(sink);
        self
    }

    #[must_use]
    pub fn with_push(mut self, sink: Arc<dyn PushSink>) -> Self {
        self.push = Some(sink);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn deliver_all(&self, invocations: Vec<SinkInvocation>) -> DeliveryReport {
        let outcomes = join_all(
            invocations
                .iter()
                .filter(|i| i.is_delivery())
                .map(|i| self.deliver_one(i)),
        )
        .await;

        let mut report = DeliveryReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Delivered => report.delivered += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }
        report
    }

    async fn deliver_one(&self, invocation: &SinkInvocation) -> Outcome {
        let sink = invocation.sink_name();
        let mut attempt = 0u32;
        loop {
            match self.attempt(invocation).await {
                None => {
                    debug!(sink, "sink not configured, skipping");
                    return Outcome::Skipped;
                },
                Some(Ok(())) => return Outcome::Delivered,
                Some(Err(e)) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        sink,
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %e,
                        "delivery failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                },
                Some(Err(e)) => {
                    warn!(sink, attempt, error = %e, "delivery failed");
                    return Outcome::Failed;
                },
            }
        }
    }

    /// `None` when the matching sink is not configured.
    async fn attempt(&self, invocation: &SinkInvocation) -> Option<Result<()>> {
        match invocation {
            SinkInvocation::DirectMessage { user, text } => {
                Some(self.direct.as_ref()?.send_direct(user, text).await)
            },
            SinkInvocation::ChannelPost { channel, text } => {
                Some(self.channel.as_ref()?.post(channel, text).await)
            },
            SinkInvocation::Email { subject, html } => {
                Some(self.email.as_ref()?.send_email(subject, html).await)
            },
            SinkInvocation::Push { title, body } => {
                Some(self.push.as_ref()?.send_push(title, body).await)
            },
            SinkInvocation::RosterInsert { .. } => Some(Err(DeliveryError::invalid_input(
                "roster inserts are committed to the session, not delivered",
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use {
        async_trait::async_trait,
        voicewatch_presence::{ChannelId, UserId},
    };

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DirectMessageSink for RecordingSink {
        async fn send_direct(&self, user: &UserId, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(format!("{user}:{text}"));
            Ok(())
        }
    }

    #[async_trait]
    impl ChannelPostSink for RecordingSink {
        async fn post(&self, channel: &ChannelId, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(format!("#{channel}:{text}"));
            Ok(())
        }
    }

    /// Fails `failures` times with a retryable error, then succeeds.
    struct FlakyPush {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PushSink for FlakyPush {
        async fn send_push(&self, _title: &str, _body: &str) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(DeliveryError::Rejected {
                    sink: "push",
                    status: 502,
                })
            } else {
                Ok(())
            }
        }
    }

    struct BrokenEmail;

    #[async_trait]
    impl EmailSink for BrokenEmail {
        async fn send_email(&self, _subject: &str, _html: &str) -> Result<()> {
            Err(DeliveryError::invalid_input("no route"))
        }
    }

    fn no_delay(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_block_others() {
        let recorder = Arc::new(RecordingSink::default());
        let deliverer = Deliverer::new()
            .with_direct_message(recorder.clone())
            .with_channel_post(recorder.clone())
            .with_email(Arc::new(BrokenEmail));

        let report = deliverer
            .deliver_all(vec![
                SinkInvocation::Email {
                    subject: "s".into(),
                    html: "h".into(),
                },
                SinkInvocation::DirectMessage {
                    user: UserId::from("1"),
                    text: "hi".into(),
                },
                SinkInvocation::ChannelPost {
                    channel: ChannelId::from("9"),
                    text: "yo".into(),
                },
            ])
            .await;

        assert_eq!(
            report,
            DeliveryReport {
                delivered: 2,
                failed: 1,
                skipped: 0
            }
        );
        let mut sent = recorder.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["#9:yo", "1:hi"]);
    }

    #[tokio::test]
    async fn unconfigured_sinks_are_skipped_and_roster_ignored() {
        let report = Deliverer::new()
            .deliver_all(vec![
                SinkInvocation::Push {
                    title: "t".into(),
                    body: "b".into(),
                },
                SinkInvocation::RosterInsert {
                    user: UserId::from("1"),
                },
            ])
            .await;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.delivered + report.failed, 0);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let push = Arc::new(FlakyPush {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let deliverer = Deliverer::new()
            .with_push(push.clone())
            .with_retry(no_delay(1));
        let report = deliverer
            .deliver_all(vec![SinkInvocation::Push {
                title: "t".into(),
                body: "b".into(),
            }])
            .await;
        assert_eq!(report.delivered, 1);
        assert_eq!(push.calls.load(Ordering::SeqCst), 2);

        let stubborn = Arc::new(FlakyPush {
            failures: 10,
            calls: AtomicUsize::new(0),
        });
        let report = Deliverer::new()
            .with_push(stubborn.clone())
            .with_retry(no_delay(2))
            .deliver_all(vec![SinkInvocation::Push {
                title: "t".into(),
                body: "b".into(),
            }])
            .await;
        assert_eq!(report.failed, 1);
        assert_eq!(stubborn.calls.load(Ordering::SeqCst), 3);
    }
}
