#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use {
    async_trait::async_trait,
    voicewatch_channels::{
        ChannelPostSink, DeliveryError, Deliverer, DirectMessageSink, PushSink, Result,
    },
    voicewatch_presence::{
        ChannelId, MonitoredChannels, PresenceTransition, Renderer, SinkSet, UserId,
    },
    voicewatch_relay::{Relay, RelaySettings},
};

const OWNER: &str = "100";
const NOTIFY: &str = "900";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Direct(String),
    Push(String),
    Post(String, String),
}

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<Sent>>,
    fail_push: bool,
}

impl Recorder {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl DirectMessageSink for Recorder {
    async fn send_direct(&self, user: &UserId, text: &str) -> Result<()> {
        assert_eq!(user.as_str(), OWNER);
        self.sent.lock().unwrap().push(Sent::Direct(text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl PushSink for Recorder {
    async fn send_push(&self, title: &str, _body: &str) -> Result<()> {
        if self.fail_push {
            return Err(DeliveryError::invalid_input("push gateway down"));
        }
        self.sent.lock().unwrap().push(Sent::Push(title.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ChannelPostSink for Recorder {
    async fn post(&self, channel: &ChannelId, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Post(channel.to_string(), text.to_string()));
        Ok(())
    }
}

fn relay_with(recorder: Arc<Recorder>) -> Relay {
    let settings = RelaySettings {
        owner: UserId::from(OWNER),
        monitored: MonitoredChannels::new(["A", "B"]),
        sinks: SinkSet::default(),
        renderer: Renderer::default(),
        default_away_message: "I'm away, back soon".into(),
        default_notify_channel: Some(ChannelId::from(NOTIFY)),
        command_prefix: "!".into(),
    };
    let deliverer = Deliverer::new()
        .with_direct_message(recorder.clone())
        .with_push(recorder.clone())
        .with_channel_post(recorder);
    Relay::new(settings, deliverer)
}

fn transition(user: &str, before: Option<&str>, after: Option<&str>) -> PresenceTransition {
    PresenceTransition::new(
        user,
        format!("user-{user}"),
        before.map(ChannelId::from),
        after.map(ChannelId::from),
    )
    .with_channel_names(
        before.map(|c| format!("Room {c}")),
        after.map(|c| format!("Room {c}")),
    )
}

fn kinds(sent: &[Sent]) -> Vec<&'static str> {
    sent.iter()
        .map(|s| match s {
            Sent::Direct(_) => "dm",
            Sent::Push(_) => "push",
            Sent::Post(..) => "post",
        })
        .collect()
}

#[tokio::test]
async fn join_switch_leave_then_away_visitor() {
    let recorder = Arc::new(Recorder::default());
    let relay = relay_with(recorder.clone());

    // U joins A
    let report = relay.handle_presence(&transition("U", None, Some("A"))).await;
    assert_eq!(report.delivered, 2);
    let mut sent = recorder.take();
    sent.sort_by_key(|s| format!("{s:?}"));
    assert_eq!(kinds(&sent), vec!["dm", "push"]);
    assert!(matches!(&sent[0], Sent::Direct(t) if t.contains("has joined **Room A**")));
    assert_eq!(relay.status().roster_size, 0);

    // U switches A -> B
    relay
        .handle_presence(&transition("U", Some("A"), Some("B")))
        .await;
    let sent = recorder.take();
    assert_eq!(sent.len(), 2);
    assert!(
        sent.iter()
            .any(|s| matches!(s, Sent::Direct(t) if t.contains("from **Room A** to **Room B**")))
    );

    // U leaves
    relay.handle_presence(&transition("U", Some("B"), None)).await;
    let sent = recorder.take();
    assert_eq!(sent.len(), 2);
    assert!(
        sent.iter()
            .any(|s| matches!(s, Sent::Push(t) if t.contains("left Room B")))
    );

    // Away on, owner sitting in A, V joins A
    let reply = relay
        .handle_command(&UserId::from(OWNER), "!away on")
        .await
        .unwrap();
    assert!(reply.contains("Away mode enabled"));

    relay
        .handle_presence(&transition("V", None, Some("A")).with_owner_present(true))
        .await;
    let sent = recorder.take();
    assert_eq!(relay.status().roster_size, 1);
    assert!(sent.contains(&Sent::Post(
        NOTIFY.to_string(),
        "<@V> I'm away, back soon".to_string()
    )));
}

#[tokio::test]
async fn owner_return_flushes_roster() {
    let recorder = Arc::new(Recorder::default());
    let relay = relay_with(recorder.clone());
    relay.handle_command(&UserId::from(OWNER), "!away on").await;

    for user in ["V", "W", "V"] {
        relay
            .handle_presence(&transition(user, None, Some("A")).with_owner_present(true))
            .await;
    }
    assert_eq!(relay.status().roster_size, 2);
    recorder.take();

    relay.handle_presence(&transition(OWNER, None, Some("B"))).await;
    let sent = recorder.take();
    assert!(sent.iter().any(|s| matches!(
        s,
        Sent::Post(channel, text) if channel == NOTIFY && text.contains("<@V>, <@W>")
    )));
    assert!(
        sent.iter()
            .any(|s| matches!(s, Sent::Direct(t) if t.contains("Away mode was turned off")))
    );
    let status = relay.status();
    assert!(!status.active);
    assert_eq!(status.roster_size, 0);
}

#[tokio::test]
async fn failing_sink_does_not_undo_state() {
    let recorder = Arc::new(Recorder {
        fail_push: true,
        ..Default::default()
    });
    let relay = relay_with(recorder.clone());
    relay.handle_command(&UserId::from(OWNER), "!away on").await;

    let report = relay
        .handle_presence(&transition("V", None, Some("A")).with_owner_present(true))
        .await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 2);
    assert_eq!(relay.status().roster_size, 1);
    assert_eq!(kinds(&recorder.take()).len(), 2);
}

#[tokio::test]
async fn non_owner_command_is_rejected() {
    let relay = relay_with(Arc::new(Recorder::default()));
    let reply = relay
        .handle_command(&UserId::from("555"), "!away on")
        .await
        .unwrap();
    assert!(reply.contains("Only the owner"));
    assert!(!relay.status().active);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_visitors_never_tear_the_roster() {
    const VISITORS: usize = 32;

    let recorder = Arc::new(Recorder::default());
    let relay = Arc::new(relay_with(recorder.clone()));
    let owner = UserId::from(OWNER);
    relay.handle_command(&owner, "!away on").await;

    let tasks: Vec<_> = (0..VISITORS)
        .map(|i| {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move {
                let join = transition(&format!("v{i}"), None, Some("A")).with_owner_present(true);
                relay.handle_presence(&join).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(relay.status().roster_size, VISITORS);
    let away_replies = recorder
        .take()
        .into_iter()
        .filter(|s| matches!(s, Sent::Post(..)))
        .count();
    assert_eq!(away_replies, VISITORS);

    relay.handle_command(&owner, "!away off").await;
    let sent = recorder.take();
    let [Sent::Post(channel, text)] = sent.as_slice() else {
        panic!("expected a single welcome-back post, got {sent:?}");
    };
    assert_eq!(channel, NOTIFY);
    for i in 0..VISITORS {
        assert!(text.contains(&format!("<@v{i}>")), "missing v{i} in {text}");
    }
    assert_eq!(relay.status().roster_size, 0);
}
