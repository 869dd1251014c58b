//! Notification sinks and delivery.
//!
//! Each delivery mechanism (Discord DM, channel post, email, push webhook)
//! implements one narrow sink trait. [`Deliverer`] executes the
//! [`voicewatch_presence::SinkInvocation`]s decided by the core, each in
//! its own error boundary.

pub mod deliver;
pub mod email;
pub mod error;
pub mod gating;
pub mod push;
pub mod sink;

pub use {
    deliver::{DeliveryReport, Deliverer, RetryPolicy},
    email::SmtpEmailSink,
    error::{DeliveryError, Result},
    gating::{AuthorizationError, authorize},
    push::WebhookPushSink,
    sink::{ChannelPostSink, DirectMessageSink, EmailSink, PushSink},
};
