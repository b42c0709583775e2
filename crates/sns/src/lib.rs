//! GitHub Org Manager alert publisher.
//!
//! Implements [`router::AlertPublisher`] by publishing to an AWS SNS topic
//! with `aws-sdk-sns`. Credentials come from the standard AWS provider chain
//! (environment, profile, or the execution role when hosted).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** SDK configuration, region handling and SNS message
//! limits live here. The [`router`] crate sees only
//! [`router::AlertPublisher`].

pub mod publisher;

pub use publisher::{truncate_message, SnsAlertPublisher, MAX_MESSAGE_BYTES, MAX_SUBJECT_CHARS};
