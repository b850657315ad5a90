//! Client-side identifier generation.
//!
//! Session ids correlate a sequence of sends/receives and are created lazily
//! on the first send; they survive reconnects for the lifetime of the store.

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

pub fn generate_session_id() -> String {
    format!("chat-session-{}-{}", Utc::now().timestamp_millis(), random_suffix())
}

pub fn generate_message_id() -> String {
    format!("msg-{}-{}", Utc::now().timestamp_millis(), random_suffix())
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
