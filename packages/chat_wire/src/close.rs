//! WebSocket close codes with protocol-defined meaning.

/// Explicit normal closure. The only code that suppresses auto-reconnect.
pub const NORMAL_CLOSURE: u16 = 1000;

/// The peer rejected a frame as too large (usually an audio attachment that
/// slipped past the client-side ceiling).
pub const MESSAGE_TOO_LARGE: u16 = 1009;

/// User-facing error string for a close with the given code.
pub fn close_reason_message(code: u16) -> &'static str {
    match code {
        MESSAGE_TOO_LARGE => "Message too large",
        _ => "Connection closed",
    }
}

/// Whether a close with this code should schedule a reconnect.
pub fn should_reconnect(code: u16) -> bool {
    code != NORMAL_CLOSURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_closure_never_reconnects() {
        assert!(!should_reconnect(NORMAL_CLOSURE));
        assert!(should_reconnect(1001));
        assert!(should_reconnect(MESSAGE_TOO_LARGE));
        assert!(should_reconnect(1006));
    }

    #[test]
    fn close_code_error_strings() {
        assert_eq!(close_reason_message(MESSAGE_TOO_LARGE), "Message too large");
        assert_eq!(close_reason_message(1006), "Connection closed");
        assert_eq!(close_reason_message(NORMAL_CLOSURE), "Connection closed");
    }
}
