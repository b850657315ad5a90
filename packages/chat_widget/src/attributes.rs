//! Attribute parsing for the widget element.
//!
//! Attributes arrive as strings from the host page; [`WidgetProps`] is the
//! typed view the renderer consumes. Parsing never fails: an unparseable
//! value falls back to the same default a missing attribute gets.

use std::collections::BTreeMap;

use chat_client::DEFAULT_WEBSOCKET_URL;

/// Attributes whose changes trigger a re-render on a mounted element.
pub const OBSERVED_ATTRIBUTES: &[&str] = &[
    "api-endpoint",
    "websocket-url",
    "theme",
    "position",
    "welcome-message",
    "placeholder",
    "max-height",
    "width",
    "z-index",
    "show-welcome-message",
];

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hi! I'm here to help you navigate. What are you looking for?";
pub const DEFAULT_PLACEHOLDER: &str = "Ask me anything...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the host's color scheme preference.
    Auto,
}

impl Theme {
    fn parse(value: &str) -> Self {
        match value {
            "dark" => Theme::Dark,
            "auto" => Theme::Auto,
            _ => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Position {
    fn parse(value: &str) -> Self {
        match value {
            "bottom-left" => Position::BottomLeft,
            "top-right" => Position::TopRight,
            "top-left" => Position::TopLeft,
            _ => Position::BottomRight,
        }
    }
}

/// Typed widget configuration derived from the element's attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetProps {
    pub api_endpoint: String,
    pub websocket_url: String,
    pub theme: Theme,
    pub position: Position,
    pub welcome_message: String,
    pub placeholder: String,
    pub max_height: u32,
    pub width: u32,
    pub z_index: u32,
    pub show_welcome_message: bool,
}

impl Default for WidgetProps {
    fn default() -> Self {
        Self::from_attributes(&BTreeMap::new())
    }
}

impl WidgetProps {
    pub fn from_attributes(attrs: &BTreeMap<String, String>) -> Self {
        let get = |name: &str| attrs.get(name).map(String::as_str);
        let int = |name: &str, default: u32| {
            get(name).and_then(|v| v.parse().ok()).unwrap_or(default)
        };
        Self {
            api_endpoint: get("api-endpoint").unwrap_or(DEFAULT_API_ENDPOINT).to_string(),
            websocket_url: get("websocket-url").unwrap_or(DEFAULT_WEBSOCKET_URL).to_string(),
            theme: get("theme").map(Theme::parse).unwrap_or_default(),
            position: get("position").map(Position::parse).unwrap_or_default(),
            welcome_message: get("welcome-message").unwrap_or(DEFAULT_WELCOME_MESSAGE).to_string(),
            placeholder: get("placeholder").unwrap_or(DEFAULT_PLACEHOLDER).to_string(),
            max_height: int("max-height", 500),
            width: int("width", 350),
            z_index: int("z-index", 1000),
            // Welcome stays on unless explicitly switched off.
            show_welcome_message: get("show-welcome-message") != Some("false"),
        }
    }
}
