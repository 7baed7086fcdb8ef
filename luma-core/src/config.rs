//! Session configuration.
//!
//! Everything the controller needs from the host: the recognition language,
//! the welcome string spoken when nothing else is available, the
//! summarization endpoint, and the text style applied uniformly to the
//! three regions.

use serde::{Deserialize, Serialize};

/// Spoken when a bare read-aloud request resolves to no region text.
pub const DEFAULT_WELCOME_TEXT: &str =
    "Welcome to Luma. Upload a document or start dictating to begin.";

/// Font families the rendering surface recognizes.
pub const RECOGNIZED_FAMILIES: [&str; 5] =
    ["Arial", "Verdana", "Tahoma", "OpenDyslexic", "Comic Sans MS"];

const MIN_FONT_PX: u32 = 8;
const MAX_FONT_PX: u32 = 72;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SessionConfig {
    /// BCP-47 tag passed to the recognition engine.
    pub language_tag: String,
    pub welcome_text: String,
    /// Full URL of the summarization relay endpoint.
    pub summarize_endpoint: String,
    /// Timeout for one summarization exchange, in seconds.
    pub request_timeout_secs: u64,
    /// Applied uniformly to the three editable regions.
    pub text_style: TextStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            welcome_text: DEFAULT_WELCOME_TEXT.into(),
            summarize_endpoint: "http://127.0.0.1:3000/summarize-text".into(),
            request_timeout_secs: 30,
            text_style: TextStyle::default(),
        }
    }
}

impl SessionConfig {
    /// Clamp and canonicalize every field to a usable value.
    pub fn normalize(&mut self) {
        self.language_tag = {
            let tag = self.language_tag.trim();
            if tag.is_empty() {
                "en-US".into()
            } else {
                tag.to_string()
            }
        };
        self.summarize_endpoint = self.summarize_endpoint.trim().to_string();
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 300);
        self.text_style.normalize();
    }
}

/// Font configuration for the editable regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TextStyle {
    pub size_px: u32,
    pub family: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size_px: 18,
            family: "Arial".into(),
        }
    }
}

impl TextStyle {
    /// Clamp the size and canonicalize the family against the recognized set.
    pub fn normalize(&mut self) {
        self.size_px = self.size_px.clamp(MIN_FONT_PX, MAX_FONT_PX);
        let requested = self.family.trim();
        self.family = RECOGNIZED_FAMILIES
            .iter()
            .find(|family| family.eq_ignore_ascii_case(requested))
            .map(|family| family.to_string())
            .unwrap_or_else(|| "Arial".into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_already_normalized() {
        let mut config = SessionConfig::default();
        let before = serde_json::to_value(&config).expect("serialize config");
        config.normalize();
        let after = serde_json::to_value(&config).expect("serialize config");
        assert_eq!(before, after);
    }

    #[test]
    fn normalize_repairs_language_and_timeout() {
        let mut config = SessionConfig {
            language_tag: "   ".into(),
            request_timeout_secs: 0,
            ..SessionConfig::default()
        };
        config.normalize();
        assert_eq!(config.language_tag, "en-US");
        assert_eq!(config.request_timeout_secs, 1);
    }

    #[test]
    fn style_size_is_clamped_to_the_pixel_range() {
        let mut style = TextStyle {
            size_px: 500,
            family: "Verdana".into(),
        };
        style.normalize();
        assert_eq!(style.size_px, 72);

        style.size_px = 2;
        style.normalize();
        assert_eq!(style.size_px, 8);
    }

    #[test]
    fn style_family_canonicalizes_case_and_rejects_unknown_fonts() {
        let mut style = TextStyle {
            size_px: 18,
            family: "opendyslexic".into(),
        };
        style.normalize();
        assert_eq!(style.family, "OpenDyslexic");

        style.family = "Wingdings".into();
        style.normalize();
        assert_eq!(style.family, "Arial");
    }

    #[test]
    fn config_deserializes_with_missing_fields_via_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"languageTag":"sv-SE"}"#).expect("parse partial config");
        assert_eq!(config.language_tag, "sv-SE");
        assert_eq!(config.welcome_text, DEFAULT_WELCOME_TEXT);
        assert_eq!(config.text_style, TextStyle::default());
    }
}
