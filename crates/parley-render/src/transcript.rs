//! Transcript view: which messages show, in which bubble, with what nodes.

use parley_core::config::{StyleMap, TypingIndicator};
use parley_types::{Message, Role};
use serde::Serialize;

use crate::chrome::Chrome;
use crate::dispatch::render;
use crate::node::RenderNode;

pub const EMPTY_TRANSCRIPT_TEXT: &str = "No conversation yet.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    /// Index of the message in the transcript.
    pub key: usize,
    pub role: Role,
    pub style: StyleMap,
    pub nodes: Vec<RenderNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptView {
    pub bubbles: Vec<Bubble>,
    /// The transcript has no messages at all (malformed ones included).
    pub is_empty: bool,
    /// Shown after the last bubble while a reply is pending.
    pub typing: Option<TypingIndicator>,
}

/// Renders every displayable message.
///
/// Messages without a role or content, or with empty text content, are
/// skipped but keep their index as key.
pub fn render_transcript(
    messages: &[Message],
    typing: bool,
    indicator: TypingIndicator,
    chrome: &Chrome,
) -> TranscriptView {
    let bubbles = messages
        .iter()
        .enumerate()
        .filter(|(_, message)| message.is_displayable())
        .filter_map(|(key, message)| {
            let role = message.role?;
            let content = message.content.as_ref()?;
            Some(Bubble {
                key,
                role,
                style: chrome.bubble_style(role).clone(),
                nodes: render(content),
            })
        })
        .collect();

    TranscriptView {
        bubbles,
        is_empty: messages.is_empty(),
        typing: typing.then_some(indicator),
    }
}

#[cfg(test)]
mod tests {
    use parley_core::config::Config;
    use parley_types::Content;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_filter() {
        let messages: Vec<Message> = serde_json::from_value(json!([
            { "role": "assistant", "content": "hello" },
            { "content": "no role" },
            { "role": "user" },
            { "role": "user", "content": "" },
            { "role": "robot", "content": "odd role" },
            { "id": 1, "role": "user", "content": "hi" }
        ]))
        .unwrap();

        let chrome = Chrome::from_config(&Config::default());
        let view = render_transcript(&messages, false, TypingIndicator::Dots, &chrome);

        let keys: Vec<_> = view.bubbles.iter().map(|b| b.key).collect();
        assert_eq!(keys, vec![0, 4, 5]);
        assert_eq!(view.bubbles[1].style, chrome.assistant_bubble_style);
        assert_eq!(view.bubbles[2].style, chrome.user_bubble_style);
        assert!(!view.is_empty);
        assert_eq!(view.typing, None);
    }

    #[test]
    fn test_empty_transcript_with_typing() {
        let chrome = Chrome::from_config(&Config::default());
        let view = render_transcript(&[], true, TypingIndicator::Spinner, &chrome);
        assert!(view.is_empty);
        assert!(view.bubbles.is_empty());
        assert_eq!(view.typing, Some(TypingIndicator::Spinner));
    }

    #[test]
    fn test_bubble_nodes() {
        let chrome = Chrome::from_config(&Config::default());
        let view = render_transcript(
            &[Message::assistant(Content::from("**hi**"))],
            false,
            TypingIndicator::Dots,
            &chrome,
        );
        assert_eq!(view.bubbles[0].nodes.len(), 1);
    }
}
