//! Terminal rendering of a chat surface.

use crate::models::MessageRole;
use crate::session::ChatView;

/// Quick replies offered on an empty conversation.
pub const SUGGESTIONS: [&str; 4] = [
    "Browse treatments",
    "Pricing & packages",
    "Book an appointment",
    "Speak with our team",
];

pub const ASSISTANT_LABEL: &str = "concierge> ";

/// AI disclosure shown at the top of every chat surface.
pub const AI_DISCLOSURE: &str = "AI-powered assistant \u{b7} Not a substitute for medical advice";

/// Maps a composer line to the text to send.
///
/// On an empty conversation a bare `1`..`4` picks the matching suggestion.
pub fn resolve_input(line: &str, conversation_started: bool) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !conversation_started {
        if let Some(suggestion) = trimmed
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| SUGGESTIONS.get(i))
        {
            return Some((*suggestion).to_string());
        }
    }
    Some(trimmed.to_string())
}

pub fn welcome() -> String {
    let mut out = format!("{AI_DISCLOSURE}\n\nWelcome. How may I assist you today?\n");
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        out.push_str(&format!("  [{}] {suggestion}\n", i + 1));
    }
    out
}

/// Turns successive [`ChatView`] snapshots into incremental terminal output.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    shown: usize,
    streamed: String,
}

impl StreamPrinter {
    /// Starts after the messages already present in `view`.
    pub fn resume(view: &ChatView) -> Self {
        Self { shown: view.messages.len(), streamed: String::new() }
    }

    pub fn render(&mut self, view: &ChatView) -> String {
        let mut out = String::new();

        for message in view.messages.iter().skip(self.shown) {
            if message.role != MessageRole::Assistant {
                continue;
            }
            let streamed = std::mem::take(&mut self.streamed);
            match message.content.strip_prefix(streamed.as_str()) {
                Some(rest) if !streamed.is_empty() => out.push_str(rest),
                _ => {
                    if !streamed.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(ASSISTANT_LABEL);
                    out.push_str(&message.content);
                }
            }
            out.push('\n');
        }
        self.shown = view.messages.len();

        let content = view.streaming_content.as_str();
        if content.is_empty() {
            if !self.streamed.is_empty() {
                out.push_str("\n[reply interrupted]\n");
                self.streamed.clear();
            }
        } else if let Some(rest) = content.strip_prefix(self.streamed.as_str()) {
            if self.streamed.is_empty() {
                out.push_str(ASSISTANT_LABEL);
            }
            out.push_str(rest);
            self.streamed = content.to_string();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;
    use crate::session::FALLBACK_REPLY;

    fn view(messages: Vec<ChatMessage>, streaming: &str) -> ChatView {
        ChatView {
            messages,
            streaming_content: streaming.to_string(),
            is_loading: !streaming.is_empty(),
            conversation_id: None,
        }
    }

    #[test]
    fn number_picks_suggestion_only_before_first_turn() {
        assert_eq!(resolve_input(" 3 ", false).as_deref(), Some("Book an appointment"));
        assert_eq!(resolve_input("3", true).as_deref(), Some("3"));
        assert_eq!(resolve_input("9", false).as_deref(), Some("9"));
        assert_eq!(resolve_input("0", false).as_deref(), Some("0"));
        assert_eq!(resolve_input("   ", false), None);
    }

    #[test]
    fn welcome_lists_every_suggestion() {
        let text = welcome();
        assert!(SUGGESTIONS.iter().all(|s| text.contains(s)));
        assert!(text.starts_with("AI-powered assistant \u{b7} Not a substitute for medical advice"));
    }

    #[test]
    fn prints_only_new_fragments_then_finishes_line() {
        let user = ChatMessage::user("Hi");
        let mut printer = StreamPrinter::default();
        assert_eq!(printer.render(&view(vec![user.clone()], "")), "");
        assert_eq!(printer.render(&view(vec![user.clone()], "Hel")), "concierge> Hel");
        assert_eq!(printer.render(&view(vec![user.clone()], "Hello")), "lo");
        let done = view(vec![user, ChatMessage::assistant("Hello")], "");
        assert_eq!(printer.render(&done), "\n");
    }

    #[test]
    fn fallback_after_partial_stream_starts_new_line() {
        let user = ChatMessage::user("Hi");
        let mut printer = StreamPrinter::resume(&view(vec![], ""));
        printer.render(&view(vec![user.clone()], "par"));
        let failed = view(vec![user, ChatMessage::assistant(FALLBACK_REPLY)], "");
        assert_eq!(printer.render(&failed), format!("\n{ASSISTANT_LABEL}{FALLBACK_REPLY}\n"));
    }

    #[test]
    fn discarded_stream_is_marked_interrupted() {
        let user = ChatMessage::user("Hi");
        let mut printer = StreamPrinter::default();
        printer.render(&view(vec![user.clone()], "half"));
        assert_eq!(printer.render(&view(vec![user], "")), "\n[reply interrupted]\n");
    }
}
