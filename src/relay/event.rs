use crate::telegram::update::{IncomingMessage, Update};

/// A message-bearing event, with the new/edited distinction made explicit.
///
/// Edited messages run through the same pipeline as new ones; the dedup store
/// is what keeps an edit from causing a second post.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    New(IncomingMessage),
    Edited(IncomingMessage),
}

impl InboundEvent {
    /// Classify an update. Updates that carry no message payload (channel
    /// posts, member changes, ...) yield `None`.
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(message) = update.edited_message {
            return Some(Self::Edited(message));
        }
        update.message.map(Self::New)
    }

    pub fn message(&self) -> &IncomingMessage {
        match self {
            Self::New(message) | Self::Edited(message) => message,
        }
    }

    /// The unified text payload: message body, else media caption, else
    /// empty.
    pub fn display_text(&self) -> &str {
        let message = self.message();
        message
            .text
            .as_deref()
            .or(message.caption.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::update::Chat;

    fn message(text: Option<&str>, caption: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            message_id: 1,
            chat: Chat { id: 10 },
            text: text.map(str::to_string),
            caption: caption.map(str::to_string),
        }
    }

    #[test]
    fn edited_takes_precedence() {
        let update = Update {
            update_id: 1,
            message: None,
            edited_message: Some(message(Some("edited"), None)),
        };
        let event = InboundEvent::from_update(update).unwrap();
        assert!(matches!(event, InboundEvent::Edited(_)));
    }

    #[test]
    fn plain_message_is_new() {
        let update = Update {
            update_id: 1,
            message: Some(message(Some("hi"), None)),
            edited_message: None,
        };
        let event = InboundEvent::from_update(update).unwrap();
        assert!(matches!(event, InboundEvent::New(_)));
    }

    #[test]
    fn empty_update_is_skipped() {
        let update = Update {
            update_id: 1,
            message: None,
            edited_message: None,
        };
        assert!(InboundEvent::from_update(update).is_none());
    }

    #[test]
    fn text_preferred_over_caption() {
        let event = InboundEvent::New(message(Some("body"), None));
        assert_eq!(event.display_text(), "body");
    }

    #[test]
    fn caption_used_for_media() {
        let event = InboundEvent::New(message(None, Some("a caption")));
        assert_eq!(event.display_text(), "a caption");
    }

    #[test]
    fn no_text_is_empty() {
        let event = InboundEvent::New(message(None, None));
        assert_eq!(event.display_text(), "");
    }
}
