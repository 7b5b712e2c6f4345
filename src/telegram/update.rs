use serde::Deserialize;

/// One entry from `getUpdates` or a webhook delivery.
///
/// `message` and `edited_message` are mutually exclusive on the wire; any
/// other update kind deserializes with both absent and is ignored upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub edited_message: Option<IncomingMessage>,
}

/// The subset of a Telegram message the relay cares about. `text` carries
/// plain messages, `caption` carries media posts; the protocol never sets
/// both.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}
