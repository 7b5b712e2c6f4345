pub mod dedup;
pub mod event;

pub use dedup::SeenLinks;
pub use event::InboundEvent;

use crate::links::{Resolver, extract_url};
use crate::telegram::TelegramApi;
use crate::telegram::update::Update;
use anyhow::Result;

/// Orchestrates the pipeline for one inbound event: extract → resolve →
/// rewrite → dedup → repost.
pub struct Relay {
    api: TelegramApi,
    resolver: Resolver,
    seen: SeenLinks,
}

impl Relay {
    pub fn new(api: TelegramApi, resolver: Resolver) -> Self {
        Self {
            api,
            resolver,
            seen: SeenLinks::new(),
        }
    }

    pub fn api(&self) -> &TelegramApi {
        &self.api
    }

    /// Top-level entry for one update. Never fails: pipeline errors are
    /// logged here so one broken event cannot take down the loop.
    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        let Some(event) = InboundEvent::from_update(update) else {
            return;
        };

        if let Err(err) = self.handle_event(&event).await {
            tracing::error!(update_id, error = %err, "update handling failed");
        }
    }

    async fn handle_event(&self, event: &InboundEvent) -> Result<()> {
        let message = event.message();
        let text = event.display_text();

        let Some(raw_url) = extract_url(text) else {
            tracing::debug!(chat = message.chat.id, "no url in message");
            return Ok(());
        };

        let Some(canonical) = self.resolver.resolve(raw_url).await? else {
            tracing::debug!(url = %raw_url, "not a resolvable video link");
            return Ok(());
        };

        let rewritten = self.resolver.rewrite(&canonical);
        if !self.seen.check_and_mark(message.chat.id, &rewritten) {
            tracing::debug!(chat = message.chat.id, url = %rewritten, "already posted in this chat");
            return Ok(());
        }

        let repost = text.replacen(raw_url, &rewritten, 1);
        self.api.send_message(message.chat.id, &repost).await?;

        // The bot may lack permission to delete other users' messages.
        if let Err(err) = self
            .api
            .delete_message(message.chat.id, message.message_id)
            .await
        {
            tracing::warn!(chat = message.chat.id, error = %err, "could not delete original message");
        }

        Ok(())
    }
}
