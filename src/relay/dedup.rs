use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Links remembered per chat before the oldest is evicted.
const MAX_LINKS_PER_CHAT: usize = 256;
/// Chats tracked before the least-recently-touched one is evicted.
const MAX_CHATS: usize = 1024;

/// Per-chat record of links the bot has already reposted.
///
/// Edited messages re-trigger the whole handler; this store is what keeps the
/// bot from posting the same rewritten link twice into one chat. Bounded on
/// both axes so a long-lived process cannot grow without limit.
pub struct SeenLinks {
    inner: Mutex<Inner>,
}

struct Inner {
    chats: HashMap<i64, ChatLinks>,
    clock: u64,
}

struct ChatLinks {
    links: VecDeque<String>,
    last_touched: u64,
}

impl SeenLinks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                chats: HashMap::new(),
                clock: 0,
            }),
        }
    }

    pub fn has_seen(&self, chat_id: i64, link: &str) -> bool {
        let inner = self.inner.lock().expect("seen-links lock poisoned");
        inner
            .chats
            .get(&chat_id)
            .is_some_and(|chat| chat.contains(link))
    }

    pub fn mark_seen(&self, chat_id: i64, link: &str) {
        let mut inner = self.inner.lock().expect("seen-links lock poisoned");
        inner.touch(chat_id).insert(link);
    }

    /// Check and mark under one lock, so concurrent handlers for the same
    /// chat cannot both decide to post. Returns true when the link is new.
    pub fn check_and_mark(&self, chat_id: i64, link: &str) -> bool {
        let mut inner = self.inner.lock().expect("seen-links lock poisoned");
        let chat = inner.touch(chat_id);
        if chat.contains(link) {
            return false;
        }
        chat.insert(link);
        true
    }
}

impl Default for SeenLinks {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Look up a chat's record, creating it on first access.
    fn touch(&mut self, chat_id: i64) -> &mut ChatLinks {
        self.clock += 1;
        let clock = self.clock;

        if !self.chats.contains_key(&chat_id) && self.chats.len() >= MAX_CHATS {
            self.evict_stalest();
        }

        let chat = self.chats.entry(chat_id).or_insert_with(|| ChatLinks {
            links: VecDeque::new(),
            last_touched: clock,
        });
        chat.last_touched = clock;
        chat
    }

    fn evict_stalest(&mut self) {
        let stalest = self
            .chats
            .iter()
            .min_by_key(|(_, chat)| chat.last_touched)
            .map(|(&chat_id, _)| chat_id);
        if let Some(chat_id) = stalest {
            self.chats.remove(&chat_id);
        }
    }
}

impl ChatLinks {
    fn contains(&self, link: &str) -> bool {
        self.links.iter().any(|seen| seen == link)
    }

    fn insert(&mut self, link: &str) {
        if self.contains(link) {
            return;
        }
        if self.links.len() >= MAX_LINKS_PER_CHAT {
            self.links.pop_front();
        }
        self.links.push_back(link.to_string());
    }
}
