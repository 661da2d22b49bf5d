use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging;
use crate::storage::{Storage, KEY_CONVERSATIONS, KEY_CURRENT_CONVERSATION};

/// Placeholder title until the first user message rewrites it.
pub const NEW_CONVERSATION_TITLE: &str = "New Conversation";

const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
}

/// Owns the conversation list (most-recent-first insertion) and the
/// current-conversation reference.
pub struct ConversationStore {
    storage: Arc<Storage>,
    conversations: Vec<Conversation>,
    current_id: Option<String>,
}

impl ConversationStore {
    pub fn load(storage: Arc<Storage>) -> Self {
        let conversations: Vec<Conversation> = storage.load(KEY_CONVERSATIONS, Vec::new());
        let mut current_id: Option<String> = storage.load(KEY_CURRENT_CONVERSATION, None);

        // A stored reference to a conversation that no longer exists is stale
        if let Some(ref id) = current_id {
            if !conversations.iter().any(|c| c.id == *id) {
                logging::log_conversation(Some(id), "stored current conversation is gone, clearing");
                current_id = None;
            }
        }

        Self {
            storage,
            conversations,
            current_id,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.current_id
            .as_deref()
            .and_then(|id| self.conversation(id))
    }

    /// Create a conversation seeded with one assistant message carrying
    /// `welcome_message`, place it at the front of the list, and make it
    /// current. Returns the new id.
    pub fn start_new_conversation(&mut self, welcome_message: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conversation = Conversation {
            id: id.clone(),
            title: NEW_CONVERSATION_TITLE.to_string(),
            messages: vec![Message {
                id: Uuid::new_v4().to_string(),
                content: welcome_message.to_string(),
                sender: Sender::Assistant,
                timestamp: now,
            }],
            last_updated: now,
        };

        self.conversations.insert(0, conversation);
        self.current_id = Some(id.clone());
        self.persist();

        logging::log_conversation(Some(&id), "conversation started");
        id
    }

    /// Append a message to the named conversation. The first user message
    /// also rewrites the placeholder title.
    pub fn add_message(
        &mut self,
        conversation_id: &str,
        content: &str,
        sender: Sender,
    ) -> Result<Message> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| Error::ConversationNotFound(conversation_id.to_string()))?;

        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            sender,
            timestamp: now,
        };

        if conversation.title == NEW_CONVERSATION_TITLE && sender == Sender::User {
            conversation.title = derive_title(content);
        }

        conversation.messages.push(message.clone());
        // last_updated never moves backwards, even if the clock does
        conversation.last_updated = now.max(conversation.last_updated);

        self.persist();
        Ok(message)
    }

    /// Remove the conversation. If it was current, the reference is cleared;
    /// picking a replacement is the caller's policy (see `most_recent_id`).
    pub fn delete_conversation(&mut self, id: &str) -> Result<()> {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return Err(Error::ConversationNotFound(id.to_string()));
        }

        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        self.persist();

        logging::log_conversation(Some(id), "conversation deleted");
        Ok(())
    }

    /// Set the current-conversation reference without validating it; callers
    /// are trusted to pass a known id.
    pub fn set_current(&mut self, id: Option<String>) {
        self.current_id = id;
        self.storage
            .save_best_effort(KEY_CURRENT_CONVERSATION, &self.current_id);
    }

    /// Id of the most recently updated conversation, if any. The usual
    /// fallback after deleting the current one.
    pub fn most_recent_id(&self) -> Option<String> {
        self.conversations
            .iter()
            .max_by_key(|c| c.last_updated)
            .map(|c| c.id.clone())
    }

    fn persist(&self) {
        self.storage
            .save_best_effort(KEY_CONVERSATIONS, &self.conversations);
        self.storage
            .save_best_effort(KEY_CURRENT_CONVERSATION, &self.current_id);
    }
}

fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELCOME: &str = "Hello! I'm your AI assistant. How can I help you today?";

    fn store() -> ConversationStore {
        ConversationStore::load(Arc::new(Storage::open_in_memory().unwrap()))
    }

    #[test]
    fn new_conversation_is_seeded_and_current() {
        let mut store = store();
        let id = store.start_new_conversation(WELCOME);

        assert_eq!(store.current_id(), Some(id.as_str()));
        let conversation = store.conversation(&id).unwrap();
        assert_eq!(conversation.title, NEW_CONVERSATION_TITLE);
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].sender, Sender::Assistant);
        assert_eq!(conversation.messages[0].content, WELCOME);
    }

    #[test]
    fn new_conversations_go_to_the_front() {
        let mut store = store();
        let first = store.start_new_conversation(WELCOME);
        let second = store.start_new_conversation(WELCOME);

        let ids: Vec<&str> = store.conversations().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    }

    #[test]
    fn messages_keep_call_order_and_content() {
        let mut store = store();
        let id = store.start_new_conversation(WELCOME);

        store.add_message(&id, "first", Sender::User).unwrap();
        store.add_message(&id, "second", Sender::Assistant).unwrap();
        store.add_message(&id, "third", Sender::User).unwrap();

        let contents: Vec<(&str, Sender)> = store
            .conversation(&id)
            .unwrap()
            .messages
            .iter()
            .skip(1)
            .map(|m| (m.content.as_str(), m.sender))
            .collect();
        assert_eq!(
            contents,
            vec![
                ("first", Sender::User),
                ("second", Sender::Assistant),
                ("third", Sender::User),
            ]
        );
    }

    #[test]
    fn title_is_derived_from_first_user_message_only() {
        let mut store = store();
        let id = store.start_new_conversation(WELCOME);
        assert_eq!(store.conversation(&id).unwrap().title, NEW_CONVERSATION_TITLE);

        store
            .add_message(&id, "What is the capital of France?", Sender::User)
            .unwrap();
        assert_eq!(
            store.conversation(&id).unwrap().title,
            "What is the capital of France?"
        );

        store.add_message(&id, "A different topic", Sender::User).unwrap();
        assert_eq!(
            store.conversation(&id).unwrap().title,
            "What is the capital of France?"
        );
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let mut store = store();
        let id = store.start_new_conversation(WELCOME);
        store
            .add_message(
                &id,
                "This message is well over thirty characters long",
                Sender::User,
            )
            .unwrap();
        assert_eq!(
            store.conversation(&id).unwrap().title,
            "This message is well over thir..."
        );
    }

    #[test]
    fn assistant_messages_do_not_claim_the_title() {
        let mut store = store();
        let id = store.start_new_conversation(WELCOME);
        store
            .add_message(&id, "an assistant aside", Sender::Assistant)
            .unwrap();
        assert_eq!(store.conversation(&id).unwrap().title, NEW_CONVERSATION_TITLE);
    }

    #[test]
    fn deleting_current_clears_reference() {
        let mut store = store();
        let first = store.start_new_conversation(WELCOME);
        let second = store.start_new_conversation(WELCOME);

        store.delete_conversation(&second).unwrap();
        assert_eq!(store.current_id(), None);

        store.set_current(Some(first.clone()));
        let third = store.start_new_conversation(WELCOME);
        store.set_current(Some(first.clone()));
        store.delete_conversation(&third).unwrap();
        assert_eq!(store.current_id(), Some(first.as_str()));
    }

    #[test]
    fn add_message_to_unknown_conversation_reports_not_found() {
        let mut store = store();
        let err = store.add_message("missing", "hi", Sender::User).unwrap_err();
        assert!(matches!(err, Error::ConversationNotFound(_)));
    }

    #[test]
    fn most_recent_id_tracks_last_update() {
        let mut store = store();
        let first = store.start_new_conversation(WELCOME);
        let _second = store.start_new_conversation(WELCOME);

        store.add_message(&first, "bump", Sender::User).unwrap();
        assert_eq!(store.most_recent_id(), Some(first));
    }

    #[test]
    fn state_survives_reload_from_storage() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        let id = {
            let mut store = ConversationStore::load(storage.clone());
            let id = store.start_new_conversation(WELCOME);
            store.add_message(&id, "remember me", Sender::User).unwrap();
            id
        };

        let store = ConversationStore::load(storage);
        assert_eq!(store.current_id(), Some(id.as_str()));
        let conversation = store.conversation(&id).unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[1].content, "remember me");
    }

    #[test]
    fn stale_current_reference_is_cleared_on_load() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        storage
            .save(KEY_CURRENT_CONVERSATION, &Some("gone".to_string()))
            .unwrap();

        let store = ConversationStore::load(storage);
        assert_eq!(store.current_id(), None);
    }
}
