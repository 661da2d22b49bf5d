mod conversation;
mod error;
mod knowledge;
mod logging;
mod responder;
mod settings;
mod storage;
mod streaming;

pub use conversation::{Conversation, ConversationStore, Message, Sender, NEW_CONVERSATION_TITLE};
pub use error::{Error, Result};
pub use knowledge::{KnowledgeItem, KnowledgeItemPatch, KnowledgeStore, DEFAULT_CATEGORY};
pub use responder::ResponseGenerator;
pub use settings::{Settings, SettingsPatch, SettingsStore, Tone};
pub use storage::Storage;
pub use streaming::{reveal, RevealStream, WordPacing};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Knobs for the simulated reply round-trip: an artificial delay standing in
/// for model latency, and an optional random failure rate.
#[derive(Debug, Clone, Copy)]
pub struct ReplyConfig {
    pub latency_ms: u64,
    pub failure_rate: f64,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1000,
            failure_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub avg_messages_per_conversation: usize,
    pub knowledge_items: usize,
}

/// The exported document: everything the app persists, in one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub settings: Settings,
    pub conversations: Vec<Conversation>,
    pub knowledge_base: Vec<KnowledgeItem>,
}

const IMPORT_REQUIRED_KEYS: [&str; 3] = ["settings", "conversations", "knowledgeBase"];

/// Default state directory for the assistant, under the platform data dir.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("aide"))
}

/// Explicitly constructed application state: the stores, the generator, and
/// the reply configuration, all wired to one storage handle. The UI layer
/// holds one of these and drives it; nothing here is global.
pub struct AppState {
    settings: SettingsStore,
    conversations: ConversationStore,
    knowledge: KnowledgeStore,
    generator: ResponseGenerator,
    reply_config: ReplyConfig,
}

impl AppState {
    /// Open (or create) the persisted state under `data_dir` and load every
    /// collection, falling back to defaults where nothing usable is stored.
    pub fn open(data_dir: &Path) -> Result<Self> {
        if let Err(e) = logging::init_logging(&data_dir.join("logs")) {
            eprintln!("Failed to initialize logging: {}", e);
        }
        let _ = logging::cleanup_old_logs();

        let storage = Arc::new(Storage::open(&data_dir.join("assistant.db"))?);
        Self::from_storage(storage)
    }

    /// Ephemeral state for demos and tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_storage(Arc::new(Storage::open_in_memory()?))
    }

    fn from_storage(storage: Arc<Storage>) -> Result<Self> {
        let settings = SettingsStore::load(storage.clone());
        let mut conversations = ConversationStore::load(storage.clone());
        let knowledge = KnowledgeStore::load(storage);

        // First launch: seed an initial conversation so there is always
        // something to land on
        if conversations.conversations().is_empty() {
            conversations.start_new_conversation(&settings.settings().welcome_message);
        }

        logging::log_conversation(
            None,
            &format!(
                "state loaded: {} conversations, {} knowledge items",
                conversations.conversations().len(),
                knowledge.items().len()
            ),
        );

        Ok(Self {
            settings,
            conversations,
            knowledge,
            generator: ResponseGenerator::new(),
            reply_config: ReplyConfig::default(),
        })
    }

    // ============ Presentation Boundary ============

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn conversations_mut(&mut self) -> &mut ConversationStore {
        &mut self.conversations
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut KnowledgeStore {
        &mut self.knowledge
    }

    pub fn set_reply_config(&mut self, config: ReplyConfig) {
        self.reply_config = config;
    }

    /// Swap the generator, e.g. for a seeded one in tests.
    pub fn set_generator(&mut self, generator: ResponseGenerator) {
        self.generator = generator;
    }

    /// Start a conversation seeded with the current welcome message.
    pub fn start_new_conversation(&mut self) -> String {
        self.conversations
            .start_new_conversation(&self.settings.settings().welcome_message)
    }

    // ============ Message Round-Trip ============

    /// Append the user's message, wait the simulated latency, then generate
    /// and append the assistant reply. On a simulated failure the user
    /// message stays in history; only the reply is missing and the user may
    /// resend.
    pub async fn send_message(&mut self, conversation_id: &str, content: &str) -> Result<Message> {
        self.conversations
            .add_message(conversation_id, content, Sender::User)?;

        tokio::time::sleep(Duration::from_millis(self.reply_config.latency_ms)).await;

        if self.generator.roll_failure(self.reply_config.failure_rate) {
            logging::log_error(Some(conversation_id), "simulated generation failure");
            return Err(Error::GenerationFailed);
        }

        let history = self
            .conversations
            .conversation(conversation_id)
            .map(|c| c.messages.as_slice())
            .unwrap_or(&[]);
        let reply = self.generator.generate(
            content,
            history,
            self.knowledge.items(),
            self.settings.settings(),
        );

        logging::log_generator(Some(conversation_id), "reply generated");
        self.conversations
            .add_message(conversation_id, &reply, Sender::Assistant)
    }

    // ============ Usage Statistics ============

    pub fn usage(&self) -> UsageSnapshot {
        let conversations = self.conversations.conversations();
        let total_conversations = conversations.len();
        let total_messages: usize = conversations.iter().map(|c| c.messages.len()).sum();
        let user_messages: usize = conversations
            .iter()
            .flat_map(|c| &c.messages)
            .filter(|m| m.sender == Sender::User)
            .count();

        let avg_messages_per_conversation = if total_conversations > 0 {
            (total_messages as f64 / total_conversations as f64).round() as usize
        } else {
            0
        };

        UsageSnapshot {
            total_conversations,
            total_messages,
            user_messages,
            assistant_messages: total_messages - user_messages,
            avg_messages_per_conversation,
            knowledge_items: self.knowledge.items().len(),
        }
    }

    // ============ Export / Import ============

    /// Serialize settings, conversations, and the knowledge base as one
    /// pretty-printed JSON document.
    pub fn export(&self) -> Result<String> {
        let data = ExportData {
            settings: self.settings.settings().clone(),
            conversations: self.conversations.conversations().to_vec(),
            knowledge_base: self.knowledge.items().to_vec(),
        };
        logging::log_conversation(None, "state exported");
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Validate an exported document and apply its settings. All three
    /// top-level keys must be present; nothing is applied otherwise.
    /// Conversation and knowledge base import is a declared extension point
    /// and is not applied yet.
    pub fn import(&mut self, json: &str) -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::Import(format!("invalid JSON: {}", e)))?;

        for key in IMPORT_REQUIRED_KEYS {
            if value.get(key).is_none() {
                return Err(Error::Import(format!("missing required key: {}", key)));
            }
        }

        let settings: Settings = serde_json::from_value(value["settings"].clone())
            .map_err(|e| Error::Import(format!("invalid settings payload: {}", e)))?;

        self.settings.replace(settings);
        logging::log_conversation(None, "settings imported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppState {
        let mut app = AppState::open_in_memory().unwrap();
        app.set_generator(ResponseGenerator::seeded(7));
        app.set_reply_config(ReplyConfig {
            latency_ms: 0,
            failure_rate: 0.0,
        });
        app
    }

    #[test]
    fn first_open_seeds_an_initial_conversation() {
        let app = app();
        assert_eq!(app.conversations().conversations().len(), 1);
        assert!(app.conversations().current_id().is_some());
    }

    #[tokio::test]
    async fn send_message_appends_user_then_assistant() {
        let mut app = app();
        let id = app.conversations().current_id().unwrap().to_string();

        let reply = app.send_message(&id, "Hello").await.unwrap();
        assert_eq!(reply.sender, Sender::Assistant);

        let messages = &app.conversations().conversation(&id).unwrap().messages;
        // welcome + user + assistant
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[1].content, "Hello");
        assert_eq!(messages[2].sender, Sender::Assistant);
    }

    #[tokio::test]
    async fn simulated_failure_keeps_the_user_message() {
        let mut app = app();
        app.set_reply_config(ReplyConfig {
            latency_ms: 0,
            failure_rate: 1.0,
        });
        let id = app.conversations().current_id().unwrap().to_string();

        let err = app.send_message(&id, "Hello").await.unwrap_err();
        assert!(matches!(err, Error::GenerationFailed));

        let messages = &app.conversations().conversation(&id).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::User);
    }

    #[tokio::test]
    async fn knowledge_base_informs_the_reply() {
        let mut app = app();
        app.knowledge_mut()
            .add("Pricing", "Our plan costs $10/mo", None)
            .unwrap();
        let id = app.conversations().current_id().unwrap().to_string();

        let reply = app.send_message(&id, "what is your pricing").await.unwrap();
        assert_eq!(
            reply.content,
            "Based on my knowledge base: Our plan costs $10/mo"
        );
    }

    #[test]
    fn usage_counts_reflect_the_stores() {
        let mut app = app();
        let id = app.conversations().current_id().unwrap().to_string();
        app.conversations_mut()
            .add_message(&id, "hi", Sender::User)
            .unwrap();
        app.knowledge_mut().add("Pricing", "$10/mo", None).unwrap();

        let usage = app.usage();
        assert_eq!(usage.total_conversations, 1);
        assert_eq!(usage.total_messages, 2);
        assert_eq!(usage.user_messages, 1);
        assert_eq!(usage.assistant_messages, 1);
        assert_eq!(usage.avg_messages_per_conversation, 2);
        assert_eq!(usage.knowledge_items, 1);
    }

    #[test]
    fn export_round_trips_through_import() {
        let mut app = app();
        app.settings_mut().update(SettingsPatch {
            assistant_name: Some("Nova".to_string()),
            ..Default::default()
        });

        let document = app.export().unwrap();

        let mut other = AppState::open_in_memory().unwrap();
        other.import(&document).unwrap();
        assert_eq!(other.settings().settings().assistant_name, "Nova");
    }

    #[test]
    fn import_missing_key_is_rejected_and_settings_untouched() {
        let mut app = app();
        let before = app.settings().settings().clone();

        let document = r#"{"settings": {}, "conversations": []}"#;
        let err = app.import(document).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
        assert!(err.to_string().contains("knowledgeBase"));
        assert_eq!(*app.settings().settings(), before);
    }

    #[test]
    fn import_applies_settings_only() {
        let mut app = app();
        let conversations_before = app.conversations().conversations().len();
        let document = serde_json::json!({
            "settings": {
                "assistantName": "Nova",
                "assistantAvatar": null,
                "primaryColor": "#123456",
                "darkMode": true,
                "tone": "technical",
                "welcomeMessage": "Welcome back."
            },
            "conversations": [],
            "knowledgeBase": [{"bogus": "entry"}]
        })
        .to_string();

        app.import(&document).unwrap();

        let settings = app.settings().settings();
        assert_eq!(settings.assistant_name, "Nova");
        assert_eq!(settings.tone, Tone::Technical);
        assert!(settings.dark_mode);
        // Conversations and knowledge are untouched
        assert_eq!(app.conversations().conversations().len(), conversations_before);
        assert!(app.knowledge().items().is_empty());
    }
}
