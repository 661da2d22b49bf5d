// Canned-response generation for the simulated assistant. Replies come from
// tone-specific response sets plus a handful of templated special cases; no
// model call is ever made.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::conversation::{Message, Sender};
use crate::knowledge::KnowledgeItem;
use crate::logging;
use crate::settings::{Settings, Tone};

// ============ Response Sets ============

const GREETINGS_FRIENDLY: [&str; 4] = [
    "Hello! How can I assist you today?",
    "Hi there! What can I help you with?",
    "Hey! How's it going? What do you need help with?",
    "Hello! I'm your AI assistant. What do you need help with?",
];

const GREETINGS_PROFESSIONAL: [&str; 4] = [
    "Hello. How may I assist you today?",
    "Greetings. How can I be of service?",
    "Good day. What assistance do you require?",
    "Hello. I'm your virtual assistant. How can I help you?",
];

const GREETINGS_TECHNICAL: [&str; 4] = [
    "Hello. Ready to process your request.",
    "Greetings. What technical assistance do you require?",
    "Hello. System ready for your query.",
    "Initialized and ready. What's your technical question?",
];

const FAREWELLS_FRIENDLY: [&str; 4] = [
    "Goodbye! Have a great day!",
    "Bye for now! Feel free to chat again anytime!",
    "Take care! I'm here whenever you need me!",
    "See you later! Come back soon!",
];

const FAREWELLS_PROFESSIONAL: [&str; 4] = [
    "Goodbye. Thank you for your time.",
    "Farewell. Please reach out if you need further assistance.",
    "Thank you for the conversation. Have a productive day.",
    "Goodbye. I remain available should you require additional help.",
];

const FAREWELLS_TECHNICAL: [&str; 4] = [
    "Session terminated. Goodbye.",
    "Disconnecting. Available for future queries.",
    "Ending conversation. System will remain available.",
    "Conversation complete. Ready for future technical assistance.",
];

const THANKS_FRIENDLY: [&str; 4] = [
    "You're welcome! Is there anything else I can help with?",
    "Happy to help! Let me know if you need anything else!",
    "My pleasure! Do you have any other questions?",
    "Anytime! I'm always here to help!",
];

const THANKS_PROFESSIONAL: [&str; 4] = [
    "You're welcome. Is there anything else you require?",
    "I'm glad I could be of assistance. Please let me know if you need further help.",
    "It was my pleasure to assist you. Do you have additional questions?",
    "You're most welcome. I'm here if you need additional support.",
];

const THANKS_TECHNICAL: [&str; 4] = [
    "Acknowledged. Additional assistance available if required.",
    "Request completed successfully. Further queries accepted.",
    "Assistance provided. Ready for next technical request.",
    "Task complete. System ready for additional queries.",
];

const ABOUT_FRIENDLY: [&str; 3] = [
    "I'm an AI assistant designed to help with various tasks and answer questions. I can provide information, assist with tasks, and engage in conversation. How can I help you today?",
    "I'm your friendly AI assistant! I'm here to chat, answer questions, and help you with whatever you need. What can I do for you?",
    "Hi there! I'm an AI chatbot created to assist you with information, tasks, and conversation. I'm always learning to provide better help. What would you like to know?",
];

const ABOUT_PROFESSIONAL: [&str; 3] = [
    "I am an AI assistant programmed to provide information and assistance across various domains. My purpose is to deliver accurate and helpful responses to your inquiries. How may I assist you today?",
    "I'm a virtual assistant designed to provide professional support and information. I can assist with research, answer questions, and help streamline your tasks. What assistance do you require?",
    "I am an AI-powered assistant focused on delivering professional support. I can provide information, answer questions, and assist with various tasks. How can I be of service?",
];

const ABOUT_TECHNICAL: [&str; 3] = [
    "I am an AI language model designed to process and respond to natural language inputs. My system utilizes pattern recognition and contextual analysis to generate appropriate responses. What is your technical query?",
    "This is an AI assistant interface utilizing natural language processing algorithms to interpret and respond to user inputs. Technical specifications available upon request. How can I assist with your technical needs?",
    "AI assistant online. Core functions include natural language processing, context analysis, and response generation. System ready for technical queries and information retrieval tasks.",
];

const CAPABILITIES_FRIENDLY: [&str; 3] = [
    "I can answer questions, provide information on various topics, assist with simple tasks, and engage in conversation. I'm here to help make your day easier!",
    "I can help with information, answer questions, chat about different topics, and assist with basic tasks. Just let me know what you need!",
    "I'm designed to be helpful! I can answer questions, provide explanations, offer suggestions, and have conversations on many topics. What would you like help with?",
];

const CAPABILITIES_PROFESSIONAL: [&str; 3] = [
    "My capabilities include providing information across various domains, answering inquiries, assisting with research, and facilitating task management. I aim to deliver accurate and relevant assistance.",
    "I can provide information, answer questions, assist with planning, and offer recommendations based on available data. My goal is to enhance your productivity through efficient assistance.",
    "My functions include information retrieval, question answering, and process assistance. I'm designed to provide clear, concise, and accurate support for your professional needs.",
];

const CAPABILITIES_TECHNICAL: [&str; 3] = [
    "System capabilities: natural language processing, context-aware responses, information retrieval from knowledge base, conversation memory, and basic reasoning within defined parameters.",
    "This AI system can process natural language inputs, maintain conversation context, access stored information, and generate contextually appropriate responses based on pattern recognition algorithms.",
    "Technical capabilities include: text processing, pattern matching, context maintenance, knowledge retrieval, and response generation. System limitations include lack of real-time data access and absence of true understanding.",
];

const FALLBACK_FRIENDLY: [&str; 4] = [
    "I'm not quite sure I understand. Could you please rephrase that?",
    "Hmm, I'm not sure about that. Could you give me more details?",
    "I'm still learning and don't have an answer for that yet. Is there something else I can help with?",
    "I don't have enough information to help with that specific request. Could you tell me more?",
];

const FALLBACK_PROFESSIONAL: [&str; 4] = [
    "I'm unable to provide a complete response based on the information provided. Could you please clarify your request?",
    "I don't have sufficient context to address your inquiry properly. Additional details would help me assist you more effectively.",
    "Your request requires more specific information for me to provide an appropriate response. Could you elaborate further?",
    "I'm afraid I cannot provide a satisfactory answer to that query. Would you like to try a different approach?",
];

const FALLBACK_TECHNICAL: [&str; 4] = [
    "Unable to process request with current parameters. Additional input required for successful query resolution.",
    "Query processing failed due to insufficient data. Please provide additional context or reformulate request.",
    "Response generation error: ambiguous input detected. Please specify request parameters more precisely.",
    "System unable to match input pattern to known response templates. Please restructure query with more specific parameters.",
];

pub fn greeting_set(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Friendly => &GREETINGS_FRIENDLY,
        Tone::Professional => &GREETINGS_PROFESSIONAL,
        Tone::Technical => &GREETINGS_TECHNICAL,
    }
}

pub fn farewell_set(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Friendly => &FAREWELLS_FRIENDLY,
        Tone::Professional => &FAREWELLS_PROFESSIONAL,
        Tone::Technical => &FAREWELLS_TECHNICAL,
    }
}

pub fn thanks_set(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Friendly => &THANKS_FRIENDLY,
        Tone::Professional => &THANKS_PROFESSIONAL,
        Tone::Technical => &THANKS_TECHNICAL,
    }
}

pub fn about_set(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Friendly => &ABOUT_FRIENDLY,
        Tone::Professional => &ABOUT_PROFESSIONAL,
        Tone::Technical => &ABOUT_TECHNICAL,
    }
}

pub fn capabilities_set(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Friendly => &CAPABILITIES_FRIENDLY,
        Tone::Professional => &CAPABILITIES_PROFESSIONAL,
        Tone::Technical => &CAPABILITIES_TECHNICAL,
    }
}

pub fn fallback_set(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Friendly => &FALLBACK_FRIENDLY,
        Tone::Professional => &FALLBACK_PROFESSIONAL,
        Tone::Technical => &FALLBACK_TECHNICAL,
    }
}

// ============ Pattern Matching ============

const GREETING_WORDS: [&str; 5] = ["hi", "hello", "hey", "greetings", "howdy"];
const FAREWELL_PREFIXES: [&str; 4] = ["bye", "goodbye", "farewell", "see you"];
const THANKS_PREFIXES: [&str; 3] = ["thanks", "thank you", "appreciate it"];
const ABOUT_PATTERNS: [&str; 3] = ["who are you", "what are you", "about yourself"];
const CAPABILITY_PATTERNS: [&str; 4] = [
    "what can you do",
    "your capabilities",
    "help me with",
    "abilities",
];

const SHORT_INPUT_CHARS: usize = 10;
const CONTEXT_SCAN_DEPTH: usize = 5;

/// Topic keywords scanned across recent user messages, with the canned
/// contextual reply each one selects.
const CONTEXT_TOPICS: [(&str, &str); 3] = [
    (
        "book",
        "You mentioned books earlier. I'd be happy to keep talking about reading - is there a particular title or genre on your mind?",
    ),
    (
        "travel",
        "Since travel came up earlier, I can help with that - destinations, planning, or what to pack. Which part are you working on?",
    ),
    (
        "food",
        "Food came up earlier in our chat. I'm glad to keep going on that - recipes, restaurants, or cooking tips?",
    ),
];

/// A greeting is one of the greeting words on its own, optionally followed
/// by " there", with trailing punctuation ignored.
fn is_greeting(input: &str) -> bool {
    let stripped = input.trim().trim_end_matches(['!', '.', '?']).trim_end();
    GREETING_WORDS
        .iter()
        .any(|w| stripped == *w || stripped == format!("{} there", w))
}

fn is_farewell(input: &str) -> bool {
    FAREWELL_PREFIXES.iter().any(|p| input.starts_with(p))
}

fn is_thanks(input: &str) -> bool {
    THANKS_PREFIXES.iter().any(|p| input.starts_with(p))
}

fn is_about_query(input: &str) -> bool {
    ABOUT_PATTERNS.iter().any(|p| input.contains(p))
}

fn is_capability_query(input: &str) -> bool {
    CAPABILITY_PATTERNS.iter().any(|p| input.contains(p))
}

fn is_help_query(input: &str) -> bool {
    input.contains("help") || input.contains("how to") || input.contains('?')
}

/// A knowledge item is relevant when its text contains the input, or the
/// input mentions the item's title ("what is your pricing" should hit an
/// item titled "Pricing").
fn matches_knowledge(item: &KnowledgeItem, input: &str) -> bool {
    let title = item.title.to_lowercase();
    let content = item.content.to_lowercase();
    title.contains(input) || content.contains(input) || input.contains(&title)
}

/// Scan the most recent user messages for a known topic keyword.
fn context_reply(history: &[Message]) -> Option<&'static str> {
    for message in history
        .iter()
        .rev()
        .filter(|m| m.sender == Sender::User)
        .take(CONTEXT_SCAN_DEPTH)
    {
        let content = message.content.to_lowercase();
        for &(keyword, reply) in CONTEXT_TOPICS.iter() {
            if content.contains(keyword) {
                return Some(reply);
            }
        }
    }
    None
}

// ============ Generator ============

/// Produces assistant replies by pattern-matching the user's input against
/// the knowledge base and the canned response sets. The RNG is owned so
/// tests can seed it and assert exact output.
pub struct ResponseGenerator {
    rng: StdRng,
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// First matching rule wins, checked top to bottom: knowledge base,
    /// greeting, farewell, thanks, self-reference, capabilities, short
    /// input, help-seeking, recent-topic context, fallback.
    pub fn generate(
        &mut self,
        user_input: &str,
        history: &[Message],
        knowledge: &[KnowledgeItem],
        settings: &Settings,
    ) -> String {
        let input = user_input.trim().to_lowercase();
        let tone = settings.tone;

        if !input.is_empty() {
            if let Some(item) = knowledge.iter().find(|item| matches_knowledge(item, &input)) {
                logging::log_generator(None, &format!("knowledge match: {}", item.title));
                return format!("Based on my knowledge base: {}", item.content);
            }
        }

        if is_greeting(&input) {
            return self.pick(greeting_set(tone));
        }

        if is_farewell(&input) {
            return self.pick(farewell_set(tone));
        }

        if is_thanks(&input) {
            return self.pick(thanks_set(tone));
        }

        if is_about_query(&input) {
            return self
                .pick(about_set(tone))
                .replace("AI Assistant", &settings.assistant_name);
        }

        if is_capability_query(&input) {
            return self.pick(capabilities_set(tone));
        }

        if input.chars().count() < SHORT_INPUT_CHARS {
            return format!(
                "I received your message: \"{}\". Could you provide more details about what you'd like to know?",
                user_input
            );
        }

        if is_help_query(&input) {
            return format!(
                "I understand you're looking for help with \"{}\". While I don't have specific information on this topic in my knowledge base yet, I'd be happy to assist if you provide more details about what you're trying to accomplish.",
                user_input.replace('?', "")
            );
        }

        if let Some(reply) = context_reply(history) {
            logging::log_generator(None, "context topic match");
            return reply.to_string();
        }

        self.pick(fallback_set(tone))
    }

    /// Roll the simulated-failure dice for the given rate.
    pub(crate) fn roll_failure(&mut self, rate: f64) -> bool {
        rate > 0.0 && self.rng.random::<f64>() < rate
    }

    fn pick(&mut self, options: &[&str]) -> String {
        options[self.rng.random_range(0..options.len())].to_string()
    }
}
