//! Response generator adapters.

pub mod openai_chat;

pub use openai_chat::OpenAiChatGenerator;
