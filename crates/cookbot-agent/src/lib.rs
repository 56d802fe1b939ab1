//! # cookbot-agent
//!
//! Model access for cookbot.
//!
//! Every model call goes through the [`Gateway`], which picks a random
//! credential, serializes calls process-wide, and retries rate limits with
//! exponential backoff. Callers get text back, or the neutral result when the
//! call could not be completed.
//!
//! Also here: structured-output parsing for JSON-mode replies and the web
//! search client used to enrich prompts.

mod backend;
mod credentials;
mod gateway;
mod search;
mod structured;
mod types;

pub use backend::{GroqBackend, MockBackend, ModelBackend, RecordedCall, GROQ_CHAT_URL};
pub use credentials::{Credential, CredentialPool};
pub use gateway::Gateway;
pub use search::{search_all, GoogleSearch, SearchProvider, GOOGLE_SEARCH_URL, NO_SEARCH_DATA};
pub use structured::{extract_json_object, parse_structured, string_field, string_list_field};
pub use types::*;
