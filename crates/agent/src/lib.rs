//! The conversational core of ragchat.
//!
//! Each turn follows one fixed path:
//!
//! 1. **Record** the user message in bounded memory
//! 2. **Retrieve** matching knowledge entries for the user text
//! 3. **Assemble** history + context block + user turn into one prompt
//! 4. **Generate** via the configured provider
//! 5. **Clean** role-prefix leakage and record the assistant reply
//!
//! Backend failures end the turn with an apology string instead of an error;
//! retrieval failures just mean an empty context block.

pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use prompt::{PromptAssembler, clean_response, format_context};
pub use session::{ChatSession, ConversationStats, SessionState};
