//! Language Understanding Adapters
//!
//! - **ScriptedLanguageUnderstanding** - Script-driven NLU (testing/development)

mod scripted_language_understanding;

pub use scripted_language_understanding::{NluCall, ScriptedLanguageUnderstanding};
