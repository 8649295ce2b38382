//! Message Composer Adapters
//!
//! - **TemplateMessageComposer** - Fixed English templates

mod template_message_composer;

pub use template_message_composer::{render, TemplateMessageComposer};
