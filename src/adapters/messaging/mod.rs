//! Messaging Gateway Adapters
//!
//! - **RecordingMessagingGateway** - Records outbound messages in memory

mod recording_messaging_gateway;

pub use recording_messaging_gateway::{RecordingMessagingGateway, SentMessage};
