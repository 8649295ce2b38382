//! Storage Adapters
//!
//! Implementations of the persistence ports.
//!
//! ## Available Adapters
//!
//! - **FileConversationRepository** - Stores conversations as YAML files on disk
//! - **InMemoryConversationRepository** - Stores conversations in memory (testing/development)
//! - **FileAttentionFlagRepository** - Stores attention flags in one YAML file
//! - **InMemoryAttentionFlagRepository** - Stores attention flags in memory
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileConversationRepository, InMemoryConversationRepository};
//!
//! // Production: file-based storage
//! let repo = FileConversationRepository::new("./data/conversations");
//!
//! // Testing: in-memory storage
//! let repo = InMemoryConversationRepository::new();
//! ```

mod file_conversation_repository;
mod file_flag_repository;
mod in_memory_conversation_repository;
mod in_memory_flag_repository;

pub use file_conversation_repository::FileConversationRepository;
pub use file_flag_repository::FileAttentionFlagRepository;
pub use in_memory_conversation_repository::InMemoryConversationRepository;
pub use in_memory_flag_repository::InMemoryAttentionFlagRepository;
