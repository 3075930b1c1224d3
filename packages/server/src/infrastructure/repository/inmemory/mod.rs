pub mod message_store;
pub mod user_directory;

pub use message_store::InMemoryMessageStore;
pub use user_directory::InMemoryUserDirectory;
