//! Storage backends for [`tale_core::Repository`].

pub mod memory;
pub mod postgrest;

pub use memory::InMemoryRepository;
pub use postgrest::PostgrestRepository;
