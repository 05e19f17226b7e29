pub mod directory;
pub mod provider;
pub mod slots;

pub use directory::{provider_directory, InMemoryProviderDirectory, ProviderDirectory, SupabaseProviderDirectory};
pub use provider::ProviderService;
pub use slots::generate_slots;
