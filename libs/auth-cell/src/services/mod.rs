pub mod account;
pub mod password;
pub mod users;

pub use account::AccountService;
pub use users::{user_directory, InMemoryUserDirectory, SupabaseUserDirectory, UserDirectory};
