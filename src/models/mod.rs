// Re-export all models from their respective modules
pub mod account;
pub mod auth;
pub mod cache;
pub mod media;
pub mod user;
pub mod views;

// Re-export commonly used models
pub use account::*;
pub use auth::*;
pub use cache::*;
pub use media::*;
pub use user::*;
pub use views::*;
