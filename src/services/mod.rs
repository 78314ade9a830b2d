pub mod export;
pub mod health;
pub mod import;
pub mod reminder;
