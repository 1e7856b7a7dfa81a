pub mod auth;
pub mod car;
pub mod error;
pub mod fuel;
pub mod health;
pub mod part;
