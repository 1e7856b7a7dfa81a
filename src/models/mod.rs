pub mod auth;
pub mod car;
pub mod fuel;
pub mod health;
pub mod part;
pub mod session;
