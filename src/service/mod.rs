pub mod auth;
pub mod car;
pub mod fuel;
pub mod fuel_stats;
pub mod insurance;
pub mod media;
pub mod part;
pub mod session;
