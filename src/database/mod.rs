pub mod car;
pub mod credential;
pub mod fuel;
pub mod part;
pub mod postgres_repository;
