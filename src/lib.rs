pub mod config;
pub mod conversations;
pub mod error;
pub mod messages;
pub mod models;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod server;
pub mod store;
