pub mod configuration;
pub mod domain;
pub mod registry;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
mod utils;
