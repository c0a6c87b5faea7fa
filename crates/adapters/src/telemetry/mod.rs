//! Telemetry repositories

pub mod memory;
pub mod postgres;

pub use memory::InMemoryTelemetryRepository;
pub use postgres::PostgreSqlTelemetryRepository;
