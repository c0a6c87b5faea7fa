//! Execution runtime adapters

pub mod docker;

pub use docker::DockerRuntime;
