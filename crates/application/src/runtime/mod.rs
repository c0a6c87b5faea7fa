//! Execution runtimes implemented inside the application layer

pub mod in_process;

pub use in_process::InProcessRuntime;
