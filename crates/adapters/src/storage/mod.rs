//! Object store adapters

pub mod memory;
pub mod s3;

pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;
