//! Dataset encoders

pub mod parquet_encoder;

pub use parquet_encoder::ParquetEncoder;
