//! Parquet dataset encoder
//!
//! Column layout: `timestamp` (f64), `speed` (i64), `rpm` (i64),
//! `throttle` (f64), one row per sample, snappy compressed.

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use axle_core::{ArtifactFormat, TelemetryFrame};
use axle_ports::{DatasetEncoder, EncodeError};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ParquetEncoder {
    schema: SchemaRef,
}

impl ParquetEncoder {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(Self::telemetry_schema()),
        }
    }

    pub fn telemetry_schema() -> Schema {
        Schema::new(vec![
            Field::new("timestamp", DataType::Float64, false),
            Field::new("speed", DataType::Int64, false),
            Field::new("rpm", DataType::Int64, false),
            Field::new("throttle", DataType::Float64, false),
        ])
    }

    fn record_batch(&self, frame: &TelemetryFrame) -> Result<RecordBatch, EncodeError> {
        let samples = &frame.samples;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from_iter_values(
                samples.iter().map(|s| s.timestamp),
            )),
            Arc::new(Int64Array::from_iter_values(samples.iter().map(|s| s.speed))),
            Arc::new(Int64Array::from_iter_values(samples.iter().map(|s| s.rpm))),
            Arc::new(Float64Array::from_iter_values(
                samples.iter().map(|s| s.throttle),
            )),
        ];

        RecordBatch::try_new(self.schema.clone(), columns)
            .map_err(|e| EncodeError::Encoding(format!("Failed to build record batch: {}", e)))
    }
}

impl Default for ParquetEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetEncoder for ParquetEncoder {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Parquet
    }

    fn encode(&self, frame: &TelemetryFrame) -> Result<Vec<u8>, EncodeError> {
        if frame.is_empty() {
            return Err(EncodeError::Empty);
        }

        let batch = self.record_batch(frame)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, self.schema.clone(), Some(props))
            .map_err(|e| EncodeError::Encoding(format!("Failed to open parquet writer: {}", e)))?;
        writer
            .write(&batch)
            .map_err(|e| EncodeError::Encoding(format!("Failed to write parquet rows: {}", e)))?;
        writer
            .close()
            .map_err(|e| EncodeError::Encoding(format!("Failed to finish parquet file: {}", e)))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axle_core::TelemetrySample;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn frame() -> TelemetryFrame {
        TelemetryFrame::new(vec![
            TelemetrySample {
                timestamp: 1.0,
                speed: 0,
                rpm: 800,
                throttle: 0.0,
            },
            TelemetrySample {
                timestamp: 1.1,
                speed: 5,
                rpm: 1200,
                throttle: 0.2,
            },
        ])
    }

    #[test]
    fn test_encoded_dataset_reads_back() {
        let encoder = ParquetEncoder::new();
        let bytes = encoder.encode(&frame()).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");

        let reader = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(bytes))
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 1);

        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).name(), "speed");

        let rpm = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(rpm.values().to_vec(), vec![800, 1200]);

        let throttle = batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(throttle.value(1), 0.2);
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let encoder = ParquetEncoder::default();
        assert_eq!(
            encoder.encode(&TelemetryFrame::new(vec![])),
            Err(EncodeError::Empty)
        );
        assert_eq!(encoder.format(), ArtifactFormat::Parquet);
    }
}
