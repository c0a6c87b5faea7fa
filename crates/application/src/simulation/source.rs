//! Telemetry sources
//!
//! A source produces the full dataset for one job in memory. The sample
//! source stands in for the vehicle simulator until a real scenario runner
//! is wired in.

use async_trait::async_trait;
use axle_core::{DomainError, JobId, TelemetryFrame, TelemetrySample};

#[async_trait]
pub trait TelemetrySource: Send + Sync + std::fmt::Debug {
    async fn generate(&self, job_id: &JobId) -> Result<TelemetryFrame, DomainError>;
}

/// Fixed four-row ramp: speed 0 to 15, rpm 800 to 1800, throttle 0 to 0.6
#[derive(Debug, Clone, Default)]
pub struct SampleTelemetrySource;

impl SampleTelemetrySource {
    pub fn new() -> Self {
        Self
    }

    pub fn samples() -> Vec<TelemetrySample> {
        [
            (1.0, 0, 800, 0.0),
            (1.1, 5, 1200, 0.2),
            (1.2, 10, 1500, 0.4),
            (1.3, 15, 1800, 0.6),
        ]
        .into_iter()
        .map(|(timestamp, speed, rpm, throttle)| TelemetrySample {
            timestamp,
            speed,
            rpm,
            throttle,
        })
        .collect()
    }
}

#[async_trait]
impl TelemetrySource for SampleTelemetrySource {
    async fn generate(&self, _job_id: &JobId) -> Result<TelemetryFrame, DomainError> {
        Ok(TelemetryFrame::new(Self::samples()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_source_rows() {
        let frame = SampleTelemetrySource::new()
            .generate(&JobId::new())
            .await
            .unwrap();

        assert_eq!(frame.len(), 4);
        assert_eq!(frame.timestamps().collect::<Vec<_>>(), vec![1.0, 1.1, 1.2, 1.3]);
        assert_eq!(
            frame.samples.iter().map(|s| s.rpm).collect::<Vec<_>>(),
            vec![800, 1200, 1500, 1800]
        );
        assert_eq!(frame.samples[3].speed, 15);
        assert_eq!(frame.samples[2].throttle, 0.4);
    }
}
