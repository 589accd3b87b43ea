//! Synthetic metrics source.
//!
//! Generates baseline samples with random jitter and, every N samples, a
//! single-field spike, then POSTs them to a running daemon. Useful for
//! exercising the detection loop without a real metrics pipeline.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::info;

use crate::sample::{MetricField, MetricSample};

pub struct SimulatorOptions {
    pub count: usize,
    pub interval: Duration,
    /// Every Nth sample gets one field pushed far outside the baseline.
    /// Zero disables spikes.
    pub spike_every: usize,
}

/// POST one sample to the daemon's ingest endpoint.
pub async fn push_sample(
    client: &reqwest::Client,
    endpoint: &str,
    sample: &MetricSample,
) -> Result<serde_json::Value> {
    let url = format!("{}/api/v1/metrics", endpoint.trim_end_matches('/'));
    let resp = client
        .post(&url)
        .json(sample)
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.context("invalid response body")?;
    if !status.is_success() {
        anyhow::bail!("ingest rejected ({status}): {body}");
    }
    Ok(body)
}

/// A healthy-looking sample: all fields jittered around a steady baseline.
pub fn baseline_sample(rng: &mut impl Rng) -> MetricSample {
    MetricSample {
        timestamp: Utc::now(),
        cpu_usage: rng.gen_range(45.0..55.0),
        memory_usage: rng.gen_range(55.0..65.0),
        response_time_ms: rng.gen_range(180.0..220.0),
        error_rate_pct: rng.gen_range(0.5..1.5),
        requests_per_sec: rng.gen_range(90.0..110.0),
    }
}

fn spike(sample: &mut MetricSample, field: MetricField) {
    match field {
        MetricField::CpuUsage => sample.cpu_usage = 95.0,
        MetricField::MemoryUsage => sample.memory_usage = 92.0,
        MetricField::ResponseTime => sample.response_time_ms = 1200.0,
        MetricField::ErrorRate => sample.error_rate_pct = 8.0,
        MetricField::Throughput => sample.requests_per_sec = 3.0,
    }
}

/// Drive the daemon with synthetic samples.
pub async fn run(endpoint: &str, opts: SimulatorOptions) -> Result<()> {
    let client = reqwest::Client::new();
    // StdRng keeps the future Send; thread_rng cannot be held across awaits.
    let mut rng = StdRng::from_entropy();
    let mut anomalies = 0usize;

    for i in 1..=opts.count {
        let mut sample = baseline_sample(&mut rng);
        let spiked = opts.spike_every > 0 && i % opts.spike_every == 0;
        if spiked {
            let field = MetricField::ALL[rng.gen_range(0..MetricField::ALL.len())];
            spike(&mut sample, field);
            info!(sample = i, %field, "Injecting spike");
        }

        let body = push_sample(&client, endpoint, &sample).await?;
        if body["data"]["verdict"]["is_anomaly"] == true {
            anomalies += 1;
            info!(
                sample = i,
                anomaly_type = %body["data"]["verdict"]["anomaly_type"],
                action = %body["data"]["action"]["action_type"],
                "Daemon flagged anomaly"
            );
        }

        if i < opts.count {
            tokio::time::sleep(opts.interval).await;
        }
    }

    info!(sent = opts.count, anomalies, "Simulation finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_sample_is_valid() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert!(baseline_sample(&mut rng).validate().is_ok());
        }
    }

    #[test]
    fn test_spike_moves_exactly_one_field() {
        let mut rng = rand::thread_rng();
        for field in MetricField::ALL {
            let base = baseline_sample(&mut rng);
            let mut spiked = base.clone();
            spike(&mut spiked, field);
            let changed: Vec<_> = MetricField::ALL
                .iter()
                .filter(|&&f| base.value(f) != spiked.value(f))
                .collect();
            assert_eq!(changed, vec![&field]);
        }
    }
}
