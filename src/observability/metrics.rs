//! Thread-safe pipeline metrics
//!
//! Atomic counters for the high-frequency events and a mutex-protected window
//! of recent transform durations for percentile reporting.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of transform durations kept for percentile calculation
const TRANSFORM_TIME_WINDOW: usize = 1000;

/// Counters shared by the dispatch loop, transform tasks and consumers
#[derive(Debug)]
pub struct PipelineMetrics {
    // Intake
    items_submitted: AtomicU64,
    items_dispatched: AtomicU64,
    waste_emitted: AtomicU64,

    // Transform tasks
    transforms_started: AtomicU64,
    transforms_completed: AtomicU64,
    transforms_failed: AtomicU64,
    transforms_in_flight: AtomicU64,
    max_in_flight: AtomicU64,

    // Delivery
    outputs_delivered: AtomicU64,
    waste_delivered: AtomicU64,

    // Hot swaps
    classifier_swaps: AtomicU64,
    transformer_swaps: AtomicU64,

    transform_times: Mutex<VecDeque<u64>>, // in microseconds
    started_at: u64,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            items_submitted: AtomicU64::new(0),
            items_dispatched: AtomicU64::new(0),
            waste_emitted: AtomicU64::new(0),
            transforms_started: AtomicU64::new(0),
            transforms_completed: AtomicU64::new(0),
            transforms_failed: AtomicU64::new(0),
            transforms_in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
            outputs_delivered: AtomicU64::new(0),
            waste_delivered: AtomicU64::new(0),
            classifier_swaps: AtomicU64::new(0),
            transformer_swaps: AtomicU64::new(0),
            transform_times: Mutex::new(VecDeque::with_capacity(TRANSFORM_TIME_WINDOW)),
            started_at: current_timestamp(),
        }
    }

    pub fn item_submitted(&self) {
        self.items_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_dispatched(&self) {
        self.items_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn waste_emitted(&self) {
        self.waste_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transform_started(&self) {
        self.transforms_started.fetch_add(1, Ordering::Relaxed);
        let in_flight = self.transforms_in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::Relaxed);
    }

    pub fn transform_completed(&self, duration: Duration) {
        self.transforms_completed.fetch_add(1, Ordering::Relaxed);
        self.transforms_in_flight.fetch_sub(1, Ordering::Relaxed);
        self.record_transform_time(duration);
    }

    pub fn transform_failed(&self, duration: Duration) {
        self.transforms_failed.fetch_add(1, Ordering::Relaxed);
        self.transforms_in_flight.fetch_sub(1, Ordering::Relaxed);
        self.record_transform_time(duration);
    }

    pub fn output_delivered(&self) {
        self.outputs_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn waste_delivered(&self) {
        self.waste_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn classifier_swapped(&self) {
        self.classifier_swaps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transformer_swapped(&self) {
        self.transformer_swaps.fetch_add(1, Ordering::Relaxed);
    }

    fn record_transform_time(&self, duration: Duration) {
        if let Ok(mut times) = self.transform_times.lock() {
            if times.len() == TRANSFORM_TIME_WINDOW {
                times.pop_front();
            }
            times.push_back(duration.as_micros() as u64);
        }
    }

    /// Compute (avg, p50, p95, p99) over the recent transform window
    fn transform_time_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.transform_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted: Vec<u64> = times.iter().copied().collect();
        sorted.sort_unstable();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        (
            avg,
            percentile(&sorted, 50.0),
            percentile(&sorted, 95.0),
            percentile(&sorted, 99.0),
        )
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg, p50, p95, p99) = self.transform_time_statistics();
        let now = current_timestamp();

        MetricsSnapshot {
            timestamp: now,
            uptime_seconds: now.saturating_sub(self.started_at),
            intake: IntakeMetrics {
                items_submitted: self.items_submitted.load(Ordering::Relaxed),
                items_dispatched: self.items_dispatched.load(Ordering::Relaxed),
                waste_emitted: self.waste_emitted.load(Ordering::Relaxed),
            },
            transforms: TransformMetrics {
                started: self.transforms_started.load(Ordering::Relaxed),
                completed: self.transforms_completed.load(Ordering::Relaxed),
                failed: self.transforms_failed.load(Ordering::Relaxed),
                in_flight: self.transforms_in_flight.load(Ordering::Relaxed),
                max_in_flight: self.max_in_flight.load(Ordering::Relaxed),
                avg_time_us: avg,
                time_p50_us: p50,
                time_p95_us: p95,
                time_p99_us: p99,
            },
            delivery: DeliveryMetrics {
                outputs_delivered: self.outputs_delivered.load(Ordering::Relaxed),
                waste_delivered: self.waste_delivered.load(Ordering::Relaxed),
            },
            swaps: SwapMetrics {
                classifier: self.classifier_swaps.load(Ordering::Relaxed),
                transformer: self.transformer_swaps.load(Ordering::Relaxed),
            },
        }
    }
}

/// Point-in-time copy of all pipeline metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: u64,
    pub uptime_seconds: u64,
    pub intake: IntakeMetrics,
    pub transforms: TransformMetrics,
    pub delivery: DeliveryMetrics,
    pub swaps: SwapMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntakeMetrics {
    pub items_submitted: u64,
    pub items_dispatched: u64,
    pub waste_emitted: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformMetrics {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub in_flight: u64,
    pub max_in_flight: u64,
    pub avg_time_us: f64,
    pub time_p50_us: f64,
    pub time_p95_us: f64,
    pub time_p99_us: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryMetrics {
    pub outputs_delivered: u64,
    pub waste_delivered: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapMetrics {
    pub classifier: u64,
    pub transformer: u64,
}

fn percentile(sorted: &[u64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)] as f64
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_snapshot_is_zeroed() {
        let metrics = PipelineMetrics::new();
        let snapshot = metrics.snapshot();

        assert_eq!(snapshot.intake.items_submitted, 0);
        assert_eq!(snapshot.transforms.started, 0);
        assert_eq!(snapshot.transforms.avg_time_us, 0.0);
        assert_eq!(snapshot.delivery.outputs_delivered, 0);
    }

    #[test]
    fn test_in_flight_tracking() {
        let metrics = PipelineMetrics::new();
        metrics.transform_started();
        metrics.transform_started();
        metrics.transform_started();
        metrics.transform_completed(Duration::from_micros(10));
        metrics.transform_failed(Duration::from_micros(30));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.transforms.started, 3);
        assert_eq!(snapshot.transforms.completed, 1);
        assert_eq!(snapshot.transforms.failed, 1);
        assert_eq!(snapshot.transforms.in_flight, 1);
        assert_eq!(snapshot.transforms.max_in_flight, 3);
        assert_eq!(snapshot.transforms.avg_time_us, 20.0);
    }

    #[test]
    fn test_transform_window_is_bounded() {
        let metrics = PipelineMetrics::new();
        for i in 0..(TRANSFORM_TIME_WINDOW as u64 + 500) {
            metrics.transform_started();
            metrics.transform_completed(Duration::from_micros(i));
        }

        let times = metrics.transform_times.lock().unwrap();
        assert_eq!(times.len(), TRANSFORM_TIME_WINDOW);
        assert_eq!(times.front().copied(), Some(500));
    }

    #[test]
    fn test_percentile() {
        let data: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile(&data, 50.0), 51.0);
        assert_eq!(percentile(&data, 99.0), 99.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[7], 95.0), 7.0);
    }

    #[test]
    fn test_swap_counters() {
        let metrics = PipelineMetrics::new();
        metrics.classifier_swapped();
        metrics.transformer_swapped();
        metrics.transformer_swapped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.swaps.classifier, 1);
        assert_eq!(snapshot.swaps.transformer, 2);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let metrics = PipelineMetrics::new();
        metrics.item_submitted();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["intake"]["items_submitted"], 1);
        assert!(json["transforms"]["time_p95_us"].is_number());
    }
}
