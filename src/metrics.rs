//! Throughput and verdict statistics for the boleto analysis worker.

use crate::types::report::AnalysisReport;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the analysis worker
pub struct PipelineMetrics {
    /// Boletos analyzed to completion
    pub boletos_processed: AtomicU64,
    /// Boletos whose fused verdict was fraudulent
    pub fraud_flagged: AtomicU64,
    /// Jobs that produced a failed outcome
    pub failures: AtomicU64,
    /// Fraud flags per detection method
    flagged_by_method: RwLock<BTreeMap<&'static str, u64>>,
    /// Recommendations per risk tier
    by_risk_tier: RwLock<BTreeMap<&'static str, u64>>,
    /// Pipeline times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud score distribution, 10 buckets of 10 points
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            boletos_processed: AtomicU64::new(0),
            fraud_flagged: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            flagged_by_method: RwLock::new(BTreeMap::new()),
            by_risk_tier: RwLock::new(BTreeMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed analysis
    pub fn record_report(&self, report: &AnalysisReport) {
        self.boletos_processed.fetch_add(1, Ordering::Relaxed);

        let fused = &report.fraude_analise;
        if fused.is_fraudulento {
            self.fraud_flagged.fetch_add(1, Ordering::Relaxed);
            if let Ok(mut by_method) = self.flagged_by_method.write() {
                for metodo in &fused.metodos {
                    *by_method.entry(metodo.as_str()).or_insert(0) += 1;
                }
            }
        }

        if let Ok(mut by_tier) = self.by_risk_tier.write() {
            *by_tier
                .entry(report.explicacao.recomendacao.nivel_risco.as_str())
                .or_insert(0) += 1;
        }

        self.record_processing_time(Duration::from_micros(report.tempo_processamento_us));

        let bucket = (usize::from(fused.score) / 10).min(9);
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a job that could not be analyzed
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_processing_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.5),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (boletos per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.boletos_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get fraud score distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    /// Get fraud flags per detection method
    pub fn get_flagged_by_method(&self) -> BTreeMap<&'static str, u64> {
        self.flagged_by_method
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get recommendations per risk tier
    pub fn get_by_risk_tier(&self) -> BTreeMap<&'static str, u64> {
        self.by_risk_tier
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let processed = self.boletos_processed.load(Ordering::Relaxed);
        let flagged = self.fraud_flagged.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let fraud_rate = if processed > 0 {
            (flagged as f64 / processed as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let score_dist = self.get_score_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          BOLETO FRAUD DETECTOR - METRICS SUMMARY             ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Boletos Analyzed: {:>8}  │  Throughput: {:>6.1} boletos/s ║",
            processed,
            self.get_throughput()
        );
        info!(
            "║ Flagged as Fraud: {:>8}  │  Fraud Rate: {:>6.1}%          ║",
            flagged, fraud_rate
        );
        info!("║ Failed Jobs:      {:>8}                                   ║", failures);
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Pipeline Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}   ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Flagged by Method:                                           ║");
        for (metodo, count) in self.get_flagged_by_method() {
            info!("║   {:20}: {:>6}                                ║", metodo, count);
        }
        info!("║ Risk Tiers:                                                  ║");
        for (tier, count) in self.get_by_risk_tier() {
            info!("║   {:20}: {:>6}                                ║", tier, count);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Score Distribution:                                    ║");
        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:>3}-{:<3}: {:>6} ({:>5.1}%) {}",
                i * 10,
                (i + 1) * 10,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
