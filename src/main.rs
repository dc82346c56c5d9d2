//! Boleto Fraud Detector - Worker Entry Point
//!
//! Consumes OCR analysis jobs from NATS, runs the boleto analysis pipeline
//! and publishes one outcome per job. Jobs are processed in parallel, bounded
//! by the configured number of workers.

use anyhow::{Context, Result};
use boleto_fraud_detector::{
    config::AppConfig,
    consumer::{decode_job, JobConsumer},
    logging::init_tracing,
    metrics::{MetricsReporter, PipelineMetrics},
    models::{Classifier, ModelLoader},
    pipeline::BoletoPipeline,
    producer::OutcomeProducer,
    types::{BoletoJob, JobOutcome},
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    info!("Starting Boleto Fraud Detector");
    info!(
        max_past_years = config.policy.max_past_years,
        max_future_years = config.policy.max_future_years,
        max_valor = config.policy.max_valor,
        elevated_value_threshold = config.policy.elevated_value_threshold,
        "Validation policy loaded"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Load the classifier once; every task shares it
    let loader = ModelLoader::with_threads(config.models.onnx_threads)?;
    let classifier: Arc<dyn Classifier> = Arc::new(
        loader.load_classifier(&config.models.model_path, &config.models.model_name)?,
    );
    let pipeline = Arc::new(BoletoPipeline::new(classifier, config.policy.clone()));
    info!(model = %pipeline.model_name(), "Analysis pipeline initialized");

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = JobConsumer::new(client.clone(), &config.nats.job_subject);
    let producer = Arc::new(OutcomeProducer::new(client.clone(), &config.nats.result_subject));

    let num_workers = config.pipeline.workers.max(1);
    let max_text_bytes = config.pipeline.max_text_bytes;
    info!(
        workers = num_workers,
        jobs = %consumer.subject(),
        results = %producer.subject(),
        "Starting job processing loop"
    );

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let pipeline = pipeline.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let job = match decode_job(&message.payload) {
                Ok(job) => job,
                Err(e) => {
                    warn!(error = %format!("{:#}", e), "Dropping undecodable job");
                    metrics.record_failure();
                    drop(permit);
                    return;
                }
            };

            let outcome = process_job(&pipeline, job, max_text_bytes);

            match &outcome {
                JobOutcome::Completed { analise_id, relatorio } => {
                    metrics.record_report(relatorio);
                    info!(
                        analise_id = %analise_id,
                        is_fraudulento = relatorio.fraude_analise.is_fraudulento,
                        nivel_risco = %relatorio.explicacao.recomendacao.nivel_risco,
                        processing_time_us = relatorio.tempo_processamento_us,
                        "Analysis completed"
                    );
                }
                JobOutcome::Failed { analise_id, erro } => {
                    metrics.record_failure();
                    error!(analise_id = %analise_id, error = %erro, "Analysis failed");
                }
            }

            if let Err(e) = producer.publish(&outcome).await {
                error!(
                    analise_id = %outcome.analise_id(),
                    error = %e,
                    "Failed to publish job outcome"
                );
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let processing_stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} boletos/s", metrics.get_throughput()),
                    avg_latency_us = processing_stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Worker shutting down...");
    metrics.print_summary();

    Ok(())
}

/// Run one job through the pipeline, turning every failure into a failed outcome.
fn process_job(pipeline: &BoletoPipeline, job: BoletoJob, max_text_bytes: usize) -> JobOutcome {
    let BoletoJob {
        analise_id,
        texto_ocr,
    } = job;

    if texto_ocr.len() > max_text_bytes {
        return JobOutcome::Failed {
            analise_id,
            erro: format!(
                "Texto OCR excede o limite de {} bytes (tem {})",
                max_text_bytes,
                texto_ocr.len()
            ),
        };
    }

    match pipeline.analyze(&texto_ocr) {
        Ok(relatorio) => JobOutcome::Completed {
            analise_id,
            relatorio: Box::new(relatorio),
        },
        Err(e) => JobOutcome::Failed {
            analise_id,
            erro: e.to_string(),
        },
    }
}
