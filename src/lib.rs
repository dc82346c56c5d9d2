//! Boleto Fraud Detection Library
//!
//! Analyzes the OCR text of a Brazilian boleto bancário: extracts the payment
//! fields, checks them against FEBRABAN rules, scores them with an external
//! classifier and explains the fused verdict in plain Portuguese.

pub mod banks;
pub mod config;
pub mod consumer;
pub mod error;
pub mod explainer;
pub mod extractor;
pub mod feature_prep;
pub mod locale;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod types;
pub mod validator;

pub use config::AppConfig;
pub use consumer::JobConsumer;
pub use error::{ContractViolation, PipelineError};
pub use explainer::ExplanationEngine;
pub use extractor::FieldExtractor;
pub use feature_prep::FeaturePrep;
pub use models::{Classifier, ClassifierOutput, InferenceEngine, ScoreFusion};
pub use pipeline::BoletoPipeline;
pub use producer::OutcomeProducer;
pub use types::{AnalysisReport, BoletoJob, ExplanationBundle, ExtractedFields, JobOutcome};
pub use validator::FebrabanValidator;
