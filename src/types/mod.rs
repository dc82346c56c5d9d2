//! Type definitions for the boleto fraud detection pipeline

pub mod boleto;
pub mod explanation;
pub mod report;
pub mod verdict;

pub use boleto::{BoletoJob, ExtractedFields};
pub use explanation::{ExplanationBundle, Reason, Recommendation, Severity};
pub use report::{AnalysisReport, JobOutcome};
pub use verdict::{ClassifierVerdict, DetectionMethod, FieldCheck, FusedVerdict, ValidationResult};
