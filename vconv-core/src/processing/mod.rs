// ============================================================================
// vconv-core/src/processing/mod.rs
// ============================================================================
//
// PROCESSING: Job Execution, Verification and Audit
//
// KEY COMPONENTS:
// - layout: Output directory layout and stem sanitizing
// - job: ConversionJob and ExecutionOutcome
// - executor: Temp-file-then-rename conversion
// - verify: Streaming SHA-256 checksums
// - audit: conversion.log and run.log records

pub mod audit;
pub mod executor;
pub mod job;
pub mod layout;
pub mod verify;

pub use audit::AuditLogger;
pub use executor::execute;
pub use job::{ConversionJob, ExecutionOutcome};
pub use layout::{RunLayout, sanitize_stem, unique_stems};
pub use verify::{VerificationResult, sha256_file, verify};
