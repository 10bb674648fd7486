//! # Audio Ingest
//!
//! Security-validated acquisition of remote audio payloads.
//!
//! ## Overview
//!
//! This crate owns the network-facing half of the audio disc pipeline:
//! - URL validation with an SSRF guard that runs before any body fetch
//! - Bounded-concurrency streaming downloads with size enforcement,
//!   coalesced progress reporting, and cooperative cancellation
//! - Per-uploader rate limiting (rolling window plus cooldown)
//!
//! Downloaded bytes leave this crate as an opaque [`bytes::Bytes`] buffer;
//! classification and storage happen downstream.

pub mod config;
pub mod download;
pub mod error;
pub mod ratelimit;
pub mod validate;

pub use config::IngestConfig;
pub use download::{DownloadCoordinator, DownloadState};
pub use error::{IngestError, Result};
pub use ratelimit::UploadRateLimiter;
pub use validate::validate_url;
