//! # Audio Content Store
//!
//! Durable storage for user-supplied audio payloads.
//!
//! ## Overview
//!
//! This crate handles the validation and persistence half of the audio disc
//! pipeline:
//! - Magic-byte format classification and allow-list validation
//! - Header-based metadata estimation (duration, bitrate, sample rate)
//! - Durable file storage with a bounded LRU record cache and a
//!   crash-recoverable JSON metadata index
//! - The attachment seam that binds a stored audio id to a world object
//!
//! Downloaded or uploaded bytes enter through [`classify`]/[`validate`],
//! get their metadata estimated by [`estimate`], and are then handed to
//! [`ContentStore::store`]. Playback later retrieves records through
//! [`ContentStore::get`].

pub mod binding;
pub mod config;
pub mod error;
pub mod format;
pub mod metadata;
pub mod model;
pub mod store;
pub mod transcode;

pub use binding::AudioBinding;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use format::{classify, validate, AudioFormat, MAX_AUDIO_BYTES};
pub use metadata::estimate;
pub use model::{AudioId, AudioMetadata, AudioRecord};
pub use store::ContentStore;
pub use transcode::{transcode_if_needed, ExternalTranscoder};
