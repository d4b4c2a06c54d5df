//! Radarr decision module
//!
//! This crate handles decision-making logic for release selection and
//! quality profiles. The teacher's movie-only `DecisionEngine`/scorer
//! had no counterpart left to serve once the acquisition pipeline's own
//! selection logic (`parsed_media` + `selector`, operating on the opaque
//! `qualityID`/`IsAcceptable`/`IsUpgrade` primitives per the spec) took
//! over release selection, so it was trimmed; `custom_formats` is kept
//! for the custom-format matcher it still provides.

pub mod custom_formats;
pub mod parsed_media;
pub mod quality;
pub mod selector;

// Re-export main types
pub use custom_formats::{CustomFormat, CustomFormatEngine, FormatSpecification, ReleaseData};
pub use parsed_media::ParsedMedia;
pub use quality::{Quality, QualityDefinition, QualityProfile, Source};
pub use selector::{select_best_release, RejectionReason};
