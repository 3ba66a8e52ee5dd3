//! refpeak-core: Core types for specular peak localization.
//!
//! This crate provides the foundational data model for reducing
//! neutron-reflectometry detector images: the detector image and its
//! projections, pixel ranges, region-of-interest hints and overrides,
//! run metadata, and the classification contract consumed by the
//! reflectivity computation.
//!

pub mod classification;
pub mod error;
pub mod image;
pub mod metadata;
pub mod range;
pub mod roi;

pub use classification::{ClassificationResult, DataType};
pub use error::{Error, Result};
pub use image::DetectorImage;
pub use metadata::RunMetadata;
pub use range::PixelRange;
pub use roi::{ReconciledRanges, RoiConfig, RoiHint};
