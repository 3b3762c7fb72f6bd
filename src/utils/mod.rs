//! Utility modules for the asset pipeline.

pub mod fmt;
pub mod mime;
pub mod path;
