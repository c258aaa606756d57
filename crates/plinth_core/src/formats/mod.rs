//! Format-specific decoders.
//!
//! Each submodule owns one decode path and converges on
//! [`crate::builder::SourceScene`] so everything downstream is
//! format-agnostic.

pub mod gltf;
pub mod obj;
pub mod usd;
