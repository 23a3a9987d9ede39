//! Core markup parsing primitives
//!
//! Building blocks for the lenient markup reader:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Entities: entity decoding with Cow (zero-copy when possible) and escaping
//! - Attributes: attribute parsing and extraction
//! - Elements: void / raw-text element classification

pub mod attributes;
pub mod elements;
pub mod entities;
pub mod scanner;
