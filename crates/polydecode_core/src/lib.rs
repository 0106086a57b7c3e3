//! Public library API for decoding generic value trees into shaped destinations.

/// Shape-driven decoding, coercion rules, and polymorphic factory resolution.
pub mod decode;
