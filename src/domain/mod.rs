// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that define the core
// concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Labelled utterances and the four dataset splits
pub mod utterance;

// One decoded regression-tracking row
pub mod record;

// What a build recorded for later decode passes
pub mod metadata;

// Typed errors raised by the encode/decode core
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
