// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one command (build, evaluate, regress, summarize).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Loading, registry and consistency shared by every command
pub mod datasets;

// The full build: encode, train, evaluate, regress
pub mod build_use_case;

// Re-evaluation and regression against a finished build
pub mod evaluate_use_case;
