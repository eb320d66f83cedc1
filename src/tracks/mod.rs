//! Track inspection: frame counts from skeletal track files and long/short classification.

/// Canonical humanoid bone names.
pub mod bones;
/// Track file parsing and dataset inspection.
pub mod inspect;
