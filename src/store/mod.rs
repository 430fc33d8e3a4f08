//! Paths & Store (spec.md §4.1): resolves on-disk locations from a single
//! data root, and provides atomic-replace / append-only primitives every
//! other store builds on.

pub mod fs;
pub mod lock;
pub mod paths;

pub use paths::Paths;
