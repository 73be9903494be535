//! Hash tree reduction for evidence records
//!
//! This crate reduces the leaf-level digest groups of an archive timestamp
//! to the root its timestamp token protects, locates leaves, checks reduced
//! (partial) trees, and computes the root of a run of archive timestamps.

pub mod error;
pub mod tree;

pub use error::{Error, Result};
pub use tree::{
    chain_root, locate_leaf, reduce_group, reduce_tree, verify_inclusion, LeafPosition,
};
