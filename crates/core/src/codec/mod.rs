//! Value codecs between flat caller values and document nodes.
//!
//! Each codec is a set of free functions over the node it targets. None of them depends on
//! another, and none of them fails on decode.

pub mod coded;
pub mod partial;
pub mod quantity;
