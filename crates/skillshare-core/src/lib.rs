//! Learning-plan engine: plan lifecycle, progress aggregation, template
//! instantiation, personal notes and the follow graph, over pluggable
//! stores.

pub mod error;
pub mod ids;
pub mod notes;
pub mod plan;
pub mod social;
pub mod store;

pub use error::{Entity, Error, Result};
