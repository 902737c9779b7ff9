//! Storage operation handlers.
//!
//! Each submodule adds inherent methods to
//! [`crate::provider::GcStackStorage`], grouped by resource. Every writer
//! funnels through the commit path in [`object`], which evaluates
//! preconditions and assigns the generation under the destination bucket's
//! object lock.

pub mod bucket;
pub mod compose;
pub mod list;
pub mod object;
pub mod rewrite;
pub mod upload;
