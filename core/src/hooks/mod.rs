//! hooks: named extension points.
//!
//! Every pipeline component owns one (or two) `HookRegistry` instances with a
//! fixed set of hook names declared at construction. Plugins register
//! callbacks against those names; the owner invokes them at fixed points.

pub mod types;
pub mod registry;

pub use types::{HookFn, HookMode, InvokeReport};
pub use registry::HookRegistry;
