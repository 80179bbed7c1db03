//! Configuration modules for the call helper layer.
//!
//! This module contains request-level configuration:
//! - [`CallSettings`]: Layered per-call settings with structural merge
//! - [`CallTiming`] / [`RetrySettings`]: Timing strategy and deadline resolution
//! - [`resolve_call_options`]: Merge plus deadline resolution for one call

mod resolver;
mod settings;
mod timing;

pub use resolver::{ResolvedCallOptions, resolve_call_options};
pub use settings::{
    CallCredentials, CallSettings, HeaderMutation, PropagationToken, WriteOptions,
};
pub use timing::{CallTiming, RetrySettings, defaults};
