//! Per-call option resolution.
//!
//! [`resolve_call_options`] merges base and per-call settings and resolves
//! them, against a clock, into the concrete values a transport call
//! consumes: an absolute deadline, a populated header map, and the
//! pass-through fields.

use std::time::Instant;

use http::HeaderMap;
use tokio_util::sync::CancellationToken;

use pagewise_core::Clock;

use crate::config::{CallCredentials, CallSettings, PropagationToken, WriteOptions};

/// Concrete per-call values handed to the transport layer.
///
/// Computed fresh for each call and discarded after use.
#[derive(Clone, Debug, Default)]
pub struct ResolvedCallOptions {
    /// Absolute point in time after which the call is abandoned. Absent
    /// when no timing strategy was configured.
    pub deadline: Option<Instant>,
    /// Fully populated outgoing headers.
    pub headers: HeaderMap,
    /// Cancellation signal for the call.
    pub cancellation: Option<CancellationToken>,
    /// Credentials to attach.
    pub credentials: Option<CallCredentials>,
    /// Transport write options.
    pub write_options: Option<WriteOptions>,
    /// Parent-call propagation context.
    pub propagation: Option<PropagationToken>,
}

/// Merge `base` and `per_call` settings and resolve the result for one call.
///
/// Per-call settings take precedence field by field; header mutations
/// compose, base first, per the [`CallSettings::merge`] contract. The
/// composed mutation runs exactly once, against the empty header map
/// returned in [`ResolvedCallOptions::headers`] — the only side effect in
/// this layer. A panicking mutation propagates to the caller uncaught.
///
/// With no settings on either side, the resolved options are all-default:
/// no deadline, no headers, no credentials.
pub fn resolve_call_options(
    base: Option<&CallSettings>,
    per_call: Option<&CallSettings>,
    clock: &impl Clock,
) -> ResolvedCallOptions {
    let Some(effective) = CallSettings::merge(base, per_call) else {
        return ResolvedCallOptions::default();
    };

    let mut headers = HeaderMap::new();
    if let Some(mutation) = effective.header_mutation.as_ref() {
        mutation(&mut headers);
    }

    let deadline = effective
        .timing
        .as_ref()
        .map(|timing| timing.deadline(clock));

    ResolvedCallOptions {
        deadline,
        headers,
        cancellation: effective.cancellation,
        credentials: effective.credentials,
        write_options: effective.write_options,
        propagation: effective.propagation,
    }
}
