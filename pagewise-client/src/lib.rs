//! Call settings and paged enumeration helpers for RPC clients.
//!
//! This crate provides the configuration-and-pagination core of an RPC
//! client helper layer: layered per-call settings with a structural merge,
//! deadline resolution against an injectable clock, and a uniform
//! asynchronous pull-sequence abstraction that normalizes server-chunked
//! listings into caller-sized pages.
//!
//! It deliberately stops short of the wire: issuing the call, acquiring
//! credentials and adapting a concrete transport stream are the job of
//! collaborating crates that consume [`ResolvedCallOptions`] and feed a
//! [`ChunkSource`].
//!
//! ## Call settings
//!
//! [`CallSettings`] bundles the per-call concerns a transport call needs —
//! cancellation, credentials, timing, header mutation, write options and
//! propagation context — with every field independently optional, so
//! client-wide defaults and call-site overrides layer cleanly:
//!
//! ```ignore
//! use pagewise_client::{
//!     CallSettings, CallTiming, RetrySettings, SystemClock, resolve_call_options,
//! };
//!
//! let defaults = CallSettings::from_user_agent("my-app/1.0")
//!     .with_timing(CallTiming::retrying(RetrySettings::default()));
//!
//! let per_call = CallSettings::from_credentials(credentials);
//!
//! let resolved = resolve_call_options(Some(&defaults), Some(&per_call), &SystemClock);
//! transport.issue(request, resolved).await?;
//! ```
//!
//! Merging is pure and order-sensitive: scalar fields take the overlay's
//! value when present, while header mutations compose (base first, overlay
//! second) so an overlay can extend or overwrite the base's headers
//! without losing them.
//!
//! ## Timing and deadlines
//!
//! A call carries one of two timing strategies: a fixed
//! [`CallTiming::Expiration`] deadline, or [`CallTiming::Retry`] with a
//! [`RetrySettings`] policy consumed by a higher retry layer. Either way,
//! resolution produces an absolute deadline from an injected [`Clock`], so
//! deadline math is deterministic under test via [`FixedClock`].
//!
//! ## Paged enumeration
//!
//! A paginated listing arrives as server-sized [`Chunk`]s threaded by a
//! continuation token. [`PagedSequence`] hides those chunk boundaries
//! behind the page size the caller asked for:
//!
//! ```ignore
//! use pagewise_client::PagedSequence;
//!
//! let mut listing = PagedSequence::new(|token| client.list_items(token));
//!
//! let page = listing.read_page(50).await?;   // exactly 50, or fewer at the end
//! for item in &page {
//!     handle(item);
//! }
//! ```
//!
//! The raw chunk-per-response view and a flattened item-by-item view are
//! available through consuming conversions:
//!
//! ```ignore
//! let mut responses = listing.into_responses(); // one Chunk per element
//! // or
//! let mut items = listing.into_items();         // one resource per element
//! while items.advance().await? {
//!     handle(items.current()?);
//! }
//! ```
//!
//! All three views implement [`AsyncPullSequence`] — current element,
//! advance, dispose — so paging logic is written once, independent of any
//! native stream machinery. [`StreamSequence`] adapts an existing
//! [`futures::Stream`] onto the same contract, and
//! [`ItemSequence::into_stream`] bridges back the other way.
//!
//! ## Cancellation
//!
//! Cancellation is cooperative and carried as a
//! [`CancellationToken`] in [`CallSettings`]. Sequences handed the token
//! (via `with_cancellation`) unwind a pending `advance()` promptly with
//! [`CallError::Cancelled`] instead of resolving to an element. Deadlines
//! are *not* enforced inside the pull machinery; they belong to the
//! resolved call options applied when issuing the underlying call.
//!
//! ## Feature Flags
//!
//! | Feature | Description | Dependencies |
//! |---------|-------------|--------------|
//! | `tracing` | Debug spans for chunk fetches and page assembly | `tracing` |

pub mod config;
mod error;
pub mod paging;
pub mod sequence;

pub use error::CallError;

pub use config::{
    CallCredentials, CallSettings, CallTiming, HeaderMutation, PropagationToken,
    ResolvedCallOptions, RetrySettings, WriteOptions, defaults, resolve_call_options,
};
pub use paging::{ChunkSource, ItemSequence, Page, PagedSequence, ResponseSequence};
pub use sequence::{AsyncPullSequence, StreamSequence, into_stream};

// Re-export core types so most consumers need only this crate.
pub use pagewise_core::{Chunk, Clock, Code, FixedClock, PageToken, SystemClock};

// Re-export the cancellation token type carried in settings.
pub use tokio_util::sync::CancellationToken;
