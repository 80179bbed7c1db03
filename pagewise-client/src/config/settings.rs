//! Layered call settings with structural merge.
//!
//! [`CallSettings`] bundles the per-call concerns a transport call needs:
//! cancellation, credentials, timing, header mutation, write options and
//! propagation context. Every field is independently optional, so a value
//! can describe a single concern and be layered over client-wide defaults
//! with [`CallSettings::merge`].
//!
//! # Example
//!
//! ```ignore
//! use pagewise_client::{CallSettings, CallTiming, RetrySettings};
//!
//! let defaults = CallSettings::from_user_agent("my-app/1.0")
//!     .with_timing(CallTiming::retrying(RetrySettings::default()));
//!
//! let per_call = CallSettings::from_cancellation(token);
//!
//! let effective = CallSettings::merge(Some(&defaults), Some(&per_call));
//! ```

use std::sync::Arc;
use std::time::Instant;

use http::{HeaderMap, HeaderValue, header};
use tokio_util::sync::CancellationToken;

use crate::config::CallTiming;

/// An ordered header transformation applied to the outgoing header map.
///
/// Merging two settings values composes their mutations: the base runs
/// first, the overlay second, against the same map.
pub type HeaderMutation = Arc<dyn Fn(&mut HeaderMap) + Send + Sync>;

/// Opaque call credentials: a pre-built `authorization` header value.
///
/// The helper layer never inspects the value; the transport attaches it to
/// the outgoing call.
#[derive(Clone, PartialEq, Eq)]
pub struct CallCredentials {
    authorization: HeaderValue,
}

impl CallCredentials {
    /// Bearer-token credentials.
    ///
    /// # Panics
    ///
    /// Panics if the token is not a valid header value.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: format!("Bearer {token}")
                .parse()
                .expect("invalid bearer token"),
        }
    }

    /// Try to create bearer-token credentials.
    ///
    /// Returns `None` if the token cannot be carried in a header value.
    pub fn try_bearer(token: &str) -> Option<Self> {
        Some(Self {
            authorization: format!("Bearer {token}").parse().ok()?,
        })
    }

    /// Credentials from a pre-parsed `authorization` header value.
    pub fn from_header_value(authorization: HeaderValue) -> Self {
        Self { authorization }
    }

    /// The `authorization` header value to attach.
    pub fn authorization(&self) -> &HeaderValue {
        &self.authorization
    }
}

impl std::fmt::Debug for CallCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never log the secret
        f.write_str("CallCredentials(..)")
    }
}

/// Transport write options. Opaque to this layer; the transport consumes
/// them when sending messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Hint that the message may be buffered before transmission.
    pub buffer_hint: bool,
    /// Disable per-message compression.
    pub no_compression: bool,
}

impl WriteOptions {
    /// Create default write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffering hint.
    pub fn buffer_hint(mut self, buffer_hint: bool) -> Self {
        self.buffer_hint = buffer_hint;
        self
    }

    /// Set whether per-message compression is disabled.
    pub fn no_compression(mut self, no_compression: bool) -> Self {
        self.no_compression = no_compression;
        self
    }
}

/// Context a parent call hands to a child call so timing and cancellation
/// carry across. Opaque to this layer; the transport consumes it when
/// issuing the child call.
#[derive(Clone, Debug, Default)]
pub struct PropagationToken {
    /// Deadline of the parent call, if it had one.
    pub parent_deadline: Option<Instant>,
    /// Whether the child inherits the parent deadline.
    pub propagate_deadline: bool,
    /// Whether the child is cancelled with the parent.
    pub propagate_cancellation: bool,
}

/// Per-call settings with every field independently optional.
///
/// A value with all fields absent is a valid "no override" and is distinct
/// from having no settings at all (`None`); [`CallSettings::merge`] treats
/// both identically.
#[derive(Clone, Default)]
pub struct CallSettings {
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) credentials: Option<CallCredentials>,
    pub(crate) timing: Option<CallTiming>,
    pub(crate) header_mutation: Option<HeaderMutation>,
    pub(crate) write_options: Option<WriteOptions>,
    pub(crate) propagation: Option<PropagationToken>,
}

impl CallSettings {
    /// Settings with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings carrying only a cancellation signal.
    pub fn from_cancellation(cancellation: CancellationToken) -> Self {
        Self::new().with_cancellation(cancellation)
    }

    /// Settings carrying only credentials.
    pub fn from_credentials(credentials: CallCredentials) -> Self {
        Self::new().with_credentials(credentials)
    }

    /// Settings carrying only a timing strategy.
    pub fn from_timing(timing: CallTiming) -> Self {
        Self::new().with_timing(timing)
    }

    /// Settings that pin the `user-agent` header to a fixed value.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid header value.
    pub fn from_user_agent(value: &str) -> Self {
        let value: HeaderValue = value.parse().expect("invalid user-agent value");
        Self::new().with_header_mutation(move |headers| {
            headers.insert(header::USER_AGENT, value.clone());
        })
    }

    /// Set the cancellation signal.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Set the credentials.
    pub fn with_credentials(mut self, credentials: CallCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the timing strategy.
    pub fn with_timing(mut self, timing: CallTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Set the header mutation, replacing any mutation already on this
    /// value. Mutations on *different* values compose through
    /// [`merge`](CallSettings::merge).
    pub fn with_header_mutation<F>(mut self, mutation: F) -> Self
    where
        F: Fn(&mut HeaderMap) + Send + Sync + 'static,
    {
        self.header_mutation = Some(Arc::new(mutation));
        self
    }

    /// Set the transport write options.
    pub fn with_write_options(mut self, write_options: WriteOptions) -> Self {
        self.write_options = Some(write_options);
        self
    }

    /// Set the propagation context.
    pub fn with_propagation(mut self, propagation: PropagationToken) -> Self {
        self.propagation = Some(propagation);
        self
    }

    /// Get the cancellation signal, if set.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Get the credentials, if set.
    pub fn credentials(&self) -> Option<&CallCredentials> {
        self.credentials.as_ref()
    }

    /// Get the timing strategy, if set.
    pub fn timing(&self) -> Option<&CallTiming> {
        self.timing.as_ref()
    }

    /// Get the header mutation, if set.
    pub fn header_mutation(&self) -> Option<&HeaderMutation> {
        self.header_mutation.as_ref()
    }

    /// Get the transport write options, if set.
    pub fn write_options(&self) -> Option<&WriteOptions> {
        self.write_options.as_ref()
    }

    /// Get the propagation context, if set.
    pub fn propagation(&self) -> Option<&PropagationToken> {
        self.propagation.as_ref()
    }

    /// Merge a base settings value with an overlay.
    ///
    /// - Both absent: the result is absent.
    /// - Exactly one absent: the result is the other, unchanged.
    /// - Otherwise each field takes the overlay's value when present and
    ///   the base's when not. Header mutations are the exception: both are
    ///   kept and composed, the base's running first and the overlay's
    ///   second on the same header map, so an overlay can add to or
    ///   overwrite headers set by the base without losing them.
    pub fn merge(
        original: Option<&CallSettings>,
        overlaid: Option<&CallSettings>,
    ) -> Option<CallSettings> {
        match (original, overlaid) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (Some(base), Some(overlay)) => {
                let header_mutation = match (&base.header_mutation, &overlay.header_mutation) {
                    (Some(first), Some(second)) => {
                        let first = Arc::clone(first);
                        let second = Arc::clone(second);
                        Some(Arc::new(move |headers: &mut HeaderMap| {
                            first(headers);
                            second(headers);
                        }) as HeaderMutation)
                    }
                    (Some(only), None) | (None, Some(only)) => Some(Arc::clone(only)),
                    (None, None) => None,
                };
                Some(CallSettings {
                    cancellation: overlay
                        .cancellation
                        .clone()
                        .or_else(|| base.cancellation.clone()),
                    credentials: overlay
                        .credentials
                        .clone()
                        .or_else(|| base.credentials.clone()),
                    timing: overlay.timing.clone().or_else(|| base.timing.clone()),
                    header_mutation,
                    write_options: overlay.write_options.or(base.write_options),
                    propagation: overlay
                        .propagation
                        .clone()
                        .or_else(|| base.propagation.clone()),
                })
            }
        }
    }
}

impl std::fmt::Debug for CallSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSettings")
            .field("cancellation", &self.cancellation.is_some())
            .field("credentials", &self.credentials)
            .field("timing", &self.timing)
            .field("header_mutation", &self.header_mutation.is_some())
            .field("write_options", &self.write_options)
            .field("propagation", &self.propagation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn apply(settings: &CallSettings) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(mutation) = settings.header_mutation() {
            mutation(&mut headers);
        }
        headers
    }

    #[test]
    fn test_merge_both_absent() {
        assert!(CallSettings::merge(None, None).is_none());
    }

    #[test]
    fn test_merge_one_absent() {
        let settings = CallSettings::new().with_write_options(WriteOptions::new().buffer_hint(true));

        let merged = CallSettings::merge(Some(&settings), None).unwrap();
        assert_eq!(merged.write_options(), settings.write_options());

        let merged = CallSettings::merge(None, Some(&settings)).unwrap();
        assert_eq!(merged.write_options(), settings.write_options());
    }

    #[test]
    fn test_merge_empty_settings_is_not_absent() {
        // An all-absent value merged over a base leaves the base intact.
        let base = CallSettings::from_credentials(CallCredentials::bearer("abc"));
        let merged = CallSettings::merge(Some(&base), Some(&CallSettings::new())).unwrap();
        assert_eq!(merged.credentials(), base.credentials());
    }

    #[test]
    fn test_merge_overlay_precedence() {
        let base = CallSettings::new()
            .with_credentials(CallCredentials::bearer("base"))
            .with_timing(CallTiming::retrying(crate::RetrySettings::default()))
            .with_write_options(WriteOptions::new().buffer_hint(true));
        let overlay = CallSettings::new().with_credentials(CallCredentials::bearer("overlay"));

        let merged = CallSettings::merge(Some(&base), Some(&overlay)).unwrap();

        // overlay wins where present
        assert_eq!(
            merged.credentials(),
            Some(&CallCredentials::bearer("overlay"))
        );
        // base fills the rest
        assert_eq!(merged.timing(), base.timing());
        assert_eq!(merged.write_options(), base.write_options());
    }

    #[test]
    fn test_merge_composes_header_mutations_in_order() {
        let base = CallSettings::new().with_header_mutation(|headers: &mut HeaderMap| {
            headers.insert("k", "a".parse().unwrap());
        });
        let overlay = CallSettings::new().with_header_mutation(|headers: &mut HeaderMap| {
            headers.insert("k", "b".parse().unwrap());
        });

        let merged = CallSettings::merge(Some(&base), Some(&overlay)).unwrap();
        assert_eq!(apply(&merged).get("k").unwrap(), "b");

        // reversed layering reverses the outcome
        let merged = CallSettings::merge(Some(&overlay), Some(&base)).unwrap();
        assert_eq!(apply(&merged).get("k").unwrap(), "a");
    }

    #[test]
    fn test_merge_keeps_single_header_mutation() {
        let base = CallSettings::from_user_agent("agent/1.0");
        let merged = CallSettings::merge(Some(&base), Some(&CallSettings::new())).unwrap();
        assert_eq!(apply(&merged).get(header::USER_AGENT).unwrap(), "agent/1.0");

        let merged = CallSettings::merge(Some(&CallSettings::new()), Some(&base)).unwrap();
        assert_eq!(apply(&merged).get(header::USER_AGENT).unwrap(), "agent/1.0");
    }

    #[test]
    fn test_merge_cancellation_overlay_wins() {
        let base_token = CancellationToken::new();
        let overlay_token = CancellationToken::new();
        let base = CallSettings::from_cancellation(base_token);
        let overlay = CallSettings::from_cancellation(overlay_token.clone());

        let merged = CallSettings::merge(Some(&base), Some(&overlay)).unwrap();
        overlay_token.cancel();
        assert!(merged.cancellation().unwrap().is_cancelled());
    }

    #[test]
    fn test_from_user_agent() {
        let settings = CallSettings::from_user_agent("pagewise-test/0.1");
        assert_eq!(
            apply(&settings).get(header::USER_AGENT).unwrap(),
            "pagewise-test/0.1"
        );
        assert!(settings.timing().is_none());
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_call_credentials_bearer() {
        let credentials = CallCredentials::bearer("token123");
        assert_eq!(credentials.authorization(), "Bearer token123");
    }

    #[test]
    fn test_call_credentials_try_bearer_invalid() {
        assert!(CallCredentials::try_bearer("bad\ntoken").is_none());
    }

    #[test]
    fn test_call_credentials_debug_redacts() {
        let credentials = CallCredentials::bearer("secret");
        assert_eq!(format!("{credentials:?}"), "CallCredentials(..)");
    }

    #[test]
    fn test_write_options_builder() {
        let options = WriteOptions::new().buffer_hint(true).no_compression(true);
        assert!(options.buffer_hint);
        assert!(options.no_compression);
    }

    #[test]
    fn test_propagation_token_default() {
        let token = PropagationToken::default();
        assert!(token.parent_deadline.is_none());
        assert!(!token.propagate_deadline);
        assert!(!token.propagate_cancellation);
    }

    #[test]
    fn test_from_timing() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let settings = CallSettings::from_timing(CallTiming::expiring_at(deadline));
        assert_eq!(settings.timing(), Some(&CallTiming::expiring_at(deadline)));
    }
}
