//! Minimal asynchronous pull-sequence contract.
//!
//! [`AsyncPullSequence`] is the async-iteration surface the paging layer is
//! written against: a current element, an advance operation and a disposal
//! hook. It deliberately does not depend on any concrete stream type, so
//! the same downstream logic runs over a native [`futures::Stream`] (via
//! [`StreamSequence`]) or over a hand-driven source such as
//! [`ResponseSequence`](crate::paging::ResponseSequence).
//!
//! # Example
//!
//! ```ignore
//! use pagewise_client::{AsyncPullSequence, StreamSequence};
//!
//! let mut sequence = StreamSequence::new(byte_stream);
//! while sequence.advance().await? {
//!     handle(sequence.current()?);
//! }
//! sequence.dispose();
//! ```

use std::future::Future;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::CallError;

/// Lifecycle of a pull sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SequenceState {
    /// `advance` has not yet been called.
    NotStarted,
    /// The current element is valid.
    Active,
    /// Exhausted or disposed. Terminal.
    Done,
}

/// A single-consumer asynchronous pull sequence.
///
/// The sequence moves through three states: not started, active (current
/// element valid) and done (exhausted or disposed, terminal). `advance`
/// is the only operation that may suspend. There is no internal
/// synchronization; the `&mut self` receivers make concurrent use of one
/// instance unrepresentable rather than merely undocumented.
pub trait AsyncPullSequence {
    /// Element type produced by the sequence.
    type Item;

    /// Advance to the next element.
    ///
    /// Resolves to `true` once the next element is available through
    /// [`current`](AsyncPullSequence::current), or `false` when the
    /// sequence is exhausted. A sequence that has returned `false` or has
    /// been disposed keeps returning `false`.
    ///
    /// # Errors
    ///
    /// [`CallError::Cancelled`] when a configured cancellation signal is
    /// observed before or while waiting; failures from the underlying
    /// source propagate unchanged. After an error the sequence is
    /// terminal.
    fn advance(&mut self) -> impl Future<Output = Result<bool, CallError>> + Send;

    /// The element produced by the last successful [`advance`](AsyncPullSequence::advance).
    ///
    /// # Errors
    ///
    /// [`CallError::ContractViolation`] before the first `advance` and
    /// after exhaustion or disposal.
    fn current(&self) -> Result<&Self::Item, CallError>;

    /// Release held resources.
    ///
    /// Idempotent and valid in any state; the sequence is terminal
    /// afterwards.
    fn dispose(&mut self);
}

/// Await `future`, unwinding early with [`CallError::Cancelled`] when the
/// cancellation signal fires first.
pub(crate) async fn next_or_cancelled<F>(
    cancellation: Option<&CancellationToken>,
    future: F,
) -> Result<F::Output, CallError>
where
    F: Future,
{
    match cancellation {
        Some(cancel) => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    Err(CallError::cancelled("cancelled while awaiting the source"))
                }
                output = future => Ok(output),
            }
        }
        None => Ok(future.await),
    }
}

/// Pull-sequence adapter over a native async stream.
///
/// Bridges sources that already speak [`futures::Stream`] onto the pull
/// contract, so downstream logic never depends on the stream machinery
/// directly.
pub struct StreamSequence<S, T>
where
    S: Stream<Item = Result<T, CallError>> + Unpin,
{
    stream: Option<S>,
    current: Option<T>,
    state: SequenceState,
    cancellation: Option<CancellationToken>,
}

impl<S, T> StreamSequence<S, T>
where
    S: Stream<Item = Result<T, CallError>> + Unpin,
{
    /// Wrap the given stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            current: None,
            state: SequenceState::NotStarted,
            cancellation: None,
        }
    }

    /// Observe the given cancellation signal while waiting on the stream.
    ///
    /// Normally taken from [`CallSettings`](crate::CallSettings)
    /// cancellation.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }
}

impl<S, T> AsyncPullSequence for StreamSequence<S, T>
where
    S: Stream<Item = Result<T, CallError>> + Unpin + Send,
    T: Send,
{
    type Item = T;

    async fn advance(&mut self) -> Result<bool, CallError> {
        let cancellation = self.cancellation.clone();
        if let Some(cancel) = &cancellation {
            if cancel.is_cancelled() {
                self.dispose();
                return Err(CallError::cancelled("cancelled before advancing"));
            }
        }
        let next = {
            let Some(stream) = self.stream.as_mut() else {
                return Ok(false);
            };
            next_or_cancelled(cancellation.as_ref(), stream.next()).await
        };
        match next {
            Ok(Some(Ok(item))) => {
                self.current = Some(item);
                self.state = SequenceState::Active;
                Ok(true)
            }
            Ok(Some(Err(err))) => {
                self.dispose();
                Err(err)
            }
            Ok(None) => {
                self.dispose();
                Ok(false)
            }
            Err(cancelled) => {
                self.dispose();
                Err(cancelled)
            }
        }
    }

    fn current(&self) -> Result<&T, CallError> {
        match self.state {
            SequenceState::Active => self
                .current
                .as_ref()
                .ok_or_else(|| CallError::contract_violation("current element already taken")),
            SequenceState::NotStarted => Err(CallError::contract_violation(
                "current read before the first advance",
            )),
            SequenceState::Done => Err(CallError::contract_violation(
                "current read after exhaustion or disposal",
            )),
        }
    }

    fn dispose(&mut self) {
        self.stream = None;
        self.current = None;
        self.state = SequenceState::Done;
    }
}

/// Re-expose a pull sequence as a native [`futures::Stream`].
///
/// Elements are cloned out of the sequence as it advances; the stream ends
/// at exhaustion or yields the first error and stops.
pub fn into_stream<P>(mut sequence: P) -> impl Stream<Item = Result<P::Item, CallError>>
where
    P: AsyncPullSequence,
    P::Item: Clone,
{
    async_stream::try_stream! {
        while sequence.advance().await? {
            let item = sequence.current()?.clone();
            yield item;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn items(values: Vec<i32>) -> impl Stream<Item = Result<i32, CallError>> + Unpin {
        stream::iter(values.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_stream_sequence_pulls_in_order() {
        let mut sequence = StreamSequence::new(items(vec![1, 2, 3]));

        assert!(sequence.advance().await.unwrap());
        assert_eq!(*sequence.current().unwrap(), 1);
        assert!(sequence.advance().await.unwrap());
        assert_eq!(*sequence.current().unwrap(), 2);
        assert!(sequence.advance().await.unwrap());
        assert_eq!(*sequence.current().unwrap(), 3);

        assert!(!sequence.advance().await.unwrap());
        // exhaustion is sticky
        assert!(!sequence.advance().await.unwrap());
    }

    #[tokio::test]
    async fn test_current_before_first_advance_is_a_contract_violation() {
        let sequence = StreamSequence::new(items(vec![1]));
        assert!(matches!(
            sequence.current(),
            Err(CallError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_current_after_exhaustion_is_a_contract_violation() {
        let mut sequence = StreamSequence::new(items(vec![1]));
        assert!(sequence.advance().await.unwrap());
        assert!(!sequence.advance().await.unwrap());
        assert!(matches!(
            sequence.current(),
            Err(CallError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_valid_from_any_state() {
        let mut sequence = StreamSequence::new(items(vec![1, 2]));
        sequence.dispose();
        sequence.dispose();
        assert!(!sequence.advance().await.unwrap());
        assert!(matches!(
            sequence.current(),
            Err(CallError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_error_propagates_and_poisons() {
        let source = stream::iter(vec![Ok(1), Err(CallError::transport("boom")), Ok(2)]);
        let mut sequence = StreamSequence::new(source);

        assert!(sequence.advance().await.unwrap());
        assert!(matches!(
            sequence.advance().await,
            Err(CallError::Transport(_))
        ));
        // terminal after the error
        assert!(!sequence.advance().await.unwrap());
    }

    #[tokio::test]
    async fn test_cancellation_before_advance() {
        let token = CancellationToken::new();
        token.cancel();
        let mut sequence =
            StreamSequence::new(items(vec![1, 2])).with_cancellation(token);

        assert!(matches!(
            sequence.advance().await,
            Err(CallError::Cancelled(_))
        ));
    }

    #[tokio::test]
    async fn test_cancellation_during_advance() {
        let token = CancellationToken::new();
        // a stream that never produces: advance must unwind via the token
        let pending = stream::pending::<Result<i32, CallError>>();
        let mut sequence = StreamSequence::new(pending).with_cancellation(token.clone());

        let cancel = token.clone();
        tokio::spawn(async move {
            cancel.cancel();
        });

        assert!(matches!(
            sequence.advance().await,
            Err(CallError::Cancelled(_))
        ));
    }

    #[tokio::test]
    async fn test_into_stream_round_trip() {
        let sequence = StreamSequence::new(items(vec![1, 2, 3]));
        let collected: Vec<i32> = into_stream(sequence)
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(collected, vec![1, 2, 3]);
    }
}
