//! Paged asynchronous enumeration.
//!
//! A paginated listing arrives as server-sized [`Chunk`]s threaded by a
//! continuation token. [`ResponseSequence`] drives the token loop and
//! yields one chunk per element; [`PagedSequence`] layers caller-sized
//! page assembly on top; [`ItemSequence`] flattens the chunks item by
//! item. All three speak the [`AsyncPullSequence`] contract.
//!
//! # Example
//!
//! ```ignore
//! use pagewise_client::PagedSequence;
//!
//! let mut listing = PagedSequence::new(|token| client.list_items(token));
//!
//! // Caller-sized pages, regardless of how the server chunks the listing.
//! let page = listing.read_page(50).await?;
//! for item in &page {
//!     handle(item);
//! }
//! ```

use std::collections::VecDeque;
use std::future::Future;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use pagewise_core::{Chunk, PageToken};

use crate::CallError;
use crate::sequence::{AsyncPullSequence, SequenceState, next_or_cancelled};

/// Source of chunks for a paginated listing.
///
/// Implementors issue one remote request per `fetch`, receiving the
/// continuation token from the previous chunk (`None` for the first
/// request). This is the seam where a transport plugs in; closures of the
/// shape `FnMut(Option<PageToken>) -> Future<Result<Chunk<T>, CallError>>`
/// implement it directly.
pub trait ChunkSource {
    /// Item type carried by the chunks.
    type Item;

    /// Fetch the chunk identified by `token`, or the first chunk for
    /// `None`.
    fn fetch(
        &mut self,
        token: Option<PageToken>,
    ) -> impl Future<Output = Result<Chunk<Self::Item>, CallError>> + Send;
}

impl<T, F, Fut> ChunkSource for F
where
    F: FnMut(Option<PageToken>) -> Fut + Send,
    Fut: Future<Output = Result<Chunk<T>, CallError>> + Send,
{
    type Item = T;

    fn fetch(
        &mut self,
        token: Option<PageToken>,
    ) -> impl Future<Output = Result<Chunk<T>, CallError>> + Send {
        (self)(token)
    }
}

/// The sequence of raw server responses, one chunk per element.
///
/// Exhaustion is reached after yielding the first chunk that carries no
/// continuation token. A failed fetch poisons the sequence: it becomes
/// terminal and must not be reused.
pub struct ResponseSequence<S: ChunkSource> {
    source: Option<S>,
    current: Option<Chunk<S::Item>>,
    next_token: Option<PageToken>,
    state: SequenceState,
    cancellation: Option<CancellationToken>,
}

impl<S: ChunkSource> ResponseSequence<S> {
    /// Sequence over the given source, starting at the first chunk.
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            current: None,
            next_token: None,
            state: SequenceState::NotStarted,
            cancellation: None,
        }
    }

    /// Observe the given cancellation signal while waiting on fetches.
    ///
    /// Normally taken from [`CallSettings`](crate::CallSettings)
    /// cancellation.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Move the current chunk's items out, leaving the chunk empty.
    fn take_items(&mut self) -> Vec<S::Item> {
        self.current
            .as_mut()
            .map(|chunk| std::mem::take(&mut chunk.items))
            .unwrap_or_default()
    }
}

impl<S> AsyncPullSequence for ResponseSequence<S>
where
    S: ChunkSource + Send,
    S::Item: Send,
{
    type Item = Chunk<S::Item>;

    async fn advance(&mut self) -> Result<bool, CallError> {
        let cancellation = self.cancellation.clone();
        if let Some(cancel) = &cancellation {
            if cancel.is_cancelled() {
                self.dispose();
                return Err(CallError::cancelled("cancelled before fetching a chunk"));
            }
        }
        // the previous chunk carried no continuation token: exhausted
        if self.state == SequenceState::Active && self.next_token.is_none() {
            self.dispose();
            return Ok(false);
        }
        let token = self.next_token.take();
        let fetched = {
            let Some(source) = self.source.as_mut() else {
                return Ok(false);
            };
            next_or_cancelled(cancellation.as_ref(), source.fetch(token)).await
        };
        match fetched {
            Ok(Ok(chunk)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    items = chunk.items.len(),
                    more = chunk.next_page_token.is_some(),
                    "fetched chunk"
                );
                self.next_token = chunk.next_page_token.clone();
                self.current = Some(chunk);
                self.state = SequenceState::Active;
                Ok(true)
            }
            Ok(Err(err)) | Err(err) => {
                self.dispose();
                Err(err)
            }
        }
    }

    fn current(&self) -> Result<&Chunk<S::Item>, CallError> {
        match self.state {
            SequenceState::Active => self
                .current
                .as_ref()
                .ok_or_else(|| CallError::contract_violation("current chunk already taken")),
            SequenceState::NotStarted => Err(CallError::contract_violation(
                "current read before the first advance",
            )),
            SequenceState::Done => Err(CallError::contract_violation(
                "current read after exhaustion or disposal",
            )),
        }
    }

    fn dispose(&mut self) {
        self.source = None;
        self.current = None;
        self.next_token = None;
        self.state = SequenceState::Done;
    }
}

/// A fully materialized, caller-sized batch of items.
///
/// Once returned from [`PagedSequence::read_page`] a page is inert:
/// iterating it any number of times performs no further pulls on the
/// underlying listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The page's items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page, returning its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A paginated listing normalized behind caller-chosen page sizes.
///
/// Chunk boundaries are a server-side detail: [`read_page`] splits and
/// carries over chunks as needed, so consecutive pages line up exactly
/// with the requested size until the listing runs out. The unconsumed
/// tail of the last-pulled chunk is retained inside the sequence and
/// served first on the next page read.
///
/// Page reads, raw-chunk iteration ([`into_responses`]) and item-by-item
/// iteration ([`into_items`]) are exclusive modes: the conversions consume
/// the sequence, so interleaving them over one listing is unrepresentable.
///
/// [`read_page`]: PagedSequence::read_page
/// [`into_responses`]: PagedSequence::into_responses
/// [`into_items`]: PagedSequence::into_items
pub struct PagedSequence<S: ChunkSource> {
    responses: ResponseSequence<S>,
    remainder: VecDeque<S::Item>,
}

impl<S> PagedSequence<S>
where
    S: ChunkSource + Send,
    S::Item: Send,
{
    /// Paged view over the given chunk source.
    pub fn new(source: S) -> Self {
        Self {
            responses: ResponseSequence::new(source),
            remainder: VecDeque::new(),
        }
    }

    /// Observe the given cancellation signal while waiting on fetches.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.responses = self.responses.with_cancellation(cancellation);
        self
    }

    /// Assemble the next page of exactly `page_size` items.
    ///
    /// The returned page is shorter than requested only when the listing
    /// was exhausted first; once exhausted, further reads return empty
    /// pages without touching the source. Items of a chunk that overshot
    /// the page are retained for the next read, never dropped or
    /// re-fetched.
    ///
    /// # Errors
    ///
    /// [`CallError::InvalidArgument`] for a zero page size, before any
    /// pull happens. A failed pull propagates unchanged; the partially
    /// accumulated page is discarded and the sequence must be considered
    /// unusable.
    pub async fn read_page(&mut self, page_size: usize) -> Result<Page<S::Item>, CallError> {
        if page_size == 0 {
            return Err(CallError::invalid_argument("page size must be positive"));
        }
        let mut items = Vec::new();
        while items.len() < page_size {
            match self.remainder.pop_front() {
                Some(item) => items.push(item),
                None => break,
            }
        }
        while items.len() < page_size {
            if !self.responses.advance().await? {
                break;
            }
            let mut fresh = self.responses.take_items().into_iter();
            while items.len() < page_size {
                match fresh.next() {
                    Some(item) => items.push(item),
                    None => break,
                }
            }
            self.remainder.extend(fresh);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            requested = page_size,
            returned = items.len(),
            retained = self.remainder.len(),
            "assembled page"
        );
        Ok(Page::new(items))
    }

    /// The raw chunk-per-element sequence.
    ///
    /// Consuming conversion: page reads and raw iteration over one
    /// listing are exclusive. Items already pulled into the page
    /// remainder are not part of the raw view, so convert before reading
    /// pages to observe every chunk.
    pub fn into_responses(self) -> ResponseSequence<S> {
        self.responses
    }

    /// Flatten the listing item by item.
    ///
    /// Carries over any remainder from previous page reads, so no item is
    /// lost in the conversion.
    pub fn into_items(self) -> ItemSequence<S> {
        ItemSequence {
            responses: self.responses,
            buffer: self.remainder,
            current: None,
            state: SequenceState::NotStarted,
        }
    }

    /// Release the underlying source and drop any retained remainder.
    pub fn dispose(&mut self) {
        self.responses.dispose();
        self.remainder.clear();
    }
}

/// Item-by-item view over a paginated listing.
///
/// Flattens raw chunks so consumers see one resource per element,
/// buffering the unconsumed tail of each chunk. Empty chunks are skipped
/// transparently.
pub struct ItemSequence<S: ChunkSource> {
    responses: ResponseSequence<S>,
    buffer: VecDeque<S::Item>,
    current: Option<S::Item>,
    state: SequenceState,
}

impl<S> ItemSequence<S>
where
    S: ChunkSource + Send,
    S::Item: Send,
{
    /// Item sequence over the given chunk source.
    pub fn new(source: S) -> Self {
        Self {
            responses: ResponseSequence::new(source),
            buffer: VecDeque::new(),
            current: None,
            state: SequenceState::NotStarted,
        }
    }

    /// Observe the given cancellation signal while waiting on fetches.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.responses = self.responses.with_cancellation(cancellation);
        self
    }

    /// Re-expose the sequence as a native [`futures::Stream`].
    ///
    /// The stream yields every remaining item in order, then ends; a
    /// failure is yielded once and ends the stream.
    pub fn into_stream(mut self) -> impl Stream<Item = Result<S::Item, CallError>> + Send {
        async_stream::try_stream! {
            while self.advance().await? {
                if let Some(item) = self.current.take() {
                    yield item;
                }
            }
        }
    }
}

impl<S> AsyncPullSequence for ItemSequence<S>
where
    S: ChunkSource + Send,
    S::Item: Send,
{
    type Item = S::Item;

    async fn advance(&mut self) -> Result<bool, CallError> {
        if let Some(cancel) = self.responses.cancellation.as_ref() {
            if cancel.is_cancelled() {
                self.dispose();
                return Err(CallError::cancelled("cancelled before advancing"));
            }
        }
        if self.state == SequenceState::Done {
            return Ok(false);
        }
        loop {
            if let Some(item) = self.buffer.pop_front() {
                self.current = Some(item);
                self.state = SequenceState::Active;
                return Ok(true);
            }
            match self.responses.advance().await {
                Ok(true) => {
                    let items = self.responses.take_items();
                    self.buffer.extend(items);
                }
                Ok(false) => {
                    self.dispose();
                    return Ok(false);
                }
                Err(err) => {
                    self.dispose();
                    return Err(err);
                }
            }
        }
    }

    fn current(&self) -> Result<&S::Item, CallError> {
        match self.state {
            SequenceState::Active => self
                .current
                .as_ref()
                .ok_or_else(|| CallError::contract_violation("current item already taken")),
            SequenceState::NotStarted => Err(CallError::contract_violation(
                "current read before the first advance",
            )),
            SequenceState::Done => Err(CallError::contract_violation(
                "current read after exhaustion or disposal",
            )),
        }
    }

    fn dispose(&mut self) {
        self.responses.dispose();
        self.buffer.clear();
        self.current = None;
        self.state = SequenceState::Done;
    }
}
