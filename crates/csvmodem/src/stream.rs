//! Asynchronous driver: pulls byte chunks from a [`Stream`] and yields
//! events, with optional asynchronous callbacks.
//!
//! Rows are processed one at a time. A row's callbacks finish before the
//! next row is parsed, so events keep input order however long a callback
//! takes, and no input is pulled while a callback is pending.

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{FutureExt, Stream, StreamExt, future::BoxFuture};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::{CallbackError, ConfigError, ErrorSource, ParserError},
    event::{ParseEvent, Record, Row},
    hooks::Verdict,
    options::ParserOptions,
    parser::{CsvParser, Staged},
    token::Span,
};

/// Asynchronous validator. Takes precedence over a synchronous one.
pub type AsyncValidateFn =
    Box<dyn FnMut(&Row) -> BoxFuture<'static, Result<Verdict, CallbackError>> + Send>;
/// Asynchronous transform. Takes precedence over a synchronous one.
pub type AsyncTransformFn =
    Box<dyn FnMut(Row) -> BoxFuture<'static, Result<Row, CallbackError>> + Send>;

/// Errors yielded by a [`RowStream`].
#[derive(Debug, Error)]
pub enum StreamError<E> {
    /// The input stream yielded an error. Parsing stops.
    #[error("input stream failed: {0}")]
    Input(E),
    #[error(transparent)]
    Parse(#[from] ParserError),
}

enum InFlight {
    Validating {
        record: Record,
        verdict: BoxFuture<'static, Result<Verdict, CallbackError>>,
    },
    Transforming {
        span: Span,
        number: usize,
        output: BoxFuture<'static, Result<Row, CallbackError>>,
    },
}

/// A [`Stream`] of [`ParseEvent`]s over a stream of byte chunks.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{ParseEvent, ParserOptions, RowStream, Verdict};
/// use futures::{StreamExt, executor::block_on, stream};
///
/// let chunks = stream::iter(["a,1\nb,", "2\nc,3\n"].map(Ok::<_, std::io::Error>));
/// let events = RowStream::new(chunks, ParserOptions::default())
///     .unwrap()
///     .validate_async(|row| {
///         let keep = row.field(0) != Some("b");
///         async move { Ok(Verdict::from(keep)) }
///     });
/// let events: Vec<_> = block_on(events.collect());
/// assert_eq!(events.len(), 4);
/// assert!(matches!(events[1], Ok(ParseEvent::Invalid(_))));
/// ```
#[must_use = "streams do nothing unless polled"]
pub struct RowStream<S> {
    input: Option<S>,
    parser: CsvParser,
    validate: Option<AsyncValidateFn>,
    transform: Option<AsyncTransformFn>,
    in_flight: Option<InFlight>,
    done: bool,
}

impl<S> RowStream<S> {
    /// Creates a stream without callbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid options.
    pub fn new(input: S, options: ParserOptions) -> Result<Self, ConfigError> {
        Ok(Self::from_parser(input, CsvParser::new(options)?))
    }

    /// Drives an existing parser, keeping its synchronous callbacks.
    pub fn from_parser(input: S, parser: CsvParser) -> Self {
        Self {
            input: Some(input),
            parser,
            validate: None,
            transform: None,
            in_flight: None,
            done: false,
        }
    }

    /// Validates each row with a future. An `Err` ends the stream.
    pub fn validate_async<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut(&Row) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Verdict, CallbackError>> + Send + 'static,
    {
        self.validate = Some(Box::new(move |row: &Row| f(row).boxed()));
        self
    }

    /// Transforms each valid row with a future. An `Err` ends the stream.
    pub fn transform_async<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut(Row) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Row, CallbackError>> + Send + 'static,
    {
        self.transform = Some(Box::new(move |row: Row| f(row).boxed()));
        self
    }

    /// Stops the stream. A pending callback is dropped and the input stream
    /// is released. The stream yields nothing more, not even `End`.
    pub fn cancel(&mut self) {
        debug!("row stream cancelled");
        self.parser.cancel();
        self.in_flight = None;
        self.input = None;
        self.done = true;
    }

    /// Rows emitted so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.parser.row_count()
    }

    fn stop(&mut self) {
        self.in_flight = None;
        self.input = None;
        self.done = true;
    }

    /// Starts the callbacks for a staged row. Returns an event when they all
    /// ran synchronously.
    fn start(&mut self, record: Record) -> Option<Result<ParseEvent, ParserError>> {
        if let Some(validate) = self.validate.as_mut() {
            let verdict = validate(&record.row);
            self.in_flight = Some(InFlight::Validating { record, verdict });
            return None;
        }
        match self.parser.check(&record) {
            Ok(Verdict::Valid) => self.begin_transform(record),
            Ok(Verdict::Invalid { reason }) => Some(Ok(self.parser.reject(record, reason))),
            Err(err) => Some(Err(err)),
        }
    }

    fn begin_transform(&mut self, record: Record) -> Option<Result<ParseEvent, ParserError>> {
        if let Some(transform) = self.transform.as_mut() {
            let Record { row, span, number } = record;
            self.in_flight = Some(InFlight::Transforming {
                span,
                number,
                output: transform(row),
            });
            return None;
        }
        Some(
            self.parser
                .reshape(record)
                .map(|record| self.parser.accept(record)),
        )
    }

    /// Polls the pending callback. `None` means another callback started.
    fn settle(
        &mut self,
        flight: InFlight,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<ParseEvent, ParserError>>> {
        match flight {
            InFlight::Validating {
                record,
                mut verdict,
            } => match verdict.poll_unpin(cx) {
                Poll::Pending => {
                    self.in_flight = Some(InFlight::Validating { record, verdict });
                    Poll::Pending
                }
                Poll::Ready(Ok(Verdict::Valid)) => Poll::Ready(self.begin_transform(record)),
                Poll::Ready(Ok(Verdict::Invalid { reason })) => {
                    Poll::Ready(Some(Ok(self.parser.reject(record, reason))))
                }
                Poll::Ready(Err(err)) => Poll::Ready(Some(Err(self
                    .parser
                    .fail_callback(ErrorSource::Validate(err), record.span)))),
            },
            InFlight::Transforming {
                span,
                number,
                mut output,
            } => match output.poll_unpin(cx) {
                Poll::Pending => {
                    self.in_flight = Some(InFlight::Transforming {
                        span,
                        number,
                        output,
                    });
                    Poll::Pending
                }
                Poll::Ready(Ok(row)) => {
                    Poll::Ready(Some(Ok(self.parser.accept(Record { row, span, number }))))
                }
                Poll::Ready(Err(err)) => Poll::Ready(Some(Err(self
                    .parser
                    .fail_callback(ErrorSource::Transform(err), span)))),
            },
        }
    }
}

impl<S, C, E> Stream for RowStream<S>
where
    S: Stream<Item = Result<C, E>> + Unpin,
    C: AsRef<[u8]>,
{
    type Item = Result<ParseEvent, StreamError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(flight) = this.in_flight.take() {
                match this.settle(flight, cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(None) => continue,
                    Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(Ok(event))),
                    Poll::Ready(Some(Err(err))) => {
                        this.stop();
                        return Poll::Ready(Some(Err(err.into())));
                    }
                }
            }
            if this.done {
                return Poll::Ready(None);
            }

            let staged = match this.parser.next_staged() {
                Ok(staged) => staged,
                Err(err) => {
                    this.stop();
                    return Poll::Ready(Some(Err(err.into())));
                }
            };
            match staged {
                Staged::Event(event) => return Poll::Ready(Some(Ok(event))),
                Staged::Candidate(record) => match this.start(record) {
                    None => {}
                    Some(Ok(event)) => return Poll::Ready(Some(Ok(event))),
                    Some(Err(err)) => {
                        this.stop();
                        return Poll::Ready(Some(Err(err.into())));
                    }
                },
                Staged::Done => {
                    this.stop();
                    return Poll::Ready(None);
                }
                Staged::NeedMore => {
                    let Some(input) = this.input.as_mut() else {
                        this.parser.close_input();
                        continue;
                    };
                    match input.poll_next_unpin(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Some(Ok(chunk))) => this.parser.push_bytes(chunk.as_ref()),
                        Poll::Ready(Some(Err(err))) => {
                            this.parser.cancel();
                            this.stop();
                            return Poll::Ready(Some(Err(StreamError::Input(err))));
                        }
                        Poll::Ready(None) => {
                            this.input = None;
                            this.parser.close_input();
                        }
                    }
                }
            }
        }
    }
}

impl<S> core::fmt::Debug for RowStream<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RowStream")
            .field("parser", &self.parser)
            .field("validate", &self.validate.is_some())
            .field("transform", &self.transform.is_some())
            .field("in_flight", &self.in_flight.is_some())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
