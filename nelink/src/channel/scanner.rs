//! Incremental recognizer scanning over a live byte stream.
//!
//! Each [`StreamScanner::expect`] call moves the reader into a short-lived
//! read task. The task appends every chunk to a fresh [`PatternBuffer`] and
//! evaluates the whole buffer after each read. The calling future acts as the
//! coordinator: it races the task's outcome against the deadline, then
//! cancels the task and takes the reader back, so no read is left running
//! that could swallow bytes meant for the next expect.

use std::io;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;

use super::buffer::{Found, PatternBuffer, excerpt};
use super::patterns::Expectation;
use crate::error::ExpectError;

/// Bytes requested from the stream per read.
const READ_CHUNK_SIZE: usize = 1000;

/// A happy recognizer matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    /// Index of the recognizer among the expectation's happy recognizers.
    pub pattern_index: usize,

    /// Source of the recognizer that matched.
    pub pattern: String,

    /// The matched text.
    pub matched: String,

    /// Text accumulated before the match.
    pub before: String,

    /// Everything accumulated up to and including the chunk that matched.
    pub text: String,

    /// The full line the match sits on.
    pub prompt_line: String,
}

/// What the read task observed.
enum ScanEvent {
    Happy(Found),
    Sad(Found),
    Closed,
    Failed(io::Error),
}

/// Scans a byte stream for recognizers under a deadline.
pub struct StreamScanner<R> {
    /// The stream, `None` only while a read task owns it.
    reader: Option<R>,

    /// Whether ANSI escape sequences are removed before matching.
    strip_ansi: bool,
}

impl<R> StreamScanner<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a scanner that strips ANSI escape sequences.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            strip_ansi: true,
        }
    }

    /// Create a scanner that matches against the raw bytes.
    pub fn raw(reader: R) -> Self {
        Self {
            reader: Some(reader),
            strip_ansi: false,
        }
    }

    /// Whether the stream can be scanned again.
    pub fn is_available(&self) -> bool {
        self.reader.is_some()
    }

    /// Take the underlying stream back.
    pub fn into_inner(self) -> Option<R> {
        self.reader
    }

    /// Wait until a recognizer of `expectation` matches or `timeout` elapses.
    ///
    /// Returns the happy match, or [`ExpectError::FailurePattern`] when a sad
    /// recognizer matched first, [`ExpectError::StreamClosed`] when the peer
    /// closed the stream, and [`ExpectError::Timeout`] when neither happened
    /// in time.
    pub async fn expect(
        &mut self,
        expectation: &Expectation,
        timeout: Duration,
    ) -> Result<ScanMatch, ExpectError> {
        let reader = self.reader.take().ok_or(ExpectError::ReaderUnavailable)?;
        let buffer = if self.strip_ansi {
            PatternBuffer::new()
        } else {
            PatternBuffer::raw()
        };

        // Fresh channels per expect: nothing from an earlier call can land here.
        let (event_tx, event_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        debug!("expect {} within {:?}", expectation.describe(), timeout);
        let task = tokio::spawn(read_until_match(
            reader,
            expectation.clone(),
            buffer,
            event_tx,
            cancel_rx,
        ));

        let decision = tokio::select! {
            biased;
            event = event_rx => event.ok(),
            () = tokio::time::sleep(timeout) => None,
        };

        let _ = cancel_tx.send(());
        let (reader, buffer) = task.await.map_err(|e| {
            warn!("scanner read task failed: {}", e);
            ExpectError::ReaderUnavailable
        })?;
        self.reader = Some(reader);

        match decision {
            Some(ScanEvent::Happy(found)) => {
                let scan = ScanMatch {
                    pattern_index: found.index,
                    pattern: expectation.happy()[found.index].as_str().to_string(),
                    matched: buffer.slice_str(found.range.clone()).into_owned(),
                    before: buffer.slice_str(0..found.range.start).into_owned(),
                    text: buffer.as_str_lossy().into_owned(),
                    prompt_line: buffer.line_around(&found.range).into_owned(),
                };
                debug!("matched {:?} with {}", scan.matched, scan.pattern);
                Ok(scan)
            }
            Some(ScanEvent::Sad(found)) => Err(ExpectError::FailurePattern {
                pattern: expectation.sad()[found.index].as_str().to_string(),
                matched: buffer.slice_str(found.range).into_owned(),
                observed: excerpt(&buffer.as_str_lossy()),
            }),
            Some(ScanEvent::Closed) => Err(ExpectError::StreamClosed {
                observed: excerpt(&buffer.as_str_lossy()),
            }),
            Some(ScanEvent::Failed(e)) => Err(ExpectError::Io(e)),
            None => Err(ExpectError::Timeout {
                timeout,
                patterns: expectation.describe(),
                observed: excerpt(&buffer.as_str_lossy()),
            }),
        }
    }

    /// Discard output until the stream stays quiet for `quiet`.
    ///
    /// Returns the number of bytes discarded.
    pub async fn drain(&mut self, quiet: Duration) -> usize {
        let Some(reader) = self.reader.as_mut() else {
            return 0;
        };
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut discarded = 0;
        while let Ok(Ok(n)) = tokio::time::timeout(quiet, reader.read(&mut chunk)).await {
            if n == 0 {
                break;
            }
            discarded += n;
        }
        if discarded > 0 {
            trace!("drained {} stale bytes", discarded);
        }
        discarded
    }
}

impl<R> std::fmt::Debug for StreamScanner<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamScanner")
            .field("available", &self.reader.is_some())
            .field("strip_ansi", &self.strip_ansi)
            .finish()
    }
}

/// Read task body: runs until a recognizer matches, the stream ends, or the
/// coordinator cancels. Always hands the reader back.
async fn read_until_match<R>(
    mut reader: R,
    expectation: Expectation,
    mut buffer: PatternBuffer,
    events: oneshot::Sender<ScanEvent>,
    mut cancel: oneshot::Receiver<()>,
) -> (R, PatternBuffer)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let event = loop {
        let read = tokio::select! {
            biased;
            _ = &mut cancel => return (reader, buffer),
            read = reader.read(&mut chunk) => read,
        };
        let n = match read {
            Ok(0) => break ScanEvent::Closed,
            Ok(n) => n,
            Err(e) => break ScanEvent::Failed(e),
        };

        buffer.extend(&chunk[..n]);
        trace!("scanner chunk: {} bytes, buffer: {} bytes", n, buffer.len());

        if let Some(found) = buffer.find_first(expectation.happy()) {
            break ScanEvent::Happy(found);
        }
        if let Some(found) = buffer.find_first(expectation.sad()) {
            break ScanEvent::Sad(found);
        }
    };

    // The coordinator may have timed out already; the event is then dropped.
    let _ = events.send(event);
    (reader, buffer)
}
