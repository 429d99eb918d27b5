//! Bridge from the blocking archive writer to an async response body.

use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Create a connected writer/body pair.
///
/// The body owns a drop guard for `cancel`: dropping it (client gone)
/// cancels the export feeding the writer.
pub fn archive_pipe(
    chunk_size: usize,
    capacity: usize,
    cancel: CancellationToken,
) -> (ChannelWriter, ArchiveBody) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let writer = ChannelWriter {
        tx,
        buf: BytesMut::with_capacity(chunk_size),
        chunk_size: chunk_size.max(1),
    };
    let body = ArchiveBody {
        rx,
        _guard: cancel.drop_guard(),
    };
    (writer, body)
}

/// Blocking [`Write`] that batches bytes into chunks for [`ArchiveBody`].
///
/// Must not be used from inside an async task.
#[derive(Debug)]
pub struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
    buf: BytesMut,
    chunk_size: usize,
}

impl ChannelWriter {
    /// Terminate the body with an error so the client sees a broken stream
    /// instead of a truncated but well-formed one.
    pub fn fail(mut self, err: io::Error) {
        self.buf.clear();
        let _ = self.tx.blocking_send(Err(err));
    }

    fn send(&self, chunk: Bytes) -> io::Result<()> {
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive receiver dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        while self.buf.len() >= self.chunk_size {
            let chunk = self.buf.split_to(self.chunk_size).freeze();
            self.send(chunk)?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let chunk = self.buf.split().freeze();
            self.send(chunk)?;
        }
        Ok(())
    }
}

/// Response body stream fed by a [`ChannelWriter`].
#[derive(Debug)]
pub struct ArchiveBody {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    _guard: DropGuard,
}

impl Stream for ArchiveBody {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
