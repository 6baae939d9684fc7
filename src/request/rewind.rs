//! Replays sniffed bytes ahead of the live stream.

use std::io;

use async_trait::async_trait;

use crate::net::deadline::{Endpoint, Sink, Source, SupportsDeadline};

/// A stream with a prefix that is read again before the stream itself.
///
/// The sniffer consumes the head of a connection to inspect it; wrapping the
/// connection in `Rewind` makes those bytes visible to the relay again, so the
/// request is forwarded byte-for-byte.
#[derive(Debug)]
pub struct Rewind<S> {
    prefix: Vec<u8>,
    pos: usize,
    inner: S,
}

impl<S> Rewind<S> {
    pub fn new(prefix: Vec<u8>, inner: S) -> Self {
        Self {
            prefix,
            pos: 0,
            inner,
        }
    }

    /// Bytes still waiting to be replayed.
    pub fn buffered(&self) -> &[u8] {
        &self.prefix[self.pos..]
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Endpoint> Endpoint for Rewind<S> {
    fn deadline(&mut self) -> Option<&mut dyn SupportsDeadline> {
        self.inner.deadline()
    }
}

#[async_trait]
impl<S: Source> Source for Rewind<S> {
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pending = &self.prefix[self.pos..];
        if pending.is_empty() {
            return self.inner.recv(buf).await;
        }

        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.pos += n;
        if self.pos == self.prefix.len() {
            self.prefix = Vec::new();
            self.pos = 0;
        }
        Ok(n)
    }
}

#[async_trait]
impl<S: Sink> Sink for Rewind<S> {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.send(buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }
}
