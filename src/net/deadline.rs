//! Deadline-bounded endpoints.
//!
//! # Responsibilities
//! - Express "this endpoint honours a deadline" as an explicit capability
//! - Provide the `Source`/`Sink` seams the relay loop and the tee are written against
//! - Wrap network streams so every read/write is bounded by the current deadline
//!
//! # Design Decisions
//! - A deadline is absolute and sticky: once set it bounds every following
//!   operation until it is moved, like a socket deadline
//! - An elapsed deadline surfaces as `io::ErrorKind::TimedOut`
//! - Files and in-memory buffers expose no deadline; callers skip them

use std::future::Future;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

/// Capability of an endpoint whose reads and writes can be bounded in time.
pub trait SupportsDeadline {
    /// Set (or clear, with `None`) the absolute deadline for pending and future operations.
    fn set_deadline(&mut self, deadline: Option<Instant>);
}

/// Anything the relay reads from or writes to.
pub trait Endpoint {
    /// The deadline capability, when this endpoint has one.
    fn deadline(&mut self) -> Option<&mut dyn SupportsDeadline> {
        None
    }
}

/// Readable side of an endpoint.
#[async_trait]
pub trait Source: Endpoint + Send {
    /// Read into `buf`, returning 0 at end-of-stream.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Writable side of an endpoint.
#[async_trait]
pub trait Sink: Endpoint + Send {
    /// Write some prefix of `buf`, returning how many bytes were accepted.
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Move the deadline of `endpoint` to `now + timeout` if it supports one.
pub fn arm_deadline<E: Endpoint + ?Sized>(endpoint: &mut E, timeout: Duration) {
    if let Some(deadline) = endpoint.deadline() {
        deadline.set_deadline(Some(Instant::now() + timeout));
    }
}

/// A network stream whose operations are bounded by a deadline.
#[derive(Debug)]
pub struct Conn<S> {
    inner: S,
    deadline: Option<Instant>,
}

impl<S> Conn<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            deadline: None,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Current deadline, if any.
    pub fn current_deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl<S> SupportsDeadline for Conn<S> {
    fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }
}

impl<S> Endpoint for Conn<S> {
    fn deadline(&mut self) -> Option<&mut dyn SupportsDeadline> {
        Some(self)
    }
}

#[async_trait]
impl<S> Source for Conn<S>
where
    S: AsyncRead + Unpin + Send,
{
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        bounded(self.deadline, self.inner.read(buf)).await
    }
}

#[async_trait]
impl<S> Sink for Conn<S>
where
    S: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        bounded(self.deadline, self.inner.write(buf)).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        bounded(self.deadline, self.inner.flush()).await
    }
}

async fn bounded<F, T>(deadline: Option<Instant>, operation: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(at) => tokio::time::timeout_at(at, operation)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed"))?,
        None => operation.await,
    }
}

impl Endpoint for tokio::fs::File {}

#[async_trait]
impl Sink for tokio::fs::File {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        AsyncWriteExt::write(self, buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(self).await
    }
}

impl Endpoint for Vec<u8> {}

#[async_trait]
impl Sink for Vec<u8> {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl<T: Endpoint + ?Sized> Endpoint for &mut T {
    fn deadline(&mut self) -> Option<&mut dyn SupportsDeadline> {
        (**self).deadline()
    }
}

#[async_trait]
impl<'a, T: Source + ?Sized> Source for &'a mut T {
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf).await
    }
}

#[async_trait]
impl<'a, T: Sink + ?Sized> Sink for &'a mut T {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        Sink::flush(&mut **self).await
    }
}
