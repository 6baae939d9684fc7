//! Duplicating writer.
//!
//! Every write goes to the live peer first and then, for exactly the bytes the
//! peer accepted, to the capture sink. The count reported back to the relay is
//! the capture sink's, so a capture that under-reports makes the relay resend
//! the unacknowledged tail to the peer as well.

use std::io;
use std::time::Duration;

use async_trait::async_trait;

use crate::net::deadline::{arm_deadline, Endpoint, Sink};

/// Writes to `primary`, then mirrors the accepted bytes into `mirror`.
#[derive(Debug)]
pub struct Tee<A, B> {
    primary: A,
    mirror: B,
    timeout: Duration,
}

impl<A, B> Tee<A, B> {
    pub fn new(primary: A, mirror: B, timeout: Duration) -> Self {
        Self {
            primary,
            mirror,
            timeout,
        }
    }

    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.mirror)
    }
}

// The tee arms its own sinks; it exposes no deadline of its own.
impl<A, B> Endpoint for Tee<A, B> {}

#[async_trait]
impl<A: Sink, B: Sink> Sink for Tee<A, B> {
    /// A timeout from either sink is returned as-is; the relay treats it as
    /// zero progress. A timed-out primary accepted nothing, so the mirror is
    /// left untouched.
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        arm_deadline(&mut self.primary, self.timeout);
        let accepted = self.primary.send(buf).await?;
        if accepted == 0 {
            return Ok(0);
        }

        arm_deadline(&mut self.mirror, self.timeout);
        self.mirror.send(&buf[..accepted]).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        arm_deadline(&mut self.primary, self.timeout);
        self.primary.flush().await?;
        arm_deadline(&mut self.mirror, self.timeout);
        self.mirror.flush().await
    }
}
