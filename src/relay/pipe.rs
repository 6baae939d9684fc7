//! Deadline-bounded copy loop.
//!
//! # Responsibilities
//! - Copy a source into a sink through a fixed-size buffer
//! - Re-arm the per-operation deadline before every read and every write
//! - Absorb timeouts, surface every other I/O failure immediately
//!
//! # Design Decisions
//! - A read timeout is a zero-byte round; the loop keeps going
//! - A write timeout retries only the unwritten remainder
//! - Each read is fully written before the next read (implicit backpressure)
//! - Partial progress is never rolled back on failure

use std::io;
use std::time::Duration;

use crate::error::is_timeout;
use crate::net::deadline::{arm_deadline, Sink, Source};

/// Default size of the intermediate buffer.
pub const BUFFER_SIZE: usize = 1024;

/// Knobs of a single relay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// Deadline applied to each read and each write on deadline-capable endpoints.
    pub timeout: Duration,
    pub buffer_size: usize,
    /// Consecutive read timeouts tolerated before giving up; `None` waits forever.
    pub max_idle_rounds: Option<u32>,
}

impl RelayOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            buffer_size: BUFFER_SIZE,
            max_idle_rounds: None,
        }
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn max_idle_rounds(mut self, rounds: Option<u32>) -> Self {
        self.max_idle_rounds = rounds;
        self
    }
}

/// What a finished relay moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes read from the source and fully written to the sink.
    pub bytes: u64,
    pub read_timeouts: u64,
    pub write_timeouts: u64,
}

/// Copy `source` into `sink` until end-of-stream or a non-timeout error.
pub async fn relay<R, W>(source: &mut R, sink: &mut W, options: &RelayOptions) -> io::Result<RelayStats>
where
    R: Source + ?Sized,
    W: Sink + ?Sized,
{
    let mut buffer = vec![0u8; options.buffer_size.max(1)];
    let mut stats = RelayStats::default();
    let mut idle_rounds = 0u32;

    loop {
        arm_deadline(source, options.timeout);
        let count = match source.recv(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => {
                idle_rounds = 0;
                n
            }
            Err(e) if is_timeout(&e) => {
                stats.read_timeouts += 1;
                idle_rounds = idle_rounds.saturating_add(1);
                if options.max_idle_rounds.is_some_and(|max| idle_rounds > max) {
                    tracing::trace!(idle_rounds, "Relay idle limit reached");
                    break;
                }
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut written = 0;
        while written < count {
            arm_deadline(sink, options.timeout);
            match sink.send(&buffer[written..count]).await {
                Ok(n) => written += n,
                Err(e) if is_timeout(&e) => stats.write_timeouts += 1,
                Err(e) => return Err(e),
            }
        }
        stats.bytes += count as u64;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::mock::{Recorder, Scripted};

    fn options() -> RelayOptions {
        RelayOptions::new(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn forwards_until_end_of_stream() {
        let mut source = Scripted::new().data(b"GET / HTTP/1.1\r\n").data(b"\r\n");
        let mut sink: Vec<u8> = Vec::new();

        let stats = relay(&mut source, &mut sink, &options()).await.unwrap();
        assert_eq!(sink, b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(stats.bytes, 18);
    }

    #[tokio::test]
    async fn repeated_timeouts_do_not_change_the_output() {
        for timeouts in [0, 1, 5, 50] {
            let mut source = Scripted::new().timeouts(timeouts).data(b"payload").timeouts(timeouts);
            let mut sink: Vec<u8> = Vec::new();

            let stats = relay(&mut source, &mut sink, &options()).await.unwrap();
            assert_eq!(sink, b"payload");
            assert_eq!(stats.read_timeouts, 2 * timeouts as u64);
        }
    }

    #[tokio::test]
    async fn read_error_aborts_and_keeps_partial_output() {
        let mut source = Scripted::new()
            .data(b"partial")
            .error(io::ErrorKind::ConnectionReset)
            .data(b"never");
        let mut sink: Vec<u8> = Vec::new();

        let err = relay(&mut source, &mut sink, &options()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(sink, b"partial");
    }

    #[tokio::test]
    async fn write_timeouts_retry_only_the_remainder() {
        let mut source = Scripted::new().data(b"abcdef");
        let mut sink = Recorder::new().accept(2).timeout().accept(10);

        let stats = relay(&mut source, &mut sink, &options()).await.unwrap();
        assert_eq!(sink.written, b"abcdef");
        assert_eq!(sink.attempts, vec![b"abcdef".to_vec(), b"cdef".to_vec(), b"cdef".to_vec()]);
        assert_eq!(stats.write_timeouts, 1);
    }

    #[tokio::test]
    async fn write_error_aborts() {
        let mut source = Scripted::new().data(b"abc").data(b"def");
        let mut sink = Recorder::new().accept(10).error(io::ErrorKind::BrokenPipe);

        let err = relay(&mut source, &mut sink, &options()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(sink.written, b"abc");
    }

    #[tokio::test]
    async fn deadline_is_armed_on_capable_endpoints_only() {
        let mut source = Scripted::new().data(b"one").data(b"two").with_deadline();
        let mut sink = Recorder::new().accept(10).accept(10).with_deadline();

        relay(&mut source, &mut sink, &options()).await.unwrap();
        // two data reads plus the final end-of-stream read
        assert_eq!(source.deadlines_set, 3);
        assert_eq!(sink.deadlines_set, 2);

        let mut plain = Scripted::new().data(b"one");
        relay(&mut plain, &mut Vec::<u8>::new(), &options()).await.unwrap();
        assert_eq!(plain.deadlines_set, 0);
    }

    #[tokio::test]
    async fn idle_limit_ends_the_relay() {
        let mut source = Scripted::new().data(b"head").timeouts(3).data(b"tail");
        let mut sink: Vec<u8> = Vec::new();

        let options = options().max_idle_rounds(Some(2));
        let stats = relay(&mut source, &mut sink, &options).await.unwrap();
        assert_eq!(sink, b"head");
        assert_eq!(stats.read_timeouts, 3);

        let mut source = Scripted::new().timeouts(1).data(b"late");
        let mut sink: Vec<u8> = Vec::new();
        relay(&mut source, &mut sink, &RelayOptions::new(Duration::from_millis(1)).max_idle_rounds(Some(0)))
            .await
            .unwrap();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn small_buffer_still_copies_everything() {
        let mut source = Scripted::new().data(b"0123456789");
        let mut sink: Vec<u8> = Vec::new();

        let stats = relay(&mut source, &mut sink, &options().buffer_size(3)).await.unwrap();
        assert_eq!(sink, b"0123456789");
        assert_eq!(stats.bytes, 10);
    }
}
