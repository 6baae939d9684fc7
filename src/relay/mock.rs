//! Scripted endpoints for relay and tee tests.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::net::deadline::{Endpoint, Sink, Source, SupportsDeadline};

enum Step {
    Data(Vec<u8>),
    Accept(usize),
    Timeout,
    Fail(io::ErrorKind),
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "scripted timeout")
}

/// Source that replays a script, then reports end-of-stream.
pub struct Scripted {
    steps: VecDeque<Step>,
    deadline_capable: bool,
    pub deadlines_set: usize,
}

impl Scripted {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            deadline_capable: false,
            deadlines_set: 0,
        }
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.steps.push_back(Step::Data(bytes.to_vec()));
        self
    }

    pub fn timeouts(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.steps.push_back(Step::Timeout);
        }
        self
    }

    pub fn error(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push_back(Step::Fail(kind));
        self
    }

    pub fn with_deadline(mut self) -> Self {
        self.deadline_capable = true;
        self
    }
}

impl SupportsDeadline for Scripted {
    fn set_deadline(&mut self, _deadline: Option<Instant>) {
        self.deadlines_set += 1;
    }
}

impl Endpoint for Scripted {
    fn deadline(&mut self) -> Option<&mut dyn SupportsDeadline> {
        if self.deadline_capable {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Source for Scripted {
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            None => Ok(0),
            Some(Step::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(Step::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
            Some(Step::Timeout) => Err(timed_out()),
            Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
            Some(Step::Accept(_)) => Ok(0),
        }
    }
}

/// Sink that accepts according to a script and records every attempt.
///
/// Once the script runs out, every write is accepted in full.
pub struct Recorder {
    steps: VecDeque<Step>,
    deadline_capable: bool,
    pub written: Vec<u8>,
    pub attempts: Vec<Vec<u8>>,
    pub deadlines_set: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            deadline_capable: false,
            written: Vec::new(),
            attempts: Vec::new(),
            deadlines_set: 0,
        }
    }

    /// Accept at most `limit` bytes on the next write.
    pub fn accept(mut self, limit: usize) -> Self {
        self.steps.push_back(Step::Accept(limit));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.steps.push_back(Step::Timeout);
        self
    }

    pub fn error(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push_back(Step::Fail(kind));
        self
    }

    pub fn with_deadline(mut self) -> Self {
        self.deadline_capable = true;
        self
    }
}

impl SupportsDeadline for Recorder {
    fn set_deadline(&mut self, _deadline: Option<Instant>) {
        self.deadlines_set += 1;
    }
}

impl Endpoint for Recorder {
    fn deadline(&mut self) -> Option<&mut dyn SupportsDeadline> {
        if self.deadline_capable {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Sink for Recorder {
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.attempts.push(buf.to_vec());
        let limit = match self.steps.pop_front() {
            None | Some(Step::Data(_)) => buf.len(),
            Some(Step::Accept(limit)) => limit,
            Some(Step::Timeout) => return Err(timed_out()),
            Some(Step::Fail(kind)) => return Err(io::Error::from(kind)),
        };
        let n = limit.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
