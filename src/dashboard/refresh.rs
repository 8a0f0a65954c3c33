use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::source::{DataSource, Snapshot, SourceError};

pub type Outcome = Result<Snapshot, SourceError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// A fetch was started with this sequence number.
    Started(u64),
    /// A fetch was already outstanding; this tick was folded into it.
    Coalesced,
}

struct InFlight {
    seq: u64,
    started: Instant,
    receiver: mpsc::Receiver<Outcome>,
}

/// Runs snapshot fetches on a worker thread, one at a time.
pub struct Refresher {
    next_seq: u64,
    in_flight: Option<InFlight>,
    pub coalesced: u64,
}

impl Refresher {
    pub fn new() -> Self {
        Self {
            next_seq: 1,
            in_flight: None,
            coalesced: 0,
        }
    }

    /// Hands out the next sequence number. Synchronous refreshes draw from
    /// the same counter so their results order against background ones.
    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn start(&mut self, source: Arc<dyn DataSource>, alert_limit: usize) -> Tick {
        if let Some(pending) = &self.in_flight {
            self.coalesced += 1;
            debug!(
                seq = pending.seq,
                waited_ms = pending.started.elapsed().as_millis() as u64,
                "refresh still in flight, skipping tick"
            );
            return Tick::Coalesced;
        }

        let seq = self.next_sequence();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(source.snapshot(alert_limit));
        });

        self.in_flight = Some(InFlight {
            seq,
            started: Instant::now(),
            receiver: rx,
        });
        Tick::Started(seq)
    }

    /// Non-blocking check for a finished fetch.
    pub fn poll(&mut self) -> Option<(u64, Outcome)> {
        let (seq, outcome) = {
            let pending = self.in_flight.as_ref()?;
            match pending.receiver.try_recv() {
                Ok(outcome) => (pending.seq, outcome),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => (pending.seq, Err(SourceError::WorkerGone)),
            }
        };
        self.in_flight = None;
        Some((seq, outcome))
    }

    /// Blocking variant of [`Refresher::poll`]. `None` waits for as long as
    /// the fetch takes.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Option<(u64, Outcome)> {
        let (seq, outcome) = {
            let pending = self.in_flight.as_ref()?;
            let received = match timeout {
                Some(timeout) => pending.receiver.recv_timeout(timeout),
                None => pending
                    .receiver
                    .recv()
                    .map_err(|_| mpsc::RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(outcome) => (pending.seq, outcome),
                Err(mpsc::RecvTimeoutError::Timeout) => return None,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    (pending.seq, Err(SourceError::WorkerGone))
                }
            }
        };
        self.in_flight = None;
        Some((seq, outcome))
    }
}

impl Default for Refresher {
    fn default() -> Self {
        Self::new()
    }
}
