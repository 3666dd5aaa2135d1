//! Transport tests against a scripted channel
//!
//! Exercises the burst-collection discipline without hardware: first-byte
//! polling, the grace-interval drain, the settle re-check, and timeout.

use pumpdrive_core::protocol::{Channel, PumpError, Transport};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// When a scripted burst becomes visible to the transport
enum Arrival {
    /// A fixed delay after the transport first polls the channel
    AtMillis(u64),
    /// Only after the transport has drained everything delivered so far
    AfterDrain,
}

struct Burst {
    arrival: Arrival,
    bytes: Vec<u8>,
}

/// Mock serial line delivering scripted response bursts
struct MockChannel {
    bursts: Vec<Burst>,
    next_burst: usize,
    buffered: Vec<u8>,
    consumed: usize,
    drains: usize,
    started: Option<Instant>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl MockChannel {
    fn new(bursts: Vec<Burst>) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let channel = Self {
            bursts,
            next_burst: 0,
            buffered: Vec::new(),
            consumed: 0,
            drains: 0,
            started: None,
            written: Arc::clone(&written),
        };
        (channel, written)
    }

    /// Move any due bursts into the visible buffer
    fn deliver(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        while let Some(burst) = self.bursts.get(self.next_burst) {
            let due = match burst.arrival {
                Arrival::AtMillis(ms) => elapsed_ms >= ms,
                Arrival::AfterDrain => self.drains > 0,
            };
            if !due {
                break;
            }
            self.buffered.extend_from_slice(&burst.bytes);
            self.next_burst += 1;
        }
    }
}

impl Read for MockChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.deliver();
        let remaining = &self.buffered[self.consumed..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.consumed += n;
        if n > 0 && self.consumed == self.buffered.len() {
            self.drains += 1;
        }
        Ok(n)
    }
}

impl Write for MockChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for MockChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.deliver();
        Ok((self.buffered.len() - self.consumed) as u32)
    }
}

#[test]
fn test_single_burst_response() {
    let (channel, _) = MockChannel::new(vec![Burst {
        arrival: Arrival::AtMillis(0),
        bytes: b"\x0201S\x03".to_vec(),
    }]);
    let mut transport = Transport::new(Box::new(channel), Duration::from_secs(1), false);

    let response = transport.read_response().unwrap();
    assert_eq!(response, b"\x0201S\x03");
}

#[test]
fn test_two_burst_frame_reassembled_within_grace_interval() {
    // The frame arrives split: a partial prefix, then the rest 10ms later,
    // inside the 20ms grace window
    let (channel, _) = MockChannel::new(vec![
        Burst {
            arrival: Arrival::AtMillis(0),
            bytes: b"\x0201".to_vec(),
        },
        Burst {
            arrival: Arrival::AtMillis(10),
            bytes: b"S\x03".to_vec(),
        },
    ]);
    let mut transport = Transport::new(Box::new(channel), Duration::from_secs(1), false);

    let response = transport.read_response().unwrap();
    assert_eq!(response, b"\x0201S\x03");
}

#[test]
fn test_timeout_on_silent_device() {
    let (channel, _) = MockChannel::new(vec![]);
    let mut transport = Transport::new(Box::new(channel), Duration::from_millis(50), false);

    assert!(matches!(
        transport.read_response(),
        Err(PumpError::Timeout)
    ));
}

#[test]
fn test_bytes_after_drain_are_trailing() {
    // A stray byte appearing once the burst has been drained means more
    // than one frame's worth of data for a single command
    let (channel, _) = MockChannel::new(vec![
        Burst {
            arrival: Arrival::AtMillis(0),
            bytes: b"\x0201S\x03".to_vec(),
        },
        Burst {
            arrival: Arrival::AfterDrain,
            bytes: b"Z".to_vec(),
        },
    ]);
    let mut transport = Transport::new(Box::new(channel), Duration::from_secs(1), false);

    match transport.read_response() {
        Err(PumpError::TrailingBytes(extra)) => assert_eq!(extra, b"Z"),
        other => panic!("expected TrailingBytes, got {:?}", other),
    }
}

#[test]
fn test_write_command_passes_bytes_through() {
    let (channel, written) = MockChannel::new(vec![]);
    let mut transport = Transport::new(Box::new(channel), Duration::from_millis(50), false);

    transport.write_command(b"RUN\r\n").unwrap();
    assert_eq!(*written.lock().unwrap(), b"RUN\r\n");
}
