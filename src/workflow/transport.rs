use std::collections::VecDeque;

use crate::Error;

/// A blocking byte channel to the peer.
pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Up to `max` bytes. An empty result means nothing more will arrive.
    fn receive(&mut self, max: usize) -> Result<Vec<u8>, Error>;

    fn close(&mut self) -> Result<(), Error>;
}

/// A transport backed by in-memory buffers.
///
/// Bytes queued with [`push_inbound`](Self::push_inbound) are handed out by
/// `receive`, one queued chunk at a time so datagram boundaries survive.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_inbound(&mut self, bytes: Vec<u8>) {
        self.inbound.push_back(bytes);
    }

    /// Everything passed to `send`, one entry per call.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Transport(std::io::ErrorKind::NotConnected.into()));
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self, max: usize) -> Result<Vec<u8>, Error> {
        let Some(mut chunk) = self.inbound.pop_front() else {
            return Ok(Vec::new());
        };
        if chunk.len() > max {
            let rest = chunk.split_off(max);
            self.inbound.push_front(rest);
        }
        Ok(chunk)
    }

    fn close(&mut self) -> Result<(), Error> {
        self.closed = true;
        Ok(())
    }
}
