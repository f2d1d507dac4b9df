use std::collections::HashMap;

use super::FragmentCollector;
use crate::message::DtlsHandshakeMessageFragment;

/// Per-connection reassembly, keyed by message sequence.
///
/// Nothing here fails hard: fragments that do not fit the message stored for
/// their sequence are logged and the message is reported incomplete.
#[derive(Debug, Default)]
pub struct FragmentManager {
    collectors: HashMap<u16, FragmentCollector>,
}

impl FragmentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `fragment`. Returns whether its message is now complete.
    pub fn add_fragment(&mut self, fragment: &DtlsHandshakeMessageFragment) -> bool {
        let message_seq = match fragment.message_seq.get() {
            Ok(seq) => seq,
            Err(e) => {
                warn!("Dropping fragment without message_seq: {}", e);
                return false;
            }
        };

        if let Some(collector) = self.collectors.get_mut(&message_seq) {
            return match collector.insert(fragment) {
                Ok(()) => collector.is_complete(),
                Err(e) => {
                    warn!("Dropping fragment: {}", e);
                    false
                }
            };
        }

        match FragmentCollector::new(fragment) {
            Ok(collector) => {
                let complete = collector.is_complete();
                self.collectors.insert(message_seq, collector);
                complete
            }
            Err(e) => {
                warn!("Dropping fragment: {}", e);
                false
            }
        }
    }

    /// Whether the message `fragment` belongs to is complete.
    pub fn is_fragment_complete(&self, fragment: &DtlsHandshakeMessageFragment) -> bool {
        let Ok(message_seq) = fragment.message_seq.get() else {
            return false;
        };
        match self.collectors.get(&message_seq) {
            None => {
                warn!(
                    "Fragment belongs to foreign message_seq {}, none of its fragments were added",
                    message_seq
                );
                false
            }
            Some(collector) if !collector.accepts(fragment) => {
                warn!(
                    "Fragment does not match the message stored for message_seq {}",
                    message_seq
                );
                false
            }
            Some(collector) => collector.is_complete(),
        }
    }

    pub fn is_complete(&self, message_seq: u16) -> bool {
        self.collectors
            .get(&message_seq)
            .map(|c| c.is_complete())
            .unwrap_or(false)
    }

    /// The reassembled message, or `None` if unknown or incomplete.
    pub fn combined_fragment(&self, message_seq: u16) -> Option<DtlsHandshakeMessageFragment> {
        self.collectors.get(&message_seq)?.combined_fragment()
    }

    /// The serialized reassembled message, or `None` if unknown or incomplete.
    pub fn combined_bytes(&self, message_seq: u16) -> Option<Vec<u8>> {
        let collector = self.collectors.get(&message_seq)?;
        if !collector.is_complete() {
            warn!("Message with message_seq {} is incomplete", message_seq);
            return None;
        }
        collector.combined_bytes()
    }

    /// Forget the message, so `message_seq` can be reused.
    pub fn clear(&mut self, message_seq: u16) {
        self.collectors.remove(&message_seq);
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}
