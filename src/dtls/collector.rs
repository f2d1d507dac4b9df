use crate::message::{DtlsHandshakeMessageFragment, Serialize};
use crate::types::HandshakeType;
use crate::Error;

/// Reassembly state of the message with one message sequence.
///
/// The message is complete when the inserted ranges cover
/// `[0, message_length)` without a gap. Inserting an already covered range
/// changes nothing; where fragments overlap the first-seen bytes win.
///
/// Only received bytes are held. The declared length is allocated once the
/// message is complete.
#[derive(Debug, Clone)]
pub struct FragmentCollector {
    message_seq: u16,
    msg_type: u8,
    message_length: u32,
    // Disjoint pieces, each the first bytes seen for its range.
    pieces: Vec<(usize, Vec<u8>)>,
    // Sorted, disjoint, non-adjacent [start, end) ranges.
    ranges: Vec<(usize, usize)>,
    inserted: bool,
}

impl FragmentCollector {
    /// Start collecting the message `first` belongs to, and insert it.
    pub fn new(first: &DtlsHandshakeMessageFragment) -> Result<Self, Error> {
        let mut collector = FragmentCollector {
            message_seq: first.message_seq.get()?,
            msg_type: first.msg_type.get()?,
            message_length: first.length.get()?,
            pieces: Vec::new(),
            ranges: Vec::new(),
            inserted: false,
        };
        collector.insert(first)?;
        Ok(collector)
    }

    pub fn message_seq(&self) -> u16 {
        self.message_seq
    }

    pub fn message_length(&self) -> u32 {
        self.message_length
    }

    /// Bytes held for this message so far.
    pub fn received_len(&self) -> usize {
        self.pieces.iter().map(|(_, bytes)| bytes.len()).sum()
    }

    /// Whether `fragment` claims to be part of this message.
    pub fn accepts(&self, fragment: &DtlsHandshakeMessageFragment) -> bool {
        fragment.msg_type.get().ok() == Some(self.msg_type)
            && fragment.length.get().ok() == Some(self.message_length)
    }

    pub fn insert(&mut self, fragment: &DtlsHandshakeMessageFragment) -> Result<(), Error> {
        if !self.accepts(fragment) {
            return Err(Error::ReassemblyInconsistency {
                message_seq: self.message_seq,
                reason: format!(
                    "fragment declares type {:?} length {:?}, expected type {} length {}",
                    fragment.msg_type.get().ok(),
                    fragment.length.get().ok(),
                    self.msg_type,
                    self.message_length
                ),
            });
        }

        let content = fragment.content.get()?;
        let start = fragment.fragment_offset.get()? as usize;
        let end = start + content.len();
        if end > self.message_length as usize {
            return Err(Error::MalformedInput(format!(
                "fragment [{}, {}) exceeds message length {}",
                start, end, self.message_length
            )));
        }

        // Only keep the gaps, so overlapped bytes keep their first value.
        let mut pos = start;
        for &(s, e) in &self.ranges {
            if e <= pos || s >= end {
                continue;
            }
            if s > pos {
                self.pieces
                    .push((pos, content[pos - start..s - start].to_vec()));
            }
            pos = pos.max(e);
        }
        if pos < end {
            self.pieces.push((pos, content[pos - start..].to_vec()));
        }

        self.add_range(start, end);
        self.inserted = true;
        Ok(())
    }

    fn add_range(&mut self, start: usize, end: usize) {
        if start == end {
            return;
        }
        self.ranges.push((start, end));
        self.ranges.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(self.ranges.len());
        for &(s, e) in &self.ranges {
            match merged.last_mut() {
                Some(last) if s <= last.1 => last.1 = last.1.max(e),
                _ => merged.push((s, e)),
            }
        }
        self.ranges = merged;
    }

    pub fn is_complete(&self) -> bool {
        if !self.inserted {
            return false;
        }
        if self.message_length == 0 {
            return true;
        }
        self.ranges == [(0, self.message_length as usize)]
    }

    /// The whole message as a single fragment, or `None` while incomplete.
    pub fn combined_fragment(&self) -> Option<DtlsHandshakeMessageFragment> {
        if !self.is_complete() {
            return None;
        }
        let mut content = vec![0; self.message_length as usize];
        for (offset, bytes) in &self.pieces {
            content[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        Some(DtlsHandshakeMessageFragment::new(
            HandshakeType::from_u8(self.msg_type),
            self.message_length,
            self.message_seq,
            0,
            content,
        ))
    }

    /// The serialized combined fragment, or `None` while incomplete.
    pub fn combined_bytes(&self) -> Option<Vec<u8>> {
        self.combined_fragment()?.to_bytes().ok()
    }
}
