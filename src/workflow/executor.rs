use super::{ActionKind, MessageAction, Transport, WorkflowTrace};
use crate::dtls::FragmentManager;
use crate::message::{
    fragment_handshake, unfragmented_bytes, DtlsHandshakeMessageFragment, Parse, ParseContext,
    Prepare, ProtocolMessage, Serialize,
};
use crate::record::{Direction, KeySet, Record, RecordCipher, RecordLayer};
use crate::types::ContentType;
use crate::{Chooser, Config, Error, TlsContext};

/// Upper bound for one transport read.
const RECEIVE_LIMIT: usize = 1 << 16;

/// How far beyond the next expected message_seq fragments are buffered.
const MESSAGE_SEQ_WINDOW: u16 = 16;

/// Runs a [`WorkflowTrace`] over a [`Transport`].
///
/// Owns the connection state: the negotiated context, the record layer and
/// DTLS reassembly. One action runs at a time.
pub struct WorkflowExecutor<T> {
    config: Config,
    context: TlsContext,
    transport: T,
    record_layer: RecordLayer,
    fragments: FragmentManager,
    /// Received bytes not yet forming a complete record.
    record_buffer: Vec<u8>,
    /// Received TLS handshake bytes not yet forming a complete message.
    handshake_buffer: Vec<u8>,
}

impl<T: Transport> WorkflowExecutor<T> {
    pub fn new(config: Config, transport: T) -> Self {
        let record_layer = RecordLayer::new(config.highest_protocol_version());
        WorkflowExecutor {
            config,
            context: TlsContext::new(),
            transport,
            record_layer,
            fragments: FragmentManager::new(),
            record_buffer: Vec::new(),
            handshake_buffer: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &TlsContext {
        &self.context
    }

    /// Inject negotiated state, for example secrets from an out-of-band key
    /// exchange.
    pub fn context_mut(&mut self) -> &mut TlsContext {
        &mut self.context
    }

    pub fn record_layer(&self) -> &RecordLayer {
        &self.record_layer
    }

    pub fn record_layer_mut(&mut self) -> &mut RecordLayer {
        &mut self.record_layer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn chooser(&self) -> Chooser<'_> {
        Chooser::new(&self.config, &self.context)
    }

    /// Run every action in order.
    ///
    /// A failing action is logged and ends the run; the trace keeps what was
    /// observed up to that point. Returns whether the trace executed as
    /// planned.
    pub fn execute(&mut self, trace: &mut WorkflowTrace) -> bool {
        for (i, action) in trace.actions_mut().iter_mut().enumerate() {
            if let Err(e) = self.execute_action(action) {
                warn!("Action {} ({:?}) failed: {}", i, action.kind(), e);
                break;
            }
            if action.kind() == ActionKind::Receive && !action.executed_as_planned() {
                warn!(
                    "Action {} received {} message(s), expected {}",
                    i,
                    action.observed().len(),
                    action.configured().len()
                );
                break;
            }
        }
        trace.executed_as_planned()
    }

    pub fn execute_action(&mut self, action: &mut MessageAction) -> Result<(), Error> {
        match action.kind() {
            ActionKind::Send => self.send_action(action)?,
            ActionKind::Receive => self.receive_action(action)?,
        }
        action.set_executed();
        Ok(())
    }

    fn send_action(&mut self, action: &mut MessageAction) -> Result<(), Error> {
        let configured = action.configured().to_vec();
        for mut message in configured {
            message.prepare(&self.chooser())?;
            let bytes = message.to_bytes()?;
            message.adjust_context(&mut self.context);

            let records = self.wrap(&message, &bytes)?;
            if self.record_layer.is_dtls() {
                // One datagram per record.
                for record in &records {
                    let wire = self
                        .record_layer
                        .serialize_records(std::slice::from_ref(record))?;
                    self.transport.send(&wire)?;
                }
            } else {
                let wire = self.record_layer.serialize_records(&records)?;
                self.transport.send(&wire)?;
            }
            debug!("Sent {} in {} record(s)", message.name(), records.len());

            if let ProtocolMessage::ChangeCipherSpec(_) = message {
                self.install_cipher(Direction::Write)?;
            }
            action.push_records(records);
            action.push_observed(message);
        }
        Ok(())
    }

    /// Records for one serialized message, updating the transcript.
    fn wrap(&mut self, message: &ProtocolMessage, bytes: &[u8]) -> Result<Vec<Record>, Error> {
        let dtls = self.record_layer.is_dtls();
        let content_type = message.content_type();

        match message {
            // Hand-built fragments go out as they are.
            ProtocolMessage::DtlsFragment(_) => {
                let chooser = Chooser::new(&self.config, &self.context);
                self.record_layer
                    .prepare_records(content_type, bytes, &chooser)
            }
            _ if content_type == ContentType::Handshake && dtls => {
                let seq = self.context.next_write_message_seq();
                self.context
                    .append_transcript(&unfragmented_bytes(bytes, seq)?);

                let max = self.config.dtls_max_fragment_length();
                let mut records = Vec::new();
                for fragment in fragment_handshake(bytes, seq, max)? {
                    let fragment_bytes = fragment.to_bytes()?;
                    let chooser = Chooser::new(&self.config, &self.context);
                    records.extend(self.record_layer.prepare_records(
                        content_type,
                        &fragment_bytes,
                        &chooser,
                    )?);
                }
                Ok(records)
            }
            _ => {
                if content_type == ContentType::Handshake {
                    self.context.append_transcript(bytes);
                }
                let chooser = Chooser::new(&self.config, &self.context);
                self.record_layer
                    .prepare_records(content_type, bytes, &chooser)
            }
        }
    }

    fn receive_action(&mut self, action: &mut MessageAction) -> Result<(), Error> {
        let expected = action.configured().len();
        loop {
            self.drain_pending(action, expected)?;
            if action.observed().len() >= expected {
                return Ok(());
            }

            let bytes = self.transport.receive(RECEIVE_LIMIT)?;
            if bytes.is_empty() {
                warn!(
                    "Peer sent nothing more, {} of {} message(s) received",
                    action.observed().len(),
                    expected
                );
                return Ok(());
            }
            self.record_buffer.extend_from_slice(&bytes);
        }
    }

    /// Process buffered data until `expected` messages are observed or the
    /// buffers run dry.
    fn drain_pending(&mut self, action: &mut MessageAction, expected: usize) -> Result<(), Error> {
        loop {
            while action.observed().len() < expected {
                let Some((message, transcript)) = self.next_buffered_handshake()? else {
                    break;
                };
                self.handle_handshake(&message, &transcript, action)?;
            }
            if action.observed().len() >= expected {
                return Ok(());
            }

            let Some(record) = self.next_record() else {
                return Ok(());
            };
            self.process_record(record, action)?;
        }
    }

    fn next_record(&mut self) -> Option<Record> {
        let (rest, record) = Record::parse(&self.record_buffer, self.record_layer.is_dtls()).ok()?;
        let consumed = self.record_buffer.len() - rest.len();
        self.record_buffer.drain(..consumed);
        Some(record)
    }

    fn process_record(&mut self, mut record: Record, action: &mut MessageAction) -> Result<(), Error> {
        if self.record_layer.is_dtls() {
            let epoch = record.epoch.get()?;
            let current = self.record_layer.decryptor().epoch();
            if epoch != current {
                // Retransmissions of an earlier flight, or records we hold no keys for yet.
                debug!("Dropping record of epoch {} while reading epoch {}", epoch, current);
                return Ok(());
            }
        }
        self.record_layer.decrypt_record(&mut record)?;
        let content_type = record.inner_content_type()?;
        let clean = record.clean_protocol_message_bytes.get()?;
        action.push_records([record]);

        match content_type {
            ContentType::Handshake if self.record_layer.is_dtls() => self.collect_fragments(&clean),
            ContentType::Handshake => {
                self.handshake_buffer.extend_from_slice(&clean);
                Ok(())
            }
            _ => {
                let mut input = &clean[..];
                while !input.is_empty() {
                    let ctx = ParseContext::from_chooser(&self.chooser());
                    let (rest, message) = ProtocolMessage::parse(content_type, input, &ctx)?;
                    self.handle_message(message, action)?;
                    input = rest;
                }
                Ok(())
            }
        }
    }

    fn collect_fragments(&mut self, mut input: &[u8]) -> Result<(), Error> {
        let ctx = ParseContext::from_chooser(&self.chooser());
        while !input.is_empty() {
            let (rest, fragment) = match DtlsHandshakeMessageFragment::parse(input, &ctx) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Dropping malformed handshake fragment: {}", Error::from(e));
                    return Ok(());
                }
            };
            input = rest;

            let seq = fragment.message_seq.get()?;
            let expected = self.context.read_message_seq();
            if seq < expected {
                debug!("Ignoring retransmitted fragment of message_seq {}", seq);
                continue;
            }
            if seq - expected >= MESSAGE_SEQ_WINDOW {
                debug!(
                    "Ignoring fragment of message_seq {}, expecting {}",
                    seq, expected
                );
                continue;
            }
            self.fragments.add_fragment(&fragment);
        }
        Ok(())
    }

    /// The next complete handshake message, in TLS form, with the bytes to
    /// add to the transcript.
    fn next_buffered_handshake(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>, Error> {
        if self.record_layer.is_dtls() {
            let seq = self.context.read_message_seq();
            let Some(combined) = self.fragments.combined_fragment(seq) else {
                return Ok(None);
            };
            self.fragments.clear(seq);
            self.context.set_read_message_seq(seq.wrapping_add(1));
            return Ok(Some((combined.to_handshake_bytes()?, combined.to_bytes()?)));
        }

        if self.handshake_buffer.len() < 4 {
            return Ok(None);
        }
        let b = &self.handshake_buffer;
        let len = u32::from_be_bytes([0, b[1], b[2], b[3]]) as usize;
        if b.len() < 4 + len {
            return Ok(None);
        }
        let message: Vec<u8> = self.handshake_buffer.drain(..4 + len).collect();
        Ok(Some((message.clone(), message)))
    }

    fn handle_handshake(
        &mut self,
        bytes: &[u8],
        transcript: &[u8],
        action: &mut MessageAction,
    ) -> Result<(), Error> {
        let ctx = ParseContext::from_chooser(&self.chooser());
        let (_, message) = ProtocolMessage::parse(ContentType::Handshake, bytes, &ctx)?;
        self.context.append_transcript(transcript);
        self.handle_message(message, action)
    }

    fn handle_message(
        &mut self,
        message: ProtocolMessage,
        action: &mut MessageAction,
    ) -> Result<(), Error> {
        debug!("Received {}", message.name());
        message.adjust_context(&mut self.context);
        if let ProtocolMessage::ChangeCipherSpec(_) = message {
            self.install_cipher(Direction::Read)?;
        }
        action.push_observed(message);
        Ok(())
    }

    /// Switch one direction to the negotiated cipher suite.
    ///
    /// TLS 1.2 keys come from the master secret, TLS 1.3 keys from the
    /// handshake traffic secrets.
    fn install_cipher(&mut self, direction: Direction) -> Result<(), Error> {
        let chooser = self.chooser();
        let version = chooser.protocol_version();
        let suite = chooser.cipher_suite();
        let keys = if version.is_tls13() {
            KeySet::derive_tls13_handshake(&chooser)?
        } else {
            KeySet::derive_tls12(&chooser)?
        };

        let current = match direction {
            Direction::Write => self.record_layer.encryptor(),
            Direction::Read => self.record_layer.decryptor(),
        };
        let epoch = if self.record_layer.is_dtls() {
            current.epoch().wrapping_add(1)
        } else {
            0
        };

        let cipher = RecordCipher::new(
            direction,
            self.config.connection_end(),
            version,
            suite,
            &keys,
            epoch,
        )?;
        match direction {
            Direction::Write => self.record_layer.set_encryptor(cipher),
            Direction::Read => self.record_layer.set_decryptor(cipher),
        }
    }
}
