use crate::message::ProtocolMessage;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Send,
    Receive,
}

/// One step of a trace: messages to send, or messages expected from the
/// peer.
///
/// The configured list is fixed before execution. The observed list is
/// appended to while the action runs and holds what actually went over the
/// wire: prepared copies of the configured messages for a send, parsed
/// messages for a receive.
#[derive(Debug, Clone)]
pub struct MessageAction {
    kind: ActionKind,
    configured: Vec<ProtocolMessage>,
    observed: Vec<ProtocolMessage>,
    records: Vec<Record>,
    executed: bool,
}

impl MessageAction {
    pub fn send(messages: Vec<ProtocolMessage>) -> Self {
        Self::new(ActionKind::Send, messages)
    }

    pub fn receive(messages: Vec<ProtocolMessage>) -> Self {
        Self::new(ActionKind::Receive, messages)
    }

    fn new(kind: ActionKind, configured: Vec<ProtocolMessage>) -> Self {
        MessageAction {
            kind,
            configured,
            observed: Vec::new(),
            records: Vec::new(),
            executed: false,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn configured(&self) -> &[ProtocolMessage] {
        &self.configured
    }

    /// Attach overrides to configured messages before execution.
    pub fn configured_mut(&mut self) -> &mut [ProtocolMessage] {
        &mut self.configured
    }

    pub fn observed(&self) -> &[ProtocolMessage] {
        &self.observed
    }

    /// Records written or read while executing this action.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub(crate) fn push_observed(&mut self, message: ProtocolMessage) {
        self.observed.push(message);
    }

    pub(crate) fn push_records(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    pub(crate) fn set_executed(&mut self) {
        self.executed = true;
    }

    /// The action ran to the end and observed the configured messages, in
    /// order, matched by content type and handshake type.
    pub fn executed_as_planned(&self) -> bool {
        self.executed
            && self.configured.len() == self.observed.len()
            && self
                .configured
                .iter()
                .zip(&self.observed)
                .all(|(c, o)| {
                    c.content_type() == o.content_type() && c.handshake_type() == o.handshake_type()
                })
    }
}

/// An ordered list of send and receive actions.
#[derive(Debug, Clone, Default)]
pub struct WorkflowTrace {
    actions: Vec<MessageAction>,
}

impl WorkflowTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(mut self, messages: Vec<ProtocolMessage>) -> Self {
        self.actions.push(MessageAction::send(messages));
        self
    }

    pub fn receive(mut self, messages: Vec<ProtocolMessage>) -> Self {
        self.actions.push(MessageAction::receive(messages));
        self
    }

    pub fn push(&mut self, action: MessageAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[MessageAction] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut [MessageAction] {
        &mut self.actions
    }

    /// Every action ran and observed what it was configured with.
    pub fn executed_as_planned(&self) -> bool {
        self.actions.iter().all(|a| a.executed_as_planned())
    }

    /// All messages received from the peer, in order.
    pub fn received_messages(&self) -> impl Iterator<Item = &ProtocolMessage> {
        self.actions
            .iter()
            .filter(|a| a.kind == ActionKind::Receive)
            .flat_map(|a| a.observed.iter())
    }

    /// All messages sent to the peer, in order.
    pub fn sent_messages(&self) -> impl Iterator<Item = &ProtocolMessage> {
        self.actions
            .iter()
            .filter(|a| a.kind == ActionKind::Send)
            .flat_map(|a| a.observed.iter())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::{Alert, ServerHello, ServerHelloDone};

    #[test]
    fn planned_means_same_kinds_in_order() {
        let mut action =
            MessageAction::receive(vec![ServerHello::new().into(), ServerHelloDone::new().into()]);
        assert!(!action.executed_as_planned());

        action.push_observed(ServerHello::new().into());
        action.push_observed(ServerHelloDone::new().into());
        assert!(!action.executed_as_planned());

        action.set_executed();
        assert!(action.executed_as_planned());
    }

    #[test]
    fn unexpected_message_is_not_planned() {
        let mut trace = WorkflowTrace::new().receive(vec![ServerHello::new().into()]);
        let action = &mut trace.actions_mut()[0];
        action.push_observed(Alert::new().into());
        action.set_executed();
        assert!(!trace.executed_as_planned());
        assert_eq!(trace.received_messages().count(), 1);
        assert_eq!(trace.sent_messages().count(), 0);
    }
}
