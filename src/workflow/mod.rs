//! Driving a planned exchange against a peer.
//!
//! A [`WorkflowTrace`] lists send and receive actions. The
//! [`WorkflowExecutor`] runs them in order over a [`Transport`], recording
//! what was actually sent and received next to what was planned.

mod executor;
mod trace;
mod transport;

pub use executor::WorkflowExecutor;
pub use trace::{ActionKind, MessageAction, WorkflowTrace};
pub use transport::{MemoryTransport, Transport};
