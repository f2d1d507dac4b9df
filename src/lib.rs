//! tlsforge
//!
//! Building blocks for constructing deliberately configurable, and often
//! deliberately malformed, TLS and DTLS exchanges.
//!
//! Every wire field of every message is a [`Modifiable`]: it carries the base
//! value a parser read or a preparator computed, plus an optional override
//! attached by attack code. Serializers only ever read the effective value, so
//! the only difference between a conformant run and an attack run is which
//! fields carry an override.
//!
//! ```text
//! outbound: Chooser ─▶ Prepare ─▶ Serialize ─▶ RecordLayer::encrypt ─▶ Transport
//! inbound:  Transport ─▶ RecordLayer::decrypt ─▶ (DTLS) FragmentManager ─▶ Parse
//! ```
//!
//! The [`workflow::WorkflowExecutor`] drives a [`workflow::WorkflowTrace`]
//! through these pipelines one action at a time.
#![forbid(unsafe_code)]
#![warn(clippy::all)]

#[macro_use]
extern crate log;

mod error;
pub use error::Error;

pub mod modifiable;
pub use modifiable::{Modifiable, Modification};

pub mod types;

mod config;
pub use config::{Config, ConfigBuilder};

mod context;
pub use context::TlsContext;

mod chooser;
pub use chooser::Chooser;

pub mod crypto;
pub mod dtls;
pub mod message;
pub mod record;
pub mod workflow;

mod util;
