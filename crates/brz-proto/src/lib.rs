//! # brz-proto
//!
//! Wire protocol between the breeze admin client and the bridge service.
//!
//! Frames are JSON text messages. Every request travels in a
//! [`RequestEnvelope`] carrying a client-chosen id, and the bridge answers
//! with a [`ResponseEnvelope`] echoing that id:
//!
//! ```text
//! ┌──────────┐   RequestEnvelope    ┌────────────────┐
//! │   brz    │─────────────────────►│  bridge server │
//! │          │◄─────────────────────│                │
//! └──────────┘   ResponseEnvelope   └────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod error;
pub mod types;

pub use bridge::{
    error_codes, BridgeRequest, BridgeResponse, RequestEnvelope, ResponseEnvelope,
    BRIDGE_PROTOCOL_VERSION,
};
pub use error::ProtoError;
pub use types::{ClusterKey, IndexingCommandType};
