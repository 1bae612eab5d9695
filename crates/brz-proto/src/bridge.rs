//! Bridge protocol messages for admin and indexing operations.
//!
//! # Example
//!
//! ```rust
//! use brz_proto::{BridgeRequest, ClusterKey, RequestEnvelope, ResponseEnvelope};
//!
//! let request = RequestEnvelope::new(1, BridgeRequest::GetStatus {
//!     cluster: ClusterKey::new(1, 2),
//! });
//! let json = request.to_json().unwrap();
//! assert!(json.contains("get_status"));
//!
//! let response = ResponseEnvelope::from_json(
//!     r#"{"id":1,"response":{"type":"text","text":"{\"state\":\"running\"}"}}"#,
//! ).unwrap();
//! assert_eq!(response.id, 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ClusterKey, IndexingCommandType};
use crate::ProtoError;

/// Protocol version for bridge communication.
pub const BRIDGE_PROTOCOL_VERSION: u32 = 1;

/// Requests sent from the admin client to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    /// Handshake to identify as an admin client.
    Hello {
        /// Client version.
        version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Look up the network channel serving a cluster.
    FindChannel {
        /// Target cluster.
        cluster: ClusterKey,
    },

    /// Look up the agent managing a cluster.
    FindAgent {
        /// Target cluster.
        cluster: ClusterKey,
    },

    /// Fetch cluster status text.
    GetStatus {
        /// Target cluster.
        cluster: ClusterKey,
    },

    /// Run an analyzer over sample text.
    AnalyzerTest {
        /// Target cluster.
        cluster: ClusterKey,
        /// Analyzer to run.
        analyzer_name: String,
        /// Text to analyze.
        analyzer_text: String,
        /// Free-form analyzer options.
        analyzer_option: String,
    },

    /// Initialize a cluster with a schema.
    InitCluster {
        /// Target cluster.
        cluster: ClusterKey,
        /// Schema document, forwarded verbatim.
        schema: String,
    },

    /// Fetch the cluster schema.
    GetSchema {
        /// Target cluster.
        cluster: ClusterKey,
    },

    /// Generic control command with an opaque payload.
    PostControlCommand {
        /// Target cluster.
        cluster: ClusterKey,
        /// Command identifier. May be empty for directive files.
        command: String,
        /// Opaque payload, often JSON-encoded parameters.
        payload: String,
    },

    /// Submit indexing content.
    PostIndexingCommand {
        /// Target cluster.
        cluster: ClusterKey,
        /// Mutation kind.
        kind: IndexingCommandType,
        /// Content, forwarded verbatim.
        data: String,
    },
}

/// Responses sent from the bridge to the admin client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeResponse {
    /// Handshake accepted.
    Welcome {
        /// Server version.
        server_version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Lookup succeeded.
    Located {
        /// Address of the located endpoint, when the bridge reports one.
        #[serde(default)]
        address: Option<String>,
    },

    /// Lookup found nothing yet.
    NotFound,

    /// Textual result.
    Text {
        /// Result text.
        text: String,
    },

    /// Command accepted with no result.
    Ack,

    /// Indexing command accepted.
    Sequence {
        /// Sequence number assigned by the bridge.
        sn: i64,
    },

    /// Request failed.
    Error {
        /// Error code (see [`error_codes`]).
        code: u32,
        /// Human-readable message.
        message: String,
    },
}

/// Error codes for bridge responses.
pub mod error_codes {
    /// Cluster not known to the bridge.
    pub const CLUSTER_NOT_FOUND: u32 = 2001;
    /// Malformed or unsupported request.
    pub const INVALID_REQUEST: u32 = 2002;
    /// Cluster refused the command in its current state.
    pub const INVALID_STATE: u32 = 2003;
    /// Internal bridge failure.
    pub const INTERNAL_ERROR: u32 = 2004;
    /// Protocol version mismatch.
    pub const PROTOCOL_MISMATCH: u32 = 2005;
}

/// A request tagged with its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestEnvelope {
    /// Correlation id, echoed by the response.
    pub id: u64,
    /// The request.
    pub request: BridgeRequest,
}

/// A response tagged with the id of the request it answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Correlation id of the answered request.
    pub id: u64,
    /// The response.
    pub response: BridgeResponse,
}

impl BridgeRequest {
    /// Create a hello message.
    #[must_use]
    pub fn hello(version: impl Into<String>) -> Self {
        Self::Hello {
            version: version.into(),
            protocol_version: BRIDGE_PROTOCOL_VERSION,
        }
    }

    /// Get the request type name for error reporting.
    #[must_use]
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::FindChannel { .. } => "find_channel",
            Self::FindAgent { .. } => "find_agent",
            Self::GetStatus { .. } => "get_status",
            Self::AnalyzerTest { .. } => "analyzer_test",
            Self::InitCluster { .. } => "init_cluster",
            Self::GetSchema { .. } => "get_schema",
            Self::PostControlCommand { .. } => "post_control_command",
            Self::PostIndexingCommand { .. } => "post_indexing_command",
        }
    }

    /// The cluster this request targets, if any.
    #[must_use]
    pub fn cluster(&self) -> Option<ClusterKey> {
        match self {
            Self::Hello { .. } => None,
            Self::FindChannel { cluster }
            | Self::FindAgent { cluster }
            | Self::GetStatus { cluster }
            | Self::AnalyzerTest { cluster, .. }
            | Self::InitCluster { cluster, .. }
            | Self::GetSchema { cluster }
            | Self::PostControlCommand { cluster, .. }
            | Self::PostIndexingCommand { cluster, .. } => Some(*cluster),
        }
    }
}

impl BridgeResponse {
    /// Create a welcome response.
    #[must_use]
    pub fn welcome(server_version: impl Into<String>) -> Self {
        Self::Welcome {
            server_version: server_version.into(),
            protocol_version: BRIDGE_PROTOCOL_VERSION,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

impl RequestEnvelope {
    /// Wrap a request with its correlation id.
    #[must_use]
    pub const fn new(id: u64, request: BridgeRequest) -> Self {
        Self { id, request }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

impl ResponseEnvelope {
    /// Wrap a response with the id of the request it answers.
    #[must_use]
    pub const fn new(id: u64, response: BridgeResponse) -> Self {
        Self { id, response }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
