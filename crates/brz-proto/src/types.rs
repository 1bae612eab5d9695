//! Core types shared by requests and responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtoError;

/// Identifies one logical cluster instance: `(group_id, cluster_id)`.
///
/// Field order gives the derived ordering: group first, then cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterKey {
    /// Cluster group id.
    pub group_id: u32,
    /// Cluster id within the group.
    pub cluster_id: u32,
}

impl ClusterKey {
    /// Create a new cluster key.
    #[must_use]
    pub const fn new(group_id: u32, cluster_id: u32) -> Self {
        Self {
            group_id,
            cluster_id,
        }
    }
}

impl From<(u32, u32)> for ClusterKey {
    fn from((group_id, cluster_id): (u32, u32)) -> Self {
        Self::new(group_id, cluster_id)
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.cluster_id)
    }
}

/// Kind of content mutation carried by an indexing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexingCommandType {
    /// Add new documents.
    Add,
    /// Replace existing documents.
    Update,
    /// Replace documents matching a condition.
    ConditionalUpdate,
    /// Delete documents by key.
    Delete,
    /// Delete documents matching a condition.
    ConditionalDelete,
}

impl IndexingCommandType {
    /// All indexing command types, in protocol order.
    pub const ALL: [Self; 5] = [
        Self::Add,
        Self::Update,
        Self::ConditionalUpdate,
        Self::Delete,
        Self::ConditionalDelete,
    ];

    /// The operator-facing name accepted on the command line.
    #[must_use]
    pub const fn operation_name(self) -> &'static str {
        match self {
            Self::Add => "add_document",
            Self::Update => "update",
            Self::ConditionalUpdate => "conditional_update",
            Self::Delete => "delete",
            Self::ConditionalDelete => "conditional_delete",
        }
    }
}

impl FromStr for IndexingCommandType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.operation_name() == s)
            .ok_or_else(|| ProtoError::InvalidIndexingType(s.to_string()))
    }
}

impl fmt::Display for IndexingCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}
