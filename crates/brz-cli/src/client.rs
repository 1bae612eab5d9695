//! Typed bridge operations on top of a [`Session`].
//!
//! [`BridgeApi`] is the seam between command logic and the transport:
//! the router and topology resolver only ever talk to a `BridgeApi`, and
//! [`BridgeClient`] implements it over a live session.
//!
//! # Example
//!
//! ```rust,no_run
//! use brz_cli::address_book::ContactList;
//! use brz_cli::client::{BridgeApi, BridgeClient};
//! use brz_cli::config::BridgeConfig;
//! use brz_cli::session::Session;
//! use brz_proto::ClusterKey;
//!
//! # async fn example() -> Result<(), brz_cli::CliError> {
//! let config = BridgeConfig::from_file("/opt/breeze/conf/breeze.cfg")?;
//! let session = Session::open(&config, &ContactList::new()).await?;
//! let status = BridgeClient::new(&session).get_status(ClusterKey::new(1, 2)).await?;
//! println!("{status}");
//! session.close().await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use brz_proto::{BridgeRequest, BridgeResponse, ClusterKey, IndexingCommandType};

use crate::error::CliError;
use crate::session::Session;

/// A successful topology lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Located {
    /// Address of the located endpoint, when the bridge reports one.
    pub address: Option<String>,
}

/// Parameters of an analyzer test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerRequest {
    /// Analyzer to run.
    pub name: String,
    /// Text to analyze.
    pub text: String,
    /// Free-form analyzer options.
    pub option: String,
}

/// Remote operations offered by the bridge.
///
/// Lookups return `Ok(None)` while the target is not there yet.
pub trait BridgeApi: Send + Sync {
    /// Look up the network channel serving a cluster.
    fn find_channel(
        &self,
        key: ClusterKey,
    ) -> impl Future<Output = Result<Option<Located>, CliError>> + Send;

    /// Look up the agent managing a cluster.
    fn find_agent(
        &self,
        key: ClusterKey,
    ) -> impl Future<Output = Result<Option<Located>, CliError>> + Send;

    /// Fetch cluster status text.
    fn get_status(&self, key: ClusterKey) -> impl Future<Output = Result<String, CliError>> + Send;

    /// Run an analyzer over sample text.
    fn analyzer_test(
        &self,
        key: ClusterKey,
        request: &AnalyzerRequest,
    ) -> impl Future<Output = Result<String, CliError>> + Send;

    /// Initialize a cluster with a schema.
    fn init_cluster(
        &self,
        key: ClusterKey,
        schema: &str,
    ) -> impl Future<Output = Result<(), CliError>> + Send;

    /// Fetch the cluster schema.
    fn get_schema(&self, key: ClusterKey) -> impl Future<Output = Result<String, CliError>> + Send;

    /// Issue a generic control command.
    fn post_control_command(
        &self,
        key: ClusterKey,
        command: &str,
        payload: &str,
    ) -> impl Future<Output = Result<String, CliError>> + Send;

    /// Submit indexing content; returns the assigned sequence number.
    fn post_indexing_command(
        &self,
        key: ClusterKey,
        kind: IndexingCommandType,
        data: &str,
    ) -> impl Future<Output = Result<i64, CliError>> + Send;
}

/// [`BridgeApi`] over a live session.
#[derive(Debug, Clone, Copy)]
pub struct BridgeClient<'a> {
    session: &'a Session,
}

impl<'a> BridgeClient<'a> {
    /// Wrap a session.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    async fn lookup(&self, request: BridgeRequest) -> Result<Option<Located>, CliError> {
        match self.session.call(request).await? {
            BridgeResponse::Located { address } => Ok(Some(Located { address })),
            BridgeResponse::NotFound => Ok(None),
            other => Err(unexpected(&other)),
        }
    }

    async fn text(&self, request: BridgeRequest) -> Result<String, CliError> {
        match self.session.call(request).await? {
            BridgeResponse::Text { text } => Ok(text),
            BridgeResponse::Ack => Ok(String::new()),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &BridgeResponse) -> CliError {
    CliError::Protocol(format!("unexpected response: {response:?}"))
}

impl BridgeApi for BridgeClient<'_> {
    async fn find_channel(&self, key: ClusterKey) -> Result<Option<Located>, CliError> {
        self.lookup(BridgeRequest::FindChannel { cluster: key }).await
    }

    async fn find_agent(&self, key: ClusterKey) -> Result<Option<Located>, CliError> {
        self.lookup(BridgeRequest::FindAgent { cluster: key }).await
    }

    async fn get_status(&self, key: ClusterKey) -> Result<String, CliError> {
        self.text(BridgeRequest::GetStatus { cluster: key }).await
    }

    async fn analyzer_test(
        &self,
        key: ClusterKey,
        request: &AnalyzerRequest,
    ) -> Result<String, CliError> {
        self.text(BridgeRequest::AnalyzerTest {
            cluster: key,
            analyzer_name: request.name.clone(),
            analyzer_text: request.text.clone(),
            analyzer_option: request.option.clone(),
        })
        .await
    }

    async fn init_cluster(&self, key: ClusterKey, schema: &str) -> Result<(), CliError> {
        let request = BridgeRequest::InitCluster {
            cluster: key,
            schema: schema.to_string(),
        };
        match self.session.call(request).await? {
            BridgeResponse::Ack | BridgeResponse::Text { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn get_schema(&self, key: ClusterKey) -> Result<String, CliError> {
        self.text(BridgeRequest::GetSchema { cluster: key }).await
    }

    async fn post_control_command(
        &self,
        key: ClusterKey,
        command: &str,
        payload: &str,
    ) -> Result<String, CliError> {
        self.text(BridgeRequest::PostControlCommand {
            cluster: key,
            command: command.to_string(),
            payload: payload.to_string(),
        })
        .await
    }

    async fn post_indexing_command(
        &self,
        key: ClusterKey,
        kind: IndexingCommandType,
        data: &str,
    ) -> Result<i64, CliError> {
        let request = BridgeRequest::PostIndexingCommand {
            cluster: key,
            kind,
            data: data.to_string(),
        };
        match self.session.call(request).await? {
            BridgeResponse::Sequence { sn } => Ok(sn),
            other => Err(unexpected(&other)),
        }
    }
}
