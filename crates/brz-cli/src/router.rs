//! Command routing.
//!
//! [`Command::from_args`] validates parameters and loads input files up
//! front; nothing touches the network until a `Command` exists.
//! [`dispatch`] then waits for the cluster's agent (and channel, for
//! indexing) and issues exactly one bridge operation.
//!
//! | command | remote operation | outcome |
//! |---|---|---|
//! | `stat` | `get_status` | text |
//! | `analyzer_test` | `analyzer_test` | text |
//! | `init_cluster` | `init_cluster` | none |
//! | `resume`, `suspend` | control, empty payload | none |
//! | `prepare_recovery[2]`, `do_recovery[2]` | control, JSON payload | text |
//! | `indexing` | `post_indexing_command` | sequence |
//! | `get_schema` | `get_schema` | text |
//! | `warmup` | control, empty payload | text |
//! | empty name | control, directive file as payload | text |
//! | anything else | control, empty payload | text |

use brz_proto::IndexingCommandType;
use serde_json::json;
use tracing::info;

use crate::client::{AnalyzerRequest, BridgeApi};
use crate::error::CliError;
use crate::params::{read_input_file, required, to_integer, CommandArgs};
use crate::topology::{Clock, TopologyResolver};

/// Analyzer used when `--analyzer_name` is not given.
pub const DEFAULT_ANALYZER: &str = "dha_analyzer";

/// Recovery protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryVersion {
    /// `prepare_recovery` / `do_recovery`.
    V1,
    /// `prepare_recovery2` / `do_recovery2`.
    V2,
}

impl RecoveryVersion {
    /// Control command name for the prepare step.
    #[must_use]
    pub const fn prepare_command(self) -> &'static str {
        match self {
            Self::V1 => "prepare_recovery",
            Self::V2 => "prepare_recovery2",
        }
    }

    /// Control command name for the recovery step.
    #[must_use]
    pub const fn recover_command(self) -> &'static str {
        match self {
            Self::V1 => "do_recovery",
            Self::V2 => "do_recovery2",
        }
    }
}

/// A validated operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch cluster status.
    Stat,
    /// Run an analyzer over sample text.
    AnalyzerTest(AnalyzerRequest),
    /// Initialize the cluster with a schema.
    InitCluster {
        /// Schema file content.
        schema: String,
    },
    /// Resume a suspended cluster.
    Resume,
    /// Suspend the cluster.
    Suspend,
    /// Prepare a replica for recovery.
    PrepareRecovery {
        /// Protocol generation.
        version: RecoveryVersion,
        /// Replica to prepare.
        replica_id: u32,
    },
    /// Recover one replica from another.
    DoRecovery {
        /// Protocol generation.
        version: RecoveryVersion,
        /// Source replica.
        from_replica: u32,
        /// Target replica.
        replica_id: u32,
    },
    /// Submit indexing content.
    Indexing {
        /// Indexing operation.
        kind: IndexingCommandType,
        /// Data file content.
        data: String,
    },
    /// Fetch the cluster schema.
    GetSchema,
    /// Warm the cluster's caches.
    Warmup,
    /// Unnamed control command carrying a directive file.
    Directive {
        /// Directive file content.
        content: String,
    },
    /// Any other control command, sent with an empty payload.
    Control {
        /// Lower-cased command name.
        name: String,
    },
}

impl Command {
    /// Build a command from raw parameters.
    ///
    /// Command names are matched case-insensitively. Every parameter is
    /// checked and every input file read here.
    ///
    /// # Errors
    ///
    /// [`CliError::MissingCommand`] without `--cmd`,
    /// [`CliError::MissingParameter`] when a required value is absent,
    /// [`CliError::Conversion`] / [`CliError::Validation`] when one is
    /// invalid and [`CliError::FileAccess`] when an input file can't be read.
    pub fn from_args(args: &CommandArgs) -> Result<Self, CliError> {
        let name = args.cmd.as_deref().ok_or(CliError::MissingCommand)?.to_lowercase();

        let command = match name.as_str() {
            "stat" => Self::Stat,
            "analyzer_test" => {
                let text = required(args.analyzer_text.as_deref(), "analyzer_text")?;
                if text.is_empty() {
                    return Err(CliError::Validation("analyzer_text must not be empty".into()));
                }
                Self::AnalyzerTest(AnalyzerRequest {
                    name: args
                        .analyzer_name
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ANALYZER.to_string()),
                    text: text.to_string(),
                    option: args.analyzer_option.clone().unwrap_or_default(),
                })
            }
            "init_cluster" => Self::InitCluster {
                schema: read_input_file(required(args.schema.as_deref(), "schema")?)?,
            },
            "resume" => Self::Resume,
            "suspend" => Self::Suspend,
            "prepare_recovery" | "prepare_recovery2" => Self::PrepareRecovery {
                version: recovery_version(&name),
                replica_id: to_integer(required(args.replica_id.as_deref(), "replica_id")?)?,
            },
            "do_recovery" | "do_recovery2" => Self::DoRecovery {
                version: recovery_version(&name),
                from_replica: to_integer(required(args.from_replica.as_deref(), "from_replica")?)?,
                replica_id: to_integer(required(args.replica_id.as_deref(), "replica_id")?)?,
            },
            "indexing" => {
                let kind: IndexingCommandType = required(args.kind.as_deref(), "type")?.parse()?;
                Self::Indexing {
                    kind,
                    data: read_input_file(required(args.file.as_deref(), "file")?)?,
                }
            }
            "get_schema" => Self::GetSchema,
            "warmup" => Self::Warmup,
            "" => Self::Directive {
                content: read_input_file(required(args.cdirective.as_deref(), "cdirective")?)?,
            },
            _ => Self::Control { name },
        };
        Ok(command)
    }

    /// Name used in logs and error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Stat => "stat",
            Self::AnalyzerTest(_) => "analyzer_test",
            Self::InitCluster { .. } => "init_cluster",
            Self::Resume => "resume",
            Self::Suspend => "suspend",
            Self::PrepareRecovery { version, .. } => version.prepare_command(),
            Self::DoRecovery { version, .. } => version.recover_command(),
            Self::Indexing { .. } => "indexing",
            Self::GetSchema => "get_schema",
            Self::Warmup => "warmup",
            Self::Directive { .. } => "",
            Self::Control { name } => name,
        }
    }

    /// Whether the command needs the cluster's channel as well as its agent.
    #[must_use]
    pub const fn needs_channel(&self) -> bool {
        matches!(self, Self::Indexing { .. })
    }
}

fn recovery_version(name: &str) -> RecoveryVersion {
    if name.ends_with('2') {
        RecoveryVersion::V2
    } else {
        RecoveryVersion::V1
    }
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing to print.
    None,
    /// Text returned by the cluster.
    Text(String),
    /// Sequence number assigned to submitted content.
    Sequence(i64),
}

/// Wait for readiness, then issue the command's bridge operation.
///
/// # Errors
///
/// Readiness wait errors and bridge errors are returned unchanged.
pub async fn dispatch<A, C>(
    command: &Command,
    resolver: &mut TopologyResolver<'_, A, C>,
) -> Result<CommandOutcome, CliError>
where
    A: BridgeApi,
    C: Clock,
{
    resolver.wait_for_agent_ready().await?;
    if command.needs_channel() {
        resolver.wait_for_channel_ready().await?;
    }

    let api = resolver.api();
    let key = resolver.key();
    info!(command = command.name(), cluster = %key, "dispatching");

    let outcome = match command {
        Command::Stat => CommandOutcome::Text(api.get_status(key).await?),
        Command::AnalyzerTest(request) => {
            CommandOutcome::Text(api.analyzer_test(key, request).await?)
        }
        Command::InitCluster { schema } => {
            api.init_cluster(key, schema).await?;
            CommandOutcome::None
        }
        Command::Resume | Command::Suspend => {
            api.post_control_command(key, command.name(), "").await?;
            CommandOutcome::None
        }
        Command::PrepareRecovery {
            version,
            replica_id,
        } => {
            let payload = json!({ "replica_id": replica_id.to_string() }).to_string();
            CommandOutcome::Text(
                api.post_control_command(key, version.prepare_command(), &payload)
                    .await?,
            )
        }
        Command::DoRecovery {
            version,
            from_replica,
            replica_id,
        } => {
            let payload = json!({
                "src_replica_id": from_replica.to_string(),
                "dst_replica_id": replica_id.to_string(),
            })
            .to_string();
            CommandOutcome::Text(
                api.post_control_command(key, version.recover_command(), &payload)
                    .await?,
            )
        }
        Command::Indexing { kind, data } => {
            CommandOutcome::Sequence(api.post_indexing_command(key, *kind, data).await?)
        }
        Command::GetSchema => CommandOutcome::Text(api.get_schema(key).await?),
        Command::Warmup | Command::Control { .. } => {
            CommandOutcome::Text(api.post_control_command(key, command.name(), "").await?)
        }
        Command::Directive { content } => {
            CommandOutcome::Text(api.post_control_command(key, "", content).await?)
        }
    };
    Ok(outcome)
}
