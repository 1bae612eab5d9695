//! Command-line argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::default_config_path;
use crate::params::CommandArgs;

/// Breeze cluster administration client.
#[derive(Parser, Debug, Clone)]
#[command(name = "brz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Group id of the target cluster.
    #[arg(short = 'g', long = "group_id", visible_alias = "group-id")]
    pub group_id: String,

    /// Cluster id of the target cluster.
    #[arg(short = 'c', long = "cluster_id", visible_alias = "cluster-id")]
    pub cluster_id: String,

    /// Bridge config file.
    #[arg(long, env = "BREEZE_CONF", default_value_os_t = default_config_path())]
    pub conf: PathBuf,

    /// Command to execute.
    #[arg(long)]
    pub cmd: Option<String>,

    /// Indexing type: add_document, update, conditional_update, delete or
    /// conditional_delete.
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// Schema file for init_cluster.
    #[arg(long)]
    pub schema: Option<String>,

    /// Data file for indexing.
    #[arg(long)]
    pub file: Option<String>,

    /// Directive file for the unnamed control command.
    #[arg(long)]
    pub cdirective: Option<String>,

    /// Source replica id for do_recovery.
    #[arg(long = "from_replica", visible_alias = "from-replica")]
    pub from_replica: Option<String>,

    /// Replica id for recovery commands.
    #[arg(short = 'r', long = "replica_id", visible_alias = "replica-id")]
    pub replica_id: Option<String>,

    /// Analyzer name for analyzer_test.
    #[arg(long = "analyzer_name", visible_alias = "analyzer-name")]
    pub analyzer_name: Option<String>,

    /// Text to analyze for analyzer_test.
    #[arg(long = "analyzer_text", visible_alias = "analyzer-text")]
    pub analyzer_text: Option<String>,

    /// Analyzer options for analyzer_test.
    #[arg(long = "analyzer_option", visible_alias = "analyzer-option")]
    pub analyzer_option: Option<String>,

    /// Load bridge addresses from the contact file.
    #[arg(short = 'a', long)]
    pub addr: bool,

    /// Save bridge addresses to the contact file on success.
    #[arg(short = 's', long = "save_addr", visible_alias = "save-addr")]
    pub save_addr: bool,

    /// Pretty-print JSON results.
    #[arg(short = 'p', long)]
    pub pretty: bool,

    /// Give up waiting for the cluster after this many seconds.
    #[arg(long = "wait-timeout", value_name = "SECS")]
    pub wait_timeout: Option<u64>,
}

impl Cli {
    /// Command parameters, unvalidated.
    #[must_use]
    pub fn command_args(&self) -> CommandArgs {
        CommandArgs {
            cmd: self.cmd.clone(),
            kind: self.kind.clone(),
            schema: self.schema.clone(),
            file: self.file.clone(),
            cdirective: self.cdirective.clone(),
            from_replica: self.from_replica.clone(),
            replica_id: self.replica_id.clone(),
            analyzer_name: self.analyzer_name.clone(),
            analyzer_text: self.analyzer_text.clone(),
            analyzer_option: self.analyzer_option.clone(),
        }
    }

    /// Readiness wait deadline, if any.
    #[must_use]
    pub fn wait_deadline(&self) -> Option<Duration> {
        self.wait_timeout.map(Duration::from_secs)
    }
}
