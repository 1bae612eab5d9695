//! The end-to-end command pipeline.
//!
//! ```text
//! ids → config → Command → [contacts] → Session::open
//!     → wait agent → [wait channel] → call → present → [save contacts] → close
//! ```
//!
//! Everything up to building the [`Command`] is local validation and fails
//! without touching the network. Failures from building the command onward
//! are reported as `can't execute command <cmd>, <cause>`, with `<cmd>` in
//! lower case.

use std::io::Write;
use std::path::Path;

use brz_proto::ClusterKey;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::address_book::{self, ContactList};
use crate::cli::Cli;
use crate::client::BridgeClient;
use crate::config::BridgeConfig;
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::params::to_integer;
use crate::router::{dispatch, Command};
use crate::session::Session;
use crate::topology::{RetryPolicy, TopologyResolver};

/// Run one command as described by `cli`, writing results to `out`.
///
/// `cancel` aborts readiness waits, typically on Ctrl-C.
///
/// # Errors
///
/// Returns the first error of any stage; nothing is saved on failure.
pub async fn run<W: Write>(
    cli: &Cli,
    out: &mut W,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let key = ClusterKey::new(to_integer(&cli.group_id)?, to_integer(&cli.cluster_id)?);
    let config = BridgeConfig::from_file(&cli.conf)?;
    let command = Command::from_args(&cli.command_args()).map_err(|e| match e {
        CliError::MissingCommand => e,
        e => e.in_command(cli.cmd.as_deref().unwrap_or_default().to_lowercase()),
    })?;
    let command_name = command.name().to_string();

    let contact_file = config.contact_file();
    let contacts = if cli.addr {
        address_book::load(&contact_file)?
    } else {
        ContactList::new()
    };

    info!(command = %command_name, cluster = %key, "running command");

    let session = Session::open(&config, &contacts)
        .await
        .map_err(|e| e.in_command(&command_name))?;

    let mut policy = RetryPolicy::forever(config.poll_interval());
    if let Some(deadline) = cli.wait_deadline() {
        policy = policy.with_deadline(deadline);
    }
    let plan = Plan {
        key,
        command: &command,
        policy,
        format: OutputFormat::new(cli.pretty),
        save_to: cli.save_addr.then_some(contact_file.as_path()),
    };
    let result = execute(&session, plan, contacts, out, cancel).await;

    session.close().await;
    result.map_err(|e| e.in_command(command_name))
}

/// Everything `execute` needs besides the session.
struct Plan<'a> {
    key: ClusterKey,
    command: &'a Command,
    policy: RetryPolicy,
    format: OutputFormat,
    save_to: Option<&'a Path>,
}

async fn execute<W: Write>(
    session: &Session,
    plan: Plan<'_>,
    mut contacts: ContactList,
    out: &mut W,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let client = BridgeClient::new(session);
    let mut resolver =
        TopologyResolver::new(&client, plan.key, plan.policy).with_cancellation(cancel);

    let outcome = dispatch(plan.command, &mut resolver).await?;
    debug!(
        agent_polls = resolver.agent().attempts(),
        channel_polls = resolver.channel().attempts(),
        channel_ready = resolver.channel().is_ready(),
        "cluster resolved"
    );
    plan.format.write(out, &outcome)?;

    // Only bridge endpoints go in; agent and channel addresses are not
    // dialable by the session.
    contacts.insert(session.endpoint());

    if let Some(path) = plan.save_to {
        address_book::save(path, &contacts)?;
        debug!(path = %path.display(), count = contacts.len(), "contact list saved");
    }
    Ok(())
}
