//! Cluster topology readiness.
//!
//! Before a command can be issued the bridge must know the cluster's agent,
//! and before indexing content can be submitted it must also know the
//! cluster's channel. Each of those is a [`ReadinessGate`]: a two-state
//! machine (`Unresolved → Ready`) driven by polling a lookup.
//!
//! Polling follows a [`RetryPolicy`]: a fixed interval with no backoff and,
//! by default, no limit. A deadline turns the wait into a
//! [`CliError::Timeout`], and a cancelled token into
//! [`CliError::Cancelled`]. Sleeping and time go through a [`Clock`] so tests
//! can drive the loop without waiting.

use std::future::Future;
use std::time::Duration;

use brz_proto::ClusterKey;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{BridgeApi, Located};
use crate::error::CliError;

/// Source of time and sleep for readiness polling.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Sleep for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// [`Clock`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How readiness polls are repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between polls.
    pub interval: Duration,
    /// Give up once this much time has passed (None = wait forever).
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// Poll every `interval`, forever.
    #[must_use]
    pub const fn forever(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Give up after `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check whether another poll is allowed after `elapsed`.
    #[must_use]
    pub fn should_retry(&self, elapsed: Duration) -> bool {
        match self.deadline {
            Some(deadline) => elapsed < deadline,
            None => true,
        }
    }
}

/// What a gate waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A registered managing agent.
    Agent,
    /// A reachable network channel.
    Channel,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// State of a readiness gate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GateState {
    /// Not observed ready yet.
    Unresolved,
    /// Observed ready.
    Ready(Located),
}

/// One `Unresolved → Ready` gate for a cluster.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    target: Target,
    key: ClusterKey,
    state: GateState,
    attempts: u32,
}

impl ReadinessGate {
    /// Create an unresolved gate.
    #[must_use]
    pub const fn new(target: Target, key: ClusterKey) -> Self {
        Self {
            target,
            key,
            state: GateState::Unresolved,
            attempts: 0,
        }
    }

    /// Whether the gate has been observed ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, GateState::Ready(_))
    }

    /// Number of polls performed so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    fn describe(&self) -> String {
        format!("{} for cluster {}", self.target, self.key)
    }

    /// Poll `probe` until it reports ready.
    ///
    /// `probe` returning [`CliError::NotReady`] means "try again"; any other
    /// error ends the wait. A gate that is already ready returns at once.
    pub async fn wait<C, F, Fut>(
        &mut self,
        policy: &RetryPolicy,
        clock: &C,
        cancel: &CancellationToken,
        mut probe: F,
    ) -> Result<Located, CliError>
    where
        C: Clock,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Located, CliError>>,
    {
        if let GateState::Ready(located) = &self.state {
            return Ok(located.clone());
        }

        let started = clock.now();
        loop {
            if cancel.is_cancelled() {
                return Err(CliError::Cancelled(self.describe()));
            }

            self.attempts += 1;
            match probe().await {
                Ok(located) => {
                    info!(
                        gate = %self.target,
                        cluster = %self.key,
                        attempts = self.attempts,
                        address = located.address.as_deref().unwrap_or("-"),
                        "ready"
                    );
                    self.state = GateState::Ready(located.clone());
                    return Ok(located);
                }
                Err(CliError::NotReady(_)) => {
                    debug!(gate = %self.target, cluster = %self.key, attempt = self.attempts, "not ready yet");
                }
                Err(e) => return Err(e),
            }

            if !policy.should_retry(clock.now().duration_since(started)) {
                return Err(CliError::Timeout(self.describe()));
            }

            tokio::select! {
                () = cancel.cancelled() => return Err(CliError::Cancelled(self.describe())),
                () = clock.sleep(policy.interval) => {}
            }
        }
    }
}

/// Readiness gates for one cluster, polled through a [`BridgeApi`].
#[derive(Debug)]
pub struct TopologyResolver<'a, A, C = TokioClock> {
    api: &'a A,
    key: ClusterKey,
    policy: RetryPolicy,
    clock: C,
    cancel: CancellationToken,
    agent: ReadinessGate,
    channel: ReadinessGate,
}

impl<'a, A: BridgeApi> TopologyResolver<'a, A> {
    /// Create a resolver using the tokio clock.
    #[must_use]
    pub fn new(api: &'a A, key: ClusterKey, policy: RetryPolicy) -> Self {
        Self::with_clock(api, key, policy, TokioClock)
    }
}

impl<'a, A: BridgeApi, C: Clock> TopologyResolver<'a, A, C> {
    /// Create a resolver with an explicit clock.
    #[must_use]
    pub fn with_clock(api: &'a A, key: ClusterKey, policy: RetryPolicy, clock: C) -> Self {
        Self {
            api,
            key,
            policy,
            clock,
            cancel: CancellationToken::new(),
            agent: ReadinessGate::new(Target::Agent, key),
            channel: ReadinessGate::new(Target::Channel, key),
        }
    }

    /// Abort waits when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The bridge operations this resolver polls.
    #[must_use]
    pub const fn api(&self) -> &'a A {
        self.api
    }

    /// The cluster this resolver gates.
    #[must_use]
    pub const fn key(&self) -> ClusterKey {
        self.key
    }

    /// The agent gate.
    #[must_use]
    pub const fn agent(&self) -> &ReadinessGate {
        &self.agent
    }

    /// The channel gate.
    #[must_use]
    pub const fn channel(&self) -> &ReadinessGate {
        &self.channel
    }

    /// Block until the cluster's agent is registered.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Timeout`] or [`CliError::Cancelled`] when the
    /// policy or token end the wait, or the lookup's own error.
    pub async fn wait_for_agent_ready(&mut self) -> Result<Located, CliError> {
        let api = self.api;
        let key = self.key;
        self.agent
            .wait(&self.policy, &self.clock, &self.cancel, || async move {
                api.find_agent(key)
                    .await?
                    .ok_or_else(|| CliError::NotReady(format!("agent for cluster {key}")))
            })
            .await
    }

    /// Block until the cluster's channel is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Timeout`] or [`CliError::Cancelled`] when the
    /// policy or token end the wait, or the lookup's own error.
    pub async fn wait_for_channel_ready(&mut self) -> Result<Located, CliError> {
        let api = self.api;
        let key = self.key;
        self.channel
            .wait(&self.policy, &self.clock, &self.cancel, || async move {
                api.find_channel(key)
                    .await?
                    .ok_or_else(|| CliError::NotReady(format!("channel for cluster {key}")))
            })
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::clock::FakeClock;
    use super::*;
    use crate::client::fake::{Call, FakeBridge};

    fn key() -> ClusterKey {
        ClusterKey::new(1, 2)
    }

    #[test]
    fn retry_policy_default_waits_forever() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert!(policy.should_retry(Duration::from_secs(1_000_000)));
    }

    #[test]
    fn retry_policy_with_deadline() {
        let policy = RetryPolicy::forever(Duration::from_millis(100))
            .with_deadline(Duration::from_secs(1));
        assert!(policy.should_retry(Duration::from_millis(999)));
        assert!(!policy.should_retry(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn agent_ready_on_first_poll() {
        let bridge = FakeBridge::new();
        let clock = FakeClock::new();
        let mut resolver =
            TopologyResolver::with_clock(&bridge, key(), RetryPolicy::default(), clock);

        let located = resolver.wait_for_agent_ready().await.expect("ready");
        assert_eq!(located.address.as_deref(), Some("ws://agent:7402"));
        assert_eq!(resolver.agent().attempts(), 1);
        assert!(resolver.agent().is_ready());
        assert!(!resolver.channel().is_ready());
    }

    #[tokio::test]
    async fn agent_wait_polls_until_ready() {
        let misses = 4;
        let bridge = FakeBridge::new().with_agent_misses(misses);
        let mut resolver = TopologyResolver::with_clock(
            &bridge,
            key(),
            RetryPolicy::default(),
            FakeClock::new(),
        );

        resolver.wait_for_agent_ready().await.expect("ready");

        assert!(resolver.agent().attempts() > misses);
        assert_eq!(resolver.agent().attempts(), misses + 1);
        assert_eq!(bridge.calls(), vec![Call::FindAgent(key()); 5]);
        assert_eq!(resolver.clock.sleeps(), misses);
    }

    #[tokio::test]
    async fn ready_gate_does_not_poll_again() {
        let bridge = FakeBridge::new();
        let mut resolver = TopologyResolver::with_clock(
            &bridge,
            key(),
            RetryPolicy::default(),
            FakeClock::new(),
        );

        resolver.wait_for_agent_ready().await.expect("ready");
        resolver.wait_for_agent_ready().await.expect("still ready");
        assert_eq!(bridge.calls().len(), 1);
    }

    #[tokio::test]
    async fn channel_wait_is_independent_of_agent() {
        let bridge = FakeBridge::new().with_channel_misses(2);
        let mut resolver = TopologyResolver::with_clock(
            &bridge,
            key(),
            RetryPolicy::default(),
            FakeClock::new(),
        );

        resolver.wait_for_agent_ready().await.expect("agent");
        let located = resolver.wait_for_channel_ready().await.expect("channel");

        assert_eq!(located.address.as_deref(), Some("ws://channel:7401"));
        assert_eq!(resolver.agent().attempts(), 1);
        assert_eq!(resolver.channel().attempts(), 3);
    }

    #[tokio::test]
    async fn deadline_turns_into_timeout() {
        let bridge = FakeBridge::new().with_agent_misses(u32::MAX);
        let policy =
            RetryPolicy::forever(Duration::from_secs(1)).with_deadline(Duration::from_secs(3));
        let mut resolver =
            TopologyResolver::with_clock(&bridge, key(), policy, FakeClock::new());

        let err = resolver.wait_for_agent_ready().await.unwrap_err();
        assert!(matches!(err, CliError::Timeout(_)));
        assert!(err.to_string().contains("agent for cluster 1:2"));
        // Polls at t = 0, 1, 2, 3.
        assert_eq!(resolver.agent().attempts(), 4);
        assert!(!resolver.agent().is_ready());
    }

    #[tokio::test]
    async fn cancelled_token_ends_wait() {
        let bridge = FakeBridge::new().with_agent_misses(u32::MAX);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut resolver = TopologyResolver::with_clock(
            &bridge,
            key(),
            RetryPolicy::default(),
            FakeClock::new(),
        )
        .with_cancellation(cancel);

        let err = resolver.wait_for_agent_ready().await.unwrap_err();
        assert!(matches!(err, CliError::Cancelled(_)));
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let bridge = FakeBridge::new().with_channel_misses(u32::MAX);
        let cancel = CancellationToken::new();
        let mut resolver = TopologyResolver::new(
            &bridge,
            key(),
            RetryPolicy::forever(Duration::from_secs(3600)),
        )
        .with_cancellation(cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            cancel.cancel();
        });

        let err = resolver.wait_for_channel_ready().await.unwrap_err();
        assert!(matches!(err, CliError::Cancelled(_)));
        assert_eq!(resolver.channel().attempts(), 1);
        canceller.await.expect("canceller");
    }

    #[tokio::test]
    async fn lookup_errors_are_not_retried() {
        let clock = FakeClock::new();
        let mut gate = ReadinessGate::new(Target::Agent, key());
        let mut polls = 0;

        let err = gate
            .wait(&RetryPolicy::default(), &clock, &CancellationToken::new(), || {
                polls += 1;
                async { Err(CliError::Connection("bridge gone".into())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Connection(_)));
        assert_eq!(polls, 1);
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn target_display() {
        assert_eq!(Target::Agent.to_string(), "agent");
        assert_eq!(Target::Channel.to_string(), "channel");
    }
}
