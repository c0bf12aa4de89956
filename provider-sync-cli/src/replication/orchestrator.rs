//! Replication run sequencing
//!
//! One linear pass per run:
//! fetch source → fetch destination → evaluate → (empty: done) or
//! report → confirm → (declined: aborted) or apply → done.
//! Nothing is retried and nothing applied is rolled back. Concurrent runs
//! against the same destination are not coordinated; the last register or
//! unregister call for a namespace wins.

use std::fmt;

use async_trait::async_trait;

use super::delta::{RegistrationDelta, action_label};
use super::error::{ReplicationError, ReplicationResult};
use super::snapshot::RegistrationSnapshot;
use super::strategy::{ReplicationStrategy, evaluate};
use super::validation::{ReplicationRequest, SubscriptionId};

pub const NO_DELTA_MESSAGE: &str = "No delta found between subscriptions.";
pub const CONFIRM_PROMPT: &str = "Enter 'yes' to proceed";
pub const ABORT_MESSAGE: &str = "Aborting!";
pub const COMPLETE_MESSAGE: &str = "Provider registration edits complete. Providers may take minutes or longer to register, monitor progress through the Azure console.";

/// A resolved subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub display_name: String,
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.display_name)
    }
}

/// Provider management backend
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// Resolve an identifier; fails for unknown or inaccessible subscriptions
    async fn lookup_subscription(&self, id: &SubscriptionId) -> anyhow::Result<SubscriptionHandle>;

    /// Complete current registration state, transitional states already collapsed
    async fn fetch_registration_snapshot(
        &self,
        subscription: &SubscriptionHandle,
    ) -> anyhow::Result<RegistrationSnapshot>;

    /// Register (`true`) or unregister (`false`) one namespace
    ///
    /// Returns once the request is accepted, not when the provider converges.
    async fn set_registration(
        &self,
        subscription: &SubscriptionHandle,
        namespace: &str,
        desired: bool,
    ) -> anyhow::Result<()>;
}

/// The person running the tool
pub trait Operator {
    fn present(&mut self, text: &str);

    /// Block until one line of input arrives
    fn read_confirmation(&mut self, prompt: &str) -> anyhow::Result<String>;
}

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationOutcome {
    NoChanges,
    Aborted { pending: usize },
    Applied { registered: usize, unregistered: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FetchSource,
    FetchDestination,
    Evaluate,
    Report,
    Confirm,
    Apply,
    Done,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::FetchSource => "fetch-source",
            Phase::FetchDestination => "fetch-destination",
            Phase::Evaluate => "evaluate",
            Phase::Report => "report",
            Phase::Confirm => "confirm",
            Phase::Apply => "apply",
            Phase::Done => "done",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

fn enter(phase: Phase) {
    log::debug!("Replication phase: {}", phase);
}

/// Only an exact `yes`, ignoring case and surrounding whitespace, confirms
pub fn is_confirmed(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("yes")
}

/// Resolve both subscriptions, then replicate
pub async fn run<R, O>(
    registry: &R,
    operator: &mut O,
    request: &ReplicationRequest,
) -> ReplicationResult<ReplicationOutcome>
where
    R: ProviderRegistry + ?Sized,
    O: Operator + ?Sized,
{
    let source = lookup(registry, &request.source).await?;
    let destination = lookup(registry, &request.destination).await?;

    log::info!(
        "Replicating providers from {} to {} using {} strategy",
        source,
        destination,
        request.strategy
    );

    replicate(registry, operator, &source, &destination, request.strategy).await
}

async fn lookup<R>(registry: &R, id: &SubscriptionId) -> ReplicationResult<SubscriptionHandle>
where
    R: ProviderRegistry + ?Sized,
{
    registry
        .lookup_subscription(id)
        .await
        .map_err(|source| ReplicationError::Lookup {
            subscription: id.to_string(),
            source,
        })
}

async fn fetch<R>(
    registry: &R,
    subscription: &SubscriptionHandle,
) -> ReplicationResult<RegistrationSnapshot>
where
    R: ProviderRegistry + ?Sized,
{
    let snapshot = registry
        .fetch_registration_snapshot(subscription)
        .await
        .map_err(|source| ReplicationError::Fetch {
            subscription: subscription.to_string(),
            source,
        })?;

    log::info!(
        "{}: {} providers, {} registered",
        subscription,
        snapshot.len(),
        snapshot.registered_count()
    );
    Ok(snapshot)
}

/// Replicate registrations from `source` onto `destination`
pub async fn replicate<R, O>(
    registry: &R,
    operator: &mut O,
    source: &SubscriptionHandle,
    destination: &SubscriptionHandle,
    strategy: ReplicationStrategy,
) -> ReplicationResult<ReplicationOutcome>
where
    R: ProviderRegistry + ?Sized,
    O: Operator + ?Sized,
{
    enter(Phase::FetchSource);
    let source_snapshot = fetch(registry, source).await?;

    enter(Phase::FetchDestination);
    let destination_snapshot = fetch(registry, destination).await?;

    enter(Phase::Evaluate);
    let delta = evaluate(&source_snapshot, &destination_snapshot, strategy);
    if delta.is_empty() {
        operator.present(NO_DELTA_MESSAGE);
        enter(Phase::Done);
        return Ok(ReplicationOutcome::NoChanges);
    }

    enter(Phase::Report);
    operator.present(&format!(
        "The following changes will be made to subscription {}:",
        destination
    ));
    operator.present(&delta.report());

    enter(Phase::Confirm);
    let answer = operator
        .read_confirmation(CONFIRM_PROMPT)
        .map_err(ReplicationError::Prompt)?;
    if !is_confirmed(&answer) {
        operator.present(ABORT_MESSAGE);
        enter(Phase::Aborted);
        return Ok(ReplicationOutcome::Aborted {
            pending: delta.len(),
        });
    }

    enter(Phase::Apply);
    apply(registry, operator, destination, &delta).await?;
    operator.present(COMPLETE_MESSAGE);

    enter(Phase::Done);
    Ok(ReplicationOutcome::Applied {
        registered: delta.registrations(),
        unregistered: delta.unregistrations(),
    })
}

/// Apply each change once, stopping at the first failure
async fn apply<R, O>(
    registry: &R,
    operator: &mut O,
    destination: &SubscriptionHandle,
    delta: &RegistrationDelta,
) -> ReplicationResult<()>
where
    R: ProviderRegistry + ?Sized,
    O: Operator + ?Sized,
{
    let mut applied = Vec::with_capacity(delta.len());

    for (namespace, desired) in delta.iter() {
        if let Err(source) = registry.set_registration(destination, namespace, desired).await {
            log::error!(
                "Applying {} to {} failed after {} change(s)",
                namespace,
                destination,
                applied.len()
            );
            return Err(ReplicationError::Apply {
                namespace: namespace.to_string(),
                applied,
                source,
            });
        }

        let verb = if desired { "Registering" } else { "Unregistering" };
        operator.present(&format!("{} {} in {}", verb, namespace, destination));
        log::info!("{} {} on {}", action_label(desired), namespace, destination.id);
        applied.push(namespace.to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    const SOURCE: &str = "8f14e45f-ceea-467f-a0e6-7b4c3b8e2d11";
    const DESTINATION: &str = "c9f0f895-fb98-4b91-9d4e-2a1f6c0b7e35";

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Lookup(String),
        Fetch(String),
        Set(String, bool),
    }

    #[derive(Default)]
    struct FakeRegistry {
        subscriptions: HashMap<SubscriptionId, (String, Vec<(&'static str, bool)>)>,
        fail_on: Option<&'static str>,
        fail_fetch: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeRegistry {
        fn new(source: &[(&'static str, bool)], destination: &[(&'static str, bool)]) -> Self {
            let mut subscriptions = HashMap::new();
            subscriptions.insert(id(SOURCE), ("Source".to_string(), source.to_vec()));
            subscriptions.insert(id(DESTINATION), ("Destination".to_string(), destination.to_vec()));
            Self {
                subscriptions,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn set_calls(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| matches!(c, Call::Set(..)))
                .collect()
        }
    }

    #[async_trait]
    impl ProviderRegistry for FakeRegistry {
        async fn lookup_subscription(&self, id: &SubscriptionId) -> anyhow::Result<SubscriptionHandle> {
            self.calls.lock().unwrap().push(Call::Lookup(id.to_string()));
            let (name, _) = self
                .subscriptions
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("SubscriptionNotFound: {}", id))?;
            Ok(SubscriptionHandle {
                id: *id,
                display_name: name.clone(),
            })
        }

        async fn fetch_registration_snapshot(
            &self,
            subscription: &SubscriptionHandle,
        ) -> anyhow::Result<RegistrationSnapshot> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Fetch(subscription.display_name.clone()));
            if self.fail_fetch {
                anyhow::bail!("AuthorizationFailed");
            }
            let (_, providers) = &self.subscriptions[&subscription.id];
            Ok(providers.iter().copied().collect())
        }

        async fn set_registration(
            &self,
            _subscription: &SubscriptionHandle,
            namespace: &str,
            desired: bool,
        ) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Set(namespace.to_string(), desired));
            if self.fail_on == Some(namespace) {
                anyhow::bail!("Conflict while registering {}", namespace);
            }
            Ok(())
        }
    }

    struct ScriptedOperator {
        replies: VecDeque<String>,
        output: Vec<String>,
        prompts: usize,
    }

    impl ScriptedOperator {
        fn replying(reply: &str) -> Self {
            Self {
                replies: VecDeque::from(vec![reply.to_string()]),
                output: Vec::new(),
                prompts: 0,
            }
        }

        fn silent() -> Self {
            Self {
                replies: VecDeque::new(),
                output: Vec::new(),
                prompts: 0,
            }
        }
    }

    impl Operator for ScriptedOperator {
        fn present(&mut self, text: &str) {
            self.output.push(text.to_string());
        }

        fn read_confirmation(&mut self, _prompt: &str) -> anyhow::Result<String> {
            self.prompts += 1;
            self.replies
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("unexpected end of input"))
        }
    }

    fn id(value: &str) -> SubscriptionId {
        SubscriptionId::parse(value).unwrap()
    }

    fn request(strategy: ReplicationStrategy) -> ReplicationRequest {
        ReplicationRequest {
            source: id(SOURCE),
            destination: id(DESTINATION),
            strategy,
        }
    }

    #[tokio::test]
    async fn test_empty_delta_skips_report_prompt_and_apply() {
        let registry = FakeRegistry::new(
            &[("A", true), ("B", false), ("OnlySource", true)],
            &[("A", true), ("B", false), ("OnlyDest", true)],
        );
        let mut operator = ScriptedOperator::silent();

        let outcome = run(&registry, &mut operator, &request(ReplicationStrategy::Sync))
            .await
            .unwrap();

        assert_eq!(outcome, ReplicationOutcome::NoChanges);
        assert_eq!(operator.prompts, 0);
        assert_eq!(operator.output, vec![NO_DELTA_MESSAGE.to_string()]);
        assert!(registry.set_calls().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_run_applies_each_change_once() {
        let registry = FakeRegistry::new(
            &[("Microsoft.Compute", true), ("Microsoft.Web", false), ("Microsoft.Sql", true)],
            &[("Microsoft.Compute", false), ("Microsoft.Web", true), ("Microsoft.Sql", false)],
        );
        let mut operator = ScriptedOperator::replying("  YES \n");

        let outcome = run(&registry, &mut operator, &request(ReplicationStrategy::Sync))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReplicationOutcome::Applied {
                registered: 2,
                unregistered: 1
            }
        );
        assert_eq!(
            registry.calls(),
            vec![
                Call::Lookup(SOURCE.to_string()),
                Call::Lookup(DESTINATION.to_string()),
                Call::Fetch("Source".to_string()),
                Call::Fetch("Destination".to_string()),
                Call::Set("Microsoft.Compute".to_string(), true),
                Call::Set("Microsoft.Sql".to_string(), true),
                Call::Set("Microsoft.Web".to_string(), false),
            ]
        );
        assert_eq!(operator.output.last().unwrap(), COMPLETE_MESSAGE);
    }

    #[tokio::test]
    async fn test_report_precedes_prompt() {
        let registry = FakeRegistry::new(&[("X", true)], &[("X", false)]);
        let mut operator = ScriptedOperator::replying("no");

        run(&registry, &mut operator, &request(ReplicationStrategy::Echo))
            .await
            .unwrap();

        assert_eq!(
            operator.output[0],
            format!(
                "The following changes will be made to subscription {} (Destination):",
                DESTINATION
            )
        );
        assert_eq!(operator.output[1], format!("{:<6} => Register", "X"));
        assert_eq!(operator.output[2], ABORT_MESSAGE);
        assert_eq!(operator.prompts, 1);
    }

    #[tokio::test]
    async fn test_declined_confirmation_aborts_without_applying() {
        for reply in ["", "y", "yes please", "no"] {
            let registry = FakeRegistry::new(&[("X", false)], &[("X", true)]);
            let mut operator = ScriptedOperator::replying(reply);

            let outcome = run(&registry, &mut operator, &request(ReplicationStrategy::Sync))
                .await
                .unwrap();

            assert_eq!(outcome, ReplicationOutcome::Aborted { pending: 1 });
            assert!(registry.set_calls().is_empty(), "reply {:?} applied changes", reply);
        }
    }

    #[tokio::test]
    async fn test_echo_never_unregisters() {
        let registry = FakeRegistry::new(&[("X", false)], &[("X", true)]);
        let mut operator = ScriptedOperator::silent();

        let outcome = run(&registry, &mut operator, &request(ReplicationStrategy::Echo))
            .await
            .unwrap();

        assert_eq!(outcome, ReplicationOutcome::NoChanges);
    }

    #[tokio::test]
    async fn test_apply_failure_stops_without_rollback() {
        let mut registry = FakeRegistry::new(
            &[("A", true), ("B", true), ("C", true)],
            &[("A", false), ("B", false), ("C", false)],
        );
        registry.fail_on = Some("B");
        let mut operator = ScriptedOperator::replying("yes");

        let err = run(&registry, &mut operator, &request(ReplicationStrategy::Echo))
            .await
            .unwrap_err();

        match err {
            ReplicationError::Apply {
                namespace, applied, ..
            } => {
                assert_eq!(namespace, "B");
                assert_eq!(applied, vec!["A".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            registry.set_calls(),
            vec![Call::Set("A".to_string(), true), Call::Set("B".to_string(), true)]
        );
        assert!(!operator.output.iter().any(|line| line == COMPLETE_MESSAGE));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fatal() {
        let mut registry = FakeRegistry::new(&[], &[]);
        registry.subscriptions.remove(&id(DESTINATION));
        let mut operator = ScriptedOperator::silent();

        let err = run(&registry, &mut operator, &request(ReplicationStrategy::Echo))
            .await
            .unwrap_err();

        assert!(matches!(&err, ReplicationError::Lookup { subscription, .. } if subscription == DESTINATION));
        assert!(!registry.calls().iter().any(|c| matches!(c, Call::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let mut registry = FakeRegistry::new(&[("X", true)], &[("X", false)]);
        registry.fail_fetch = true;
        let mut operator = ScriptedOperator::silent();

        let err = run(&registry, &mut operator, &request(ReplicationStrategy::Echo))
            .await
            .unwrap_err();

        assert!(matches!(err, ReplicationError::Fetch { .. }));
        assert_eq!(operator.prompts, 0);
    }

    #[tokio::test]
    async fn test_prompt_failure_surfaces() {
        let registry = FakeRegistry::new(&[("X", true)], &[("X", false)]);
        let mut operator = ScriptedOperator::silent();

        let err = run(&registry, &mut operator, &request(ReplicationStrategy::Echo))
            .await
            .unwrap_err();

        assert!(matches!(err, ReplicationError::Prompt(_)));
        assert!(registry.set_calls().is_empty());
    }

    #[test]
    fn test_is_confirmed() {
        assert!(is_confirmed("yes"));
        assert!(is_confirmed(" Yes\n"));
        assert!(is_confirmed("YES"));
        assert!(!is_confirmed(""));
        assert!(!is_confirmed("y"));
        assert!(!is_confirmed("yes!"));
    }
}
