//! Session gate - membership check in front of every ledger action

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::MembershipError;
use crate::domain::entities::{ForceJoinDirective, RequiredGroup};
use crate::domain::traits::MembershipOracle;

/// Membership state computed for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Blocked,
    Allowed,
}

/// Result of a guarded action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Allowed(T),
    ForceJoin(ForceJoinDirective),
}

pub struct SessionGate {
    oracle: Arc<dyn MembershipOracle>,
    groups: Vec<RequiredGroup>,
    timeout: Duration,
}

impl SessionGate {
    pub fn new(oracle: Arc<dyn MembershipOracle>, groups: Vec<RequiredGroup>, timeout: Duration) -> Self {
        if groups.is_empty() {
            tracing::warn!("No required groups configured, every user will be allowed");
        }
        Self { oracle, groups, timeout }
    }

    /// Query the oracle for every required group.
    ///
    /// Any negative answer, oracle error or timeout resolves to `Blocked`.
    /// Nothing is cached between calls.
    pub async fn evaluate(&self, user_id: &str) -> GateState {
        for group in &self.groups {
            match self.check(user_id, group).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("User {} is not a member of {}", user_id, group.username);
                    return GateState::Blocked;
                }
                Err(e) => {
                    tracing::warn!("Membership check for {} in {} failed: {}", user_id, group.username, e);
                    return GateState::Blocked;
                }
            }
        }
        GateState::Allowed
    }

    /// One bounded oracle query
    async fn check(&self, user_id: &str, group: &RequiredGroup) -> Result<bool, MembershipError> {
        tokio::time::timeout(self.timeout, self.oracle.check_membership(user_id, group))
            .await
            .map_err(|_| MembershipError::Timeout(self.timeout))?
    }

    pub fn force_join(&self) -> ForceJoinDirective {
        ForceJoinDirective {
            groups: self.groups.clone(),
        }
    }

    /// Run `action` only when the user is currently allowed
    pub async fn guard<T, E, F, Fut>(&self, user_id: &str, action: F) -> Result<Gated<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.evaluate(user_id).await {
            GateState::Blocked => Ok(Gated::ForceJoin(self.force_join())),
            GateState::Allowed => action().await.map(Gated::Allowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Answer {
        Member,
        NotMember,
        Fail,
        Hang,
    }

    /// Oracle answering per group handle
    struct ScriptedOracle {
        answers: HashMap<String, Answer>,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(answers: Vec<(&str, Answer)>) -> Self {
            Self {
                answers: answers.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MembershipOracle for ScriptedOracle {
        async fn check_membership(&self, _user_id: &str, group: &RequiredGroup) -> Result<bool, MembershipError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.get(&group.username) {
                Some(Answer::Member) => Ok(true),
                Some(Answer::NotMember) | None => Ok(false),
                Some(Answer::Fail) => Err(MembershipError::Api("Bad Request: member list is inaccessible".into())),
                Some(Answer::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(true)
                }
            }
        }
    }

    fn groups() -> Vec<RequiredGroup> {
        vec![
            RequiredGroup::new("Channel 1", "@one"),
            RequiredGroup::new("Channel 2", "@two"),
            RequiredGroup::new("Channel 3", "@three"),
        ]
    }

    fn gate(oracle: Arc<ScriptedOracle>) -> SessionGate {
        SessionGate::new(oracle, groups(), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_all_members_allowed() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ("@one", Answer::Member),
            ("@two", Answer::Member),
            ("@three", Answer::Member),
        ]));
        assert_eq!(gate(oracle.clone()).evaluate("u").await, GateState::Allowed);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_single_oracle_failure_blocks() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ("@one", Answer::Member),
            ("@two", Answer::Fail),
            ("@three", Answer::Member),
        ]));
        assert_eq!(gate(oracle).evaluate("u").await, GateState::Blocked);
    }

    #[tokio::test]
    async fn test_missing_membership_blocks() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ("@one", Answer::Member),
            ("@two", Answer::Member),
            ("@three", Answer::NotMember),
        ]));
        assert_eq!(gate(oracle).evaluate("u").await, GateState::Blocked);
    }

    #[tokio::test]
    async fn test_timeout_blocks() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ("@one", Answer::Hang),
            ("@two", Answer::Member),
            ("@three", Answer::Member),
        ]));
        assert_eq!(gate(oracle).evaluate("u").await, GateState::Blocked);
    }

    #[tokio::test]
    async fn test_slow_oracle_reports_timeout() {
        let oracle = Arc::new(ScriptedOracle::new(vec![("@one", Answer::Hang)]));
        let gate = gate(oracle);

        let result = gate.check("u", &groups()[0]).await;
        assert!(matches!(result, Err(MembershipError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_guard_skips_action_when_blocked() {
        let oracle = Arc::new(ScriptedOracle::new(vec![("@one", Answer::Fail)]));
        let gate = gate(oracle);
        let ran = AtomicUsize::new(0);

        let result: Result<Gated<u32>, ()> = gate
            .guard("u", || async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;

        assert_eq!(result, Ok(Gated::ForceJoin(ForceJoinDirective { groups: groups() })));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_guard_runs_action_when_allowed() {
        let oracle = Arc::new(ScriptedOracle::new(vec![
            ("@one", Answer::Member),
            ("@two", Answer::Member),
            ("@three", Answer::Member),
        ]));
        let result: Result<Gated<u32>, ()> = gate(oracle).guard("u", || async { Ok(7) }).await;
        assert_eq!(result, Ok(Gated::Allowed(7)));
    }

    #[tokio::test]
    async fn test_no_groups_allows() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let gate = SessionGate::new(oracle, Vec::new(), Duration::from_millis(50));
        assert_eq!(gate.evaluate("u").await, GateState::Allowed);
    }
}
