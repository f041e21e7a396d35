//! Ordered-attempt combinator.
//!
//! Tries candidates one after another until one succeeds, keeping every
//! failure along the way. The caller decides what a failure means; nothing
//! here inspects the error.

use std::future::Future;

/// Outcome of [`attempt_in_order`].
#[derive(Debug)]
pub enum Attempt<P, T, E> {
    Succeeded {
        provider: P,
        value: T,
        /// Candidates tried before `provider`, with their errors.
        failures: Vec<(P, E)>,
    },
    /// Every candidate failed, in the order they were tried.
    AllFailed(Vec<(P, E)>),
}

impl<P, T, E> Attempt<P, T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Call `op` for each candidate in order and stop at the first success.
///
/// An empty candidate list yields `AllFailed(vec![])`.
pub async fn attempt_in_order<P, T, E, F, Fut>(candidates: &[P], mut op: F) -> Attempt<P, T, E>
where
    P: Copy,
    F: FnMut(P) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();
    for &provider in candidates {
        match op(provider).await {
            Ok(value) => {
                return Attempt::Succeeded {
                    provider,
                    value,
                    failures,
                };
            }
            Err(e) => failures.push((provider, e)),
        }
    }
    Attempt::AllFailed(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_success_wins() {
        let mut calls = Vec::new();
        let outcome: Attempt<u8, &str, &str> = attempt_in_order(&[1, 2, 3], |p| {
            calls.push(p);
            async move { if p == 1 { Err("down") } else { Ok("ok") } }
        })
        .await;

        match outcome {
            Attempt::Succeeded {
                provider,
                value,
                failures,
            } => {
                assert_eq!(provider, 2);
                assert_eq!(value, "ok");
                assert_eq!(failures, vec![(1, "down")]);
            }
            Attempt::AllFailed(_) => panic!("expected success"),
        }
        assert_eq!(calls, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_all_failed_keeps_order() {
        let outcome: Attempt<u8, (), u8> =
            attempt_in_order(&[3, 1], |p| async move { Err(p * 10) }).await;
        match outcome {
            Attempt::AllFailed(causes) => assert_eq!(causes, vec![(3, 30), (1, 10)]),
            Attempt::Succeeded { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let outcome: Attempt<u8, (), ()> = attempt_in_order(&[], |_| async { Ok(()) }).await;
        assert!(!outcome.is_success());
    }
}
