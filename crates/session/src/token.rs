//! Serialized access to the session's authentication context.
//!
//! The server may refresh the token on any authenticated call, and the next
//! call must carry the refreshed value. [`TokenCell`] therefore holds its lock
//! for the whole duration of a call: the token is read, the call is made, and
//! the returned token is stored before the lock is released. Concurrent callers
//! queue behind each other.

use std::future::Future;

use tokio::sync::Mutex;
use tracing::trace;

use crate::ports::Authenticated;
use crate::AuthToken;

/// Holder of the current [`AuthToken`].
#[derive(Debug, Default)]
pub struct TokenCell {
    current: Mutex<AuthToken>,
}

impl TokenCell {
    /// Creates a cell holding `token`.
    pub fn new(token: AuthToken) -> Self {
        Self {
            current: Mutex::new(token),
        }
    }

    /// Returns a copy of the current token.
    pub async fn current(&self) -> AuthToken {
        self.current.lock().await.clone()
    }

    /// Replaces the current token.
    pub async fn replace(&self, token: AuthToken) {
        *self.current.lock().await = token;
    }

    /// Runs `call` with the current token and adopts the token it returns.
    ///
    /// The token is left untouched when `call` fails.
    pub async fn exchange<T, E, F, Fut>(&self, call: F) -> Result<T, E>
    where
        F: FnOnce(AuthToken) -> Fut,
        Fut: Future<Output = Result<Authenticated<T>, E>>,
    {
        let mut guard = self.current.lock().await;
        let Authenticated { auth_token, value } = call(guard.clone()).await?;
        if auth_token.is_empty() {
            trace!("Call returned no token; keeping the current one");
        } else if auth_token != *guard {
            trace!("Adopting refreshed authentication token");
            *guard = auth_token;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn refreshed_token_is_used_by_the_next_call() {
        let cell = TokenCell::new(AuthToken::new("t0"));

        let sent = cell
            .exchange(|token| async move {
                Ok::<_, ()>(Authenticated::new(AuthToken::new("t1"), token))
            })
            .await
            .unwrap();
        assert_eq!(sent.expose(), "t0");

        let sent = cell
            .exchange(|token| async move {
                Ok::<_, ()>(Authenticated::new(AuthToken::new("t2"), token))
            })
            .await
            .unwrap();
        assert_eq!(sent.expose(), "t1");
        assert_eq!(cell.current().await.expose(), "t2");
    }

    #[tokio::test]
    async fn failed_call_keeps_the_token() {
        let cell = TokenCell::new(AuthToken::new("t0"));
        let result: Result<(), &str> = cell.exchange(|_| async { Err("boom") }).await;
        assert_eq!(result, Err("boom"));
        assert_eq!(cell.current().await.expose(), "t0");
    }

    #[tokio::test]
    async fn empty_returned_token_keeps_the_current_one() {
        let cell = TokenCell::new(AuthToken::new("t0"));
        cell.exchange(|_| async { Ok::<_, ()>(Authenticated::new(AuthToken::default(), ())) })
            .await
            .unwrap();
        assert_eq!(cell.current().await.expose(), "t0");
    }

    #[tokio::test]
    async fn concurrent_calls_form_a_token_chain() {
        let cell = Arc::new(TokenCell::new(AuthToken::new("0")));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(tokio::spawn(async move {
                cell.exchange(|token| async move {
                    tokio::task::yield_now().await;
                    let next: u32 = token.expose().parse().unwrap();
                    Ok::<_, ()>(Authenticated::new(AuthToken::new((next + 1).to_string()), next))
                })
                .await
                .unwrap()
            }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(cell.current().await.expose(), "8");
    }
}
