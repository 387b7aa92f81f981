use std::future::Future;

use tokio::sync::watch;

use crate::error::ClientError;

/// Lifetime of a view that issues requests.
///
/// Calls made through [`Scope::run`] are aborted when the scope is closed or
/// dropped, so a response arriving after the view went away never reaches
/// store state.
#[derive(Debug)]
pub struct Scope {
    closed: watch::Sender<bool>,
}

impl Default for Scope {
    fn default() -> Self {
        let (closed, _) = watch::channel(false);
        Scope { closed }
    }
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, ClientError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(ClientError::Aborted);
        }

        tokio::select! {
            output = future => Ok(output),
            _ = closed.wait_for(|closed| *closed) => {
                tracing::debug!("in-flight call aborted with its scope");
                Err(ClientError::Aborted)
            }
        }
    }

    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_while_open() {
        let scope = Scope::new();
        assert_eq!(scope.run(async { 7 }).await.expect("not aborted"), 7);
    }

    #[tokio::test]
    async fn closed_scope_aborts_new_calls() {
        let scope = Scope::new();
        scope.close();
        assert!(matches!(
            scope.run(async { 7 }).await,
            Err(ClientError::Aborted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn close_aborts_in_flight_calls() {
        let scope = Scope::new();
        let (result, _) = tokio::join!(
            scope.run(tokio::time::sleep(Duration::from_secs(10))),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                scope.close();
            }
        );
        assert!(matches!(result, Err(ClientError::Aborted)));
        assert!(scope.is_closed());
    }
}
