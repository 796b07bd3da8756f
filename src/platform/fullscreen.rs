/// Host fullscreen capability

use futures::future::{self, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Error, Result};

/// Fullscreen surface of the host environment.
///
/// `is_fullscreen` is the host's own answer; viewers query it rather than
/// tracking the state themselves.
pub trait FullscreenHost: Send + Sync {
    fn is_fullscreen(&self) -> bool;

    /// Ask the host to give the viewer's root region the whole display.
    /// The host may refuse.
    fn request_fullscreen(&self) -> BoxFuture<'_, Result<()>>;

    fn exit_fullscreen(&self) -> BoxFuture<'_, Result<()>>;
}

/// Headless host: fullscreen is just a flag, optionally refused outright
pub struct WindowedHost {
    active: AtomicBool,
    deny_reason: Option<String>,
}

impl WindowedHost {
    pub fn new() -> Self {
        WindowedHost {
            active: AtomicBool::new(false),
            deny_reason: None,
        }
    }

    /// A host that rejects every fullscreen request with `reason`
    pub fn denying(reason: impl Into<String>) -> Self {
        WindowedHost {
            active: AtomicBool::new(false),
            deny_reason: Some(reason.into()),
        }
    }
}

impl Default for WindowedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FullscreenHost for WindowedHost {
    fn is_fullscreen(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn request_fullscreen(&self) -> BoxFuture<'_, Result<()>> {
        let res = match &self.deny_reason {
            Some(reason) => Err(Error::FullscreenError(reason.clone())),
            None => {
                self.active.store(true, Ordering::SeqCst);
                Ok(())
            }
        };
        future::ready(res).boxed()
    }

    fn exit_fullscreen(&self) -> BoxFuture<'_, Result<()>> {
        let was_active = self.active.swap(false, Ordering::SeqCst);
        let res = if was_active {
            Ok(())
        } else {
            Err(Error::FullscreenError("not in fullscreen".to_string()))
        };
        future::ready(res).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn windowed_host_toggles() {
        let host = WindowedHost::new();
        assert!(!host.is_fullscreen());
        host.request_fullscreen().await.unwrap();
        assert!(host.is_fullscreen());
        host.exit_fullscreen().await.unwrap();
        assert!(!host.is_fullscreen());
        assert!(host.exit_fullscreen().await.is_err());
    }

    #[tokio::test]
    async fn denying_host_stays_windowed() {
        let host = WindowedHost::denying("no user gesture");
        let err = host.request_fullscreen().await.unwrap_err();
        assert!(err.to_string().contains("no user gesture"));
        assert!(!host.is_fullscreen());
    }
}
