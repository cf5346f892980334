//! ---
//! tbus_section: "01-core-functionality"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Shared primitives and utilities for the command runtime."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Cancellation for commands that block until the process is asked to stop.
//!
//! [`ShutdownToken`] wraps a `tokio_util` [`CancellationToken`] and adds the
//! blocking wait the synchronous commands need. Child tokens are cancelled
//! with their parent but can also be cancelled on their own.

use std::io;

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

static PROCESS_TOKEN: Lazy<ShutdownToken> = Lazy::new(ShutdownToken::new);

/// Cloneable cancellation token with a blocking wait.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: CancellationToken,
}

impl ShutdownToken {
    /// Create a fresh, uncancelled root token.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide token cancelled by [`install_signal_handler`].
    pub fn process() -> Self {
        PROCESS_TOKEN.clone()
    }

    /// Derive a token cancelled whenever `self` is.
    pub fn child_token(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
        }
    }

    /// Cancel this token and every token derived from it. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Block the calling thread until the token is cancelled.
    ///
    /// Fails only if the runtime driving the wait cannot be built.
    pub fn wait(&self) -> io::Result<()> {
        if self.is_cancelled() {
            return Ok(());
        }
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        runtime.block_on(self.inner.cancelled());
        Ok(())
    }
}

/// Cancel `token` when the process receives Ctrl-C or SIGTERM.
///
/// The signal listener runs on a dedicated thread driving a current-thread
/// tokio runtime; runtime construction errors are returned to the caller.
pub fn install_signal_handler(token: ShutdownToken) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::Builder::new()
        .name("tbus-signal".into())
        .spawn(move || {
            runtime.block_on(shutdown_signal());
            info!("shutdown signal received");
            token.cancel();
        })?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    term.recv().await;
                }
                Err(err) => {
                    warn!(error = %err, "unable to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::select! {
            _ = ctrl_c() => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "unable to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
