//! One-time model runtime initialization.
//!
//! The runtime is started at most once per process. Concurrent first callers
//! wait on the same initialization; a failed attempt leaves the barrier unset
//! so a later request can try again.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::{error, info};

use lectern_core::{Error, ModelRuntime, Result};

/// Single-flight barrier around [`ModelRuntime::initialize`].
pub struct RuntimeInitializer {
    runtime: Arc<dyn ModelRuntime>,
    config_path: PathBuf,
    ready: OnceCell<()>,
}

impl RuntimeInitializer {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            config_path: config_path.into(),
            ready: OnceCell::new(),
        }
    }

    /// Initialize the runtime unless it already is. Failures surface as
    /// [`Error::Initialization`].
    pub async fn ensure_initialized(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                let start = Instant::now();
                match self.runtime.initialize(&self.config_path).await {
                    Ok(()) => {
                        info!(
                            config = %self.config_path.display(),
                            duration_ms = start.elapsed().as_millis() as u64,
                            "Model runtime initialized"
                        );
                        Ok(())
                    }
                    Err(e) => {
                        error!(
                            config = %self.config_path.display(),
                            error = %e,
                            "Model runtime failed to initialize"
                        );
                        Err(match e {
                            Error::Initialization(msg) => Error::Initialization(msg),
                            other => Error::Initialization(other.to_string()),
                        })
                    }
                }
            })
            .await
            .map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }
}
