// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use tracing::error;

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}

/// Logs a fatal error with its full context chain and terminates the
/// process with a non-zero status. GPU handles left half-built cannot be
/// rolled back, so there is nothing to unwind into.
pub fn exit_on_fatal(err: anyhow::Error) -> ! {
    error!("fatal: {err:#}");
    std::process::exit(1);
}

/// Unwraps a startup result or exits through [`exit_on_fatal`].
pub fn or_exit<T>(res: anyhow::Result<T>) -> T {
    match res {
        Ok(v) => v,
        Err(e) => exit_on_fatal(e),
    }
}
