//! Shared helpers for `proc-interact` integration tests: a tracing setup
//! that honours the binary's log env var, a per-test deadline, shell-script
//! commands and a recording interaction.

pub mod recording_interaction;
pub mod scripts;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Deadline for any single awaited operation in a test.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Reads the same `PROC_INTERACT_LOG` directives as the binary, so
/// `PROC_INTERACT_LOG=proc_interact::exec=trace cargo test -- --nocapture`
/// shows the per-sentence log of the process under test.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("PROC_INTERACT_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,proc_interact=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_DEADLINE`].
///
/// A hung child process would otherwise stall the whole test binary.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!("test operation did not finish within {TEST_DEADLINE:?}"),
    }
}
