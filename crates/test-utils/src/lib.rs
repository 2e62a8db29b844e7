pub mod builders;
pub mod fake_runner;
pub mod workdir;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use looplaunch::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Route launcher logs into the test harness's captured output.
///
/// The filter comes from `LOOPLAUNCH_LOG` like the binary's, e.g.
/// `LOOPLAUNCH_LOG=looplaunch=debug cargo test -- --nocapture`; it defaults to
/// `warn` so passing runs stay quiet.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Fail the test if `f` is still running after five seconds; guards the
/// tests that spawn real processes.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(Duration::from_secs(5), f).await {
        Ok(value) => value,
        Err(_) => panic!("test still running after 5s"),
    }
}
