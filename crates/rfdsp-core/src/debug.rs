//! Structured logging setup for the driver.
//!
//! Mirrors the layered stdout+logfile `tracing` setup used across the rest
//! of this codebase, minus the TDMA-timestamp-aware formatter: this driver
//! has no per-event slot/frame counter worth right-aligning, so the default
//! compact formatter is used as-is.

use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static INIT_LOG: Once = Once::new();

/// Default stdout filter: info for this crate family, warn elsewhere.
fn default_stdout_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,rfdsp_core=info,rfdsp_dsp=info,rfdsp_frontend=info,rfdsp_stream=info")
    })
}

/// Verbose filter used when a caller asks for trace-level diagnostics.
fn verbose_filter() -> EnvFilter {
    EnvFilter::new("info,rfdsp_core=trace,rfdsp_dsp=trace,rfdsp_frontend=trace,rfdsp_stream=trace")
}

/// Install the default subscriber: compact stdout, optional rotating file.
///
/// Idempotent — subsequent calls within the same process are no-ops. Returns
/// the file appender's `WorkerGuard` (must be kept alive for as long as file
/// logging is wanted) when `logfile` is set.
pub fn setup_logging_default(logfile: Option<String>) -> Option<WorkerGuard> {
    let mut guard = None;
    INIT_LOG.call_once(|| {
        let registry = tracing_subscriber::fmt()
            .with_env_filter(default_stdout_filter())
            .with_target(false);

        if let Some(path) = logfile {
            let dir = std::path::Path::new(&path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = std::path::Path::new(&path)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "rfdsp.log".to_string());
            let file_appender = tracing_appender::rolling::daily(dir, file_name);
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(worker_guard);
            registry
                .with_writer(non_blocking.and(std::io::stdout))
                .init();
        } else {
            registry.init();
        }
    });
    guard
}

/// Install the verbose subscriber (stdout only). Intended for tests/CLIs
/// that want maximal diagnostics without a logfile.
pub fn setup_logging_verbose() {
    INIT_LOG.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(verbose_filter())
            .with_target(false)
            .init();
    });
}
