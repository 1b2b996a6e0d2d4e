use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Directive string that replaces the `-v`/`-q` console level when set.
pub const LOG_ENV: &str = "PLDDTPAINT_LOG";

/// Console level for the verbosity flags. `-q` keeps errors.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The log file records at least the pass summary, even for quiet runs.
pub fn file_level_for(console: LevelFilter) -> LevelFilter {
    console.max(LevelFilter::INFO)
}

fn console_filter(directives: Option<&str>, fallback: LevelFilter) -> EnvFilter {
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|e| {
            eprintln!("Ignoring {}='{}': {}", LOG_ENV, d, e);
            EnvFilter::default().add_directive(fallback.into())
        }),
        None => EnvFilter::default().add_directive(fallback.into()),
    }
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = level_for(verbosity, quiet);
    let env_directives = std::env::var(LOG_ENV).ok();

    // stdout carries the summary line and the classify output.
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console_filter(env_directives.as_deref(), level));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(file_level_for(level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info, warn};

    #[test]
    fn flags_map_to_console_levels() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(7, false), LevelFilter::TRACE);
        assert_eq!(level_for(0, true), LevelFilter::ERROR);
    }

    #[test]
    fn file_level_never_drops_below_info() {
        assert_eq!(file_level_for(LevelFilter::ERROR), LevelFilter::INFO);
        assert_eq!(file_level_for(LevelFilter::WARN), LevelFilter::INFO);
        assert_eq!(file_level_for(LevelFilter::TRACE), LevelFilter::TRACE);
    }

    #[test]
    fn env_directives_override_the_flag_level() {
        let filter = console_filter(Some("plddtpaint=trace"), LevelFilter::WARN);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let blank = console_filter(Some("  "), LevelFilter::WARN);
        assert_eq!(blank.max_level_hint(), Some(LevelFilter::WARN));

        let unset = console_filter(None, LevelFilter::ERROR);
        assert_eq!(unset.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    #[serial]
    fn quiet_runs_still_log_the_summary_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("pass.log");

        let file = File::create(&log_path).unwrap();
        let console = level_for(0, true);
        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_filter(file_level_for(console));
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            info!("[pLDDT] CA counts in 'all': <50=1, 50-70=0, 70-90=0, >=90=2");
            warn!("[pLDDT] Coloring of 'all': surface failed: no surface support");
            debug!("Ignoring failure to delete temporary name 'plddt_low_ca'");
        });

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("[pLDDT] CA counts in 'all'"));
        assert!(content.contains("WARN"));
        assert!(!content.contains("plddt_low_ca"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = Path::new("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
