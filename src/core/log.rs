use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Targets whose events are shown: the application plus HTTP and session
/// middleware.
const LOG_TARGETS: &[&str] = &["dabloan", "tower_http", "tower_sessions"];

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn app_targets(level: LevelFilter) -> Targets {
    LOG_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, level)
        })
}

/// Picks the active filter: `RUST_LOG` replaces the target filter entirely
/// when set, otherwise the verbosity flag decides the level.
fn filters(verbose: bool, env_filter: Option<EnvFilter>) -> (Option<EnvFilter>, Option<Targets>) {
    match env_filter {
        Some(env_filter) => (Some(env_filter), None),
        None => (None, Some(app_targets(level_for(verbose)))),
    }
}

/// Installs the global subscriber.
pub fn init_logging(verbose: bool) {
    let (env_filter, targets) = filters(verbose, EnvFilter::try_from_default_env().ok());

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(targets)
        .with(env_filter)
        .init();
}
