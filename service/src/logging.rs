use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies whose records are dropped below `TRACE`. Gateway request and
/// response details are logged by our own crates, so the transport chatter adds nothing.
const FILTERED_MODULES: &[&str] = &["hyper", "reqwest", "rustls", "tower", "tracing", "axum"];

pub struct Logger {}

impl Logger {
    /// Install the terminal logger at the configured level.
    ///
    /// Panics if a global logger is already installed.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;

        TermLogger::init(
            level,
            Self::build_log_config(Self::filters_for(level)),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
        .expect("Failed to start simplelog");
    }

    /// Module prefixes to silence at `level`; none at `TRACE`.
    fn filters_for(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            FILTERED_MODULES
        }
    }

    fn build_log_config(ignored: &[&'static str]) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        for module in ignored {
            builder.add_filter_ignore_str(module);
        }
        builder.build()
    }
}
