use fern::colors::{Color, ColoredLevelConfig};

use crate::config::logger_config::LoggerConfig;

pub struct Logger;

impl Logger {
    /// Install the global logger. A second call is ignored, so hosts that
    /// already set up `log` keep their own backend.
    pub fn init_logging(config: Option<LoggerConfig>) {
        let config = config.unwrap_or_default();
        let colors = ColoredLevelConfig::new()
            .error(Color::Red)
            .warn(Color::Yellow)
            .info(Color::Green)
            .debug(Color::Cyan)
            .trace(Color::BrightBlack);

        let res = fern::Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                    record.target(),
                    colors.color(record.level()),
                    message
                ))
            })
            .level(config.level_filter)
            .level_for(env!("CARGO_CRATE_NAME"), config.app_level_filter)
            .chain(std::io::stdout())
            .apply();

        if let Err(e) = res {
            log::debug!("logger already initialized: {}", e);
        }
    }
}
