//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。日志写到 stderr，
//! stdout 留给脚本输出和默认的异常记录。

use crate::config::LogConfig;
use snitch_config::Phase;
use std::io;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Overrides the `-v` levels with an `EnvFilter` directive string.
pub const LOG_ENV: &str = "SNITCH_LOG";

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// Per-phase target filter.
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL.iter().fold(
        Targets::new().with_default(log_config.global),
        |targets, phase| targets.with_target(phase.target(), log_config.level_for(*phase)),
    )
}

/// 使用指定格式和日志配置初始化日志系统
pub fn init(log_config: &LogConfig, format: LogFormat) {
    let layer = create_format_layer(format);
    let result = match std::env::var(LOG_ENV).ok().map(EnvFilter::try_new) {
        Some(Ok(filter)) => tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(layer.with_filter(targets(log_config)))
            .try_init(),
    };
    if let Err(err) = result {
        eprintln!("warning: logging not initialized: {err}");
    }
}

/// Create formatter layer based on format
fn create_format_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_targets_follow_phase_levels() {
        let cfg = LogConfig::from_verbosity(1);
        let targets = targets(&cfg);
        assert!(targets.would_enable("snitch::hook", &Level::INFO));
        assert!(!targets.would_enable("snitch::vm", &Level::INFO));
        assert!(targets.would_enable("snitch::vm", &Level::WARN));
    }
}
