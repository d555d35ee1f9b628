//! CLI 配置
//!
//! 日志级别：全局级别加上按阶段的覆盖

use snitch_config::Phase;
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub global: Level,
    /// Per-phase overrides of `global`
    pub phases: Vec<(Phase, Level)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            phases: Vec::new(),
        }
    }
}

impl LogConfig {
    /// `-v` raises the hook and import phases first; `-vvv` traces everything.
    pub fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => Self::default(),
            1 => Self {
                global: Level::WARN,
                phases: vec![(Phase::Hook, Level::INFO), (Phase::Import, Level::INFO)],
            },
            2 => Self {
                global: Level::INFO,
                phases: vec![(Phase::Hook, Level::DEBUG), (Phase::Import, Level::DEBUG)],
            },
            _ => Self {
                global: Level::TRACE,
                phases: Vec::new(),
            },
        }
    }

    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        self.phases
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, level)| *level)
            .unwrap_or(self.global)
    }
}
