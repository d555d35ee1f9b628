//! API 错误类型

use snitch_core::runtime::ExceptionRef;
use snitch_core::{ExecError, ImportError};
use snitch_vfs::VfsError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snitch 错误类型
#[derive(Error, Debug)]
pub enum SnitchError {
    /// The interpreter already carries an exception-logging hook.
    #[error("an exception-logging hook is already registered on this interpreter")]
    AlreadyRegistered,

    /// An exception escaped the entry module.
    #[error("uncaught {}", .0.summary())]
    Uncaught(ExceptionRef),

    /// Loading or building code failed.
    #[error(transparent)]
    Load(Box<ImportError>),

    #[error("cannot read config '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("invalid config '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnitchError {
    /// File, line and column of a syntax error, if this is one.
    pub fn syntax_location(&self) -> Option<(&Path, usize, usize)> {
        match self {
            SnitchError::Load(err) => match err.as_ref() {
                ImportError::Syntax { path, error } => {
                    Some((path.as_path(), error.line()?, error.column()?))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// The formatted traceback of an uncaught exception.
    pub fn traceback(&self) -> Option<String> {
        match self {
            SnitchError::Uncaught(exc) => Some(exc.format_traceback()),
            _ => None,
        }
    }
}

impl From<ExecError> for SnitchError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Raised(exc) => SnitchError::Uncaught(exc),
            ExecError::Fatal(err) => SnitchError::Load(err),
        }
    }
}

impl From<ImportError> for SnitchError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::DuplicateFinder(_) => SnitchError::AlreadyRegistered,
            other => SnitchError::Load(Box::new(other)),
        }
    }
}
