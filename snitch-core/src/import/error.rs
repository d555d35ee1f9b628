use crate::compiler::parser::ParserError;
use crate::compiler::template::TemplateError;
use crate::runtime::compiler::CompileError;
use crate::runtime::object::ExceptionRef;
use snitch_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a module for an identifier.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No module named '{0}'")]
    NotFound(String),
    #[error("No module named '{id}'; '{parent}' is not a package")]
    NotAPackage { id: String, parent: String },
    /// An earlier load of the module raised.
    #[error("module '{0}' failed to initialize")]
    Failed(String),
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },
    #[error("{}:{error}", path.display())]
    Syntax { path: PathBuf, error: ParserError },
    #[error("cannot expand log template for '{module}': {source}")]
    Template {
        module: String,
        #[source]
        source: TemplateError,
    },
    #[error("cannot compile '{}': {source}", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },
    /// The module's top-level code raised.
    #[error("{}", exception.summary())]
    Raised {
        module: String,
        exception: ExceptionRef,
    },
    #[error("a finder named '{0}' is already registered")]
    DuplicateFinder(String),
}

impl ImportError {
    /// Host failures that script code must not be able to catch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ImportError::Template { .. } | ImportError::Compile { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(!ImportError::NotFound("a".into()).is_fatal());
        assert!(!ImportError::Failed("a".into()).is_fatal());
        assert!(ImportError::Compile {
            path: PathBuf::from("/a.sn"),
            source: CompileError::TooManyNames,
        }
        .is_fatal());
        assert!(ImportError::Template {
            module: "a".into(),
            source: TemplateError::Malformed(3),
        }
        .is_fatal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ImportError::NotFound("pkg.mod".into()).to_string(),
            "No module named 'pkg.mod'"
        );
        assert_eq!(
            ImportError::NotAPackage {
                id: "util.x".into(),
                parent: "util".into()
            }
            .to_string(),
            "No module named 'util.x'; 'util' is not a package"
        );
    }
}
