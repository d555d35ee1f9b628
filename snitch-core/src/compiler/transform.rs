//! Exception-handler instrumentation
//!
//! `LogExceptions` walks a parsed module and prepends a logging block to the
//! body of every `except` clause. The block appends the formatted traceback of
//! the caught exception to a fixed destination file:
//!
//! ```text
//! New caught error : \n <traceback> \n
//! ```
//!
//! The pass is not idempotent; running it twice injects two blocks per
//! handler. Callers guarantee a module is transformed at most once.

use super::lexer::escape_string;
use super::parser::{ExceptHandler, Module, Stmt, StmtKind};
use super::template::{CodeTemplate, TemplateError};
use super::walk::spans_mut;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Name bound to the caught exception when a handler declares none.
pub const SYNTHESIZED_EXCEPTION_NAME: &str = "__snitch_exc";

const LOG_TEMPLATE: &str = r#"import traceback as __snitch_traceback;
var __snitch_trace = __snitch_traceback.format_exc();
with open("${log_destination}", "a") as __snitch_log {
    __snitch_log.write("New caught error : \n " + __snitch_trace + " \n");
}
"#;

/// Counters reported by one transform pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub handlers: usize,
    pub names_synthesized: usize,
}

#[derive(Debug, Clone)]
pub struct LogExceptions {
    destination: PathBuf,
    template: CodeTemplate,
}

impl LogExceptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            template: CodeTemplate::new(LOG_TEMPLATE),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn transform(&self, mut module: Module) -> Result<Module, TemplateError> {
        self.visit_module(&mut module)?;
        Ok(module)
    }

    /// Instrument `module` in place.
    #[instrument(
        target = "snitch::hook",
        level = "debug",
        skip_all,
        fields(destination = %self.destination.display())
    )]
    pub fn visit_module(&self, module: &mut Module) -> Result<TransformStats, TemplateError> {
        let mut stats = TransformStats::default();
        self.visit_body(&mut module.body, &mut stats)?;
        debug!(
            target: "snitch::hook",
            handlers = stats.handlers,
            synthesized = stats.names_synthesized,
            "instrumented exception handlers"
        );
        Ok(stats)
    }

    /// The statements injected for one handler, positions cleared.
    pub fn render_log_block(&self) -> Result<Vec<Stmt>, TemplateError> {
        let destination = escape_string(&self.destination.to_string_lossy());
        self.template
            .render(&[("log_destination", destination.as_str())])
    }

    fn visit_body(
        &self,
        body: &mut [Stmt],
        stats: &mut TransformStats,
    ) -> Result<(), TemplateError> {
        for stmt in body {
            self.visit_stmt(stmt, stats)?;
        }
        Ok(())
    }

    fn visit_stmt(&self, stmt: &mut Stmt, stats: &mut TransformStats) -> Result<(), TemplateError> {
        match &mut stmt.kind {
            StmtKind::Try(try_stmt) => {
                self.visit_body(&mut try_stmt.body, stats)?;
                for handler in &mut try_stmt.handlers {
                    self.visit_handler(handler, stats)?;
                }
            }
            StmtKind::Fn(decl) => self.visit_body(&mut decl.body, stats)?,
            StmtKind::If(if_stmt) => {
                for branch in &mut if_stmt.branches {
                    self.visit_body(&mut branch.body, stats)?;
                }
                if let Some(body) = &mut if_stmt.else_body {
                    self.visit_body(body, stats)?;
                }
            }
            StmtKind::While(while_stmt) => self.visit_body(&mut while_stmt.body, stats)?,
            StmtKind::With(with_stmt) => self.visit_body(&mut with_stmt.body, stats)?,
            StmtKind::Expr(_)
            | StmtKind::Var(_)
            | StmtKind::Assign(_)
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Pass
            | StmtKind::Raise(_)
            | StmtKind::Import(_)
            | StmtKind::FromImport(_) => {}
        }
        Ok(())
    }

    fn visit_handler(
        &self,
        handler: &mut ExceptHandler,
        stats: &mut TransformStats,
    ) -> Result<(), TemplateError> {
        // Nested handlers inside the original body are instrumented too.
        self.visit_body(&mut handler.body, stats)?;

        if handler.name.is_none() {
            handler.name = Some(SYNTHESIZED_EXCEPTION_NAME.to_string());
            stats.names_synthesized += 1;
        }

        let mut injected = self.render_log_block()?;
        let position = handler.span;
        spans_mut(&mut injected, &mut |span| {
            if span.is_unknown() {
                *span = position;
            }
        });

        injected.append(&mut handler.body);
        handler.body = injected;
        stats.handlers += 1;
        Ok(())
    }
}
