//! Code templates: parameterized source fragments rendered into tree nodes
//!
//! A template is snitch source with `${name}` placeholders (`$$` is a literal
//! dollar). Rendering substitutes every placeholder, parses the result as a
//! standalone fragment and returns its statements with all positions cleared,
//! ready to be spliced into another tree. The caller owns position repair.

use super::parser::{parse, ParserError, Stmt};
use super::span::Span;
use super::walk::spans_mut;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template placeholder '${{{0}}}' has no value")]
    Unresolved(String),
    #[error("malformed template placeholder at byte {0}")]
    Malformed(usize),
    #[error("rendered template does not parse: {0}")]
    Parse(#[from] ParserError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTemplate {
    text: String,
}

impl CodeTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Substitute placeholders without parsing.
    pub fn substitute(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        let mut offset = 0;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                offset += pos + 2;
                rest = tail;
                continue;
            }
            let Some(body) = after.strip_prefix('{') else {
                return Err(TemplateError::Malformed(offset + pos));
            };
            let Some(close) = body.find('}') else {
                return Err(TemplateError::Malformed(offset + pos));
            };
            let name = &body[..close];
            if name.is_empty() {
                return Err(TemplateError::Malformed(offset + pos));
            }
            let value = values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| TemplateError::Unresolved(name.to_string()))?;
            out.push_str(value);

            let consumed = pos + 2 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Render into statements carrying `Span::UNKNOWN` everywhere.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<Vec<Stmt>, TemplateError> {
        let source = self.substitute(values)?;
        let mut body = parse(&source)?.body;
        spans_mut(&mut body, &mut |span| *span = Span::UNKNOWN);
        trace!(target: "snitch::parser", statements = body.len(), "rendered template");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::StmtKind;
    use crate::compiler::walk::collect_spans;

    #[test]
    fn test_substitute() {
        let template = CodeTemplate::new("var ${name} = \"${value}\"; // $$5");
        let text = template
            .substitute(&[("name", "greeting"), ("value", "hi")])
            .unwrap();
        assert_eq!(text, "var greeting = \"hi\"; // $5");
    }

    #[test]
    fn test_render_clears_positions() {
        let template = CodeTemplate::new("import traceback;\nvar t = traceback.format_exc();");
        let mut body = template.render(&[]).unwrap();
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0].kind, StmtKind::Import(_)));
        assert!(collect_spans(&mut body).iter().all(Span::is_unknown));
    }

    #[test]
    fn test_unresolved_placeholder() {
        let template = CodeTemplate::new("print(\"${missing}\");");
        assert_eq!(
            template.render(&[("other", "x")]).unwrap_err(),
            TemplateError::Unresolved("missing".to_string())
        );
    }

    #[test]
    fn test_malformed_placeholder() {
        assert_eq!(
            CodeTemplate::new("print(${oops);")
                .substitute(&[])
                .unwrap_err(),
            TemplateError::Malformed(6)
        );
        assert!(matches!(
            CodeTemplate::new("a $b").substitute(&[]),
            Err(TemplateError::Malformed(2))
        ));
    }

    #[test]
    fn test_rendered_text_must_parse() {
        let template = CodeTemplate::new("var x = ${value};");
        assert!(matches!(
            template.render(&[("value", "")]),
            Err(TemplateError::Parse(_))
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = CodeTemplate::new("print(\"${v}\");");
        let a = template.render(&[("v", "1")]).unwrap();
        let b = template.render(&[("v", "1")]).unwrap();
        assert_eq!(a, b);
    }
}
