//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use snitch_api::SnitchError;
use snitch_vfs::VirtualFileSystem;

/// 打印错误；语法错误附带源码上下文，未捕获异常附带 traceback
pub fn print_error(e: &SnitchError, vfs: &dyn VirtualFileSystem) {
    if let Some(traceback) = e.traceback() {
        eprint!("{traceback}");
        return;
    }

    eprintln!("error: {e}");
    if let Some((path, line, column)) = e.syntax_location() {
        let source = vfs
            .read_file(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        if let Ok(source) = source {
            eprint!("{}", source_context(&source, line, column));
        }
    }
}

/// 源代码上下文（错误行前后几行）
pub fn source_context(source: &str, error_line: usize, error_col: usize) -> String {
    const CONTEXT_LINES: usize = 2;

    let lines: Vec<&str> = source.lines().collect();
    if error_line == 0 || error_line > lines.len() {
        return String::new();
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(lines.len());
    let width = end_line.to_string().len();

    let mut out = String::new();
    for line_idx in start_line..=end_line {
        out.push_str(&format!("{line_idx:>width$} | {}\n", lines[line_idx - 1]));
        if line_idx == error_line {
            let marker = " ".repeat(error_col.saturating_sub(1));
            out.push_str(&format!("{:width$} | {marker}^\n", ""));
        }
    }
    out
}
