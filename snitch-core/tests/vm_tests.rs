//! VM 执行测试
//!
//! 端到端测试：解析、编译并执行脚本，检查 stdout

mod common;
use common::{raised_kind, run_code, Harness};
use snitch_core::ExecError;

// ===== 基础运算 =====

#[test]
fn test_arithmetic() {
    let out = run_code(r#"print(1 + 2, 7 / 2, 7 % 3, -7 % 3, 2 * 3 - 1);"#).unwrap();
    assert_eq!(out, "3 3.5 1 2 5\n");
}

#[test]
fn test_strings_and_lists() {
    let out = run_code(
        r#"
        var parts = "a,b".split(",");
        parts.append("c");
        print(parts, len(parts), parts[-1]);
        print("Hi {}!".format("x"), " s ".strip().upper(), "ab" * 2);
        print("abc".startswith("ab"), str(12) + "!", int("42") + 1);
        "#,
    )
    .unwrap();
    assert_eq!(
        out,
        "[\"a\", \"b\", \"c\"] 3 c\nHi x! S abab\ntrue 12! 43\n"
    );
}

#[test]
fn test_short_circuit() {
    let out = run_code(r#"print(null or "fallback", 0 and missing, not 1);"#).unwrap();
    assert_eq!(out, "fallback 0 false\n");
}

// ===== 控制流 =====

#[test]
fn test_functions_and_recursion() {
    let out = run_code(
        r#"
        fn fib(n) {
            if n < 2 { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        print(fib(15));
        "#,
    )
    .unwrap();
    assert_eq!(out, "610\n");
}

#[test]
fn test_loops() {
    let out = run_code(
        r#"
        var i = 0;
        var total = 0;
        while true {
            i = i + 1;
            if i > 10 { break; }
            elif i % 2 == 0 { continue; }
            total = total + i;
        }
        print(total);
        "#,
    )
    .unwrap();
    assert_eq!(out, "25\n");
}

#[test]
fn test_functions_see_module_globals() {
    let out = run_code(
        r#"
        var prefix = "v";
        fn tag(x) { var local = prefix + str(x); return local; }
        print(tag(1));
        "#,
    )
    .unwrap();
    assert_eq!(out, "v1\n");
}

// ===== 异常 =====

#[test]
fn test_except_matches_subclass() {
    let out = run_code(
        r#"
        fn lookup() { raise KeyError("k"); }
        try {
            lookup();
        } except IndexError {
            print("wrong");
        } except LookupError as e {
            print(e.kind, e.message);
        }
        "#,
    )
    .unwrap();
    assert_eq!(out, "KeyError k\n");
}

#[test]
fn test_except_list_and_catch_all() {
    let out = run_code(
        r#"
        try { raise TypeError; } except [ValueError, TypeError] as e { print("list", e.kind); }
        try { 1 / 0; } except { print("all"); }
        "#,
    )
    .unwrap();
    assert_eq!(out, "list TypeError\nall\n");
}

#[test]
fn test_unmatched_exception_escapes() {
    let result = run_code(r#"try { raise ValueError("x"); } except TypeError { print("no"); }"#);
    assert_eq!(raised_kind(result), "ValueError");
}

#[test]
fn test_bare_raise_reraises_current() {
    let out = run_code(
        r#"
        try {
            try { raise ValueError("inner"); } except ValueError { print("first"); raise; }
        } except ValueError as e {
            print("second", e.message);
        }
        "#,
    )
    .unwrap();
    assert_eq!(out, "first\nsecond inner\n");
}

#[test]
fn test_runtime_errors_are_catchable() {
    assert_eq!(raised_kind(run_code("print(1 / 0);")), "ZeroDivisionError");
    assert_eq!(raised_kind(run_code("print(undefined);")), "NameError");
    assert_eq!(raised_kind(run_code("print([1][3]);")), "IndexError");
    assert_eq!(raised_kind(run_code("print(1 + \"a\");")), "TypeError");
    assert_eq!(raised_kind(run_code("\"s\".nope();")), "AttributeError");
}

#[test]
fn test_format_exc_outermost_first() {
    let out = run_code(
        "import traceback;\n\
         fn inner() { raise ValueError(\"bad\"); }\n\
         fn outer() { inner(); }\n\
         try { outer(); } except ValueError { print(traceback.format_exc()); }\n",
    )
    .unwrap();
    assert_eq!(
        out,
        "Traceback (most recent call last):\n\
         \x20 File \"/app/main.sn\", line 4, in <module>\n\
         \x20 File \"/app/main.sn\", line 3, in outer\n\
         \x20 File \"/app/main.sn\", line 2, in inner\n\
         ValueError: bad\n\n"
    );
}

#[test]
fn test_format_exc_outside_handler() {
    let out = run_code("import traceback; print(traceback.format_exc());").unwrap();
    assert_eq!(out, "NoneType: None\n\n");
}

#[test]
fn test_recursion_limit_raises_runtime_error() {
    let out = run_code(
        r#"
        fn down(n) { return down(n + 1); }
        try { down(0); } except RuntimeError as e { print(e.kind); }
        "#,
    )
    .unwrap();
    assert_eq!(out, "RecursionError\n");
}

#[test]
fn test_oversized_string_repeat_is_catchable() {
    let out = run_code(
        r#"
        try { var s = "ab" * 9223372036854775807; } except RuntimeError as e { print(e.kind); }
        try { var s = 4611686018427387904 * "ab"; } except { print("caught"); }
        print(len("ab" * 3), "x" * -2 == "");
        "#,
    )
    .unwrap();
    assert_eq!(out, "RuntimeError\ncaught\n6 true\n");
}

#[test]
fn test_self_referential_list() {
    let out = run_code(
        r#"
        var a = [1];
        a.append(a);
        print(str(a), a == a);
        var b = [1];
        b.append(b);
        try { print(a == b); } except RecursionError as e { print(e.kind, e.message); }
        "#,
    )
    .unwrap();
    assert_eq!(
        out,
        "[1, [...]] true\nRecursionError maximum recursion depth exceeded in comparison\n"
    );
}

// ===== 文件与 with =====

#[test]
fn test_with_closes_on_exception() {
    let harness = Harness::new(&[(
        "/app/main.sn",
        r#"
        var kept = null;
        try {
            with open("/tmp/out.txt", "w") as h {
                kept = h;
                h.write("hi");
                raise RuntimeError("boom");
            }
        } except RuntimeError {
            print(kept.closed);
        }
        "#,
    )]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "true\n");
    assert_eq!(harness.read("/tmp/out.txt"), "hi");
}

#[test]
fn test_with_closes_on_return_and_break() {
    let out = run_code(
        r#"
        var files = [];
        fn early() {
            with open("/tmp/a.txt", "a") as f { files.append(f); return 1; }
        }
        early();
        while true {
            with open("/tmp/b.txt", "a") as f { files.append(f); break; }
        }
        print(files[0].closed, files[1].closed);
        "#,
    )
    .unwrap();
    assert_eq!(out, "true true\n");
}

#[test]
fn test_file_modes() {
    let harness = Harness::new(&[
        ("/data/in.txt", "content"),
        (
            "/app/main.sn",
            r#"
            with open("/data/in.txt") as f { print(f.read()); }
            with open("/data/log.txt", "a") as f { f.write("one "); }
            with open("/data/log.txt", "a") as f { f.write("two"); }
            var closed = open("/data/log.txt", "a");
            closed.close();
            try { closed.write("x"); } except ValueError as e { print(e.message); }
            try { open("/data/missing.txt"); } except IOError { print("missing"); }
            "#,
        ),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(
        harness.output(),
        "content\nI/O operation on closed file\nmissing\n"
    );
    assert_eq!(harness.read("/data/log.txt"), "one two");
}

// ===== 入口 =====

#[test]
fn test_syntax_error_in_entry_is_fatal() {
    let harness = Harness::new(&[("/app/main.sn", "var = 1;")]);
    match harness.run("/app/main.sn") {
        Err(ExecError::Fatal(err)) => assert!(err.to_string().starts_with("/app/main.sn:1:")),
        other => panic!("expected fatal error, got {other:?}"),
    }
}

#[test]
fn test_main_module_name() {
    let out = run_code("print(__name__, __file__);").unwrap();
    assert_eq!(out, "__main__ /app/main.sn\n");
}
