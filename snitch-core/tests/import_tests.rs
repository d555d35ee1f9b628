//! 导入系统测试：包、缓存、循环导入与失败模块

mod common;
use common::Harness;
use snitch_core::{ImportError, ModuleState};
use std::rc::Rc;

#[test]
fn test_import_binds_top_level_name() {
    let harness = Harness::new(&[
        ("/app/main.sn", "import util; print(util.double(4));"),
        ("/app/util.sn", "fn double(x) { return x * 2; }"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "8\n");
}

#[test]
fn test_dotted_import_forms() {
    let harness = Harness::new(&[
        (
            "/app/main.sn",
            r#"
            import backend.api;
            print(backend.api.VERSION);
            import backend.api as api;
            print(api.VERSION);
            from backend.api import VERSION, bump;
            print(bump(VERSION));
            from backend import api;
            print(api.__name__);
            "#,
        ),
        ("/app/backend/__init__.sn", "print(\"init\", __name__);"),
        ("/app/backend/api.sn", "var VERSION = 2;\nfn bump(v) { return v + 1; }"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "init backend\n2\n2\n3\nbackend.api\n");

    let package = harness.interp.modules().get("backend").unwrap();
    assert!(package.is_package());
    assert_eq!(package.search_path(), Some(vec!["/app/backend".into()]));
}

#[test]
fn test_package_without_init() {
    let harness = Harness::new(&[
        ("/app/main.sn", "import tools.fmt as f; print(f.NAME);"),
        ("/app/tools/fmt.sn", "var NAME = \"fmt\";"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "fmt\n");
    assert_eq!(harness.interp.modules().get("tools").unwrap().file(), None);
}

#[test]
fn test_module_body_runs_once() {
    let harness = Harness::new(&[
        ("/app/main.sn", "import counted; import counted; import other;"),
        ("/app/other.sn", "import counted;"),
        ("/app/counted.sn", "print(\"body\");"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "body\n");
    let first = harness.interp.import_module("counted").unwrap();
    let second = harness.interp.import_module("counted").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_cyclic_import_sees_partial_module() {
    let harness = Harness::new(&[
        ("/app/main.sn", "import a; print(a.DONE);"),
        ("/app/a.sn", "var EARLY = 1;\nimport b;\nvar DONE = b.SEEN;"),
        ("/app/b.sn", "import a;\nvar SEEN = a.EARLY;\nprint(\"b sees\", a.EARLY);"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "b sees 1\n1\n");
}

#[test]
fn test_missing_module_raises_import_error() {
    let harness = Harness::new(&[(
        "/app/main.sn",
        r#"
        try { import nowhere; } except ImportError as e { print(e.message); }
        try { from traceback import nothing; } except ImportError as e { print(e.message); }
        "#,
    )]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(
        harness.output(),
        "No module named 'nowhere'\ncannot import name 'nothing' from 'traceback'\n"
    );
}

#[test]
fn test_from_import_keeps_submodule_import_error() {
    let harness = Harness::new(&[
        (
            "/app/main.sn",
            r#"
            try { from pkg import needs; } except ImportError as e { print(e.message); }
            try { from pkg import absent; } except ImportError as e { print(e.message); }
            "#,
        ),
        ("/app/pkg/needs.sn", "import nowhere;"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(
        harness.output(),
        "No module named 'nowhere'\ncannot import name 'absent' from 'pkg'\n"
    );
}

#[test]
fn test_module_not_a_package() {
    let harness = Harness::new(&[("/app/util.sn", "")]);
    harness.interp.prepend_search_path("/app");
    let err = harness.interp.import_module("util.sub").unwrap_err();
    assert!(matches!(err, ImportError::NotAPackage { .. }), "{err}");
}

#[test]
fn test_failed_module_is_marked_and_not_rerun() {
    let harness = Harness::new(&[
        (
            "/app/main.sn",
            r#"
            try { import broken; } except ValueError as e { print("first", e.message); }
            try { import broken; } except ImportError as e { print("second", e.message); }
            "#,
        ),
        ("/app/broken.sn", "print(\"running\");\nraise ValueError(\"top-level\");"),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(
        harness.output(),
        "running\nfirst top-level\nsecond module 'broken' failed to initialize\n"
    );
    let broken = harness.interp.modules().get("broken").unwrap();
    assert_eq!(broken.state(), ModuleState::Failed);
}

#[test]
fn test_syntax_error_in_import_is_catchable() {
    let deep = format!("var x = {}1{};", "(".repeat(50_000), ")".repeat(50_000));
    let harness = Harness::new(&[
        (
            "/app/main.sn",
            r#"
            try { import bad; } except SyntaxError as e { print(e.kind); }
            try { import deep; } except SyntaxError { print("too deep"); }
            "#,
        ),
        ("/app/bad.sn", "fn (;"),
        ("/app/deep.sn", deep.as_str()),
    ]);
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "SyntaxError\ntoo deep\n");
    assert!(!harness.interp.modules().contains("bad"));
    assert!(!harness.interp.modules().contains("deep"));
}

#[test]
fn test_search_path_order() {
    let harness = Harness::new(&[
        ("/app/main.sn", "import shared; print(shared.WHERE);"),
        ("/app/shared.sn", "var WHERE = \"app\";"),
        ("/lib/shared.sn", "var WHERE = \"lib\";"),
    ]);
    harness.interp.prepend_search_path("/lib");
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "app\n");
}
