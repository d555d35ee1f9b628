//! 模块加载钩子端到端测试

mod common;
use common::{swallowing_module, Harness, LOG};
use snitch_api::{FilterDecision, HookConfig, SnitchError};
use snitch_core::ModuleState;

const RISKY: &str = r#"fn check() {
    try {
        raise ValueError("bad");
    } except ValueError {
    }
    return "ok";
}
"#;

#[test]
fn test_empty_handler_logs_and_returns_normally() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import risky; print(risky.check());"),
            ("/app/risky.sn", RISKY),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();

    assert_eq!(harness.output(), "ok\n");
    assert_eq!(harness.records(), 1);
    let log = harness.log();
    assert!(log.starts_with("New caught error : \n Traceback (most recent call last):\n"));
    assert!(log.contains("File \"/app/risky.sn\", line 3, in check"));
    assert!(log.ends_with("ValueError: bad\n \n"));
}

#[test]
fn test_each_catch_writes_a_record() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import risky; risky.check(); risky.check(); risky.check();"),
            ("/app/risky.sn", RISKY),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.records(), 3);
}

#[test]
fn test_entry_file_is_not_instrumented() {
    let harness = Harness::hooked(
        &[(
            "/app/main.sn",
            "try { raise ValueError(\"x\"); } except ValueError { print(\"handled\"); }",
        )],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "handled\n");
    assert_eq!(harness.log(), "");
}

#[test]
fn test_bound_names_survive_instrumentation() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import names;"),
            (
                "/app/names.sn",
                r#"
                try { raise KeyError("named"); } except KeyError as err { print(err.message); }
                try { raise KeyError("anon"); } except { print(__snitch_exc.message); }
                "#,
            ),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "named\nanon\n");
    assert_eq!(harness.records(), 2);
}

#[test]
fn test_submodule_origin_visible_to_top_level_code() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import pkg.mod;"),
            (
                "/app/pkg/mod.sn",
                "print(__name__, __file__);\ntry { raise KeyError(\"k\"); } except KeyError { }",
            ),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();

    assert_eq!(harness.output(), "pkg.mod /app/pkg/mod.sn\n");
    assert_eq!(harness.records(), 1);
    let module = harness.interp.modules().get("pkg.mod").unwrap();
    assert_eq!(module.parent(), Some("pkg"));
    assert_eq!(module.file(), Some("/app/pkg/mod.sn".into()));
    assert_eq!(module.state(), ModuleState::Ready);
}

#[test]
fn test_include_mismatch_loads_untouched() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import frontend; print(frontend.swallow());"),
            ("/app/frontend.sn", swallowing_module("frontend").as_str()),
        ],
        |config| config.include = vec!["backend".into()],
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "frontend\n");
    assert_eq!(harness.log(), "");
}

#[test]
fn test_include_exclude_matrix() {
    let harness = Harness::hooked(
        &[
            (
                "/app/main.sn",
                r#"
                import backend.api;
                import backend.vendor.x;
                import frontend.ui;
                print(backend.api.swallow(), backend.vendor.x.swallow(), frontend.ui.swallow());
                "#,
            ),
            ("/app/backend/api.sn", swallowing_module("backend.api").as_str()),
            ("/app/backend/vendor/x.sn", swallowing_module("backend.vendor.x").as_str()),
            ("/app/frontend/ui.sn", swallowing_module("frontend.ui").as_str()),
        ],
        |config| {
            config.include = vec!["backend".into()];
            config.exclude = vec!["vendor".into()];
        },
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(
        harness.output(),
        "backend.api backend.vendor.x frontend.ui\n"
    );

    let log = harness.log();
    assert_eq!(harness.records(), 1);
    assert!(log.contains("KeyError: backend.api"));
    assert!(!log.contains("vendor"));
    assert!(!log.contains("frontend"));
}

#[test]
fn test_exclude_wins_over_include() {
    let harness = Harness::new(&[]);
    let mut config = HookConfig::with_destination(LOG);
    config.include = vec!["core".into()];
    config.exclude = vec!["core".into()];
    let hook = harness.register(config).unwrap();
    assert_eq!(hook.matches("core.io", None), FilterDecision::Excluded);
}

#[test]
fn test_restrict_to_packages() {
    let harness = Harness::hooked(
        &[
            (
                "/app/main.sn",
                "import top; import pkg.inner; print(top.swallow(), pkg.inner.swallow());",
            ),
            ("/app/top.sn", swallowing_module("top").as_str()),
            ("/app/pkg/inner.sn", swallowing_module("pkg.inner").as_str()),
        ],
        |config| config.restrict_to_packages = true,
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.records(), 1);
    assert!(harness.log().contains("KeyError: pkg.inner"));
}

#[test]
fn test_exec_failure_records_and_delegates() {
    let harness = Harness::hooked(
        &[
            (
                "/app/main.sn",
                "try { import flaky; } except RuntimeError as e { print(\"caught\", e.message); }",
            ),
            ("/app/flaky.sn", "print(\"load\");\nraise RuntimeError(\"boom\");"),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();

    // Once instrumented, once more by the default loader.
    assert_eq!(harness.output(), "load\nload\ncaught boom\n");
    assert_eq!(harness.log(), "exec failed in flaky : boom\n");
    let flaky = harness.interp.modules().get("flaky").unwrap();
    assert_eq!(flaky.state(), ModuleState::Failed);
}

#[test]
fn test_default_loader_reuses_namespace() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import flaky; print(flaky.COUNT);"),
            (
                "/app/flaky.sn",
                r#"
                try { var n = COUNT + 1; } except NameError { var n = 1; }
                COUNT = n;
                if COUNT == 1 { raise RuntimeError("first"); }
                "#,
            ),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();

    assert_eq!(harness.output(), "2\n");
    let log = harness.log();
    assert_eq!(harness.records(), 1);
    assert!(log.contains("NameError: name 'COUNT' is not defined"));
    assert!(log.ends_with("exec failed in flaky : first\n"));
    assert_eq!(
        harness.interp.modules().get("flaky").unwrap().state(),
        ModuleState::Ready
    );
}

#[test]
fn test_module_built_once() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import once; import again; import once;"),
            ("/app/again.sn", "import once;"),
            ("/app/once.sn", "print(\"built\");"),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "built\n");
}

#[test]
fn test_cycle_resolves_to_in_progress_module() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import a; print(a.B_SAW);"),
            ("/app/a.sn", "var EARLY = \"early\";\nimport b;\nvar B_SAW = b.SAW;"),
            ("/app/b.sn", "import a;\nvar SAW = a.EARLY;"),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "early\n");
}

#[test]
fn test_syntax_error_propagates_like_unpatched_load() {
    let harness = Harness::hooked(
        &[
            (
                "/app/main.sn",
                "try { import broken; } except SyntaxError as e { print(e.kind); }",
            ),
            ("/app/broken.sn", "try { } except"),
        ],
        |_| {},
    );
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.output(), "SyntaxError\n");
    assert_eq!(harness.log(), "");
}

#[test]
fn test_modules_imported_before_registration_stay_unpatched() {
    let harness = Harness::new(&[
        ("/app/main.sn", "import early; early.swallow();"),
        ("/app/early.sn", swallowing_module("early").as_str()),
    ]);
    harness.interp.import_module("early").unwrap();
    harness.register(HookConfig::with_destination(LOG)).unwrap();
    harness.run("/app/main.sn").unwrap();
    assert_eq!(harness.log(), "");
}

#[test]
fn test_second_registration_rejected() {
    let harness = Harness::new(&[]);
    harness.register(HookConfig::with_destination(LOG)).unwrap();
    let err = harness
        .register(HookConfig::with_destination("/logs/other.log"))
        .unwrap_err();
    assert!(matches!(err, SnitchError::AlreadyRegistered));
    assert_eq!(
        harness.interp.finders(),
        vec!["builtin", "snitch-log-exceptions", "path"]
    );
}

#[test]
fn test_uncaught_error_surfaces_from_run_entry() {
    let harness = Harness::hooked(
        &[
            ("/app/main.sn", "import risky; risky.fail();"),
            ("/app/risky.sn", "fn fail() { raise IndexError(\"deep\"); }"),
        ],
        |_| {},
    );
    let err = harness.run("/app/main.sn").unwrap_err();
    let traceback = err.traceback().unwrap();
    assert!(traceback.contains("File \"/app/risky.sn\", line 1, in fail"));
    assert!(traceback.ends_with("IndexError: deep\n"));
}
