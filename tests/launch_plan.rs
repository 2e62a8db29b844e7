mod common;
use crate::common::{TestResult, init_tracing};

use std::ffi::OsStr;
use std::path::PathBuf;

use looplaunch::config::{ActivationMode, HandoffMode, MalformedLinePolicy};
use looplaunch::errors::LaunchError;
use looplaunch::launch::{LaunchEnvironment, LaunchPlan, resolve_program, transfer_control};
use looplaunch_test_utils::builders::LauncherConfigBuilder;
use looplaunch_test_utils::workdir::TestWorkdir;

const FIXED_FLAGS: &str =
    "--execute --margin CROSSED --relaxed --fallback-on-trend relaxed --news-mode auto --debug";

fn base_env() -> LaunchEnvironment {
    LaunchEnvironment::from_vars([
        ("PATH", "/usr/local/bin:/usr/bin:/bin"),
        ("HOME", "/home/trader"),
        ("FOO", "inherited"),
    ])
}

#[test]
fn overrides_reach_the_environment() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new().with_env_file("FOO=bar\nAPI_SECRET=s3cr3t\n");
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let plan = LaunchPlan::inspect(&cfg, base_env())?;

    assert_eq!(plan.environment.get_str("FOO"), Some("bar"));
    assert_eq!(plan.environment.get_str("API_SECRET"), Some("s3cr3t"));
    assert_eq!(plan.environment.get_str("HOME"), Some("/home/trader"));
    assert_eq!(plan.override_keys, vec!["FOO".to_string(), "API_SECRET".to_string()]);
    assert_eq!(plan.env_file, Some(plan.workdir.join(".env")));
    Ok(())
}

#[test]
fn no_env_file_keeps_inherited_values() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new();
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let plan = LaunchPlan::inspect(&cfg, base_env())?;

    assert!(plan.env_file.is_none());
    assert!(plan.override_keys.is_empty());
    assert_eq!(plan.environment.get_str("FOO"), Some("inherited"));
    Ok(())
}

#[test]
fn control_variables_win_over_env_file_and_inherited() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new().with_env_file("TICK_SECONDS=999\nRUN_FLAGS=--paper\n");
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();
    let mut inherited = base_env();
    inherited.set("TICK_SECONDS", "1");

    let plan = LaunchPlan::inspect(&cfg, inherited)?;

    assert_eq!(plan.environment.get_str("TICK_SECONDS"), Some("10"));
    assert_eq!(plan.environment.get_str("RUN_FLAGS"), Some(FIXED_FLAGS));
    Ok(())
}

#[test]
fn missing_workdir_is_fatal() {
    init_tracing();

    let wd = TestWorkdir::new();
    let missing = wd.path().join("does-not-exist");
    let cfg = LauncherConfigBuilder::new().workdir(&missing).build();

    match LaunchPlan::prepare(&cfg, base_env()) {
        Err(LaunchError::WorkdirUnavailable { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected WorkdirUnavailable, got {other:?}"),
    }
}

#[test]
fn workdir_that_is_a_file_is_fatal() {
    init_tracing();

    let wd = TestWorkdir::new();
    let file = wd.write("not-a-dir", "x");
    let cfg = LauncherConfigBuilder::new().workdir(&file).build();

    let result = LaunchPlan::inspect(&cfg, base_env());
    assert!(
        matches!(result, Err(LaunchError::WorkdirUnavailable { .. })),
        "{result:?}"
    );
}

#[test]
fn malformed_env_file_aborts_unless_skipping() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new().with_env_file("GOOD=1\nthis is wrong\n");

    let strict = LauncherConfigBuilder::new().workdir(wd.path()).build();
    let result = LaunchPlan::inspect(&strict, base_env());
    assert!(
        matches!(result, Err(LaunchError::EnvFile { line: 2, .. })),
        "{result:?}"
    );

    let lenient = LauncherConfigBuilder::new()
        .workdir(wd.path())
        .malformed_env_lines(MalformedLinePolicy::Skip)
        .build();
    let plan = LaunchPlan::inspect(&lenient, base_env())?;
    assert_eq!(plan.environment.get_str("GOOD"), Some("1"));
    Ok(())
}

#[test]
fn venv_activation_prepends_bin_and_sets_virtual_env() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new().with_venv("# venv activate\n");
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();
    let mut inherited = base_env();
    inherited.set("PYTHONHOME", "/opt/python");

    let plan = LaunchPlan::inspect(&cfg, inherited)?;
    let venv = plan.workdir.join(".venv");

    assert!(plan.activation.is_some());
    assert_eq!(plan.environment.get("VIRTUAL_ENV"), Some(venv.as_os_str()));
    assert_eq!(plan.environment.get_str("VIRTUAL_ENV_PROMPT"), Some(".venv"));
    assert!(!plan.environment.contains("PYTHONHOME"));

    let path = plan.environment.path_entries();
    assert_eq!(path[0], venv.join("bin"));
    assert_eq!(&path[1..], &[
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/bin"),
    ]);
    Ok(())
}

#[test]
fn missing_activation_script_changes_nothing() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new();
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let plan = LaunchPlan::inspect(&cfg, base_env())?;

    assert!(plan.activation.is_none());
    assert!(!plan.environment.contains("VIRTUAL_ENV"));
    assert_eq!(
        plan.environment.get_str("PATH"),
        Some("/usr/local/bin:/usr/bin:/bin")
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn source_mode_adopts_the_script_environment() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new()
        .with_venv("export ACTIVATED=yes\nexport PATH=\"/opt/runtime/bin:$PATH\"\n");
    let cfg = LauncherConfigBuilder::new()
        .workdir(wd.path())
        .activation_mode(ActivationMode::Source)
        .build();
    let inherited = LaunchEnvironment::from_vars([
        (
            "PATH".to_string(),
            std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".into()),
        ),
        ("FOO".to_string(), "kept".to_string()),
    ]);

    let plan = LaunchPlan::inspect(&cfg, inherited)?;

    assert_eq!(plan.environment.get_str("ACTIVATED"), Some("yes"));
    assert_eq!(plan.environment.get_str("FOO"), Some("kept"));
    assert_eq!(plan.environment.path_entries()[0], PathBuf::from("/opt/runtime/bin"));
    assert_eq!(plan.environment.get_str("TICK_SECONDS"), Some("10"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn failing_activation_script_is_fatal() {
    init_tracing();

    let wd = TestWorkdir::new().with_venv("exit 7\n");
    let cfg = LauncherConfigBuilder::new()
        .workdir(wd.path())
        .activation_mode(ActivationMode::Source)
        .build();
    let inherited = LaunchEnvironment::from_vars([(
        "PATH",
        std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".into()),
    )]);

    let result = LaunchPlan::inspect(&cfg, inherited);
    assert!(
        matches!(result, Err(LaunchError::Activation { .. })),
        "{result:?}"
    );
}

#[test]
fn inspect_leaves_the_filesystem_alone() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new();
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let plan = LaunchPlan::inspect(&cfg, base_env())?;

    assert_eq!(plan.logs.dir, plan.workdir.join("logs"));
    assert_eq!(plan.logs.stdout, plan.workdir.join("logs").join("loop.out.log"));
    assert_eq!(plan.logs.stderr, plan.workdir.join("logs").join("loop.err.log"));
    assert!(!plan.logs.dir.exists());
    Ok(())
}

#[test]
fn prepare_creates_log_dir_idempotently() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new();
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let first = LaunchPlan::prepare(&cfg, base_env())?;
    assert!(first.logs.dir.is_dir());

    std::fs::write(&first.logs.stdout, "earlier run\n")?;
    let second = LaunchPlan::prepare(&cfg, base_env())?;
    let (_out, _err) = second.logs.open_append()?;

    assert_eq!(std::fs::read_to_string(&second.logs.stdout)?, "earlier run\n");
    Ok(())
}

#[test]
fn log_dir_blocked_by_a_file_is_fatal() {
    init_tracing();

    let wd = TestWorkdir::new();
    wd.write("logs", "not a directory");
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let result = LaunchPlan::prepare(&cfg, base_env());
    assert!(matches!(result, Err(LaunchError::LogDir { .. })), "{result:?}");
}

#[test]
fn program_paths_resolve_against_workdir() {
    let workdir = PathBuf::from("/srv/bot");

    assert_eq!(resolve_program("python", &workdir), PathBuf::from("python"));
    assert_eq!(
        resolve_program("./bin/trader", &workdir),
        PathBuf::from("/srv/bot/./bin/trader")
    );
    assert_eq!(
        resolve_program("/usr/bin/env", &workdir),
        PathBuf::from("/usr/bin/env")
    );
}

#[test]
fn locate_program_uses_the_prepared_path() -> TestResult {
    init_tracing();

    let wd = TestWorkdir::new().with_venv("");
    wd.write(".venv/bin/python", "#!/bin/sh\n");
    let cfg = LauncherConfigBuilder::new().workdir(wd.path()).build();

    let plan = LaunchPlan::inspect(&cfg, base_env())?;

    assert_eq!(
        plan.locate_program(),
        Some(plan.workdir.join(".venv").join("bin").join("python"))
    );
    assert_eq!(plan.command_line(), "python loop.py");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn supervised_handoff_returns_child_exit_code() -> TestResult {
    crate::common::with_timeout(async {
        init_tracing();

        let wd = TestWorkdir::new().with_env_file("FOO=bar\n");
        let cfg = LauncherConfigBuilder::new()
            .workdir(wd.path())
            .handoff(HandoffMode::Supervise)
            .sh_program("echo \"FOO=$FOO TICK=$TICK_SECONDS\"; echo oops >&2; exit 42")
            .build();
        let inherited = LaunchEnvironment::from_vars([(
            "PATH",
            std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".into()),
        )]);

        let plan = LaunchPlan::prepare(&cfg, inherited)?;
        let code = transfer_control(&plan).await?;

        assert_eq!(code, 42);
        assert_eq!(wd.read("logs/loop.out.log"), "FOO=bar TICK=10\n");
        assert_eq!(wd.read("logs/loop.err.log"), "oops\n");
        TestResult::Ok(())
    })
    .await
}

#[test]
fn environment_iteration_is_complete() {
    let env = base_env();
    let keys: Vec<&OsStr> = env.iter().map(|(k, _)| k).collect();
    assert_eq!(keys.len(), env.len());
    assert!(keys.contains(&OsStr::new("HOME")));
}

#[cfg(unix)]
#[tokio::test]
async fn replace_handoff_rejects_a_missing_program_before_redirecting() -> TestResult {
    crate::common::with_timeout(async {
        init_tracing();

        let wd = TestWorkdir::new();
        let cfg = LauncherConfigBuilder::new()
            .workdir(wd.path())
            .program("./no-such-program", &[])
            .build();

        let plan = LaunchPlan::prepare(&cfg, base_env())?;
        match transfer_control(&plan).await {
            Err(LaunchError::Handoff { program, source }) => {
                assert!(program.ends_with("no-such-program"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Handoff error, got {other:?}"),
        }
        assert!(!plan.logs.stderr.exists());
        TestResult::Ok(())
    })
    .await
}

#[cfg(unix)]
#[tokio::test]
async fn replace_handoff_rejects_a_non_executable_program() -> TestResult {
    crate::common::with_timeout(async {
        init_tracing();

        let wd = TestWorkdir::new();
        wd.write("bin/trader", "#!/bin/sh\nexit 0\n");
        let cfg = LauncherConfigBuilder::new()
            .workdir(wd.path())
            .program("bin/trader", &[])
            .build();

        let plan = LaunchPlan::prepare(&cfg, base_env())?;
        match transfer_control(&plan).await {
            Err(LaunchError::Handoff { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Handoff error, got {other:?}"),
        }
        TestResult::Ok(())
    })
    .await
}
