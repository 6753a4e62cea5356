//! Real subprocesses through the platform shell

#![cfg(unix)]

mod helpers;

use helpers::RecordingLogger;
use shipline::process::{CommandError, CommandRunner, ShellRunner};
use std::sync::Arc;

fn runner() -> (ShellRunner, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::new());
    (ShellRunner::new(logger.clone()), logger)
}

#[tokio::test]
async fn test_output_is_streamed_line_by_line() {
    let dir = tempfile::tempdir().unwrap();
    let (runner, logger) = runner();

    runner.execute("printf 'a\\nb\\n'", dir.path()).await.unwrap();

    assert_eq!(logger.infos(), vec!["a", "b"]);
    assert!(logger.errors().is_empty());
}

#[tokio::test]
async fn test_stderr_goes_to_the_info_channel() {
    let dir = tempfile::tempdir().unwrap();
    let (runner, logger) = runner();

    runner.execute("echo progress >&2", dir.path()).await.unwrap();

    assert_eq!(logger.infos(), vec!["progress"]);
}

#[tokio::test]
async fn test_unterminated_output_is_flushed() {
    let dir = tempfile::tempdir().unwrap();
    let (runner, logger) = runner();

    runner.execute("printf 'done'", dir.path()).await.unwrap();

    assert_eq!(logger.infos(), vec!["done"]);
}

#[tokio::test]
async fn test_nonzero_exit_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (runner, _logger) = runner();

    let err = runner.execute("exit 2", dir.path()).await.unwrap_err();

    assert!(matches!(err, CommandError::Failed { code: Some(2), .. }));
    assert_eq!(err.command(), "exit 2");
    assert!(err.to_string().contains("exit 2"));
}

#[tokio::test]
async fn test_runs_in_the_given_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here\n").unwrap();
    let (runner, logger) = runner();

    runner.execute("cat marker.txt", dir.path()).await.unwrap();

    assert_eq!(logger.infos(), vec!["here"]);
}

#[tokio::test]
async fn test_missing_directory_fails_to_spawn() {
    let (runner, _logger) = runner();

    let err = runner
        .execute("true", std::path::Path::new("/definitely/not/here"))
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::Spawn { .. }));
}
