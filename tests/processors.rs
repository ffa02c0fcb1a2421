//! Tests for the built-in processor variants.

use sluice::processor::{CommandProcessor, NoopProcessor, Processor, ProcessorError};

#[test]
fn chained_commands_join_with_logical_and() {
    let p = CommandProcessor::chained("pa", ["echo one", "echo two", "echo three"]);
    assert_eq!(p.command(), "echo one && echo two && echo three");
}

#[test]
fn single_command_is_kept_verbatim() {
    let p = CommandProcessor::new("pa", "echo hello");
    assert_eq!(p.command(), "echo hello");
    assert_eq!(p.name(), "pa");
}

#[tokio::test]
async fn noop_always_succeeds() {
    let p = NoopProcessor::new("idle");
    assert_eq!(p.name(), "idle");
    assert!(p.run().await.is_ok());
}

#[tokio::test]
async fn successful_command_returns_ok() {
    let p = CommandProcessor::new("ok", "true");
    assert!(p.run().await.is_ok());
}

#[tokio::test]
async fn failing_command_reports_exit_status() {
    let p = CommandProcessor::new("bad", "exit 3");
    match p.run().await {
        Err(ProcessorError::CommandFailed { command, status }) => {
            assert_eq!(command, "exit 3");
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn chain_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker.txt");
    let p = CommandProcessor::chained(
        "chain",
        ["false".to_string(), format!("touch {}", marker.display())],
    );
    assert!(p.run().await.is_err());
    assert!(!marker.exists(), "command after a failure must not run");
}

#[tokio::test]
async fn chain_writes_through_real_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let p = CommandProcessor::chained(
        "chain",
        [
            format!("echo first > {}", out.display()),
            format!("echo second >> {}", out.display()),
        ],
    );
    p.run().await.unwrap();
    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content, "first\nsecond\n");
}
