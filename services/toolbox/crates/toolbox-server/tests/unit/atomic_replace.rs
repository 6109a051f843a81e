//! Tests for the atomic remote file replacer.

#![allow(clippy::expect_used)]

use confgate_toolbox::application::services::atomic_replace::replace_file;
use confgate_toolbox::domain::{RemoteError, ReplaceError};

use crate::mocks::{FakeHost, WriteFault, exec_failed};

const TARGET: &str = "/etc/svc/app.conf";
const OLD: &str = "server { listen 80; }\n";
const NEW: &str = "server { listen 8080; }\n";

fn temp_files(host: &FakeHost) -> Vec<String> {
    host.paths()
        .into_iter()
        .filter(|p| p.starts_with("/tmp/"))
        .collect()
}

#[tokio::test]
async fn replace_moves_scratch_file_over_target() {
    let host = FakeHost::with_file(TARGET, OLD);

    let replaced = replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect("replace should succeed");

    assert_eq!(replaced.target_path, TARGET);
    assert_eq!(host.file(TARGET).as_deref(), Some(NEW));
    assert!(temp_files(&host).is_empty(), "scratch file should be gone");

    let writes = host.writes();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].starts_with("/tmp/app.conf.tmp_"), "{writes:?}");

    let commands = host.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0], format!("sudo mv -- {} {TARGET}", writes[0]));
}

#[tokio::test]
async fn readers_see_old_or_new_content_only() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.watch(TARGET);

    replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect("replace should succeed");

    let observations = host.observations();
    assert!(!observations.is_empty());
    for seen in &observations {
        let seen = seen.as_deref();
        assert!(
            seen == Some(OLD) || seen == Some(NEW),
            "target observed in intermediate state: {seen:?}"
        );
    }
    assert_eq!(observations.last().cloned().flatten().as_deref(), Some(NEW));
}

#[tokio::test]
async fn refused_write_leaves_target_and_attempts_cleanup() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.fail_next_write(WriteFault::Refused);

    let err = replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect_err("write failure should fail the replace");

    match &err {
        ReplaceError::Write { temp_path, source } => {
            assert!(temp_path.starts_with("/tmp/app.conf.tmp_"));
            assert!(matches!(source, RemoteError::RemoteIo { .. }));
        }
        other => panic!("expected Write, got {other:?}"),
    }
    assert_eq!(host.file(TARGET).as_deref(), Some(OLD));
    assert!(host.ran("rm -f -- /tmp/app.conf.tmp_"));
    assert!(!host.ran("sudo mv"));
}

#[tokio::test]
async fn partial_write_is_cleaned_up() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.fail_next_write(WriteFault::Partial);

    replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect_err("partial write should fail the replace");

    assert_eq!(host.file(TARGET).as_deref(), Some(OLD));
    assert!(temp_files(&host).is_empty(), "partial scratch file left behind");
}

#[tokio::test]
async fn failed_move_removes_scratch_file() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.script(
        "sudo mv",
        Ok(exec_failed("mv: cannot move: Read-only file system", 1)),
    );

    let err = replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect_err("move failure should fail the replace");

    match &err {
        ReplaceError::Move {
            target_path,
            detail,
            ..
        } => {
            assert_eq!(target_path, TARGET);
            assert!(detail.contains("Read-only file system"), "{detail}");
        }
        other => panic!("expected Move, got {other:?}"),
    }
    assert_eq!(host.file(TARGET).as_deref(), Some(OLD));
    assert!(temp_files(&host).is_empty());
}

#[tokio::test]
async fn move_with_sudo_noise_on_stderr_still_succeeds() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.script(
        "sudo mv",
        Ok(confgate_toolbox::domain::ExecOutput::new(
            "",
            "sudo: unable to resolve host web01",
            Some(0),
        )),
    );

    // The scripted mv does not move anything, but the replacer only judges
    // the reported output.
    let replaced = replace_file(&host, "/tmp", TARGET, NEW).await;
    assert!(replaced.is_ok(), "{replaced:?}");
}

#[tokio::test]
async fn move_transport_error_is_reported_as_move_failure() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.script(
        "sudo mv",
        Err(RemoteError::Connection("Connection refused".to_string())),
    );

    let err = replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect_err("transport failure should fail the replace");

    assert!(matches!(err, ReplaceError::Move { .. }));
    assert!(err.to_string().contains("Connection refused"));
}

#[tokio::test]
async fn cleanup_failure_does_not_mask_move_error() {
    let host = FakeHost::with_file(TARGET, OLD);
    host.script("sudo mv", Ok(exec_failed("mv: permission denied", 1)));
    host.script("rm -f", Err(RemoteError::Connection("reset".to_string())));

    let err = replace_file(&host, "/tmp", TARGET, NEW)
        .await
        .expect_err("move failure should be reported");

    assert!(matches!(err, ReplaceError::Move { .. }));
}

#[tokio::test]
async fn custom_scratch_dir_is_used() {
    let host = FakeHost::with_file(TARGET, OLD);

    replace_file(&host, "/var/tmp/confgate", TARGET, NEW)
        .await
        .expect("replace should succeed");

    assert!(host.writes()[0].starts_with("/var/tmp/confgate/app.conf.tmp_"));
}
