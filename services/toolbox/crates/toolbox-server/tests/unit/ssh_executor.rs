//! Tests for the SSH-backed `RemoteExecutor`, driven through a recording
//! `CommandRunner` so no `ssh` process is spawned.

#![allow(clippy::expect_used)]

use std::time::Duration;

use confgate_toolbox::application::ports::RemoteExecutor;
use confgate_toolbox::domain::RemoteError;
use confgate_toolbox::infra::{SshExecutor, SshTarget};

use crate::mocks::{RecordingRunner, Reply};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(45);

fn target() -> SshTarget {
    SshTarget {
        host: "10.0.0.5".to_string(),
        user: "svc_llm_ssh".to_string(),
        port: 2222,
        key_path: Some("/run/secrets/ssh_key".to_string()),
        connect_timeout: Duration::from_secs(10),
    }
}

fn executor(replies: Vec<Reply>) -> SshExecutor<RecordingRunner> {
    SshExecutor::new(target(), RecordingRunner::replying(replies), COMMAND_TIMEOUT)
}

#[test]
fn args_put_options_before_destination_and_command_last() {
    let args = target().args("uptime");

    assert_eq!(
        args,
        vec![
            "-T",
            "-o",
            "BatchMode=yes",
            "-o",
            "ConnectTimeout=10",
            "-o",
            "StrictHostKeyChecking=accept-new",
            "-p",
            "2222",
            "-i",
            "/run/secrets/ssh_key",
            "svc_llm_ssh@10.0.0.5",
            "--",
            "uptime",
        ]
    );
}

#[test]
fn args_omit_identity_when_unset() {
    let mut t = target();
    t.key_path = None;
    assert!(!t.args("uptime").iter().any(|a| a == "-i"));
}

#[tokio::test]
async fn run_returns_structured_output_whatever_the_status() {
    let exec = SshExecutor::new(
        target(),
        RecordingRunner::replying(vec![Reply::Exit {
            code: 3,
            stdout: b"partial\n".to_vec(),
            stderr: b"warning: something\n".to_vec(),
        }]),
        COMMAND_TIMEOUT,
    );

    let out = exec.run("some-check", None).await.expect("transport ok");

    assert_eq!(out.stdout, "partial");
    assert_eq!(out.stderr, "warning: something");
    assert_eq!(out.exit_code, Some(3));
}

#[tokio::test]
async fn run_prefixes_working_dir_and_applies_timeout() {
    let exec = executor(vec![]);

    exec.run("docker-compose ps", Some("/opt/iot stack"))
        .await
        .expect("ok");

    let calls = exec.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "ssh");
    assert_eq!(
        calls[0].remote_command(),
        "cd '/opt/iot stack' && docker-compose ps"
    );
    assert_eq!(calls[0].timeout, Some(COMMAND_TIMEOUT));
    assert!(calls[0].stdin.is_none());
}

#[tokio::test]
async fn each_call_spawns_its_own_session() {
    let exec = executor(vec![Reply::exit(255, "Connection reset"), Reply::ok("up")]);

    assert!(exec.run("uptime", None).await.is_err());
    let out = exec.run("uptime", None).await.expect("second call is independent");

    assert_eq!(out.stdout, "up");
    assert_eq!(exec.runner().calls().len(), 2);
}

#[tokio::test]
async fn ssh_exit_255_is_a_connection_error() {
    let exec = executor(vec![Reply::exit(
        255,
        "ssh: connect to host 10.0.0.5 port 2222: Connection refused",
    )]);

    let err = exec.run("uptime", None).await.expect_err("must fail");

    match err {
        RemoteError::Connection(detail) => assert!(detail.contains("Connection refused")),
        other => panic!("expected Connection, got {other:?}"),
    }
}

#[tokio::test]
async fn spawn_failure_is_a_connection_error() {
    let exec = executor(vec![Reply::SpawnFailed]);

    let err = exec.run("uptime", None).await.expect_err("must fail");

    assert!(matches!(err, RemoteError::Connection(ref d) if d.contains("failed to spawn ssh")));
}

#[tokio::test]
async fn run_timeout_is_an_execution_error() {
    let exec = executor(vec![Reply::TimedOut]);

    let err = exec.run("sleep 600", None).await.expect_err("must fail");

    assert!(matches!(err, RemoteError::Execution(ref d) if d.contains("timed out")));
}

#[tokio::test]
async fn read_file_returns_raw_content() {
    let exec = executor(vec![Reply::ok("server {\n  listen 80;\n}\n")]);

    let content = exec.read_file("/etc/nginx/app.conf").await.expect("ok");

    // Not trimmed: file content is returned verbatim.
    assert_eq!(content, "server {\n  listen 80;\n}\n");
}

#[tokio::test]
async fn read_file_failure_is_remote_io() {
    let exec = executor(vec![Reply::exit(
        1,
        "cat: /etc/nginx/missing.conf: No such file or directory",
    )]);

    let err = exec.read_file("/etc/nginx/missing.conf").await.expect_err("must fail");

    match err {
        RemoteError::RemoteIo { path, detail } => {
            assert_eq!(path, "/etc/nginx/missing.conf");
            assert!(detail.contains("No such file"));
        }
        other => panic!("expected RemoteIo, got {other:?}"),
    }
}

#[tokio::test]
async fn read_file_rejects_invalid_utf8() {
    let exec = executor(vec![Reply::Exit {
        code: 0,
        stdout: vec![0xff, 0xfe, 0x00],
        stderr: Vec::new(),
    }]);

    let err = exec.read_file("/etc/blob").await.expect_err("must fail");
    assert!(matches!(err, RemoteError::RemoteIo { ref detail, .. } if detail.contains("UTF-8")));
}

#[tokio::test]
async fn read_timeout_is_remote_io() {
    let exec = executor(vec![Reply::TimedOut]);

    let err = exec.read_file("/etc/big.conf").await.expect_err("must fail");
    assert!(matches!(err, RemoteError::RemoteIo { .. }));
}

#[tokio::test]
async fn write_file_pipes_content_to_cat() {
    let exec = executor(vec![Reply::ok("")]);

    exec.write_file("/tmp/app.conf.tmp_0011223344556677", "server{}\n")
        .await
        .expect("ok");

    let calls = exec.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].remote_command(),
        "cat > /tmp/app.conf.tmp_0011223344556677"
    );
    assert_eq!(calls[0].stdin.as_deref(), Some(b"server{}\n".as_slice()));
    assert_eq!(calls[0].timeout, Some(COMMAND_TIMEOUT));
}

#[tokio::test]
async fn read_file_quotes_path() {
    let exec = executor(vec![Reply::ok("x")]);

    exec.read_file("/etc/my app/it's.conf").await.expect("ok");

    let command = exec.runner().calls()[0].remote_command().to_string();
    assert!(command.starts_with("cat -- '"), "{command}");
    assert!(!command.contains("it's.conf'"), "{command}");
}

#[tokio::test]
async fn write_failure_is_remote_io() {
    let exec = executor(vec![Reply::exit(1, "cat: /tmp/x: Permission denied")]);

    let err = exec
        .write_file("/tmp/x", "data")
        .await
        .expect_err("must fail");
    assert!(matches!(err, RemoteError::RemoteIo { ref path, .. } if path == "/tmp/x"));
}

#[tokio::test]
async fn write_connection_failure_stays_a_connection_error() {
    let exec = executor(vec![Reply::exit(255, "Permission denied (publickey).")]);

    let err = exec.write_file("/tmp/x", "data").await.expect_err("must fail");
    assert!(matches!(err, RemoteError::Connection(_)));
}
