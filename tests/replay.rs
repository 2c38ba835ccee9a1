//! End-to-end tests for the replay binary.
//!
//! Each test pipes a script of lines into `sldispatch` and checks the replies
//! it writes to stdout.

use std::io::Write as _;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Run the binary with `script` on stdin and return stdout lines and exit status.
async fn replay(
    script: impl AsRef<[u8]>,
    config: Option<&str>,
) -> anyhow::Result<(Vec<String>, bool)> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sldispatch"));
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env("RUST_LOG", "off");

    // Keep the file alive until the child has exited.
    let config_file = match config {
        Some(text) => {
            let mut file = tempfile::NamedTempFile::new()?;
            file.write_all(text.as_bytes())?;
            cmd.arg(file.path());
            Some(file)
        }
        None => None,
    };

    let mut child = cmd.spawn()?;
    let mut stdin = child.stdin.take().expect("piped stdin");
    stdin.write_all(script.as_ref()).await?;
    drop(stdin);

    let output = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        child.wait_with_output(),
    )
    .await??;
    drop(config_file);

    let lines = String::from_utf8(output.stdout)?
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();
    Ok((lines, output.status.success()))
}

#[tokio::test]
async fn test_registration_flow() {
    let (lines, ok) = replay("ECHO :early\nNICK alice\nECHO :hello world\nPING :t1\n", None)
        .await
        .expect("replay");

    assert!(ok);
    assert_eq!(
        lines,
        vec![
            ":sldispatch 451 * ECHO :You have not registered",
            ":sldispatch 001 alice :Welcome, alice",
            ":sldispatch ECHO alice :hello world",
            ":sldispatch PONG sldispatch :t1",
        ]
    );
}

#[tokio::test]
async fn test_quit_stops_reading() {
    let (lines, ok) = replay("PING :a\nQUIT :done\nPING :b\n", None)
        .await
        .expect("replay");

    assert!(ok);
    assert_eq!(
        lines,
        vec![":sldispatch PONG sldispatch :a", "ERROR :Closing link (done)"]
    );
}

#[tokio::test]
async fn test_unknown_and_blank_lines_are_ignored() {
    let (lines, ok) = replay("\nFROB x y\nping :lower\nPING :upper\n", None)
        .await
        .expect("replay");

    assert!(ok);
    assert_eq!(lines, vec![":sldispatch PONG sldispatch :upper"]);
}

#[tokio::test]
async fn test_case_insensitive_config() {
    let config = r#"
[dispatch]
case_insensitive_keys = true
"#;
    let (lines, ok) = replay("ping :lower\n", Some(config))
        .await
        .expect("replay");

    assert!(ok);
    assert_eq!(lines, vec![":sldispatch PONG sldispatch :lower"]);
}

#[tokio::test]
async fn test_registration_filter_disabled() {
    let config = r#"
[filters.registration]
enabled = false
"#;
    let (lines, ok) = replay("ECHO :anyone\n", Some(config))
        .await
        .expect("replay");

    assert!(ok);
    assert_eq!(lines, vec![":sldispatch ECHO * :anyone"]);
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let config = r#"
[filters.logging]
order = 1

[filters.metrics]
order = 1
"#;
    let (lines, ok) = replay("PING :x\n", Some(config))
        .await
        .expect("replay");

    assert!(!ok);
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_invalid_utf8_line_is_rejected_and_reading_continues() {
    let (lines, ok) = replay(b"PING :a\n\xff\xfe\nPING :b\n", None)
        .await
        .expect("replay");

    assert!(ok);
    assert_eq!(
        lines,
        vec![
            ":sldispatch PONG sldispatch :a",
            ":sldispatch FAIL * INVALID_UTF8 :Invalid UTF-8 in message",
            ":sldispatch PONG sldispatch :b",
        ]
    );
}
