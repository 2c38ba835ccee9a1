//! sldispatch - line-oriented command replay server.
//!
//! Reads protocol lines from stdin as one client session, routes each one
//! through the command registry and writes replies to stdout.

mod config;
mod filters;
mod handlers;
mod line;
mod metrics;
mod session;
mod telemetry;

use crate::config::Config;
use crate::handlers::SERVER_NAME;
use crate::line::LineMapper;
use crate::session::ClientSession;
use anyhow::Context as _;
use sldispatch_core::{AsciiCaseInsensitive, Dispatcher, Exact, KeyComparer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => Config::default(),
    };

    telemetry::init(&config.log);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    if config.filters.metrics.enabled || config.metrics.dump_on_exit {
        metrics::init();
    }

    info!(
        case_insensitive_keys = config.dispatch.case_insensitive_keys,
        "Starting sldispatch"
    );

    if config.dispatch.case_insensitive_keys {
        run(&config, AsciiCaseInsensitive).await
    } else {
        run(&config, Exact).await
    }
}

/// Serve one session over stdin/stdout until EOF or QUIT.
async fn run<C: KeyComparer<String>>(config: &Config, comparer: C) -> anyhow::Result<()> {
    let registry = handlers::build_registry(&config.filters, comparer).map_err(|e| {
        error!(error = %e, "Failed to build command registry");
        e
    })?;
    let dispatcher = Dispatcher::new(registry, LineMapper);

    let (session, mut replies) = ClientSession::new("stdin");

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(reply) = replies.recv().await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\r\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // A bad line is rejected; the session stays open.
        let raw = match std::str::from_utf8(&buf) {
            Ok(raw) => raw.trim_end_matches(['\r', '\n']),
            Err(e) => {
                warn!(details = %e, "Invalid UTF-8 in message");
                session.send(format!(
                    ":{SERVER_NAME} FAIL * INVALID_UTF8 :Invalid UTF-8 in message"
                ));
                continue;
            }
        };

        if let Err(e) = dispatcher.dispatch(&session, raw).await {
            warn!(code = e.error_code(), error = %e, line = %raw, "Command failed");
        }
        if session.is_closed() {
            info!("Session closed by client");
            break;
        }
    }

    // Dropping the session closes the reply queue and lets the writer finish.
    drop(session);
    writer.await.context("reply writer panicked")??;

    for (key, count) in dispatcher.registry().command_stats() {
        info!(command = %key, count, "Command stats");
    }

    if config.metrics.dump_on_exit {
        eprint!("{}", metrics::gather_text());
    }

    Ok(())
}
