//! The live dashboard loop.
//!
//! Mounting subscribes to the push channel before the snapshot is fetched,
//! so alerts published meanwhile queue up and apply after the snapshot.
//! The loop then multiplexes pushed alerts, stdin commands, session changes
//! and Ctrl-C on one task. Each handler runs to completion before the next
//! is polled. Closed stdin only stops command input; the feed stays live
//! until `quit` or Ctrl-C.

use std::future::Future;
use std::io::Write as _;

use disasterwatch_client::{ApiClient, PushChannel, PushEvent, PushSubscription};
use disasterwatch_core::controller::ACCESS_DENIED;
use disasterwatch_core::{
    ControllerOptions, DashboardConfig, DashboardController, DeleteOutcome, Notice, Presenter,
    SessionContext,
};
use disasterwatch_types::SeverityFilter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{info, warn};

use crate::commands::{self, HELP, WatchCommand};
use crate::error::DashboardError;
use crate::terminal::TerminalPresenter;

type Controller<W> = DashboardController<ApiClient, TerminalPresenter<W>>;

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the dashboard until `quit` or Ctrl-C.
pub async fn run(
    config: &DashboardConfig,
    session: SessionContext,
    filter: SeverityFilter,
    mute: bool,
) -> Result<(), DashboardError> {
    let client = ApiClient::from_config(&config.backend)?;
    let channel = PushChannel::from_config(&config.backend, &config.push)?;
    let mut options = ControllerOptions::from_config(config);
    options.muted |= mute;

    let presenter = TerminalPresenter::new(std::io::stdout());
    let mut controller = DashboardController::new(client, presenter, session, options);
    info!(url = %channel.url(), "subscribing to live alerts");
    let push = channel.subscribe();

    if filter != SeverityFilter::All {
        controller.set_filter(filter);
    }
    controller.load_snapshot().await;

    drive(&mut controller, push, BufReader::new(tokio::io::stdin()), interrupted()).await?;
    info!("dashboard closed");
    Ok(())
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// The event loop of a mounted dashboard. Returns on `quit` or when
/// `shutdown` completes.
async fn drive<W, R, S>(
    controller: &mut Controller<W>,
    mut push: PushSubscription,
    input: R,
    shutdown: S,
) -> Result<(), DashboardError>
where
    W: std::io::Write,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut session_rx = controller.session().subscribe();
    let mut lines = input.lines();
    let mut push_open = true;
    let mut input_open = true;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("interrupted");
                break;
            }
            event = push.next(), if push_open => match event {
                Some(PushEvent::Alert(raw)) => controller.on_push(&raw),
                Some(PushEvent::Connected) => {
                    controller.presenter_mut().notify(&Notice::info("Live feed connected."));
                }
                Some(PushEvent::Disconnected { reason }) => {
                    controller
                        .presenter_mut()
                        .notify(&Notice::warning(format!("Live feed disconnected: {reason}")));
                }
                None => {
                    warn!("push channel stopped, continuing without live updates");
                    push_open = false;
                }
            },
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    if handle_line(controller, &mut lines, &line).await? == Flow::Quit {
                        break;
                    }
                }
                None => {
                    info!("input closed, live feed keeps running until Ctrl-C");
                    input_open = false;
                }
            },
            changed = session_rx.changed() => {
                if changed.is_ok() {
                    controller.session_changed();
                }
            }
        }
    }

    // Unmount: dropping the subscription closes the socket.
    drop(push);
    Ok(())
}

async fn handle_line<W, R>(
    controller: &mut Controller<W>,
    lines: &mut Lines<R>,
    line: &str,
) -> Result<Flow, DashboardError>
where
    W: std::io::Write,
    R: AsyncBufRead + Unpin,
{
    let command = match commands::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(Flow::Continue),
        Err(e) => {
            controller.presenter_mut().notify(&Notice::warning(e.to_string()));
            return Ok(Flow::Continue);
        }
    };

    match command {
        WatchCommand::Filter(filter) => controller.set_filter(filter),
        WatchCommand::Focus(id) => {
            if !controller.focus(&id) {
                controller
                    .presenter_mut()
                    .notify(&Notice::warning(format!("Event {id} has no location to show.")));
            }
        }
        WatchCommand::Delete(id) => {
            if controller.session().current().is_admin() {
                let confirmed = confirm(lines, "Are you sure you want to delete this report?").await?;
                if confirmed && controller.delete_event(&id).await == DeleteOutcome::Deleted {
                    controller
                        .presenter_mut()
                        .notify(&Notice::info(format!("Event {id} deleted.")));
                }
            } else {
                controller.presenter_mut().notify(&Notice::warning(ACCESS_DENIED));
            }
        }
        WatchCommand::Mute => controller.set_muted(true),
        WatchCommand::Unmute => controller.set_muted(false),
        WatchCommand::Export(path) => {
            // Failures are already shown as notices.
            let _ = controller.export_report(&path);
        }
        WatchCommand::Reload => {
            // Picks up a login or logout made from another terminal.
            controller.session().reload();
            controller.load_snapshot().await;
        }
        WatchCommand::Help => controller.presenter_mut().notify(&Notice::info(HELP)),
        WatchCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is no.
pub async fn confirm<R>(lines: &mut Lines<R>, question: &str) -> Result<bool, DashboardError>
where
    R: AsyncBufRead + Unpin,
{
    {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{question} [y/N] ")?;
        stdout.flush()?;
    }
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use disasterwatch_core::config::{BackendConfig, PushConfig};
    use tokio::time::timeout;

    use super::*;

    /// A backend URL with nothing listening on it.
    async fn dead_backend() -> BackendConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        BackendConfig {
            url: format!("http://{addr}"),
        }
    }

    fn controller(backend: &BackendConfig) -> Controller<Vec<u8>> {
        DashboardController::new(
            ApiClient::from_config(backend).unwrap(),
            TerminalPresenter::new(Vec::new()),
            SessionContext::in_memory(),
            ControllerOptions::default(),
        )
    }

    fn push(backend: &BackendConfig) -> PushSubscription {
        let config = PushConfig {
            reconnect_delay_ms: 0,
            ..PushConfig::default()
        };
        PushChannel::from_config(backend, &config).unwrap().subscribe()
    }

    #[tokio::test]
    async fn closed_input_keeps_the_feed_running() {
        let backend = dead_backend().await;
        let mut controller = controller(&backend);
        let still_running = timeout(
            Duration::from_millis(300),
            drive(&mut controller, push(&backend), &b""[..], std::future::pending()),
        )
        .await;
        assert!(still_running.is_err());
    }

    #[tokio::test]
    async fn shutdown_ends_the_loop_after_input_closed() {
        let backend = dead_backend().await;
        let mut controller = controller(&backend);
        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let result = timeout(
            Duration::from_secs(5),
            drive(&mut controller, push(&backend), &b""[..], shutdown),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn quit_ends_the_loop() {
        let backend = dead_backend().await;
        let mut controller = controller(&backend);
        let input = &b"help\nquit\nfilter high\n"[..];
        let result = timeout(
            Duration::from_secs(5),
            drive(&mut controller, push(&backend), input, std::future::pending()),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
        let out = String::from_utf8_lossy(controller.presenter().output());
        assert!(out.contains("Commands:"));
        assert_eq!(controller.feed().filter(), SeverityFilter::All);
    }
}
