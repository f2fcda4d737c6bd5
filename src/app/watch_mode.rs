// Author: Dustin Pilgrim
// License: MIT

use eyre::WrapErr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use vigil::{
    config::load_settings,
    core::{error::Error, info::TimerSnapshot},
    services::{
        activity::ActivityWatchdog,
        session::{CommandEnder, CommandExtender},
        signals::{ActivitySignal, SignalSink},
    },
    timer::{SessionTimer, TimerHandle},
};

use crate::cli::Args;

pub async fn run(args: Args) -> eyre::Result<()> {
    let _log_guard = crate::app::logging::init(args.verbose, args.no_console);

    tracing::info!("vigil starting");

    let settings = load_settings(args.config.as_deref()).map_err(|e| {
        tracing::error!("{e}");
        e
    })?;

    let mut builder = SessionTimer::builder(settings.timer.clone());
    if let Some(cmd) = &settings.extend_command {
        builder = builder.extender(CommandExtender::new(cmd.as_str()));
    }
    if let Some(cmd) = &settings.end_command {
        builder = builder.ender(CommandEnder::new(cmd.as_str()));
    }

    let timer = builder.spawn().wrap_err("failed to start session timer")?;
    let handle = timer.handle().clone();

    let watchdog = ActivityWatchdog::new(handle.clone(), &settings.timer)
        .wrap_err("failed to start activity watchdog")?;
    let sink = watchdog.sink();

    let _idle_sub = handle.on_idle(|s| tracing::warn!("session idle: {}", s.status_line()));
    let _active_sub = handle.on_active(|s| tracing::info!("session active: {}", s.status_line()));

    let printer = tokio::spawn(print_updates(handle.watch(), args.json));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&line, &handle, &sink, args.json).await,
                Ok(None) => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("failed to read stdin: {}", e);
                    break;
                }
            },

            _ = &mut ctrl_c => {
                tracing::info!("received Ctrl+C, shutting down");
                break;
            }
        }
    }

    printer.abort();
    drop(watchdog);
    timer.shutdown().await;

    tracing::info!("vigil stopped");
    Ok(())
}

async fn handle_line(line: &str, handle: &TimerHandle, sink: &SignalSink, json: bool) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if let Some(cmd) = line.strip_prefix(':') {
        run_command(cmd.trim(), handle, json).await;
        return;
    }

    match line.parse::<ActivitySignal>() {
        Ok(signal) => {
            if !sink.push(signal) {
                tracing::debug!("signal queue full; dropped '{}'", line);
            }
        }
        Err(e) => eprintln!("vigil: {e}"),
    }
}

async fn run_command(cmd: &str, handle: &TimerHandle, json: bool) {
    let res: Result<TimerSnapshot, Error> = match cmd {
        "start" => handle.start().await,
        "stop" => handle.stop().await,
        "pause" => handle.pause().await,
        "resume" => handle.resume().await,
        "reset" => handle.reset().await,
        "extend" => {
            // Runs on its own task so stdin activity keeps flowing while the
            // backend answers.
            let handle = handle.clone();
            tokio::spawn(async move {
                if let Err(e) = handle.extend().await {
                    eprintln!("vigil: extend: {e}");
                }
            });
            return;
        }
        "state" => {
            print_snapshot(&handle.state(), json);
            return;
        }
        other => {
            eprintln!("vigil: unknown command ':{other}' (use :start :stop :pause :resume :reset :extend :state)");
            return;
        }
    };

    // Successful transitions show up through the watch printer.
    if let Err(e) = res {
        eprintln!("vigil: {cmd}: {e}");
    }
}

async fn print_updates(mut rx: watch::Receiver<TimerSnapshot>, json: bool) {
    print_snapshot(&rx.borrow_and_update().clone(), json);

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        print_snapshot(&snapshot, json);
    }
}

fn print_snapshot(snapshot: &TimerSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("failed to serialize state: {}", e),
        }
    } else {
        println!("{}", snapshot.status_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::{sleep, Duration};
    use vigil::core::{config::TimerConfig, error::ExtendError};

    #[tokio::test(start_paused = true)]
    async fn stdin_activity_is_read_while_extend_is_pending() {
        let mut cfg = TimerConfig::new(60_000);
        cfg.throttle_ms = 0;

        let timer = SessionTimer::builder(cfg.clone())
            .extender(|| async {
                sleep(Duration::from_secs(3)).await;
                Err::<(), _>(ExtendError::Unauthorized)
            })
            .spawn()
            .unwrap();
        let handle = timer.handle().clone();
        let watchdog = ActivityWatchdog::new(handle.clone(), &cfg).unwrap();
        let sink = watchdog.sink();

        sleep(Duration::from_millis(1_000)).await;
        handle_line(":extend", &handle, &sink, false).await;
        handle_line("keydown", &handle, &sink, false).await;
        sleep(Duration::from_millis(10)).await;

        let s = handle.state();
        assert_eq!(s.last_active_ms, 1_000);
        assert!(!s.session_ended);

        // The rejection still lands afterwards and ends the session.
        sleep(Duration::from_secs(3)).await;
        let s = handle.state();
        assert!(s.session_ended);
        assert_eq!(s.last_active_ms, 1_000);
    }
}
