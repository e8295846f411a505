//! OS signal handling.
//!
//! # Responsibilities
//! - Name the termination signals a run listens for
//! - Register handlers before any server starts
//! - Translate every delivery into a stop trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeated deliveries are absorbed by the coordinator, not here
//! - Registration errors surface to the caller before startup

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::lifecycle::shutdown::{ShutdownCause, StopCoordinator};

/// OS signal that starts a graceful shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Quit,
    Hangup,
}

impl TerminationSignal {
    /// Interrupt, terminate and quit.
    pub fn defaults() -> Vec<Self> {
        vec![Self::Interrupt, Self::Terminate, Self::Quit]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Quit => "SIGQUIT",
            Self::Hangup => "SIGHUP",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerminationSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let name = normalized.strip_prefix("SIG").unwrap_or(&normalized);
        match name {
            "INT" | "INTERRUPT" => Ok(Self::Interrupt),
            "TERM" | "TERMINATE" => Ok(Self::Terminate),
            "QUIT" => Ok(Self::Quit),
            "HUP" | "HANGUP" => Ok(Self::Hangup),
            _ => Err(format!("unknown termination signal: {}", s)),
        }
    }
}

impl TryFrom<String> for TerminationSignal {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TerminationSignal> for String {
    fn from(signal: TerminationSignal) -> Self {
        signal.as_str().to_string()
    }
}

/// Register handlers for `signals` and spawn one watcher task per signal.
///
/// Every registration happens before this returns, so a failure leaves no
/// watcher running.
pub fn spawn_signal_watchers(
    signals: &[TerminationSignal],
    coordinator: &StopCoordinator,
) -> Result<Vec<JoinHandle<()>>, (TerminationSignal, std::io::Error)> {
    let mut streams = Vec::with_capacity(signals.len());
    for &signal in signals {
        let stream = listen(signal).map_err(|e| (signal, e))?;
        streams.push((signal, stream));
    }

    let handles = streams
        .into_iter()
        .map(|(signal, mut stream)| {
            let coordinator = coordinator.clone();
            tokio::spawn(
                async move {
                    while stream.recv().await.is_some() {
                        tracing::info!(signal = %signal, "Received termination signal");
                        coordinator.trigger(ShutdownCause::Signal(signal));
                    }
                }
                .in_current_span(),
            )
        })
        .collect();

    Ok(handles)
}

#[cfg(unix)]
type SignalStream = tokio::signal::unix::Signal;

#[cfg(unix)]
fn listen(signal: TerminationSignal) -> std::io::Result<SignalStream> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let kind = match signal {
        TerminationSignal::Interrupt => SignalKind::interrupt(),
        TerminationSignal::Terminate => SignalKind::terminate(),
        TerminationSignal::Quit => SignalKind::quit(),
        TerminationSignal::Hangup => SignalKind::hangup(),
    };
    unix_signal(kind)
}

#[cfg(not(unix))]
type SignalStream = tokio::signal::windows::CtrlC;

#[cfg(not(unix))]
fn listen(signal: TerminationSignal) -> std::io::Result<SignalStream> {
    match signal {
        TerminationSignal::Interrupt => tokio::signal::windows::ctrl_c(),
        other => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("{} is not supported on this platform", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("SIGINT".parse::<TerminationSignal>().unwrap(), TerminationSignal::Interrupt);
        assert_eq!("term".parse::<TerminationSignal>().unwrap(), TerminationSignal::Terminate);
        assert_eq!(" sigquit ".parse::<TerminationSignal>().unwrap(), TerminationSignal::Quit);
        assert_eq!("hangup".parse::<TerminationSignal>().unwrap(), TerminationSignal::Hangup);
        assert!("SIGKILL".parse::<TerminationSignal>().is_err());
    }

    #[test]
    fn defaults_cover_interrupt_terminate_quit() {
        assert_eq!(
            TerminationSignal::defaults(),
            vec![
                TerminationSignal::Interrupt,
                TerminationSignal::Terminate,
                TerminationSignal::Quit
            ]
        );
    }

    #[test]
    fn serde_uses_signal_names() {
        #[derive(Deserialize, Serialize)]
        struct Wrapper {
            signals: Vec<TerminationSignal>,
        }

        let parsed: Wrapper = toml::from_str(r#"signals = ["SIGTERM", "int"]"#).unwrap();
        assert_eq!(
            parsed.signals,
            vec![TerminationSignal::Terminate, TerminationSignal::Interrupt]
        );

        let rendered = toml::to_string(&parsed).unwrap();
        assert!(rendered.contains("\"SIGTERM\""));
        assert!(rendered.contains("\"SIGINT\""));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn delivered_signal_triggers_shutdown() {
        let (coordinator, signal) = StopCoordinator::new();
        let handles =
            spawn_signal_watchers(&[TerminationSignal::Hangup], &coordinator).unwrap();

        // SAFETY: raising a signal at our own process with a handler installed.
        unsafe {
            libc::raise(libc::SIGHUP);
        }

        let cause = tokio::time::timeout(std::time::Duration::from_secs(2), signal.wait())
            .await
            .expect("signal should trigger shutdown");
        assert_eq!(cause, ShutdownCause::Signal(TerminationSignal::Hangup));

        for handle in handles {
            handle.abort();
        }
    }
}
