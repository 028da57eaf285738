//! Terminal boot player driven by tokio timers

use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{BootEvent, BootScript, BootSequencer, Timer, TimerHandle};

/// How a terminal playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Completed,
    Cancelled,
}

/// [`Timer`] backed by tokio tasks; fired handles arrive on a channel
pub struct TokioTimer {
    next: u64,
    tasks: HashMap<u64, JoinHandle<()>>,
    fired: mpsc::UnboundedSender<TimerHandle>,
}

impl TokioTimer {
    /// Create a timer and the receiver its handles are delivered on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (fired, rx) = mpsc::unbounded_channel();
        let timer = Self {
            next: 0,
            tasks: HashMap::new(),
            fired,
        };
        (timer, rx)
    }

    /// Number of timers that have not fired or been cancelled
    pub fn active(&self) -> usize {
        self.tasks.values().filter(|t| !t.is_finished()).count()
    }
}

impl Timer for TokioTimer {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle(self.next);
        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(handle);
        });
        self.tasks.retain(|_, t| !t.is_finished());
        self.tasks.insert(handle.0, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle.0) {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Play the boot script to `out`, stopping early on Ctrl-C
pub async fn play<W: Write>(script: &BootScript, out: &mut W) -> Result<BootOutcome> {
    play_until(script, out, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Play the boot script to `out` until it completes or `cancel` resolves.
/// Cancelling unmounts the sequencer, which aborts its pending timer.
pub async fn play_until<W, F>(script: &BootScript, out: &mut W, cancel: F) -> Result<BootOutcome>
where
    W: Write,
    F: Future<Output = ()>,
{
    if !script.enabled {
        return Ok(BootOutcome::Completed);
    }

    let (timer, mut fired) = TokioTimer::new();
    let mut sequencer = BootSequencer::new(script.clone(), timer);
    tokio::pin!(cancel);

    let mut event = sequencer.mount();
    loop {
        match event {
            Some(BootEvent::Show(i)) => {
                writeln!(out, "{}", sequencer.script().lines[i].text)?;
                out.flush()?;
            }
            Some(BootEvent::Reveal) => {
                tracing::debug!("Boot sequence complete");
                return Ok(BootOutcome::Completed);
            }
            None => {}
        }

        tokio::select! {
            handle = fired.recv() => match handle {
                Some(handle) => event = sequencer.fire(handle),
                None => return Ok(BootOutcome::Cancelled),
            },
            _ = &mut cancel => {
                sequencer.unmount();
                tracing::debug!("Boot sequence cancelled");
                return Ok(BootOutcome::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::{BootLine, Delay};

    fn script(delay: Delay, lines: &[&str]) -> BootScript {
        BootScript {
            enabled: true,
            delay,
            lines: lines.iter().map(|l| BootLine::new(l)).collect(),
        }
    }

    #[tokio::test]
    async fn test_play_to_completion() {
        let script = script(Delay::Fixed(1), &["POST ok", "kernel", "login:"]);
        let mut out = Vec::new();

        let outcome = play_until(&script, &mut out, std::future::pending())
            .await
            .unwrap();

        assert_eq!(outcome, BootOutcome::Completed);
        assert_eq!(String::from_utf8(out).unwrap(), "POST ok\nkernel\nlogin:\n");
    }

    #[tokio::test]
    async fn test_cancel_stops_playback() {
        let script = script(Delay::Fixed(60_000), &["first", "never shown"]);
        let mut out = Vec::new();

        let outcome = play_until(
            &script,
            &mut out,
            tokio::time::sleep(Duration::from_millis(10)),
        )
        .await
        .unwrap();

        assert_eq!(outcome, BootOutcome::Cancelled);
        assert_eq!(String::from_utf8(out).unwrap(), "first\n");
    }

    #[tokio::test]
    async fn test_disabled_script_is_silent() {
        let mut script = script(Delay::Fixed(1), &["x"]);
        script.enabled = false;
        let mut out = Vec::new();
        let outcome = play_until(&script, &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(outcome, BootOutcome::Completed);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_timer_never_fires() {
        let (mut timer, mut fired) = TokioTimer::new();
        let slow = timer.schedule(Duration::from_millis(20));
        let fast = timer.schedule(Duration::from_millis(1));
        timer.cancel(slow);

        let got = fired.recv().await.unwrap();
        assert_eq!(got, fast);

        let late = tokio::time::timeout(Duration::from_millis(60), fired.recv()).await;
        assert!(late.is_err(), "cancelled timer fired");
        assert_eq!(timer.active(), 0);
    }
}
