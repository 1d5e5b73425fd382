use crate::models::status::{NetworkMode, StatusSnapshot};
use crate::traits::AdminApi;
use log::{debug, warn};
use serde_json::Number;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Display state of an indicator, exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateClass {
    #[default]
    Unknown,
    Error,
    Ok,
    Running,
}

impl StateClass {
    pub const ALL: [StateClass; 4] = [
        StateClass::Unknown,
        StateClass::Error,
        StateClass::Ok,
        StateClass::Running,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateClass::Unknown => "unknown",
            StateClass::Error => "error",
            StateClass::Ok => "ok",
            StateClass::Running => "running",
        }
    }

    /// Status strings outside the known set show as `unknown`.
    pub fn from_status(status: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| Some(c.as_str()) == status)
            .unwrap_or(StateClass::Unknown)
    }
}

impl fmt::Display for StateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indicators {
    pub network: StateClass,
    pub seed: StateClass,
    pub proxy: StateClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub start_seed: bool,
    pub kill_seed: bool,
    pub save_selection: bool,
    pub download_log: bool,
}

/// Everything the status area shows, derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusView {
    pub indicators: Indicators,
    pub buttons: Buttons,
    pub network_mode: Option<NetworkMode>,
    pub seed_info: Option<String>,
    pub seed_caches: Vec<String>,
    pub seed_selection: Option<String>,
    pub proxy_error: Option<String>,
}

impl StatusView {
    pub fn derive(snapshot: &StatusSnapshot, has_selection: bool) -> Self {
        let network = match snapshot.network_available {
            Some(true) => StateClass::Ok,
            Some(false) => StateClass::Error,
            None => StateClass::Unknown,
        };
        let seed = snapshot.seed.clone().unwrap_or_default();
        let proxy = snapshot.proxy.clone().unwrap_or_default();

        let running = seed.is_running();
        let buttons = Buttons {
            start_seed: !running
                && !seed.paused
                && has_selection
                && snapshot.network_available == Some(true),
            kill_seed: running || seed.paused,
            save_selection: has_selection,
            download_log: seed.log_file.is_some(),
        };

        StatusView {
            indicators: Indicators {
                network,
                seed: StateClass::from_status(seed.status.as_deref()),
                proxy: StateClass::from_status(proxy.status.as_deref()),
            },
            buttons,
            network_mode: snapshot.network_mode,
            seed_info: seed.info,
            seed_caches: seed.name.unwrap_or_default(),
            seed_selection: seed.selection,
            proxy_error: proxy.last_error,
        }
    }
}

/// Reports a change of the backend sequence number. The first value seen is
/// only remembered.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last: Option<Number>,
}

impl SequenceTracker {
    pub fn observe(&mut self, sequence: Option<&Number>) -> bool {
        let Some(sequence) = sequence else {
            return false;
        };
        let changed = matches!(&self.last, Some(last) if last != sequence);
        self.last = Some(sequence.clone());
        changed
    }
}

#[derive(Debug, Clone)]
pub enum PollEvent {
    Snapshot(StatusSnapshot),
    /// Layers or configs changed on the backend.
    SequenceChanged,
    Failed(String),
}

/// Background task requesting `status` once per period. A request that takes
/// longer than the period delays the next one instead of overlapping it, so
/// snapshots arrive in request order.
pub struct StatusPoller {
    handle: JoinHandle<()>,
}

impl StatusPoller {
    pub fn spawn(
        api: Arc<dyn AdminApi>,
        period: Duration,
        events: mpsc::UnboundedSender<PollEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tracker = SequenceTracker::default();
            loop {
                ticker.tick().await;
                let event = match api.status().await {
                    Ok(snapshot) => {
                        let changed = tracker.observe(snapshot.sequence.as_ref());
                        if events.send(PollEvent::Snapshot(snapshot)).is_err() {
                            break;
                        }
                        if !changed {
                            continue;
                        }
                        debug!("backend sequence changed");
                        PollEvent::SequenceChanged
                    }
                    Err(e) => {
                        warn!("status request failed: {}", e);
                        PollEvent::Failed(e.to_string())
                    }
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            debug!("status poller stopped");
        });
        StatusPoller { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::{ProxyStatus, SeedStatus};
    use crate::traits::mock::MockApi;

    fn snapshot(network: Option<bool>, seed: &str) -> StatusSnapshot {
        StatusSnapshot {
            network_available: network,
            seed: Some(SeedStatus {
                status: Some(seed.to_string()),
                ..SeedStatus::default()
            }),
            ..StatusSnapshot::default()
        }
    }

    fn with_sequence(seq: u64) -> Option<StatusSnapshot> {
        Some(StatusSnapshot {
            sequence: Some(Number::from(seq)),
            ..StatusSnapshot::default()
        })
    }

    #[test]
    fn test_network_indicator() {
        let view = StatusView::derive(&snapshot(Some(false), "ok"), true);
        assert_eq!(view.indicators.network, StateClass::Error);
        let view = StatusView::derive(&snapshot(Some(true), "ok"), true);
        assert_eq!(view.indicators.network, StateClass::Ok);
        let view = StatusView::derive(&snapshot(None, "ok"), true);
        assert_eq!(view.indicators.network, StateClass::Unknown);
    }

    #[test]
    fn test_unknown_status_strings_fall_back() {
        let mut snap = snapshot(Some(true), "bogus");
        snap.proxy = Some(ProxyStatus {
            running: true,
            status: Some("ok".to_string()),
            last_error: None,
        });
        let view = StatusView::derive(&snap, false);
        assert_eq!(view.indicators.seed, StateClass::Unknown);
        assert_eq!(view.indicators.proxy, StateClass::Ok);

        let view = StatusView::derive(&snapshot(Some(true), "inactive"), false);
        assert_eq!(view.indicators.seed, StateClass::Unknown);
        let view = StatusView::derive(&snapshot(Some(true), "running"), false);
        assert_eq!(view.indicators.seed, StateClass::Running);
    }

    #[test]
    fn test_start_seed_button() {
        let idle = snapshot(Some(true), "inactive");
        assert!(StatusView::derive(&idle, true).buttons.start_seed);
        assert!(!StatusView::derive(&idle, false).buttons.start_seed);

        let offline = snapshot(Some(false), "inactive");
        assert!(!StatusView::derive(&offline, true).buttons.start_seed);

        let running = snapshot(Some(true), "running");
        let view = StatusView::derive(&running, true);
        assert!(!view.buttons.start_seed);
        assert!(view.buttons.kill_seed);

        let mut paused = snapshot(Some(true), "inactive");
        if let Some(seed) = paused.seed.as_mut() {
            seed.paused = true;
        }
        let view = StatusView::derive(&paused, true);
        assert!(!view.buttons.start_seed);
        assert!(view.buttons.kill_seed);
    }

    #[test]
    fn test_sequence_tracker() {
        let mut tracker = SequenceTracker::default();
        assert!(!tracker.observe(None));
        assert!(!tracker.observe(Some(&Number::from(5))));
        assert!(!tracker.observe(Some(&Number::from(5))));
        assert!(tracker.observe(Some(&Number::from(6))));
        assert!(!tracker.observe(None));
        assert!(!tracker.observe(Some(&Number::from(6))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_reports_sequence_change_once() {
        let api = Arc::new(MockApi::default());
        api.statuses.lock().unwrap().extend([
            with_sequence(1),
            with_sequence(1),
            None,
            with_sequence(2),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::spawn(api.clone(), Duration::from_millis(1000), tx);

        let mut seen = Vec::new();
        while seen.len() < 6 {
            let event = rx.recv().await.unwrap();
            seen.push(match event {
                PollEvent::Snapshot(_) => "snapshot",
                PollEvent::SequenceChanged => "changed",
                PollEvent::Failed(_) => "failed",
            });
        }
        poller.stop();
        assert_eq!(
            seen,
            vec!["snapshot", "snapshot", "failed", "snapshot", "changed", "snapshot"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_requests_do_not_overlap() {
        let api = Arc::new(MockApi::default());
        *api.status_delay.lock().unwrap() = Duration::from_millis(2500);
        let (tx, _rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::spawn(api.clone(), Duration::from_millis(1000), tx);

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(api.count_calls("status"), 2);

        poller.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(poller.is_stopped());
    }
}
