//! Game-window scanner.
//!
//! Polls the process table through a [`WindowProbe`], matches entries
//! against the known-game catalog, and reports the tracked window (or its
//! absence) to the coordinator over a channel. Scan results are sent every
//! interval; the coordinator decides what actually changed.

use std::time::Duration;

use smallvec::SmallVec;
use tokio::sync::mpsc;

use crate::avatar::geometry::Rect;
use crate::platform::{NativeHandle, TrackedWindow, WindowProbe};
use crate::services::advice::Game;

/// Process-name matching used for catalog lookups.
///
/// Names are compared case-insensitively with any `.exe` suffix stripped,
/// and a containment match in either direction counts: the catalog may
/// store `LeagueClient` while the OS reports `LeagueClientUx.exe`.
pub fn matches_process(catalog_name: &str, process_name: &str) -> bool {
    let a = normalize(catalog_name);
    let b = normalize(process_name);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower.strip_suffix(".exe").unwrap_or(&lower).to_string()
}

pub struct WindowScanner<P: WindowProbe> {
    probe: P,
    catalog: Vec<Game>,
}

impl<P: WindowProbe> WindowScanner<P> {
    pub fn new(probe: P, catalog: Vec<Game>) -> Self {
        Self { probe, catalog }
    }

    /// One scan pass. Returns the first catalog game with a running
    /// process and a resolvable window.
    pub fn scan(&self) -> Option<TrackedWindow> {
        let processes = match self.probe.running_processes() {
            Ok(processes) => processes,
            Err(err) => {
                log::warn!("process scan failed: {err}");
                return None;
            }
        };

        // Several catalog entries can match one process list; the first
        // with a real window wins.
        let mut candidates: SmallVec<[(&Game, NativeHandle); 2]> = SmallVec::new();
        for game in &self.catalog {
            for process in &processes {
                if !matches_process(&game.process_name, &process.name) {
                    continue;
                }
                if let Some(handle) = self.probe.resolve_native_handle(process.pid) {
                    candidates.push((game, handle));
                }
            }
        }

        for (game, handle) in candidates {
            let Some(rect) = self.probe.window_rect(handle) else {
                continue;
            };
            let Some(rect) = rect.sanitize() else {
                log::debug!("{}: window rect degenerate, skipping", game.name);
                continue;
            };
            return Some(TrackedWindow {
                game_name: game.name.clone(),
                process_name: game.process_name.clone(),
                rect,
                handle: Some(handle),
            });
        }
        None
    }

    /// Scan loop. Sends one result per interval until the receiver drops.
    pub async fn run(self, interval: Duration, tx: mpsc::Sender<Option<TrackedWindow>>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.send(self.scan()).await.is_err() {
                log::debug!("scan receiver gone, stopping scanner");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ProbeError, ProcessEntry};

    #[test]
    fn matching_is_case_insensitive_and_strips_exe() {
        assert!(matches_process("javaw.exe", "JAVAW.EXE"));
        assert!(matches_process("javaw", "javaw.exe"));
        assert!(matches_process(" javaw.exe ", "javaw"));
    }

    #[test]
    fn matching_contains_either_direction() {
        assert!(matches_process("LeagueClient", "LeagueClientUx.exe"));
        assert!(matches_process("LeagueClientUx.exe", "LeagueClient"));
        assert!(!matches_process("valorant", "overwatch.exe"));
        assert!(!matches_process("", "javaw.exe"));
    }

    struct FakeProbe {
        processes: Vec<ProcessEntry>,
        rect: Option<Rect>,
    }

    impl WindowProbe for FakeProbe {
        fn running_processes(&self) -> Result<Vec<ProcessEntry>, ProbeError> {
            Ok(self.processes.clone())
        }

        fn resolve_native_handle(&self, pid: u32) -> Option<NativeHandle> {
            Some(NativeHandle(u64::from(pid)))
        }

        fn window_rect(&self, _handle: NativeHandle) -> Option<Rect> {
            self.rect
        }
    }

    fn catalog() -> Vec<Game> {
        vec![
            Game {
                id: Some(1),
                name: "Minecraft".to_string(),
                process_name: "javaw.exe".to_string(),
                genre: None,
                description: None,
            },
            Game {
                id: Some(2),
                name: "Valorant".to_string(),
                process_name: "VALORANT.exe".to_string(),
                genre: None,
                description: None,
            },
        ]
    }

    #[test]
    fn scan_finds_first_catalog_match() {
        let probe = FakeProbe {
            processes: vec![
                ProcessEntry {
                    pid: 10,
                    name: "explorer.exe".to_string(),
                },
                ProcessEntry {
                    pid: 20,
                    name: "javaw.exe".to_string(),
                },
            ],
            rect: Some(Rect::new(0.0, 0.0, 800.0, 600.0)),
        };
        let scanner = WindowScanner::new(probe, catalog());

        let window = scanner.scan().expect("match found");
        assert_eq!(window.game_name, "Minecraft");
        assert_eq!(window.handle, Some(NativeHandle(20)));
    }

    #[test]
    fn scan_skips_degenerate_window_rects() {
        let probe = FakeProbe {
            processes: vec![ProcessEntry {
                pid: 20,
                name: "javaw.exe".to_string(),
            }],
            // Minimized windows report zero-size rects.
            rect: Some(Rect::new(0.0, 0.0, 0.0, 0.0)),
        };
        let scanner = WindowScanner::new(probe, catalog());
        assert!(scanner.scan().is_none());
    }

    #[test]
    fn scan_without_running_game_is_none() {
        let probe = FakeProbe {
            processes: vec![ProcessEntry {
                pid: 10,
                name: "explorer.exe".to_string(),
            }],
            rect: Some(Rect::new(0.0, 0.0, 800.0, 600.0)),
        };
        let scanner = WindowScanner::new(probe, catalog());
        assert!(scanner.scan().is_none());
    }
}
