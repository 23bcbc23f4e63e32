//! Headless demo runner.
//!
//! Wires the scanner, coordinator, and advice client together with a
//! logging render sink and an environment-driven fake window probe, so
//! the whole engine can be exercised without a real desktop integration.
//! Set `ADVISOR_DEMO_GAME` / `ADVISOR_DEMO_PROCESS` to simulate a
//! running game.

use std::time::Instant;

use tokio::sync::mpsc;

use game_advisor::services::advice::{self, Game};
use game_advisor::{
    AdviceClient, AdviceError, LogSink, NativeHandle, OverlayConfig, OverlayCoordinator,
    ProbeError, ProcessEntry, Rect, ScreenAnalysisResponse, TrackedWindow, WindowProbe,
    WindowScanner,
};

/// Fallback catalog used when the advice server is unreachable.
fn builtin_catalog() -> Vec<Game> {
    let entry = |name: &str, process: &str| Game {
        id: None,
        name: name.to_string(),
        process_name: process.to_string(),
        genre: None,
        description: None,
    };
    vec![
        entry("League of Legends", "LeagueClient.exe"),
        entry("Valorant", "VALORANT.exe"),
        entry("Overwatch", "Overwatch.exe"),
        entry("Minecraft", "javaw.exe"),
        entry("Steam", "steam.exe"),
    ]
}

/// Probe that reports one fake process from the environment.
struct DemoProbe;

impl WindowProbe for DemoProbe {
    fn running_processes(&self) -> Result<Vec<ProcessEntry>, ProbeError> {
        match std::env::var("ADVISOR_DEMO_PROCESS") {
            Ok(name) if !name.trim().is_empty() => Ok(vec![ProcessEntry {
                pid: 1,
                name: name.trim().to_string(),
            }]),
            _ => Ok(Vec::new()),
        }
    }

    fn resolve_native_handle(&self, pid: u32) -> Option<NativeHandle> {
        Some(NativeHandle(u64::from(pid)))
    }

    fn window_rect(&self, _handle: NativeHandle) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, 1280.0, 720.0))
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = OverlayConfig::from_env();
    log::info!("advice server: {}", config.base_url);

    let client = AdviceClient::new(config.base_url.clone());
    let catalog = match client.fetch_games().await {
        Ok(games) if !games.is_empty() => {
            log::info!("loaded {} games from server", games.len());
            games
        }
        Ok(_) => {
            log::info!("server catalog empty, using built-in list");
            builtin_catalog()
        }
        Err(err) => {
            log::warn!("catalog fetch failed ({err}), using built-in list");
            builtin_catalog()
        }
    };

    let (scan_tx, mut scan_rx) = mpsc::channel::<Option<TrackedWindow>>(4);
    let scanner = WindowScanner::new(DemoProbe, catalog);
    tokio::spawn(scanner.run(config.scan_interval, scan_tx));

    let (advice_tx, mut advice_rx) =
        mpsc::channel::<Result<ScreenAnalysisResponse, AdviceError>>(1);

    let mut coordinator = OverlayCoordinator::new(LogSink);
    let mut ticker = tokio::time::interval(config.tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // Demo stand-in for the companion button: one analysis shortly after
    // a game shows up.
    let mut analysis_requested = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                coordinator.tick(Instant::now());
            }
            update = scan_rx.recv() => {
                let Some(update) = update else { break };
                let now = Instant::now();
                coordinator.handle_window_update(update, now);

                if coordinator.is_active() && !analysis_requested {
                    analysis_requested = true;
                    if let Some(job) = coordinator.begin_screen_analysis(now) {
                        let client = client.clone();
                        let tx = advice_tx.clone();
                        tokio::spawn(async move {
                            let request = advice::ScreenAnalysisRequest {
                                // No capture backend in the demo runner.
                                image: String::new(),
                                game_name: job.game.game_name,
                                prompt: job.prompt,
                            };
                            let result = client.analyze_screen(&request).await;
                            let _ = tx.send(result).await;
                        });
                    }
                }
            }
            result = advice_rx.recv() => {
                let Some(result) = result else { break };
                coordinator.handle_advice_result(result, Instant::now());
            }
        }
    }
}
