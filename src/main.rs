mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommand, LayerCommand, SeedCommand, SelectionCommand};
use indicatif::{ProgressBar, ProgressStyle};
use seedmap::models::geometry::{LatLng, Rectangle, Viewport};
use seedmap::session::notify::{Toast, ToastKind};
use seedmap::session::poller::{PollEvent, StateClass};
use seedmap::traits::AdminApi;
use seedmap::utils::name::default_selection_name;
use seedmap::utils::status::{
    print_boxes, print_configs, print_layers, print_status, print_tile_count,
};
use seedmap::{ApiClient, Command, Outcome, Session};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    if !config.hide_title {
        println!("🗺️ seedmap → {}", config.api_base);
    }

    let api: Arc<dyn AdminApi> = Arc::new(ApiClient::new(&config));
    let (mut session, mut toasts) = Session::new(config, api);

    let result = execute(&mut session, &mut toasts, cli.command).await;
    session.shutdown();
    drain_toasts(&mut toasts);
    result
}

async fn execute(
    session: &mut Session,
    toasts: &mut UnboundedReceiver<Toast>,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Status => {
            session.start_polling();
            while let Some(event) = session.next_poll_event().await {
                match event {
                    PollEvent::Snapshot(_) => break,
                    PollEvent::Failed(e) => bail!("status request failed: {}", e),
                    PollEvent::SequenceChanged => {}
                }
            }
            if let Some(view) = session.status() {
                print_status(view, None);
            }
        }
        Commands::Watch => watch(session, toasts).await?,
        Commands::Layers { select } => {
            session.dispatch(Command::ReloadLayers).await?;
            if let Some(name) = select {
                session.dispatch(Command::SelectLayer(name)).await?;
            }
            let layers = session.layers();
            print_layers(&layers.entries(), layers.layers());
        }
        Commands::Configs => {
            if let Outcome::Configs(configs) = session.dispatch(Command::ListConfigs).await? {
                print_configs(&configs);
            }
        }
        Commands::Count { rects } => {
            add_rectangles(session, rects).await?;
            let zoom = session.viewport().zoom.max(0.0).floor() as u32;
            println!(
                "📐 {} boxes, local estimate at zoom {}: {} tiles",
                session.selection().len(),
                zoom,
                session.selection().tile_count(zoom)
            );
            print_tile_count(&session.tile_count());
        }
        Commands::Selection(cmd) => selection(session, cmd).await?,
        Commands::Seed(cmd) => seed(session, cmd).await?,
        Commands::Network { mode } => {
            session.dispatch(Command::SetNetworkMode(mode)).await?;
            println!("🌐 network mode set to {}", mode);
        }
        Commands::Config(ConfigCommand::Get) => {
            print_text(session.dispatch(Command::GetConfig).await?);
        }
        Commands::Config(ConfigCommand::Upload { file }) => {
            let yaml = read_text(&file)?;
            session.dispatch(Command::UploadConfig(yaml)).await?;
        }
        Commands::Layer(cmd) => layer(session, cmd).await?,
        Commands::Log { attach } => {
            print_text(session.dispatch(Command::GetLog { attach }).await?);
        }
        Commands::CacheFile { name, output } => {
            let outcome = session.dispatch(Command::GetCacheFile(name)).await?;
            write_bytes(outcome, &output)?;
        }
        Commands::Download { name, rects, output } => {
            // a failed tile count doesn't block the download
            for rect in rects {
                session.run(Command::AddRectangle(rect)).await;
            }
            let outcome = session.dispatch(Command::DownloadData { name }).await?;
            write_bytes(outcome, &output)?;
        }
        Commands::Boxes { rect } => {
            let zoom = session.config().initial_zoom;
            let overlay = fetch_boxes(session, rect, zoom).await?;
            print_boxes(&overlay);
        }
        Commands::Pick { rect, lat, lng } => {
            let zoom = session.config().initial_zoom;
            fetch_boxes(session, rect, zoom).await?;
            match session.dispatch(Command::PickBox(LatLng::new(lat, lng))).await? {
                Outcome::Picked(Some(_)) => {}
                _ => println!("📦 No coverage box at {}, {}", lat, lng),
            }
        }
    }
    Ok(())
}

async fn selection(session: &mut Session, cmd: SelectionCommand) -> anyhow::Result<()> {
    match cmd {
        SelectionCommand::List => {
            if let Outcome::Selections(names) = session.dispatch(Command::ListSelections).await? {
                if names.is_empty() {
                    println!("⚠️ No stored selections.");
                }
                for name in names {
                    println!("  • {}", name);
                }
            }
        }
        SelectionCommand::Show { name } => {
            session
                .dispatch(Command::LoadSelection { name: name.clone() })
                .await
                .with_context(|| format!("Failed to load selection {}", name))?;
            println!("📐 {}:", name);
            for (i, r) in session.selection().rectangles().iter().enumerate() {
                println!(
                    "  {:>2}: {:.5},{:.5},{:.5},{:.5}",
                    i, r.ne.lat, r.ne.lng, r.sw.lat, r.sw.lng
                );
            }
            print_tile_count(&session.tile_count());
        }
        SelectionCommand::Save { name, rects } => {
            add_rectangles(session, rects).await?;
            let name =
                name.unwrap_or_else(|| default_selection_name(chrono::Local::now().date_naive()));
            session.dispatch(Command::SaveSelection { name }).await?;
        }
        SelectionCommand::Delete { name } => {
            session.dispatch(Command::DeleteSelection { name }).await?;
        }
    }
    Ok(())
}

async fn seed(session: &mut Session, cmd: SeedCommand) -> anyhow::Result<()> {
    match cmd {
        SeedCommand::Start {
            selection,
            rects,
            layer,
            reload_days,
            name,
            follow,
        } => {
            if let Some(stored) = &selection {
                session
                    .dispatch(Command::LoadSelection {
                        name: stored.clone(),
                    })
                    .await?;
            }
            add_rectangles(session, rects).await?;
            if layer.is_none() {
                session.dispatch(Command::ReloadLayers).await?;
            }
            let name = name
                .or(selection)
                .unwrap_or_else(|| default_selection_name(chrono::Local::now().date_naive()));
            session
                .dispatch(Command::StartSeed {
                    name,
                    layer,
                    reload_days,
                })
                .await?;
            if follow {
                follow_seed(session).await?;
            }
        }
        SeedCommand::Kill => {
            session.dispatch(Command::KillSeed).await?;
        }
        SeedCommand::Follow => follow_seed(session).await?,
    }
    Ok(())
}

async fn layer(session: &mut Session, cmd: LayerCommand) -> anyhow::Result<()> {
    match cmd {
        LayerCommand::Edit { name } => print_text(session.dispatch(Command::EditLayer(name)).await?),
        LayerCommand::Create { name } => {
            print_text(session.dispatch(Command::CreateLayer(name)).await?)
        }
        LayerCommand::Save { name, file } => {
            let yaml = read_text(&file)?;
            session.dispatch(Command::SaveLayer { name, yaml }).await?;
        }
        LayerCommand::Enable { name } => {
            session.dispatch(Command::EnableLayer(name.clone())).await?;
            println!("✅ layer {} enabled", name);
        }
        LayerCommand::Disable { name } => {
            session.dispatch(Command::DisableLayer(name.clone())).await?;
            println!("✅ layer {} disabled", name);
        }
        LayerCommand::Delete { name } => {
            session.dispatch(Command::DeleteLayer(name)).await?;
        }
    }
    Ok(())
}

/// Poll until Ctrl-C, printing the status whenever it changes.
async fn watch(session: &mut Session, toasts: &mut UnboundedReceiver<Toast>) -> anyhow::Result<()> {
    session.run(Command::ReloadLayers).await;
    session.start_polling();
    let mut last = None;
    loop {
        tokio::select! {
            event = session.recv_poll_event() => {
                let Some(event) = event else { break };
                session.handle_poll_event(&event).await;
                if let PollEvent::Failed(e) = event {
                    eprintln!("❌ {}", e);
                    continue;
                }
                let view = session.status().cloned();
                if view.is_some() && view != last {
                    if let Some(view) = &view {
                        print_status(view, None);
                    }
                    last = view;
                }
            }
            Some(toast) = toasts.recv() => print_toast(&toast),
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

async fn follow_seed(session: &mut Session) -> anyhow::Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    session.start_polling();
    while let Some(event) = session.next_poll_event().await {
        if let PollEvent::Failed(e) = event {
            spinner.set_message(format!("❌ {}", e));
            continue;
        }
        let Some(view) = session.status() else {
            continue;
        };
        if !view.buttons.kill_seed {
            let state = view.indicators.seed;
            spinner.finish_with_message(match state {
                StateClass::Error => "❌ seed failed".to_string(),
                _ => "✅ no seed running".to_string(),
            });
            return Ok(());
        }
        spinner.set_message(format!(
            "{} {}",
            view.indicators.seed,
            view.seed_info.clone().unwrap_or_default()
        ));
    }
    spinner.finish_and_clear();
    Ok(())
}

async fn add_rectangles(session: &mut Session, rects: Vec<Rectangle>) -> anyhow::Result<()> {
    for rect in rects {
        session.dispatch(Command::AddRectangle(rect)).await?;
    }
    Ok(())
}

/// Move the map and wait for the debounced overlay refresh.
async fn fetch_boxes(
    session: &mut Session,
    bounds: Rectangle,
    zoom: f64,
) -> anyhow::Result<Vec<seedmap::session::boxes::RenderedBox>> {
    if !session.boxes().show_boxes() {
        bail!("coverage boxes are disabled");
    }
    let mut overlay = session.boxes().subscribe();
    session
        .dispatch(Command::MoveViewport(Viewport { bounds, zoom }))
        .await?;
    tokio::time::timeout(Duration::from_secs(30), overlay.changed())
        .await
        .context("Timed out waiting for coverage boxes")??;
    let boxes = overlay.borrow().clone();
    Ok(boxes)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_bytes(outcome: Outcome, path: &Path) -> anyhow::Result<()> {
    let Outcome::Bytes(bytes) = outcome else {
        bail!("backend sent no data");
    };
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("💾 {} bytes written to {}", bytes.len(), path.display());
    Ok(())
}

fn print_text(outcome: Outcome) {
    if let Outcome::Text(text) = outcome {
        println!("{}", text);
    }
}

fn print_toast(toast: &Toast) {
    match toast.kind {
        ToastKind::Info => println!("💬 {}", toast.message),
        ToastKind::Error => eprintln!("❌ {}", toast.message),
    }
}

fn drain_toasts(toasts: &mut UnboundedReceiver<Toast>) {
    while let Ok(toast) = toasts.try_recv() {
        print_toast(&toast);
    }
}
