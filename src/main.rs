use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use media_viewer::backend::HttpBackend;
use media_viewer::config::{Configuration, PreloadConfig};
use media_viewer::console::{self, ConsoleCommand};
use media_viewer::document::HeadlessDocument;
use media_viewer::events::{AssetReady, PreloadRequest, SessionInput, ViewerEvent};
use media_viewer::focus::ElementId;
use media_viewer::lightbox::{Lightbox, LightboxOptions, OVERLAY_CONTROLS};
use media_viewer::scene::Scene;
use media_viewer::tasks::preloader::{self, DefaultFetcher, Preloader};
use media_viewer::tasks::session;
use media_viewer::viewer::GalleryViewer;

#[derive(Debug, Parser)]
#[command(
    name = "media-viewer",
    version,
    about = "headless gallery and lightbox viewer driven from the terminal"
)]
struct Args {
    #[command(subcommand)]
    mode: Mode,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Inline gallery with search, tag filters and the add/remove flow
    Gallery {
        /// Path to YAML config
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
    /// Modal lightbox over a headless document
    Lightbox {
        /// Path to YAML config
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

fn init_tracing(verbosity: u8) {
    // RUST_LOG wins; -v raises the default
    let fallback = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load(config: &Path) -> Result<Configuration> {
    let cfg = Configuration::from_yaml_file(config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    match args.mode {
        Mode::Gallery { config } => run_gallery(load(&config)?, cancel).await,
        Mode::Lightbox { config } => run_lightbox(load(&config)?, cancel).await,
    }
}

/// Spawns the preload task when enabled and returns the viewer-side handle
/// plus the completion stream.
fn spawn_preloader(
    cfg: &PreloadConfig,
    tasks: &mut JoinSet<Result<()>>,
    cancel: &CancellationToken,
) -> (Preloader, mpsc::Receiver<AssetReady>) {
    let (ready_tx, ready_rx) = mpsc::channel::<AssetReady>(cfg.queue_depth); // Preloader -> Owner
    if !cfg.enabled {
        return (Preloader::disabled(), ready_rx);
    }
    let (request_tx, request_rx) = mpsc::channel::<PreloadRequest>(cfg.queue_depth); // Viewer -> Preloader
    let fetcher = Arc::new(DefaultFetcher::new(
        reqwest::Client::new(),
        cfg.asset_root.clone(),
    ));
    let cancel = cancel.clone();
    let max_in_flight = cfg.max_in_flight;
    tasks.spawn(async move {
        preloader::run(request_rx, fetcher, ready_tx, cancel, max_in_flight)
            .await
            .context("preload task failed")
    });
    (Preloader::new(request_tx), ready_rx)
}

async fn drain(mut tasks: JoinSet<Result<()>>) {
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }
}

async fn run_gallery(cfg: Configuration, cancel: CancellationToken) -> Result<()> {
    cfg.validate_gallery()
        .context("invalid gallery configuration")?;
    let mut tasks = JoinSet::new();
    let (preloader, ready_rx) = spawn_preloader(&cfg.preload, &mut tasks, &cancel);
    let (events_tx, events_rx) = mpsc::unbounded_channel::<ViewerEvent>(); // Viewer -> Session
    let (input_tx, input_rx) = mpsc::channel::<SessionInput>(16); // Console -> Session

    let backend = match (cfg.items_endpoint(), &cfg.backend) {
        (Some(endpoint), Some(backend_cfg)) => Some(Arc::new(HttpBackend::new(
            &endpoint,
            backend_cfg.csrf_token.clone(),
            backend_cfg.timeout,
        )?)),
        _ => None,
    };
    let select_id = cfg.backend.as_ref().and_then(|b| b.select_id.clone());
    let viewer =
        GalleryViewer::with_channels(cfg.viewer.clone(), Scene::default(), preloader, events_tx)?;
    println!("{}", viewer.presenter());

    let session = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            session::run(
                viewer,
                backend,
                input_rx,
                events_rx,
                ready_rx,
                select_id,
                cancel,
                {
                    let mut pickers = 0;
                    move |viewer: &GalleryViewer<Scene>| {
                        let scene = viewer.presenter();
                        println!("{scene}");
                        if scene.file_picker_requests > pickers {
                            pickers = scene.file_picker_requests;
                            println!("choose a picture with: add <path>");
                        }
                    }
                },
            )
            .await
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else {
            tracing::info!("stdin closed; finishing");
            break;
        };
        let command = match console::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        let inputs = match command {
            ConsoleCommand::Input(events) => events.into_iter().map(SessionInput::Input).collect(),
            ConsoleCommand::Search(query) => vec![SessionInput::Search(query)],
            ConsoleCommand::Tag(tag) => vec![SessionInput::Tag(tag)],
            ConsoleCommand::Add(None) => vec![SessionInput::AddClicked],
            ConsoleCommand::Add(Some(path)) => vec![SessionInput::FileChosen(path)],
            ConsoleCommand::Remove(id) => vec![SessionInput::RemoveClicked(id)],
            ConsoleCommand::Loaded => vec![SessionInput::StageLoaded(None)],
            ConsoleCommand::Refresh => vec![SessionInput::Refresh],
            ConsoleCommand::Show => vec![SessionInput::Redraw],
            ConsoleCommand::Help => {
                println!("{}", console::HELP);
                continue;
            }
            ConsoleCommand::Quit => break,
            ConsoleCommand::Open(_) | ConsoleCommand::Close => {
                eprintln!("open/close only apply to the lightbox");
                continue;
            }
        };
        for input in inputs {
            if input_tx.send(input).await.is_err() {
                tracing::warn!("session stopped; dropping console input");
                break;
            }
        }
    }
    drop(input_tx);

    let viewer = session.await.context("session task panicked")??;
    cancel.cancel();
    drop(viewer);
    drain(tasks).await;
    Ok(())
}

async fn run_lightbox(cfg: Configuration, cancel: CancellationToken) -> Result<()> {
    let mut tasks = JoinSet::new();
    let (preloader, mut ready_rx) = spawn_preloader(&cfg.preload, &mut tasks, &cancel);

    let trigger = cfg.lightbox.trigger.clone().map(ElementId::new);
    let mut document = HeadlessDocument::new()
        .with_body_overflow("auto")
        .with_overlay_controls(OVERLAY_CONTROLS);
    if let Some(trigger) = &trigger {
        document = document.with_focus(trigger.as_str());
    }
    let mut lightbox = Lightbox::new(
        document,
        Scene::default(),
        LightboxOptions {
            trigger,
            images: cfg.viewer.items.clone(),
            start_index: cfg.viewer.start_index,
        },
    )
    .with_preloader(preloader);
    if cfg.lightbox.auto_open {
        lightbox.show();
    }
    print_lightbox(&lightbox);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(AssetReady(src)) = ready_rx.recv() => {
                lightbox.asset_ready(&src);
                print_lightbox(&lightbox);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    tracing::info!("stdin closed; finishing");
                    break;
                };
                match console::parse_line(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => apply_lightbox_command(&mut lightbox, command),
                    Ok(None) => continue,
                    Err(msg) => {
                        eprintln!("{msg}");
                        continue;
                    }
                }
                print_lightbox(&lightbox);
            }
        }
    }

    lightbox.close();
    cancel.cancel();
    drop(lightbox);
    drain(tasks).await;
    Ok(())
}

fn apply_lightbox_command(lightbox: &mut Lightbox<HeadlessDocument, Scene>, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Input(events) => {
            for event in &events {
                lightbox.handle_input(event);
            }
        }
        ConsoleCommand::Open(start) => {
            if !lightbox.open(None, start) {
                eprintln!("nothing to show");
            }
        }
        ConsoleCommand::Close => {
            lightbox.close();
        }
        ConsoleCommand::Loaded => {
            if let Some(src) = lightbox.stage_src().map(str::to_string) {
                lightbox.stage_loaded(&src);
            }
        }
        ConsoleCommand::Help => println!("{}", console::HELP),
        ConsoleCommand::Show | ConsoleCommand::Quit => {}
        ConsoleCommand::Search(_)
        | ConsoleCommand::Tag(_)
        | ConsoleCommand::Add(_)
        | ConsoleCommand::Remove(_)
        | ConsoleCommand::Refresh => eprintln!("filters and editing only apply to the gallery"),
    }
}

fn print_lightbox(lightbox: &Lightbox<HeadlessDocument, Scene>) {
    let doc = lightbox.document();
    let focus = doc.active.as_ref().map(ElementId::as_str).unwrap_or("-");
    if lightbox.is_open() {
        println!(
            "lightbox: open (body overflow {:?}, focus {focus}, listeners {})",
            doc.body_overflow,
            doc.total_listeners()
        );
        print!("{}", lightbox.presenter());
    } else {
        println!(
            "lightbox: closed (body overflow {:?}, focus {focus}, listeners {})",
            doc.body_overflow,
            doc.total_listeners()
        );
    }
}
