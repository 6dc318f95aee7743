use anyhow::Result;
use calloop::EventLoop;
use calloop::channel::{Event, Sender};
use calloop_wayland_source::WaylandSource;
use nix::sys::signal::{SigSet, Signal};
use wayland_client::{Connection, globals::registry_queue_init};
use menubar::config::load_config;
use menubar::executor::ProcessExecutor;
use menubar::launcher::{Launcher, LauncherCommand};
use menubar::providers::build_provider;
use menubar::ui::wayland::WaylandApp;
use menubar::ui::render::Renderer;
use menubar::ui::icons::{IconCache, IconKey};
use std::path::PathBuf;
use std::thread;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stay resident: start hidden, toggle on SIGUSR1, refresh providers on SIGUSR2
    #[arg(short, long)]
    daemon: bool,
}

/// Forwards SIGUSR1/SIGUSR2 to the event loop. Must run before any other
/// thread is spawned so that every thread inherits the blocked mask.
fn spawn_signal_watcher(tx: Sender<LauncherCommand>) -> Result<()> {
    let mut signals = SigSet::empty();
    signals.add(Signal::SIGUSR1);
    signals.add(Signal::SIGUSR2);
    signals.thread_block()?;

    thread::spawn(move || loop {
        let command = match signals.wait() {
            Ok(Signal::SIGUSR1) => LauncherCommand::Toggle,
            Ok(Signal::SIGUSR2) => LauncherCommand::Refresh(None),
            Ok(_) => continue,
            Err(e) => {
                log::error!("Signal wait failed: {}", e);
                break;
            }
        };
        if tx.send(command).is_err() {
            break;
        }
    });
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let config = load_config(args.config.as_deref())?;

    let (tx_commands, rx_commands) = calloop::channel::channel::<LauncherCommand>();
    if args.daemon {
        spawn_signal_watcher(tx_commands.clone())?;
    }

    // 2. Register providers
    let executor = ProcessExecutor::new(config.general.terminal.clone());
    let mut launcher = Launcher::new(&config, Box::new(executor));
    for provider_config in &config.providers {
        let provider = build_provider(provider_config)?;
        if let Err(e) = launcher.add_provider(provider) {
            log::warn!("Skipping provider: {}", e);
        }
    }

    // 3. Setup Wayland Connection & Event Loop
    let mut event_loop: EventLoop<WaylandApp> = EventLoop::try_new()?;
    let conn = Connection::connect_to_env()?;
    let (globals, event_queue) = registry_queue_init::<WaylandApp>(&conn)?;
    let qh = event_queue.handle();

    // 4. Init UI
    let (tx_icons, rx_icons) = calloop::channel::channel::<(IconKey, Option<tiny_skia::Pixmap>)>();
    let renderer = Renderer::new(IconCache::new(tx_icons), &config.theme)?;
    let mut app = WaylandApp::new(&globals, &qh, config, launcher, renderer, args.daemon);
    app.create_surface(&qh);

    // Icon loader results
    event_loop.handle().insert_source(rx_icons, |event, _, app: &mut WaylandApp| {
        if let Event::Msg((key, pixmap)) = event {
            app.renderer.insert_icon(key, pixmap);
            if app.launcher.is_visible() {
                app.render();
            }
        }
    }).map_err(|e| anyhow::anyhow!("inserting icon source: {}", e.error))?;

    // Commands from other threads
    event_loop.handle().insert_source(rx_commands, |event, _, app: &mut WaylandApp| {
        if let Event::Msg(command) = event {
            log::debug!("Command: {:?}", command);
            app.handle_command(command);
        }
    }).map_err(|e| anyhow::anyhow!("inserting command source: {}", e.error))?;

    event_loop.handle().insert_source(
        WaylandSource::new(conn.clone(), event_queue),
        |_, queue, app| {
            queue.dispatch_pending(app)
        }
    ).map_err(|e| anyhow::anyhow!("inserting wayland source: {}", e.error))?;

    if !args.daemon {
        app.handle_command(LauncherCommand::Show);
    }

    // 5. Run Loop
    loop {
        if app.should_exit {
            break;
        }
        event_loop.dispatch(None, &mut app)?;
    }

    Ok(())
}
