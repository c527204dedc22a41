mod app;
mod config;
mod engine;
mod error;
mod event;
mod generation;
mod session;
#[cfg(test)]
mod testing;
mod theme;
mod ui;

use app::ForgeApp;
use config::Config;
use eframe::egui;
use engine::scheduler::SystemClock;
use generation::HttpGenerationService;
use session::Session;
use std::sync::{mpsc, Arc};
use theme::Theme;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use ui::channel::{ChannelUi, QueryBuffer};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "forgebot=info".into()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "failed to load config; using defaults");
        Config::default()
    });
    info!(endpoint = %config.service.endpoint, "starting forgebot");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("forgebot-runtime")
        .build()?;
    let runtime_handle = runtime.handle().clone();

    let service = HttpGenerationService::new(config.service.endpoint.clone(), config.service.timeout())?;
    let (event_tx, event_rx) = mpsc::channel();
    let (command_tx, command_rx) = tokio::sync::mpsc::unbounded_channel();
    let query = QueryBuffer::default();
    let theme = Theme::default();
    let debounce = config.analysis.debounce();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 560.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "forgebot",
        native_options,
        Box::new(move |creation_context| {
            theme.apply_visuals(&creation_context.egui_ctx);
            let ui = Arc::new(ChannelUi::new(
                event_tx,
                creation_context.egui_ctx.clone(),
                Arc::clone(&query),
            ));
            let session = Arc::new(Session::new(service, ui, SystemClock::new(), debounce));
            session.welcome();
            runtime_handle.spawn(session::run(session, command_rx));
            Ok(Box::new(ForgeApp::new(event_rx, command_tx, query, theme)))
        }),
    )?;

    drop(runtime);
    Ok(())
}
