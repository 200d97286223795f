use anyhow::{Context, Result};
use clap::Parser;
use plant_chat::config::TransportKind;
use plant_chat::{
    create_router, AppState, Config, Conversation, ConversationParts, DeviceProviderFactory,
    HttpUploader, MemoryTransport, NatsTransport, Transport, WebSocketTransport,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "plant-chat")]
#[command(about = "Plant care assistant chat service")]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/plant-chat")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    info!("Plant Chat v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let transport: Arc<dyn Transport> = match cfg.transport.kind {
        TransportKind::Websocket => Arc::new(WebSocketTransport::new(cfg.transport.url.clone())),
        TransportKind::Nats => Arc::new(NatsTransport::new(
            cfg.transport.url.clone(),
            cfg.session_id(),
        )),
        TransportKind::Memory => {
            let (transport, _peer) = MemoryTransport::pair();
            Arc::new(transport)
        }
    };

    let devices = DeviceProviderFactory::create(cfg.audio_source()?)
        .context("Failed to create capture device provider")?;

    let conversation = Conversation::new(ConversationParts {
        transport,
        uploader: Arc::new(HttpUploader::new(cfg.upload_endpoints())),
        devices: Arc::from(devices),
        config: cfg.conversation.clone(),
        typing: cfg.typing_config(),
        recorder: cfg.recorder_config(),
    })
    .await;

    if let Err(e) = conversation.connect().await {
        warn!("Starting without a live connection: {}", e);
    }

    let bind = args.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let app = create_router(AppState::new(conversation.clone()));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("HTTP server failed")?;

    conversation.shutdown().await;
    info!("Goodbye");

    Ok(())
}
