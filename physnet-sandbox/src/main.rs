//! Sandbox: a small space arena served over WebSocket.
//!
//! Each connecting client gets a ship in a circular arena; `thrust`, `steer`
//! and `fire` events drive the ship's controller and actor. Static assets
//! (the bundled viewer) are served next to the `/ws` endpoint.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use physnet_server::{ConnectError, Server, ServerConfig, ServerHandle, ServerListener};

mod game;
mod net;

use net::WsSocket;

/// physnet sandbox server
#[derive(Parser)]
#[command(name = "physnet-sandbox")]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to serve on
    #[arg(short = 'p', long, default_value_t = 3000)]
    port: u16,

    /// Directory of static files to host
    #[arg(short = 'd', long, default_value = ".")]
    dir: PathBuf,
}

fn listener() -> ServerListener {
    let mut listener = ServerListener::default();

    listener.on_server_start = Some(Box::new(|server| {
        game::register(server);
        server.create_entity(game::ARENA_ID, "arena", json!({}));
        info!("session started");
    }));

    listener.on_server_stop = Some(Box::new(|_server| {
        info!("session stopped");
    }));

    listener.on_client_connect = Some(Box::new(|server, id, client| {
        let Some(props) = game::seat_props(id) else {
            return Err(ConnectError::Rejected(format!("no seat for id `{id}`")));
        };
        server.create_entity(id, "ship", props);
        client.send_system(json!({"seat": id}));
        info!(client = %id, "seated");
        Ok(())
    }));

    listener.on_client_disconnect = Some(Box::new(|server, id| {
        server.destroy_entity(id);
        info!(client = %id, "seat cleared");
    }));

    listener.on_event_message = Some(Box::new(|_server, id, data| {
        debug!(client = %id, %data, "event");
        true
    }));

    listener.on_system_message = Some(Box::new(|_server, id, data| {
        debug!(client = %id, %data, "system");
        true
    }));

    listener
}

async fn ws_handler(ws: WebSocketUpgrade, State(server): State<ServerHandle>) -> Response {
    ws.on_upgrade(move |socket| async move {
        match server.connect(Box::new(WsSocket::new(socket))).await {
            Ok(id) => info!(client = %id, "websocket client admitted"),
            Err(err) => warn!(%err, "websocket client refused"),
        }
    })
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut server = Server::new(ServerConfig::default());
    server.set_listener(listener());
    let handle = server.handle();
    tokio::spawn(async move { server.run().await });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(&args.dir))
        .layer(TraceLayer::new_for_http())
        .with_state(handle.clone());

    let tcp = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, args.port)).await?;
    info!(port = args.port, dir = %args.dir.display(), "serving");
    let served = axum::serve(tcp, app).await;
    handle.close();
    served
}
