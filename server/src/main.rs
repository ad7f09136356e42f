use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::services::ServeDir;

mod handlers;
mod logic;
mod state;
mod storage;

use crate::handlers::{ping_handler, ws_handler};
use crate::state::{AppState, Board};
use crate::storage::{FileStorage, Storage};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data"));
    if let Err(error) = tokio::fs::create_dir_all(&data_dir).await {
        eprintln!("Failed to create data dir: {error}");
    }
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir));
    let dots = storage.load().await;
    eprintln!("Loaded {} dots", dots.len());

    let state = AppState {
        board: Arc::new(tokio::sync::RwLock::new(Board::new(dots))),
        storage,
    };
    let flush_state = state.clone();

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/ping", get(ping_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let maybe_dots = {
                let mut board = flush_state.board.write().await;
                if board.dirty {
                    board.dirty = false;
                    Some(board.dots.clone())
                } else {
                    None
                }
            };
            if let Some(dots) = maybe_dots {
                flush_state.storage.save(&dots).await;
            }
        }
    });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Dot notes running at http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    axum::serve(listener, app).await.expect("Server crashed");
}
