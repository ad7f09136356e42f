use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use dotnotes_shared::{ClientMessage, ServerMessage};

use crate::logic::{apply_client_message, broadcast_all};
use crate::state::AppState;

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = Uuid::new_v4();

    let dots_snapshot = {
        let mut board = state.board.write().await;
        board.peers.insert(connection_id, tx);
        eprintln!(
            "WS connected conn={connection_id} peers={}",
            board.peers.len()
        );
        board.dots.clone()
    };

    let dots_len = dots_snapshot.len();
    if let Ok(sync_payload) = bincode::encode_to_vec(
        &ServerMessage::Sync {
            dots: dots_snapshot,
        },
        bincode::config::standard(),
    ) {
        eprintln!(
            "WS sync send conn={connection_id} dots={dots_len} bytes={}",
            sync_payload.len()
        );
        if let Err(error) = socket_sender.send(Message::Binary(sync_payload)).await {
            eprintln!("WS sync send failed conn={connection_id} error={error:?}");
        }
    } else {
        eprintln!("WS sync serialize failed conn={connection_id}");
    }

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Ok(payload) = bincode::encode_to_vec(&message, bincode::config::standard()) {
                if socket_sender.send(Message::Binary(payload)).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut close_frame = None;

    while let Some(Ok(message)) = socket_receiver.next().await {
        let client_message = match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_message) => client_message,
                Err(error) => {
                    eprintln!("WS text parse error conn={connection_id}: {error}");
                    continue;
                }
            },
            Message::Binary(data) => {
                match bincode::decode_from_slice::<ClientMessage, _>(
                    &data,
                    bincode::config::standard(),
                ) {
                    Ok((client_message, _)) => client_message,
                    Err(error) => {
                        eprintln!("WS binary parse error conn={connection_id}: {error}");
                        continue;
                    }
                }
            }
            Message::Close(frame) => {
                close_frame = frame;
                break;
            }
            _ => continue,
        };

        let mut board = state.board.write().await;
        for server_message in apply_client_message(&mut board, client_message) {
            // Echoes go to everyone, the sender included; a client's own
            // confirmation arrives the same way a collaborator's change does.
            broadcast_all(&board, &server_message);
        }
    }

    {
        let mut board = state.board.write().await;
        board.peers.remove(&connection_id);
        eprintln!(
            "WS disconnected conn={connection_id} peers={}",
            board.peers.len()
        );
        if let Some(frame) = &close_frame {
            eprintln!(
                "WS close frame conn={connection_id} code={:?} reason={:?}",
                frame.code, frame.reason
            );
        }
    }
    send_task.abort();
}
