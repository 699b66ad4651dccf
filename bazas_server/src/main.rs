mod config;
mod room;

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use dashmap::DashMap;
use futures_util::{stream::StreamExt, SinkExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bazas_core::{ClientMessage, GameError, PlayerId, PlayerSecret, RoomId, ServerMessage, Settings};

use crate::config::Config;
use crate::room::{create_room_id, Room};

// 服务器全局状态
struct AppState {
    rooms: DashMap<RoomId, Arc<Room>>,
    config: Config,
}

type SharedState = Arc<AppState>;

impl AppState {
    fn create_room(&self, settings: Settings) -> Result<Arc<Room>, GameError> {
        settings.validate()?;
        let mut room_id = create_room_id();
        while self.rooms.contains_key(&room_id) {
            room_id = create_room_id();
        }
        let room = Arc::new(Room::new(room_id.clone(), settings));
        self.rooms.insert(room_id.clone(), room.clone());
        info!("房间已创建: {} ({:?})", room_id, settings);
        Ok(room)
    }

    /// 超时后仍没有在线玩家的房间被移除
    async fn remove_if_unoccupied(&self, room_id: &RoomId) -> bool {
        let Some(room) = self.rooms.get(room_id).map(|r| r.clone()) else {
            return false;
        };
        if !room.is_unoccupied().await {
            return false;
        }
        self.rooms.remove(room_id);
        info!("房间 {} 长时间无人加入，已被移除", room_id);
        true
    }
}

fn schedule_empty_room_cleanup(state: SharedState, room_id: RoomId) {
    tokio::spawn(async move {
        tokio::time::sleep(state.config.empty_room_ttl()).await;
        state.remove_if_unoccupied(&room_id).await;
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let addr = config.addr();
    let state = SharedState::new(AppState {
        rooms: DashMap::new(),
        config,
    });

    let app = Router::new()
        .route("/", get(|| async { "Bazas" }))
        .route("/create", post(create_room_handler))
        .route("/ws", get(websocket_handler))
        .with_state(state);

    info!("服务器正在监听 {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest {
    start_with: u32,
    end_with: u32,
}

#[derive(Debug, Serialize)]
struct CreateRoomResponse {
    id: RoomId,
}

/// 通过 HTTP 创建房间，返回房间号
async fn create_room_handler(
    State(state): State<SharedState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, (StatusCode, String)> {
    let settings = Settings {
        initial_card_amount: req.start_with,
        last_card_amount: req.end_with,
    };
    let room = state
        .create_room(settings)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    schedule_empty_room_cleanup(state.clone(), room.id.clone());
    Ok(Json(CreateRoomResponse { id: room.id.clone() }))
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(p) => p,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接的上下文信息，加入房间后填充
    let mut player_context: Option<(RoomId, PlayerId)> = None;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, &state, &tx, &mut player_context).await;
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                    send_error(&tx, format!("无法解析的消息: {e}")).await;
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    if let Some((room_id, player_id)) = player_context {
        handle_disconnect(&state, room_id, player_id, &tx).await;
    }
    info!("客户端连接关闭");
}

async fn send_error(tx: &mpsc::Sender<ServerMessage>, message: impl Into<String>) {
    let _ = tx.send(ServerMessage::Error { message: message.into() }).await;
}

/// 核心消息处理逻辑
async fn handle_client_message(
    msg: ClientMessage,
    state: &SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(RoomId, PlayerId)>,
) {
    match msg {
        ClientMessage::CreateRoom { name, settings } => {
            if context.is_some() {
                send_error(tx, "你已经在一个房间里了").await;
                return;
            }
            match state.create_room(settings) {
                Ok(room) => join_room(room, name, None, tx, context).await,
                Err(e) => send_error(tx, e.to_string()).await,
            }
        }
        ClientMessage::JoinRoom { room_id, name, secret } => {
            if context.is_some() {
                send_error(tx, "你已经在一个房间里了").await;
                return;
            }
            let room = state.rooms.get(&room_id).map(|r| r.clone());
            match room {
                Some(room) => join_room(room, name, secret, tx, context).await,
                None => send_error(tx, "房间不存在").await,
            }
        }
        // 其他需要先加入房间才能执行的消息
        action => {
            let Some((room_id, player_id)) = context.clone() else {
                send_error(tx, "请先加入或创建房间").await;
                return;
            };
            let room = state.rooms.get(&room_id).map(|r| r.clone());
            let Some(room) = room else {
                send_error(tx, "房间不存在").await;
                return;
            };

            let result = match action {
                ClientMessage::StartGame => room.start_game(),
                ClientMessage::RequestBazas(bazas) => room.request_bazas(player_id, bazas),
                ClientMessage::PlayCard(card) => room.play_card(player_id, card).map(|(messages, winner)| {
                    if winner.is_some() {
                        schedule_end_circle(room.clone(), state.config.trick_pause());
                    }
                    messages
                }),
                ClientMessage::CreateRoom { .. } | ClientMessage::JoinRoom { .. } => return,
            };

            match result {
                Ok(messages) => room.deliver(messages).await,
                Err(e) => {
                    warn!("房间 {} 拒绝了玩家 {} 的操作: {}", room_id, player_id, e);
                    send_error(tx, e.to_string()).await;
                }
            }
        }
    }
}

async fn join_room(
    room: Arc<Room>,
    name: String,
    secret: Option<PlayerSecret>,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(RoomId, PlayerId)>,
) {
    match room.join(name, secret, tx.clone()).await {
        Ok((player_id, messages)) => {
            *context = Some((room.id.clone(), player_id));
            room.deliver(messages).await;
        }
        Err(e) => send_error(tx, format!("无法加入房间: {e}")).await,
    }
}

/// 一墩出完后让所有人看一会儿桌面，再进入下一墩
fn schedule_end_circle(room: Arc<Room>, pause: std::time::Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(pause).await;
        match room.end_circle() {
            Ok(messages) => room.deliver(messages).await,
            Err(e) => warn!("房间 {} 结束一墩失败: {}", room.id, e),
        }
    });
}

/// 玩家断开连接后的处理
async fn handle_disconnect(
    state: &SharedState,
    room_id: RoomId,
    player_id: PlayerId,
    tx: &mpsc::Sender<ServerMessage>,
) {
    info!("玩家 {} 从房间 {} 断开连接", player_id, room_id);
    let Some(room) = state.rooms.get(&room_id).map(|r| r.clone()) else {
        return;
    };

    // 判断是否清空房间
    if room.disconnect(player_id, tx).await {
        state.rooms.remove(&room_id);
        info!("房间 {} 已空，已被移除", room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> SharedState {
        SharedState::new(AppState {
            rooms: DashMap::new(),
            config: Config::try_parse_from(["bazas_server"]).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_unjoined_room_is_removed() {
        let state = test_state();
        let room = state.create_room(Settings::default()).unwrap();
        assert!(state.remove_if_unoccupied(&room.id).await);
        assert!(!state.rooms.contains_key(&room.id));
        assert!(!state.remove_if_unoccupied(&room.id).await);
    }

    #[tokio::test]
    async fn test_joined_room_is_kept() {
        let state = test_state();
        let room = state.create_room(Settings::default()).unwrap();
        let (tx, _rx) = mpsc::channel(8);
        room.join("Ana".into(), None, tx).await.unwrap();
        assert!(!state.remove_if_unoccupied(&room.id).await);
        assert!(state.rooms.contains_key(&room.id));
    }

    #[test]
    fn test_create_room_rejects_invalid_settings() {
        let state = test_state();
        let settings = Settings { initial_card_amount: 0, last_card_amount: 3 };
        assert!(state.create_room(settings).is_err());
        assert!(state.rooms.is_empty());
    }
}
