use std::collections::HashMap;

use bazas_core::{
    BazasEngine, Card, CircleOutcome, GameError, PlayerId, PlayerSecret, RoomId, RoomInfo, ServerMessage,
    Settings,
};
use parking_lot::Mutex as P_Mutex;
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// 生成 7 位字母数字的房间号
pub fn create_room_id() -> RoomId {
    rand::rng().sample_iter(&Alphanumeric).take(7).map(char::from).collect()
}

// 单个房间的状态
// 重要‼️：严格规定使用锁的顺序，避免死锁：
// participants -> engine
// engine 的锁同时保证了同一房间内所有操作串行执行
pub struct Room {
    pub id: RoomId,
    engine: P_Mutex<BazasEngine>,
    participants: RwLock<HashMap<PlayerId, Participant>>,
}

// 玩家的身份凭证与网络连接
struct Participant {
    name: String,
    secret: PlayerSecret,
    // 断线后为 None，重连时换成新的通道
    sender: Option<mpsc::Sender<ServerMessage>>,
}

/// 一条待发送的消息及其接收者
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    ToAll(ServerMessage),
    ToAllExcept(PlayerId, ServerMessage),
    ToPlayer(PlayerId, ServerMessage),
}

fn room_info(engine: &BazasEngine) -> RoomInfo {
    RoomInfo {
        started: engine.is_started(),
        players: engine.get_players(),
        round: engine.round().clone(),
    }
}

// 每个玩家各自的手牌
fn hands(engine: &BazasEngine) -> impl Iterator<Item = Outgoing> + '_ {
    engine
        .players()
        .iter()
        .map(|p| Outgoing::ToPlayer(p.id, ServerMessage::Cards { hand: p.hand.clone() }))
}

impl Room {
    pub fn new(id: RoomId, settings: Settings) -> Self {
        Room {
            id,
            engine: P_Mutex::new(BazasEngine::new(settings)),
            participants: RwLock::new(HashMap::new()),
        }
    }

    /// 加入房间或断线重连
    ///
    /// 带着匹配的 secret 和昵称时重新绑定到原来的玩家，并补发手牌；
    /// 否则作为新玩家加入，游戏开始后不再接受新玩家。
    pub async fn join(
        &self,
        name: String,
        secret: Option<PlayerSecret>,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<(PlayerId, Vec<Outgoing>), GameError> {
        let mut participants = self.participants.write().await;

        let returning = match secret {
            Some(s) => participants.iter_mut().find(|(_, p)| p.secret == s && p.name == name),
            None => None,
        };
        if let Some((&player_id, participant)) = returning {
            participant.sender = Some(sender);
            let engine = self.engine.lock();
            let hand = engine.player(player_id).map(|p| p.hand.clone()).unwrap_or_default();
            info!("玩家 {} 重新连接到房间 {}", player_id, self.id);
            return Ok((player_id, vec![
                Outgoing::ToPlayer(player_id, ServerMessage::RoomJoined {
                    room_id: self.id.clone(),
                    your_id: player_id,
                    your_secret: participant.secret,
                    room: room_info(&engine),
                }),
                Outgoing::ToPlayer(player_id, ServerMessage::Cards { hand }),
            ]));
        }

        let mut engine = self.engine.lock();
        let player = engine.add_player(name.clone())?;
        let player_secret = Uuid::new_v4();
        participants.insert(player.id, Participant { name, secret: player_secret, sender: Some(sender) });

        let info = room_info(&engine);
        let view = info.players.iter().find(|p| p.id == player.id).cloned();
        info!("玩家 {} 加入了房间 {}", player.id, self.id);

        let mut out = vec![Outgoing::ToPlayer(player.id, ServerMessage::RoomJoined {
            room_id: self.id.clone(),
            your_id: player.id,
            your_secret: player_secret,
            room: info,
        })];
        if let Some(view) = view {
            out.push(Outgoing::ToAllExcept(player.id, ServerMessage::PlayerJoined { player: view }));
        }
        Ok((player.id, out))
    }

    pub fn start_game(&self) -> Result<Vec<Outgoing>, GameError> {
        let mut engine = self.engine.lock();
        engine.start_game()?;
        info!("房间 {} 开始游戏", self.id);
        let mut out: Vec<Outgoing> = hands(&engine).collect();
        out.push(Outgoing::ToAll(ServerMessage::GameStarted(room_info(&engine))));
        Ok(out)
    }

    pub fn request_bazas(&self, player_id: PlayerId, bazas: u32) -> Result<Vec<Outgoing>, GameError> {
        let mut engine = self.engine.lock();
        engine.request_bazas(player_id, bazas)?;
        Ok(vec![Outgoing::ToAll(ServerMessage::Next(room_info(&engine)))])
    }

    /// 出牌。第二个返回值是赢家，表示调用方需要在停顿后调用 `end_circle`。
    pub fn play_card(&self, player_id: PlayerId, card: Card) -> Result<(Vec<Outgoing>, Option<PlayerId>), GameError> {
        let mut engine = self.engine.lock();
        let winner = engine.play_card(player_id, card)?;
        let hand = engine.player(player_id).map(|p| p.hand.clone()).unwrap_or_default();

        let mut out = vec![
            Outgoing::ToAll(ServerMessage::Next(room_info(&engine))),
            Outgoing::ToPlayer(player_id, ServerMessage::Cards { hand }),
        ];
        if let Some(winner) = winner {
            out.push(Outgoing::ToAll(ServerMessage::TrickWon { winner }));
        }
        Ok((out, winner))
    }

    pub fn end_circle(&self) -> Result<Vec<Outgoing>, GameError> {
        let mut engine = self.engine.lock();
        let outcome = engine.end_circle()?;

        let mut out = vec![Outgoing::ToAll(ServerMessage::Next(room_info(&engine)))];
        match outcome {
            CircleOutcome::RoundContinues => {}
            CircleOutcome::NextRound(_) => out.extend(hands(&engine)),
            CircleOutcome::GameOver => {
                info!("房间 {} 游戏结束", self.id);
                out.push(Outgoing::ToAll(ServerMessage::GameOver { score_table: engine.get_score_table() }));
            }
        }
        Ok(out)
    }

    /// 玩家断开连接。返回房间里是否已经没有在线的玩家。
    ///
    /// 只有当 `sender` 仍是该玩家当前绑定的通道时才解除绑定，
    /// 这样重连之后旧连接迟到的断开不会影响新连接。
    pub async fn disconnect(&self, player_id: PlayerId, sender: &mpsc::Sender<ServerMessage>) -> bool {
        let mut participants = self.participants.write().await;
        if let Some(p) = participants.get_mut(&player_id) {
            if p.sender.as_ref().is_some_and(|s| s.same_channel(sender)) {
                p.sender = None;
            }
        }
        participants.values().all(|p| p.sender.is_none())
    }

    /// 房间里是否没有任何在线的玩家
    pub async fn is_unoccupied(&self) -> bool {
        self.participants.read().await.values().all(|p| p.sender.is_none())
    }

    /// 把消息发给对应的玩家
    pub async fn deliver(&self, messages: Vec<Outgoing>) {
        let participants = self.participants.read().await;
        for out in messages {
            match out {
                Outgoing::ToAll(msg) => broadcast(&participants, &msg, None).await,
                Outgoing::ToAllExcept(exclude, msg) => broadcast(&participants, &msg, Some(exclude)).await,
                Outgoing::ToPlayer(player_id, msg) => {
                    if let Some(sender) = participants.get(&player_id).and_then(|p| p.sender.as_ref()) {
                        if sender.send(msg).await.is_err() {
                            warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
                        }
                    }
                }
            }
        }
    }
}

/// 向房间内所有在线玩家广播消息
async fn broadcast(participants: &HashMap<PlayerId, Participant>, message: &ServerMessage, exclude: Option<PlayerId>) {
    for (player_id, p) in participants {
        if Some(*player_id) == exclude {
            continue;
        }
        let Some(sender) = &p.sender else { continue };
        if sender.send(message.clone()).await.is_err() {
            // 发送失败，说明该玩家也断开了，后续由其自己的 handle_socket 任务处理
            warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
        }
    }
}
