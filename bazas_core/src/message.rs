use crate::card::Card;
use crate::state::{PlayerId, PlayerView, Round, Settings};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoomId = String;
pub type PlayerSecret = Uuid;

// --- 客户端 -> 服务器 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    // --- 房间管理消息 ---
    /// 创建一个新房间并以该昵称加入
    CreateRoom { name: String, settings: Settings },
    /// 加入一个已存在的房间。带上之前拿到的 secret 即为断线重连。
    JoinRoom { room_id: RoomId, name: String, secret: Option<PlayerSecret> },

    // --- 游戏内消息 ---
    StartGame,
    /// 叫墩
    RequestBazas(u32),
    PlayCard(Card),
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// 成功加入或创建房间后，私密地发给该玩家
    RoomJoined {
        room_id: RoomId,
        your_id: PlayerId,
        your_secret: PlayerSecret, // 用于断线重连的凭证
        room: RoomInfo,
    },
    /// 一个新玩家加入了房间
    PlayerJoined { player: PlayerView },
    GameStarted(RoomInfo),
    /// 每次状态变化后的房间快照
    Next(RoomInfo),
    /// 只发给手牌的主人
    Cards { hand: Vec<Card> },
    /// 一墩出完，桌面展示一段时间后再继续
    TrickWon { winner: PlayerId },
    /// 按分数从低到高的最终记分表
    GameOver { score_table: Vec<PlayerView> },

    Info { message: String },
    Error { message: String },
}

/// 广播给所有人的房间信息
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub started: bool,
    pub players: Vec<PlayerView>,
    pub round: Round,
}

impl From<Card> for ClientMessage {
    fn from(card: Card) -> Self {
        ClientMessage::PlayCard(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    #[test]
    fn test_client_message_json_shape() {
        let msg: ClientMessage = Card::new(Rank::Ten, Suit::Heart).into();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"PlayCard":{"suit":"heart","rank":"Ten"}}"#);

        let parsed: ClientMessage = serde_json::from_str(r#"{"RequestBazas":2}"#).unwrap();
        assert_eq!(parsed, ClientMessage::RequestBazas(2));
    }

    #[test]
    fn test_room_info_carries_phase_tag() {
        let info = RoomInfo { started: false, players: vec![], round: Round::AwaitingStart };
        let value = serde_json::to_value(ServerMessage::Next(info.clone())).unwrap();
        assert_eq!(value["Next"]["round"]["phase"], "AwaitingStart");
        let back: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, ServerMessage::Next(info));
    }
}
