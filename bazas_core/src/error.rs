use crate::card::{Card, Suit};
use crate::state::PlayerId;
use thiserror::Error;

/// 引擎拒绝一次操作的原因。
///
/// 任何返回 `Err` 的操作都不会修改游戏状态。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    // --- 顺序错误 ---
    #[error("当前阶段 {phase} 不能执行 {action}")]
    WrongPhase { action: &'static str, phase: &'static str },
    #[error("还没有轮到玩家 {actual}，应由 {expected} 出牌")]
    NotYourTurn { expected: PlayerId, actual: PlayerId },
    #[error("玩家 {0} 这一墩已经出过牌")]
    AlreadyPlayed(PlayerId),
    #[error("玩家 {0} 本局已经叫过墩数")]
    DuplicateBid(PlayerId),

    // --- 规则错误 ---
    #[error("必须跟出 {0} 花色")]
    MustFollowSuit(Suit),
    #[error("叫墩总数 {total} 不能等于本局牌数 {cards}")]
    InvalidBidSum { total: u32, cards: u32 },

    // --- 资源不足 ---
    #[error("牌堆已空")]
    EmptyDeck,
    #[error("牌堆只剩 {remaining} 张，无法抽出 {requested} 张")]
    InsufficientCards { requested: usize, remaining: usize },

    // --- 引用错误 ---
    #[error("房间里还没有玩家")]
    NoPlayers,
    #[error("未知玩家 {0}")]
    UnknownPlayer(PlayerId),
    #[error("手牌中没有 {0}")]
    CardNotInHand(Card),
    #[error("无法识别的牌 {0:?}")]
    InvalidCard(String),

    // --- 配置错误 ---
    #[error("无效的房间设置: {0}")]
    InvalidSettings(String),
}
