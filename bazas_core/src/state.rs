use crate::card::Card;
use crate::error::GameError;
use crate::player::Player;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;

/// 房间设置：第一局的牌数和最高一局的牌数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub initial_card_amount: u32,
    pub last_card_amount: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { initial_card_amount: 3, last_card_amount: 8 }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.initial_card_amount == 0 {
            return Err(GameError::InvalidSettings("起始牌数至少为 1".to_string()));
        }
        if self.last_card_amount < self.initial_card_amount {
            return Err(GameError::InvalidSettings(format!(
                "最高牌数 {} 小于起始牌数 {}",
                self.last_card_amount, self.initial_card_amount
            )));
        }
        if self.last_card_amount > 51 {
            return Err(GameError::InvalidSettings(format!("最高牌数 {} 超过牌堆容量", self.last_card_amount)));
        }
        Ok(())
    }

    /// 最大的一局需要的总牌数（含王牌）
    pub fn cards_needed(&self, players: usize) -> usize {
        players * self.last_card_amount as usize + 1
    }
}

/// 每局牌数的变化方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// 发牌时确定、整局不变的信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub cards: u32,
    pub direction: Direction,
    pub trump_card: Card,
    pub first_to_act: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub player_id: PlayerId,
    pub bazas: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedCard {
    pub player_id: PlayerId,
    pub card: Card,
}

/// 叫墩阶段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bidding {
    pub deal: Deal,
    pub next_to_act: PlayerId,
    pub bids: Vec<Bid>,
}

/// 出牌阶段，跨越一局中的所有墩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickPlay {
    pub deal: Deal,
    pub bids: Vec<Bid>,
    pub next_to_act: PlayerId,
    pub cards_remaining: u32,
    pub led_card: Option<Card>,
    pub played: Vec<PlayedCard>,
    pub trick_winners: Vec<PlayerId>, // 每完成一墩追加一个
}

impl TrickPlay {
    pub fn bid_of(&self, player_id: PlayerId) -> Option<u32> {
        self.bids.iter().find(|b| b.player_id == player_id).map(|b| b.bazas)
    }

    pub fn tricks_won_by(&self, player_id: PlayerId) -> u32 {
        self.trick_winners.iter().filter(|&&id| id == player_id).count() as u32
    }
}

/// 当前局的状态。每个阶段只携带该阶段有效的字段。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase")]
pub enum Round {
    #[default]
    AwaitingStart,
    Bidding(Bidding),
    TrickInProgress(TrickPlay),
    /// 一墩已出完，等待 `end_circle`
    TrickResolved { play: TrickPlay, winner: PlayerId },
    GameOver,
}

impl Round {
    pub fn phase_name(&self) -> &'static str {
        match self {
            Round::AwaitingStart => "AwaitingStart",
            Round::Bidding(_) => "Bidding",
            Round::TrickInProgress(_) => "TrickInProgress",
            Round::TrickResolved { .. } => "TrickResolved",
            Round::GameOver => "GameOver",
        }
    }

    pub fn deal(&self) -> Option<&Deal> {
        match self {
            Round::Bidding(b) => Some(&b.deal),
            Round::TrickInProgress(p) | Round::TrickResolved { play: p, .. } => Some(&p.deal),
            Round::AwaitingStart | Round::GameOver => None,
        }
    }

    /// 获取当前应该行动的玩家ID (如果存在)
    pub fn next_to_act(&self) -> Option<PlayerId> {
        match self {
            Round::Bidding(b) => Some(b.next_to_act),
            Round::TrickInProgress(p) => Some(p.next_to_act),
            _ => None,
        }
    }

    pub fn bids(&self) -> &[Bid] {
        match self {
            Round::Bidding(b) => &b.bids,
            Round::TrickInProgress(p) | Round::TrickResolved { play: p, .. } => &p.bids,
            Round::AwaitingStart | Round::GameOver => &[],
        }
    }

    pub fn played(&self) -> &[PlayedCard] {
        match self {
            Round::TrickInProgress(p) | Round::TrickResolved { play: p, .. } => &p.played,
            _ => &[],
        }
    }
}

/// 已结束一局的存档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub cards: u32,
    pub direction: Direction,
    pub trump_card: Card,
    pub first_to_act: PlayerId,
    pub bids: Vec<Bid>,
    pub trick_winners: Vec<PlayerId>,
    pub points: Vec<(PlayerId, u32)>,
}

/// 给客户端看的玩家信息，不含手牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub bazas: u32,
    pub requested: Option<u32>,
    pub played_card: Option<Card>,
}

/// `end_circle` 的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleOutcome {
    /// 本局还有墩要打，赢家先出
    RoundContinues,
    /// 本局结束并已发好下一局的牌
    NextRound(Round),
    GameOver,
}

/// 一场游戏。调用方负责串行化所有操作。
#[derive(Debug)]
pub struct BazasEngine<R = StdRng> {
    pub(crate) settings: Settings,
    pub(crate) players: Vec<Player>,  // 列表顺序就是出牌顺序，循环向右
    pub(crate) rounds: Vec<RoundSummary>,
    pub(crate) round: Round,
    pub(crate) rng: R,
}

impl<R> BazasEngine<R> {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_history(&self) -> &[RoundSummary] {
        &self.rounds
    }

    pub fn is_started(&self) -> bool {
        self.round != Round::AwaitingStart
    }

    pub fn is_game_over(&self) -> bool {
        self.round == Round::GameOver
    }
}
