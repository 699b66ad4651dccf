//! # Bazas 核心逻辑库
//!
//! 这个 `core` crate 包含了 Bazas（叫墩的吃墩类纸牌游戏）的规则引擎：
//! 牌与牌力、牌堆、玩家、每局状态机、计分，以及客户端-服务器通信消息的定义。
//! 引擎是同步、单写者的，调用方负责把并发的玩家动作串行化后再调用。

mod card;
mod deck;
mod error;
mod logic;
mod message;
mod player;
mod state;

pub use card::*;

pub use deck::Deck;

pub use error::GameError;

pub use logic::{next_round_size, round_points, trick_winner};

pub use message::*;

pub use player::Player;

pub use state::*;
