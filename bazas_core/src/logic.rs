use crate::card::{Card, Suit};
use crate::deck::Deck;
use crate::error::GameError;
use crate::player::Player;
use crate::state::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::mem;
use tracing::{debug, info};

// --- 纯规则函数 ---

/// 判定一墩的赢家
///
/// 有王牌时最大的王牌赢，否则首家花色中最大的牌赢。垫牌永远赢不了。
/// 没有任何合格的牌时返回 `None`（只会在空墩上出现）。
pub fn trick_winner(played: &[PlayedCard], trump: Suit, led: Suit) -> Option<PlayerId> {
    let best_of = |suit: Suit| {
        played
            .iter()
            .filter(|p| p.card.suit == suit)
            .max_by_key(|p| p.card.rank_value())
            .map(|p| p.player_id)
    };
    best_of(trump).or_else(|| best_of(led))
}

/// 一名玩家一局的得分：叫中得 10 + 墩数²，否则每墩 1 分
pub fn round_points(requested: u32, won: u32) -> u32 {
    if requested == won { 10 + won * won } else { won }
}

/// 计算下一局的牌数和方向
///
/// 递增到 `last_card_amount` 时转为递减，最高一局只打一次。
pub fn next_round_size(settings: &Settings, cards: u32, direction: Direction) -> (u32, Direction) {
    match direction {
        Direction::Increasing => {
            let next = (cards + 1).min(settings.last_card_amount);
            if next >= settings.last_card_amount {
                (next, Direction::Decreasing)
            } else {
                (next, Direction::Increasing)
            }
        }
        Direction::Decreasing => (cards.saturating_sub(1), Direction::Decreasing),
    }
}

/// 第一局的方向：起始牌数已经是最高时直接视为递减
fn initial_direction(settings: &Settings) -> Direction {
    if settings.initial_card_amount >= settings.last_card_amount {
        Direction::Decreasing
    } else {
        Direction::Increasing
    }
}

fn is_last_round(settings: &Settings, deal: &Deal) -> bool {
    deal.direction == Direction::Decreasing && deal.cards == settings.initial_card_amount
}

// --- 核心游戏流程 ---

impl BazasEngine<StdRng> {
    /// 使用系统熵作为随机源
    pub fn new(settings: Settings) -> Self {
        BazasEngine::with_rng(settings, StdRng::from_os_rng())
    }
}

impl<R: Rng> BazasEngine<R> {
    /// 注入随机源，测试中可以固定种子
    pub fn with_rng(settings: Settings, rng: R) -> Self {
        BazasEngine {
            settings,
            players: Vec::new(),
            rounds: Vec::new(),
            round: Round::AwaitingStart,
            rng,
        }
    }

    /// 加入一名新玩家。游戏开始后座次固定，不能再加人。
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<Player, GameError> {
        if self.is_started() {
            return Err(self.wrong_phase("add_player"));
        }
        let player = Player::new(name);
        self.players.push(player.clone());
        Ok(player)
    }

    /// 开始游戏
    ///
    /// - 随机选出第一个行动的玩家。
    /// - 第一局使用 `initial_card_amount` 张牌。
    /// - 洗牌、发牌，再抽一张作为王牌，进入叫墩阶段。
    pub fn start_game(&mut self) -> Result<Round, GameError> {
        if self.is_started() {
            return Err(self.wrong_phase("start_game"));
        }
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        self.settings.validate()?;
        let needed = self.settings.cards_needed(self.players.len());
        if needed > 52 {
            return Err(GameError::InsufficientCards { requested: needed, remaining: 52 });
        }

        let first_idx = self.rng.random_range(0..self.players.len());
        let first = self.players[first_idx].id;
        let bidding = self.deal(self.settings.initial_card_amount, initial_direction(&self.settings), first)?;
        info!(cards = bidding.deal.cards, first_to_act = %first, "游戏开始");
        self.round = Round::Bidding(bidding);
        Ok(self.round.clone())
    }

    /// 玩家叫墩
    ///
    /// 只有最后一个叫墩的人受限制：所有人叫的总数不能正好等于本局牌数。
    pub fn request_bazas(&mut self, player_id: PlayerId, bazas: u32) -> Result<Round, GameError> {
        let player_count = self.players.len();
        let next = self.player_to_the_right(player_id)?;
        let Round::Bidding(bidding) = &mut self.round else {
            return Err(self.wrong_phase("request_bazas"));
        };

        if bidding.bids.iter().any(|b| b.player_id == player_id) {
            return Err(GameError::DuplicateBid(player_id));
        }

        let completes_bidding = bidding.bids.len() + 1 == player_count;
        if completes_bidding {
            // 用 u64 累加，任意大的叫墩都不会溢出
            let total = bidding.bids.iter().map(|b| u64::from(b.bazas)).sum::<u64>() + u64::from(bazas);
            if total == u64::from(bidding.deal.cards) {
                return Err(GameError::InvalidBidSum { total: bidding.deal.cards, cards: bidding.deal.cards });
            }
        }

        debug!(player = %player_id, bazas, "叫墩");
        bidding.bids.push(Bid { player_id, bazas });
        bidding.next_to_act = next;

        if completes_bidding {
            if let Round::Bidding(b) = mem::take(&mut self.round) {
                self.round = Round::TrickInProgress(TrickPlay {
                    cards_remaining: b.deal.cards,
                    next_to_act: b.next_to_act,
                    deal: b.deal,
                    bids: b.bids,
                    led_card: None,
                    played: Vec::new(),
                    trick_winners: Vec::new(),
                });
            }
        }
        Ok(self.round.clone())
    }

    /// 玩家出牌
    ///
    /// 返回 `Some(winner)` 表示这张牌结束了当前这一墩，调用方随后应调用 `end_circle`。
    pub fn play_card(&mut self, player_id: PlayerId, card: Card) -> Result<Option<PlayerId>, GameError> {
        let player_count = self.players.len();
        let next = self.player_to_the_right(player_id)?;
        let player_idx = self.player_index(player_id)?;
        let Round::TrickInProgress(play) = &mut self.round else {
            return Err(self.wrong_phase("play_card"));
        };

        // 1. 验证
        if play.played.iter().any(|p| p.player_id == player_id) {
            return Err(GameError::AlreadyPlayed(player_id));
        }
        if play.next_to_act != player_id {
            return Err(GameError::NotYourTurn { expected: play.next_to_act, actual: player_id });
        }
        let player = &mut self.players[player_idx];
        if !player.has_card(&card) {
            return Err(GameError::CardNotInHand(card));
        }
        if let Some(led) = play.led_card {
            if card.suit != led.suit && player.has_suit(led.suit) {
                return Err(GameError::MustFollowSuit(led.suit));
            }
        }

        // 2. 修改状态
        if play.played.is_empty() {
            play.led_card = Some(card);
        }
        player.play_card(&card);
        play.played.push(PlayedCard { player_id, card });

        if play.played.len() < player_count {
            play.next_to_act = next;
            return Ok(None);
        }

        // 3. 这一墩出完了
        let led = play.led_card.map_or(card.suit, |c| c.suit);
        let winner = trick_winner(&play.played, play.deal.trump_card.suit, led).unwrap_or(player_id);
        play.trick_winners.push(winner);
        debug!(winner = %winner, trick = play.trick_winners.len(), "一墩结束");

        if let Round::TrickInProgress(play) = mem::take(&mut self.round) {
            self.round = Round::TrickResolved { play, winner };
        }
        Ok(Some(winner))
    }

    /// 结束一墩
    ///
    /// 给赢家记一墩、清空桌面。还有牌时由赢家先出下一墩；
    /// 否则结算本局，发下一局的牌或宣布游戏结束。
    pub fn end_circle(&mut self) -> Result<CircleOutcome, GameError> {
        let Round::TrickResolved { play, winner } = &self.round else {
            return Err(self.wrong_phase("end_circle"));
        };
        let mut play = play.clone();
        let led = play.led_card.map_or(play.deal.trump_card.suit, |c| c.suit);
        let winner = trick_winner(&play.played, play.deal.trump_card.suit, led).unwrap_or(*winner);
        let winner_idx = self.player_index(winner)?;

        play.played.clear();
        play.led_card = None;
        play.cards_remaining = play.cards_remaining.saturating_sub(1);

        if play.cards_remaining > 0 {
            self.players[winner_idx].add_baza();
            play.next_to_act = winner;
            self.round = Round::TrickInProgress(play);
            return Ok(CircleOutcome::RoundContinues);
        }

        self.resolve_round(play, winner_idx)
    }

    /// 本局所有墩打完：存档、计分，然后发下一局或结束游戏
    fn resolve_round(&mut self, play: TrickPlay, last_winner_idx: usize) -> Result<CircleOutcome, GameError> {
        let points: Vec<(PlayerId, u32)> = self
            .players
            .iter()
            .map(|p| {
                let won = play.tricks_won_by(p.id);
                let requested = play.bid_of(p.id).unwrap_or(0);
                (p.id, round_points(requested, won))
            })
            .collect();

        let game_over = is_last_round(&self.settings, &play.deal);
        // 先发好下一局，失败时不留下半结算的状态
        let next = if game_over {
            None
        } else {
            let (cards, direction) = next_round_size(&self.settings, play.deal.cards, play.deal.direction);
            let first = self.player_to_the_right(play.deal.first_to_act)?;
            Some(self.deal(cards, direction, first)?)
        };

        self.players[last_winner_idx].add_baza();
        for (player, &(_, p)) in self.players.iter_mut().zip(&points) {
            debug!(player = %player.name, bazas = player.bazas, points = p, "本局得分");
            player.add_points(p);
            player.reset_bazas();
        }
        self.rounds.push(RoundSummary {
            cards: play.deal.cards,
            direction: play.deal.direction,
            trump_card: play.deal.trump_card,
            first_to_act: play.deal.first_to_act,
            bids: play.bids,
            trick_winners: play.trick_winners,
            points,
        });

        match next {
            None => {
                info!(rounds = self.rounds.len(), "游戏结束");
                self.round = Round::GameOver;
                Ok(CircleOutcome::GameOver)
            }
            Some(bidding) => {
                info!(cards = bidding.deal.cards, direction = ?bidding.deal.direction, "新的一局");
                self.round = Round::Bidding(bidding);
                Ok(CircleOutcome::NextRound(self.round.clone()))
            }
        }
    }

    /// 洗一副新牌，按座次给每人随机抽 `cards` 张，再从剩下的牌里抽王牌
    fn deal(&mut self, cards: u32, direction: Direction, first_to_act: PlayerId) -> Result<Bidding, GameError> {
        let mut deck = Deck::new();
        deck.shuffle(&mut self.rng);

        let mut hands = Vec::with_capacity(self.players.len());
        for _ in 0..self.players.len() {
            hands.push(deck.draw_random(cards as usize, &mut self.rng)?);
        }
        let trump_card = deck.draw()?;

        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.set_hand(hand);
        }

        Ok(Bidding {
            deal: Deal { cards, direction, trump_card, first_to_act },
            next_to_act: first_to_act,
            bids: Vec::new(),
        })
    }
}

impl<R> BazasEngine<R> {
    /// 座次中右手边的下一位玩家，最后一位之后回到第一位
    pub fn player_to_the_right(&self, player_id: PlayerId) -> Result<PlayerId, GameError> {
        let idx = self.player_index(player_id)?;
        Ok(self.players[(idx + 1) % self.players.len()].id)
    }

    /// 每名玩家的公开信息：分数、墩数、本局叫墩、本墩出的牌
    pub fn get_players(&self) -> Vec<PlayerView> {
        let bids = self.round.bids();
        let played = self.round.played();
        self.players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
                score: p.score,
                bazas: p.bazas,
                requested: bids.iter().find(|b| b.player_id == p.id).map(|b| b.bazas),
                played_card: played.iter().find(|c| c.player_id == p.id).map(|c| c.card),
            })
            .collect()
    }

    /// 按分数从低到高排列的记分表
    pub fn get_score_table(&self) -> Vec<PlayerView> {
        let mut table = self.get_players();
        table.sort_by_key(|p| p.score);
        table
    }

    fn player_index(&self, player_id: PlayerId) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }

    fn wrong_phase(&self, action: &'static str) -> GameError {
        GameError::WrongPhase { action, phase: self.round.phase_name() }
    }
}

// --- 单元测试 ---
