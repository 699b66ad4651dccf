use crate::card::{Card, Suit};
use crate::state::PlayerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一名参与者。只由引擎修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub score: u32,  // 累计得分
    pub bazas: u32,  // 本局已赢的墩数
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Player {
            id: Uuid::new_v4(),
            name: name.into(),
            hand: Vec::new(),
            score: 0,
            bazas: 0,
        }
    }

    /// 替换手牌，按花色、再按点数从小到大排好
    pub fn set_hand(&mut self, mut cards: Vec<Card>) {
        cards.sort_by(|a, b| a.suit.cmp(&b.suit).then(a.rank_value().cmp(&b.rank_value())));
        self.hand = cards;
    }

    pub fn has_suit(&self, suit: Suit) -> bool {
        self.hand.iter().any(|c| c.suit == suit)
    }

    pub fn has_card(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    /// 从手牌中移除这张牌，不在手中时什么也不做
    pub fn play_card(&mut self, card: &Card) {
        self.hand.retain(|c| c != card);
    }

    pub fn add_points(&mut self, points: u32) {
        self.score += points;
    }

    pub fn add_baza(&mut self) {
        self.bazas += 1;
    }

    pub fn reset_bazas(&mut self) {
        self.bazas = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank::*;
    use crate::card::Suit::*;

    #[test]
    fn test_set_hand_sorts_by_suit_then_value() {
        let mut player = Player::new("Ana");
        player.set_hand(vec![
            Card::new(Ace, Spade),
            Card::new(Ten, Heart),
            Card::new(Two, Spade),
            Card::new(Jack, Club),
            Card::new(Three, Heart),
        ]);
        let keys: Vec<String> = player.hand.iter().map(|c| c.key()).collect();
        assert_eq!(keys, ["JC", "3H", "0H", "2S", "AS"]);
    }

    #[test]
    fn test_has_suit_and_play_card() {
        let mut player = Player::new("Beto");
        player.set_hand(vec![Card::new(King, Diamond), Card::new(Four, Club)]);
        assert!(player.has_suit(Diamond));
        assert!(!player.has_suit(Heart));

        player.play_card(&Card::new(King, Diamond));
        assert!(!player.has_suit(Diamond));
        assert_eq!(player.hand.len(), 1);

        // 不在手中的牌不影响手牌
        player.play_card(&Card::new(Ace, Heart));
        assert_eq!(player.hand, vec![Card::new(Four, Club)]);
    }

    #[test]
    fn test_accumulators() {
        let mut player = Player::new("Caro");
        player.add_points(19);
        player.add_points(2);
        player.add_baza();
        player.add_baza();
        assert_eq!(player.score, 21);
        assert_eq!(player.bazas, 2);
        player.reset_bazas();
        assert_eq!(player.bazas, 0);
        assert_eq!(player.score, 21);
    }

    #[test]
    fn test_players_get_unique_ids() {
        assert_ne!(Player::new("x").id, Player::new("x").id);
    }
}
