use crate::card::{Card, Rank, Suit};
use crate::error::GameError;
use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index;

/// 一副 52 张的牌。只能通过抽牌减少，每局重新创建。
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// 创建一副完整的 52 张扑克牌
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(52);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        Deck { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// 从牌堆顶部抽一张
    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::EmptyDeck)
    }

    /// 不放回地随机抽出 `n` 张不同的牌
    pub fn draw_random<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Result<Vec<Card>, GameError> {
        let remaining = self.cards.len();
        if n > remaining {
            return Err(GameError::InsufficientCards { requested: n, remaining });
        }

        let mut picked = index::sample(rng, remaining, n).into_vec();
        let drawn = picked.iter().map(|&i| self.cards[i]).collect();

        // 从大到小删除，保证前面的索引仍然有效
        picked.sort_unstable_by(|a, b| b.cmp(a));
        for i in picked {
            self.cards.remove(i);
        }
        Ok(drawn)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}
