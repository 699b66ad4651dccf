use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 变体顺序按花色英文名的字母序排列，手牌排序直接使用派生的 `Ord`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Club,    // 梅花 ♣️
    Diamond, // 方块 ♦️
    Heart,   // 红心 ♥️
    Spade,   // 黑桃 ♠️
}

/// 点数 (Rank)
/// Ord 的派生顺序与 `value()` 的大小一致：2..10 < J < Q < K < A
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

/// 单张扑克牌 (Card)，身份由 (花色, 点数) 唯一确定
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Club, Suit::Spade, Suit::Diamond];

    /// 牌面 key 的第二个字符
    fn initial(self) -> char {
        match self {
            Suit::Club => 'C',
            Suit::Diamond => 'D',
            Suit::Heart => 'H',
            Suit::Spade => 'S',
        }
    }
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace, Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
        Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King,
    ];

    /// 比较用的数值。数字牌取面值，人头牌和 A 远高于 10。
    pub fn value(self) -> u32 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 97,
            Rank::Queen => 98,
            Rank::King => 99,
            Rank::Ace => 100,
        }
    }

    /// 牌面 key 的第一个字符，10 写作 `0`
    fn key_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => '0',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { suit, rank }
    }

    pub fn rank_value(&self) -> u32 {
        self.rank.value()
    }

    /// 两个字符的唯一标识，例如 `AH`、`0S`
    pub fn key(&self) -> String {
        format!("{}{}", self.rank.key_char(), self.suit.initial())
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Club => "♣️",
            Suit::Diamond => "♦️",
            Suit::Heart => "♥️",
            Suit::Spade => "♠️",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Card {
    type Err = GameError;

    /// 解析 `key()` 的输出，大小写不敏感，也接受 `10H` 这种写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let normalized = upper.strip_prefix("10").map(|rest| format!("0{rest}")).unwrap_or(upper);
        let mut chars = normalized.chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(GameError::InvalidCard(s.to_string()));
        };
        let rank = Rank::ALL.into_iter().find(|rank| rank.key_char() == r);
        let suit = Suit::ALL.into_iter().find(|suit| suit.initial() == su);
        match (rank, suit) {
            (Some(rank), Some(suit)) => Ok(Card::new(rank, suit)),
            _ => Err(GameError::InvalidCard(s.to_string())),
        }
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use Rank::*;
    use Suit::*;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn test_rank_values() {
        assert_eq!(Two.value(), 2);
        assert_eq!(Ten.value(), 10);
        assert_eq!(Jack.value(), 97);
        assert_eq!(Queen.value(), 98);
        assert_eq!(King.value(), 99);
        assert_eq!(Ace.value(), 100);
    }

    #[test]
    fn test_rank_order_matches_value() {
        let mut ranks = Rank::ALL.to_vec();
        ranks.sort();
        let values: Vec<u32> = ranks.iter().map(|r| r.value()).collect();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(values, sorted);
        assert_eq!(ranks.last(), Some(&Ace));
    }

    #[test]
    fn test_card_keys() {
        assert_eq!(card(Ace, Heart).key(), "AH");
        assert_eq!(card(Ten, Spade).key(), "0S");
        assert_eq!(card(Seven, Club).to_string(), "7C");
        assert_eq!(card(Queen, Diamond).key(), "QD");
    }

    #[test]
    fn test_parse_card() {
        assert_eq!("AH".parse::<Card>(), Ok(card(Ace, Heart)));
        assert_eq!("0s".parse::<Card>(), Ok(card(Ten, Spade)));
        assert_eq!("10d".parse::<Card>(), Ok(card(Ten, Diamond)));
        assert_eq!(" kc ".parse::<Card>(), Ok(card(King, Club)));
        assert!("1H".parse::<Card>().is_err());
        assert!("AX".parse::<Card>().is_err());
        assert!("AHS".parse::<Card>().is_err());
        assert!("".parse::<Card>().is_err());
    }

    #[test]
    fn test_every_key_parses_back() {
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                let c = card(rank, suit);
                assert_eq!(c.key().parse::<Card>(), Ok(c));
            }
        }
    }

    #[test]
    fn test_suit_order_is_alphabetical() {
        assert!(Club < Diamond && Diamond < Heart && Heart < Spade);
    }

    #[test]
    fn test_card_serializes_with_lowercase_suit() {
        let json = serde_json::to_string(&card(Ace, Spade)).unwrap();
        assert_eq!(json, r#"{"suit":"spade","rank":"Ace"}"#);
    }
}
