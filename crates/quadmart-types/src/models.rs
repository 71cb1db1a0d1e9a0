use serde::{Deserialize, Serialize};

/// How an item is offered: for a fixed price, or in exchange for something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Sell,
    Barter,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Sell => "sell",
            ItemType::Barter => "barter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sell" => Some(ItemType::Sell),
            "barter" => Some(ItemType::Barter),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
