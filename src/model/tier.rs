use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Coarse importance bucket derived from a node's pagerank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
  #[default]
  #[serde(rename = "bronze")]
  Bronze,
  #[serde(rename = "silver")]
  Silver,
  #[serde(rename = "gold")]
  Gold,
  #[serde(rename = "platinum")]
  Platinum,
  #[serde(rename = "diamond")]
  Diamond,
}

impl Tier {
  pub const SILVER_MIN: f64 = 0.3;
  pub const GOLD_MIN: f64 = 0.5;
  pub const PLATINUM_MIN: f64 = 0.7;
  pub const DIAMOND_MIN: f64 = 0.8;

  pub fn from_pagerank(pagerank: f64) -> Self {
    if pagerank >= Self::DIAMOND_MIN {
      Tier::Diamond
    } else if pagerank >= Self::PLATINUM_MIN {
      Tier::Platinum
    } else if pagerank >= Self::GOLD_MIN {
      Tier::Gold
    } else if pagerank >= Self::SILVER_MIN {
      Tier::Silver
    } else {
      Tier::Bronze
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Tier::Bronze => "bronze",
      Tier::Silver => "silver",
      Tier::Gold => "gold",
      Tier::Platinum => "platinum",
      Tier::Diamond => "diamond",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for Tier {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "bronze" => Ok(Tier::Bronze),
      "silver" => Ok(Tier::Silver),
      "gold" => Ok(Tier::Gold),
      "platinum" => Ok(Tier::Platinum),
      "diamond" => Ok(Tier::Diamond),
      other => Err(format!("unknown tier: {}", other)),
    }
  }
}
