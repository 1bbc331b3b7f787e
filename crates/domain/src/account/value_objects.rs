//! Value objects for the account domain.

use serde::{Deserialize, Serialize};

/// The class of asset an account holds.
///
/// Transfers are only allowed between accounts holding the same asset type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Traditional currency (USD, EUR, ...).
    Fiat,

    /// Cryptocurrency (BTC, ETH, ...).
    Crypto,

    /// Commodities (gold, silver, ...).
    Commodity,
}

impl AssetType {
    /// Returns the asset type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Fiat => "Fiat",
            AssetType::Crypto => "Crypto",
            AssetType::Commodity => "Commodity",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(AssetType::Fiat.to_string(), "Fiat");
        assert_eq!(AssetType::Crypto.to_string(), "Crypto");
        assert_eq!(AssetType::Commodity.to_string(), "Commodity");
    }

    #[test]
    fn serialization_roundtrip() {
        let asset = AssetType::Crypto;
        let json = serde_json::to_string(&asset).unwrap();
        let deserialized: AssetType = serde_json::from_str(&json).unwrap();
        assert_eq!(asset, deserialized);
    }
}
