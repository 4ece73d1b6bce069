use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EntityIdError;

/// The public networks an entity checksum can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    Mainnet,
    Testnet,
    Previewnet,
}

impl NetworkName {
    /// Single-digit ledger identifier, the seed of the checksum salt.
    pub fn ledger_digit(self) -> u8 {
        match self {
            Self::Mainnet => 0,
            Self::Testnet => 1,
            Self::Previewnet => 2,
        }
    }

    /// 7-byte checksum salt: the ledger digit in the high nibble, then zeros.
    pub(crate) fn checksum_salt(self) -> [u8; 7] {
        [self.ledger_digit() << 4, 0, 0, 0, 0, 0, 0]
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Previewnet => "previewnet",
        })
    }
}

impl FromStr for NetworkName {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "previewnet" => Ok(Self::Previewnet),
            _ => Err(EntityIdError::UnknownNetwork(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for name in [NetworkName::Mainnet, NetworkName::Testnet, NetworkName::Previewnet] {
            assert_eq!(name.to_string().parse::<NetworkName>().unwrap(), name);
        }
        assert_eq!("TestNet".parse::<NetworkName>().unwrap(), NetworkName::Testnet);
        assert!("devnet".parse::<NetworkName>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&NetworkName::Previewnet).unwrap();
        assert_eq!(json, "\"previewnet\"");
    }
}
