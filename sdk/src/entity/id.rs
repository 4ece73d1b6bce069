use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::checksum::checksum;
use super::{EntityIdError, NetworkName, ValidateChecksums};

/// `shard.realm.num`, optionally carrying the checksum it was written with.
///
/// The checksum is not part of identity: `0.0.123` and `0.0.123-rmkyk`
/// compare and hash equal. It only matters to
/// [`validate_checksum`](Self::validate_checksum).
#[derive(Clone, Default)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
    pub checksum: Option<String>,
}

/// An account.
pub type AccountId = EntityId;
/// A token type.
pub type TokenId = EntityId;
/// A file.
pub type FileId = EntityId;
/// A consensus topic.
pub type TopicId = EntityId;

impl EntityId {
    /// An ID without a checksum.
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self {
            shard,
            realm,
            num,
            checksum: None,
        }
    }

    /// `0.0.num`.
    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }

    /// The checksum this entity has on `network`.
    pub fn checksum_for(&self, network: NetworkName) -> String {
        checksum(network, self.shard, self.realm, self.num)
    }

    /// `shard.realm.num-checksum` for `network`.
    pub fn to_string_with_checksum(&self, network: NetworkName) -> String {
        format!("{self}-{}", self.checksum_for(network))
    }

    /// Checks the carried checksum, if any, against `network`.
    ///
    /// An ID without a checksum always passes.
    pub fn validate_checksum(&self, network: NetworkName) -> Result<(), EntityIdError> {
        let Some(given) = &self.checksum else {
            return Ok(());
        };
        let expected = self.checksum_for(network);
        if *given == expected {
            Ok(())
        } else {
            Err(EntityIdError::ChecksumMismatch {
                given: given.clone(),
                expected,
                network,
            })
        }
    }

    /// Drops the checksum.
    pub fn without_checksum(&self) -> Self {
        Self::new(self.shard, self.realm, self.num)
    }
}

impl ValidateChecksums for EntityId {
    fn validate_checksums(&self, network: NetworkName) -> Result<(), EntityIdError> {
        self.validate_checksum(network)
    }
}

impl From<u64> for EntityId {
    fn from(num: u64) -> Self {
        Self::from_num(num)
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        (self.shard, self.realm, self.num) == (other.shard, other.realm, other.num)
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.shard, self.realm, self.num).hash(state);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.shard, self.realm, self.num).cmp(&(other.shard, other.realm, other.num))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.checksum {
            Some(c) => write!(f, "\"{self}-{c}\""),
            None => write!(f, "\"{self}\""),
        }
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    /// Accepts `shard.realm.num` with an optional `-checksum` suffix. The
    /// suffix may be any run of lowercase letters; its length is checked by
    /// validation, not here, so a mistyped checksum surfaces as a mismatch.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || EntityIdError::Malformed(s.to_string());

        let (address, checksum) = match s.split_once('-') {
            Some((address, suffix)) => {
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_lowercase()) {
                    return Err(malformed());
                }
                (address, Some(suffix.to_string()))
            }
            None => (s, None),
        };

        let mut parts = address.split('.');
        let mut next = || -> Result<u64, EntityIdError> {
            parts
                .next()
                .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|p| p.parse().ok())
                .ok_or_else(malformed)
        };
        let (shard, realm, num) = (next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            shard,
            realm,
            num,
            checksum,
        })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_checksummed() {
        let id: EntityId = "0.0.123".parse().unwrap();
        assert_eq!(id, EntityId::from_num(123));
        assert!(id.checksum.is_none());

        let id: EntityId = "1.2.34567-boxps".parse().unwrap();
        assert_eq!(id, EntityId::new(1, 2, 34567));
        assert_eq!(id.checksum.as_deref(), Some("boxps"));
    }

    #[test]
    fn checksum_is_not_identity() {
        let a: EntityId = "0.0.123-rmkyk".parse().unwrap();
        let b: EntityId = "0.0.123".parse().unwrap();
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn matching_checksum_validates() {
        let id: EntityId = "0.0.123-rmkyk".parse().unwrap();
        id.validate_checksum(NetworkName::Testnet).unwrap();
    }

    #[test]
    fn overlong_checksum_reports_both_values() {
        let id: EntityId = "0.0.123-rmkykd".parse().unwrap();
        let err = id.validate_checksum(NetworkName::Testnet).unwrap_err();
        assert_eq!(
            err.to_string(),
            "network mismatch or wrong checksum given, given checksum: rmkykd, \
             correct checksum rmkyk, network: testnet"
        );
    }

    #[test]
    fn checksum_from_another_network_is_rejected() {
        let id: EntityId = "0.0.123-vfmkw".parse().unwrap();
        id.validate_checksum(NetworkName::Mainnet).unwrap();
        assert!(matches!(
            id.validate_checksum(NetworkName::Testnet),
            Err(EntityIdError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn every_single_letter_flip_is_caught() {
        let id = EntityId::new(0, 0, 1001);
        let good = id.checksum_for(NetworkName::Previewnet);
        for i in 0..good.len() {
            let mut bytes = good.clone().into_bytes();
            bytes[i] = if bytes[i] == b'z' { b'a' } else { bytes[i] + 1 };
            let bad = String::from_utf8(bytes).unwrap();

            let tagged = EntityId {
                checksum: Some(bad.clone()),
                ..id.clone()
            };
            match tagged.validate_checksum(NetworkName::Previewnet) {
                Err(EntityIdError::ChecksumMismatch { given, expected, .. }) => {
                    assert_eq!(given, bad);
                    assert_eq!(expected, good);
                }
                other => panic!("expected mismatch, got {other:?}"),
            }
        }
    }

    #[test]
    fn to_string_with_checksum_round_trips() {
        let id = EntityId::new(0, 0, 3);
        let s = id.to_string_with_checksum(NetworkName::Mainnet);
        assert_eq!(s, "0.0.3-tzfmz");
        let parsed: EntityId = s.parse().unwrap();
        parsed.validate_checksum(NetworkName::Mainnet).unwrap();
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        for bad in ["", "0.0", "0.0.1.2", "a.b.c", "0.0.1-", "0.0.1-ABCDE", "0..1", "0.0.-1"] {
            assert!(bad.parse::<EntityId>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn serde_uses_plain_string() {
        let id: EntityId = "0.0.5005".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0.0.5005\"");
        let back: EntityId = serde_json::from_str("\"0.0.5005\"").unwrap();
        assert_eq!(back, id);
    }
}
