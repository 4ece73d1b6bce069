//! Value types shared by every transaction: amounts and transaction IDs.

use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{TINYBARS_PER_HBAR, TRANSACTION_ID_BACKDATE_SECS, TRANSACTION_ID_JITTER_SECS};
use crate::entity::{AccountId, EntityIdError, NetworkName, ValidateChecksums};

// ---------------------------------------------------------------------------
// Hbar
// ---------------------------------------------------------------------------

/// An amount of the network's native currency, held as tinybars.
///
/// `1 ℏ = 100_000_000 tℏ`. Amounts are signed because transfer lists carry
/// debits as negative values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hbar(i64);

impl Hbar {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i64::MAX);
    pub const MIN: Self = Self(i64::MIN);

    /// Whole hbars. Amounts beyond what tinybars can hold (about
    /// ±9.2e10 ℏ) clamp to [`Hbar::MAX`] or [`Hbar::MIN`]; use
    /// [`checked_new`](Self::checked_new) to detect that instead.
    pub const fn new(hbars: i64) -> Self {
        Self(hbars.saturating_mul(TINYBARS_PER_HBAR))
    }

    /// Whole hbars, or `None` if the tinybar amount would overflow.
    pub const fn checked_new(hbars: i64) -> Option<Self> {
        match hbars.checked_mul(TINYBARS_PER_HBAR) {
            Some(tinybars) => Some(Self(tinybars)),
            None => None,
        }
    }

    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(tinybars) => Some(Self(tinybars)),
            None => None,
        }
    }

    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    pub const fn to_tinybars(self) -> i64 {
        self.0
    }
}

impl Neg for Hbar {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for Hbar {
    /// Whole amounts print as hbars, everything else as tinybars.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % TINYBARS_PER_HBAR == 0 {
            write!(f, "{} ℏ", self.0 / TINYBARS_PER_HBAR)
        } else {
            write!(f, "{} tℏ", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// Identifies a transaction network-wide: who pays, and when it becomes
/// valid.
///
/// Written as `0.0.123@1700000000.000000123`, optionally followed by
/// `?scheduled` and `/nonce`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TransactionId {
    pub account_id: AccountId,
    pub valid_start: DateTime<Utc>,
    pub nonce: Option<i32>,
    pub scheduled: bool,
}

impl TransactionId {
    /// A fresh ID for `account_id`, valid from a few seconds ago.
    ///
    /// The start is backdated by 8 seconds plus up to 5 seconds of jitter,
    /// so clock skew between us and the node doesn't make the transaction
    /// look like it comes from the future, and two IDs generated in the
    /// same instant rarely collide.
    pub fn generate(account_id: AccountId) -> Self {
        let jitter_ms = rand::thread_rng().gen_range(0..TRANSACTION_ID_JITTER_SECS * 1000);
        let valid_start = Utc::now()
            - ChronoDuration::seconds(TRANSACTION_ID_BACKDATE_SECS)
            - ChronoDuration::milliseconds(jitter_ms);
        Self {
            account_id,
            valid_start,
            nonce: None,
            scheduled: false,
        }
    }

    /// An ID with an exact start time, mostly useful in tests and when
    /// reconstructing a transaction.
    pub fn with_valid_start(account_id: AccountId, valid_start: DateTime<Utc>) -> Self {
        Self {
            account_id,
            valid_start,
            nonce: None,
            scheduled: false,
        }
    }
}

impl ValidateChecksums for TransactionId {
    fn validate_checksums(&self, network: NetworkName) -> Result<(), EntityIdError> {
        self.account_id.validate_checksum(network)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account_id,
            self.valid_start.timestamp(),
            self.valid_start.timestamp_subsec_nanos()
        )?;
        if self.scheduled {
            f.write_str("?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{nonce}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl FromStr for TransactionId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || EntityIdError::Malformed(s.to_string());

        let (account, rest) = s.split_once('@').ok_or_else(malformed)?;
        let account_id: AccountId = account.parse()?;

        let (rest, nonce) = match rest.rsplit_once('/') {
            Some((rest, nonce)) => (rest, Some(nonce.parse::<i32>().map_err(|_| malformed())?)),
            None => (rest, None),
        };
        let (timestamp, scheduled) = match rest.strip_suffix("?scheduled") {
            Some(timestamp) => (timestamp, true),
            None => (rest, false),
        };

        let (secs, nanos) = timestamp.split_once('.').ok_or_else(malformed)?;
        let secs: i64 = secs.parse().map_err(|_| malformed())?;
        let nanos: u32 = nanos.parse().map_err(|_| malformed())?;
        let valid_start = Utc
            .timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(malformed)?;

        Ok(Self {
            account_id,
            valid_start,
            nonce,
            scheduled,
        })
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hbar_display() {
        assert_eq!(Hbar::new(5).to_string(), "5 ℏ");
        assert_eq!(Hbar::from_tinybars(150).to_string(), "150 tℏ");
        assert_eq!((-Hbar::new(2)).to_tinybars(), -200_000_000);
    }

    #[test]
    fn hbar_amounts_past_the_tinybar_range_do_not_overflow() {
        let limit = i64::MAX / TINYBARS_PER_HBAR;
        assert_eq!(Hbar::checked_new(limit), Some(Hbar::from_tinybars(limit * TINYBARS_PER_HBAR)));
        assert_eq!(Hbar::checked_new(limit + 1), None);
        assert_eq!(Hbar::checked_new(-limit - 1), None);

        assert_eq!(Hbar::new(limit + 1), Hbar::MAX);
        assert_eq!(Hbar::new(i64::MIN), Hbar::MIN);
        assert_eq!(-Hbar::MIN, Hbar::MAX);
        assert_eq!(Hbar::MAX.checked_add(Hbar::from_tinybars(1)), None);
        assert_eq!(Hbar::new(1).checked_add(Hbar::new(2)), Some(Hbar::new(3)));
    }

    #[test]
    fn transaction_id_formats_nanos_with_padding() {
        let start = Utc.timestamp_opt(1_700_000_000, 123).unwrap();
        let id = TransactionId::with_valid_start(AccountId::from_num(123), start);
        assert_eq!(id.to_string(), "0.0.123@1700000000.000000123");

        let id = TransactionId {
            nonce: Some(4),
            scheduled: true,
            ..id
        };
        assert_eq!(id.to_string(), "0.0.123@1700000000.000000123?scheduled/4");
    }

    #[test]
    fn transaction_id_parses_its_own_output() {
        for s in [
            "0.0.123@1700000000.000000123",
            "0.0.9@1.500000000?scheduled",
            "0.0.9@1.000000000/7",
            "1.2.3@1700000000.999999999?scheduled/12",
        ] {
            let id: TransactionId = s.parse().unwrap();
            assert_eq!(id.to_string(), s);
        }
    }

    #[test]
    fn transaction_id_rejects_garbage() {
        for bad in ["", "0.0.1", "0.0.1@", "0.0.1@abc.def", "0.0.1@1", "x@1.0", "0.0.1@1.0/x"] {
            assert!(bad.parse::<TransactionId>().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn generated_ids_are_backdated() {
        let before = Utc::now();
        let id = TransactionId::generate(AccountId::from_num(2));
        let after = Utc::now();
        assert!(after - id.valid_start >= ChronoDuration::seconds(TRANSACTION_ID_BACKDATE_SECS));
        assert!(
            before - id.valid_start
                <= ChronoDuration::seconds(TRANSACTION_ID_BACKDATE_SECS + TRANSACTION_ID_JITTER_SECS)
        );
    }

    #[test]
    fn payer_checksum_is_validated() {
        let id: TransactionId = "0.0.123-rmkyk@1.000000000".parse().unwrap();
        id.validate_checksums(NetworkName::Testnet).unwrap();
        assert!(id.validate_checksums(NetworkName::Mainnet).is_err());
    }
}
