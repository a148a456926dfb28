use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

pub const POLICY_ID_BYTES: usize = 28;
pub const MAX_ASSET_NAME_BYTES: usize = 32;

/// Textual name of the base coin in reserve snapshots.
pub const LOVELACE: &str = "lovelace";

/// Splits a `<policyIdHex>.<assetNameHex>` identifier into its two halves.
///
/// An identifier without a separator is a bare policy id and the empty string
/// is the base coin. Anything with more than one `.` is rejected.
pub fn parse_token_id(token_id: &str) -> Result<(String, String)> {
    let mut parts = token_id.split('.');
    let policy = parts.next().unwrap_or_default();
    let asset_name = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(CodecError::InvalidTokenId(token_id.to_string()));
    }
    Ok((policy.to_string(), asset_name.to_string()))
}

/// A fungible asset held by a pool: `(policy id, asset name)`.
///
/// The empty pair is the ledger's base coin. Fields are only reachable
/// through [`TokenId::new`], so every value holds a valid policy and name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId {
    policy_id: Vec<u8>,
    asset_name: Vec<u8>,
}

impl TokenId {
    pub fn new(policy_id: Vec<u8>, asset_name: Vec<u8>) -> Result<Self> {
        let token = Self {
            policy_id,
            asset_name,
        };
        token.validate()?;
        Ok(token)
    }

    pub fn lovelace() -> Self {
        Self::default()
    }

    pub fn policy_id(&self) -> &[u8] {
        &self.policy_id
    }

    pub fn asset_name(&self) -> &[u8] {
        &self.asset_name
    }

    pub fn is_lovelace(&self) -> bool {
        self.policy_id.is_empty() && self.asset_name.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let policy_ok = self.policy_id.is_empty() || self.policy_id.len() == POLICY_ID_BYTES;
        let name_ok = self.asset_name.len() <= MAX_ASSET_NAME_BYTES
            && (self.asset_name.is_empty() || !self.policy_id.is_empty());
        if policy_ok && name_ok {
            Ok(())
        } else {
            Err(CodecError::InvalidTokenId(self.to_string()))
        }
    }

    /// The flat `policy ++ name` identifier used to look the asset up in a
    /// reserve snapshot.
    pub fn unit(&self) -> AssetUnit {
        if self.is_lovelace() {
            AssetUnit::Lovelace
        } else {
            AssetUnit::Native([self.policy_id.as_slice(), self.asset_name.as_slice()].concat())
        }
    }
}

impl FromStr for TokenId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let (policy, name) = parse_token_id(s)?;
        let invalid = |_| CodecError::InvalidTokenId(s.to_string());
        let policy_id = hex::decode(policy).map_err(invalid)?;
        let asset_name = hex::decode(name).map_err(invalid)?;
        Self::new(policy_id, asset_name)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.asset_name.is_empty() {
            write!(f, "{}", hex::encode(&self.policy_id))
        } else {
            write!(
                f,
                "{}.{}",
                hex::encode(&self.policy_id),
                hex::encode(&self.asset_name)
            )
        }
    }
}

/// Asset key of a [`crate::reserves::ReserveSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssetUnit {
    Lovelace,
    /// Policy id followed by the asset name, as one byte string.
    Native(Vec<u8>),
}

impl AssetUnit {
    pub fn policy_id(&self) -> Option<&[u8]> {
        match self {
            AssetUnit::Lovelace => None,
            AssetUnit::Native(unit) => unit.get(..POLICY_ID_BYTES),
        }
    }

    pub fn asset_name(&self) -> Option<&[u8]> {
        match self {
            AssetUnit::Lovelace => None,
            AssetUnit::Native(unit) => unit.get(POLICY_ID_BYTES..),
        }
    }
}

impl From<&TokenId> for AssetUnit {
    fn from(token: &TokenId) -> Self {
        token.unit()
    }
}

impl FromStr for AssetUnit {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == LOVELACE {
            return Ok(AssetUnit::Lovelace);
        }
        let unit = hex::decode(s).map_err(|_| CodecError::InvalidTokenId(s.to_string()))?;
        if unit.len() < POLICY_ID_BYTES || unit.len() > POLICY_ID_BYTES + MAX_ASSET_NAME_BYTES {
            return Err(CodecError::InvalidTokenId(s.to_string()));
        }
        Ok(AssetUnit::Native(unit))
    }
}

impl TryFrom<String> for AssetUnit {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AssetUnit> for String {
    fn from(unit: AssetUnit) -> Self {
        unit.to_string()
    }
}

impl fmt::Display for AssetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetUnit::Lovelace => f.write_str(LOVELACE),
            AssetUnit::Native(unit) => f.write_str(&hex::encode(unit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "273a576a5de694ff507765c57b47efdc81ea7f13a43dc4441644fab0";

    #[test]
    fn splits_policy_and_name() {
        assert_eq!(
            parse_token_id("abc.def").unwrap(),
            ("abc".to_string(), "def".to_string())
        );
    }

    #[test]
    fn empty_id_is_base_coin() {
        assert_eq!(parse_token_id("").unwrap(), (String::new(), String::new()));
    }

    #[test]
    fn bare_policy_has_empty_name() {
        assert_eq!(
            parse_token_id("abc").unwrap(),
            ("abc".to_string(), String::new())
        );
        assert_eq!(
            parse_token_id("abc.").unwrap(),
            ("abc".to_string(), String::new())
        );
    }

    #[test]
    fn rejects_extra_separators() {
        assert_eq!(
            parse_token_id("a.b.c"),
            Err(CodecError::InvalidTokenId("a.b.c".to_string()))
        );
    }

    #[test]
    fn token_from_text() {
        let token: TokenId = format!("{POLICY}.4d494e").parse().unwrap();
        assert_eq!(token.policy_id().len(), POLICY_ID_BYTES);
        assert_eq!(token.asset_name(), b"MIN");
        assert_eq!(token.to_string(), format!("{POLICY}.4d494e"));
        assert_eq!("".parse::<TokenId>().unwrap(), TokenId::lovelace());
    }

    #[test]
    fn token_rejects_short_policy() {
        assert!(matches!(
            "abcd.00".parse::<TokenId>(),
            Err(CodecError::InvalidTokenId(_))
        ));
        assert!(matches!(
            "zz".parse::<TokenId>(),
            Err(CodecError::InvalidTokenId(_))
        ));
    }

    #[test]
    fn new_rejects_invalid_parts() {
        assert!(matches!(
            TokenId::new(vec![0; 5], vec![]),
            Err(CodecError::InvalidTokenId(_))
        ));
        assert!(TokenId::new(vec![], b"MIN".to_vec()).is_err());
        assert!(TokenId::new(vec![0; POLICY_ID_BYTES], vec![0; MAX_ASSET_NAME_BYTES + 1]).is_err());
        assert!(TokenId::new(vec![0; POLICY_ID_BYTES], vec![0; MAX_ASSET_NAME_BYTES]).is_ok());
    }

    #[test]
    fn unit_flattens_policy_and_name() {
        let token: TokenId = format!("{POLICY}.4d494e").parse().unwrap();
        let unit = token.unit();
        assert_eq!(unit.to_string(), format!("{POLICY}4d494e"));
        assert_eq!(unit.asset_name(), Some(b"MIN".as_slice()));
        assert_eq!(unit, unit.to_string().parse().unwrap());
        assert_eq!(TokenId::lovelace().unit(), AssetUnit::Lovelace);
        assert_eq!("lovelace".parse::<AssetUnit>().unwrap(), AssetUnit::Lovelace);
    }
}
