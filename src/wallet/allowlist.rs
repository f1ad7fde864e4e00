use std::collections::HashSet;
use std::str::FromStr;

use lazy_static::lazy_static;
use solana_sdk::pubkey::Pubkey;

use crate::config::ConfigError;

lazy_static! {
    /// Operator wallets allowed to use the console when no override is configured.
    pub static ref DEFAULT_ALLOWLIST: Vec<Pubkey> = [
        "HxyJMByx51q9GktkegmAKB66Z8Q2mQfEcAXekmfXHVz2",
        "4bk1th3cRCEsR8QZDd4EHdARrwNNRYu4346SPX26F8k2",
        "EZwwq96E11k4Kwc7PHc1PBB1iaiaomhyB4mKhUJUmLks",
    ]
    .iter()
    .filter_map(|key| Pubkey::from_str(key).ok())
    .collect();
}

/// Wallets permitted to operate the console.
///
/// Checked on the operator's machine only; anyone able to edit the binary
/// or its configuration can widen it. Real access control belongs on the
/// backend's authentication boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    keys: HashSet<Pubkey>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWLIST.iter().copied())
    }
}

impl AllowList {
    pub fn new<I: IntoIterator<Item = Pubkey>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn parse<S: AsRef<str>>(keys: &[S]) -> Result<Self, ConfigError> {
        let keys = keys
            .iter()
            .map(|key| {
                let key = key.as_ref().trim();
                Pubkey::from_str(key).map_err(|_| ConfigError::InvalidAllowListEntry(key.to_string()))
            })
            .collect::<Result<HashSet<_>, _>>()?;
        if keys.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        Ok(Self { keys })
    }

    pub fn contains(&self, key: &Pubkey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
