//! Chain Registry
//!
//! Static mapping from chain id to display metadata. Compiled in and never
//! mutated at runtime.

use std::borrow::Cow;

/// Display metadata for a supported chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDescriptor {
    /// Numeric chain id
    pub id: u64,
    /// Human-readable network name
    pub name: &'static str,
    /// Slug of the network icon
    pub icon_slug: &'static str,
    /// Block explorer base URL (no trailing slash)
    pub explorer: &'static str,
}

impl ChainDescriptor {
    /// Explorer link for a transaction on this chain
    pub fn tx_url(&self, txn_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer, txn_hash)
    }

    /// Explorer link for an address on this chain
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer, address)
    }
}

const CHAINS: &[ChainDescriptor] = &[
    ChainDescriptor {
        id: 1,
        name: "Ethereum",
        icon_slug: "ethereum",
        explorer: "https://etherscan.io",
    },
    ChainDescriptor {
        id: 10,
        name: "Optimism",
        icon_slug: "optimism",
        explorer: "https://optimistic.etherscan.io",
    },
    ChainDescriptor {
        id: 56,
        name: "BNB Chain",
        icon_slug: "binance-smart-chain",
        explorer: "https://bscscan.com",
    },
    ChainDescriptor {
        id: 100,
        name: "Gnosis",
        icon_slug: "gnosis",
        explorer: "https://gnosisscan.io",
    },
    ChainDescriptor {
        id: 137,
        name: "Polygon",
        icon_slug: "polygon",
        explorer: "https://polygonscan.com",
    },
    ChainDescriptor {
        id: 324,
        name: "zkSync Era",
        icon_slug: "zksync-era",
        explorer: "https://explorer.zksync.io",
    },
    ChainDescriptor {
        id: 8453,
        name: "Base",
        icon_slug: "base",
        explorer: "https://basescan.org",
    },
    ChainDescriptor {
        id: 42161,
        name: "Arbitrum One",
        icon_slug: "arbitrum",
        explorer: "https://arbiscan.io",
    },
    ChainDescriptor {
        id: 43114,
        name: "Avalanche",
        icon_slug: "avalanche",
        explorer: "https://snowtrace.io",
    },
    ChainDescriptor {
        id: 59144,
        name: "Linea",
        icon_slug: "linea",
        explorer: "https://lineascan.build",
    },
    ChainDescriptor {
        id: 534352,
        name: "Scroll",
        icon_slug: "scroll",
        explorer: "https://scrollscan.com",
    },
];

/// All known chains, ordered by chain id
pub fn all() -> &'static [ChainDescriptor] {
    CHAINS
}

/// Look up a chain by id
pub fn get(id: u64) -> Option<&'static ChainDescriptor> {
    CHAINS.iter().find(|c| c.id == id)
}

/// Display name for a chain id, falling back to `Chain <id>`
pub fn name(id: u64) -> Cow<'static, str> {
    match get(id) {
        Some(chain) => Cow::Borrowed(chain.name),
        None => Cow::Owned(format!("Chain {}", id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let base = get(8453).unwrap();
        assert_eq!(base.name, "Base");
        assert_eq!(base.icon_slug, "base");
        assert!(get(999_999).is_none());
    }

    #[test]
    fn test_name_fallback() {
        assert_eq!(name(1), "Ethereum");
        assert_eq!(name(31337), "Chain 31337");
    }

    #[test]
    fn test_ids_unique_and_sorted() {
        let ids: Vec<u64> = all().iter().map(|c| c.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_explorer_links() {
        let eth = get(1).unwrap();
        assert_eq!(eth.tx_url("0xabc"), "https://etherscan.io/tx/0xabc");
        assert_eq!(eth.address_url("0x1"), "https://etherscan.io/address/0x1");
    }
}
