use serde::Serialize;

/// One signing agent the client knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletProviderDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Feature flag the agent sets on its handle
    pub detect_flag: &'static str,
    /// Well-known global binding the agent installs, if any
    pub global_binding: Option<&'static str>,
    /// Substring of the announced namespace identifying this agent
    pub keyword: Option<&'static str>,
}

/// Wallet that resolves to the ambient agent when nothing better matches
pub const LAST_RESORT_WALLET: &str = "tokenpocket";

pub const GENERIC_WALLET: &str = "injected";

pub static SUPPORTED_WALLETS: &[WalletProviderDescriptor] = &[
    WalletProviderDescriptor {
        id: GENERIC_WALLET,
        display_name: "Generic Wallet",
        detect_flag: "isMetaMask",
        global_binding: None,
        keyword: None,
    },
    WalletProviderDescriptor {
        id: "metamask",
        display_name: "MetaMask",
        detect_flag: "isMetaMask",
        global_binding: None,
        keyword: Some("metamask"),
    },
    WalletProviderDescriptor {
        id: "okx",
        display_name: "OKX Wallet",
        detect_flag: "isOKXWallet",
        global_binding: Some("okxwallet"),
        keyword: Some("okx"),
    },
    WalletProviderDescriptor {
        id: "binance",
        display_name: "Binance Wallet",
        detect_flag: "isBinance",
        global_binding: Some("BinanceChain"),
        keyword: Some("binance"),
    },
    WalletProviderDescriptor {
        id: "trust",
        display_name: "Trust Wallet",
        detect_flag: "isTrust",
        global_binding: Some("trustwallet"),
        keyword: Some("trust"),
    },
    WalletProviderDescriptor {
        id: LAST_RESORT_WALLET,
        display_name: "TokenPocket",
        detect_flag: "isTokenPocket",
        global_binding: Some("tokenpocket"),
        keyword: Some("tokenpocket"),
    },
];

pub fn find_wallet(id: &str) -> Option<&'static WalletProviderDescriptor> {
    SUPPORTED_WALLETS.iter().find(|w| w.id == id)
}

/// Order in which namespace keywords are tried. Differs from the catalog
/// order: binance is matched last.
const NAMESPACE_MATCH_ORDER: [&str; 5] = ["metamask", "okx", "trust", LAST_RESORT_WALLET, "binance"];

/// Catalog wallet a namespace string announces, if any
pub fn wallet_for_namespace(rdns: &str) -> Option<&'static WalletProviderDescriptor> {
    let rdns = rdns.to_lowercase();
    NAMESPACE_MATCH_ORDER
        .iter()
        .filter_map(|id| find_wallet(id))
        .find(|w| w.keyword.map_or(false, |k| rdns.contains(k)))
}

/// Flags that mark a handle as belonging to a non-MetaMask wallet
pub fn foreign_flags() -> impl Iterator<Item = &'static str> {
    SUPPORTED_WALLETS
        .iter()
        .map(|w| w.detect_flag)
        .filter(|flag| *flag != "isMetaMask")
}
