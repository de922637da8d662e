use crate::chain_client::ILuckyKoi;
use alloy::sol_types::SolError;
use alloy::transports::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON-RPC error object returned by the endpoint
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    /// Endpoint could not be reached or answered garbage
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed return data or log payloads
    #[error("Decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem errors (session store)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => AppError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
                data: payload.data.as_ref().map(|d| d.to_string()),
            },
            None => AppError::Transport(err.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for AppError {
    fn from(err: alloy::sol_types::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl AppError {
    /// Check if error means the endpoint could not be reached at all
    pub fn is_connection_error(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// Error returned by a signing agent request
#[derive(Error, Debug, Clone, PartialEq)]
#[error("agent error (code {code:?}): {message}")]
pub struct AgentError {
    /// EIP-1193 numeric code (4001 user rejected, 4902 unknown chain, ...)
    pub code: Option<i64>,
    /// Symbolic code some agents attach instead of (or next to) a number
    pub symbol: Option<String>,
    pub message: String,
    /// Revert payload or nested error data, flattened to text
    pub data: Option<String>,
}

impl AgentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            symbol: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            ..Self::new(message)
        }
    }

    pub fn with_symbol(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::new(message)
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Build from a JSON-RPC error object, pulling `data` out of the usual nesting spots.
    pub fn from_rpc_object(obj: &Value) -> Self {
        let code = obj.get("code").and_then(Value::as_i64);
        let symbol = obj
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let data = obj
            .get("data")
            .or_else(|| obj.pointer("/error/data"))
            .or_else(|| obj.pointer("/payload/error/data"))
            .map(|d| match d {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        Self {
            code,
            symbol,
            message,
            data,
        }
    }

    /// Message, data and reason concatenated, with known custom-error names appended.
    pub fn payload_text(&self) -> String {
        let data = self.data.as_deref().unwrap_or_default();
        let mut text = format!("{} {}", self.message, data);
        for name in known_error_names(data) {
            text.push(' ');
            text.push_str(name);
        }
        text
    }
}

/// Custom errors the protocol contract can revert with, by selector.
const CONTRACT_ERRORS: &[(&str, [u8; 4])] = &[
    ("LotteryNotReady", ILuckyKoi::LotteryNotReady::SELECTOR),
    ("AlreadyRegistered", ILuckyKoi::AlreadyRegistered::SELECTOR),
    ("NotRegistered", ILuckyKoi::NotRegistered::SELECTOR),
    ("InsufficientBalance", ILuckyKoi::InsufficientBalance::SELECTOR),
    ("MaxHoldersReached", ILuckyKoi::MaxHoldersReached::SELECTOR),
    ("NoPendingRewards", ILuckyKoi::NoPendingRewards::SELECTOR),
    ("InsufficientLink", ILuckyKoi::InsufficientLink::SELECTOR),
    ("StillValid", ILuckyKoi::StillValid::SELECTOR),
    ("NoKoiInProgress", ILuckyKoi::NoKoiInProgress::SELECTOR),
    ("TimeoutNotReached", ILuckyKoi::TimeoutNotReached::SELECTOR),
    ("PendingTimeoutNotReached", ILuckyKoi::PendingTimeoutNotReached::SELECTOR),
    ("TokenNotSet", ILuckyKoi::TokenNotSet::SELECTOR),
    ("TokenLocked", ILuckyKoi::TokenLocked::SELECTOR),
    ("TransferFailed", ILuckyKoi::TransferFailed::SELECTOR),
    ("KoiInProgress", ILuckyKoi::KoiInProgress::SELECTOR),
    ("MaxHoldersTooLow", ILuckyKoi::MaxHoldersTooLow::SELECTOR),
    ("InvalidParam", ILuckyKoi::InvalidParam::SELECTOR),
    ("NotLinkToken", ILuckyKoi::NotLinkToken::SELECTOR),
];

/// Names of contract errors whose 4-byte selector appears in a hex revert payload.
fn known_error_names(data: &str) -> Vec<&'static str> {
    let lowered = data.to_lowercase();
    CONTRACT_ERRORS
        .iter()
        .filter(|(_, selector)| lowered.contains(&hex::encode(selector)))
        .map(|(name, _)| *name)
        .collect()
}

/// Classified reason a state-changing request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserCancelled,
    InsufficientFunds,
    NetworkMismatch,
    EndpointUnreachable,
    NotReadyYet,
    AlreadyRegistered,
    NotRegistered,
    BalanceTooLow,
    CapacityReached,
    NothingToClaim,
    FuelTooLow,
    StillValid,
    NothingStuck,
    TimeoutNotElapsed,
    RecycleNotUnlocked,
    TokenNotConfigured,
    TokenPermanentlyLocked,
    TransferFailed,
    SelectionInProgress,
    CapacitySetTooLow,
    InvalidArgument,
    WrongTokenType,
    WalletNotFound,
    Unknown,
}

/// Rejection substrings, checked in this exact order. Some entries are
/// substrings of later ones, so earlier entries win.
const REJECTION_RULES: &[(&str, ErrorKind)] = &[
    ("LotteryNotReady", ErrorKind::NotReadyYet),
    ("AlreadyRegistered", ErrorKind::AlreadyRegistered),
    ("NotRegistered", ErrorKind::NotRegistered),
    ("InsufficientBalance", ErrorKind::BalanceTooLow),
    ("MaxHoldersReached", ErrorKind::CapacityReached),
    ("NoPendingRewards", ErrorKind::NothingToClaim),
    ("InsufficientLink", ErrorKind::FuelTooLow),
    ("StillValid", ErrorKind::StillValid),
    ("NoKoiInProgress", ErrorKind::NothingStuck),
    ("TimeoutNotReached", ErrorKind::TimeoutNotElapsed),
    ("PendingTimeoutNotReached", ErrorKind::RecycleNotUnlocked),
    ("TokenNotSet", ErrorKind::TokenNotConfigured),
    ("TokenLocked", ErrorKind::TokenPermanentlyLocked),
    ("TransferFailed", ErrorKind::TransferFailed),
    ("KoiInProgress", ErrorKind::SelectionInProgress),
    ("MaxHoldersTooLow", ErrorKind::CapacitySetTooLow),
    ("InvalidParam", ErrorKind::InvalidArgument),
    ("NotLinkToken", ErrorKind::WrongTokenType),
];

impl ErrorKind {
    /// Classify an agent failure. Evaluation order is fixed.
    pub fn classify(err: &AgentError) -> Self {
        let symbol = err.symbol.as_deref();

        if err.code == Some(4001) || symbol == Some("ACTION_REJECTED") {
            return ErrorKind::UserCancelled;
        }
        if symbol == Some("INSUFFICIENT_FUNDS") || err.message.contains("insufficient funds") {
            return ErrorKind::InsufficientFunds;
        }

        let text = err.payload_text();
        if let Some((_, kind)) = REJECTION_RULES
            .iter()
            .find(|(needle, _)| text.contains(needle))
        {
            return *kind;
        }

        if symbol == Some("NETWORK_ERROR") {
            return ErrorKind::EndpointUnreachable;
        }
        if text.contains("user rejected") {
            return ErrorKind::UserCancelled;
        }

        ErrorKind::Unknown
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::UserCancelled => "Request cancelled",
            ErrorKind::InsufficientFunds => "Insufficient funds",
            ErrorKind::NetworkMismatch => "Wrong network",
            ErrorKind::EndpointUnreachable => "Network error",
            ErrorKind::NotReadyYet => "Not ready yet",
            ErrorKind::AlreadyRegistered => "Already registered",
            ErrorKind::NotRegistered => "Not registered",
            ErrorKind::BalanceTooLow => "Balance too low",
            ErrorKind::CapacityReached => "Roster full",
            ErrorKind::NothingToClaim => "Nothing to claim",
            ErrorKind::FuelTooLow => "Out of fuel",
            ErrorKind::StillValid => "Holder still valid",
            ErrorKind::NothingStuck => "Nothing stuck",
            ErrorKind::TimeoutNotElapsed => "Timeout not reached",
            ErrorKind::RecycleNotUnlocked => "Recycle locked",
            ErrorKind::TokenNotConfigured => "Token not set",
            ErrorKind::TokenPermanentlyLocked => "Token locked",
            ErrorKind::TransferFailed => "Transfer failed",
            ErrorKind::SelectionInProgress => "Selection in progress",
            ErrorKind::CapacitySetTooLow => "Limit too low",
            ErrorKind::InvalidArgument => "Invalid parameter",
            ErrorKind::WrongTokenType => "Not a LINK token",
            ErrorKind::WalletNotFound => "Wallet not found",
            ErrorKind::Unknown => "Transaction failed",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::UserCancelled => "The signing request was rejected in the wallet.",
            ErrorKind::InsufficientFunds => "The account cannot cover the value plus gas.",
            ErrorKind::NetworkMismatch => "Switch the wallet to the required network and retry.",
            ErrorKind::EndpointUnreachable => "The RPC endpoint could not be reached.",
            ErrorKind::NotReadyYet => "The selection round cannot be triggered yet.",
            ErrorKind::AlreadyRegistered => "This address is already on the roster.",
            ErrorKind::NotRegistered => "This address is not on the roster.",
            ErrorKind::BalanceTooLow => "Token balance is below the minimum holding.",
            ErrorKind::CapacityReached => "The roster has reached its maximum size.",
            ErrorKind::NothingToClaim => "There are no pending rewards for this address.",
            ErrorKind::FuelTooLow => "The randomness subscription needs more LINK.",
            ErrorKind::StillValid => "The reported holder still meets the requirements.",
            ErrorKind::NothingStuck => "No selection is currently stuck.",
            ErrorKind::TimeoutNotElapsed => "The stuck-selection timeout has not elapsed.",
            ErrorKind::RecycleNotUnlocked => "Pending rewards cannot be recycled yet.",
            ErrorKind::TokenNotConfigured => "The protocol token has not been configured.",
            ErrorKind::TokenPermanentlyLocked => "The token configuration is permanently locked.",
            ErrorKind::TransferFailed => "The native transfer failed; check the contract balance.",
            ErrorKind::SelectionInProgress => {
                "A selection is running; the roster is locked until it completes."
            }
            ErrorKind::CapacitySetTooLow => "The holder limit cannot be below the current count.",
            ErrorKind::InvalidArgument => "The arguments do not satisfy the contract rules.",
            ErrorKind::WrongTokenType => "Only LINK token transfers are accepted.",
            ErrorKind::WalletNotFound => "The selected wallet is not installed or not reachable.",
            ErrorKind::Unknown => "The request failed for an unrecognised reason.",
        }
    }
}

/// Surfaced failure of a write request
#[derive(Error, Debug)]
pub enum TxError {
    #[error("no signing agent connected")]
    NeedsConnection,

    #[error("wallet is on chain {actual}, expected {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("{}: {detail}", .kind.title())]
    Rejected { kind: ErrorKind, detail: String },

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
}

impl TxError {
    /// Classified kind used for the title/message pair
    pub fn kind(&self) -> ErrorKind {
        match self {
            TxError::NeedsConnection => ErrorKind::WalletNotFound,
            TxError::NetworkMismatch { .. } => ErrorKind::NetworkMismatch,
            TxError::Rejected { kind, .. } => *kind,
            TxError::Reverted { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<AgentError> for TxError {
    fn from(err: AgentError) -> Self {
        TxError::Rejected {
            kind: ErrorKind::classify(&err),
            detail: err.to_string(),
        }
    }
}
