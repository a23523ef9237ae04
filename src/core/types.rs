use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an exchange order, with the integer the chain encodes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub const fn to_wire(self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => 2,
        }
    }
}

/// Order type. The matching engine only accepts limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
}

impl OrderType {
    pub const fn to_wire(self) -> i64 {
        match self {
            Self::Limit => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    GoodTillExpire,
    ImmediateOrCancel,
}

impl TimeInForce {
    pub const fn to_wire(self) -> i64 {
        match self {
            Self::GoodTillExpire => 1,
            Self::ImmediateOrCancel => 3,
        }
    }
}

/// Order lifecycle states reported by the exchange REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Ack,
    PartialFill,
    IocNoFill,
    FullyFill,
    Canceled,
    Expired,
    FailedBlocking,
    FailedMatching,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "Ack",
            Self::PartialFill => "PartialFill",
            Self::IocNoFill => "IocNoFill",
            Self::FullyFill => "FullyFill",
            Self::Canceled => "Canceled",
            Self::Expired => "Expired",
            Self::FailedBlocking => "FailedBlocking",
            Self::FailedMatching => "FailedMatching",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionSide {
    Receive,
    Send,
}

impl TransactionSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receive => "RECEIVE",
            Self::Send => "SEND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    NewOrder,
    IssueToken,
    BurnToken,
    ListToken,
    CancelOrder,
    FreezeToken,
    UnfreezeToken,
    Transfer,
    Proposal,
    Vote,
}

impl TransactionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewOrder => "NEW_ORDER",
            Self::IssueToken => "ISSUE_TOKEN",
            Self::BurnToken => "BURN_TOKEN",
            Self::ListToken => "LIST_TOKEN",
            Self::CancelOrder => "CANCEL_ORDER",
            Self::FreezeToken => "FREEZE_TOKEN",
            Self::UnfreezeToken => "UN_FREEZE_TOKEN",
            Self::Transfer => "TRANSFER",
            Self::Proposal => "PROPOSAL",
            Self::Vote => "VOTE",
        }
    }
}

/// Candlestick intervals accepted by the klines endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    Minutes1,
    Minutes3,
    Minutes5,
    Minutes15,
    Minutes30,
    Hours1,
    Hours2,
    Hours4,
    Hours6,
    Hours8,
    Hours12,
    Days1,
    Days3,
    Weeks1,
    Months1,
}

impl KlineInterval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minutes1 => "1m",
            Self::Minutes3 => "3m",
            Self::Minutes5 => "5m",
            Self::Minutes15 => "15m",
            Self::Minutes30 => "30m",
            Self::Hours1 => "1h",
            Self::Hours2 => "2h",
            Self::Hours4 => "4h",
            Self::Hours6 => "6h",
            Self::Hours8 => "8h",
            Self::Hours12 => "12h",
            Self::Days1 => "1d",
            Self::Days3 => "3d",
            Self::Weeks1 => "1w",
            Self::Months1 => "1M",
        }
    }

    /// All intervals the exchange accepts
    pub fn all() -> Vec<Self> {
        vec![
            Self::Minutes1,
            Self::Minutes3,
            Self::Minutes5,
            Self::Minutes15,
            Self::Minutes30,
            Self::Hours1,
            Self::Hours2,
            Self::Hours4,
            Self::Hours6,
            Self::Hours8,
            Self::Hours12,
            Self::Days1,
            Self::Days3,
            Self::Weeks1,
            Self::Months1,
        ]
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Peer capability filter for the peers endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerType {
    /// Peers that accept node RPC requests
    Node,
    /// Peers that accept websocket connections
    Websocket,
}

impl PeerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Websocket => "ws",
        }
    }
}

/// How long a node RPC broadcast waits before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcBroadcastMode {
    /// Return after CheckTx
    Sync,
    /// Return immediately, before CheckTx
    Async,
    /// Wait for the transaction to be committed to a block
    Commit,
}

impl RpcBroadcastMode {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Sync => "broadcast_tx_sync",
            Self::Async => "broadcast_tx_async",
            Self::Commit => "broadcast_tx_commit",
        }
    }
}
