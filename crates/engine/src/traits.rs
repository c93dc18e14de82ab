/// Result type for host operations that may be unsupported.
pub type CapResult<T> = Result<T, CapError>;

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Power supply service
// ---------------------------------------------------------------------------

/// Raw fields of the legacy battery-changed broadcast.
///
/// Either field may be missing on hosts that publish a partial broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryBroadcast {
    pub level: Option<i64>,
    pub scale: Option<i64>,
}

/// Host power service answering the two probe queries.
pub trait PowerSupplyOps: Send + Sync {
    /// Integer capacity property. Hosts report unknown as a negative sentinel.
    fn capacity_property(&self) -> CapResult<i32>;

    /// Current level and maximum scale as published by the battery broadcast.
    fn battery_broadcast(&self) -> CapResult<BatteryBroadcast>;
}
