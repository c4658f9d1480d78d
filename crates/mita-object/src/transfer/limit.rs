//! Bandwidth limits for transfers.

/// Request header carrying the bandwidth limit in bits per second.
pub const TRAFFIC_LIMIT_HEADER: &str = "x-oss-traffic-limit";

/// Smallest limit the storage service honours (100 KB/s).
pub const MIN_TRAFFIC_LIMIT_BITS: u64 = 819_200;

/// Largest limit the storage service honours (100 MB/s).
pub const MAX_TRAFFIC_LIMIT_BITS: u64 = 838_860_800;

/// Bandwidth limit applied to every request of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficLimit {
    bits_per_second: u64,
}

impl TrafficLimit {
    /// Converts a limit in KB/s to the header value `kbps * 1024 * 8`.
    ///
    /// Returns `None` for zero, which is never a valid limit.
    pub fn from_kbps(kbps: u64) -> Option<Self> {
        (kbps > 0).then(|| Self {
            bits_per_second: kbps.saturating_mul(1024 * 8),
        })
    }

    /// Limit in bits per second.
    pub fn bits_per_second(&self) -> u64 {
        self.bits_per_second
    }

    /// Whether the service honours this limit as is.
    pub fn is_within_service_range(&self) -> bool {
        (MIN_TRAFFIC_LIMIT_BITS..=MAX_TRAFFIC_LIMIT_BITS).contains(&self.bits_per_second)
    }
}

impl std::fmt::Display for TrafficLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bit/s", self.bits_per_second)
    }
}
