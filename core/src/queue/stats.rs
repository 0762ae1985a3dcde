use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub cycles: u64,
    /// Accepted by the consumer.
    pub forwarded: u64,
    pub forward_failures: u64,
    /// Highest number of drain cycles ever running at once. Always <= 1.
    pub max_in_flight: u32,
}
