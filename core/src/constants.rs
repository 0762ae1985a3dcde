//! Defaults and fixed limits shared across the pipeline.
use std::time::Duration;

/// Ingestion queue: max items forwarded per drain cycle.
pub const DEFAULT_MAX_BATCH: usize = 15;
/// Ingestion queue: wall-clock slice a single cycle may use.
pub const DEFAULT_TIME_SLICE_MS: u64 = 5;
/// Ingestion queue: an idle request is forced to run after this long.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 2_000;
/// Stop taking items once the scheduler reports less than this.
pub const MIN_IDLE_REMAINING: Duration = Duration::from_millis(1);

/// Length of one idle period handed to a task (matches browser idle periods).
pub const IDLE_PERIOD: Duration = Duration::from_millis(50);
/// Quiet time before the loop scheduler considers itself idle.
pub const DEFAULT_IDLE_AFTER: Duration = Duration::from_millis(4);

/// URLs at or above this length are rejected before any transport attempt.
pub const MAX_URL_LEN: usize = 2_048;
/// Serialized payload limit for the tracking-pixel GET.
pub const PIXEL_MAX_CHARS: usize = 2_000;
/// Body limit for the beacon-style background POST.
pub const BEACON_MAX_BYTES: usize = 64 * 1024;
/// Default request timeout for HTTP transports.
pub const DEFAULT_TRANSPORT_TIMEOUT_MS: u64 = 2_000;

/// Per-session trace id length.
pub const TRACE_ID_LEN: usize = 10;

/// Keys used in the visitor/session stores.
pub mod storage_keys {
    pub const USER_ID: &str = "river-userId";
    pub const TRACE_ID: &str = "river-traceId";
}

/// Hook names, one sub-module per owning component.
pub mod hook_names {
    pub mod config {
        pub const INIT: &str = "init";
        pub const BEFORE_READY: &str = "beforeReady";
        pub const READY: &str = "ready";
        pub const ALL: &[&str] = &[INIT, BEFORE_READY, READY];
    }

    pub mod monitor {
        pub const BEFORE_START: &str = "beforeStart";
        pub const BEFORE_STOP: &str = "beforeStop";
        pub const ALL: &[&str] = &[BEFORE_START, BEFORE_STOP];
    }

    pub mod builder {
        pub const BEFORE_BUILD: &str = "beforeBuild";
        pub const AFTER_BUILD: &str = "afterBuild";
        pub const ALL: &[&str] = &[BEFORE_BUILD, AFTER_BUILD];
    }

    pub mod sender {
        pub const BEFORE_SEND: &str = "beforeSend";
        pub const AFTER_SEND: &str = "afterSend";
        pub const ON_ERROR: &str = "onError";
        pub const MESSAGE_HOOKS: &[&str] = &[BEFORE_SEND, AFTER_SEND];
        pub const ERROR_HOOKS: &[&str] = &[ON_ERROR];
    }
}
