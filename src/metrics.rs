//! Metrics collection helpers
//!
//! Thin wrappers over the `metrics` macros so call sites stay one-liners
//! and metric names live in a single place. Whether anything is recorded
//! depends on the recorder the embedding application installs.

/// Label values used across counters
pub mod labels {
    /// Dial failed because the connection string did not parse
    pub const REASON_URI: &str = "uri";
    /// Dial failed because the server was unreachable
    pub const REASON_DIAL: &str = "dial";
    /// Dial failed because the window elapsed
    pub const REASON_TIMEOUT: &str = "timeout";

    /// `buildInfo` probe
    pub const COMMAND_BUILD_INFO: &str = "buildInfo";
    /// `isMaster` probe
    pub const COMMAND_IS_MASTER: &str = "isMaster";
}

/// Counter helpers
pub mod counters {
    use metrics::counter;

    /// A dial was attempted
    pub fn dial_attempted() {
        counter!("mongoprobe_dials_total").increment(1);
    }

    /// A dial failed, labelled by failure reason
    pub fn dial_failed(reason: &'static str) {
        counter!("mongoprobe_dial_failures_total", "reason" => reason).increment(1);
    }

    /// A session copy was handed out
    pub fn session_copied() {
        counter!("mongoprobe_session_copies_total").increment(1);
    }

    /// A diagnostic probe failed, labelled by command
    pub fn probe_failed(command: &'static str) {
        counter!("mongoprobe_probe_failures_total", "command" => command).increment(1);
    }
}
