//! Runtime configuration for a [`crate::driver::RaftDriver`].

use rand::Rng;
use thiserror::Error;

/// Configuration errors detected by [`Config::build`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("election_timeout_min must be < election_timeout_max")]
    InvalidElectionTimeoutRange,
    #[error("heartbeat_interval must be < election_timeout_min")]
    HeartbeatNotLessThanElectionTimeout,
    #[error("max_inflight_msgs must be at least 1")]
    InvalidMaxInflight,
}

/// Tuning knobs for a Raft group. Timeouts are expressed in abstract
/// "ticks" — the unit the host advances by calling
/// [`crate::driver::RaftDriver::tick`] — rather than wall-clock durations,
/// since this crate never reads the clock itself.
#[derive(Clone, Debug)]
pub struct Config {
    /// Lower bound (inclusive) of the randomized election timeout, in ticks.
    pub election_timeout_min: u64,
    /// Upper bound (exclusive) of the randomized election timeout, in ticks.
    pub election_timeout_max: u64,
    /// Number of ticks between leader heartbeats.
    pub heartbeat_interval: u64,
    /// Maximum number of in-flight (unacknowledged) append messages per follower.
    pub max_inflight_msgs: usize,
    /// Soft cap, in bytes, on the total payload size of a single append message.
    pub max_size_per_msg: u64,
    /// Whether to run a pre-vote phase before incrementing term and campaigning.
    pub pre_vote: bool,
    /// Whether the leader steps down after failing to hear from a quorum
    /// within an election timeout (checkQuorum).
    pub check_quorum: bool,
}

impl Config {
    /// Starts building a [`Config`] with the teacher-standard defaults
    /// (10-20 tick randomized election timeout, 2-tick heartbeat).
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns a new randomized election timeout in `[election_timeout_min, election_timeout_max)`.
    pub fn new_rand_election_timeout(&self) -> u64 {
        if self.election_timeout_min >= self.election_timeout_max {
            return self.election_timeout_min;
        }
        rand::thread_rng().gen_range(self.election_timeout_min..self.election_timeout_max)
    }
}

/// Builder for [`Config`], modeled on the teacher's validated config construction.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    election_timeout_min: u64,
    election_timeout_max: u64,
    heartbeat_interval: u64,
    max_inflight_msgs: usize,
    max_size_per_msg: u64,
    pre_vote: bool,
    check_quorum: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            election_timeout_min: 10,
            election_timeout_max: 20,
            heartbeat_interval: 2,
            max_inflight_msgs: 256,
            max_size_per_msg: 1024 * 1024,
            pre_vote: true,
            check_quorum: true,
        }
    }
}

impl ConfigBuilder {
    pub fn election_timeout_min(mut self, v: u64) -> Self {
        self.election_timeout_min = v;
        self
    }

    pub fn election_timeout_max(mut self, v: u64) -> Self {
        self.election_timeout_max = v;
        self
    }

    pub fn heartbeat_interval(mut self, v: u64) -> Self {
        self.heartbeat_interval = v;
        self
    }

    pub fn max_inflight_msgs(mut self, v: usize) -> Self {
        self.max_inflight_msgs = v;
        self
    }

    pub fn max_size_per_msg(mut self, v: u64) -> Self {
        self.max_size_per_msg = v;
        self
    }

    pub fn pre_vote(mut self, v: bool) -> Self {
        self.pre_vote = v;
        self
    }

    pub fn check_quorum(mut self, v: bool) -> Self {
        self.check_quorum = v;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if self.election_timeout_min >= self.election_timeout_max {
            return Err(ConfigError::InvalidElectionTimeoutRange);
        }
        if self.heartbeat_interval >= self.election_timeout_min {
            return Err(ConfigError::HeartbeatNotLessThanElectionTimeout);
        }
        if self.max_inflight_msgs == 0 {
            return Err(ConfigError::InvalidMaxInflight);
        }
        Ok(Config {
            election_timeout_min: self.election_timeout_min,
            election_timeout_max: self.election_timeout_max,
            heartbeat_interval: self.heartbeat_interval,
            max_inflight_msgs: self.max_inflight_msgs,
            max_size_per_msg: self.max_size_per_msg,
            pre_vote: self.pre_vote,
            check_quorum: self.check_quorum,
        })
    }
}
