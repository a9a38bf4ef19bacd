//! Network constraints forwarded to background jobs.

use std::fmt;
use std::str::FromStr;

/// Network a background job needs before it may run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NetworkType {
    /// Any connected network.
    #[default]
    Any,
    /// A connected network without metering.
    Unmetered,
    /// A connected network that is not roaming.
    NotRoaming,
}

impl NetworkType {
    /// Value used in `settings.conf`.
    #[must_use]
    pub const fn as_config_key(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Unmetered => "unmetered",
            Self::NotRoaming => "not_roaming",
        }
    }

    /// Whether `state` satisfies this constraint.
    #[must_use]
    pub const fn allows(self, state: NetworkState) -> bool {
        if !state.connected {
            return false;
        }
        match self {
            Self::Any => true,
            Self::Unmetered => !state.metered,
            Self::NotRoaming => !state.roaming,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_config_key())
    }
}

/// Unrecognized `updater_network_type` value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown network type {0:?} (expected any, unmetered or not_roaming)")]
pub struct ParseNetworkTypeError(String);

impl FromStr for NetworkType {
    type Err = ParseNetworkTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "any" | "connected" => Ok(Self::Any),
            "unmetered" => Ok(Self::Unmetered),
            "not_roaming" => Ok(Self::NotRoaming),
            _ => Err(ParseNetworkTypeError(s.to_string())),
        }
    }
}

/// Snapshot of the current network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkState {
    /// Any network is up.
    pub connected: bool,
    /// The network is metered.
    pub metered: bool,
    /// The device is roaming.
    pub roaming: bool,
}

/// Source of the current network state.
pub trait NetworkProbe: Send + Sync {
    /// Current network state.
    fn current(&self) -> NetworkState;
}

/// Probe returning a fixed state; the CLI reports an unmetered, non-roaming
/// connection because a desktop host has no such distinction.
#[derive(Clone, Copy, Debug)]
pub struct StaticNetwork(pub NetworkState);

impl StaticNetwork {
    /// Connected, unmetered, not roaming.
    #[must_use]
    pub const fn unmetered() -> Self {
        Self(NetworkState {
            connected: true,
            metered: false,
            roaming: false,
        })
    }
}

impl NetworkProbe for StaticNetwork {
    fn current(&self) -> NetworkState {
        self.0
    }
}
