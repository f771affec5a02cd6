use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Connected,
    Disconnected,
}

/// Point-in-time view of the device connectivity
pub trait NetworkStateService: Send + Sync {
    fn network_state(&self) -> NetworkState;
}

/// Connectivity flag flipped by whoever watches the platform network.
#[derive(Debug)]
pub struct SharedNetworkState {
    connected: AtomicBool,
}

impl SharedNetworkState {
    pub fn new(state: NetworkState) -> Self {
        Self {
            connected: AtomicBool::new(state == NetworkState::Connected),
        }
    }

    pub fn set(&self, state: NetworkState) {
        let connected = state == NetworkState::Connected;
        if self.connected.swap(connected, Ordering::SeqCst) != connected {
            tracing::info!(?state, "network state changed");
        }
    }
}

impl Default for SharedNetworkState {
    fn default() -> Self {
        Self::new(NetworkState::Connected)
    }
}

impl NetworkStateService for SharedNetworkState {
    fn network_state(&self) -> NetworkState {
        if self.connected.load(Ordering::SeqCst) {
            NetworkState::Connected
        } else {
            NetworkState::Disconnected
        }
    }
}
