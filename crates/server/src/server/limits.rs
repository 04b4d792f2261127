//! Admission control for incoming connections.

use crate::config::ServerConfig;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counts {
    per_ip: HashMap<IpAddr, usize>,
    total: usize,
}

/// Caps on total and per-address connections, shared by every listener.
#[derive(Debug, Clone)]
pub struct ConnectionLimits {
    max_total: usize,
    max_per_ip: usize,
    counts: Arc<Mutex<Counts>>,
}

impl ConnectionLimits {
    pub fn new(max_total: usize, max_per_ip: usize) -> Self {
        Self {
            max_total,
            max_per_ip,
            counts: Arc::default(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.max_connections, config.ip_limit)
    }

    /// Reserve a slot for `ip`, or `None` when either cap is reached.
    ///
    /// The slot is released when the permit is dropped.
    pub fn try_acquire(&self, ip: IpAddr) -> Option<ConnectionPermit> {
        let mut counts = lock(&self.counts);
        let from_ip = counts.per_ip.get(&ip).copied().unwrap_or(0);
        if counts.total >= self.max_total || from_ip >= self.max_per_ip {
            return None;
        }
        counts.total += 1;
        *counts.per_ip.entry(ip).or_default() += 1;
        Some(ConnectionPermit {
            ip,
            counts: Arc::clone(&self.counts),
        })
    }

    /// Connections currently holding a permit.
    pub fn active(&self) -> usize {
        lock(&self.counts).total
    }
}

/// One admitted connection.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct ConnectionPermit {
    ip: IpAddr,
    counts: Arc<Mutex<Counts>>,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        let mut counts = lock(&self.counts);
        counts.total = counts.total.saturating_sub(1);
        if let Entry::Occupied(mut held) = counts.per_ip.entry(self.ip) {
            *held.get_mut() -= 1;
            if *held.get() == 0 {
                held.remove();
            }
        }
    }
}

// Counters stay consistent across a panic, so a poisoned lock is still usable.
fn lock(counts: &Mutex<Counts>) -> MutexGuard<'_, Counts> {
    counts.lock().unwrap_or_else(PoisonError::into_inner)
}
