//! A word bus: an ordered set of memory zones plus write-notification subscriptions.
//!
//! Zones are attached once, at construction, and never detached. A single bus-wide mutex
//! serializes all reads and writes — instruction throughput, not parallel I/O, is the
//! bottleneck here, so a fine-grained per-zone lock buys nothing.

mod wake;

pub use wake::WakeChannel;

use emu_region::{AccessMode, AddressableRegion, RegionError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum BusError {
    #[error("no zone contains this address, or the address is not word-aligned")]
    InvalidAddress,
    #[error("write to a read-only zone")]
    IllegalAccess,
}

#[derive(Debug, Error, Clone)]
#[error("zone at base {base:#010x} ({label}) overlaps an existing zone")]
pub struct ZoneConflict {
    pub base: u32,
    pub label: String,
}

impl From<RegionError> for BusError {
    fn from(err: RegionError) -> Self {
        match err {
            RegionError::NotAligned | RegionError::OutOfBounds => BusError::InvalidAddress,
            RegionError::NotWritable => BusError::IllegalAccess,
        }
    }
}

struct ZoneEntry {
    base: u32,
    label: String,
    region: Box<dyn AddressableRegion>,
}

impl ZoneEntry {
    fn contains(&self, address: u32) -> bool {
        let size = self.region.size_bytes();
        address >= self.base && address < self.base.saturating_add(size)
    }
}

struct Inner {
    zones: Vec<ZoneEntry>,
}

/// The shared memory bus. Constructed with `Bus::new`, populated with `attach` and
/// `subscribe`, then shared across threads (typically behind an `Arc`).
pub struct Bus {
    inner: Mutex<Inner>,
    subscriptions: HashMap<u32, Vec<Arc<WakeChannel>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { zones: Vec::new() }),
            subscriptions: HashMap::new(),
        }
    }

    /// Attaches a region at `base`, sorted into the zone list by base address. Rejects any
    /// zone whose range overlaps one already attached.
    pub fn attach(
        &mut self,
        base: u32,
        region: impl AddressableRegion + 'static,
        label: impl Into<String>,
    ) -> Result<(), ZoneConflict> {
        let label = label.into();
        let size = region.size_bytes();
        let inner = self.inner.get_mut().expect("bus mutex poisoned");

        let insert_at = inner.zones.partition_point(|z| z.base < base);
        let overlaps_next = inner
            .zones
            .get(insert_at)
            .is_some_and(|z| z.base < base.saturating_add(size));
        let overlaps_prev = insert_at
            .checked_sub(1)
            .and_then(|i| inner.zones.get(i))
            .is_some_and(|z| z.contains(base));
        if overlaps_next || overlaps_prev {
            warn!(base, %label, "rejected zone attach: overlaps an existing zone");
            return Err(ZoneConflict { base, label });
        }

        inner.zones.insert(
            insert_at,
            ZoneEntry {
                base,
                label,
                region: Box::new(region),
            },
        );
        Ok(())
    }

    /// Registers a wake channel to be signaled on every successful write to `address`.
    /// Subscriptions are fixed at construction time; this is a no-op once the bus starts
    /// serving reads/writes from multiple threads (the table is read-only during run).
    pub fn subscribe(&mut self, address: u32, channel: Arc<WakeChannel>) {
        self.subscriptions.entry(address).or_default().push(channel);
    }

    pub fn read_word(&self, address: u32) -> Result<u32, BusError> {
        let inner = self.inner.lock().expect("bus mutex poisoned");
        let zone = Self::find_zone(&inner.zones, address).ok_or(BusError::InvalidAddress)?;
        Ok(zone.region.read_word(address - zone.base)?)
    }

    pub fn write_word(&self, address: u32, value: u32) -> Result<(), BusError> {
        {
            let mut inner = self.inner.lock().expect("bus mutex poisoned");
            let zone_index = inner
                .zones
                .iter()
                .position(|z| z.contains(address))
                .ok_or(BusError::InvalidAddress)?;
            let zone = &mut inner.zones[zone_index];
            let offset = address - zone.base;
            zone.region.write_word(offset, value)?;
        } // lock dropped before signaling, so a woken subscriber never blocks on it

        if let Some(subscribers) = self.subscriptions.get(&address) {
            for channel in subscribers {
                channel.notify();
            }
        }
        Ok(())
    }

    /// Temporarily unlocks a zone for writes (ROM image loading) or relocks it.
    pub fn set_zone_mode(&self, base: u32, mode: AccessMode) {
        let mut inner = self.inner.lock().expect("bus mutex poisoned");
        if let Some(zone) = inner.zones.iter_mut().find(|z| z.base == base) {
            zone.region.set_mode(mode);
        }
    }

    fn find_zone(zones: &[ZoneEntry], address: u32) -> Option<&ZoneEntry> {
        zones.iter().find(|z| z.contains(address))
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_region::Region;
    use std::sync::Arc;

    fn ram(size: u32) -> Region {
        Region::new(size, AccessMode::ReadWrite)
    }

    #[test]
    fn attach_and_round_trip() {
        let mut bus = Bus::new();
        bus.attach(0, ram(64), "ram").unwrap();
        bus.write_word(8, 0xDEAD_BEEF).unwrap();
        assert_eq!(bus.read_word(8), Ok(0xDEAD_BEEF));
    }

    #[test]
    fn rejects_overlapping_zone() {
        let mut bus = Bus::new();
        bus.attach(0, ram(64), "ram").unwrap();
        let err = bus.attach(32, ram(64), "overlap").unwrap_err();
        assert_eq!(err.base, 32);
    }

    #[test]
    fn accepts_adjacent_non_overlapping_zones() {
        let mut bus = Bus::new();
        bus.attach(0, ram(64), "low").unwrap();
        bus.attach(64, ram(64), "high").unwrap();
        bus.write_word(64, 1).unwrap();
        assert_eq!(bus.read_word(64), Ok(1));
    }

    #[test]
    fn unmapped_address_is_invalid() {
        let bus = Bus::new();
        assert_eq!(bus.read_word(0), Err(BusError::InvalidAddress));
    }

    #[test]
    fn write_to_read_only_zone_is_illegal_access() {
        let mut bus = Bus::new();
        bus.attach(0, Region::new(16, AccessMode::ReadOnly), "rom").unwrap();
        assert_eq!(bus.write_word(0, 1), Err(BusError::IllegalAccess));
    }

    #[test]
    fn misaligned_address_is_invalid() {
        let mut bus = Bus::new();
        bus.attach(0, ram(16), "ram").unwrap();
        assert_eq!(bus.read_word(1), Err(BusError::InvalidAddress));
    }

    #[test]
    fn subscriber_is_woken_on_write_to_watched_address() {
        let mut bus = Bus::new();
        bus.attach(0, ram(16), "ram").unwrap();
        let channel = WakeChannel::new();
        bus.subscribe(4, channel.clone());

        let seen = channel.current();
        bus.write_word(4, 1).unwrap();
        let woken = channel.wait(seen);
        assert_ne!(woken, seen);
    }

    #[test]
    fn subscriber_not_woken_on_write_to_other_address() {
        let mut bus = Bus::new();
        bus.attach(0, ram(16), "ram").unwrap();
        let channel = WakeChannel::new();
        bus.subscribe(4, channel.clone());

        bus.write_word(8, 1).unwrap();
        assert_eq!(channel.current(), 0);
    }

    #[test]
    fn set_zone_mode_unlocks_and_relocks() {
        let mut bus = Bus::new();
        bus.attach(0, Region::new(16, AccessMode::ReadOnly), "rom").unwrap();
        bus.set_zone_mode(0, AccessMode::ReadWrite);
        assert!(bus.write_word(0, 7).is_ok());
        bus.set_zone_mode(0, AccessMode::ReadOnly);
        assert_eq!(bus.write_word(0, 0), Err(BusError::IllegalAccess));
    }
}
