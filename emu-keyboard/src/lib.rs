//! Memory-mapped keyboard: one status word the device writes and the guest reads
//! (`(key << 8) | pressed`), and one word the guest writes to send data back. A background
//! worker wakes on every write to the inbound word but — same as the source device — has
//! nowhere to route it yet: there is no buffered-input queue to drain, only the guest
//! register and the raw host key events already reaching `key_pressed`/`key_released`
//! directly.

use emu_bus::WakeChannel;
use emu_pic::{Pic, KEYBOARD_INT};
use emu_region::{AccessMode, AddressableRegion, RegionError, WORD_SIZE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::debug;

pub const KEYBOARD_OUT_SIZE: u32 = WORD_SIZE;
pub const KEYBOARD_IN_SIZE: u32 = WORD_SIZE;

const PRESSED_BIT: u32 = 1;

struct State {
    out: u32,
    in_value: u32,
}

/// Shared device state. Both bus-mapped regions and the host-facing key event API read and
/// write the same storage.
pub struct Keyboard {
    state: Mutex<State>,
    pic: Arc<Pic>,
}

impl Keyboard {
    pub fn new(pic: Arc<Pic>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State { out: 0, in_value: 0 }),
            pic,
        })
    }

    pub fn out_region(self: &Arc<Self>) -> KeyboardOutRegion {
        KeyboardOutRegion { keyboard: self.clone() }
    }

    pub fn in_region(self: &Arc<Self>) -> KeyboardInRegion {
        KeyboardInRegion { keyboard: self.clone() }
    }

    pub fn key_pressed(&self, key: u8) {
        let mut state = self.state.lock().expect("keyboard mutex poisoned");
        state.out = (u32::from(key) << 8) | PRESSED_BIT;
        drop(state);
        self.pic.trigger(KEYBOARD_INT);
    }

    pub fn key_released(&self, key: u8) {
        let mut state = self.state.lock().expect("keyboard mutex poisoned");
        state.out = u32::from(key) << 8;
        drop(state);
        self.pic.trigger(KEYBOARD_INT);
    }
}

pub struct KeyboardOutRegion {
    keyboard: Arc<Keyboard>,
}

impl AddressableRegion for KeyboardOutRegion {
    fn size_bytes(&self) -> u32 {
        KEYBOARD_OUT_SIZE
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn set_mode(&mut self, _mode: AccessMode) {}

    fn read_word(&self, offset: u32) -> Result<u32, RegionError> {
        require_offset_zero(offset)?;
        Ok(self.keyboard.state.lock().expect("keyboard mutex poisoned").out)
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegionError> {
        require_offset_zero(offset)?;
        self.keyboard.state.lock().expect("keyboard mutex poisoned").out = value;
        Ok(())
    }
}

pub struct KeyboardInRegion {
    keyboard: Arc<Keyboard>,
}

impl AddressableRegion for KeyboardInRegion {
    fn size_bytes(&self) -> u32 {
        KEYBOARD_IN_SIZE
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn set_mode(&mut self, _mode: AccessMode) {}

    fn read_word(&self, offset: u32) -> Result<u32, RegionError> {
        require_offset_zero(offset)?;
        Ok(self.keyboard.state.lock().expect("keyboard mutex poisoned").in_value)
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegionError> {
        require_offset_zero(offset)?;
        self.keyboard.state.lock().expect("keyboard mutex poisoned").in_value = value;
        Ok(())
    }
}

fn require_offset_zero(offset: u32) -> Result<(), RegionError> {
    if offset % WORD_SIZE != 0 {
        return Err(RegionError::NotAligned);
    }
    if offset != 0 {
        return Err(RegionError::OutOfBounds);
    }
    Ok(())
}

/// Background thread that wakes whenever the guest writes the inbound word. Wired up by
/// subscribing a [`WakeChannel`] to the keyboard-in bus address and handing it here.
pub struct KeyboardWorker {
    running: Arc<AtomicBool>,
    wake: Arc<WakeChannel>,
    handle: Option<JoinHandle<()>>,
}

impl KeyboardWorker {
    pub fn start(wake: Arc<WakeChannel>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let thread_wake = wake.clone();
        let handle = std::thread::Builder::new()
            .name("emu-keyboard".into())
            .spawn(move || {
                let mut seen = thread_wake.current();
                while thread_running.load(Ordering::Relaxed) {
                    seen = thread_wake.wait(seen);
                    if !thread_running.load(Ordering::Relaxed) {
                        break;
                    }
                    // TODO: route the written word into a buffered-input queue once one
                    // exists; there is nothing to drain yet.
                    debug!("keyboard: inbound word written");
                }
            })
            .expect("failed to spawn keyboard thread");

        Self { running, wake, handle: Some(handle) }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.wake.notify();
        if let Some(handle) = self.handle.take() {
            handle.join().expect("keyboard thread panicked");
        }
    }
}

impl Drop for KeyboardWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pressed_sets_out_word_and_triggers_interrupt() {
        let pic = Pic::new();
        let keyboard = Keyboard::new(pic.clone());
        let region = keyboard.out_region();

        keyboard.key_pressed(0x41);
        assert_eq!(region.read_word(0).unwrap(), (0x41 << 8) | 1);
        assert!(pic.any_deliverable());
    }

    #[test]
    fn key_released_clears_pressed_bit() {
        let pic = Pic::new();
        let keyboard = Keyboard::new(pic);
        let region = keyboard.out_region();

        keyboard.key_released(0x41);
        assert_eq!(region.read_word(0).unwrap(), 0x41 << 8);
    }

    #[test]
    fn in_region_round_trips_guest_writes() {
        let pic = Pic::new();
        let keyboard = Keyboard::new(pic);
        let mut region = keyboard.in_region();
        region.write_word(0, 0xAB).unwrap();
        assert_eq!(region.read_word(0).unwrap(), 0xAB);
    }

    #[test]
    fn worker_stops_cleanly_without_any_writes() {
        let wake = WakeChannel::new();
        let mut worker = KeyboardWorker::start(wake);
        worker.stop();
        assert!(worker.handle.is_none());
    }
}
