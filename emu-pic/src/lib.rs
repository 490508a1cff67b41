//! Programmable interrupt controller: a 256-bit pending set and a 256-bit mask, each
//! stored as eight 32-bit words. `trigger` also signals a waitable used by the CPU's
//! wait-for-interrupt opcode.

use emu_region::{AccessMode, AddressableRegion, RegionError};
use std::sync::{Arc, Condvar, Mutex};
use tracing::debug;

pub const INTERRUPTS_COUNT: u32 = 256;
pub const INTERRUPTS_PER_WORD: u32 = 32;
pub const INTERRUPTS_WORDS_COUNT: u32 = INTERRUPTS_COUNT / INTERRUPTS_PER_WORD;

pub const TIMER_INT: u8 = 0;
pub const VSYNC_INT: u8 = 1;
pub const KEYBOARD_INT: u8 = 2;

struct Bitset256 {
    words: [u32; INTERRUPTS_WORDS_COUNT as usize],
}

impl Bitset256 {
    fn zeroed() -> Self {
        Self {
            words: [0; INTERRUPTS_WORDS_COUNT as usize],
        }
    }

    fn location(i: u8) -> (usize, u32) {
        let i = u32::from(i);
        ((i / INTERRUPTS_PER_WORD) as usize, 1 << (i % INTERRUPTS_PER_WORD))
    }

    fn get(&self, i: u8) -> bool {
        let (word, bit) = Self::location(i);
        self.words[word] & bit != 0
    }

    fn set(&mut self, i: u8, value: bool) {
        let (word, bit) = Self::location(i);
        if value {
            self.words[word] |= bit;
        } else {
            self.words[word] &= !bit;
        }
    }
}

struct State {
    pending: Bitset256,
    mask: Bitset256,
}

/// The interrupt controller. Shared across the CPU thread and every device thread;
/// internally locked, so it is safe behind a plain `Arc`.
pub struct Pic {
    state: Mutex<State>,
    interrupt_arrived: Condvar,
}

impl Pic {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                pending: Bitset256::zeroed(),
                mask: Bitset256::zeroed(),
            }),
            interrupt_arrived: Condvar::new(),
        })
    }

    pub fn trigger(&self, i: u8) {
        let mut state = self.state.lock().expect("pic mutex poisoned");
        state.pending.set(i, true);
        debug!(interrupt = i, "pic: triggered");
        self.interrupt_arrived.notify_all();
    }

    pub fn reset(&self, i: u8) {
        let mut state = self.state.lock().expect("pic mutex poisoned");
        state.pending.set(i, false);
    }

    pub fn mask(&self, i: u8) {
        self.state.lock().expect("pic mutex poisoned").mask.set(i, true);
    }

    pub fn unmask(&self, i: u8) {
        self.state.lock().expect("pic mutex poisoned").mask.set(i, false);
    }

    /// Raw pending bitset, for diagnostics/snapshots — not used by delivery itself.
    pub fn pending_words(&self) -> [u32; INTERRUPTS_WORDS_COUNT as usize] {
        self.state.lock().expect("pic mutex poisoned").pending.words
    }

    /// Raw mask bitset, for diagnostics/snapshots — not used by delivery itself.
    pub fn mask_words(&self) -> [u32; INTERRUPTS_WORDS_COUNT as usize] {
        self.state.lock().expect("pic mutex poisoned").mask.words
    }

    pub fn any_deliverable(&self) -> bool {
        self.next_deliverable_locked(&self.state.lock().expect("pic mutex poisoned"))
            .is_some()
    }

    /// Lowest-numbered `i` with `pending[i] & !mask[i]`. Returns 0 if none is deliverable —
    /// callers must check `any_deliverable` first if "none" needs to be distinguished from
    /// interrupt 0, matching the contract that this is undefined when nothing is pending.
    pub fn next_deliverable(&self) -> u8 {
        let state = self.state.lock().expect("pic mutex poisoned");
        self.next_deliverable_locked(&state).unwrap_or(0)
    }

    fn next_deliverable_locked(&self, state: &State) -> Option<u8> {
        (0..INTERRUPTS_COUNT as u16).map(|i| i as u8).find(|&i| {
            state.pending.get(i) && !state.mask.get(i)
        })
    }

    /// Blocks the calling thread until `trigger` is called on any interrupt number. Used
    /// only by the CPU's `WFI` opcode.
    pub fn wait_for_interrupt(&self) {
        let state = self.state.lock().expect("pic mutex poisoned");
        let _unused = self
            .interrupt_arrived
            .wait_while(state, |s| self.next_deliverable_locked(s).is_none())
            .expect("pic mutex poisoned");
    }
}

/// Bus-mapped view over the mask bitset: the same storage `mask`/`unmask` operate on,
/// exposed as a 8-word read/write memory region so guest programs can program it directly.
pub struct MaskRegion {
    pic: Arc<Pic>,
}

impl MaskRegion {
    pub fn new(pic: Arc<Pic>) -> Self {
        Self { pic }
    }
}

impl AddressableRegion for MaskRegion {
    fn size_bytes(&self) -> u32 {
        INTERRUPTS_WORDS_COUNT * 4
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn set_mode(&mut self, _mode: AccessMode) {
        // the mask region is always guest-writable; there is no ROM-lock phase for it
    }

    fn read_word(&self, offset: u32) -> Result<u32, RegionError> {
        let index = word_index(offset, INTERRUPTS_WORDS_COUNT)?;
        let state = self.pic.state.lock().expect("pic mutex poisoned");
        Ok(state.mask.words[index])
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegionError> {
        let index = word_index(offset, INTERRUPTS_WORDS_COUNT)?;
        let mut state = self.pic.state.lock().expect("pic mutex poisoned");
        state.mask.words[index] = value;
        Ok(())
    }
}

/// Bus-mapped view over the interrupt descriptor table: 256 guest-writable handler
/// addresses, one per interrupt number.
pub struct IdtRegion {
    handlers: Vec<u32>,
}

impl IdtRegion {
    pub fn new() -> Self {
        Self {
            handlers: vec![0; INTERRUPTS_COUNT as usize],
        }
    }

    pub fn handler_for(&self, i: u8) -> u32 {
        self.handlers[i as usize]
    }
}

impl Default for IdtRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressableRegion for IdtRegion {
    fn size_bytes(&self) -> u32 {
        INTERRUPTS_COUNT * 4
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn set_mode(&mut self, _mode: AccessMode) {}

    fn read_word(&self, offset: u32) -> Result<u32, RegionError> {
        let index = word_index(offset, INTERRUPTS_COUNT)?;
        Ok(self.handlers[index])
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegionError> {
        let index = word_index(offset, INTERRUPTS_COUNT)?;
        self.handlers[index] = value;
        Ok(())
    }
}

fn word_index(offset: u32, word_count: u32) -> Result<usize, RegionError> {
    if offset % 4 != 0 {
        return Err(RegionError::NotAligned);
    }
    let index = offset / 4;
    if index >= word_count {
        return Err(RegionError::OutOfBounds);
    }
    Ok(index as usize)
}
