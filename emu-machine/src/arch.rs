//! Fixed bus address map. Every constant below mirrors the layout of the source machine:
//! general RAM at the bottom of the address space, ROM pinned to the top 32 MiB, and the
//! device registers packed into the gap just under ROM, highest address first: video
//! buffers, video metadata, interrupt mask, interrupt descriptor table, keyboard.
//!
//! The keyboard addresses have no counterpart in the retrieved source (its own address
//! constants are referenced by name but never defined anywhere in the material this was
//! built from) and are placed here as the next contiguous block below the interrupt
//! descriptor table, following the same "pack downward from ROM" scheme as everything else.

use emu_pic::INTERRUPTS_COUNT;

pub const STACK_LENGTH: u32 = 1024;
pub const STACK_SIZE: u32 = STACK_LENGTH * emu_region::WORD_SIZE;
/// RAM on top of the fixed stack zone, not the combined total — the address map's
/// `User code / RAM` range runs `STACK_SIZE .. STACK_SIZE + ram_size`.
pub const DEFAULT_RAM_SIZE: u32 = 1024;
pub const DEFAULT_REGISTERS_COUNT: u8 = 32;

pub const ROM_SIZE: u32 = 32 * 1024 * 1024;
pub const ROM_ADDRESS: u32 = 0u32.wrapping_sub(ROM_SIZE);

pub const VIDEO_BUFFER_SIZE: u32 = emu_video::BUFFER_SIZE_BYTES;
pub const VIDEO_META_SIZE: u32 = emu_video::META_SIZE_BYTES;
pub const VIDEO_BUFFER_2_ADDRESS: u32 = ROM_ADDRESS - VIDEO_BUFFER_SIZE;
pub const VIDEO_BUFFER_1_ADDRESS: u32 = VIDEO_BUFFER_2_ADDRESS - VIDEO_BUFFER_SIZE;
pub const VIDEO_META_ADDRESS: u32 = VIDEO_BUFFER_1_ADDRESS - VIDEO_META_SIZE;

pub const INTERRUPTS_WORDS_COUNT: u32 = emu_pic::INTERRUPTS_WORDS_COUNT;
pub const INTERRUPT_MASK_ADDRESS: u32 = VIDEO_META_ADDRESS - (INTERRUPTS_WORDS_COUNT * 4);
pub const INTERRUPT_DESCRIPTOR_TABLE_ADDRESS: u32 =
    INTERRUPT_MASK_ADDRESS - (INTERRUPTS_COUNT * 4);

pub const KEYBOARD_IN_ADDRESS: u32 =
    INTERRUPT_DESCRIPTOR_TABLE_ADDRESS - emu_keyboard::KEYBOARD_IN_SIZE;
pub const KEYBOARD_OUT_ADDRESS: u32 = KEYBOARD_IN_ADDRESS - emu_keyboard::KEYBOARD_OUT_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_map_is_strictly_ascending_and_non_overlapping() {
        let regions: &[(u32, u32)] = &[
            (KEYBOARD_OUT_ADDRESS, emu_keyboard::KEYBOARD_OUT_SIZE),
            (KEYBOARD_IN_ADDRESS, emu_keyboard::KEYBOARD_IN_SIZE),
            (INTERRUPT_DESCRIPTOR_TABLE_ADDRESS, INTERRUPTS_COUNT * 4),
            (INTERRUPT_MASK_ADDRESS, INTERRUPTS_WORDS_COUNT * 4),
            (VIDEO_META_ADDRESS, VIDEO_META_SIZE),
            (VIDEO_BUFFER_1_ADDRESS, VIDEO_BUFFER_SIZE),
            (VIDEO_BUFFER_2_ADDRESS, VIDEO_BUFFER_SIZE),
            (ROM_ADDRESS, ROM_SIZE),
        ];
        for pair in regions.windows(2) {
            let (base, size) = pair[0];
            let (next_base, _) = pair[1];
            assert!(base + size <= next_base, "{base:#010x}+{size:#x} overlaps {next_base:#010x}");
        }
        assert!(STACK_SIZE + DEFAULT_RAM_SIZE < KEYBOARD_OUT_ADDRESS);
    }
}
