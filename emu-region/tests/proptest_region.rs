use emu_region::{AccessMode, Region, WORD_SIZE};
use proptest::prelude::*;

proptest! {
    #[test]
    fn read_after_write_round_trips(
        word_count in 1u32..64,
        value in any::<u32>(),
    ) {
        let size_bytes = word_count * WORD_SIZE;
        let mut region = Region::new(size_bytes, AccessMode::ReadWrite);
        for offset in (0..size_bytes).step_by(WORD_SIZE as usize) {
            region.write_word(offset, value).unwrap();
            prop_assert_eq!(region.read_word(offset), Ok(value));
        }
    }

    #[test]
    fn any_misaligned_offset_within_bounds_is_rejected(
        word_count in 1u32..64,
        byte_in_word in 1u32..WORD_SIZE,
    ) {
        let size_bytes = word_count * WORD_SIZE;
        let region = Region::new(size_bytes, AccessMode::ReadWrite);
        let offset = byte_in_word; // guaranteed in-range, not word-aligned
        prop_assert!(region.read_word(offset).is_err());
    }
}
