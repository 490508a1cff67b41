//! Builds a complete machine: bus, PIC, CPU, and every device, attached at the addresses in
//! [`arch`], with device background threads started and torn down together.
//!
//! The CPU itself is handed back to the caller rather than kept inside [`Machine`]. Driving
//! it is the caller's job: call [`emu_cpu::Cpu::run`] directly on the calling thread for a
//! headless run, or move it into its own thread when a host display loop (which blocks its
//! own thread) needs to run alongside it. `Machine` owns everything that outlives any single
//! run: the bus, the PIC, and the devices' background threads.

pub mod arch;

pub use arch::*;

use emu_bus::{Bus, BusError, ZoneConflict};
use emu_cpu::{Cpu, CpuConfigError};
use emu_keyboard::Keyboard;
use emu_pic::{IdtRegion, MaskRegion, Pic, TIMER_INT};
use emu_region::{AccessMode, Region};
use emu_timer::Timer;
use emu_video::Video;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoMode {
    /// No window: `Video::is_enabled` is false and nothing drives VSYNC.
    #[default]
    None,
    /// A window is shown; the CPU halting on its own closes it.
    Slave,
    /// A window is shown; closing it stops the CPU.
    Master,
}

impl VideoMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, VideoMode::None)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VmConfig {
    pub register_count: u8,
    pub ram_size: u32,
    pub timer_period: Duration,
    pub video_mode: VideoMode,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            register_count: DEFAULT_REGISTERS_COUNT,
            ram_size: DEFAULT_RAM_SIZE,
            timer_period: Duration::from_secs(1),
            video_mode: VideoMode::None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    CpuConfig(#[from] CpuConfigError),
    #[error(transparent)]
    ZoneConflict(#[from] ZoneConflict),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("rom image of {0} bytes does not fit in the {ROM_SIZE}-byte rom zone")]
    RomImageTooLarge(usize),
    #[error("image length {0} is not a multiple of the word size")]
    ImageNotWordAligned(usize),
}

/// Everything that outlives a single CPU run: the bus, the PIC, the devices, and their
/// background threads. Dropping a `Machine` stops every device thread.
pub struct Machine {
    bus: Arc<Bus>,
    pic: Arc<Pic>,
    keyboard: Arc<Keyboard>,
    video: Arc<Video>,
    _keyboard_worker: emu_keyboard::KeyboardWorker,
    _video_worker: emu_video::VideoWorker,
    _timer: Timer,
    video_mode: VideoMode,
    ram_size: u32,
}

impl Machine {
    /// Builds the bus and every device at its fixed address, starts their background
    /// threads, and returns the machine alongside a freshly reset CPU ready to run.
    pub fn new(config: &VmConfig) -> Result<(Self, Cpu), MachineError> {
        let mut bus = Bus::new();

        bus.attach(0, Region::new(STACK_SIZE, AccessMode::ReadWrite), "stack")?;
        bus.attach(STACK_SIZE, Region::new(config.ram_size, AccessMode::ReadWrite), "ram")?;
        bus.attach(ROM_ADDRESS, Region::new(ROM_SIZE, AccessMode::ReadOnly), "rom")?;

        let pic = Pic::new();
        bus.attach(
            INTERRUPT_DESCRIPTOR_TABLE_ADDRESS,
            IdtRegion::new(),
            "idt",
        )?;
        bus.attach(INTERRUPT_MASK_ADDRESS, MaskRegion::new(pic.clone()), "pic-mask")?;

        let keyboard = Keyboard::new(pic.clone());
        bus.attach(KEYBOARD_OUT_ADDRESS, keyboard.out_region(), "keyboard-out")?;
        bus.attach(KEYBOARD_IN_ADDRESS, keyboard.in_region(), "keyboard-in")?;
        let keyboard_wake = emu_bus::WakeChannel::new();
        bus.subscribe(KEYBOARD_IN_ADDRESS, keyboard_wake.clone());

        let video = Video::new(pic.clone(), config.video_mode.is_enabled());
        bus.attach(VIDEO_META_ADDRESS, video.meta_region(), "video-meta")?;
        bus.attach(VIDEO_BUFFER_1_ADDRESS, video.buffer_region(0), "video-buffer-1")?;
        bus.attach(VIDEO_BUFFER_2_ADDRESS, video.buffer_region(1), "video-buffer-2")?;
        let video_wake = emu_bus::WakeChannel::new();
        bus.subscribe(VIDEO_META_ADDRESS, video_wake.clone());

        let bus = Arc::new(bus);
        let timer = Timer::start(pic.clone(), config.timer_period, TIMER_INT);
        let keyboard_worker = emu_keyboard::KeyboardWorker::start(keyboard_wake);
        let video_worker = emu_video::VideoWorker::start(video.clone(), video_wake);

        let cpu = Cpu::new(config.register_count, INTERRUPT_DESCRIPTOR_TABLE_ADDRESS)?;

        Ok((
            Self {
                bus,
                pic,
                keyboard,
                video,
                _keyboard_worker: keyboard_worker,
                _video_worker: video_worker,
                _timer: timer,
                video_mode: config.video_mode,
                ram_size: config.ram_size,
            },
            cpu,
        ))
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    pub fn pic(&self) -> &Arc<Pic> {
        &self.pic
    }

    pub fn keyboard(&self) -> &Arc<Keyboard> {
        &self.keyboard
    }

    pub fn video(&self) -> &Arc<Video> {
        &self.video
    }

    pub fn video_mode(&self) -> VideoMode {
        self.video_mode
    }

    /// Every word of the RAM zone (`STACK_SIZE .. STACK_SIZE + ram_size`), for
    /// diagnostics/snapshots — not read by anything in the emulator itself.
    pub fn ram_words(&self) -> Vec<u32> {
        (0..self.ram_size / 4)
            .map(|i| {
                self.bus
                    .read_word(STACK_SIZE + i * 4)
                    .expect("ram zone covers STACK_SIZE..STACK_SIZE+ram_size")
            })
            .collect()
    }

    /// Unlocks the rom zone, writes `image` as big-endian words starting at
    /// [`arch::ROM_ADDRESS`], and relocks it.
    pub fn load_rom_image(&self, image: &[u8]) -> Result<(), MachineError> {
        if image.len() as u32 > ROM_SIZE {
            return Err(MachineError::RomImageTooLarge(image.len()));
        }
        self.bus.set_zone_mode(ROM_ADDRESS, AccessMode::ReadWrite);
        let result = write_be_words(&self.bus, ROM_ADDRESS, image);
        self.bus.set_zone_mode(ROM_ADDRESS, AccessMode::ReadOnly);
        result
    }

    /// Writes `image` as big-endian words starting at [`arch::STACK_SIZE`], the guest
    /// program's entry point. Ram is already read-write, so no lock toggling is needed.
    pub fn load_program_image(&self, image: &[u8]) -> Result<(), MachineError> {
        write_be_words(&self.bus, STACK_SIZE, image)
    }
}

/// Writes `image` to `base` as a sequence of big-endian 32-bit words. A length that is not
/// a whole number of words is rejected rather than padded.
fn write_be_words(bus: &Bus, base: u32, image: &[u8]) -> Result<(), MachineError> {
    if image.len() % 4 != 0 {
        return Err(MachineError::ImageNotWordAligned(image.len()));
    }
    for (i, chunk) in image.chunks_exact(4).enumerate() {
        let word = u32::from_be_bytes(chunk.try_into().expect("chunks_exact(4) yields 4 bytes"));
        bus.write_word(base + (i as u32) * 4, word)?;
    }
    Ok(())
}
