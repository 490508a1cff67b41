//! Video device: two guest-writable pixel buffers and a one-word metadata register. Bit 0
//! of the metadata selects which buffer is currently displayed; bit 1 reports whether
//! video is enabled at all. A background worker watches the metadata word for buffer
//! flips; the host render loop (in `emu-display`) calls [`Video::on_vsync`] once per frame
//! and owns the actual window.

use emu_bus::WakeChannel;
use emu_pic::{Pic, VSYNC_INT};
use emu_region::{AccessMode, AddressableRegion, RegionError, WORD_SIZE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 200;
pub const SCREEN_SCALE: u32 = 4;
pub const TARGET_FPS: u32 = 30;

pub const BUFFER_PIXELS: u32 = SCREEN_WIDTH * SCREEN_HEIGHT;
pub const BUFFER_SIZE_BYTES: u32 = BUFFER_PIXELS * 4;
pub const META_SIZE_BYTES: u32 = WORD_SIZE;

const BIT_BUFFER: u32 = 1;
const BIT_ENABLED: u32 = 2;

struct Stats {
    frames: u64,
    buffer_switches: u64,
    window_start: Instant,
}

impl Stats {
    fn new() -> Self {
        Self { frames: 0, buffer_switches: 0, window_start: Instant::now() }
    }
}

/// Shared device state: the metadata word, two pixel buffers, and frame statistics.
pub struct Video {
    pic: Arc<Pic>,
    meta: Mutex<u32>,
    buffers: [Mutex<Vec<u32>>; 2],
    displayed: Mutex<usize>,
    enabled: bool,
    stats: Mutex<Stats>,
}

impl Video {
    pub fn new(pic: Arc<Pic>, enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            pic,
            meta: Mutex::new(BIT_ENABLED),
            buffers: [
                Mutex::new(vec![0; BUFFER_PIXELS as usize]),
                Mutex::new(vec![0; BUFFER_PIXELS as usize]),
            ],
            displayed: Mutex::new(0),
            enabled,
            stats: Mutex::new(Stats::new()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn meta_region(self: &Arc<Self>) -> VideoMetaRegion {
        VideoMetaRegion { video: self.clone() }
    }

    pub fn buffer_region(self: &Arc<Self>, index: usize) -> FrameBufferRegion {
        FrameBufferRegion { video: self.clone(), index }
    }

    /// Snapshot of the buffer currently selected for display, for the host render loop to
    /// blit without holding a lock across the draw call.
    pub fn displayed_pixels(&self) -> Vec<u32> {
        let index = *self.displayed.lock().expect("video mutex poisoned");
        self.buffers[index].lock().expect("video mutex poisoned").clone()
    }

    /// Called once per frame by the host render loop. Triggers VSYNC and rolls over the
    /// per-second frame/buffer-switch counters.
    pub fn on_vsync(&self) {
        self.pic.trigger(VSYNC_INT);

        let mut stats = self.stats.lock().expect("video mutex poisoned");
        stats.frames += 1;
        let elapsed = stats.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = stats.frames as f64 / elapsed.as_secs_f64();
            let switch_rate = stats.buffer_switches as f64 / elapsed.as_secs_f64();
            info!(fps, switch_rate, "video: frame stats");
            stats.frames = 0;
            stats.buffer_switches = 0;
            stats.window_start = Instant::now();
        }
    }
}

pub struct VideoMetaRegion {
    video: Arc<Video>,
}

impl AddressableRegion for VideoMetaRegion {
    fn size_bytes(&self) -> u32 {
        META_SIZE_BYTES
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn set_mode(&mut self, _mode: AccessMode) {}

    fn read_word(&self, offset: u32) -> Result<u32, RegionError> {
        require_offset_zero(offset)?;
        Ok(*self.video.meta.lock().expect("video mutex poisoned"))
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegionError> {
        require_offset_zero(offset)?;
        *self.video.meta.lock().expect("video mutex poisoned") = value;
        Ok(())
    }
}

pub struct FrameBufferRegion {
    video: Arc<Video>,
    index: usize,
}

impl AddressableRegion for FrameBufferRegion {
    fn size_bytes(&self) -> u32 {
        BUFFER_SIZE_BYTES
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadWrite
    }

    fn set_mode(&mut self, _mode: AccessMode) {}

    fn read_word(&self, offset: u32) -> Result<u32, RegionError> {
        let pixel = pixel_index(offset)?;
        let buffer = self.video.buffers[self.index].lock().expect("video mutex poisoned");
        buffer.get(pixel).copied().ok_or(RegionError::OutOfBounds)
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegionError> {
        let pixel = pixel_index(offset)?;
        let mut buffer = self.video.buffers[self.index].lock().expect("video mutex poisoned");
        let slot = buffer.get_mut(pixel).ok_or(RegionError::OutOfBounds)?;
        *slot = value;
        Ok(())
    }
}

fn pixel_index(offset: u32) -> Result<usize, RegionError> {
    if offset % WORD_SIZE != 0 {
        return Err(RegionError::NotAligned);
    }
    Ok((offset / WORD_SIZE) as usize)
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

/// Watches the metadata word for a displayed-buffer flip (bit 0 toggling) and updates
/// `Video::displayed` accordingly. Separate from VSYNC delivery, which the host render
/// loop drives directly.
pub struct VideoWorker {
    running: Arc<AtomicBool>,
    wake: Arc<WakeChannel>,
    handle: Option<JoinHandle<()>>,
}

impl VideoWorker {
    pub fn start(video: Arc<Video>, wake: Arc<WakeChannel>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let thread_wake = wake.clone();
        let handle = std::thread::Builder::new()
            .name("emu-video".into())
            .spawn(move || {
                let mut seen = thread_wake.current();
                let mut flags = *video.meta.lock().expect("video mutex poisoned");
                while thread_running.load(Ordering::Relaxed) {
                    seen = thread_wake.wait(seen);
                    if !thread_running.load(Ordering::Relaxed) {
                        break;
                    }
                    let new_flags = *video.meta.lock().expect("video mutex poisoned");
                    if (flags ^ new_flags) & BIT_BUFFER != 0 {
                        *video.displayed.lock().expect("video mutex poisoned") =
                            (new_flags & BIT_BUFFER) as usize;
                        video.stats.lock().expect("video mutex poisoned").buffer_switches += 1;
                        debug!(buffer = new_flags & BIT_BUFFER, "video: buffer switched");
                    }
                    flags = new_flags;
                }
            })
            .expect("failed to spawn video thread");

        Self { running, wake, handle: Some(handle) }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.wake.notify();
        if let Some(handle) = self.handle.take() {
            handle.join().expect("video thread panicked");
        }
    }
}

impl Drop for VideoWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_region_round_trips_a_pixel() {
        let pic = Pic::new();
        let video = Video::new(pic, true);
        let mut region = video.buffer_region(0);
        region.write_word(40, 0xFF00_00FF).unwrap();
        assert_eq!(region.read_word(40).unwrap(), 0xFF00_00FF);
    }

    #[test]
    fn on_vsync_triggers_the_vsync_interrupt() {
        let pic = Pic::new();
        let video = Video::new(pic.clone(), true);
        video.on_vsync();
        assert!(pic.any_deliverable());
        assert_eq!(pic.next_deliverable(), VSYNC_INT);
    }

    #[test]
    fn worker_switches_displayed_buffer_on_meta_bit_flip() {
        let pic = Pic::new();
        let video = Video::new(pic, true);
        let wake = WakeChannel::new();
        let mut worker = VideoWorker::start(video.clone(), wake.clone());

        {
            let mut meta_region = video.meta_region();
            meta_region.write_word(0, BIT_ENABLED | BIT_BUFFER).unwrap();
        }
        wake.notify();
        // give the worker a moment to observe the flip
        std::thread::sleep(Duration::from_millis(20));
        worker.stop();

        assert_eq!(*video.displayed.lock().unwrap(), 1);
    }
}
