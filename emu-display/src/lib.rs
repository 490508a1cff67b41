//! Host window, renderer, and key event source for the video/keyboard devices. This is the
//! one part of the system with no counterpart in the original spec's scope: the source
//! machine drove MiniFB directly from the video device's own thread, but opening a window
//! and pumping its event loop is a host concern, not a guest-visible one, so it lives in
//! its own crate, behind `winit`'s `ApplicationHandler`.
//!
//! Each guest pixel is packed as `0xRRGGBBAA`; this crate is the only place that format is
//! ever unpacked, always via shifts so it never depends on the host's native byte order.

use emu_keyboard::Keyboard;
use emu_video::{Video, SCREEN_HEIGHT, SCREEN_SCALE, SCREEN_WIDTH};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use tracing::warn;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

pub struct DisplayConfig {
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { title: "synthetic-cpu".to_string() }
    }
}

/// A custom event the window's own event loop can be woken with from another thread.
/// `Close` is how a headless-driving thread (the CPU thread, when it halts on its own)
/// asks the window to close itself, mirroring the source machine's `video_stop` call from
/// its CPU thread in slave video mode.
enum DisplayCommand {
    Close,
}

/// A handle letting another thread close the window. Obtained through `run`'s `on_ready`
/// callback, which fires once the event loop (and its proxy) exist but before `run` starts
/// blocking.
pub struct DisplayHandle(EventLoopProxy<DisplayCommand>);

impl DisplayHandle {
    pub fn request_close(&self) {
        let _ = self.0.send_event(DisplayCommand::Close);
    }
}

/// Opens a window and runs the host render/input loop until it is closed. Blocks the
/// calling thread for the life of the window; callers run this on whichever thread owns
/// the platform event loop (usually the process's main thread). `on_ready` is called once,
/// synchronously, with a [`DisplayHandle`] before the blocking loop starts — the only way
/// to get a handle out, since the loop never returns one itself.
pub fn run(
    video: Arc<Video>,
    keyboard: Arc<Keyboard>,
    config: DisplayConfig,
    on_ready: impl FnOnce(DisplayHandle),
) {
    let event_loop = EventLoop::<DisplayCommand>::with_user_event()
        .build()
        .expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);
    on_ready(DisplayHandle(event_loop.create_proxy()));

    let mut app = DisplayApp {
        video,
        keyboard,
        config,
        window: None,
        pixels: None,
    };
    event_loop.run_app(&mut app).expect("event loop error");
}

struct DisplayApp {
    video: Arc<Video>,
    keyboard: Arc<Keyboard>,
    config: DisplayConfig,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
}

impl ApplicationHandler<DisplayCommand> for DisplayApp {
    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: DisplayCommand) {
        match event {
            DisplayCommand::Close => event_loop.exit(),
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title(self.config.title.clone())
                        .with_inner_size(LogicalSize::new(
                            SCREEN_WIDTH * SCREEN_SCALE,
                            SCREEN_HEIGHT * SCREEN_SCALE,
                        )),
                )
                .expect("failed to create window"),
        );

        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(SCREEN_WIDTH, SCREEN_HEIGHT, surface)
            .expect("failed to create pixel surface");

        self.window = Some(window);
        // SAFETY: the surface borrows `window`, which this struct also owns for as long as
        // `pixels` does, so the erased lifetime never outlives its referent.
        self.pixels = Some(unsafe { std::mem::transmute::<Pixels<'_>, Pixels<'static>>(pixels) });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(pixels) = &mut self.pixels {
                        if pixels.resize_surface(size.width, size.height).is_err() {
                            warn!("display: failed to resize surface");
                        }
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(scancode) = scancode_for(code) {
                        match event.state {
                            ElementState::Pressed => self.keyboard.key_pressed(scancode),
                            ElementState::Released => self.keyboard.key_released(scancode),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(pixels) = &mut self.pixels {
                    blit(&self.video.displayed_pixels(), pixels.frame_mut());
                    if pixels.render().is_err() {
                        event_loop.exit();
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            return;
        }
        self.video.on_vsync();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn blit(pixels_in: &[u32], frame: &mut [u8]) {
    for (pixel, out) in pixels_in.iter().zip(frame.chunks_exact_mut(4)) {
        out[0] = (pixel >> 24) as u8;
        out[1] = (pixel >> 16) as u8;
        out[2] = (pixel >> 8) as u8;
        out[3] = *pixel as u8;
    }
}

fn scancode_for(key: KeyCode) -> Option<u8> {
    use KeyCode::*;
    Some(match key {
        KeyA => 0x00, KeyB => 0x01, KeyC => 0x02, KeyD => 0x03, KeyE => 0x04,
        KeyF => 0x05, KeyG => 0x06, KeyH => 0x07, KeyI => 0x08, KeyJ => 0x09,
        KeyK => 0x0A, KeyL => 0x0B, KeyM => 0x0C, KeyN => 0x0D, KeyO => 0x0E,
        KeyP => 0x0F, KeyQ => 0x10, KeyR => 0x11, KeyS => 0x12, KeyT => 0x13,
        KeyU => 0x14, KeyV => 0x15, KeyW => 0x16, KeyX => 0x17, KeyY => 0x18, KeyZ => 0x19,

        Digit0 => 0x20, Digit1 => 0x21, Digit2 => 0x22, Digit3 => 0x23, Digit4 => 0x24,
        Digit5 => 0x25, Digit6 => 0x26, Digit7 => 0x27, Digit8 => 0x28, Digit9 => 0x29,

        ArrowUp => 0x30, ArrowDown => 0x31, ArrowLeft => 0x32, ArrowRight => 0x33,

        Enter => 0x40, Space => 0x41, Backspace => 0x42, Tab => 0x43, Escape => 0x44,
        ShiftLeft => 0x45, ShiftRight => 0x46, ControlLeft => 0x47, ControlRight => 0x48,
        AltLeft => 0x49, AltRight => 0x4A,

        F1 => 0x50, F2 => 0x51, F3 => 0x52, F4 => 0x53, F5 => 0x54, F6 => 0x55,
        F7 => 0x56, F8 => 0x57, F9 => 0x58, F10 => 0x59, F11 => 0x5A, F12 => 0x5B,

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_unpacks_rgba_in_declared_byte_order() {
        let pixels_in = [0x11223344u32];
        let mut frame = [0u8; 4];
        blit(&pixels_in, &mut frame);
        assert_eq!(frame, [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn every_mapped_scancode_is_unique() {
        use std::collections::HashSet;
        let all = [
            KeyCode::KeyA, KeyCode::Digit0, KeyCode::ArrowUp, KeyCode::Enter,
            KeyCode::ShiftLeft, KeyCode::F1, KeyCode::Escape,
        ];
        let codes: HashSet<u8> = all.iter().filter_map(|k| scancode_for(*k)).collect();
        assert_eq!(codes.len(), all.len());
    }
}
