mod args;
mod snapshot;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use emu_cpu::Cpu;
use emu_machine::{Machine, VideoMode, VmConfig};
use snapshot::VmSnapshot;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    if cli.print_arch {
        print_arch();
        return Ok(());
    }

    let config = VmConfig {
        register_count: cli.registers,
        ram_size: cli.ram,
        timer_period: Duration::from_secs(1),
        video_mode: cli.video.into(),
    };
    let (machine, mut cpu) = Machine::new(&config).context("constructing machine")?;

    if let Some(rom_path) = &cli.rom {
        let rom_image = fs::read(rom_path)
            .with_context(|| format!("reading rom image {}", rom_path.display()))?;
        machine.load_rom_image(&rom_image).context("loading rom image")?;
    }

    let program_image = fs::read(&cli.image)
        .with_context(|| format!("reading program image {}", cli.image.display()))?;
    machine
        .load_program_image(&program_image)
        .context("loading program image")?;

    if let Some(pc) = cli.pc {
        cpu.set_pc(pc);
    }
    if let Some(spec) = &cli.register_values {
        for (register, value) in args::parse_register_values(spec)? {
            cpu.set_register(register, value);
        }
    }

    let cpu = run_to_completion(machine.video_mode(), machine.bus().clone(), machine.pic().clone(), machine.video().clone(), machine.keyboard().clone(), cpu);

    report(&cli, &cpu, &machine)?;

    if let Some(panic) = cpu.panic() {
        anyhow::bail!("cpu panicked: {panic}");
    }
    Ok(())
}

/// Drives the CPU to a stop, opening a display window first if the configured video mode
/// calls for one. Mirrors the source machine's three-way video lifecycle: in `None` mode
/// nothing but the CPU runs; in `Master` mode closing the window stops the CPU; in `Slave`
/// mode the CPU halting on its own closes the window.
fn run_to_completion(
    video_mode: VideoMode,
    bus: Arc<emu_bus::Bus>,
    pic: Arc<emu_pic::Pic>,
    video: Arc<emu_video::Video>,
    keyboard: Arc<emu_keyboard::Keyboard>,
    mut cpu: Cpu,
) -> Cpu {
    match video_mode {
        VideoMode::None => {
            cpu.run(&bus, &pic);
            cpu
        }
        VideoMode::Master => {
            let stop_requested = Arc::new(AtomicBool::new(false));
            let thread_stop = stop_requested.clone();
            let handle = std::thread::Builder::new()
                .name("emu-cpu".into())
                .spawn(move || {
                    cpu.start();
                    while cpu.is_running() && !thread_stop.load(Ordering::Relaxed) {
                        cpu.step(&bus, &pic);
                    }
                    cpu
                })
                .expect("failed to spawn cpu thread");

            emu_display::run(video, keyboard, emu_display::DisplayConfig::default(), |_handle| {});
            stop_requested.store(true, Ordering::Relaxed);
            handle.join().expect("cpu thread panicked")
        }
        VideoMode::Slave => {
            let (tx, rx) = mpsc::channel::<emu_display::DisplayHandle>();
            let handle = std::thread::Builder::new()
                .name("emu-cpu".into())
                .spawn(move || {
                    cpu.run(&bus, &pic);
                    if let Ok(display) = rx.recv() {
                        display.request_close();
                    }
                    cpu
                })
                .expect("failed to spawn cpu thread");

            emu_display::run(video, keyboard, emu_display::DisplayConfig::default(), move |display| {
                let _ = tx.send(display);
            });
            handle.join().expect("cpu thread panicked")
        }
    }
}

fn report(cli: &Cli, cpu: &Cpu, machine: &Machine) -> Result<()> {
    if cli.print_steps {
        println!("steps: {}", cpu.step_count());
    }
    if cli.print_dump {
        print_dump(cpu);
    }
    if cli.print_json {
        let snapshot = VmSnapshot::capture(cpu, machine);
        println!("{}", serde_json::to_string_pretty(&snapshot).context("serializing snapshot")?);
    }
    Ok(())
}

fn print_dump(cpu: &Cpu) {
    println!("pc={:#010x} sp={:#010x} cs={:#010x} bp={:#010x}", cpu.pc(), cpu.sp(), cpu.cs(), cpu.bp());
    println!(
        "zero={} negative={} interrupts_enabled={} steps={}",
        cpu.zero_flag(),
        cpu.negative_flag(),
        cpu.interrupts_enabled(),
        cpu.step_count()
    );
    for (i, value) in cpu.registers().iter().enumerate() {
        println!("r{i}={value:#010x}");
    }
}

fn print_arch() {
    use emu_machine as arch;
    println!("stack:                0x00000000 .. {:#010x}", arch::STACK_SIZE);
    println!(
        "ram:                  {:#010x} .. {:#010x}",
        arch::STACK_SIZE,
        arch::STACK_SIZE + arch::DEFAULT_RAM_SIZE
    );
    println!("keyboard out:         {:#010x}", arch::KEYBOARD_OUT_ADDRESS);
    println!("keyboard in:          {:#010x}", arch::KEYBOARD_IN_ADDRESS);
    println!("interrupt descriptor: {:#010x}", arch::INTERRUPT_DESCRIPTOR_TABLE_ADDRESS);
    println!("interrupt mask:       {:#010x}", arch::INTERRUPT_MASK_ADDRESS);
    println!("video meta:           {:#010x}", arch::VIDEO_META_ADDRESS);
    println!("video buffer 1:       {:#010x}", arch::VIDEO_BUFFER_1_ADDRESS);
    println!("video buffer 2:       {:#010x}", arch::VIDEO_BUFFER_2_ADDRESS);
    println!("rom:                  {:#010x} .. {:#010x}", arch::ROM_ADDRESS, u32::MAX);
}
