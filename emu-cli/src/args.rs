use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Loads a program image into a fresh machine and runs it to completion.
#[derive(Parser, Debug)]
#[command(name = "emu-cli", version, about)]
pub struct Cli {
    /// Raw big-endian program image, loaded at the machine's entry point
    pub image: PathBuf,

    /// Number of general-purpose registers
    #[arg(short = 'r', long = "registers", default_value_t = emu_machine::DEFAULT_REGISTERS_COUNT)]
    pub registers: u8,

    /// Initial register values, e.g. "0:1,3:0xff"
    #[arg(long = "register-values")]
    pub register_values: Option<String>,

    /// RAM size in bytes
    #[arg(short = 'R', long = "ram", default_value_t = emu_machine::DEFAULT_RAM_SIZE)]
    pub ram: u32,

    /// Optional rom image, loaded at the top of the address space
    #[arg(short = 'M', long = "rom")]
    pub rom: Option<PathBuf>,

    /// Initial program counter, overriding the machine's reset value
    #[arg(long = "pc", value_parser = parse_address)]
    pub pc: Option<u32>,

    /// Whether to open a display window, and which side governs shutdown
    #[arg(long = "video", value_enum, default_value_t = VideoModeArg::None)]
    pub video: VideoModeArg,

    /// Print the fixed bus address map and exit
    #[arg(long = "print-arch")]
    pub print_arch: bool,

    /// Print a register/flag dump after the machine stops
    #[arg(long = "print-dump")]
    pub print_dump: bool,

    /// Print the executed instruction count after the machine stops
    #[arg(long = "print-steps")]
    pub print_steps: bool,

    /// Print a full machine snapshot as JSON after the machine stops
    #[arg(long = "print-json")]
    pub print_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VideoModeArg {
    None,
    Master,
    Slave,
}

impl From<VideoModeArg> for emu_machine::VideoMode {
    fn from(value: VideoModeArg) -> Self {
        match value {
            VideoModeArg::None => emu_machine::VideoMode::None,
            VideoModeArg::Master => emu_machine::VideoMode::Master,
            VideoModeArg::Slave => emu_machine::VideoMode::Slave,
        }
    }
}

/// Parses `0x`-prefixed hex or plain decimal.
fn parse_address(raw: &str) -> Result<u32, String> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        raw.parse::<u32>().map_err(|e| e.to_string())
    }
}

/// Parses "R:V,R:V,..." into `(register, value)` pairs, values accepting the same
/// `0x`-prefixed-or-decimal grammar as `--pc`.
pub fn parse_register_values(spec: &str) -> Result<Vec<(u8, u32)>> {
    spec.split(',')
        .map(|pair| {
            let (register, value) = pair
                .split_once(':')
                .with_context(|| format!("expected REGISTER:VALUE, got {pair:?}"))?;
            let register: u8 = register
                .trim()
                .parse()
                .with_context(|| format!("invalid register number in {pair:?}"))?;
            let value = parse_address(value.trim()).map_err(|e| anyhow::anyhow!(e))?;
            Ok((register, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex_register_values() {
        let parsed = parse_register_values("0:1,3:0xff").unwrap();
        assert_eq!(parsed, vec![(0, 1), (3, 0xff)]);
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_register_values("0-1").is_err());
    }

    #[test]
    fn video_mode_arg_maps_onto_machine_video_mode() {
        assert_eq!(emu_machine::VideoMode::from(VideoModeArg::Master), emu_machine::VideoMode::Master);
    }
}
