use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};

use chip8_host::input::{self, Keymap};
use chip8_host::{runner, HostError, Options, SharedKeys};

#[derive(Parser, Debug)]
#[command(version, about = "Run a CHIP-8 program without a window")]
struct Args {
    /// Program image, loaded at 0x200
    rom: PathBuf,

    /// Font image of 80 bytes replacing the built-in one
    #[arg(long)]
    font: Option<PathBuf>,

    /// Instructions per second, 0 runs as fast as possible
    #[arg(long, default_value_t = runner::DEFAULT_IPS)]
    ips: u32,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Key held down for the whole run, can be repeated
    #[arg(long, value_parser = input::parse_key)]
    hold: Vec<u8>,

    /// Read `+K` / `-K` key events from stdin, `quit` or `esc` stops
    #[arg(long)]
    stdin_keys: bool,

    /// How `K` names a key in stdin events
    #[arg(long, value_enum, default_value_t = Keymap::Hex)]
    keymap: Keymap,

    /// Print the final frame to stdout
    #[arg(long)]
    dump_frame: bool,

    #[arg(long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
}

fn run(args: Args) -> Result<(), HostError> {
    let options = Options {
        rom: args.rom,
        font: args.font,
        ips: args.ips,
        max_cycles: args.cycles,
    };

    let keys = SharedKeys::new();
    args.hold.iter().for_each(|&key| keys.press(key));
    if args.stdin_keys {
        if let Err(err) = input::spawn_stdin_reader(keys.clone(), args.keymap) {
            error!("cannot read keys from stdin: {}", err);
        }
    }

    let mut chip = runner::prepare(&options, keys)?;
    let result = runner::run(&mut chip, &options);
    if args.dump_frame {
        print!("{}", chip.frame());
    }
    result.map(|_| ())
}

fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{:5}][{}] {}",
                record.level(),
                record.module_path().unwrap_or_else(|| record.target()),
                record.args()
            )
        })
        .try_init()
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_logging(args.log_level) {
        eprintln!("chip8: logger: {}", err);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("chip8: {}", err);
            ExitCode::FAILURE
        }
    }
}
