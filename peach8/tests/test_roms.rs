use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_utils::thread;

use peach8::{Context, FrameView, OpCode, Peach8};

macro_rules! schedule_for {
    ($scope:expr, $f:expr, $freq:expr, $timeout:expr) => {{
        let started = Instant::now();
        let period = Duration::from_nanos(1_000_000_000u64 / $freq);
        let mut previous = started;
        $scope.spawn(move |_| loop {
            let now = Instant::now();
            if now.duration_since(started) >= $timeout {
                break;
            }
            if now.duration_since(previous) >= period {
                $f();
                previous = now;
            }
        })
    }};
}

struct TestingContext {
    frame: String,
    shared_keys: Arc<Mutex<[bool; 16]>>,
    keys: [bool; 16],
    started: Instant,
}

impl TestingContext {
    fn new() -> Self {
        let mut frame = String::new();
        for _ in 0..32 {
            frame.push_str(&".".repeat(64));
            frame.push('\n');
        }
        Self {
            frame,
            shared_keys: Arc::new(Mutex::new([false; 16])),
            keys: [false; 16],
            started: Instant::now(),
        }
    }

    fn keys(&self) -> Arc<Mutex<[bool; 16]>> {
        Arc::clone(&self.shared_keys)
    }

    fn formatted(&self) -> &str {
        &self.frame
    }
}

impl Context for TestingContext {
    fn on_frame(&mut self, frame: FrameView<'_>) {
        self.frame = frame.to_string();
    }

    fn sound_on(&mut self) {}

    fn sound_off(&mut self) {}

    fn get_keys(&mut self) -> &[bool; 16] {
        self.keys = *self.shared_keys.lock().unwrap();
        &self.keys
    }

    fn gen_random(&mut self) -> u8 {
        0xA5
    }

    fn uptime(&mut self) -> Duration {
        self.started.elapsed()
    }
}

fn assemble(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

/// Next instruction is a jump to itself
fn is_halted<C: Context>(chip: &Peach8<C>) -> bool {
    let state = chip.state();
    state
        .read_word(state.pc)
        .map(|word| OpCode::from(word) == OpCode::_1NNN { nnn: state.pc })
        .unwrap_or(false)
}

/// Tick until the program jumps to itself
fn run_until_halt<C: Context>(chip: &mut Peach8<C>, max_cycles: usize) -> usize {
    for cycle in 0..max_cycles {
        match chip.tick() {
            Ok(()) if is_halted(chip) => return cycle,
            Ok(()) | Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(err)) => panic!("cycle {}: {}", cycle, err),
        }
    }
    panic!("program didn't halt in {} cycles", max_cycles);
}

#[test]
fn rom_self_jump_halts() {
    let _ = env_logger::builder().is_test(true).try_init();

    let rom = assemble(&[0x1200]);
    let mut chip = Peach8::load(TestingContext::new(), &rom).unwrap();
    let memory = chip.state().memory;

    for _ in 0..10_000 {
        chip.tick().unwrap();
        assert!(is_halted(&chip));
    }
    assert_eq!(chip.state().pc, 0x200);
    assert_eq!(chip.state().v, [0; 16]);
    assert_eq!(&chip.state().memory[..], &memory[..]);
}

#[test]
fn rom_bcd_of_255_drawn_with_font() {
    let _ = env_logger::builder().is_test(true).try_init();

    #[rustfmt::skip]
    let rom = assemble(&[
        0x60FF, // V0 = 255
        0xA300, // I = 0x300
        0xF033, // BCD of V0 at I
        0xF265, // V0..=V2 = digits
        0x6300, // V3 = 0
        0x6400, // V4 = 0
        0xF029, // I = glyph of V0
        0xD345, // draw at (V3, V4)
        0x6305, // V3 = 5
        0xF129, // I = glyph of V1
        0xD345,
        0x630A, // V3 = 10
        0xF229, // I = glyph of V2
        0xD345,
        0x121C, // halt
    ]);
    let mut chip = Peach8::load(TestingContext::new(), &rom).unwrap();
    run_until_halt(&mut chip, 100);

    assert_eq!(&chip.state().memory[0x300..0x303], &[2, 5, 5]);
    assert_eq!(&chip.state().v[..3], &[2, 5, 5]);
    assert_eq!(chip.state().v[0xF], 0);

    let expected: String = [
        "####.####.####",
        "...#.#....#...",
        "####.####.####",
        "#.......#....#",
        "####.####.####",
    ]
    .iter()
    .map(|row| format!("{:.<64}\n", row))
    .chain(std::iter::repeat(format!("{}\n", ".".repeat(64))).take(27))
    .collect();
    let lhs = chip.context().formatted();
    assert_eq!(lhs, expected, "\nlhs:\n{}\n\nrhs:\n{}", lhs, expected);
    assert_eq!(chip.frame().to_string(), expected);
}

#[test]
fn rom_delay_timer_runs_at_60hz() {
    let _ = env_logger::builder().is_test(true).try_init();

    #[rustfmt::skip]
    let rom = assemble(&[
        0x6005, // V0 = 5
        0xF015, // delay = V0
        0xF007, // V0 = delay
        0x3000, // skip if V0 == 0
        0x1204, // loop
        0x120A, // halt
    ]);
    let mut chip = Peach8::load(TestingContext::new(), &rom).unwrap();
    let started = Instant::now();
    run_until_halt(&mut chip, usize::MAX);
    let elapsed = started.elapsed();

    assert_eq!(chip.state().delay_timer.load(), 0);
    assert!(elapsed >= Duration::from_millis(80), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(1), "{:?}", elapsed);
}

#[test]
fn rom_waits_for_key_from_other_thread() {
    let _ = env_logger::builder().is_test(true).try_init();

    #[rustfmt::skip]
    let rom = assemble(&[
        0xF50A, // V5 = key
        0x6601, // V6 = 1
        0x1204, // halt
    ]);
    let context = TestingContext::new();
    let keys = context.keys();
    let chip = Arc::new(Mutex::new(Peach8::load(context, &rom).unwrap()));
    let chip_tick = Arc::clone(&chip);
    let chip_wait = Arc::clone(&chip);

    thread::scope(|s| {
        schedule_for!(
            s,
            || {
                if let Err(nb::Error::Other(err)) = chip_tick.lock().unwrap().tick() {
                    panic!("{}", err);
                }
            },
            500,
            Duration::from_millis(300)
        );
        s.spawn(move |_| {
            std::thread::sleep(Duration::from_millis(50));
            assert!(chip_wait.lock().unwrap().is_waiting_for_key());
            keys.lock().unwrap()[0xA] = true;
        });
    })
    .unwrap();

    let chip = chip.lock().unwrap();
    assert_eq!(chip.state().v[5], 0xA);
    assert_eq!(chip.state().v[6], 1);
    assert!(is_halted(&*chip));
}
