use cursive::{event::Key, Cursive};
use log::debug;
use std::env;
use std::io::Write;

use chip_8_vm::chip::{
    chip8::Chip8,
    cursive_display::Display,
    driver::{Driver, DriverError, Options},
};

/// Error type for errors that occur during parsing the command line arguments,
/// reading the program and running it.
enum Error {
    InvalidUsage(String),
    InvalidProgram(std::io::Error),
    Emulation(DriverError),
}

/// The conventional mapping of the left side of a QWERTY keyboard to the
/// hexadecimal keypad.
const KEYMAP: [(char, u8); 16] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xC),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xD),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xE),
    ('z', 0xA),
    ('x', 0x0),
    ('c', 0xB),
    ('v', 0xF),
];

/// Reads the program from the path given as first argument. An optional second
/// argument overrides the number of cycles per second.
fn options_from_args(args: &[String]) -> Result<(Vec<u8>, Options), Error> {
    let path = args.get(1).ok_or_else(|| {
        Error::InvalidUsage(format!(
            "{} <program> [cycles per second]",
            args.first().map(String::as_str).unwrap_or("emulator_text_ui")
        ))
    })?;

    let mut options = Options::default();
    if let Some(rate) = args.get(2) {
        options.cycles_per_second = rate.parse().map_err(|_| {
            Error::InvalidUsage(format!("Invalid number of cycles per second: {}", rate))
        })?;
    }

    let program = std::fs::read(path).map_err(Error::InvalidProgram)?;
    Ok((program, options))
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().collect();
    let (program, options) = options_from_args(&args)?;

    let mut siv = cursive::default();

    let cb_sink = siv.cb_sink().clone();
    let mut driver = Driver::new(Chip8::new(), program, options).on_frame(move |frame| {
        let display = Display::new(frame);
        let update = cb_sink.send(Box::new(move |s: &mut Cursive| {
            s.pop_layer();
            s.add_layer(display);
        }));
        if update.is_err() {
            debug!("UI is gone, dropping frame");
        }
    })
    .on_sound(|| {
        // BEL makes the terminal beep without disturbing the drawn screen.
        let mut stdout = std::io::stdout();
        if stdout.write_all(b"\x07").and_then(|_| stdout.flush()).is_err() {
            debug!("Could not ring the terminal bell");
        }
    });
    driver.start().map_err(Error::Emulation)?;

    let keypad = driver.keypad_handle();
    for (character, key) in KEYMAP.iter().copied() {
        let keypad = keypad.clone();
        siv.add_global_callback(character, move |_s| keypad.press(key));
    }

    // Key up events are not available in a terminal, so one key releases all of them.
    siv.add_global_callback(' ', move |_s| keypad.release_all());
    siv.add_global_callback(Key::Esc, |s| s.quit());

    siv.add_layer(Display::default());
    siv.run();

    let report = driver.stop().map_err(Error::Emulation)?;
    println!(
        "Executed {} cycles ({} overruns).",
        report.cycles, report.overruns
    );
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidUsage(message) => write!(f, "Usage: {}", message),
            Error::InvalidProgram(error) => write!(f, "Could not read the program: {}", error),
            Error::Emulation(error) => write!(f, "{}", error),
        }
    }
}
