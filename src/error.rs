use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a file into something the machine accepts
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("{}: {error}", .path.display())]
    Invalid { path: PathBuf, error: peach8::Error },
}

/// Everything that stops the host before the program does
///
/// The message names the stage that failed, it is printed as the diagnostic
/// before a non-zero exit.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("rom load: {0}")]
    RomLoad(LoadError),
    #[error("font load: {0}")]
    FontLoad(LoadError),
    #[error("setup: {0}")]
    Setup(peach8::Error),
    #[error("execution: {0}")]
    Execution(peach8::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_stage() {
        let err = HostError::RomLoad(LoadError::Invalid {
            path: PathBuf::from("game.ch8"),
            error: peach8::Error::EmptyProgram,
        });
        assert_eq!(err.to_string(), "rom load: game.ch8: program is empty");

        let err = HostError::FontLoad(LoadError::Io {
            path: PathBuf::from("font.bin"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        });
        assert_eq!(err.to_string(), "font load: font.bin: not found");

        let err = HostError::Execution(peach8::Error::UnknownOpcode { raw: 0xFFFF, pc: 0x200 });
        assert_eq!(err.to_string(), "execution: unknown instruction 0xffff at 0x200");
    }
}
