//! Reading programs and fonts from disk.

use std::fs;
use std::path::Path;

use log::info;
use peach8::state::{FONT_LEN, MEMORY_SIZE, PROGRAM_ADDR};

use crate::error::LoadError;

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Raw program image, checked to fit between 0x200 and the end of memory
pub fn load_rom(path: &Path) -> Result<Vec<u8>, LoadError> {
    let rom = read(path)?;
    let invalid = |error| LoadError::Invalid {
        path: path.to_owned(),
        error,
    };
    if rom.is_empty() {
        return Err(invalid(peach8::Error::EmptyProgram));
    }
    if rom.len() > MEMORY_SIZE - PROGRAM_ADDR as usize {
        return Err(invalid(peach8::Error::ProgramTooLarge { len: rom.len() }));
    }
    info!("read {} bytes of program from {}", rom.len(), path.display());
    Ok(rom)
}

/// Raw font image, 16 glyphs of 5 bytes
pub fn load_font(path: &Path) -> Result<Vec<u8>, LoadError> {
    let font = read(path)?;
    if font.len() != FONT_LEN {
        return Err(LoadError::Invalid {
            path: path.to_owned(),
            error: peach8::Error::InvalidFont { len: font.len() },
        });
    }
    info!("read font from {}", path.display());
    Ok(font)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::path::PathBuf;

    /// File in the system temp dir, removed on drop
    pub(crate) struct TempFile(PathBuf);

    impl TempFile {
        pub(crate) fn new(name: &str, content: &[u8]) -> Self {
            let path = std::env::temp_dir().join(format!("chip8-{}-{}", std::process::id(), name));
            fs::write(&path, content).unwrap();
            Self(path)
        }

        pub(crate) fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn rom_is_read_verbatim() {
        let file = TempFile::new("verbatim.ch8", &[0x12, 0x00, 0xAB]);
        assert_eq!(load_rom(file.path()).unwrap(), vec![0x12, 0x00, 0xAB]);
    }

    #[test]
    fn missing_rom() {
        let path = std::env::temp_dir().join("chip8-does-not-exist.ch8");
        assert!(matches!(load_rom(&path), Err(LoadError::Io { .. })));
    }

    #[test]
    fn empty_rom() {
        let file = TempFile::new("empty.ch8", &[]);
        assert!(matches!(
            load_rom(file.path()),
            Err(LoadError::Invalid { error: peach8::Error::EmptyProgram, .. })
        ));
    }

    #[test]
    fn oversized_rom() {
        let file = TempFile::new("large.ch8", &[0u8; 3585]);
        assert!(matches!(
            load_rom(file.path()),
            Err(LoadError::Invalid { error: peach8::Error::ProgramTooLarge { len: 3585 }, .. })
        ));
        let file = TempFile::new("largest.ch8", &[0u8; 3584]);
        assert!(load_rom(file.path()).is_ok());
    }

    #[test]
    fn font_size_is_checked() {
        let file = TempFile::new("font.bin", &[0xF0; 80]);
        assert_eq!(load_font(file.path()).unwrap().len(), 80);

        let file = TempFile::new("short-font.bin", &[0xF0; 79]);
        assert!(matches!(
            load_font(file.path()),
            Err(LoadError::Invalid { error: peach8::Error::InvalidFont { len: 79 }, .. })
        ));
    }
}
