use core::fmt;

use bitvec::prelude::*;
#[cfg(feature = "embedded-graphics")]
use embedded_graphics::{image::ImageRaw, pixelcolor::BinaryColor};

use crate::error::Error;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

/// An opaque struct holding frame of Peach8 display
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

/// A shared view over a `Frame`
///
/// Has different accessors for the content of frames, which can be used independently
/// to fulfill the needs.
///
/// Each pixel is represented either by a corresponding bit being set, or by `true` value.
/// Internally, the data is stored in a form of concatenating rows from top to bottom of the frame.
/// Rows are represented as an individual bits of continuous memory, matching the state of pixels
/// from left to the right.
///
/// Formatting a view with `{}` draws it as text, `#` for lit pixels and `.` otherwise,
/// one line per row.
///
/// #Note:
/// Can return ImageRaw instance with `embedded_graphics` feature on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    /// View the raw memory of a frame
    pub fn as_raw(&self) -> &'a [u8] {
        self.0
    }

    /// Create an immutable copy of a frame
    pub fn copy_frame(self) -> Frame {
        Frame(*self.0)
    }

    /// Access frame's bits by indexes
    pub fn get_bit(&self, x: usize, y: usize) -> Option<bool> {
        self.iter_rows_as_bitslices()
            .nth(y)
            .and_then(|row| row.get(x).map(|bit| *bit))
    }

    /// Get iterator over rows in a form of a `BitSlice`s
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<u8, Msb0>> {
        self.0.chunks(WIDTH / 8).map(|row| row.view_bits::<Msb0>())
    }

    /// Number of lit pixels
    pub fn count_lit(&self) -> usize {
        self.0.view_bits::<Msb0>().count_ones()
    }

    /// Get `ImageRaw` structure from frame's data
    #[cfg(feature = "embedded-graphics")]
    pub fn as_raw_image(&self) -> ImageRaw<'a, BinaryColor> {
        ImageRaw::new(self.as_raw(), WIDTH as u32, HEIGHT as u32)
    }
}

impl<'a> fmt::Display for FrameView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows_as_bitslices() {
            for bit in row.iter().by_vals() {
                f.write_str(if bit { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    /// Get view over frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; MEM_LENGTH];
    }

    /// Flip pixel at (x, y) if `val` is set, return whether a lit pixel got cleared
    pub(crate) fn xor_bit(&mut self, x: usize, y: usize, val: bool) -> Result<bool, Error> {
        let mut bit = self
            .iter_rows_as_bitslices_mut()
            .nth(y)
            .and_then(|row| row.get_mut(x))
            .ok_or(Error::MemoryOutOfBounds {
                addr: (y * WIDTH + x) as u16,
                len: 1,
            })?;
        let previous = *bit;
        *bit ^= val;
        Ok(previous && val)
    }

    pub(crate) fn iter_rows_as_bitslices_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut BitSlice<u8, Msb0>> {
        self.0
            .chunks_mut(WIDTH / 8)
            .map(|row| row.view_bits_mut::<Msb0>())
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
