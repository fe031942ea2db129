/// Latched state of the 4x4 hexadecimal keyboard
///
/// Refreshed from `Context::get_keys` at the start of every cycle, so an
/// instruction always observes a consistent snapshot.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct Keypad([bool; 16]);

impl Keypad {
    pub fn new() -> Self {
        Self([false; 16])
    }

    pub(crate) fn latch(&mut self, keys: &[bool; 16]) {
        self.0 = *keys;
    }

    /// Only the low nibble of `key` is meaningful
    pub fn is_pressed(&self, key: u8) -> bool {
        self.0[(key & 0x0F) as usize]
    }

    /// Lowest key pressed now that was released in `previous`
    pub fn newly_pressed(&self, previous: &Keypad) -> Option<u8> {
        (0..16u8).find(|&key| self.is_pressed(key) && !previous.is_pressed(key))
    }
}
