/// Calculates the modulo 256 checksum used by PREVAC frames.
///
/// The sum is kept in a wider accumulator so the intermediate value never wraps;
/// only the final result is reduced to a byte.
pub struct Checksum {
    current: u32,
}

impl Checksum {
    /// Creates a new `Checksum` instance, initialized to 0.
    #[inline]
    pub fn new() -> Checksum {
        Checksum { current: 0 }
    }

    /// Adds a single byte to the sum.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.current += u32::from(byte);
    }

    /// Adds every byte of a slice to the sum.
    ///
    /// # Arguments
    ///
    /// * `data` - The byte slice to add into the current sum.
    #[inline]
    pub fn push_slice(&mut self, data: &[u8]) {
        for d in data {
            self.push(*d);
        }
    }

    /// Returns the calculated checksum value.
    #[inline]
    pub fn checksum(&self) -> u8 {
        (self.current % 256) as u8
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}
