//! Logging for the driver.
//!
//! With the `defmt` feature the macros below forward to `defmt`. Without it
//! they compile to nothing, but still borrow their arguments so call sites
//! don't trip unused-variable lints.

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($s $(, $x)*);
        #[cfg(not(feature = "defmt"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($s $(, $x)*);
        #[cfg(not(feature = "defmt"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($s $(, $x)*);
        #[cfg(not(feature = "defmt"))]
        let _ = ($( & $x ),*);
    }};
}

/// Lets you format a string by providing your own buffer. Returns an error if the buffer is too small.
pub mod write_to {
    use core::cmp::min;
    use core::fmt;

    pub struct WriteTo<'a> {
        buffer: &'a mut [u8],
        // grows past `buffer.len()` once a write no longer fits
        used: usize,
    }

    impl<'a> WriteTo<'a> {
        pub fn new(buffer: &'a mut [u8]) -> Self {
            WriteTo { buffer, used: 0 }
        }

        /// Number of bytes the formatted output needs, even if it overflowed.
        pub fn len(&self) -> usize {
            self.used
        }

        pub fn is_empty(&self) -> bool {
            self.used == 0
        }

        pub fn as_str(self) -> Option<&'a str> {
            if self.used > self.buffer.len() {
                return None;
            }
            core::str::from_utf8(&self.buffer[..self.used]).ok()
        }
    }

    impl fmt::Write for WriteTo<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.used > self.buffer.len() {
                return Err(fmt::Error);
            }
            let remaining = &mut self.buffer[self.used..];
            let bytes = s.as_bytes();
            let count = min(bytes.len(), remaining.len());
            remaining[..count].copy_from_slice(&bytes[..count]);
            self.used += bytes.len();
            if count < bytes.len() {
                Err(fmt::Error)
            } else {
                Ok(())
            }
        }
    }

    pub fn show<'a>(buffer: &'a mut [u8], args: fmt::Arguments) -> Result<&'a str, fmt::Error> {
        let mut w = WriteTo::new(buffer);
        fmt::write(&mut w, args)?;
        w.as_str().ok_or(fmt::Error)
    }

}
