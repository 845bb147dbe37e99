//! This module contains utilities for testing code that talks to the satellite without a
//!  network. They are used for testing the ground station itself, but they are also exported
//!  for application testing, which is why they are part of the crate's regular
//!  (non-#[cfg(test)]) code.

pub mod channel;
