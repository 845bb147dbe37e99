//! Ground station client for a simulated satellite.
//!
//! The ground station sends requests (location, time, move) to the satellite over UDP and
//!  waits for the reply to each of them. UDP may drop requests as well as replies, so a request
//!  that is not answered within a timeout is sent again, up to a configured number of attempts.
//!  See [exchange::ReliableExchange] for the details.

pub mod channel;
pub mod config;
pub mod console;
pub mod exchange;
pub mod protocol;
pub mod util;
pub mod test_util;
