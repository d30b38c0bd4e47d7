//! Evolution SAM Simulation Library
//!
//! This crate provides a simulated SAM module for testing client
//! functionality without physical hardware. The simulator speaks the same
//! line protocol as the real device, including its raw extended-ASCII
//! degree byte in temperature values.
//!
//! # Example
//!
//! ```rust
//! use evo_sim::VirtualSam;
//!
//! let mut sam = VirtualSam::new();
//! assert_eq!(sam.process_command("S1Z1FAN?"), b"S1Z1FAN:AUTO");
//!
//! // Writes are acknowledged and update device state
//! assert_eq!(sam.process_command("S1MODE!COOL"), b"S1MODE:ACK");
//! assert_eq!(sam.process_command("S1MODE?"), b"S1MODE:COOL");
//! ```

pub mod sam;

pub use sam::VirtualSam;
