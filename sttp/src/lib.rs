//! A decoder for the SSR (solid-state recorder) time-tagged archive
//! protocol.
//!
//! An archive is a stream of framed packets of two kinds:
//!
//! - Time-Correlation Packets ([`Tcp`]), which map a free-running
//!   millisecond runtime counter to wall-clock date/time;
//! - Time-Tagged Data Packets ([`Ttdp`]), which carry arbitrary bytes
//!   stamped with that runtime counter.
//!
//! [`FrameReader`] extracts packets from any [`std::io::Read`] +
//! [`std::io::Seek`] source, resynchronizing after corruption and
//! validating the Fletcher-16 checksum on every packet. [`interpolate`]
//! reconstructs a wall-clock time for an arbitrary point inside a TTDP
//! by interpolating between the bracketing TCPs, compensating for drift
//! of the runtime counter. [`format_timestamp`] renders the result
//! through a user-chosen strftime format. [`IntervalGate`] gates
//! emission of timestamped lines by skip/interval/window parameters.
//!
//! This crate is deliberately silent about *where* bytes come from or
//! go to beyond `Read`/`Write`/`Seek`: file handling, CLI parsing, and
//! the embedded-script runtime live in the `sttp-decode` binary crate.

mod checksum;
mod driver;
mod frame;
mod gate;
mod interp;
mod script;
mod tcp;
mod ttdp;

pub mod emit;

pub use checksum::{fletcher16, validate_checksum};
pub use driver::{Driver, DriverError, LookAhead};
pub use frame::{Frame, FrameError, FrameReader};
pub use gate::{GateParam, GateParamParseError, IntervalGate, Unit};
pub use interp::{interpolate, wallclock_diff_ms, wallclock_ms};
pub use script::{ArchivePaths, ScriptError, ScriptHost};
pub use tcp::{format_timestamp, FormatError, Tcp};
pub use ttdp::{Subpacket, Ttdp};
