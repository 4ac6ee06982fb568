//! Embedded-script bridge abstraction.
//!
//! The core crate does not depend on any particular scripting runtime.
//! `sttp-decode` supplies a concrete [`ScriptHost`] implementation
//! (backed by Lua) and hands it to the `Driver`/`Emitter`, which only
//! ever call [`ScriptHost::parse_data`].

use std::path::PathBuf;

/// Archive path information reported to a script on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePaths {
    pub absolute: PathBuf,
    pub directory: PathBuf,
    pub stem: String,
    pub extension: String,
    pub cwd: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to load script: {0}")]
    Load(String),
    #[error("script raised an error: {0}")]
    Runtime(String),
}

/// A pluggable byte-sink driven by an embedded script.
///
/// Implementations also expose, to the script itself, a way to change
/// the timestamp format and a way to read back the archive's path
/// information; those two operations are implementation details of the
/// binding (e.g. Lua globals) and are not called by this crate directly.
pub trait ScriptHost {
    /// Sets the timestamp format and millisecond-suppression flag the
    /// script has requested. Called by the host's own glue code in
    /// response to the script invoking its format-setting callable, not
    /// by the core decoder.
    fn configure_timestamp(&mut self, format: &str, suppress_msec: bool);

    /// Archive path information, as reported to the script on request.
    fn archive_paths(&self) -> &ArchivePaths;

    /// The format/suppress-msec pair currently in effect for this host,
    /// i.e. the CLI default unless the script has called its
    /// format-setting callable. The Emitter uses this (rather than its
    /// own configured format) to render the `timestamp_string` argument
    /// passed to `parse_data`.
    fn current_format(&self) -> (String, bool);

    /// Invokes the script's `ParseData(runtime_number, timestamp_string,
    /// data_bytes)` with one logical subpacket. Any error raised by the
    /// script is fatal.
    fn parse_data(&mut self, runtime: f64, timestamp: &str, data: &[u8]) -> Result<(), ScriptError>;
}
