//! CLI wiring for the `sttp-decode` binary, split into a library target
//! so integration tests can drive it through the public API instead of
//! spawning a subprocess (mirroring the teacher package's own `[lib]` +
//! `[[bin]]` split in a single crate).

mod lua_host;
mod opt;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use sttp::emit::{EmitConfig, Emitter};
use sttp::{ArchivePaths, Driver, DriverError, GateParam};

use lua_host::LuaScriptHost;

pub use opt::Opt;

/// Buffer size for both read handles, per the archive's sequential
/// access pattern.
const IO_BUFFER_BYTES: usize = 1024 * 1024;

/// Exit 2 for script-load and script-runtime failures, 1 for everything
/// else fatal, per the documented exit-code contract.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<sttp::ScriptError>().is_some() {
        return 2;
    }
    if matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::Emit(sttp::emit::EmitError::Script(_)))
    ) {
        return 2;
    }
    1
}

pub fn run(opt: Opt) -> Result<()> {
    let interpolate = !opt.nointerp;

    let primary = File::open(&opt.archive).with_context(|| format!("failed to open {}", opt.archive.display()))?;
    let look_ahead = File::open(&opt.archive).with_context(|| format!("failed to open {}", opt.archive.display()))?;
    let primary = BufReader::with_capacity(IO_BUFFER_BYTES, primary);
    let look_ahead = BufReader::with_capacity(IO_BUFFER_BYTES, look_ahead);

    let skip = parse_gate_param(opt.skip.as_deref())?;
    let interval = parse_gate_param(opt.interval.as_deref())?;
    let window = parse_gate_param(opt.window.as_deref())?;

    let raw = open_output(opt.raw.as_deref())?;
    let tcp_dump = open_output(opt.tcp_dump.as_deref())?;
    let data_dump = open_output(opt.data_dump.as_deref())?;
    let mixed_dump = open_output(opt.mixed_dump.as_deref())?;
    let line_dump = open_output(opt.line_dump.as_deref())?;

    let script: Option<Box<dyn sttp::ScriptHost>> = match opt.script.as_deref() {
        Some(path) => {
            let source = std::fs::read_to_string(path).with_context(|| format!("failed to read script {}", path.display()))?;
            let paths = archive_paths(&opt.archive)?;
            let host = LuaScriptHost::load(&source, paths, opt.format.clone(), opt.suppress_msec)?;
            Some(Box::new(host))
        }
        None => None,
    };

    let config = EmitConfig {
        headers: opt.headers,
        offset_column: opt.offset,
        one_byte_per_line: opt.dat_bpl,
        timestamp_format: opt.format.clone(),
        suppress_msec: opt.suppress_msec,
        interpolate,
        skip,
        interval,
        window,
        nwins: opt.nwins,
    };

    let mut emitter = Emitter::new(config, raw, tcp_dump, data_dump, mixed_dump, line_dump, script).context("failed to initialize output sinks")?;

    let mut driver = Driver::new(primary, look_ahead, interpolate).map_err(wrap_driver_error)?;
    driver.run(&mut emitter).map_err(wrap_driver_error)?;

    Ok(())
}

fn wrap_driver_error(err: DriverError) -> anyhow::Error {
    anyhow::Error::new(err)
}

fn parse_gate_param(s: Option<&str>) -> Result<Option<GateParam>> {
    match s {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| anyhow::anyhow!("invalid interval gate parameter: {}", s)),
    }
}

fn open_output(path: Option<&Path>) -> Result<Option<Box<dyn Write>>> {
    match path {
        None => Ok(None),
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to open {} for writing", path.display()))?;
            Ok(Some(Box::new(BufWriter::with_capacity(IO_BUFFER_BYTES, file)) as Box<dyn Write>))
        }
    }
}

fn archive_paths(archive: &Path) -> Result<ArchivePaths> {
    let absolute = std::fs::canonicalize(archive).with_context(|| format!("failed to resolve {}", archive.display()))?;
    let directory = absolute.parent().map(Path::to_path_buf).unwrap_or_else(|| absolute.clone());
    let stem = absolute.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = absolute.extension().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let cwd = std::env::current_dir().context("failed to read current working directory")?;
    Ok(ArchivePaths {
        absolute,
        directory,
        stem,
        extension,
        cwd,
    })
}
