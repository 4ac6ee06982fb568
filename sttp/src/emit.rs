//! Emitter: fans out each TTDP's coalesced subpackets to whichever
//! sinks are active (raw, TCP, data, mixed, timestamped-line, script).

use std::io::{self, Write};

use crate::gate::{GateParam, IntervalGate};
use crate::interp::interpolate;
use crate::script::{ScriptError, ScriptHost};
use crate::tcp::{format_timestamp, FormatError, Tcp};
use crate::ttdp::Subpacket;

/// Formatting and interval-gate configuration for the emitter.
pub struct EmitConfig {
    pub headers: bool,
    pub offset_column: bool,
    pub one_byte_per_line: bool,
    pub timestamp_format: String,
    pub suppress_msec: bool,
    pub interpolate: bool,
    pub skip: Option<GateParam>,
    pub interval: Option<GateParam>,
    pub window: Option<GateParam>,
    pub nwins: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("I/O error writing output: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Fan-out for one TTDP's coalesced subpackets, plus TCP/mixed output on
/// each A3.
pub struct Emitter {
    config: EmitConfig,
    raw: Option<Box<dyn Write>>,
    tcp: Option<Box<dyn Write>>,
    data: Option<Box<dyn Write>>,
    mixed: Option<Box<dyn Write>>,
    line: Option<Box<dyn Write>>,
    script: Option<Box<dyn ScriptHost>>,

    gate: Option<IntervalGate>,
    stamp_on_next_content: bool,
    output_enabled: bool,
}

impl Emitter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EmitConfig,
        raw: Option<Box<dyn Write>>,
        mut tcp: Option<Box<dyn Write>>,
        mut data: Option<Box<dyn Write>>,
        mixed: Option<Box<dyn Write>>,
        line: Option<Box<dyn Write>>,
        script: Option<Box<dyn ScriptHost>>,
    ) -> Result<Self, EmitError> {
        if config.headers {
            if let Some(w) = tcp.as_mut() {
                writeln!(w, "{}", tcp_header(&config))?;
            }
            if let Some(w) = data.as_mut() {
                writeln!(w, "{}", data_header(&config))?;
            }
        }
        Ok(Emitter {
            config,
            raw,
            tcp,
            data,
            mixed,
            line,
            script,
            gate: None,
            stamp_on_next_content: true,
            output_enabled: true,
        })
    }

    /// Called once per A3. Writes the TCP/Mixed lines.
    ///
    /// The Interval Gate is *not* anchored here: its anchor must be the
    /// first interpolated wall-clock time (`first_tcp`, SPEC_FULL.md
    /// §3/§4.5), which only exists once a subpacket has actually been
    /// interpolated — see `on_subpacket`.
    pub fn on_tcp(&mut self, tcp: &Tcp, offset: u64) -> Result<(), EmitError> {
        let line = tcp_line(tcp, offset, &self.config);
        if let Some(w) = self.tcp.as_mut() {
            writeln!(w, "{}", line)?;
        }
        if let Some(w) = self.mixed.as_mut() {
            writeln!(w, "A3 {}", line)?;
        }
        Ok(())
    }

    /// Called once per logical (already-coalesced) subpacket.
    pub fn on_subpacket(
        &mut self,
        runtime_sec: u32,
        subpacket: &Subpacket,
        offset: u64,
        prev_tcp: &Tcp,
        next_tcp: Option<&Tcp>,
    ) -> Result<(), EmitError> {
        if let Some(w) = self.raw.as_mut() {
            w.write_all(&subpacket.bytes)?;
        }

        let data_lines = if self.config.one_byte_per_line {
            data_lines_bpl(runtime_sec, subpacket, offset, &self.config)
        } else {
            vec![data_line(runtime_sec, subpacket, offset, &self.config)]
        };
        for line in &data_lines {
            if let Some(w) = self.data.as_mut() {
                writeln!(w, "{}", line)?;
            }
            if let Some(w) = self.mixed.as_mut() {
                writeln!(w, "A2 {}", line)?;
            }
        }

        if !prev_tcp.is_sentinel() {
            let wallclock = interpolate(
                prev_tcp,
                next_tcp,
                runtime_sec,
                subpacket.msec_offset,
                self.config.interpolate,
            );
            // first_tcp: the first interpolated wall-clock time ever
            // produced, anchoring the Interval Gate (SPEC_FULL.md
            // §3/§4.5), not the raw TCP record seen in `on_tcp`.
            if self.gate.is_none() {
                self.gate = Some(IntervalGate::new(
                    self.config.skip,
                    self.config.interval,
                    self.config.window,
                    self.config.nwins,
                    wallclock,
                ));
            }
            if self.line.is_some() {
                self.stamp_into_line(&wallclock, &subpacket.bytes)?;
            }
            if let Some(script) = self.script.as_mut() {
                let runtime = runtime_sec as f64 + subpacket.msec_offset as f64 / 1000.0;
                let (format, suppress_msec) = script.current_format();
                let timestamp = format_timestamp(&wallclock, &format, suppress_msec)?;
                script.parse_data(runtime, &timestamp, &subpacket.bytes)?;
            }
        }

        Ok(())
    }

    fn stamp_into_line(&mut self, wallclock: &Tcp, bytes: &[u8]) -> Result<(), EmitError> {
        let gate = self.gate.as_mut().expect("first TCP must precede stamped content");
        for &byte in bytes {
            if byte == 0x0A || byte == 0x0D {
                self.stamp_on_next_content = true;
                if self.output_enabled {
                    if let Some(w) = self.line.as_mut() {
                        w.write_all(&[byte])?;
                    }
                }
                continue;
            }
            if self.stamp_on_next_content {
                let stamp = format_timestamp(wallclock, &self.config.timestamp_format, self.config.suppress_msec)?;
                self.output_enabled = gate.evaluate(wallclock);
                if self.output_enabled {
                    if let Some(w) = self.line.as_mut() {
                        write!(w, "{} ", stamp)?;
                    }
                }
                self.stamp_on_next_content = false;
            }
            if self.output_enabled {
                if let Some(w) = self.line.as_mut() {
                    w.write_all(&[byte])?;
                }
            }
        }
        Ok(())
    }
}

fn tcp_header(config: &EmitConfig) -> String {
    if config.offset_column {
        "RunTime Offset Year Month Day Hour Min Sec.Msec".to_string()
    } else {
        "RunTime Year Month Day Hour Min Sec.Msec".to_string()
    }
}

fn data_header(config: &EmitConfig) -> String {
    let cols = if config.one_byte_per_line { "Byte" } else { "Count Data" };
    if config.offset_column {
        format!("RunTime Offset {}", cols)
    } else {
        format!("RunTime {}", cols)
    }
}

fn tcp_line(tcp: &Tcp, offset: u64, config: &EmitConfig) -> String {
    let offset_col = offset_column(config, offset);
    format!(
        "{}{} {:04} {:02} {:02} {:02} {:02} {:02}.{:03}",
        tcp.runtime_ms, offset_col, tcp.year, tcp.month, tcp.day, tcp.hour, tcp.minute, tcp.second, tcp.msec
    )
}

fn offset_column(config: &EmitConfig, offset: u64) -> String {
    if config.offset_column {
        format!(" {}", offset)
    } else {
        String::new()
    }
}

fn data_runtime(runtime_sec: u32, msec_offset: u16) -> String {
    format!("{}{:03}", runtime_sec, msec_offset)
}

fn data_line(runtime_sec: u32, subpacket: &Subpacket, offset: u64, config: &EmitConfig) -> String {
    let runtime = data_runtime(runtime_sec, subpacket.msec_offset);
    let offset_col = offset_column(config, offset);
    let hex: String = subpacket.bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!("{}{} {} {}", runtime, offset_col, subpacket.count(), hex)
}

fn data_lines_bpl(runtime_sec: u32, subpacket: &Subpacket, offset: u64, config: &EmitConfig) -> Vec<String> {
    let runtime = data_runtime(runtime_sec, subpacket.msec_offset);
    let offset_col = offset_column(config, offset);
    subpacket
        .bytes
        .iter()
        .map(|b| format!("{}{} {:02X}", runtime, offset_col, b))
        .collect()
}
