//! Interval Gate: stateful predicate that enables or disables emission
//! of timestamped lines, subsampled by skip/interval/window/nwins
//! parameters expressed in either seconds or lines.

use std::str::FromStr;

use crate::interp::wallclock_diff_ms;
use crate::tcp::Tcp;

/// The unit a gate parameter's magnitude is expressed in.
///
/// The source material encoded this as the sign of a single integer
/// (negative meaning "lines"); here it is a tagged pair instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
    Lines,
}

/// A single gate parameter: a magnitude in either seconds or lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateParam {
    pub unit: Unit,
    pub magnitude: u32,
}

impl GateParam {
    pub fn seconds(magnitude: u32) -> Self {
        GateParam {
            unit: Unit::Seconds,
            magnitude,
        }
    }

    pub fn lines(magnitude: u32) -> Self {
        GateParam {
            unit: Unit::Lines,
            magnitude,
        }
    }
}

/// Parses a CLI gate-parameter string: a bare integer for seconds, or
/// an integer followed by `L`/`l` for lines (e.g. `"10"`, `"10L"`).
impl FromStr for GateParam {
    type Err = GateParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(digits) = s.strip_suffix(['L', 'l']) {
            let magnitude = digits.parse().map_err(|_| GateParamParseError(s.to_string()))?;
            Ok(GateParam::lines(magnitude))
        } else {
            let magnitude = s.parse().map_err(|_| GateParamParseError(s.to_string()))?;
            Ok(GateParam::seconds(magnitude))
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid interval gate parameter {0:?}: expected an integer optionally suffixed with L")]
pub struct GateParamParseError(String);

/// Gates emission of timestamped lines by skip / interval / window /
/// nwins parameters, evaluated in that order on each candidate line.
#[derive(Debug, Clone)]
pub struct IntervalGate {
    skip: Option<GateParam>,
    interval: Option<GateParam>,
    window: Option<GateParam>,
    nwins: u32,

    lines_generated: u64,
    anchor: Tcp,
    current_interval_number: i64,
    current_interval_start_time_ms: i64,
    current_interval_start_lines: u64,
}

impl IntervalGate {
    pub fn new(skip: Option<GateParam>, interval: Option<GateParam>, window: Option<GateParam>, nwins: u32, anchor: Tcp) -> Self {
        IntervalGate {
            skip,
            interval,
            window,
            nwins,
            lines_generated: 0,
            anchor,
            // No interval has been entered yet; any k >= 0 is a transition.
            current_interval_number: -1,
            current_interval_start_time_ms: 0,
            current_interval_start_lines: 0,
        }
    }

    pub fn lines_generated(&self) -> u64 {
        self.lines_generated
    }

    /// Evaluates the gate for one candidate line, incrementing
    /// `lines_generated` exactly once regardless of the outcome.
    pub fn evaluate(&mut self, tcp: &Tcp) -> bool {
        self.lines_generated += 1;

        if let Some(skip) = self.skip {
            let satisfied = match skip.unit {
                Unit::Seconds => wallclock_diff_ms(tcp, &self.anchor) >= skip.magnitude as i64 * 1000,
                Unit::Lines => self.lines_generated >= skip.magnitude as u64,
            };
            if satisfied {
                self.anchor = *tcp;
                self.lines_generated = 0;
                self.skip = None;
            } else {
                return false;
            }
        }

        let interval_open = self.interval.map_or(true, |p| p.magnitude == 0);
        let window_open = self.window.map_or(true, |p| p.magnitude == 0);
        if interval_open || window_open {
            return true;
        }
        let interval = self.interval.expect("checked above");
        let window = self.window.expect("checked above");

        let elapsed_ms = wallclock_diff_ms(tcp, &self.anchor);
        let k = match interval.unit {
            Unit::Seconds => elapsed_ms / (interval.magnitude as i64 * 1000),
            Unit::Lines => (self.lines_generated / interval.magnitude as u64) as i64,
        };
        if k != self.current_interval_number {
            self.current_interval_number = k;
            self.current_interval_start_time_ms = match interval.unit {
                Unit::Seconds => k * interval.magnitude as i64 * 1000,
                Unit::Lines => elapsed_ms,
            };
            self.current_interval_start_lines = self.lines_generated;
        }

        if self.nwins > 0 && k >= self.nwins as i64 {
            return false;
        }

        match window.unit {
            Unit::Seconds => elapsed_ms - self.current_interval_start_time_ms <= window.magnitude as i64 * 1000,
            Unit::Lines => self.lines_generated - self.current_interval_start_lines < window.magnitude as u64,
        }
    }
}
