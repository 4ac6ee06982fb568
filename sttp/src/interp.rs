//! Time interpolation: reconstructs a wall-clock time for an arbitrary
//! point inside a TTDP by interpolating between the bracketing TCPs.

use chrono::{Datelike, NaiveDate, Timelike};

use crate::tcp::Tcp;

/// Converts `tcp`'s calendar fields (treated as UTC, no daylight saving)
/// to milliseconds since the Unix epoch, including its `msec` field.
///
/// Returns `0` if the calendar fields do not form a valid date; callers
/// only ever compare two `wallclock_ms` values against each other, so an
/// invalid TCP simply contributes no useful signal rather than a panic.
pub fn wallclock_ms(tcp: &Tcp) -> i64 {
    match tcp.calendar_datetime() {
        Some(dt) => dt.and_utc().timestamp_millis() + tcp.msec as i64,
        None => 0,
    }
}

/// `wallclock_ms(a) - wallclock_ms(b)`.
pub fn wallclock_diff_ms(a: &Tcp, b: &Tcp) -> i64 {
    wallclock_ms(a) - wallclock_ms(b)
}

/// Reconstructs the wall-clock time at runtime `runtime_sec * 1000 +
/// msec_offset`, bracketed by `prev` (required, non-sentinel) and an
/// optional `next`.
///
/// Falls back to the non-interpolated `dt = RT - prev.runtime_ms` path
/// when `interpolate` is false, `next` is absent or sentinel, `RT` falls
/// outside `[prev.runtime_ms, next.runtime_ms]`, or `next.runtime_ms <=
/// prev.runtime_ms` (the file-append/power-cycle case).
pub fn interpolate(prev: &Tcp, next: Option<&Tcp>, runtime_sec: u32, msec_offset: u16, interpolate: bool) -> Tcp {
    let rt = runtime_sec as i64 * 1000 + msec_offset as i64;

    let dt = match next {
        Some(next) if interpolate && !next.is_sentinel() && next.runtime_ms > prev.runtime_ms && rt >= prev.runtime_ms as i64 && rt <= next.runtime_ms as i64 => {
            let frac = (rt - prev.runtime_ms as i64) as f64 / (next.runtime_ms - prev.runtime_ms) as f64;
            let d_rtc_ms = wallclock_ms(next) - wallclock_ms(prev);
            (frac * d_rtc_ms as f64).floor() as i64
        }
        _ => rt - prev.runtime_ms as i64,
    };

    let mut dt_sec = dt.div_euclid(1000);
    let mut dt_msec = dt.rem_euclid(1000) + prev.msec as i64;
    if dt_msec > 999 {
        dt_msec -= 1000;
        dt_sec += 1;
    }

    let prev_date = prev
        .calendar_datetime()
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
    let epoch_sec = prev_date.and_utc().timestamp() + dt_sec;
    let result_date = chrono::DateTime::from_timestamp(epoch_sec, 0)
        .expect("epoch second in range")
        .naive_utc();

    Tcp {
        runtime_ms: rt.max(0) as u32,
        year: result_date.year().max(0) as u16,
        month: result_date.month() as u16,
        day: result_date.day() as u16,
        hour: result_date.hour() as u16,
        minute: result_date.minute() as u16,
        second: result_date.second() as u16,
        msec: dt_msec as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp(runtime_ms: u32, y: u16, mo: u16, d: u16, h: u16, mi: u16, s: u16, ms: u16) -> Tcp {
        Tcp {
            runtime_ms,
            year: y,
            month: mo,
            day: d,
            hour: h,
            minute: mi,
            second: s,
            msec: ms,
        }
    }

    #[test]
    fn identity_when_rt_equals_prev_runtime() {
        let prev = tcp(1000, 2020, 1, 1, 0, 0, 1, 7);
        let result = interpolate(&prev, None, 1, 0, false);
        assert_eq!((result.year, result.month, result.day), (2020, 1, 1));
        assert_eq!((result.hour, result.minute, result.second), (0, 0, 1));
        assert_eq!(result.msec, 7);
    }

    #[test]
    fn nointerp_matches_s1_scenario() {
        let prev = tcp(1000, 2020, 1, 1, 0, 0, 1, 0);
        let result = interpolate(&prev, None, 2, 500, false);
        assert_eq!((result.hour, result.minute, result.second), (0, 0, 2));
        assert_eq!(result.msec, 500);
    }

    #[test]
    fn interpolated_matches_s2_scenario() {
        let prev = tcp(1000, 2020, 1, 1, 0, 0, 1, 0);
        let next = tcp(3000, 2020, 1, 1, 0, 0, 3, 0);
        let result = interpolate(&prev, Some(&next), 2, 500, true);
        assert_eq!((result.hour, result.minute, result.second), (0, 0, 2));
        assert_eq!(result.msec, 500);
    }

    #[test]
    fn bracket_exit_falls_back_to_nointerp() {
        let prev = tcp(1000, 2020, 1, 1, 0, 0, 1, 0);
        let next = tcp(1500, 2020, 1, 1, 0, 0, 1, 500);
        // RT beyond next.runtime_ms: falls back to dt = RT - prev.runtime_ms.
        let interpolated = interpolate(&prev, Some(&next), 5, 0, true);
        let nointerp = interpolate(&prev, Some(&next), 5, 0, false);
        assert_eq!(interpolated, nointerp);
    }

    #[test]
    fn sentinel_next_falls_back_to_nointerp() {
        let prev = tcp(1000, 2020, 1, 1, 0, 0, 1, 0);
        let interp_with_sentinel = interpolate(&prev, Some(&Tcp::SENTINEL), 2, 0, true);
        let nointerp = interpolate(&prev, None, 2, 0, false);
        assert_eq!(interp_with_sentinel, nointerp);
    }

    #[test]
    fn monotonic_over_the_bracket() {
        let prev = tcp(1000, 2020, 1, 1, 0, 0, 1, 0);
        let next = tcp(3000, 2020, 1, 1, 0, 0, 5, 0);
        let mut last_ms = wallclock_ms(&interpolate(&prev, Some(&next), 1, 0, true));
        for runtime_ms in (1000..=3000).step_by(100) {
            let (sec, msec) = (runtime_ms / 1000, (runtime_ms % 1000) as u16);
            let sample = interpolate(&prev, Some(&next), sec, msec, true);
            let ms = wallclock_ms(&sample);
            assert!(ms >= last_ms);
            last_ms = ms;
        }
    }

    #[test]
    fn out_of_order_next_falls_back() {
        let prev = tcp(2000, 2020, 1, 1, 0, 0, 2, 0);
        let next = tcp(1000, 2020, 1, 1, 0, 0, 1, 0); // file-append/power-cycle case
        let result = interpolate(&prev, Some(&next), 2, 0, true);
        let nointerp = interpolate(&prev, Some(&next), 2, 0, false);
        assert_eq!(result, nointerp);
    }
}
