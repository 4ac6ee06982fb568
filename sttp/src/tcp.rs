//! TCP (time-correlation packet) record and its two wire-adjacent
//! operations: parsing the payload and rendering the result as text.

use chrono::{NaiveDate, NaiveDateTime};

/// A time-correlation record: maps a free-running millisecond runtime
/// counter to wall-clock calendar fields.
///
/// `runtime_ms == 0` is the sentinel "no TCP yet" — see [`Tcp::is_sentinel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tcp {
    pub runtime_ms: u32,
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub msec: u16,
}

impl Tcp {
    /// The zero-sentinel meaning "no TCP has been observed yet".
    pub const SENTINEL: Tcp = Tcp {
        runtime_ms: 0,
        year: 0,
        month: 0,
        day: 0,
        hour: 0,
        minute: 0,
        second: 0,
        msec: 0,
    };

    pub fn is_sentinel(&self) -> bool {
        self.runtime_ms == 0
    }

    /// Parses the 10-byte A3 payload (the region after the 2-byte
    /// prefix, before the 2-byte checksum) into a `Tcp`.
    pub(crate) fn parse(payload: &[u8]) -> Tcp {
        debug_assert_eq!(payload.len(), 10);
        let runtime_ms = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let w1 = u16::from_be_bytes([payload[4], payload[5]]);
        let year = w1 >> 4;
        let month = w1 & 0x0F;
        let w2 = u16::from_be_bytes([payload[6], payload[7]]);
        let day = w2 >> 11;
        let hour = (w2 >> 6) & 0x1F;
        let minute = w2 & 0x3F;
        let w3 = u16::from_be_bytes([payload[8], payload[9]]);
        let second = w3 >> 10;
        let msec = w3 & 0x3FF;
        Tcp {
            runtime_ms,
            year,
            month,
            day,
            hour,
            minute,
            second,
            msec,
        }
    }

    /// This TCP's calendar fields (ignoring `msec`) as a naive UTC
    /// datetime, if they form a valid calendar date.
    pub fn calendar_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
    }
}

/// Renders `tcp` through a strftime-style format string, interpreted in
/// UTC, optionally followed by a three-digit zero-padded millisecond
/// field.
pub fn format_timestamp(tcp: &Tcp, fmt: &str, suppress_msec: bool) -> Result<String, FormatError> {
    let dt = tcp.calendar_datetime().ok_or(FormatError::InvalidCalendar)?;
    let mut rendered = dt.format(fmt).to_string();
    if rendered.is_empty() {
        return Err(FormatError::Empty);
    }
    if !suppress_msec {
        rendered.push_str(&format!("{:03}", tcp.msec));
    }
    Ok(rendered)
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("timestamp format string produced no output")]
    Empty,
    #[error("TCP calendar fields do not form a valid date")]
    InvalidCalendar,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_for(runtime_ms: u32, y: u16, mo: u16, d: u16, h: u16, mi: u16, s: u16, ms: u16) -> [u8; 10] {
        let mut p = [0u8; 10];
        p[0..4].copy_from_slice(&runtime_ms.to_be_bytes());
        let w1 = (y << 4) | (mo & 0x0F);
        p[4..6].copy_from_slice(&w1.to_be_bytes());
        let w2 = (d << 11) | ((h & 0x1F) << 6) | (mi & 0x3F);
        p[6..8].copy_from_slice(&w2.to_be_bytes());
        let w3 = (s << 10) | (ms & 0x3FF);
        p[8..10].copy_from_slice(&w3.to_be_bytes());
        p
    }

    #[test]
    fn parse_roundtrips_calendar_fields() {
        let payload = payload_for(1000, 2020, 1, 1, 0, 0, 1, 0);
        let tcp = Tcp::parse(&payload);
        assert_eq!(tcp.runtime_ms, 1000);
        assert_eq!((tcp.year, tcp.month, tcp.day), (2020, 1, 1));
        assert_eq!((tcp.hour, tcp.minute, tcp.second, tcp.msec), (0, 0, 1, 0));
    }

    #[test]
    fn sentinel_has_zero_runtime() {
        assert!(Tcp::SENTINEL.is_sentinel());
        let tcp = Tcp::parse(&payload_for(1, 2020, 1, 1, 0, 0, 0, 0));
        assert!(!tcp.is_sentinel());
    }

    #[test]
    fn format_appends_msec_unless_suppressed() {
        let tcp = Tcp::parse(&payload_for(1000, 2020, 1, 1, 0, 0, 2, 500));
        let rendered = format_timestamp(&tcp, "%Y %m %d %H %M %S ", false).unwrap();
        assert_eq!(rendered, "2020 01 01 00 00 02 500");
        let suppressed = format_timestamp(&tcp, "%Y %m %d %H %M %S ", true).unwrap();
        assert_eq!(suppressed, "2020 01 01 00 00 02 ");
    }

    #[test]
    fn format_rejects_invalid_calendar() {
        let tcp = Tcp::parse(&payload_for(1, 2020, 2, 30, 0, 0, 0, 0));
        assert!(matches!(
            format_timestamp(&tcp, "%Y", false),
            Err(FormatError::InvalidCalendar)
        ));
    }

    #[test]
    fn format_rejects_empty_output() {
        let tcp = Tcp::parse(&payload_for(1000, 2020, 1, 1, 0, 0, 0, 0));
        assert!(matches!(format_timestamp(&tcp, "", false), Err(FormatError::Empty)));
    }
}
