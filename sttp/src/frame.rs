//! Byte-level framing: extracts one well-formed packet at a time from a
//! source, resynchronizing after corruption.

use std::io::{self, Read, Seek, SeekFrom};

use crate::checksum::validate_checksum;
use crate::tcp::Tcp;
use crate::ttdp::{Subpacket, Ttdp};

const SYNC: u8 = 0x82;
const TYPE_TCP: u8 = 0xA3;
const TYPE_TTDP: u8 = 0xA2;

/// A successfully framed and checksum-validated packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Tcp(Tcp),
    Ttdp(Ttdp),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("I/O error reading archive: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of attempting to read one packet body after a sync byte and
/// a recognized type byte.
enum BodyOutcome {
    Accepted(Frame),
    /// Checksum or header-field validation failed; the reader has
    /// already rewound and the caller should resume hunting.
    Rejected,
    /// End of stream was reached mid-packet.
    Eof,
}

/// Extracts packets from `inner`, one at a time, resynchronizing past
/// corrupted or malformed packets rather than failing.
///
/// `inner` must support relative backward seeks: resynchronization
/// rewinds to one byte past the start of a rejected packet.
pub struct FrameReader<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        FrameReader { inner, pos: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads the next well-formed packet, or `Ok(None)` at end of stream.
    ///
    /// Returns the packet's starting offset (the first byte after the
    /// `0x82` prefix) together with the decoded `Frame`.
    pub fn read_frame(&mut self) -> Result<Option<(u64, Frame)>, FrameError> {
        loop {
            let sync_byte = match self.read_byte()? {
                Some(b) => b,
                None => return Ok(None),
            };
            if sync_byte != SYNC {
                continue;
            }
            let start_offset = self.pos;
            let type_byte = match self.read_byte()? {
                Some(b) => b,
                None => return Ok(None),
            };
            let mut buf = vec![SYNC, type_byte];
            let outcome = match type_byte {
                TYPE_TCP => self.read_tcp_body(&mut buf)?,
                TYPE_TTDP => self.read_ttdp_body(&mut buf)?,
                // A sync byte immediately followed by an unrecognized
                // type isn't a "rejected packet" in the resync sense;
                // just keep hunting from here.
                _ => continue,
            };
            match outcome {
                BodyOutcome::Accepted(frame) => return Ok(Some((start_offset, frame))),
                BodyOutcome::Rejected => continue,
                BodyOutcome::Eof => return Ok(None),
            }
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, FrameError> {
        let mut b = [0u8; 1];
        match self.inner.read(&mut b)? {
            0 => Ok(None),
            _ => {
                self.pos += 1;
                Ok(Some(b[0]))
            }
        }
    }

    /// Reads `n` more bytes, appending them to `out`. Returns `Ok(true)`
    /// on success, `Ok(false)` on end of stream (partial or clean).
    fn fill(&mut self, out: &mut Vec<u8>, n: usize) -> Result<bool, FrameError> {
        let mut chunk = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut chunk[filled..])? {
                0 => return Ok(false),
                read => filled += read,
            }
        }
        self.pos += n as u64;
        out.extend_from_slice(&chunk);
        Ok(true)
    }

    /// Rewinds the underlying source so the next read starts one byte
    /// past the start of the rejected packet (`buf[0]`, the sync byte).
    fn resync(&mut self, buf: &[u8]) -> Result<(), FrameError> {
        let rewind = buf.len() as u64 - 1;
        self.inner.seek(SeekFrom::Current(-(rewind as i64)))?;
        self.pos -= rewind;
        Ok(())
    }

    fn read_tcp_body(&mut self, buf: &mut Vec<u8>) -> Result<BodyOutcome, FrameError> {
        // 10 payload bytes + 2 checksum bytes.
        if !self.fill(buf, 12)? {
            return Ok(BodyOutcome::Eof);
        }
        let payload = buf[2..12].to_vec();
        let checksum_region = &buf[2..buf.len() - 2];
        let (expect0, expect1) = (buf[buf.len() - 2], buf[buf.len() - 1]);
        if validate_checksum(checksum_region, expect0, expect1) {
            Ok(BodyOutcome::Accepted(Frame::Tcp(Tcp::parse(&payload))))
        } else {
            self.resync(buf)?;
            Ok(BodyOutcome::Rejected)
        }
    }

    fn read_ttdp_body(&mut self, buf: &mut Vec<u8>) -> Result<BodyOutcome, FrameError> {
        if !self.fill(buf, 4)? {
            return Ok(BodyOutcome::Eof);
        }
        let runtime_sec = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
        let mut subpackets = Vec::new();
        loop {
            if !self.fill(buf, 2)? {
                return Ok(BodyOutcome::Eof);
            }
            let word = u16::from_be_bytes([buf[buf.len() - 2], buf[buf.len() - 1]]);
            if word == 0xFFFF {
                if !self.fill(buf, 2)? {
                    return Ok(BodyOutcome::Eof);
                }
                let checksum_region = &buf[2..buf.len() - 2];
                let (expect0, expect1) = (buf[buf.len() - 2], buf[buf.len() - 1]);
                return if validate_checksum(checksum_region, expect0, expect1) {
                    Ok(BodyOutcome::Accepted(Frame::Ttdp(Ttdp {
                        runtime_sec,
                        subpackets,
                    })))
                } else {
                    self.resync(buf)?;
                    Ok(BodyOutcome::Rejected)
                };
            }
            let msec_offset = (word >> 7) * 2;
            let count = (word & 0x7F) as u8;
            if msec_offset > 999 || count == 0 {
                self.resync(buf)?;
                return Ok(BodyOutcome::Rejected);
            }
            let payload_start = buf.len();
            if !self.fill(buf, count as usize)? {
                return Ok(BodyOutcome::Eof);
            }
            subpackets.push(Subpacket {
                msec_offset,
                bytes: buf[payload_start..].to_vec(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tcp_packet(runtime_ms: u32, y: u16, mo: u16, d: u16, h: u16, mi: u16, s: u16, ms: u16) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&runtime_ms.to_be_bytes());
        let w1 = (y << 4) | (mo & 0x0F);
        body.extend_from_slice(&w1.to_be_bytes());
        let w2 = (d << 11) | ((h & 0x1F) << 6) | (mi & 0x3F);
        body.extend_from_slice(&w2.to_be_bytes());
        let w3 = (s << 10) | (ms & 0x3FF);
        body.extend_from_slice(&w3.to_be_bytes());
        let mut packet = vec![SYNC, TYPE_TCP];
        packet.extend_from_slice(&body);
        let (c0, c1) = crate::checksum::fletcher16(&body);
        packet.push(c0);
        packet.push(c1);
        packet
    }

    fn ttdp_packet(runtime_sec: u32, subpackets: &[(u16, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&runtime_sec.to_be_bytes());
        for (msec_offset, bytes) in subpackets {
            let word = ((msec_offset / 2) << 7) | (bytes.len() as u16 & 0x7F);
            body.extend_from_slice(&word.to_be_bytes());
            body.extend_from_slice(bytes);
        }
        body.extend_from_slice(&0xFFFFu16.to_be_bytes());
        let mut packet = vec![SYNC, TYPE_TTDP];
        packet.extend_from_slice(&body);
        let (c0, c1) = crate::checksum::fletcher16(&body);
        packet.push(c0);
        packet.push(c1);
        packet
    }

    #[test]
    fn reads_a_single_tcp_packet() {
        let packet = tcp_packet(1000, 2020, 1, 1, 0, 0, 1, 0);
        let mut reader = FrameReader::new(Cursor::new(packet));
        let (_offset, frame) = reader.read_frame().unwrap().unwrap();
        match frame {
            Frame::Tcp(tcp) => assert_eq!(tcp.runtime_ms, 1000),
            _ => panic!("expected TCP"),
        }
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn reads_a_ttdp_packet_with_multiple_subpackets() {
        let packet = ttdp_packet(2, &[(500, b"ABC"), (502, b"D")]);
        let mut reader = FrameReader::new(Cursor::new(packet));
        let (_offset, frame) = reader.read_frame().unwrap().unwrap();
        match frame {
            Frame::Ttdp(ttdp) => {
                assert_eq!(ttdp.runtime_sec, 2);
                assert_eq!(ttdp.subpackets.len(), 2);
                assert_eq!(ttdp.subpackets[0].bytes, b"ABC");
            }
            _ => panic!("expected TTDP"),
        }
    }

    #[test]
    fn skips_garbage_between_packets() {
        let mut stream = vec![0x00, 0xFF, 0x82, 0x01]; // garbage, plus a fake sync/type
        stream.extend_from_slice(&tcp_packet(1000, 2020, 1, 1, 0, 0, 1, 0));
        let mut reader = FrameReader::new(Cursor::new(stream));
        let (_offset, frame) = reader.read_frame().unwrap().unwrap();
        assert!(matches!(frame, Frame::Tcp(_)));
    }

    #[test]
    fn rejects_bad_checksum_and_resyncs_to_next_packet() {
        let mut corrupted = tcp_packet(1000, 2020, 1, 1, 0, 0, 1, 0);
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        let mut stream = corrupted;
        stream.extend_from_slice(&tcp_packet(2000, 2020, 1, 1, 0, 0, 2, 0));
        let mut reader = FrameReader::new(Cursor::new(stream));
        let (_offset, frame) = reader.read_frame().unwrap().unwrap();
        match frame {
            Frame::Tcp(tcp) => assert_eq!(tcp.runtime_ms, 2000),
            _ => panic!("expected second TCP"),
        }
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_subpacket_header_and_resyncs() {
        // A subpacket header with count == 0 is malformed.
        let mut body = vec![0u8; 4]; // runtime_sec
        body.extend_from_slice(&0u16.to_be_bytes()); // msec=0, count=0 -> malformed
        let mut stream = vec![SYNC, TYPE_TTDP];
        stream.extend_from_slice(&body);
        stream.extend_from_slice(&[0xAA, 0xBB]); // bogus trailing bytes, never checksum-validated
        stream.extend_from_slice(&tcp_packet(1000, 2020, 1, 1, 0, 0, 1, 0));
        let mut reader = FrameReader::new(Cursor::new(stream));
        let (_offset, frame) = reader.read_frame().unwrap().unwrap();
        assert!(matches!(frame, Frame::Tcp(_)));
    }

    #[test]
    fn truncated_stream_yields_no_packet() {
        let mut packet = tcp_packet(1000, 2020, 1, 1, 0, 0, 1, 0);
        packet.truncate(packet.len() - 3);
        let mut reader = FrameReader::new(Cursor::new(packet));
        assert!(reader.read_frame().unwrap().is_none());
    }
}
