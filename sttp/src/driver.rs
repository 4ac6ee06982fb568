//! Driver: reads packets sequentially from the primary cursor, tracks
//! the previous/next TCP pair via a look-ahead cursor, and dispatches
//! each TTDP through the [`Emitter`].

use std::io::{Read, Seek};

use crate::emit::{EmitError, Emitter};
use crate::frame::{Frame, FrameError, FrameReader};
use crate::tcp::Tcp;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("archive contains no TCP; interpolation requires at least one")]
    MissingFirstTcp,
}

/// An independent second [`FrameReader`] that advances through the
/// stream discarding everything but A3 packets, used to look one TCP
/// ahead of the primary cursor.
pub struct LookAhead<R> {
    reader: FrameReader<R>,
}

impl<R: Read + Seek> LookAhead<R> {
    pub fn new(inner: R) -> Self {
        LookAhead {
            reader: FrameReader::new(inner),
        }
    }

    /// Returns the next TCP in the stream, or the zero-sentinel if the
    /// stream is exhausted.
    pub fn next_tcp(&mut self) -> Result<Tcp, FrameError> {
        loop {
            match self.reader.read_frame()? {
                None => return Ok(Tcp::SENTINEL),
                Some((_, Frame::Tcp(tcp))) => return Ok(tcp),
                Some((_, Frame::Ttdp(_))) => continue,
            }
        }
    }
}

/// Drives a primary [`FrameReader`] plus a [`LookAhead`] cursor through
/// an `Emitter`.
pub struct Driver<R> {
    primary: FrameReader<R>,
    look_ahead: LookAhead<R>,
    prev_tcp: Tcp,
    next_tcp: Tcp,
    require_first_tcp: bool,
}

impl<R: Read + Seek> Driver<R> {
    /// `primary` and `look_ahead` must be independent read handles to
    /// the same archive. When `require_first_tcp` is set (interpolation
    /// is enabled), the look-ahead is primed immediately and it is
    /// fatal for the archive to contain no TCP at all.
    pub fn new(primary: R, look_ahead: R, require_first_tcp: bool) -> Result<Self, DriverError> {
        let mut look_ahead = LookAhead::new(look_ahead);
        let next_tcp = look_ahead.next_tcp()?;
        if require_first_tcp && next_tcp.is_sentinel() {
            return Err(DriverError::MissingFirstTcp);
        }
        Ok(Driver {
            primary: FrameReader::new(primary),
            look_ahead,
            prev_tcp: Tcp::SENTINEL,
            next_tcp,
            require_first_tcp,
        })
    }

    /// Runs the decode loop to completion, feeding every packet through
    /// `emitter`.
    pub fn run(&mut self, emitter: &mut Emitter) -> Result<(), DriverError> {
        loop {
            match self.primary.read_frame()? {
                None => return Ok(()),
                Some((offset, Frame::Tcp(tcp))) => {
                    self.prev_tcp = tcp;
                    emitter.on_tcp(&tcp, offset)?;
                    self.next_tcp = self.look_ahead.next_tcp()?;
                }
                Some((offset, Frame::Ttdp(ttdp))) => {
                    let mut sub_offset = offset;
                    for subpacket in ttdp.coalesced() {
                        let next = if self.next_tcp.is_sentinel() { None } else { Some(&self.next_tcp) };
                        emitter.on_subpacket(ttdp.runtime_sec, &subpacket, sub_offset, &self.prev_tcp, next)?;
                        sub_offset += subpacket.bytes.len() as u64;
                    }
                }
            }
        }
    }
}
