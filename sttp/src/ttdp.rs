//! TTDP (time-tagged data packet) record and subpacket coalescing.

/// One (msec_offset, count, bytes) triple inside a TTDP.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subpacket {
    /// Always even: the wire encodes `msec_offset / 2`.
    pub msec_offset: u16,
    pub bytes: Vec<u8>,
}

impl Subpacket {
    pub fn count(&self) -> usize {
        self.bytes.len()
    }
}

/// A time-tagged data packet: a whole-second runtime anchor plus an
/// ordered sequence of subpackets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ttdp {
    pub runtime_sec: u32,
    pub subpackets: Vec<Subpacket>,
}

impl Ttdp {
    /// Merges adjacent subpackets that share `msec_offset`, concatenating
    /// their bytes, as required before emission.
    pub fn coalesced(&self) -> Vec<Subpacket> {
        let mut out: Vec<Subpacket> = Vec::with_capacity(self.subpackets.len());
        for sp in &self.subpackets {
            if let Some(last) = out.last_mut() {
                if last.msec_offset == sp.msec_offset {
                    last.bytes.extend_from_slice(&sp.bytes);
                    continue;
                }
            }
            out.push(sp.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(msec_offset: u16, bytes: &[u8]) -> Subpacket {
        Subpacket {
            msec_offset,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn coalesces_adjacent_equal_offsets() {
        let ttdp = Ttdp {
            runtime_sec: 2,
            subpackets: vec![sp(500, b"AB"), sp(500, b"C"), sp(502, b"D")],
        };
        let merged = ttdp.coalesced();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].msec_offset, 500);
        assert_eq!(merged[0].bytes, b"ABC");
        assert_eq!(merged[0].count(), 3);
        assert_eq!(merged[1].msec_offset, 502);
    }

    #[test]
    fn non_adjacent_equal_offsets_are_not_merged() {
        let ttdp = Ttdp {
            runtime_sec: 2,
            subpackets: vec![sp(500, b"A"), sp(502, b"B"), sp(500, b"C")],
        };
        let merged = ttdp.coalesced();
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn single_subpacket_is_unchanged() {
        let ttdp = Ttdp {
            runtime_sec: 5,
            subpackets: vec![sp(250, b"AB")],
        };
        assert_eq!(ttdp.coalesced(), ttdp.subpackets);
    }
}
