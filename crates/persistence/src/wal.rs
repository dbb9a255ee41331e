//! Event log file format.
//!
//! ```text
//! [LogHeader: 16 bytes][Frame][Frame][Frame]...
//!
//! LogHeader: magic "DRGL" | version u32 | reserved u64
//! Frame:     sequence u64 | payload_len u32 | crc64 u64 | payload
//! ```
//!
//! The checksum covers `sequence || payload_len || payload`. All integers are
//! little-endian.

use crate::error::{PersistenceError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc64fast::Digest;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub reserved: u64,
}

impl LogHeader {
    pub const SIZE: usize = 16;
    pub const MAGIC: [u8; 4] = *b"DRGL";
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            reserved: 0,
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.reserved)?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != Self::MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != Self::VERSION {
            return Err(PersistenceError::UnsupportedVersion(version));
        }
        let reserved = reader.read_u64::<LittleEndian>()?;

        Ok(Self { magic, version, reserved })
    }
}

impl Default for LogHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub sequence: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

impl FrameHeader {
    pub const SIZE: usize = 8 + 4 + 8; // 20 bytes
    /// Largest payload a frame may carry. Encoded events are far smaller.
    pub const MAX_PAYLOAD: u32 = 64 * 1024;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.sequence.to_le_bytes());
        buf[8..12].copy_from_slice(&self.payload_len.to_le_bytes());
        buf[12..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        let mut rdr = &buf[..];
        // Reading from a fixed-size slice cannot fail.
        let sequence = rdr.read_u64::<LittleEndian>().unwrap_or_default();
        let payload_len = rdr.read_u32::<LittleEndian>().unwrap_or_default();
        let checksum = rdr.read_u64::<LittleEndian>().unwrap_or_default();
        Self { sequence, payload_len, checksum }
    }
}

pub fn frame_checksum(sequence: u64, payload: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(&sequence.to_le_bytes());
    digest.write(&(payload.len() as u32).to_le_bytes());
    digest.write(payload);
    digest.sum64()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

/// Writes one frame. Returns the number of bytes written.
///
/// Does not flush or sync; durability is the caller's job.
pub fn append_frame<W: Write>(mut writer: W, sequence: u64, payload: &[u8]) -> Result<u64> {
    let payload_len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= FrameHeader::MAX_PAYLOAD)
        .ok_or_else(|| PersistenceError::InvalidFormat(format!("payload too large: {} bytes", payload.len())))?;

    let header = FrameHeader {
        sequence,
        payload_len,
        checksum: frame_checksum(sequence, payload),
    };

    writer.write_all(&header.to_bytes())?;
    writer.write_all(payload)?;
    Ok((FrameHeader::SIZE + payload.len()) as u64)
}

/// Iterates frames after the file header.
///
/// Clean EOF on a frame boundary ends the stream. A frame cut short yields
/// `TornTail` once and then ends the stream.
pub struct FrameReader<R: Read> {
    reader: R,
    offset: u64,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    /// Wraps a reader positioned just after the log header.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: LogHeader::SIZE as u64,
            done: false,
        }
    }

    /// Byte offset (from file start) of the next unread frame.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut buf = [0u8; FrameHeader::SIZE];
        let filled = read_fully(&mut self.reader, &mut buf)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < FrameHeader::SIZE {
            return Err(PersistenceError::TornTail { offset: self.offset });
        }

        let header = FrameHeader::from_bytes(&buf);
        // The length is not covered by a checksum until the payload is read.
        if header.payload_len > FrameHeader::MAX_PAYLOAD {
            return Err(PersistenceError::InvalidFormat(format!(
                "frame at offset {} claims {} payload bytes",
                self.offset, header.payload_len
            )));
        }
        let mut payload = vec![0u8; header.payload_len as usize];
        if read_fully(&mut self.reader, &mut payload)? < payload.len() {
            return Err(PersistenceError::TornTail { offset: self.offset });
        }

        let found = frame_checksum(header.sequence, &payload);
        if found != header.checksum {
            return Err(PersistenceError::ChecksumMismatch {
                sequence: header.sequence,
                expected: header.checksum,
                found,
            });
        }

        self.offset += (FrameHeader::SIZE + payload.len()) as u64;
        Ok(Some(Frame { header, payload }))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Like `read_exact`, but reports how much was read before EOF.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Opens a log file, validates its header and returns a frame iterator.
pub fn read_stream(path: impl AsRef<Path>) -> Result<FrameReader<BufReader<File>>> {
    let mut reader = BufReader::new(File::open(path)?);
    LogHeader::read_from(&mut reader)?;
    Ok(FrameReader::new(reader))
}

/// Summary of a full pass over a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of intact frames.
    pub frames: u64,
    /// Sequence the next appended frame must carry.
    pub next_sequence: u64,
    /// File length up to the end of the last intact frame.
    pub valid_len: u64,
    /// Whether an incomplete trailing frame was found after `valid_len`.
    pub torn_tail: bool,
}

/// Walks every frame, checking checksums and sequence continuity from 0.
///
/// An incomplete trailing frame is reported, not treated as an error.
/// Checksum failures and sequence gaps are errors.
pub fn scan(path: impl AsRef<Path>) -> Result<ScanReport> {
    let mut frames = read_stream(path)?;
    let mut report = ScanReport {
        frames: 0,
        next_sequence: 0,
        valid_len: LogHeader::SIZE as u64,
        torn_tail: false,
    };

    while let Some(item) = frames.next() {
        match item {
            Ok(frame) => {
                if frame.header.sequence != report.next_sequence {
                    return Err(PersistenceError::InvalidFormat(format!(
                        "sequence gap: expected {}, found {}",
                        report.next_sequence, frame.header.sequence
                    )));
                }
                report.frames += 1;
                report.next_sequence += 1;
                report.valid_len = frames.offset();
            }
            Err(e) if e.is_torn_tail() => {
                report.torn_tail = true;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::tempdir;

    fn write_log(path: &Path, payloads: &[&[u8]]) {
        let mut file = File::create(path).unwrap();
        LogHeader::new().write_to(&mut file).unwrap();
        for (seq, payload) in payloads.iter().enumerate() {
            append_frame(&mut file, seq as u64, payload).unwrap();
        }
        file.sync_all().unwrap();
    }

    #[test]
    fn test_frame_header_layout() {
        let header = FrameHeader {
            sequence: 9,
            payload_len: 11,
            checksum: frame_checksum(9, b"hello world"),
        };
        let bytes = header.to_bytes();
        assert_eq!(FrameHeader::from_bytes(&bytes), header);
    }

    #[test]
    fn test_scan_counts_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        write_log(&path, &[b"a", b"bb", b"ccc"]);

        let report = scan(&path).unwrap();
        assert_eq!(report.frames, 3);
        assert_eq!(report.next_sequence, 3);
        assert!(!report.torn_tail);
        assert_eq!(report.valid_len, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_torn_tail_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        write_log(&path, &[b"first", b"second"]);
        let intact = std::fs::metadata(&path).unwrap().len();

        // Half a frame header.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[2, 0, 0, 0, 0]).unwrap();

        let report = scan(&path).unwrap();
        assert_eq!(report.frames, 2);
        assert!(report.torn_tail);
        assert_eq!(report.valid_len, intact);
    }

    #[test]
    fn test_checksum_mismatch_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        write_log(&path, &[b"first", b"second"]);

        // Flip a payload byte of the first frame.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[LogHeader::SIZE + FrameHeader::SIZE] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let result = scan(&path);
        assert!(matches!(result, Err(PersistenceError::ChecksumMismatch { sequence: 0, .. })));
    }

    #[test]
    fn test_oversized_length_is_rejected_before_reading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        write_log(&path, &[b"first"]);

        // Corrupt the length field of the only frame.
        let mut bytes = std::fs::read(&path).unwrap();
        let len_at = LogHeader::SIZE + 8;
        bytes[len_at..len_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(scan(&path), Err(PersistenceError::InvalidFormat(_))));
    }

    #[test]
    fn test_append_refuses_oversized_payload() {
        let payload = vec![0u8; FrameHeader::MAX_PAYLOAD as usize + 1];
        let mut out = Vec::new();
        assert!(matches!(
            append_frame(&mut out, 0, &payload),
            Err(PersistenceError::InvalidFormat(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");
        std::fs::write(&path, b"NOPE\x01\0\0\0\0\0\0\0\0\0\0\0").unwrap();

        assert!(matches!(read_stream(&path), Err(PersistenceError::InvalidMagic)));
    }
}
