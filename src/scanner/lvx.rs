//! Reads Livox LVX binary recordings.
//!
//! An LVX file is a container of frames, each a run of ethernet-style point
//! packets. The reader honors both published versions of the container (V0
//! and V1), walks packets within frames, and emits only extended cartesian
//! points. A pause captures the frame buffer, the packet offset within it,
//! and the point offset within the packet, so a later scan resumes exactly
//! where the sink stopped, mid-packet if need be.

use super::{EthPacket, Flow, ScanCode, Sink, ETH_HEADER_LEN, EXTEND_CARTESIAN, EXTEND_RAW_POINT_LEN};
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const SIGNATURE: &[u8] = b"livox_tech";
const MAGIC: u32 = 0xAC0E_A767;

/// Bytes: 16 signature, 4 version, 4 magic.
const PUBLIC_HEADER_LEN: usize = 24;
/// Device info block length per container version.
const DEVICE_INFO_LEN_V1: u64 = 59;
const DEVICE_INFO_LEN_V0: u64 = 58;
/// Frame header length; V0 carries an extra packet-count word.
const FRAME_HEADER_LEN_V1: usize = 24;
const FRAME_HEADER_LEN_V0: usize = 32;

/// A scanner over an LVX recording.
#[derive(Debug)]
pub struct LvxScanner {
    path: PathBuf,
    file: Option<BufReader<File>>,
    version: u8,
    frame: Vec<u8>,
    frame_offset: usize,
    point_offset: usize,
    at_eof: bool,
}

impl LvxScanner {
    /// Creates a scanner for an LVX file; the file is opened by `init`.
    pub fn new<P: AsRef<Path>>(path: P) -> LvxScanner {
        LvxScanner {
            path: path.as_ref().to_path_buf(),
            file: None,
            version: 0,
            frame: Vec::new(),
            frame_offset: 0,
            point_offset: 0,
            at_eof: false,
        }
    }

    /// Opens the container and validates its headers.
    pub fn init(&mut self) -> Result<()> {
        if self.file.is_some() {
            debug!("lvx scanner for {} already initialized", self.path.display());
            return Ok(());
        }
        debug!("initializing lvx scanner for {}", self.path.display());
        self.open()
    }

    fn open(&mut self) -> Result<()> {
        let unavailable = |e: std::io::Error| {
            Error::SourceUnavailable(format!("{}: {e}", self.path.display()))
        };
        let file = File::open(&self.path).map_err(unavailable)?;
        let mut reader = BufReader::new(file);

        let mut public = [0u8; PUBLIC_HEADER_LEN];
        reader.read_exact(&mut public).map_err(unavailable)?;
        if &public[..SIGNATURE.len()] != SIGNATURE {
            return Err(Error::SourceUnavailable(format!(
                "{}: not an lvx file",
                self.path.display()
            )));
        }
        let version = public[16];
        let magic = u32::from_le_bytes([public[20], public[21], public[22], public[23]]);
        if magic != MAGIC {
            return Err(Error::SourceUnavailable(format!(
                "{}: bad magic code {magic:#x}",
                self.path.display()
            )));
        }

        // private header: V1 carries the frame duration ahead of the count
        let device_count = if version == 0 {
            reader.read_u8().map_err(unavailable)?
        } else {
            let _frame_duration = reader.read_u32::<LittleEndian>().map_err(unavailable)?;
            reader.read_u8().map_err(unavailable)?
        };
        let info_len = if version == 0 {
            DEVICE_INFO_LEN_V0
        } else {
            DEVICE_INFO_LEN_V1
        };
        reader
            .seek(SeekFrom::Current((u64::from(device_count) * info_len) as i64))
            .map_err(unavailable)?;

        debug!(
            "opened lvx v{version} container with {device_count} device(s)"
        );
        self.file = Some(reader);
        self.version = version;
        self.frame.clear();
        self.frame_offset = 0;
        self.point_offset = 0;
        self.at_eof = false;
        Ok(())
    }

    /// Streams points to the sink, frame by frame, packet by packet.
    pub fn scan(&mut self, sink: &mut Sink<'_>) -> Result<ScanCode> {
        if self.file.is_none() {
            self.open()?;
        }
        // fully drained on a previous scan: rewind by reopening
        if self.at_eof && self.frame.is_empty() {
            self.file = None;
            self.open()?;
        }

        loop {
            if self.frame_offset >= self.frame.len() {
                self.frame.clear();
                self.frame_offset = 0;
                self.point_offset = 0;
                if !self.read_frame()? {
                    debug!("lvx stream reached eof");
                    self.at_eof = true;
                    return Ok(ScanCode::Eof);
                }
                continue;
            }

            // packet = device index byte + ethernet packet
            let eth = EthPacket::parse(&self.frame[self.frame_offset + 1..]).ok_or_else(|| {
                Error::InvalidLvx("truncated packet header".to_string())
            })?;
            let payload_len = EthPacket::payload_len(eth.data_type)?;

            if eth.data_type == EXTEND_CARTESIAN {
                let data_start = self.frame_offset + 1 + ETH_HEADER_LEN;
                while self.point_offset < payload_len {
                    let record = data_start + self.point_offset;
                    let point = self
                        .frame
                        .get(record..record + EXTEND_RAW_POINT_LEN)
                        .and_then(|bytes| eth.extend_cartesian_point(bytes))
                        .ok_or_else(|| Error::InvalidLvx("truncated point record".to_string()))?;
                    self.point_offset += EXTEND_RAW_POINT_LEN;
                    if sink(point) == Flow::Pause {
                        return Ok(ScanCode::Paused);
                    }
                }
            }

            self.frame_offset += 1 + ETH_HEADER_LEN + payload_len;
            self.point_offset = 0;
        }
    }

    /// Releases the container.
    pub fn stop(&mut self) {
        debug!("closing lvx scanner for {}", self.path.display());
        self.file = None;
        self.frame.clear();
        self.frame_offset = 0;
        self.point_offset = 0;
        self.at_eof = false;
    }

    /// Loads the next frame's packet bytes. Returns false at end of file.
    fn read_frame(&mut self) -> Result<bool> {
        let header_len = if self.version == 0 {
            FRAME_HEADER_LEN_V0
        } else {
            FRAME_HEADER_LEN_V1
        };
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::Scan("lvx scanner has no open file".to_string()))?;

        let mut header = vec![0u8; header_len];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(Error::Scan(format!("lvx read failed: {e}"))),
        }
        let current = u64::from_le_bytes(header[..8].try_into().expect("8-byte slice"));
        let next = u64::from_le_bytes(header[8..16].try_into().expect("8-byte slice"));
        let data_len = next
            .checked_sub(current + header_len as u64)
            .ok_or_else(|| Error::InvalidLvx(format!("frame offsets go backwards: {current} -> {next}")))?;

        self.frame.resize(data_len as usize, 0);
        match file.read_exact(&mut self.frame) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                warn!("lvx file ends mid-frame, dropping the partial frame");
                self.frame.clear();
                Ok(false)
            }
            Err(e) => Err(Error::Scan(format!("lvx read failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Flow, ScanCode};
    use std::io::Write;

    /// Builds a minimal V1 container with one device and the given frames,
    /// each frame a list of (data_type, timestamp, points).
    fn container(frames: &[Vec<(u64, Vec<(i32, i32, i32, u8)>)>]) -> tempfile::NamedTempFile {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(SIGNATURE);
        bytes.extend_from_slice(&[0u8; 6]); // signature padding
        bytes.extend_from_slice(&[1, 0, 0, 0]); // version
        bytes.extend_from_slice(&MAGIC.to_le_bytes());
        bytes.extend_from_slice(&50u32.to_le_bytes()); // frame duration
        bytes.push(1); // device count
        bytes.extend_from_slice(&[0u8; DEVICE_INFO_LEN_V1 as usize]);

        let mut offset = bytes.len() as u64;
        for (index, frame) in frames.iter().enumerate() {
            let mut data = Vec::new();
            for (timestamp, points) in frame {
                data.push(0); // device index
                data.push(5); // packet protocol version
                data.extend_from_slice(&[1, 1, 0]); // slot, lidar index, rsvd
                data.extend_from_slice(&0u32.to_le_bytes()); // error code
                data.push(0); // timestamp type
                data.push(EXTEND_CARTESIAN);
                data.extend_from_slice(&timestamp.to_le_bytes());
                let payload_len = EthPacket::payload_len(EXTEND_CARTESIAN).unwrap();
                let mut payload = Vec::with_capacity(payload_len);
                for &(x, y, z, reflectivity) in points {
                    payload.extend_from_slice(&x.to_le_bytes());
                    payload.extend_from_slice(&y.to_le_bytes());
                    payload.extend_from_slice(&z.to_le_bytes());
                    payload.push(reflectivity);
                    payload.push(0); // tag
                }
                payload.resize(payload_len, 0);
                data.extend_from_slice(&payload);
            }
            let next = offset + FRAME_HEADER_LEN_V1 as u64 + data.len() as u64;
            bytes.extend_from_slice(&offset.to_le_bytes());
            bytes.extend_from_slice(&next.to_le_bytes());
            bytes.extend_from_slice(&(index as u64).to_le_bytes());
            bytes.extend_from_slice(&data);
            offset = next;
        }

        let mut file = tempfile::Builder::new().suffix(".lvx").tempfile().unwrap();
        file.write_all(&bytes).unwrap();
        file
    }

    #[test]
    fn reads_a_full_packet_of_points() {
        let file = container(&[vec![(42, vec![(1, 2, 3, 9), (4, 5, 6, 9)])]]);
        let mut scanner = LvxScanner::new(file.path());
        scanner.init().unwrap();
        let mut points = Vec::new();
        let code = scanner
            .scan(&mut |p| {
                points.push(p);
                Flow::Continue
            })
            .unwrap();
        assert_eq!(ScanCode::Eof, code);
        // the packet is padded to its full 96-point payload
        assert_eq!(96, points.len());
        assert_eq!(1., points[0].x);
        assert_eq!(42, points[0].timestamp.as_nanos());
        assert_eq!(9, points[1].reflectivity);
        assert_eq!(6., points[1].z);
    }

    #[test]
    fn pause_resumes_mid_packet() {
        let file = container(&[vec![(42, vec![(1, 0, 0, 9), (2, 0, 0, 9), (3, 0, 0, 9)])]]);
        let mut scanner = LvxScanner::new(file.path());
        scanner.init().unwrap();
        let mut first = Vec::new();
        let code = scanner
            .scan(&mut |p| {
                first.push(p.x);
                if first.len() == 2 {
                    Flow::Pause
                } else {
                    Flow::Continue
                }
            })
            .unwrap();
        assert_eq!(ScanCode::Paused, code);
        assert_eq!(vec![1., 2.], first);

        let mut rest = Vec::new();
        scanner
            .scan(&mut |p| {
                rest.push(p.x);
                Flow::Continue
            })
            .unwrap();
        assert_eq!(94, rest.len());
        assert_eq!(3., rest[0]);
    }

    #[test]
    fn rewinds_after_eof() {
        let file = container(&[vec![(42, vec![(1, 0, 0, 9)])]]);
        let mut scanner = LvxScanner::new(file.path());
        scanner.init().unwrap();
        let mut count = 0;
        scanner
            .scan(&mut |_| {
                count += 1;
                Flow::Continue
            })
            .unwrap();
        assert_eq!(96, count);
        scanner
            .scan(&mut |_| {
                count += 1;
                Flow::Continue
            })
            .unwrap();
        assert_eq!(192, count);
    }

    #[test]
    fn multiple_frames_are_walked() {
        let file = container(&[
            vec![(1, vec![(1, 0, 0, 9)])],
            vec![(2, vec![(2, 0, 0, 9)])],
        ]);
        let mut scanner = LvxScanner::new(file.path());
        scanner.init().unwrap();
        let mut stamps = Vec::new();
        scanner
            .scan(&mut |p| {
                if !stamps.contains(&p.timestamp.as_nanos()) {
                    stamps.push(p.timestamp.as_nanos());
                }
                Flow::Continue
            })
            .unwrap();
        assert_eq!(vec![1, 2], stamps);
    }

    #[test]
    fn rejects_garbage() {
        let mut file = tempfile::Builder::new().suffix(".lvx").tempfile().unwrap();
        file.write_all(b"definitely not a point cloud").unwrap();
        let mut scanner = LvxScanner::new(file.path());
        assert!(matches!(scanner.init(), Err(Error::SourceUnavailable(_))));
    }
}
