//! Middlebury `.flo` optical flow file format.
//!
//! Layout (little-endian, no padding):
//!
//! | offset | type          | content                               |
//! |--------|---------------|---------------------------------------|
//! | 0      | `f32`         | magic tag `202021.25` (`"PIEH"`)      |
//! | 4      | `i32`         | width                                 |
//! | 8      | `i32`         | height                                |
//! | 12     | `f32 * w*h*2` | row-major `(row, col, component)` data |

use crate::{Error, FlowField, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Magic tag at the start of every `.flo` file.
pub const FLO_MAGIC: f32 = 202021.25;

/// Size of the fixed header in bytes.
pub const FLO_HEADER_SIZE: u64 = 12;

/// Read a flow field from a `.flo` file.
///
/// The header is validated before any payload is read: a wrong magic tag
/// fails with `FlowFormat`, negative or unaddressable dimensions fail with
/// `InvalidShape`, and a payload shorter than the header promises fails with
/// `Load`.
pub fn read_flow_file<P: AsRef<Path>>(path: P) -> Result<FlowField> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::load(path, e))?;
    let file_len = file.metadata().map_err(|e| Error::load(path, e))?.len();
    let mut reader = BufReader::new(file);

    let (width, height) = read_header(&mut reader, path)?;

    let expected = (width as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(8))
        .and_then(|n| n.checked_add(FLO_HEADER_SIZE));
    match expected {
        Some(expected) if file_len >= expected => {}
        _ => {
            return Err(Error::load(
                path,
                format!(
                    "truncated payload: {}x{} flow needs {} bytes, file has {}",
                    width,
                    height,
                    expected.map_or_else(|| "more than u64::MAX".to_string(), |n| n.to_string()),
                    file_len
                ),
            ))
        }
    }

    read_payload(&mut reader, width, height).map_err(|e| Error::load(path, e))
}

/// Read a flow field from any byte stream in `.flo` layout.
///
/// The payload is read in chunks, so a header promising more data than the
/// stream holds fails with `Load` once the stream ends instead of reserving
/// the full size up front.
pub fn read_flow<R: Read>(reader: &mut R) -> Result<FlowField> {
    let (width, height) = read_header(reader, Path::new("<stream>"))?;
    read_payload(reader, width, height).map_err(|e| Error::load("<stream>", e))
}

/// Write a flow field to a `.flo` file.
pub fn write_flow_file<P: AsRef<Path>>(path: P, flow: &FlowField) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to create flow file '{}': {}", path.display(), e),
        ))
    })?;

    let mut writer = BufWriter::new(file);
    write_flow(&mut writer, flow)?;
    writer.flush()?;
    Ok(())
}

/// Write a flow field in `.flo` layout to any byte sink.
pub fn write_flow<W: Write>(writer: &mut W, flow: &FlowField) -> Result<()> {
    let (height, width) = flow.shape();
    let width = i32::try_from(width).map_err(|_| Error::InvalidShape {
        expected: "width that fits in i32".to_string(),
        got: width.to_string(),
    })?;
    let height = i32::try_from(height).map_err(|_| Error::InvalidShape {
        expected: "height that fits in i32".to_string(),
        got: height.to_string(),
    })?;

    writer.write_f32::<LittleEndian>(FLO_MAGIC)?;
    writer.write_i32::<LittleEndian>(width)?;
    writer.write_i32::<LittleEndian>(height)?;
    for value in flow.to_interleaved() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    Ok(())
}

/// Write an interleaved `(height, width, channels)` array as a `.flo` file.
///
/// Fails with `InvalidShape` unless `channels == 2`.
pub fn write_flow_array<P: AsRef<Path>>(
    path: P,
    height: usize,
    width: usize,
    channels: usize,
    data: &[f32],
) -> Result<()> {
    let flow = FlowField::from_interleaved(height, width, channels, data)?;
    write_flow_file(path, &flow)
}

fn read_header<R: Read>(reader: &mut R, path: &Path) -> Result<(usize, usize)> {
    let magic = reader
        .read_f32::<LittleEndian>()
        .map_err(|e| Error::load(path, e))?;
    if magic != FLO_MAGIC {
        return Err(Error::FlowFormat {
            path: path.display().to_string(),
            magic,
        });
    }

    let width = reader
        .read_i32::<LittleEndian>()
        .map_err(|e| Error::load(path, e))?;
    let height = reader
        .read_i32::<LittleEndian>()
        .map_err(|e| Error::load(path, e))?;
    if width < 0 || height < 0 {
        return Err(Error::InvalidShape {
            expected: "non-negative width and height".to_string(),
            got: format!("{}x{} in '{}'", width, height, path.display()),
        });
    }

    let (width, height) = (width as usize, height as usize);
    if payload_len(width, height).is_none() {
        return Err(Error::InvalidShape {
            expected: "width * height * 2 addressable in memory".to_string(),
            got: format!("{}x{} in '{}'", width, height, path.display()),
        });
    }

    Ok((width, height))
}

/// Number of `f32` values in a `width x height` payload.
fn payload_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(2)
}

/// Values decoded per read call.
const READ_CHUNK: usize = 1 << 16;

fn read_payload<R: Read>(reader: &mut R, width: usize, height: usize) -> std::io::Result<FlowField> {
    let len = payload_len(width, height).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "flow dimensions overflow")
    })?;

    let mut data = Vec::with_capacity(len.min(READ_CHUNK));
    let mut chunk = vec![0.0_f32; len.min(READ_CHUNK)];
    while data.len() < len {
        let n = (len - data.len()).min(READ_CHUNK);
        reader.read_f32_into::<LittleEndian>(&mut chunk[..n])?;
        data.extend_from_slice(&chunk[..n]);
    }

    FlowField::from_interleaved(height, width, 2, &data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}
