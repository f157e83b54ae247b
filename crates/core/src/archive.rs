//! Chunked binary backup container for the training store.
//!
//! Layout:
//! - magic: `NTSNAP01`
//! - version: u32 LE
//! - chunks until EOF, each:
//!   - tag: `[u8; 4]`
//!   - len: u32 LE (bytes following, including the 4-byte uncompressed length)
//!   - uncompressed_len: u32 LE
//!   - LZ4-compressed payload bytes
//!
//! The `USRS` and `SESS` chunks hold the JSON arrays of the two collections.
//! Unknown tags are skipped so newer files still load.

use std::io::{self, Read, Write};

use crate::store::{SessionResult, Snapshot, User};

pub const MAGIC: &[u8; 8] = b"NTSNAP01";
pub const VERSION_V1: u32 = 1;
pub const VERSION_CURRENT: u32 = VERSION_V1;

const TAG_USERS: [u8; 4] = *b"USRS";
const TAG_SESSIONS: [u8; 4] = *b"SESS";

fn write_u32_le<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_exact<const N: usize, R: Read>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    Ok(u32::from_le_bytes(read_exact::<4, _>(r)?))
}

fn write_chunk_lz4<W: Write>(w: &mut W, tag: [u8; 4], payload: &[u8]) -> io::Result<()> {
    let compressed = lz4_flex::compress(payload);
    let total_len = 4u32.saturating_add(
        u32::try_from(compressed.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "chunk too large"))?,
    );

    w.write_all(&tag)?;
    write_u32_le(w, total_len)?;
    write_u32_le(w, payload.len() as u32)?;
    w.write_all(&compressed)
}

fn read_chunk_lz4<R: Read>(r: &mut R, len: u32) -> io::Result<Vec<u8>> {
    let mut take = r.take(len as u64);
    let uncompressed_len = read_u32_le(&mut take)? as usize;
    let mut compressed = Vec::with_capacity((len as usize).saturating_sub(4));
    take.read_to_end(&mut compressed)?;
    lz4_flex::decompress(&compressed, uncompressed_len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "lz4 decompression failed"))
}

pub fn write_archive<W: Write>(w: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    w.write_all(MAGIC)?;
    write_u32_le(w, VERSION_CURRENT)?;

    let users = serde_json::to_vec(&snapshot.users)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let sessions = serde_json::to_vec(&snapshot.sessions)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    write_chunk_lz4(w, TAG_USERS, &users)?;
    write_chunk_lz4(w, TAG_SESSIONS, &sessions)
}

pub fn read_archive<R: Read>(r: &mut R) -> io::Result<Snapshot> {
    let magic = read_exact::<8, _>(r)?;
    if &magic != MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "bad archive magic",
        ));
    }
    let version = read_u32_le(r)?;
    if version != VERSION_V1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "unsupported archive version",
        ));
    }

    let mut users: Option<Vec<User>> = None;
    let mut sessions: Option<Vec<SessionResult>> = None;

    loop {
        let tag = match read_exact::<4, _>(r) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        };
        let len = read_u32_le(r)?;

        if tag == TAG_USERS {
            let buf = read_chunk_lz4(r, len)?;
            users = Some(
                serde_json::from_slice(&buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            );
        } else if tag == TAG_SESSIONS {
            let buf = read_chunk_lz4(r, len)?;
            sessions = Some(
                serde_json::from_slice(&buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            );
        } else {
            // Unknown chunk: skip its payload.
            io::copy(&mut r.take(len as u64), &mut io::sink())?;
        }
    }

    Ok(Snapshot {
        users: users
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing users chunk"))?,
        sessions: sessions
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing sessions chunk"))?,
    })
}
