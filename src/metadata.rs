//! Persistent controller header (spec §9 Open Question 2): page 0 of every
//! index file is reserved for this metadata block instead of being a bucket
//! page, so `i`, `n`, `num_records`, and the page directory survive a
//! process restart without rescanning bucket pages.

use crate::error::LinHashError;
use crate::PAGE_SIZE;

const MAGIC: [u8; 4] = *b"LHX1";

pub struct Metadata {
    pub i: u32,
    pub n: u32,
    pub num_records: u64,
    pub split_cursor: u32,
    pub page_directory: Vec<u32>,
}

pub fn encode(meta: &Metadata) -> [u8; PAGE_SIZE] {
    let mut buf = [0u8; PAGE_SIZE];
    buf[0..4].copy_from_slice(&MAGIC);
    buf[4..8].copy_from_slice(&meta.i.to_le_bytes());
    buf[8..12].copy_from_slice(&meta.n.to_le_bytes());
    buf[12..20].copy_from_slice(&meta.num_records.to_le_bytes());
    buf[20..24].copy_from_slice(&meta.split_cursor.to_le_bytes());

    let mut offset = 24;
    for &page_no in &meta.page_directory {
        assert!(offset + 4 <= PAGE_SIZE, "page directory outgrew the metadata page");
        buf[offset..offset + 4].copy_from_slice(&page_no.to_le_bytes());
        offset += 4;
    }
    buf
}

/// Returns `Ok(None)` if the page doesn't carry the magic (an index file
/// created but never inserted into).
pub fn decode(bytes: &[u8; PAGE_SIZE]) -> Result<Option<Metadata>, LinHashError> {
    if bytes[0..4] != MAGIC {
        return Ok(None);
    }
    let i = u32::from_le_bytes(bytes[4..8].try_into()?);
    let n = u32::from_le_bytes(bytes[8..12].try_into()?);
    let num_records = u64::from_le_bytes(bytes[12..20].try_into()?);
    let split_cursor = u32::from_le_bytes(bytes[20..24].try_into()?);

    let mut page_directory = Vec::with_capacity(n as usize);
    let mut offset = 24;
    for _ in 0..n {
        page_directory.push(u32::from_le_bytes(bytes[offset..offset + 4].try_into()?));
        offset += 4;
    }

    Ok(Some(Metadata {
        i,
        n,
        num_records,
        split_cursor,
        page_directory,
    }))
}
