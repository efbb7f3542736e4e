use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::LinHashError;
use crate::{HEADER_SIZE, PAGE_SIZE};

/// Owns the file handle backing an index. Its only I/O primitives are
/// whole-page reads/writes and small header overwrites; callers never see
/// a raw cursor, matching the re-architecture called for in the design
/// notes (no mixed `seekp`/`seekg` stream state).
pub struct PagedFile {
    file: File,
    num_pages: u32,
}

impl PagedFile {
    /// Create a new, empty (truncated) paged file.
    pub fn create(path: &Path) -> Result<Self, LinHashError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file, num_pages: 0 })
    }

    /// Open an existing paged file, inferring `num_pages` from its length.
    pub fn open(path: &Path) -> Result<Self, LinHashError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        let num_pages = (len / PAGE_SIZE as u64) as u32;
        Ok(Self { file, num_pages })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Allocate a fresh page: `page_no = num_pages`, zero-write its header
    /// (`overflow_next = -1`, `record_count = 0`). Pages are never freed.
    pub fn allocate_page(&mut self) -> Result<u32, LinHashError> {
        let page_no = self.num_pages;
        let mut buf = [0u8; PAGE_SIZE];
        buf[0..4].copy_from_slice(&(-1i32).to_le_bytes());
        self.write_page_bytes(page_no, &buf)?;
        self.num_pages += 1;
        Ok(page_no)
    }

    fn seek_page(&mut self, page_no: u32) -> Result<(), LinHashError> {
        self.file.seek(SeekFrom::Start(page_no as u64 * PAGE_SIZE as u64))?;
        Ok(())
    }

    /// Read the full 4096-byte page. Fails with `ShortRead` if fewer bytes
    /// than a full page are available.
    pub fn read_page_bytes(&mut self, page_no: u32) -> Result<[u8; PAGE_SIZE], LinHashError> {
        self.seek_page(page_no)?;
        let mut buf = [0u8; PAGE_SIZE];
        let mut total = 0usize;
        loop {
            let n = self.file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
            if total == PAGE_SIZE {
                break;
            }
        }
        if total < PAGE_SIZE {
            return Err(LinHashError::ShortRead {
                page: page_no,
                expected: PAGE_SIZE,
                got: total,
            });
        }
        Ok(buf)
    }

    pub fn write_page_bytes(&mut self, page_no: u32, bytes: &[u8; PAGE_SIZE]) -> Result<(), LinHashError> {
        self.seek_page(page_no)?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    /// Overwrite the 8-byte header in place without touching the body.
    pub fn write_header(&mut self, page_no: u32, overflow_next: i32, record_count: u32) -> Result<(), LinHashError> {
        self.seek_page(page_no)?;
        let mut hdr = [0u8; HEADER_SIZE];
        hdr[0..4].copy_from_slice(&overflow_next.to_le_bytes());
        hdr[4..8].copy_from_slice(&record_count.to_le_bytes());
        self.file.write_all(&hdr)?;
        Ok(())
    }

    /// Write a serialized record at an absolute body offset. The caller
    /// guarantees `body_offset + bytes.len() <= PAGE_SIZE`.
    pub fn append_record_at(&mut self, page_no: u32, body_offset: usize, bytes: &[u8]) -> Result<(), LinHashError> {
        debug_assert!(body_offset + bytes.len() <= PAGE_SIZE);
        self.file
            .seek(SeekFrom::Start(page_no as u64 * PAGE_SIZE as u64 + body_offset as u64))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    /// Force buffered writes to the OS. Record bodies must be written
    /// before the header that advertises them; this is only the final
    /// durability step, not an ordering guarantee by itself.
    pub fn flush(&mut self) -> Result<(), LinHashError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}
