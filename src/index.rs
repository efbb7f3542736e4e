use std::path::Path;

use log::{debug, trace};

use crate::bucket::{insert_into_bucket, lookup_in_bucket};
use crate::error::LinHashError;
use crate::hash::bucket_of;
use crate::metadata::{self, Metadata};
use crate::page::read_page;
use crate::paged_file::PagedFile;
use crate::record::Record;
use crate::{HEADER_SIZE, PAGE_SIZE};

/// Split is triggered once average chain occupancy across all buckets
/// crosses this fraction of one page's capacity (spec §9 Open Question 1).
const SPLIT_LOAD_FACTOR: f64 = 0.75;

/// The metadata page always occupies physical page 0; bucket and overflow
/// pages start from 1.
const META_PAGE: u32 = 0;

/// Linear-hash controller (C6): owns `i`, `n`, the page directory, and the
/// record count, and orchestrates inserts and splits over a [`PagedFile`].
pub struct LinearHashIndex {
    file: PagedFile,
    i: u32,
    n: u32,
    num_records: u64,
    split_cursor: u32,
    page_directory: Vec<u32>,
    total_record_bytes: u64,
}

impl LinearHashIndex {
    /// Create a new, empty index file, reserving page 0 for the persistent
    /// controller header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, LinHashError> {
        let mut file = PagedFile::create(path.as_ref())?;
        let meta_page = file.allocate_page()?;
        debug_assert_eq!(meta_page, META_PAGE);

        let mut index = Self {
            file,
            i: 0,
            n: 0,
            num_records: 0,
            split_cursor: 0,
            page_directory: Vec::new(),
            total_record_bytes: 0,
        };
        index.persist_metadata()?;
        Ok(index)
    }

    /// Reopen an existing index file, restoring `i`, `n`, `num_records`,
    /// and the page directory from the page-0 metadata block instead of
    /// rescanning bucket pages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LinHashError> {
        let mut file = PagedFile::open(path.as_ref())?;
        let meta_bytes = file.read_page_bytes(META_PAGE)?;

        let (i, n, num_records, split_cursor, page_directory) = match metadata::decode(&meta_bytes)? {
            Some(Metadata {
                i,
                n,
                num_records,
                split_cursor,
                page_directory,
            }) => (i, n, num_records, split_cursor, page_directory),
            None => (0, 0, 0, 0, Vec::new()),
        };

        // Not persisted; sample one primary page's chain for the average
        // record size instead of assuming a constant, so the post-reopen
        // split threshold tracks the actual data if inserts resume.
        let total_record_bytes = estimate_total_record_bytes(&mut file, &page_directory, num_records)?;

        Ok(Self {
            file,
            i,
            n,
            num_records,
            split_cursor,
            page_directory,
            total_record_bytes,
        })
    }

    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    pub fn num_pages(&self) -> u32 {
        self.file.num_pages()
    }

    pub fn level(&self) -> u32 {
        self.i
    }

    pub fn bucket_count(&self) -> u32 {
        self.n
    }

    pub fn page_directory_len(&self) -> usize {
        self.page_directory.len()
    }

    fn persist_metadata(&mut self) -> Result<(), LinHashError> {
        let meta = Metadata {
            i: self.i,
            n: self.n,
            num_records: self.num_records,
            split_cursor: self.split_cursor,
            page_directory: self.page_directory.clone(),
        };
        self.file.write_page_bytes(META_PAGE, &metadata::encode(&meta))
    }

    /// Persist metadata and force the underlying file durable.
    pub fn flush(&mut self) -> Result<(), LinHashError> {
        self.persist_metadata()?;
        self.file.flush()
    }

    /// Insert one record, initialising the index on the very first call,
    /// then splitting the bucket under the next-to-split cursor if the load
    /// threshold is exceeded.
    pub fn insert(&mut self, rec: Record) -> Result<(), LinHashError> {
        let size = rec.serialized_size();
        if size > PAGE_SIZE - HEADER_SIZE {
            return Err(LinHashError::RecordTooLarge {
                size,
                max: PAGE_SIZE - HEADER_SIZE,
            });
        }

        if self.num_records == 0 {
            let p0 = self.file.allocate_page()?;
            let p1 = self.file.allocate_page()?;
            self.page_directory.push(p0);
            self.page_directory.push(p1);
            self.i = 1;
            self.n = 2;
            debug!("initialised index: i=1, n=2, primary pages {p0}, {p1}");
        }

        let b = bucket_of(rec.id, self.i, self.n);
        let primary = self.page_directory[b as usize];
        trace!("insert id={} -> bucket {} (page {})", rec.id, b, primary);
        insert_into_bucket(&mut self.file, primary, &rec)?;

        self.num_records += 1;
        self.total_record_bytes += size as u64;
        self.persist_metadata()?;
        self.maybe_split()?;
        Ok(())
    }

    /// `lookup(id) -> Option<Record>`: resolve the bucket, then scan its
    /// chain linearly.
    pub fn lookup(&mut self, id: i64) -> Result<Option<Record>, LinHashError> {
        if self.n == 0 {
            return Ok(None);
        }
        let b = bucket_of(id, self.i, self.n);
        let primary = self.page_directory[b as usize];
        lookup_in_bucket(&mut self.file, primary, id)
    }

    fn avg_record_size(&self) -> f64 {
        if self.num_records == 0 {
            HEADER_SIZE as f64
        } else {
            self.total_record_bytes as f64 / self.num_records as f64
        }
    }

    fn maybe_split(&mut self) -> Result<(), LinHashError> {
        if self.n == 0 {
            return Ok(());
        }
        let capacity_per_bucket = ((PAGE_SIZE - HEADER_SIZE) as f64 / self.avg_record_size()).max(1.0);
        let threshold = SPLIT_LOAD_FACTOR * capacity_per_bucket * self.n as f64;
        if self.num_records as f64 > threshold {
            self.split()?;
        }
        Ok(())
    }

    /// Split the bucket pointed to by `split_cursor`: allocate a new
    /// primary page, append it to the directory, redistribute the old
    /// chain's records under the widened addressing rule, and advance the
    /// cursor. Surplus overflow pages are left allocated but unreferenced.
    fn split(&mut self) -> Result<(), LinHashError> {
        let s = self.split_cursor;
        let primary = self.page_directory[s as usize];

        let mut chain_pages = Vec::new();
        let mut records = Vec::new();
        let mut cur = primary;
        loop {
            let page = read_page(&mut self.file, cur)?;
            records.extend(page.records);
            chain_pages.push(cur);
            if page.header.overflow_next == -1 {
                break;
            }
            cur = page.header.overflow_next as u32;
        }

        for &p in &chain_pages {
            self.file.write_header(p, -1, 0)?;
        }

        let new_page = self.file.allocate_page()?;
        self.page_directory.push(new_page);
        self.n += 1;
        if self.n > (1u32 << self.i) {
            self.i += 1;
        }
        debug!(
            "split bucket {s}: n={}, i={}, new primary page {new_page}, {} records to redistribute",
            self.n,
            self.i,
            records.len()
        );

        for rec in records {
            let b = bucket_of(rec.id, self.i, self.n);
            let target = self.page_directory[b as usize];
            insert_into_bucket(&mut self.file, target, &rec)?;
        }

        self.split_cursor += 1;
        let round_size = 1u32 << (self.i - 1);
        if self.split_cursor >= round_size {
            self.split_cursor = 0;
        }

        self.persist_metadata()
    }
}

/// Sample the first bucket's chain for an average record size rather than
/// assuming a constant; falls back to a conservative guess if the index is
/// empty or that chain happens to hold none of its records anymore.
fn estimate_total_record_bytes(file: &mut PagedFile, page_directory: &[u32], num_records: u64) -> Result<u64, LinHashError> {
    if num_records == 0 || page_directory.is_empty() {
        return Ok(0);
    }

    let mut sampled = Vec::new();
    let mut cur = page_directory[0];
    loop {
        let page = read_page(file, cur)?;
        sampled.extend(page.records.iter().map(Record::serialized_size));
        if page.header.overflow_next == -1 {
            break;
        }
        cur = page.header.overflow_next as u32;
    }

    let avg = if sampled.is_empty() {
        (PAGE_SIZE / 16) as f64
    } else {
        sampled.iter().sum::<usize>() as f64 / sampled.len() as f64
    };
    Ok((num_records as f64 * avg) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn new_index() -> (NamedTempFile, LinearHashIndex) {
        let tmp = NamedTempFile::new().unwrap();
        let index = LinearHashIndex::create(tmp.path()).unwrap();
        (tmp, index)
    }

    #[test]
    fn first_insert_creates_two_buckets() {
        let (_tmp, mut index) = new_index();
        index.insert(Record::new(7, "A", "B", 0)).unwrap();
        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.level(), 1);
        assert_eq!(index.page_directory, vec![1, 2]);
    }

    #[test]
    fn round_trip_lookup() {
        let (_tmp, mut index) = new_index();
        let records: Vec<Record> = (0..200)
            .map(|id| Record::new(id, format!("name-{id}"), format!("bio for {id}"), id % 5))
            .collect();
        for rec in &records {
            index.insert(rec.clone()).unwrap();
        }
        for rec in &records {
            let found = index.lookup(rec.id).unwrap();
            assert_eq!(found.as_ref(), Some(rec));
        }
        assert!(index.lookup(999_999).unwrap().is_none());
    }

    #[test]
    fn splits_grow_bucket_count_and_level() {
        let (_tmp, mut index) = new_index();
        for id in 0..500 {
            index
                .insert(Record::new(id, "x".repeat(20), "y".repeat(100), 0))
                .unwrap();
        }
        assert!(index.bucket_count() > 2);
        assert!(index.level() >= 1);
        // invariant: directory length always matches n
        assert_eq!(index.page_directory.len(), index.bucket_count() as usize);
    }

    #[test]
    fn record_too_large_is_rejected_without_mutating_state() {
        let (_tmp, mut index) = new_index();
        let huge = Record::new(1, "n".repeat(5000), "b", 0);
        let err = index.insert(huge).unwrap_err();
        assert!(matches!(err, LinHashError::RecordTooLarge { .. }));
        assert_eq!(index.num_records(), 0);
    }

    #[test]
    fn persists_and_reopens_state() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut index = LinearHashIndex::create(tmp.path()).unwrap();
            for id in 0..50 {
                index.insert(Record::new(id, "n", "b", 0)).unwrap();
            }
            index.flush().unwrap();
        }
        let mut reopened = LinearHashIndex::open(tmp.path()).unwrap();
        assert_eq!(reopened.num_records(), 50);
        for id in 0..50 {
            assert!(reopened.lookup(id).unwrap().is_some());
        }
    }
}
