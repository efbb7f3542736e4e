use crate::error::LinHashError;
use crate::page::{append_record_at, read_page, write_header};
use crate::paged_file::PagedFile;
use crate::record::Record;
use crate::PAGE_SIZE;

/// Insert `rec` into the chain rooted at `primary_page`, walking overflow
/// pages until one has room, allocating a fresh overflow page only if none
/// does. Appends in insertion order; never reorders or compacts.
pub fn insert_into_bucket(file: &mut PagedFile, primary_page: u32, rec: &Record) -> Result<(), LinHashError> {
    let mut cur = primary_page;
    loop {
        let page = read_page(file, cur)?;
        let used = page.used_bytes();
        if used + rec.serialized_size() <= PAGE_SIZE {
            append_record_at(file, cur, used, rec)?;
            write_header(file, cur, page.header.overflow_next, page.header.record_count + 1)?;
            return Ok(());
        }

        if page.header.overflow_next != -1 {
            cur = page.header.overflow_next as u32;
            continue;
        }

        let overflow_page = file.allocate_page()?;
        append_record_at(file, overflow_page, crate::HEADER_SIZE, rec)?;
        write_header(file, overflow_page, -1, 1)?;
        write_header(file, cur, overflow_page as i32, page.header.record_count)?;
        return Ok(());
    }
}

/// Scan the chain rooted at `primary_page` linearly for `id`.
pub fn lookup_in_bucket(file: &mut PagedFile, primary_page: u32, id: i64) -> Result<Option<Record>, LinHashError> {
    let mut cur = primary_page;
    loop {
        let page = read_page(file, cur)?;
        if let Some(rec) = page.records.into_iter().find(|r| r.id == id) {
            return Ok(Some(rec));
        }
        if page.header.overflow_next == -1 {
            return Ok(None);
        }
        cur = page.header.overflow_next as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn overflows_into_a_new_page_when_full() {
        let tmp = NamedTempFile::new().unwrap();
        let mut file = PagedFile::create(tmp.path()).unwrap();
        let primary = file.allocate_page().unwrap();

        // 300-byte records, 13 fit (8 + 13*300 = 3908 <= 4096), 14th overflows.
        let name = "n";
        let bio = "x".repeat(300 - 16 - 4 - name.len());
        for i in 0..14i64 {
            let rec = Record::new(i, name, &bio, 0);
            insert_into_bucket(&mut file, primary, &rec).unwrap();
        }

        let primary_page = read_page(&mut file, primary).unwrap();
        assert_eq!(primary_page.header.record_count, 13);
        assert!(primary_page.header.overflow_next != -1);

        for i in 0..14i64 {
            assert!(lookup_in_bucket(&mut file, primary, i).unwrap().is_some());
        }
        assert!(lookup_in_bucket(&mut file, primary, 99).unwrap().is_none());
    }
}
