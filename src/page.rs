use crate::error::LinHashError;
use crate::paged_file::PagedFile;
use crate::record::Record;
use crate::HEADER_SIZE;

/// Decoded header of one page: `overflow_next` (-1 if this is the end of
/// the chain) and `record_count` (records stored in this page only, not
/// the whole chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub overflow_next: i32,
    pub record_count: u32,
}

/// A page reconstructed from bytes on every read; no hidden sharing with
/// the file.
#[derive(Debug, Clone)]
pub struct Page {
    pub header: PageHeader,
    pub records: Vec<Record>,
}

impl Page {
    fn decode(bytes: &[u8], page_no: u32) -> Result<Self, LinHashError> {
        let overflow_next = i32::from_le_bytes(bytes[0..4].try_into()?);
        let record_count = u32::from_le_bytes(bytes[4..8].try_into()?);

        let mut offset = HEADER_SIZE;
        let mut records = Vec::with_capacity(record_count as usize);
        for _ in 0..record_count {
            let (rec, used) = Record::decode(&bytes[offset..], page_no, offset)?;
            offset += used;
            records.push(rec);
        }

        Ok(Page {
            header: PageHeader {
                overflow_next,
                record_count,
            },
            records,
        })
    }

    /// Next free byte offset in this page's body: `8 + sum(serialized_size)`.
    pub fn used_bytes(&self) -> usize {
        HEADER_SIZE + self.records.iter().map(Record::serialized_size).sum::<usize>()
    }
}

/// `read_page(page_no) -> Page`: seek, read the whole page, decode header
/// and exactly `record_count` records.
pub fn read_page(file: &mut PagedFile, page_no: u32) -> Result<Page, LinHashError> {
    let bytes = file.read_page_bytes(page_no)?;
    Page::decode(&bytes, page_no)
}

/// Overwrite the 8-byte header of `page_no` without touching its body.
pub fn write_header(file: &mut PagedFile, page_no: u32, overflow_next: i32, record_count: u32) -> Result<(), LinHashError> {
    file.write_header(page_no, overflow_next, record_count)
}

/// Write a serialized record at an absolute body offset within `page_no`.
pub fn append_record_at(file: &mut PagedFile, page_no: u32, body_offset: usize, rec: &Record) -> Result<(), LinHashError> {
    file.append_record_at(page_no, body_offset, &rec.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PAGE_SIZE;
    use tempfile::NamedTempFile;

    #[test]
    fn round_trips_through_paged_file() {
        let tmp = NamedTempFile::new().unwrap();
        let mut file = PagedFile::create(tmp.path()).unwrap();
        let page_no = file.allocate_page().unwrap();

        let rec = Record::new(1, "Ada", "Engineer", 0);
        append_record_at(&mut file, page_no, HEADER_SIZE, &rec).unwrap();
        write_header(&mut file, page_no, -1, 1).unwrap();

        let page = read_page(&mut file, page_no).unwrap();
        assert_eq!(page.header.record_count, 1);
        assert_eq!(page.header.overflow_next, -1);
        assert_eq!(page.records[0], rec);
        assert_eq!(page.used_bytes(), HEADER_SIZE + rec.serialized_size());
        assert!(page.used_bytes() <= PAGE_SIZE);
    }
}
