use crate::error::LinHashError;

/// Field delimiter used by the on-disk record encoding. `name` and `bio`
/// must not contain this byte; the CSV source is responsible for rejecting
/// rows that do (see [`crate::csv_source`]).
pub const DELIM: u8 = b'~';

/// One employee row: `id`, `name`, `bio`, `manager_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub manager_id: i64,
}

impl Record {
    pub fn new(id: i64, name: impl Into<String>, bio: impl Into<String>, manager_id: i64) -> Self {
        Self {
            id,
            name: name.into(),
            bio: bio.into(),
            manager_id,
        }
    }

    /// Serialized size per spec: 16 bytes of fixed integers + text + 4 delimiters.
    pub fn serialized_size(&self) -> usize {
        16 + self.name.len() + self.bio.len() + 4
    }

    /// Wire layout: id ~ name ~ bio ~ manager_id ~
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.push(DELIM);
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(DELIM);
        buf.extend_from_slice(self.bio.as_bytes());
        buf.push(DELIM);
        buf.extend_from_slice(&self.manager_id.to_le_bytes());
        buf.push(DELIM);
        buf
    }

    /// Decode one record starting at `bytes[0]`. Returns the record and the
    /// number of bytes consumed. `page`/`page_offset` are only used to
    /// annotate a `MalformedRecord` error.
    pub fn decode(bytes: &[u8], page: u32, page_offset: usize) -> Result<(Self, usize), LinHashError> {
        let malformed = |reason: &str| LinHashError::MalformedRecord {
            page,
            offset: page_offset,
            reason: reason.to_string(),
        };

        if bytes.len() < 8 {
            return Err(malformed("truncated id field"));
        }
        let id = i64::from_le_bytes(bytes[0..8].try_into()?);
        let mut pos = 8;

        if bytes.get(pos) != Some(&DELIM) {
            return Err(malformed("missing delimiter after id"));
        }
        pos += 1;

        let name_start = pos;
        let name_end = find_delim(bytes, name_start).ok_or_else(|| malformed("missing delimiter after name"))?;
        let name = String::from_utf8(bytes[name_start..name_end].to_vec())
            .map_err(|_| malformed("name is not valid utf-8"))?;
        pos = name_end + 1;

        let bio_start = pos;
        let bio_end = find_delim(bytes, bio_start).ok_or_else(|| malformed("missing delimiter after bio"))?;
        let bio = String::from_utf8(bytes[bio_start..bio_end].to_vec())
            .map_err(|_| malformed("bio is not valid utf-8"))?;
        pos = bio_end + 1;

        if bytes.len() < pos + 8 {
            return Err(malformed("truncated manager_id field"));
        }
        let manager_id = i64::from_le_bytes(bytes[pos..pos + 8].try_into()?);
        pos += 8;

        if bytes.get(pos) != Some(&DELIM) {
            return Err(malformed("missing trailing delimiter"));
        }
        pos += 1;

        Ok((
            Record {
                id,
                name,
                bio,
                manager_id,
            },
            pos,
        ))
    }
}

fn find_delim(bytes: &[u8], start: usize) -> Option<usize> {
    bytes[start..].iter().position(|&b| b == DELIM).map(|p| p + start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let rec = Record::new(7, "Ada", "Engineer", 0);
        let encoded = rec.encode();
        let (decoded, used) = Record::decode(&encoded, 0, 0).unwrap();
        assert_eq!(used, encoded.len());
        assert_eq!(decoded, rec);
    }

    #[test]
    fn serialized_size_matches_encoding() {
        let rec = Record::new(1, "x", "y", 2);
        assert_eq!(rec.serialized_size(), rec.encode().len());
    }

    #[test]
    fn decode_after_trailing_garbage_only_consumes_one_record() {
        let rec = Record::new(1, "a", "b", 2);
        let mut bytes = rec.encode();
        bytes.extend_from_slice(b"garbage-that-looks-like-more-record-data");
        let (decoded, used) = Record::decode(&bytes, 0, 0).unwrap();
        assert_eq!(decoded, rec);
        assert_eq!(used, rec.serialized_size());
    }

    #[test]
    fn missing_delimiter_is_malformed() {
        let mut bytes = 5i64.to_le_bytes().to_vec();
        bytes.push(b'x'); // not a delimiter
        let err = Record::decode(&bytes, 3, 8).unwrap_err();
        match err {
            LinHashError::MalformedRecord { page, offset, .. } => {
                assert_eq!(page, 3);
                assert_eq!(offset, 8);
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }
}
