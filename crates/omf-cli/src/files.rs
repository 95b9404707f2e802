//! On-disk share and query formats.
//!
//! Matrix shares are ASCII files of space-separated 32-bit bit patterns, one
//! row per line; dimensions are not embedded and must match the configured
//! values. Query files are headerless sequences of binary records.

use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use omf_core::{
    dpf::{DpfKey, KeyCodecError},
    matrix::ShareMatrix,
    share::Share,
    Query,
};

/// Errors reading or writing data files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unreadable or unwritable file.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    /// Corrupt key blob inside a query record.
    #[error("key blob: {0}")]
    Key(#[from] KeyCodecError),
    /// Value count not matching the configured dimensions.
    #[error("expected {expected} values, found {found}")]
    Dimensions {
        /// Configured value count.
        expected: usize,
        /// Count actually present in the file.
        found: usize,
    },
    /// Token that is not a 32-bit unsigned integer.
    #[error("malformed value: {0}")]
    Value(#[from] std::num::ParseIntError),
    /// Query line without exactly two indices.
    #[error("malformed query on line {0}")]
    QueryLine(usize),
    /// Item index reconstructing below zero from its two shares.
    #[error("reconstructed item index {0} is negative")]
    NegativeItem(i64),
    /// Binary query files disagreeing with each other.
    #[error("query files disagree at record {0}")]
    RecordMismatch(usize),
}

/// Loads a share matrix of the given dimensions.
pub fn load_matrix(path: &Path, rows: usize, cols: usize) -> Result<ShareMatrix, StoreError> {
    let text = std::fs::read_to_string(path)?;
    let mut values = Vec::with_capacity(rows * cols);
    for token in text.split_whitespace() {
        values.push(Share::from_bits(token.parse::<u32>()?));
    }
    if values.len() != rows * cols {
        return Err(StoreError::Dimensions {
            expected: rows * cols,
            found: values.len(),
        });
    }
    Ok(ShareMatrix::from_rows(
        values.chunks(cols).map(<[Share]>::to_vec).collect(),
    ))
}

/// Writes a share matrix, reducing every share to its 32-bit bit pattern.
pub fn save_matrix(path: &Path, matrix: &ShareMatrix) -> Result<(), StoreError> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in matrix.iter_rows() {
        let line = row
            .iter()
            .map(|share| share.to_bits().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes one party's binary query file.
pub fn write_queries(path: &Path, queries: &[Query]) -> Result<(), StoreError> {
    let mut out = BufWriter::new(File::create(path)?);
    for query in queries {
        out.write_all(&query.user_index.to_le_bytes())?;
        out.write_all(&query.item_share.value().to_le_bytes())?;
        query.key.write_to(&mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Reads one party's binary query file. A record cut short mid-way is an
/// error; ending cleanly between records is the normal termination.
pub fn read_queries(path: &Path) -> Result<Vec<Query>, StoreError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut queries = Vec::new();
    loop {
        let mut user = [0u8; 4];
        if !fill_or_eof(&mut reader, &mut user)? {
            break;
        }
        let mut item = [0u8; 8];
        reader.read_exact(&mut item)?;
        queries.push(Query {
            user_index: u32::from_le_bytes(user),
            item_share: Share::new(i64::from_le_bytes(item)),
            key: DpfKey::read_from(&mut reader)?,
        });
    }
    Ok(queries)
}

// Fills `buf` fully, or reports a clean end of input before the first byte.
fn fill_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "truncated query record",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Writes the cleartext query list.
pub fn write_cleartext_queries(path: &Path, queries: &[(u32, u32)]) -> Result<(), StoreError> {
    let mut out = BufWriter::new(File::create(path)?);
    for (user, item) in queries {
        writeln!(out, "{user} {item}")?;
    }
    out.flush()?;
    Ok(())
}

/// Reads the cleartext query list.
pub fn read_cleartext_queries(path: &Path) -> Result<Vec<(u32, u32)>, StoreError> {
    let text = std::fs::read_to_string(path)?;
    let mut queries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let (Some(user), Some(item), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(StoreError::QueryLine(number + 1));
        };
        queries.push((user.parse::<u32>()?, item.parse::<u32>()?));
    }
    Ok(queries)
}

/// Recovers the cleartext query list from the two parties' binary files.
///
/// The user index must agree record by record, and the item shares must
/// reconstruct a non-negative index.
pub fn recombine_queries(p0: &[Query], p1: &[Query]) -> Result<Vec<(u32, u32)>, StoreError> {
    if p0.len() != p1.len() {
        return Err(StoreError::Dimensions {
            expected: p0.len(),
            found: p1.len(),
        });
    }
    let mut queries = Vec::with_capacity(p0.len());
    for (record, (a, b)) in p0.iter().zip(p1).enumerate() {
        if a.user_index != b.user_index {
            return Err(StoreError::RecordMismatch(record));
        }
        let item = (a.item_share + b.item_share).value();
        if item < 0 {
            return Err(StoreError::NegativeItem(item));
        }
        queries.push((a.user_index, item as u32));
    }
    Ok(queries)
}

/// Picks the directory holding the data files: the configured directory if
/// `probe` exists there, then the working directory, then the container
/// path `/app/data`. Falls back to the configured directory so error
/// messages name it.
pub fn locate_data_dir(configured: &Path, probe: &str) -> PathBuf {
    for candidate in [configured, Path::new("."), Path::new("/app/data")] {
        if candidate.join(probe).exists() {
            return candidate.to_path_buf();
        }
    }
    configured.to_path_buf()
}
