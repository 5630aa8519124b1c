//! Splitting a decompressed multi-file payload into per-file byte ranges.
//!
//! A multi-file archive's decompressed buffer ends with a one-byte chunk
//! count `C`, preceded by `C * file_count` big-endian 32-bit sizes laid out
//! chunks-outer, files-inner. The data region interleaves every file's
//! chunk 0, then every file's chunk 1, and so on; reassembly walks chunks
//! outer and files inner with a running cursor per file.

use bytes::Bytes;
use tracing::trace;

use crate::{Error, Result};

/// Split an archive's decompressed payload into per-file buffers, in file
/// order.
///
/// Single-file archives own the whole buffer; single-chunk layouts are
/// returned as zero-copy slices.
pub fn split_files(data: &Bytes, file_count: usize) -> Result<Vec<Bytes>> {
    if file_count == 0 {
        return Ok(Vec::new());
    }
    if file_count == 1 {
        return Ok(vec![data.clone()]);
    }
    if data.is_empty() {
        return Err(Error::TruncatedData {
            expected: 1,
            actual: 0,
        });
    }

    let chunk_count = usize::from(data[data.len() - 1]);
    if chunk_count == 0 {
        return Err(Error::InvalidChunkCount(0));
    }
    let trailer_len = chunk_count * file_count * 4;
    if data.len() < 1 + trailer_len {
        return Err(Error::TruncatedData {
            expected: 1 + trailer_len,
            actual: data.len(),
        });
    }
    let region_len = data.len() - 1 - trailer_len;

    // sizes[chunk][file], read chunks-outer files-inner.
    let mut sizes = vec![vec![0usize; file_count]; chunk_count];
    let mut totals = vec![0usize; file_count];
    let mut trailer = &data[region_len..data.len() - 1];
    for chunk_sizes in &mut sizes {
        for (file, slot) in chunk_sizes.iter_mut().enumerate() {
            let size = i32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
            trailer = &trailer[4..];
            if size < 0 {
                return Err(Error::NegativeChunkSize(size));
            }
            *slot = size as usize;
            totals[file] += size as usize;
        }
    }

    let declared: usize = totals.iter().sum();
    if declared != region_len {
        return Err(Error::LengthMismatch {
            expected: region_len,
            actual: declared,
        });
    }
    trace!(
        "Splitting {} bytes into {} files across {} chunks",
        region_len, file_count, chunk_count
    );

    if chunk_count == 1 {
        let mut files = Vec::with_capacity(file_count);
        let mut offset = 0;
        for &size in &sizes[0] {
            files.push(data.slice(offset..offset + size));
            offset += size;
        }
        return Ok(files);
    }

    let mut files: Vec<Vec<u8>> = totals.iter().map(|&t| Vec::with_capacity(t)).collect();
    let mut offset = 0;
    for chunk_sizes in &sizes {
        for (file, &size) in chunk_sizes.iter().enumerate() {
            files[file].extend_from_slice(&data[offset..offset + size]);
            offset += size;
        }
    }
    Ok(files.into_iter().map(Bytes::from).collect())
}
