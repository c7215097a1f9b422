//! Token-window splitter.
//!
//! Splits a token sequence into fixed-size windows that overlap by a
//! configurable number of tokens. Window *i* starts at
//! `i * (chunk_size - chunk_overlap)`; only the last window may be short.
//!
//! # Guarantees
//!
//! - Empty input produces no chunks.
//! - Input no longer than `chunk_size` produces exactly one chunk.
//! - Every window but the last has exactly `chunk_size` tokens.
//! - The last `chunk_overlap` tokens of window *i* equal the first
//!   `chunk_overlap` tokens of window *i + 1*.
//!
//! # Example
//!
//! ```rust
//! use zk_chat_core::splitter::split_to_chunks;
//!
//! let tokens: Vec<u32> = (0..10).collect();
//! let chunks = split_to_chunks(&tokens, 4, 2).unwrap();
//! assert_eq!(chunks.len(), 4);
//! assert_eq!(chunks[1], &[2, 3, 4, 5]);
//! ```

use crate::error::{ZkError, ZkResult};

/// Check splitter parameters without splitting anything.
pub fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> ZkResult<()> {
    if chunk_size == 0 {
        return Err(ZkError::Configuration(
            "chunk_size must be > 0".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(ZkError::Configuration(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }
    Ok(())
}

/// Split `tokens` into overlapping windows borrowed from the input.
pub fn split_to_chunks<T>(
    tokens: &[T],
    chunk_size: usize,
    chunk_overlap: usize,
) -> ZkResult<Vec<&[T]>> {
    validate_chunking(chunk_size, chunk_overlap)?;

    let step = chunk_size - chunk_overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < tokens.len() {
        let end = (start + chunk_size).min(tokens.len());
        chunks.push(&tokens[start..end]);
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u32) -> Vec<u32> {
        (0..n).collect()
    }

    fn expected_count(n: usize, size: usize, overlap: usize) -> usize {
        if n == 0 {
            0
        } else if n <= size {
            1
        } else {
            (n - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn test_empty_input() {
        let chunks = split_to_chunks::<u32>(&[], 10, 2).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_input_single_chunk() {
        let t = tokens(5);
        let chunks = split_to_chunks(&t, 10, 2).unwrap();
        assert_eq!(chunks, vec![&t[..]]);
    }

    #[test]
    fn test_exact_size_single_chunk() {
        let t = tokens(10);
        let chunks = split_to_chunks(&t, 10, 3).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_input_shorter_than_overlap_single_chunk() {
        let t = tokens(1);
        let chunks = split_to_chunks(&t, 4, 2).unwrap();
        assert_eq!(chunks, vec![&[0u32][..]]);
    }

    #[test]
    fn test_window_starts() {
        let t = tokens(10);
        let chunks = split_to_chunks(&t, 4, 2).unwrap();
        assert_eq!(
            chunks,
            vec![&[0u32, 1, 2, 3][..], &[2, 3, 4, 5], &[4, 5, 6, 7], &[6, 7, 8, 9]]
        );
    }

    #[test]
    fn test_no_overlap() {
        let t = tokens(7);
        let chunks = split_to_chunks(&t, 3, 0).unwrap();
        assert_eq!(chunks, vec![&[0u32, 1, 2][..], &[3, 4, 5], &[6]]);
    }

    #[test]
    fn test_counts_lengths_and_overlap_across_grid() {
        for n in 0..40usize {
            for size in 1..9usize {
                for overlap in 0..size {
                    let t = tokens(n as u32);
                    let chunks = split_to_chunks(&t, size, overlap).unwrap();
                    assert_eq!(
                        chunks.len(),
                        expected_count(n, size, overlap),
                        "n={} size={} overlap={}",
                        n,
                        size,
                        overlap
                    );
                    for (i, c) in chunks.iter().enumerate() {
                        assert!(!c.is_empty());
                        assert!(c.len() <= size);
                        if i + 1 < chunks.len() {
                            assert_eq!(c.len(), size);
                            let next = chunks[i + 1];
                            assert_eq!(&c[size - overlap..], &next[..overlap]);
                        }
                    }
                    if let Some(last) = chunks.last() {
                        assert_eq!(last.last(), t.last());
                    }
                }
            }
        }
    }

    #[test]
    fn test_overlap_equal_to_size_is_rejected() {
        let t = tokens(10);
        let err = split_to_chunks(&t, 4, 4).unwrap_err();
        assert!(matches!(err, ZkError::Configuration(_)));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = split_to_chunks::<u32>(&[], 0, 0).unwrap_err();
        assert!(matches!(err, ZkError::Configuration(_)));
    }

    #[test]
    fn test_deterministic() {
        let t = tokens(33);
        let a = split_to_chunks(&t, 8, 3).unwrap();
        let b = split_to_chunks(&t, 8, 3).unwrap();
        assert_eq!(a, b);
    }
}
