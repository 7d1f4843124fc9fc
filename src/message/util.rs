use std::io::{self, prelude::*};
use crate::error::{Error, Result};

/// Compute the log-base-two of the next power of two: 8 -> 3, 9 -> 4.
///
pub fn ceil_log2(x: usize) -> usize {
    let mut n = 0;
    while 1 << n < x {
        n += 1
    }
    n
}

/// Read a usize out of the given stream.
///
pub fn read_usize<R: Read>(stream: &mut R) -> io::Result<usize> {
    Ok(usize::from_le_bytes(read_bytes_array(stream)?))
}

/// Read the given number of bytes from a stream, into a vec.
///
pub fn read_bytes_vec<R: Read>(stream: &mut R, size: usize) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0; size];
    stream.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Read the given (const) number of bytes from a stream, into an array.
///
pub fn read_bytes_array<R: Read, const SIZE: usize>(stream: &mut R) -> io::Result<[u8; SIZE]> {
    let mut buffer = [0; SIZE];
    stream.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Pack a sequence of floats into little-endian bytes.
///
pub fn encode_f64s<I: IntoIterator<Item = f64>>(values: I) -> Vec<u8> {
    values.into_iter().flat_map(f64::to_le_bytes).collect()
}

/// Inverse of [`encode_f64s`].
///
pub fn decode_f64s(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        return Err(Error::Malformed(format!("{} bytes is not a whole number of floats", bytes.len())))
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ceil_log2_rounds_up() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(ceil_log2(9), 4);
    }

    #[test]
    fn floats_survive_the_byte_encoding() {
        let values = vec![1.5, -0.0, f64::MAX, 1e-300];
        assert_eq!(decode_f64s(&encode_f64s(values.clone())).unwrap(), values);
        assert!(decode_f64s(&[0u8; 7]).is_err());
    }

    #[test]
    fn usize_frames_read_back() {
        let mut bytes = 42usize.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let mut cursor = io::Cursor::new(bytes);
        assert_eq!(read_usize(&mut cursor).unwrap(), 42);
        assert_eq!(read_bytes_vec(&mut cursor, 3).unwrap(), b"abc".to_vec());
        assert!(read_usize(&mut cursor).is_err());
    }
}
