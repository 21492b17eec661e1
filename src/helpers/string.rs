//! Little-endian conversions over byte slices.
//! Callers pass slices of at least the decoded width; shorter slices yield `None`.

/// Converts a byte slice into an iterator of sector or entry indexes.
/// Processes bytes in 4-byte chunks, dropping a trailing partial chunk.
pub(crate) fn to_usize_iter(bytes: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bytes.chunks_exact(4).filter_map(to_usize)
}

#[inline]
pub(crate) fn to_f64(s: &[u8]) -> Option<f64> {
    Some(f64::from_le_bytes(s.get(..8)?.try_into().ok()?))
}

#[inline]
pub(crate) fn to_u64(s: &[u8]) -> Option<u64> {
    Some(u64::from_le_bytes(s.get(..8)?.try_into().ok()?))
}

#[inline]
pub(crate) fn to_u32(s: &[u8]) -> Option<u32> {
    Some(u32::from_le_bytes(s.get(..4)?.try_into().ok()?))
}

#[inline]
pub(crate) fn to_u16(s: &[u8]) -> Option<u16> {
    Some(u16::from_le_bytes(s.get(..2)?.try_into().ok()?))
}

#[inline]
pub(crate) fn to_usize(s: &[u8]) -> Option<usize> {
    to_u32(s).and_then(|value| usize::try_from(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_values() {
        assert_eq!(to_u16(&[0x34, 0x12]), Some(0x1234));
        assert_eq!(to_u32(&[0x78, 0x56, 0x34, 0x12]), Some(0x1234_5678));
        assert_eq!(to_f64(&1.5f64.to_le_bytes()), Some(1.5));
        assert_eq!(to_u16(&[0x01]), None);
    }

    #[test]
    fn usize_iter_ignores_partial_chunk() {
        let bytes = [1, 0, 0, 0, 2, 0, 0, 0, 9];
        assert_eq!(to_usize_iter(&bytes).collect::<Vec<_>>(), vec![1, 2]);
    }
}
