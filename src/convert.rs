use crate::error::{StreamError, StreamResult};

/// Narrow `pixel_count` RGBA pixels to packed RGB, dropping alpha.
///
/// Plain strided copy. No blending is applied.
pub fn copy_rgba_to_rgb(dest: &mut [u8], src: &[u8], pixel_count: usize) -> StreamResult<()> {
    let src_len = pixel_count
        .checked_mul(4)
        .ok_or_else(|| too_small(usize::MAX, src.len()))?;
    if src.len() < src_len {
        return Err(too_small(src_len, src.len()));
    }
    let dest_len = pixel_count * 3;
    if dest.len() < dest_len {
        return Err(too_small(dest_len, dest.len()));
    }

    for (rgb, rgba) in dest[..dest_len]
        .chunks_exact_mut(3)
        .zip(src[..src_len].chunks_exact(4))
    {
        rgb.copy_from_slice(&rgba[..3]);
    }
    Ok(())
}

/// Decode little-endian 16-bit depth samples into `dest`.
pub fn decode_depth16_le(src: &[u8], dest: &mut [i16]) -> StreamResult<()> {
    let required = dest.len() * 2;
    if src.len() < required {
        return Err(too_small(required, src.len()));
    }
    for (sample, bytes) in dest.iter_mut().zip(src.chunks_exact(2)) {
        *sample = i16::from_le_bytes([bytes[0], bytes[1]]);
    }
    Ok(())
}

/// Encode depth samples as little-endian bytes into `dest`.
pub fn encode_depth16_le(src: &[i16], dest: &mut [u8]) -> StreamResult<()> {
    let required = src.len() * 2;
    if dest.len() < required {
        return Err(too_small(required, dest.len()));
    }
    for (bytes, sample) in dest.chunks_exact_mut(2).zip(src) {
        bytes.copy_from_slice(&sample.to_le_bytes());
    }
    Ok(())
}

fn too_small(required: usize, provided: usize) -> StreamError {
    StreamError::BufferTooSmall { required, provided }
}
