use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Zlib-compress data for a `/FlateDecode` stream
pub fn compress_deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).context("Failed to deflate stream data")?;
    encoder.finish().context("Failed to finish deflate stream")
}

pub fn decompress_deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .context("Failed to inflate stream data")?;
    Ok(out)
}
