use std::path::Path;

use snap::raw::Decoder;

pub fn read_ssz_snappy_bytes(path: &Path) -> Option<Vec<u8>> {
    let ssz_snappy = std::fs::read(path).ok()?;
    let mut decoder = Decoder::new();
    decoder.decompress_vec(&ssz_snappy).ok()
}

pub fn read_ssz_snappy<T: ssz::Decode>(path: &Path) -> Option<T> {
    T::from_ssz_bytes(&read_ssz_snappy_bytes(path)?).ok()
}
