/// Converts a byte count (as reported by `4gdata-use`) to mebibytes
pub fn bytes_to_mebibytes(bytes: f64) -> f64 {
    bytes / 1024.0 / 1024.0
}
