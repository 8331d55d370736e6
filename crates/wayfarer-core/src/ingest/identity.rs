use sha2::{Digest, Sha256};

/// Stable id for an imported place: `kml-` and the first 16 hex digits of
/// SHA-256 over `name|lat|lon`, coordinates at 6 decimals.
///
/// Independent of document order, so merging the same file twice touches
/// the same rows.
pub fn place_id(name: &str, latitude: f64, longitude: f64) -> String {
    let key = format!("{}|{:.6}|{:.6}", name.trim(), latitude, longitude);
    let digest = Sha256::digest(key.as_bytes());
    format!("kml-{}", &hex::encode(digest)[..16])
}
