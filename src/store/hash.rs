//! Content fingerprints for stored documents.

use sha2::{Digest, Sha256};

use crate::model::DataModel;

/// SHA-256 of the model's canonical JSON form, as 64 lowercase hex chars.
///
/// Any change to the document, including `updated_at`, changes the
/// fingerprint.
pub fn fingerprint(model: &DataModel) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(model)?;
    Ok(digest(json.as_bytes()))
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
