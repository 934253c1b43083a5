use sha2::{Digest, Sha256};
use std::path::Path;

/// A file chosen for upload, held in memory until the next selection.
/// No type or size checks are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub hash_sha256: String,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let hash_sha256 = bytes_sha256(&bytes);
        Self {
            name: name.into(),
            bytes,
            hash_sha256,
        }
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload.csv")
            .to_string();
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short id used to correlate log records for one upload.
    pub fn upload_id(&self) -> &str {
        &self.hash_sha256[..12]
    }

    /// Content type sent with the multipart part, guessed from the extension.
    pub fn mime(&self) -> &'static str {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => "text/csv",
            Some("json") => "application/json",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

pub fn bytes_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            bytes_sha256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(SelectedFile::from_bytes("tx.CSV", vec![]).mime(), "text/csv");
        assert_eq!(SelectedFile::from_bytes("tx", vec![]).mime(), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_read_keeps_name_and_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.csv");
        std::fs::write(&path, "Time,Amount\n1,50\n").unwrap();
        let file = SelectedFile::read(&path).await.unwrap();
        assert_eq!(file.name, "transactions.csv");
        assert_eq!(file.len(), 17);
        assert_eq!(file.upload_id().len(), 12);
    }

    #[tokio::test]
    async fn test_read_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(SelectedFile::read(&dir.path().join("nope.csv")).await.is_err());
    }
}
