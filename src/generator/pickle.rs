//! Binary snapshot of a frozen manual.
//!
//! Layout: the [`MAGIC`] header, then a gzip stream holding the manual as
//! JSON. [`read`] restores a manual equal to the one written.

use crate::error::{RefmanError, Result};
use crate::generator::Generator;
use crate::model::ReferenceManual;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// File signature plus format version.
pub const MAGIC: &[u8] = b"REFMAN\x00\x01";

pub struct PickleGenerator<'a> {
    manual: &'a ReferenceManual,
    out: PathBuf,
}

impl<'a> PickleGenerator<'a> {
    pub fn new(manual: &'a ReferenceManual, out: &Path) -> Self {
        Self {
            manual,
            out: out.to_path_buf(),
        }
    }
}

impl Generator for PickleGenerator<'_> {
    fn generate(&mut self) -> Result<()> {
        write(self.manual, &self.out)
    }
}

pub fn write(manual: &ReferenceManual, path: &Path) -> Result<()> {
    let bytes = encode(manual, path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RefmanError::io(parent, e))?;
    }
    fs::write(path, &bytes).map_err(|e| RefmanError::io(path, e))?;
    info!(path = %path.display(), bytes = bytes.len(), "manual pickled");
    Ok(())
}

pub fn read(path: &Path) -> Result<ReferenceManual> {
    let bytes = fs::read(path).map_err(|e| RefmanError::io(path, e))?;
    decode(&bytes, path)
}

fn encode(manual: &ReferenceManual, path: &Path) -> Result<Vec<u8>> {
    let fail = |message: String| RefmanError::Pickle {
        path: path.to_path_buf(),
        message,
    };
    let mut encoder = GzEncoder::new(MAGIC.to_vec(), Compression::default());
    serde_json::to_writer(&mut encoder, manual).map_err(|e| fail(e.to_string()))?;
    encoder.finish().map_err(|e| RefmanError::io(path, e))
}

fn decode(bytes: &[u8], path: &Path) -> Result<ReferenceManual> {
    let fail = |message: String| RefmanError::Pickle {
        path: path.to_path_buf(),
        message,
    };
    let body = bytes
        .strip_prefix(MAGIC)
        .ok_or_else(|| fail("not a reference manual pickle".to_string()))?;
    let mut json = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut json)
        .map_err(|e| fail(format!("corrupt pickle: {}", e)))?;
    serde_json::from_slice(&json).map_err(|e| fail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use tempfile::TempDir;

    fn manual() -> ReferenceManual {
        let mut builder = ManualBuilder::new();
        let origin = Path::new("test.yaml");
        builder
            .add_module(
                Module {
                    info: SymbolInfo {
                        name: "fs".to_string(),
                        summary: "Files.".to_string(),
                        since: Some("0.53.0".parse().unwrap()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                origin,
            )
            .unwrap();
        let mut copy = Function {
            info: SymbolInfo {
                name: "copy".to_string(),
                summary: "Copy a file.".to_string(),
                ..Default::default()
            },
            module: Some("fs".to_string()),
            ..Default::default()
        };
        copy.signature.returns = "list[file] | void".parse().unwrap();
        builder.add_function(copy, origin).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn written_manual_reads_back_equal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/manual.bin");
        let original = manual();

        write(&original, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(MAGIC));

        let restored = read(&path).unwrap();
        assert_eq!(restored, original);
        assert!(restored.anchor(&"fs::copy".parse().unwrap()).is_some());
    }

    #[test]
    fn foreign_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manual.bin");
        fs::write(&path, b"not a pickle").unwrap();
        assert!(matches!(read(&path).unwrap_err(), RefmanError::Pickle { .. }));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manual.bin");
        write(&manual(), &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..MAGIC.len() + 8]).unwrap();
        assert!(matches!(read(&path).unwrap_err(), RefmanError::Pickle { .. }));
    }
}
