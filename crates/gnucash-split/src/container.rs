//! Reading and writing ledger files, gzip-compressed or not.

use std::fs::File;
use std::io::{BufWriter, Read as _, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::Result;
use crate::document::Document;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    None,
}

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

pub fn read_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    if is_gzip(&bytes) {
        let mut xml = Vec::new();
        GzDecoder::new(bytes.as_slice()).read_to_end(&mut xml)?;
        Document::read(xml.as_slice())
    } else {
        Document::read(bytes.as_slice())
    }
}

pub fn write_document(document: &Document, path: &Path, compression: Compression) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    match compression {
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(file, flate2::Compression::default());
            document.write(&mut encoder)?;
            encoder.finish()?.flush()?;
        }
        Compression::None => {
            document.write(&mut file)?;
            file.flush()?;
        }
    }
    Ok(())
}
