#![allow(dead_code)]

use ::pdfxref::Document;
use ::pdfxref::MemorySource;
use ::pdfxref::ParseOptions;

pub const CATALOG: &[u8] = b"<</Type /Catalog /Pages 2 0 R>>";
pub const PAGES: &[u8] = b"<</Type /Pages /Kids [3 0 R] /Count 1>>";
pub const PAGE: &[u8] = b"<</Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R>>";
pub const CONTENTS: &[u8] = b"<</Length 43>>\nstream\nBT /F1 12 Tf 72 712 Td (Hello, world) Tj ET\nendstream";

/// A single revision file with a classic cross-reference table. Objects
/// are numbered from 1 in order. Returns the file, the object offsets and
/// the offset of the table.
pub fn build_file(objects: &[&[u8]]) -> (Vec<u8>, Vec<usize>, usize) {
    let mut file = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(file.len());
        file.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        file.extend_from_slice(object);
        file.extend_from_slice(b"\nendobj\n");
    }
    let xref = file.len();
    file.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    file.extend_from_slice(b"0000000000 65535 f\r\n");
    for offset in &offsets {
        file.extend_from_slice(format!("{:010} 00000 n\r\n", offset).as_bytes());
    }
    file.extend_from_slice(
        format!(
            "trailer\n<</Size {} /Root 1 0 R>>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    (file, offsets, xref)
}

/// A one page document.
pub fn sample() -> Vec<u8> {
    build_file(&[CATALOG, PAGES, PAGE, CONTENTS]).0
}

pub fn open(file: Vec<u8>, options: ParseOptions) -> Document {
    Document::open(MemorySource::from(file), options).unwrap()
}
