mod common;

use ::pdfxref::Document;
use ::pdfxref::EntryState;
use ::pdfxref::Location;
use ::pdfxref::MemorySource;
use ::pdfxref::Name;
use ::pdfxref::Object;
use ::pdfxref::ParseOptions;
use ::pdfxref::Reference;

use self::common::build_file;
use self::common::open;
use self::common::CATALOG;
use self::common::CONTENTS;
use self::common::PAGE;
use self::common::PAGES;

#[test]
fn corrupt_startxref() {
    let (intact, _, xref) = build_file(&[CATALOG, PAGES, PAGE, CONTENTS]);
    let needle = format!("startxref\n{}\n", xref);
    let position = intact
        .windows(needle.len())
        .position(|window| window == needle.as_bytes())
        .unwrap();
    let mut corrupt = intact[..position].to_vec();
    corrupt.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref + 7).as_bytes());

    let mut expected = open(intact, ParseOptions::strict());
    let no_rebuild = ParseOptions::strict().set_rebuild(false);
    assert!(Document::open(MemorySource::from(corrupt.clone()), no_rebuild).is_err());
    let mut recovered = open(corrupt, ParseOptions::lenient());
    assert!(recovered.is_rebuilt());
    assert_eq!(recovered.ids(), expected.ids());
    for id in expected.ids() {
        assert_eq!(
            recovered.entry(id.object_number()),
            expected.entry(id.object_number())
        );
        let reference = Reference::from(id);
        assert_eq!(
            recovered.resolve(reference).unwrap(),
            expected.resolve(reference).unwrap()
        );
    }
    assert_eq!(recovered.trailer().root(), Some(Reference::new(1, 0)));
}

/// A classic table listing object 3 as free, and an /XRefStm stream
/// listing it in use.
fn hybrid() -> (Vec<u8>, usize) {
    let mut file = b"%PDF-1.5\n".to_vec();
    let mut offsets = Vec::new();
    for (number, object) in [
        (1, &b"<</Type /Catalog /Pages 2 0 R /Names 3 0 R>>"[..]),
        (2, &b"<</Type /Pages /Kids [] /Count 0>>"[..]),
        (3, &b"/Hybrid"[..]),
    ] {
        offsets.push(file.len());
        file.extend_from_slice(format!("{} 0 obj\n", number).as_bytes());
        file.extend_from_slice(object);
        file.extend_from_slice(b"\nendobj\n");
    }

    let stream = file.len();
    let third = offsets[2];
    let data = [1, (third >> 8) as u8, third as u8, 0];
    file.extend_from_slice(
        b"4 0 obj\n<</Type /XRef /Size 5 /W [1 2 1] /Index [3 1] /Length 4>>\nstream\n",
    );
    file.extend_from_slice(&data);
    file.extend_from_slice(b"\nendstream\nendobj\n");

    let xref = file.len();
    file.extend_from_slice(b"xref\n0 4\n0000000000 65535 f\r\n");
    file.extend_from_slice(format!("{:010} 00000 n\r\n", offsets[0]).as_bytes());
    file.extend_from_slice(format!("{:010} 00000 n\r\n", offsets[1]).as_bytes());
    file.extend_from_slice(b"0000000000 00000 f\r\n");
    file.extend_from_slice(
        format!(
            "trailer\n<</Size 5 /Root 1 0 R /XRefStm {}>>\nstartxref\n{}\n%%EOF\n",
            stream, xref
        )
        .as_bytes(),
    );
    (file, third)
}

#[test]
fn hybrid_file() {
    let (file, third) = hybrid();
    let mut document = open(file, ParseOptions::strict());
    assert!(!document.is_rebuilt());
    assert_eq!(
        document.entry(3),
        Some((0, EntryState::InUse, Location::Offset(third)))
    );
    assert_eq!(
        *document.resolve(Reference::new(3, 0)).unwrap(),
        Object::from(Name::from("Hybrid"))
    );
    assert_eq!(document.len(), 3);
}
