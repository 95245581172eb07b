//! Hand-built PDFs for extraction and ingestion tests.
//!
//! Every document has a catalog, a page tree, one Helvetica font, and a
//! (page, content stream) object pair per page. Offsets in the xref table
//! are exact, so `lopdf` loads them without repair.

#![allow(dead_code)]

/// Content stream whose `Tf` operator has no font operand. Text
/// extraction fails for any page drawn with it.
pub const UNDECODABLE_STREAM: &str = "BT Tf 72 720 Td (lost words) Tj ET";

/// Content stream drawing `text` at the top of the page.
pub fn text_stream(text: &str) -> String {
    format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text)
}

/// One page per entry of `pages`, each drawing its text.
pub fn minimal_pdf(pages: &[&str]) -> Vec<u8> {
    let streams: Vec<String> = pages.iter().map(|text| text_stream(text)).collect();
    pdf_with_streams(&streams)
}

/// One page per raw content stream.
pub fn pdf_with_streams(streams: &[String]) -> Vec<u8> {
    let n = streams.len();
    // objects: 1 catalog, 2 pages, 3 font, then (page, content) pairs
    let kids = (0..n)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, n),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (i, stream) in streams.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}
