//! Minimal PDF 1.4 writer for laid-out [`Document`]s.
//!
//! Two standard fonts (Helvetica, Helvetica-Bold), one optional RGB image
//! XObject, and one content stream per page.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::layout::{Document, Element, PAGE_HEIGHT, PAGE_WIDTH};

const MM_TO_PT: f64 = 72.0 / 25.4;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_REGULAR_ID: usize = 3;
const FONT_BOLD_ID: usize = 4;
const INFO_ID: usize = 5;
const IMAGE_ID: usize = 6;

static BLANK_PIXEL: [u8; 3] = [255, 255, 255];

/// Document Info dictionary values.
#[derive(Debug, Clone)]
pub struct DocInfo {
    pub title: String,
    pub created: chrono::DateTime<chrono::Local>,
}

impl DocInfo {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            created: chrono::Local::now(),
        }
    }

    /// `D:YYYYMMDDHHmmSS`
    fn creation_date(&self) -> String {
        self.created.format("D:%Y%m%d%H%M%S").to_string()
    }
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
    compress: bool,
}

impl PdfWriter {
    fn new(objects: usize, compress: bool) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: vec![0; objects],
            compress,
        }
    }

    fn object(&mut self, id: usize, body: &str) {
        self.offsets[id - 1] = self.buf.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    /// Write a stream object. `dict` holds the extra entries besides
    /// `/Length` and `/Filter`.
    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) -> std::io::Result<()> {
        let (data, filter) = if self.compress {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)?;
            (enc.finish()?, " /Filter /FlateDecode")
        } else {
            (data.to_vec(), "")
        };
        self.offsets[id - 1] = self.buf.len();
        self.buf.extend_from_slice(
            format!("{id} 0 obj\n<< {dict}/Length {}{filter} >>\nstream\n", data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(&data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        Ok(())
    }

    fn finish(mut self) -> Vec<u8> {
        let xref = self.buf.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            table.push_str(&format!("{offset:010} 00000 n \n"));
        }
        table.push_str(&format!(
            "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R /Info {INFO_ID} 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            self.offsets.len() + 1
        ));
        self.buf.extend_from_slice(table.as_bytes());
        self.buf
    }
}

/// Encode text as a WinAnsi literal string body, escaping delimiters.
/// Characters outside Latin-1 become `?`.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            c if (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Info-dictionary text: page-text escaping, ASCII only.
fn info_string(text: &str) -> String {
    pdf_string(text)
        .into_iter()
        .map(|b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

fn pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

/// PDF y axis runs bottom-up.
fn flip(y_mm: f64) -> f64 {
    pt(PAGE_HEIGHT - y_mm)
}

fn content_stream(elements: &[Element]) -> Vec<u8> {
    let mut out: Vec<u8> = b"0.5 w\n".to_vec();
    for element in elements {
        match element {
            Element::Text {
                x,
                y,
                size,
                bold,
                text,
            } => {
                let font = if *bold { "F2" } else { "F1" };
                out.extend_from_slice(
                    format!("BT /{font} {size:.1} Tf {:.2} {:.2} Td (", pt(*x), flip(*y)).as_bytes(),
                );
                out.extend_from_slice(&pdf_string(text));
                out.extend_from_slice(b") Tj ET\n");
            }
            Element::Image {
                x,
                y,
                width,
                height,
            } => {
                out.extend_from_slice(
                    format!(
                        "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im1 Do Q\n",
                        pt(*width),
                        pt(*height),
                        pt(*x),
                        flip(y + height)
                    )
                    .as_bytes(),
                );
            }
            Element::Rect {
                x,
                y,
                width,
                height,
            } => {
                out.extend_from_slice(
                    format!(
                        "{:.2} {:.2} {:.2} {:.2} re S\n",
                        pt(*x),
                        flip(y + height),
                        pt(*width),
                        pt(*height)
                    )
                    .as_bytes(),
                );
            }
        }
    }
    out
}

/// Serialize a document to PDF bytes.
pub fn encode(doc: &Document, info: &DocInfo, compress: bool) -> std::io::Result<Vec<u8>> {
    let first_page_id = IMAGE_ID + 1;
    let total = IMAGE_ID + 2 * doc.pages.len();
    let mut w = PdfWriter::new(total, compress);

    w.object(CATALOG_ID, &format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"));
    let kids: Vec<String> = (0..doc.pages.len())
        .map(|i| format!("{} 0 R", first_page_id + 2 * i))
        .collect();
    w.object(
        PAGES_ID,
        &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), doc.pages.len()),
    );
    w.object(
        FONT_REGULAR_ID,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    w.object(
        FONT_BOLD_ID,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );
    w.object(
        INFO_ID,
        &format!(
            "<< /Title ({}) /Producer (courtside) /CreationDate ({}) >>",
            info_string(&info.title),
            info.creation_date()
        ),
    );

    // The image slot is always allocated so page ids stay fixed; without a
    // chart it holds an empty 1x1 image nothing references.
    let (img_w, img_h, rgb) = match &doc.chart {
        Some(chart) => (chart.width, chart.height, chart.rgb.as_slice()),
        None => (1, 1, &BLANK_PIXEL[..]),
    };
    w.stream(
        IMAGE_ID,
        &format!(
            "/Type /XObject /Subtype /Image /Width {img_w} /Height {img_h} /ColorSpace /DeviceRGB /BitsPerComponent 8 "
        ),
        rgb,
    )?;

    let media_box = format!("[0 0 {:.2} {:.2}]", pt(PAGE_WIDTH), pt(PAGE_HEIGHT));
    for (i, page) in doc.pages.iter().enumerate() {
        let page_id = first_page_id + 2 * i;
        let content_id = page_id + 1;
        w.object(
            page_id,
            &format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox {media_box} \
                 /Resources << /Font << /F1 {FONT_REGULAR_ID} 0 R /F2 {FONT_BOLD_ID} 0 R >> \
                 /XObject << /Im1 {IMAGE_ID} 0 R >> >> /Contents {content_id} 0 R >>"
            ),
        );
        w.stream(content_id, "", &content_stream(&page.elements))?;
    }

    Ok(w.finish())
}
