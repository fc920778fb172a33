//! Minimal PDF 1.4 writer for plain text listings.
//!
//! Uses the built-in Helvetica font with WinAnsi encoding, so characters outside
//! Latin-1 are replaced with `?`.

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN_LEFT: u32 = 56;
const FIRST_BASELINE: u32 = 780;
const TITLE_SIZE: u32 = 16;
const BODY_SIZE: u32 = 12;
const LEADING: u32 = 18;
pub const LINES_PER_PAGE: usize = 38;

/// Object numbers: catalog, page tree and font come first, then a
/// (page, content stream) pair per page.
const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;

fn page_id(index: usize) -> usize {
    4 + index * 2
}

fn content_id(index: usize) -> usize {
    5 + index * 2
}

/// Renders `title` followed by `lines`, paginating as needed.
/// An empty listing still yields one page carrying the title.
pub fn render_text_document(title: &str, lines: &[String]) -> Vec<u8> {
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![lines]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    let object_count = 3 + pages.len() * 2;

    let mut writer = Writer::new(object_count);

    writer.object(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
    );

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect();
    writer.object(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );

    writer.object(
        FONT_ID,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (index, page_lines) in pages.iter().enumerate() {
        writer.object(
            page_id(index),
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 {FONT_ID} 0 R >> >> /Contents {} 0 R >>",
                content_id(index)
            )
            .as_bytes(),
        );

        let stream = page_content(title, page_lines);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        writer.object(content_id(index), &body);
    }

    writer.finish(CATALOG_ID)
}

fn page_content(title: &str, lines: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(
        format!("BT\n/F1 {TITLE_SIZE} Tf\n{LEADING} TL\n{MARGIN_LEFT} {FIRST_BASELINE} Td\n").as_bytes(),
    );
    push_text(&mut out, title);
    out.extend_from_slice(format!("/F1 {BODY_SIZE} Tf\nT*\n").as_bytes());
    for line in lines {
        out.extend_from_slice(b"T*\n");
        push_text(&mut out, line);
    }
    out.extend_from_slice(b"ET");
    out
}

fn push_text(out: &mut Vec<u8>, text: &str) {
    out.push(b'(');
    out.extend(encode_text(text));
    out.extend_from_slice(b") Tj\n");
}

/// Escapes PDF string delimiters and maps the text to single-byte Latin-1.
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            ' '..='~' => out.push(ch as u8),
            '\u{a0}'..='\u{ff}' => out.push(ch as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

struct Writer {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl Writer {
    fn new(object_count: usize) -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: vec![0; object_count + 1],
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets[id] = self.buf.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len();
        self.buf
            .extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in &self.offsets[1..] {
            // each xref entry is exactly 20 bytes
            self.buf
                .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.buf.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        self.buf
    }
}
