// --- Page geometry ---

/// Page dimensions in points, taken from the source deck's first page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        PageSize { width, height }
    }

    pub fn letter() -> Self {
        PageSize::new(612.0, 792.0)
    }

    /// 16:9 slide as exported by most presentation tools
    pub fn widescreen() -> Self {
        PageSize::new(960.0, 540.0)
    }
}

/// Format a coordinate for a content stream: at most three decimals, no
/// trailing zeros.
pub fn format_number(value: f32) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

// --- Low-level PDF object model ---

pub struct PdfGenerator {
    pub objects: Vec<PdfObj>,
    pub next_id: u32,
}

#[derive(Debug)]
pub struct PdfObj {
    pub id: u32,
    pub generation: u32,
    pub content: String,
    pub is_stream: bool,
    pub stream_data: Option<Vec<u8>>,
}

impl PdfGenerator {
    pub fn new() -> Self {
        PdfGenerator {
            objects: Vec::new(),
            next_id: 1,
        }
    }

    fn push(&mut self, content: String, stream_data: Option<Vec<u8>>) -> u32 {
        let id = self.next_id;
        self.objects.push(PdfObj {
            id,
            generation: 0,
            content,
            is_stream: stream_data.is_some(),
            stream_data,
        });
        self.next_id += 1;
        id
    }

    pub fn add_object(&mut self, content: String) -> u32 {
        self.push(content, None)
    }

    /// Add a stream object. `dictionary` holds the entries only; the
    /// generator wraps them and appends `/Length`.
    pub fn add_stream_object(&mut self, dictionary: String, data: Vec<u8>) -> u32 {
        self.push(dictionary, Some(data))
    }

    /// Allocate an id now and supply the object body later with
    /// [`PdfGenerator::set_object`]. Used for `/Parent` back-references.
    pub fn reserve_object(&mut self) -> u32 {
        self.push(String::from("null\n"), None)
    }

    pub fn set_object(&mut self, id: u32, content: String) {
        if let Some(obj) = self.objects.iter_mut().find(|o| o.id == id) {
            obj.content = content;
            obj.is_stream = false;
            obj.stream_data = None;
        }
    }

    pub fn generate(&self, root_id: u32) -> Vec<u8> {
        let mut pdf = Vec::new();

        // PDF header
        pdf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        // Objects are stored in id order, so the xref can be written sequentially
        let mut offsets = Vec::with_capacity(self.objects.len());
        for obj in &self.objects {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} {} obj\n", obj.id, obj.generation).as_bytes());

            match (&obj.stream_data, obj.is_stream) {
                (Some(data), true) => {
                    pdf.extend_from_slice(b"<<\n");
                    pdf.extend_from_slice(obj.content.as_bytes());
                    pdf.extend_from_slice(format!("/Length {}\n>>\n", data.len()).as_bytes());
                    pdf.extend_from_slice(b"stream\n");
                    pdf.extend_from_slice(data);
                    pdf.extend_from_slice(b"\nendstream\n");
                }
                _ => pdf.extend_from_slice(obj.content.as_bytes()),
            }

            pdf.extend_from_slice(b"endobj\n");
        }

        // xref table
        let xref_offset = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }

        // trailer
        pdf.extend_from_slice(b"trailer\n");
        pdf.extend_from_slice(b"<<\n");
        pdf.extend_from_slice(format!("/Size {}\n", self.objects.len() + 1).as_bytes());
        pdf.extend_from_slice(format!("/Root {} 0 R\n", root_id).as_bytes());
        pdf.extend_from_slice(b">>\n");
        pdf.extend_from_slice(b"startxref\n");
        pdf.extend_from_slice(format!("{}\n", xref_offset).as_bytes());
        pdf.extend_from_slice(b"%%EOF\n");

        pdf
    }
}

impl Default for PdfGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape text for a literal string inside a dictionary (URIs, titles)
pub fn escape_pdf_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}
