//! # PDF Serializer
//!
//! Turns the display lists recorded by a [`RecordingCanvas`](crate::canvas::RecordingCanvas)
//! into a PDF 1.7 file. We write the raw bytes ourselves; the subset needed
//! here (Type1 standard fonts, text, stroked lines and image XObjects) is
//! small.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages
//! ...
//! xref                <- byte offset of each object
//! trailer             <- points to the catalog and info dictionary
//! %%EOF
//! ```
//!
//! Layout already works in PDF user space (origin bottom-left, y up), so
//! coordinates are written as recorded.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{CanvasPage, DrawOp};
use crate::error::{LayoutError, Result};
use crate::font::StandardFont;
use crate::image_loader::{self, ImagePixelData, JpegColorSpace, LoadedImage};
use crate::model::Metadata;
use crate::style::Color;

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font resource name index (`/F0`, `/F1`, ...) and object id.
    fonts: BTreeMap<StandardFont, (usize, usize)>,
    /// Image source to (`/ImN` index, object id).
    images: HashMap<String, (usize, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write recorded pages to a PDF byte vector.
    pub fn write(&self, pages: &[CanvasPage], metadata: &Metadata) -> Result<Vec<u8>> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            fonts: BTreeMap::new(),
            images: HashMap::new(),
        };

        // 0 = placeholder (objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.push(Vec::new());
        }

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages)?;

        let font_resources = self.build_font_resource_dict(&builder);
        let mut page_obj_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let xobjects = self.build_xobject_resource_dict(page, &builder);
            let resources = if xobjects.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.geometry.width(),
                page.geometry.height(),
                content_obj_id,
                resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_obj_ids.len()).into_bytes();

        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_pdf_string(subject));
        }
        info.push_str("/Producer (quire) >>");
        let info_obj_id = builder.push(info.into_bytes());

        log::debug!(
            "serializing {} pages, {} fonts, {} images",
            pages.len(),
            builder.fonts.len(),
            builder.images.len()
        );
        Ok(self.serialize(&builder, info_obj_id))
    }

    /// One Type1 font object per standard font drawn anywhere.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[CanvasPage]) {
        let mut used: BTreeSet<StandardFont> = pages
            .iter()
            .flat_map(|page| page.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { font, .. } => Some(*font),
                _ => None,
            })
            .collect();
        // Resources need at least one font even on text-free pages.
        if used.is_empty() {
            used.insert(StandardFont::default());
        }
        for (index, font) in used.into_iter().enumerate() {
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let obj_id = builder.push(font_dict.into_bytes());
            builder.fonts.insert(font, (index, obj_id));
        }
    }

    /// Load each distinct image source once and write it as an XObject.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[CanvasPage]) -> Result<()> {
        for page in pages {
            for op in &page.ops {
                let DrawOp::Image { src, .. } = op else {
                    continue;
                };
                if builder.images.contains_key(src) {
                    continue;
                }
                let image = image_loader::load_image(src).map_err(|reason| LayoutError::Image {
                    src: src.clone(),
                    reason,
                })?;
                let obj_id = Self::write_image_xobject(builder, &image);
                let index = builder.images.len();
                builder.images.insert(src.clone(), (index, obj_id));
            }
        }
        Ok(())
    }

    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, 6);
                    let mut smask: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed.len()
                    );
                    smask.extend_from_slice(&compressed);
                    smask.extend_from_slice(b"\nendstream");
                    builder.push(smask)
                });

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask_id.map(|id| format!(" /SMask {} 0 R", id)).unwrap_or_default();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }
        }
    }

    /// PDF operators for one page's display list.
    fn build_content_stream(&self, page: &CanvasPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for op in &page.ops {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    font,
                    font_size,
                    color,
                    text,
                } => {
                    let index = builder.fonts.get(font).map(|(index, _)| *index).unwrap_or(0);
                    let _ = writeln!(
                        stream,
                        "BT /F{} {:.2} Tf {} {:.2} {:.2} Td ({}) Tj ET",
                        index,
                        font_size,
                        Self::fill_color(*color),
                        x,
                        y,
                        Self::encode_text(text)
                    );
                }
                DrawOp::Line { width, x1, y1, x2, y2 } => {
                    let _ = writeln!(
                        stream,
                        "0 0 0 RG {:.2} w {:.2} {:.2} m {:.2} {:.2} l S",
                        width, x1, y1, x2, y2
                    );
                }
                DrawOp::Image {
                    src,
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some((index, _)) = builder.images.get(src) {
                        let _ = writeln!(
                            stream,
                            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im{} Do Q",
                            width, height, x, y, index
                        );
                    }
                }
            }
        }
        stream
    }

    fn fill_color(color: Color) -> String {
        format!("{:.3} {:.3} {:.3} rg", color.r, color.g, color.b)
    }

    fn build_font_resource_dict(&self, builder: &PdfBuilder) -> String {
        builder
            .fonts
            .values()
            .map(|(index, obj_id)| format!("/F{} {} 0 R", index, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `/ImN` entries for the images drawn on `page`.
    fn build_xobject_resource_dict(&self, page: &CanvasPage, builder: &PdfBuilder) -> String {
        let used: BTreeSet<(usize, usize)> = page
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { src, .. } => builder.images.get(src).copied(),
                _ => None,
            })
            .collect();
        used.iter()
            .map(|(index, obj_id)| format!("/Im{} {} 0 R", index, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
    }

    /// Encode `text` as a WinAnsi literal string body. Bytes above 0x7E are
    /// written as octal escapes so the content stream stays ASCII;
    /// characters outside the encoding become `?`.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match Self::unicode_to_winansi(ch) {
                Some(b'\\') => out.push_str("\\\\"),
                Some(b'(') => out.push_str("\\("),
                Some(b')') => out.push_str("\\)"),
                Some(byte) if byte < 0x7F => out.push(byte as char),
                Some(byte) => {
                    let _ = write!(out, "\\{:03o}", byte);
                }
                None => out.push('?'),
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}
