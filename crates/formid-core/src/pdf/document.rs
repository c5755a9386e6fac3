//! PDF page access using lopdf and pdf-extract.

use std::panic::{AssertUnwindSafe, catch_unwind};

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::Result;
use crate::error::PdfError;

/// A loaded PDF with access to individual pages.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    ///
    /// Documents encrypted with an empty user password are decrypted in place;
    /// any other encryption is rejected.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract parses from bytes, so it needs the decrypted copy
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document, raw_data })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// The (decrypted) bytes the document was parsed from.
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.document
    }

    /// Object id of a 1-indexed page.
    pub(crate) fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Extract the embedded text layer of a single 1-indexed page.
    ///
    /// pdf-extract is tried first since it handles font encodings better;
    /// lopdf's content-stream extraction is used when it fails or returns
    /// nothing.
    pub fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;

        let index = (page - 1) as usize;
        let extracted = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
        }));

        match extracted {
            Ok(Ok(pages)) => {
                if let Some(text) = pages.into_iter().nth(index) {
                    if !text.trim().is_empty() {
                        trace!("pdf-extract returned {} chars for page {}", text.len(), page);
                        return Ok(text);
                    }
                }
                debug!("pdf-extract found no text on page {}", page);
            }
            Ok(Err(e)) => debug!("pdf-extract failed: {}", e),
            Err(_) => warn!("pdf-extract panicked on malformed PDF, trying lopdf"),
        }

        self.document
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Decode the image XObjects drawn on a 1-indexed page.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let page_id = self.page_id(page)?;
        let doc = &self.document;
        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.decode_image_object(obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    fn decode_image_object(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceGray");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        decode_raw_image(&data, width, height, color_space, bits)
    }

    /// Resources dictionary for a page, following /Parent inheritance.
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let doc = &self.document;
        let mut node_id = page_id;

        // Page trees are shallow; the bound guards against reference cycles.
        for _ in 0..32 {
            let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
                return None;
            };

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                    return Some(res_dict.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
        None
    }
}

fn decode_raw_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);

    match (color_space, bits_per_component) {
        (b"DeviceRGB" | b"RGB", 8) if data.len() >= pixels * 3 => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        (b"DeviceGray" | b"G", 8) if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        (b"DeviceGray" | b"G", 1) => {
            // Rows are padded to a whole byte; a set bit is white.
            let row_bytes = (width as usize).div_ceil(8);
            if data.len() < row_bytes * height as usize {
                return None;
            }
            let img = GrayImage::from_fn(width, height, |x, y| {
                let byte = data[y as usize * row_bytes + (x as usize) / 8];
                let bit = (byte >> (7 - (x % 8))) & 1;
                Luma([if bit == 1 { 255 } else { 0 }])
            });
            Some(DynamicImage::ImageLuma8(img))
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={:?}, bits={}, data_len={}",
                String::from_utf8_lossy(color_space),
                bits_per_component,
                data.len()
            );
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    /// Build a single-page PDF whose text layer holds the given lines.
    pub(crate) fn text_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![50.into(), 750.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Build a PDF whose page tree has no kids.
    pub(crate) fn empty_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Build a single-page PDF drawing 8-bit DeviceGray images of the given sizes.
    pub(crate) fn image_pdf(sizes: &[(u32, u32)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut xobjects = Dictionary::new();
        let mut operations = Vec::new();
        for (i, &(width, height)) in sizes.iter().enumerate() {
            let name = format!("Im{}", i + 1);
            let pixels = vec![(i as u8 + 1) * 40; (width * height) as usize];
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                pixels,
            ));
            xobjects.set(name.as_bytes().to_vec(), image_id);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = PdfDocument::load(b"this is not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_empty_page_tree() {
        let err = PdfDocument::load(&empty_pdf()).err().unwrap();
        assert!(matches!(err, PdfError::NoPages));
        assert_eq!(err.to_string(), "PDF has no pages");
    }

    #[test]
    fn test_load_rejects_password_protected() {
        let mut doc = Document::load_mem(&text_pdf(&["Form I-485"])).unwrap();
        // lopdf has no handler for revision 6 (AES-256)
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 5,
            "R" => 6,
            "Length" => 256,
            "P" => -4,
            "O" => Object::string_literal(vec![0u8; 48]),
            "U" => Object::string_literal(vec![0u8; 48]),
        });
        doc.trailer.set("Encrypt", encrypt_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let err = PdfDocument::load(&bytes).err().unwrap();
        assert!(matches!(err, PdfError::Encrypted));
    }

    #[test]
    fn test_page_images_decodes_gray_xobjects() {
        let doc = PdfDocument::load(&image_pdf(&[(4, 4), (8, 6)])).unwrap();
        let images = doc.page_images(1).unwrap();

        let mut sizes: Vec<(u32, u32)> = images.iter().map(|img| (img.width(), img.height())).collect();
        sizes.sort();
        assert_eq!(sizes, vec![(4, 4), (8, 6)]);
    }

    #[test]
    fn test_load_and_page_count() {
        let bytes = text_pdf(&["Form I-485"]);
        let doc = PdfDocument::load(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(matches!(doc.page_text(2), Err(PdfError::InvalidPage(2))));
    }

    #[test]
    fn test_page_text() {
        let bytes = text_pdf(&["Form I-485", "A-Number: 123 456 789"]);
        let doc = PdfDocument::load(&bytes).unwrap();
        let text = doc.page_text(1).unwrap();
        assert!(text.contains("I-485"));
        assert!(text.contains("123 456 789"));
    }

    #[test]
    fn test_text_page_has_no_images() {
        let bytes = text_pdf(&["Form I-485"]);
        let doc = PdfDocument::load(&bytes).unwrap();
        assert!(doc.page_images(1).unwrap().is_empty());
    }

    #[test]
    fn test_decode_one_bit_gray() {
        // 10 pixels wide => 2 bytes per row
        let data = [0b1010_1010, 0b1100_0000, 0xFF, 0xFF];
        let img = decode_raw_image(&data, 10, 2, b"DeviceGray", 1).unwrap().to_luma8();

        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(1, 0)[0], 0);
        assert_eq!(img.get_pixel(8, 0)[0], 255);
        assert_eq!(img.get_pixel(9, 0)[0], 255);
        assert_eq!(img.get_pixel(9, 1)[0], 255);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        assert!(decode_raw_image(&[0u8; 5], 4, 4, b"DeviceRGB", 8).is_none());
    }
}
