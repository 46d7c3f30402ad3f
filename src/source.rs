use crate::error::{InputError, NewsletterError};
use crate::units::Pt;
use lopdf::{Object, ObjectId};

/// US Letter, used when a page declares no usable MediaBox
const DEFAULT_PAGE_SIZE: (Pt, Pt) = (Pt(612.0), Pt(792.0));

/// How far up the page tree a MediaBox is looked for before giving up
const MAX_TREE_DEPTH: usize = 32;

/// One page of the previous issue
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    /// 1-based page number
    pub number: u32,
    pub width: Pt,
    pub height: Pt,
    pub text: String,
}

/// The previous issue of the newsletter: the plain text used as the style
/// reference for generation, and the page sizes the new issue is laid out on.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub pages: Vec<SourcePage>,
}

impl SourceDocument {
    /// Parse a PDF and pull out the text and size of every page
    pub fn from_bytes(bytes: &[u8]) -> Result<SourceDocument, NewsletterError> {
        let doc = lopdf::Document::load_mem(bytes)?;
        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(InputError::NoPages.into());
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for (number, id) in page_ids {
            let (width, height) = media_box(&doc, id).unwrap_or_else(|| {
                log::warn!("page {number} has no usable MediaBox, assuming US Letter");
                DEFAULT_PAGE_SIZE
            });
            let text = doc.extract_text(&[number])?;
            pages.push(SourcePage {
                number,
                width,
                height,
                text,
            });
        }

        log::info!(
            "read {} pages ({} characters of text) from the source PDF",
            pages.len(),
            pages.iter().map(|p| p.text.len()).sum::<usize>()
        );

        Ok(SourceDocument { pages })
    }

    /// All page text, each page followed by a newline
    pub fn text(&self) -> String {
        self.pages.iter().fold(String::new(), |mut text, page| {
            text.push_str(&page.text);
            text.push('\n');
            text
        })
    }

    /// Width and height of every page, in order
    pub fn page_sizes(&self) -> Vec<(Pt, Pt)> {
        self.pages.iter().map(|p| (p.width, p.height)).collect()
    }
}

/// Find the page's MediaBox, following `Parent` links for inherited values
fn media_box(doc: &lopdf::Document, page_id: ObjectId) -> Option<(Pt, Pt)> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(media_box) = node.get(b"MediaBox") {
            let (_, media_box) = doc.dereference(media_box).ok()?;
            let values = media_box
                .as_array()
                .ok()?
                .iter()
                .map(|v| v.as_float().ok())
                .collect::<Option<Vec<f32>>>()?;
            return match values[..] {
                [x0, y0, x1, y1] => Some((Pt((x1 - x0).abs()), Pt((y1 - y0).abs()))),
                _ => None,
            };
        }

        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}
