use crate::{
    font::BuiltinFont,
    image::Image,
    info::Info,
    page::Page,
    refs::{ObjectReferences, RefType},
};
use id_arena::{Arena, Id};
use pdf_writer::{Pdf, Ref};
use std::io::Write;

#[derive(Default)]
/// A document is the main object that stores all the contents of the PDF
/// then renders it out with a call to [Document::write]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub images: Arena<Image>,
}

impl Document {
    /// Sets information about the document. If not provided, no information block will be
    /// written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Add a page to the end of the document
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        let id = self.pages.alloc(page);
        self.page_order.push(id);
        id
    }

    /// Add an image to the document. Images are stored once per document and
    /// can be placed on any number of pages through the returned id.
    pub fn add_image(&mut self, image: Image) -> Id<Image> {
        self.images.alloc(image)
    }

    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    /// Pages in document order
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page_order.iter().filter_map(|id| self.pages.get(*id))
    }

    /// Every font used anywhere in the document
    fn fonts(&self) -> Vec<BuiltinFont> {
        let mut fonts: Vec<BuiltinFont> = self.pages().flat_map(|p| p.fonts()).collect();
        fonts.sort_by_key(|f| f.index());
        fonts.dedup();
        fonts
    }

    /// Write the entire document to the writer. The whole document is rendered in memory
    /// first, so the writer only ever sees one `write_all`.
    pub fn write<W: Write>(self, mut w: W) -> Result<(), std::io::Error> {
        let bytes = self.to_bytes()?;
        w.write_all(bytes.as_slice())
    }

    /// Render the document to PDF bytes
    pub fn to_bytes(self) -> Result<Vec<u8>, std::io::Error> {
        let fonts = self.fonts();
        let Document {
            info,
            pages,
            page_order,
            images,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        let page_refs: Vec<Ref> = (0..page_order.len())
            .map(|i| refs.gen(RefType::Page(i)))
            .collect();

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        for font in fonts {
            font.write(&mut refs, &mut writer);
        }

        for (id, image) in images.iter() {
            image.write(&mut refs, id.index(), &mut writer);
        }

        for (page_index, id) in page_order.iter().enumerate() {
            if let Some(page) = pages.get(*id) {
                page.write(&mut refs, page_index, &images, &mut writer)?;
            }
        }

        writer.catalog(catalog_id).pages(page_tree_id);

        Ok(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::colours;
    use crate::page::{ImageLayout, TextLayout};
    use crate::rect::Rect;
    use crate::units::Pt;

    #[test]
    fn writes_a_readable_pdf() {
        let mut doc = Document::default();
        doc.set_info(Info::for_issue("Dahlia Wood", "October 2026"));
        let image_id = doc.add_image(Image::from_dynamic(image::DynamicImage::new_rgba8(4, 2)));

        let mut first = Page::new(Pt(612.0), Pt(792.0));
        first.add_image(ImageLayout {
            image_id,
            position: Rect::new(Pt(262.0), Pt(50.0), Pt(562.0), Pt(200.0)),
        });
        first.add_text(TextLayout {
            position: (Pt(50.0), Pt(250.0)),
            lines: vec!["Welcome to the October issue".into()],
            font: BuiltinFont::Helvetica,
            size: Pt(11.0),
            line_height: Pt(13.2),
            colour: colours::BLACK,
        });
        doc.add_page(first);
        doc.add_page(Page::new(Pt(612.0), Pt(792.0)));
        assert_eq!(doc.page_count(), 2);

        let bytes = doc.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Helvetica"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("/SMask"));
    }
}
