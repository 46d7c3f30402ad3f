use crate::rect::Rect;
use crate::units::Pt;

/// Where a [TextRegion] sits relative to the image that produced it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegionKind {
    /// Full-width band between the previous content and the top of an image
    Above,
    /// Column to the left of an image, as tall as the image but never past the bottom margin
    Left,
    /// Column to the right of an image, as tall as the image but never past the bottom margin
    Right,
    /// Whatever is left of the page after the last image
    Remainder,
}

/// A rectangular area of a page that is free of images and can receive text.
/// The order regions are returned in is the order they are filled in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextRegion {
    pub rect: Rect,
    pub kind: RegionKind,
}

impl TextRegion {
    pub fn top(&self) -> Pt {
        self.rect.y0
    }

    pub fn bottom(&self) -> Pt {
        self.rect.y1
    }

    pub fn left(&self) -> Pt {
        self.rect.x0
    }
}

/// Calculates the text regions left on a page once the given images have been
/// placed on it.
///
/// The page is first inset by `margin`. Each image, in the order given, may then
/// contribute a band above it, a column to its left and a column to its right;
/// anything below an image stays available for the next image. After the last
/// image, the remaining space becomes a final region if it is taller than
/// `margin`. All comparisons are strict, so an image sitting exactly one margin
/// away from an edge produces no region on that side.
///
/// Regions for pages with several images may overlap each other; only the
/// single-image case is guaranteed to be overlap-free.
///
/// ```
/// use newsletter_gen::layout::{compute_regions, RegionKind};
/// use newsletter_gen::{Pt, Rect};
///
/// let page = Rect::from_size(Pt(800.0), Pt(1000.0));
/// let image = Rect::new(Pt(500.0), Pt(50.0), Pt(750.0), Pt(200.0));
/// let regions = compute_regions(page, Pt(50.0), &[image]);
///
/// assert_eq!(regions.len(), 2);
/// assert_eq!(regions[0].kind, RegionKind::Left);
/// assert_eq!(regions[1].kind, RegionKind::Remainder);
/// ```
pub fn compute_regions(page: Rect, margin: Pt, images: &[Rect]) -> Vec<TextRegion> {
    let mut available = page.inset(margin);
    let mut regions: Vec<TextRegion> = Vec::with_capacity(images.len() * 3 + 1);

    for image in images {
        if image.y0 > available.y0 + margin {
            regions.push(TextRegion {
                rect: Rect::new(
                    available.x0,
                    available.y0,
                    available.x1,
                    (image.y0 - margin).min(available.y1),
                ),
                kind: RegionKind::Above,
            });
        }

        // side columns stop at the bottom margin even if the image runs past it
        let side_bottom = image.y1.min(available.y1);
        if side_bottom > image.y0 {
            if image.x0 > available.x0 + margin {
                regions.push(TextRegion {
                    rect: Rect::new(available.x0, image.y0, image.x0 - margin, side_bottom),
                    kind: RegionKind::Left,
                });
            }

            if image.x1 < available.x1 - margin {
                regions.push(TextRegion {
                    rect: Rect::new(image.x1 + margin, image.y0, available.x1, side_bottom),
                    kind: RegionKind::Right,
                });
            }
        }

        // the space below this image is what's left for the next one
        available.y0 = image.y1 + margin;
    }

    if available.y1 - available.y0 > margin {
        regions.push(TextRegion {
            rect: available,
            kind: RegionKind::Remainder,
        });
    }

    log::debug!(
        "{} text regions around {} images: {:?}",
        regions.len(),
        images.len(),
        regions.iter().map(|r| r.kind).collect::<Vec<_>>()
    );

    regions
}
