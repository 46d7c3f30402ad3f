//! Page layout: working out where text can go once images are on a page, and
//! flowing paragraphs into that space.
//!
//! Layout happens in two steps per page:
//!
//! - [`compute_regions`](crate::layout::compute_regions) carves the margin-inset
//!   page into ordered [`TextRegion`](crate::layout::TextRegion)s around the
//!   placed images (above, left, right, then whatever remains below).
//! - [`flow`](crate::layout::flow) (or a [`FlowCursor`](crate::layout::FlowCursor)
//!   driven one paragraph at a time) stacks paragraphs into those regions in
//!   order, moving to the next region when one fills up and stopping when none
//!   are left.
//!
//! All coordinates are in page space: origin at the top-left corner, y growing
//! downwards.

mod flow;
mod regions;

pub use flow::*;
pub use regions::*;
