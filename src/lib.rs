//! Regenerates a monthly newsletter as a PDF.
//!
//! The previous issue is read with [SourceDocument], a [TextGenerator] drafts
//! the new issue's copy, and [compose] lays that copy out page by page around
//! the uploaded images: each page gets its image anchored to the top-right
//! corner, the remaining space is split into text regions, and paragraphs are
//! flowed through those regions in order. [NewsletterJob] strings the stages
//! together.

mod colour;
pub use colour::*;

mod compositor;
pub use compositor::*;

mod config;
pub use config::*;

mod document;
pub use document::*;

mod font;
pub use font::*;

/// Text generation service clients and the prompt they are sent
pub mod generate;
pub use generate::{GenerationRequest, TextGenerator};

mod image;
pub use self::image::*;

mod info;
pub use info::*;

/// Region calculation and paragraph flow
pub mod layout;

mod page;
pub use page::*;

mod pipeline;
pub use pipeline::*;

mod rect;
pub use rect::*;

pub(crate) mod refs;

mod source;
pub use source::*;

mod units;
pub use units::*;

mod error;
pub use error::*;

/// Re-export PDF-writer functionality, mostly for custom [pdf_writer::Content] generation
pub use pdf_writer;
