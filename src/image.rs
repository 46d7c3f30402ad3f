use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels")]
    Empty,
}

/// How the pixels end up in the PDF
pub enum RasterData {
    /// Baseline RGB JPEGs are embedded as-is
    DirectlyEmbeddableJpeg(Vec<u8>),
    /// Everything else is decoded and re-compressed
    Decoded(DynamicImage),
}

/// A decoded raster image, ready to be placed on pages
pub struct Image {
    pub data: RasterData,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

struct EncodeOutput {
    filter: Filter,
    bytes: Vec<u8>,
    mask: Option<Vec<u8>>,
}

impl Image {
    /// Decode an uploaded image (PNG, JPEG, or anything else the `image` crate
    /// can guess the format of)
    pub fn decode(bytes: &[u8]) -> Result<Image, ImageError> {
        let format = image::guess_format(bytes)?;
        let image = image::load_from_memory_with_format(bytes, format)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ImageError::Empty);
        }

        match (format, image.color()) {
            (ImageFormat::Jpeg, ColorType::Rgb8) => {
                // we can embed it directly!
                Ok(Image {
                    width: image.width(),
                    height: image.height(),
                    data: RasterData::DirectlyEmbeddableJpeg(bytes.to_vec()),
                })
            }
            _ => Ok(Image::from_dynamic(image)),
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Image {
        Image {
            width: image.width(),
            height: image.height(),
            data: RasterData::Decoded(image),
        }
    }

    /// Height over width
    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    /// Size of the image when scaled to `width`, keeping its aspect ratio
    pub fn scaled_to_width(&self, width: Pt) -> (Pt, Pt) {
        (width, width * self.aspect_ratio())
    }

    fn encode(&self) -> EncodeOutput {
        match &self.data {
            RasterData::DirectlyEmbeddableJpeg(bytes) => EncodeOutput {
                filter: Filter::DctDecode,
                bytes: bytes.clone(),
                mask: None,
            },
            RasterData::Decoded(image) => {
                let level = CompressionLevel::DefaultLevel as u8;

                let mask = image.color().has_alpha().then(|| {
                    let alphas: Vec<_> = image.pixels().map(|p| (p.2).0[3]).collect();
                    compress_to_vec_zlib(&alphas, level)
                });

                let bytes = compress_to_vec_zlib(image.to_rgb8().as_raw(), level);

                EncodeOutput {
                    filter: Filter::FlateDecode,
                    bytes,
                    mask,
                }
            }
        }
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, image_index: usize, writer: &mut Pdf) {
        let id = refs.gen(RefType::Image(image_index));
        let encoded = self.encode();

        let mut image = writer.image_xobject(id, encoded.bytes.as_slice());
        image.filter(encoded.filter);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);

        let mask_id = encoded
            .mask
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        // add a transparency mask if we have one
        if let (Some(mask_id), Some(mask)) = (mask_id, encoded.mask.as_ref()) {
            let mut s_mask = writer.image_xobject(mask_id, mask.as_slice());
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }
    }
}
