//! Tensor construction for model inference.
//!
//! Two entry points: a synthetic placeholder tensor used to exercise the
//! execution path, and an image tensor normalized with the ImageNet
//! per-channel statistics the classification models were trained with.

use crate::error::{BenchError, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Value every element of a synthetic tensor is filled with
pub const SYNTHETIC_FILL: f32 = 0.0;

/// Memory layout of a 4-d image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[1, C, H, W]`, one plane per channel
    #[default]
    Nchw,
    /// `[1, H, W, C]`, channels interleaved per pixel
    Nhwc,
}

impl TensorLayout {
    pub fn shape(&self, height: usize, width: usize, channels: usize) -> Vec<usize> {
        match self {
            TensorLayout::Nchw => vec![1, channels, height, width],
            TensorLayout::Nhwc => vec![1, height, width, channels],
        }
    }
}

/// Dense f32 buffer with an explicit shape.
///
/// Created right before an execution and dropped right after the output is
/// read; executors only ever borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Build a tensor, returning `None` when the buffer length does not match the shape
    pub fn from_parts(shape: Vec<usize>, data: Vec<f32>) -> Option<Self> {
        (shape.iter().product::<usize>() == data.len()).then_some(Self { shape, data })
    }

    /// Tensor filled with [`SYNTHETIC_FILL`]
    pub fn filled(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![SYNTHETIC_FILL; len],
        }
    }

    /// Placeholder input of `height * width * channels` elements
    pub fn synthetic(height: usize, width: usize, channels: usize, layout: TensorLayout) -> Self {
        Self::filled(layout.shape(height, width, channels))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Converts source images into normalized model input tensors
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    width: u32,
    height: u32,
    layout: TensorLayout,
}

impl ImagePreprocessor {
    pub fn new(width: u32, height: u32, layout: TensorLayout) -> Self {
        Self {
            width,
            height,
            layout,
        }
    }

    /// Target `(width, height)` after resizing
    pub fn target_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Resize, normalize and lay out an image as a `[1, ...]` tensor
    pub fn from_image(&self, image: &DynamicImage) -> Result<Tensor> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BenchError::TextureUnavailable(
                "source image has no pixels".to_string(),
            ));
        }

        let resized = if image.width() == self.width && image.height() == self.height {
            image.to_rgb8()
        } else {
            image
                .resize_exact(self.width, self.height, FilterType::Triangle)
                .to_rgb8()
        };

        let width = self.width as usize;
        let height = self.height as usize;
        let plane = width * height;
        let mut data = vec![0.0f32; 3 * plane];

        for (i, pixel) in resized.pixels().enumerate() {
            for c in 0..3 {
                let value = normalize(pixel[c], c);
                let index = match self.layout {
                    TensorLayout::Nchw => c * plane + i,
                    TensorLayout::Nhwc => i * 3 + c,
                };
                data[index] = value;
            }
        }

        Ok(Tensor {
            shape: self.layout.shape(height, width, 3),
            data,
        })
    }

    /// Decode an image file and convert it
    pub fn from_path(&self, path: &std::path::Path) -> Result<Tensor> {
        let image = image::open(path).map_err(|e| {
            BenchError::TextureUnavailable(format!("{}: {}", path.display(), e))
        })?;
        self.from_image(&image)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(224, 224, TensorLayout::default())
    }
}

#[inline]
fn normalize(raw: u8, channel: usize) -> f32 {
    (raw as f32 / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
}
