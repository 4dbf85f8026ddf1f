// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reader for the MNIST IDX3 image format (`t10k-images-idx3-ubyte`).
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! offset  size  field
//! 0       4     magic 0x00000803 (unsigned byte, 3 dimensions)
//! 4       4     number of images
//! 8       4     rows
//! 12      4     cols
//! 16      n·r·c pixel bytes, row-major
//! ```

use crate::SourceError;
use std::path::Path;
use std::sync::Arc;
use tensor_core::{Shape, Tensor};

const IDX3_MAGIC: u32 = 0x0000_0803;
const HEADER_LEN: usize = 16;

/// Decoded IDX3 images, scaled to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct IdxImages {
    rows: usize,
    cols: usize,
    images: Vec<Tensor>,
}

impl IdxImages {
    /// Reads and decodes an IDX3 file.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let images = Self::parse(&bytes)?;
        tracing::info!(
            "idx reader: {} images of {}×{} from '{}'",
            images.len(),
            images.rows,
            images.cols,
            path.display()
        );
        Ok(images)
    }

    /// Decodes an in-memory IDX3 buffer.
    pub fn parse(bytes: &[u8]) -> Result<Self, SourceError> {
        if bytes.len() < HEADER_LEN {
            return Err(SourceError::InvalidIdx(format!(
                "{} bytes is shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }
        let word = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        let magic = word(0);
        if magic != IDX3_MAGIC {
            return Err(SourceError::InvalidIdx(format!(
                "magic {magic:#010x}, expected {IDX3_MAGIC:#010x}"
            )));
        }
        let (count, rows, cols) = (word(4) as usize, word(8) as usize, word(12) as usize);
        if rows == 0 || cols == 0 {
            return Err(SourceError::InvalidIdx(format!("image dimensions {rows}×{cols}")));
        }
        let pixels = rows
            .checked_mul(cols)
            .ok_or_else(|| SourceError::InvalidIdx("dimensions overflow".into()))?;
        let expected = count
            .checked_mul(pixels)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| SourceError::InvalidIdx("dimensions overflow".into()))?;
        if bytes.len() < expected {
            return Err(SourceError::InvalidIdx(format!(
                "header declares {count} images of {rows}×{cols} ({expected} bytes) but file has {}",
                bytes.len()
            )));
        }

        let shape = Shape::matrix(rows, cols);
        let images = bytes[HEADER_LEN..expected]
            .chunks_exact(pixels)
            .take(count)
            .map(|px| {
                let values = px.iter().map(|&b| f32::from(b) / 255.0).collect();
                Tensor::from_vec(shape.clone(), values)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows, cols, images })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Shape of one image.
    pub fn image_shape(&self) -> Shape {
        Shape::matrix(self.rows, self.cols)
    }

    pub fn images(&self) -> &[Tensor] {
        &self.images
    }

    /// Converts into a shared base set for [`crate::AugmentedSource`].
    pub fn into_shared(self) -> Arc<[Tensor]> {
        self.images.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for word in [IDX3_MAGIC, count, rows, cols] {
            out.extend_from_slice(&word.to_be_bytes());
        }
        out.extend_from_slice(pixels);
        out
    }

    #[test]
    fn test_parse_scales_to_unit_range() {
        let bytes = encode(2, 2, 2, &[0, 255, 51, 102, 255, 255, 0, 0]);
        let idx = IdxImages::parse(&bytes).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.image_shape(), Shape::matrix(2, 2));
        assert_eq!(idx.images()[0].as_slice(), &[0.0, 1.0, 0.2, 0.4]);
        assert_eq!(idx.images()[1].as_slice(), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(1, 1, 1, &[0]);
        bytes[3] = 0x01;
        assert!(matches!(IdxImages::parse(&bytes), Err(SourceError::InvalidIdx(_))));
    }

    #[test]
    fn test_truncated() {
        let bytes = encode(3, 2, 2, &[0; 8]);
        let err = IdxImages::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("3 images"));
        assert!(IdxImages::parse(&[0, 0]).is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        for (rows, cols) in [(0, 28), (28, 0), (0, 0)] {
            let bytes = encode(5, rows, cols, &[]);
            let err = IdxImages::parse(&bytes).unwrap_err();
            assert!(matches!(err, SourceError::InvalidIdx(_)));
            assert!(err.to_string().contains("dimensions"));
        }
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t10k-images-idx3-ubyte");
        std::fs::write(&path, encode(1, 28, 28, &[128; 784])).unwrap();
        let idx = IdxImages::open(&path).unwrap();
        assert_eq!(idx.into_shared().len(), 1);
    }

    #[test]
    fn test_open_missing() {
        assert!(matches!(
            IdxImages::open(Path::new("/nonexistent/idx")),
            Err(SourceError::Io { .. })
        ));
    }
}
