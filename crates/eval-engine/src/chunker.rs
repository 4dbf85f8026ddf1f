// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Chunking an image sequence into bounded batches.
//!
//! Chunks are borrowed windows over the run's image slice, produced lazily
//! in order. Only the chunk being evaluated is ever stacked into a batch
//! buffer, so peak staging memory is one chunk regardless of dataset size.

use crate::EvalError;
use memory_manager::{BatchBuffer, MemoryBudget, StagingPool};
use tensor_core::{Shape, Tensor, TensorView};

/// A contiguous window of at most `chunk_size` images.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    index: usize,
    images: &'a [Tensor],
}

impl<'a> Chunk<'a> {
    /// Position of this chunk within the run.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn images(&self) -> &'a [Tensor] {
        self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Stacks the chunk into one `[k, ...image]` batch drawn from `pool`.
    ///
    /// All images must share the first image's shape.
    pub fn stage(&self, pool: &StagingPool) -> Result<StagedBatch, EvalError> {
        let first = self
            .images
            .first()
            .ok_or(EvalError::EmptyBatch { chunk: self.index })?;
        let image_shape = first.shape();

        if let Some((index, odd)) = self
            .images
            .iter()
            .enumerate()
            .find(|(_, img)| img.shape() != image_shape)
        {
            return Err(EvalError::ImageShape {
                chunk: self.index,
                index,
                expected: image_shape.clone(),
                actual: odd.shape().clone(),
            });
        }

        let shape = image_shape.batched(self.images.len());
        let buffer = pool.stage(self.images.iter().map(Tensor::as_slice), shape.num_elements())?;
        Ok(StagedBatch { shape, buffer })
    }
}

/// A stacked chunk. Dropping it returns the buffer to the pool.
#[derive(Debug)]
pub struct StagedBatch {
    shape: Shape,
    buffer: BatchBuffer,
}

impl StagedBatch {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn view(&self) -> Result<TensorView<'_>, EvalError> {
        Ok(TensorView::from_parts(self.shape.clone(), self.buffer.as_slice())?)
    }
}

/// Splits image sequences into chunks of a fixed maximum size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Fails with `InvalidConfiguration` if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self, EvalError> {
        if chunk_size == 0 {
            return Err(EvalError::InvalidConfiguration(
                "chunk_size must be at least 1".into(),
            ));
        }
        Ok(Self { chunk_size })
    }

    /// Like [`Chunker::new`], but shrinks the chunk size so that one stacked
    /// chunk of `image_shape` images fits in `budget`.
    pub fn with_budget(
        chunk_size: usize,
        budget: MemoryBudget,
        image_shape: &Shape,
    ) -> Result<Self, EvalError> {
        let requested = Self::new(chunk_size)?;
        let image_bytes = image_shape.num_elements() * std::mem::size_of::<f32>();
        let fits = budget.max_items(image_bytes);
        if fits == 0 {
            return Err(EvalError::InvalidConfiguration(format!(
                "memory budget {budget} cannot hold a single {image_shape} image"
            )));
        }
        if fits < chunk_size {
            tracing::info!(
                requested = chunk_size,
                capped = fits,
                "chunk size reduced to fit memory budget {budget}"
            );
            return Self::new(fits);
        }
        Ok(requested)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks `n` images split into.
    pub fn num_chunks(&self, n: usize) -> usize {
        n.div_ceil(self.chunk_size)
    }

    /// Lazily yields the chunks of `images` in order.
    ///
    /// Every chunk but the last holds exactly `chunk_size` images; the last
    /// holds the remainder. Empty input yields nothing.
    pub fn chunks<'a>(&self, images: &'a [Tensor]) -> impl Iterator<Item = Chunk<'a>> + 'a {
        images
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(index, images)| Chunk { index, images })
    }
}

/// Splits `images` into chunks of at most `chunk_size`.
pub fn chunk(
    images: &[Tensor],
    chunk_size: usize,
) -> Result<impl Iterator<Item = Chunk<'_>>, EvalError> {
    Ok(Chunker::new(chunk_size)?.chunks(images))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: usize) -> Vec<Tensor> {
        (0..n)
            .map(|i| Tensor::full(Shape::matrix(2, 2), i as f32))
            .collect()
    }

    #[test]
    fn test_chunk_sizes_with_remainder() {
        let imgs = images(100);
        let sizes: Vec<usize> = chunk(&imgs, 32).unwrap().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![32, 32, 32, 4]);
        assert_eq!(Chunker::new(32).unwrap().num_chunks(100), 4);
    }

    #[test]
    fn test_chunks_preserve_order_and_indices() {
        let imgs = images(7);
        let chunks: Vec<_> = chunk(&imgs, 3).unwrap().collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].index(), 2);
        let flat: Vec<f32> = chunks
            .iter()
            .flat_map(|c| c.images().iter().map(|t| t.as_slice()[0]))
            .collect();
        assert_eq!(flat, (0..7).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_chunks_cover_input_exactly_once() {
        for (n, size) in [(1, 1), (7, 1), (7, 3), (7, 7), (32, 32), (100, 32), (100, 100), (5, 64)] {
            let imgs = images(n);
            let chunks: Vec<_> = chunk(&imgs, size).unwrap().collect();
            assert_eq!(chunks.len(), n.div_ceil(size), "n={n} size={size}");
            for (i, c) in chunks.iter().enumerate() {
                assert_eq!(c.index(), i);
                assert!(!c.is_empty() && c.len() <= size);
                if i + 1 < chunks.len() {
                    assert_eq!(c.len(), size);
                }
            }
            let flat: Vec<f32> = chunks
                .iter()
                .flat_map(|c| c.images().iter().map(|t| t.as_slice()[0]))
                .collect();
            assert_eq!(flat, (0..n).map(|i| i as f32).collect::<Vec<_>>(), "n={n} size={size}");
        }
    }

    #[test]
    fn test_chunk_larger_than_input() {
        let imgs = images(5);
        let sizes: Vec<usize> = chunk(&imgs, 64).unwrap().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![5]);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert_eq!(chunk(&[], 8).unwrap().count(), 0);
        assert_eq!(Chunker::new(8).unwrap().num_chunks(0), 0);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            chunk(&images(3), 0).err(),
            Some(EvalError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_budget_caps_chunk_size() {
        // One 28x28 f32 image is 3136 bytes.
        let budget = MemoryBudget::from_bytes(3136 * 10);
        let c = Chunker::with_budget(32, budget, &Shape::matrix(28, 28)).unwrap();
        assert_eq!(c.chunk_size(), 10);

        let roomy = Chunker::with_budget(32, MemoryBudget::from_mb(1), &Shape::matrix(28, 28)).unwrap();
        assert_eq!(roomy.chunk_size(), 32);

        assert!(Chunker::with_budget(32, MemoryBudget::from_bytes(100), &Shape::matrix(28, 28)).is_err());
    }

    #[test]
    fn test_stage_stacks_images() {
        let pool = StagingPool::unbounded();
        let imgs = images(3);
        let c = chunk(&imgs, 3).unwrap().next().unwrap();
        let staged = c.stage(&pool).unwrap();
        assert_eq!(staged.shape(), &Shape::new(vec![3, 2, 2]));
        let view = staged.view().unwrap();
        assert_eq!(&view.as_slice()[4..8], &[1.0; 4]);
        drop(staged);
        assert_eq!(pool.allocated_bytes(), 0);
    }

    #[test]
    fn test_stage_rejects_mixed_shapes() {
        let pool = StagingPool::unbounded();
        let mut imgs = images(3);
        imgs[1] = Tensor::zeros(Shape::matrix(3, 3));
        let c = chunk(&imgs, 3).unwrap().next().unwrap();
        assert!(matches!(
            c.stage(&pool),
            Err(EvalError::ImageShape { index: 1, .. })
        ));
    }
}
