// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the classifier kernels at MNIST-sized shapes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_core::{linear, softmax, Shape, Tensor};

fn bench_linear(c: &mut Criterion) {
    let x = Tensor::full(Shape::new(vec![32, 28, 28]), 0.5);
    let w = Tensor::from_vec(
        Shape::matrix(128, 784),
        (0..128 * 784).map(|i| ((i % 17) as f32 - 8.0) * 0.01).collect(),
    )
    .unwrap();
    let b = vec![0.1f32; 128];

    c.bench_function("linear_32x784_to_128", |bench| {
        bench.iter(|| linear(black_box(&x.view()), black_box(&w.view()), Some(&b)).unwrap())
    });
}

fn bench_softmax(c: &mut Criterion) {
    let scores = Tensor::from_vec(
        Shape::matrix(32, 10),
        (0..320).map(|i| (i % 10) as f32 * 0.3).collect(),
    )
    .unwrap();
    let mut out = Tensor::zeros(Shape::matrix(32, 10));

    c.bench_function("softmax_32x10", |bench| {
        bench.iter(|| softmax(black_box(&scores.view()), &mut out).unwrap())
    });
}

criterion_group!(benches, bench_linear, bench_softmax);
criterion_main!(benches);
