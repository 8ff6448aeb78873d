use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qr_scan::decoder::QrDecoder;
use qr_scan::detector::{locate, resolve};
use qr_scan::synth::{RenderOptions, encode_symbol, place_on_canvas, rasterize};
use qr_scan::{ECLevel, ImageBuffer, MaskPattern, ModuleMatrix, QrPipeline, Version, binarize};

fn symbol(version: u8) -> ModuleMatrix {
    let version = Version::new(version).unwrap();
    encode_symbol(
        b"https://example.com/benchmark",
        version,
        ECLevel::L,
        MaskPattern::from_bits(2),
    )
    .unwrap()
}

fn scene(version: u8, width: usize, height: usize) -> ImageBuffer {
    let rendered = rasterize(&symbol(version), &RenderOptions::default()).unwrap();
    let left = width.saturating_sub(rendered.width()) / 2;
    let top = height.saturating_sub(rendered.height()) / 2;
    place_on_canvas(&rendered, width, height, left, top).unwrap()
}

fn bench_pipeline_small(c: &mut Criterion) {
    let image = scene(2, 200, 200);
    let pipeline = QrPipeline::default();
    c.bench_function("pipeline_v2_200x200", |b| {
        b.iter(|| pipeline.run(black_box(&image)))
    });
}

fn bench_pipeline_medium(c: &mut Criterion) {
    let image = scene(8, 640, 480);
    let pipeline = QrPipeline::default();
    c.bench_function("pipeline_v8_640x480", |b| {
        b.iter(|| pipeline.run(black_box(&image)))
    });
}

fn bench_pipeline_empty(c: &mut Criterion) {
    let image = ImageBuffer::from_luma(640, 480, vec![128u8; 640 * 480]).unwrap();
    let pipeline = QrPipeline::default();
    c.bench_function("pipeline_empty_640x480", |b| {
        b.iter(|| pipeline.run(black_box(&image)))
    });
}

fn bench_locate_medium(c: &mut Criterion) {
    let grid = binarize(&scene(8, 640, 480), None);
    c.bench_function("locate_640x480", |b| b.iter(|| locate(black_box(&grid))));
}

fn bench_resolve(c: &mut Criterion) {
    let candidates = locate(&binarize(&scene(4, 320, 320), None));
    c.bench_function("resolve_v4", |b| b.iter(|| resolve(black_box(&candidates))));
}

fn bench_decode_matrix(c: &mut Criterion) {
    let matrix = symbol(8);
    let decoder = QrDecoder::default();
    c.bench_function("decode_matrix_v8", |b| {
        b.iter(|| decoder.decode_matrix(black_box(&matrix)))
    });
}

criterion_group!(
    benches,
    bench_pipeline_small,
    bench_pipeline_medium,
    bench_pipeline_empty,
    bench_locate_medium,
    bench_resolve,
    bench_decode_matrix
);
criterion_main!(benches);
