use criterion::{
    AxisScale, BenchmarkId, Criterion, PlotConfiguration, criterion_group, criterion_main,
};
use palettize::{CompressOptions, InputImage, compress, remap, rng};
use rand::Rng;

struct Size {
    label: &'static str,
    width: u32,
    height: u32,
}

const SIZES: &[Size] = &[
    Size {
        label: "small",
        width: 100,
        height: 100,
    },
    Size {
        label: "medium",
        width: 1000,
        height: 1500,
    },
    Size {
        label: "large",
        width: 2796,
        height: 1290,
    },
];

fn bench(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);

    let buffers: Vec<Vec<u8>> = SIZES
        .iter()
        .map(|size| {
            let len = size.width as usize * size.height as usize * 3;
            let mut buf = vec![0u8; len];
            rng::new().fill_bytes(&mut buf);
            buf
        })
        .collect();

    let options = CompressOptions {
        iterations: 1,
        ..Default::default()
    };
    let compressed: Vec<_> = SIZES
        .iter()
        .zip(buffers.iter())
        .map(|(size, buf)| {
            let input = InputImage::from_bytes(size.width, size.height, buf).unwrap();
            compress(input, &options).unwrap()
        })
        .collect();

    let mut group = c.benchmark_group("remap");
    group.plot_config(plot_config);

    for (size, out) in SIZES.iter().zip(compressed.iter()) {
        group.bench_with_input(BenchmarkId::from_parameter(size.label), out, |b, out| {
            b.iter_with_large_drop(|| {
                let palette = remap::palette(&out.centroids);
                remap::to_bytes(&remap::remap(&out.assignments, &palette).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
