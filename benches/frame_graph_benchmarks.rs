use criterion::{Criterion, black_box, criterion_group, criterion_main};

use redlilium_framegraph::{
    CachingAllocator, DummyDriver, FrameGraph, RenderPassDescriptor, TextureDescriptor,
    TextureFormat, TextureId, TextureUsage,
};

fn desc() -> TextureDescriptor {
    TextureDescriptor::new_2d(1280, 720, TextureFormat::Rgba16Float)
}

/// `length` passes, each sampling the previous output into a new render target.
fn build_chain(length: usize) -> FrameGraph {
    let mut fg = FrameGraph::new();
    let mut previous: Option<TextureId> = None;
    for i in 0..length {
        let pass = fg.add_pass::<TextureId, _, _>(
            &format!("pass_{i}"),
            |builder, out| {
                if let Some(input) = previous {
                    builder.sample(input);
                }
                let created = builder.create(&format!("color_{i}"), desc());
                let (written, _) = builder.declare_color_render_pass(created);
                *out = written;
            },
            |resources, _, _| {
                black_box(resources.get_render_pass_info(0));
            },
        );
        previous = Some(*pass);
    }
    if let Some(output) = previous {
        fg.present(output);
    }
    fg
}

/// A gbuffer feeding lighting, plus passes nobody consumes.
fn build_deferred_with_dead_passes() -> FrameGraph {
    let mut fg = FrameGraph::new();
    let gbuffer = fg.add_pass::<(TextureId, TextureId), _, _>(
        "gbuffer",
        |builder, data| {
            let albedo = builder.create("albedo", desc());
            let depth = builder.create(
                "depth",
                TextureDescriptor::new_2d(1280, 720, TextureFormat::Depth32Float),
            );
            data.0 = builder.write(albedo, TextureUsage::COLOR_ATTACHMENT);
            data.1 = builder.write(depth, TextureUsage::DEPTH_ATTACHMENT);
            builder.declare_render_pass(
                "gbuffer",
                RenderPassDescriptor::new()
                    .with_color(0, data.0)
                    .with_depth(data.1),
            );
        },
        |_, _, _| {},
    );
    let (albedo, depth) = *gbuffer;
    for i in 0..8 {
        fg.add_pass::<TextureId, _, _>(
            &format!("debug_{i}"),
            |builder, out| {
                builder.sample(albedo);
                let created = builder.create(&format!("debug_{i}"), desc());
                *out = builder.write(created, TextureUsage::COLOR_ATTACHMENT);
            },
            |_, _, _| {},
        );
    }
    let lighting = fg.add_pass::<TextureId, _, _>(
        "lighting",
        |builder, out| {
            builder.sample(albedo);
            builder.sample(depth);
            let created = builder.create("lit", desc());
            let (written, _) = builder.declare_color_render_pass(created);
            *out = written;
        },
        |_, _, _| {},
    );
    fg.present(*lighting);
    fg
}

// ---------------------------------------------------------------------------
// Frame graph construction
// ---------------------------------------------------------------------------

fn bench_build_chain_small(c: &mut Criterion) {
    c.bench_function("frame_graph_build_4_passes", |b| {
        b.iter(|| black_box(build_chain(4)));
    });
}

fn bench_build_chain_large(c: &mut Criterion) {
    c.bench_function("frame_graph_build_64_passes_chain", |b| {
        b.iter(|| black_box(build_chain(64)));
    });
}

// ---------------------------------------------------------------------------
// Frame graph compilation
// ---------------------------------------------------------------------------

fn bench_compile_chain(c: &mut Criterion) {
    c.bench_function("frame_graph_compile_64_passes_chain", |b| {
        b.iter_with_setup(
            || build_chain(64),
            |mut fg| {
                fg.compile();
                black_box(fg);
            },
        );
    });
}

fn bench_compile_with_culling(c: &mut Criterion) {
    c.bench_function("frame_graph_compile_deferred_8_culled", |b| {
        b.iter_with_setup(build_deferred_with_dead_passes, |mut fg| {
            fg.compile();
            black_box(fg);
        });
    });
}

// ---------------------------------------------------------------------------
// Frame graph execution
// ---------------------------------------------------------------------------

fn bench_execute_chain(c: &mut Criterion) {
    let mut allocator = CachingAllocator::new();
    let mut driver = DummyDriver::new();

    c.bench_function("frame_graph_execute_16_passes_chain", |b| {
        b.iter_with_setup(
            || {
                let mut fg = build_chain(16);
                fg.compile();
                fg
            },
            |mut fg| {
                fg.execute(&mut allocator, &mut driver).unwrap();
                allocator.gc(&mut driver);
                driver.clear_commands();
            },
        );
    });

    allocator.terminate(&mut driver);
}

criterion_group!(
    benches,
    bench_build_chain_small,
    bench_build_chain_large,
    bench_compile_chain,
    bench_compile_with_culling,
    bench_execute_chain,
);
criterion_main!(benches);
