use criterion::{criterion_group, criterion_main, Criterion};
use image::Rgba;
use isoworld_core::image::{create_height, GBuffer, RgbaImage};
use isoworld_core::instance::{SpriteInstance, Transform3D};
use isoworld_core::math::{IVec2, IVec3, Vec3};
use isoworld_core::mesh::{DenseModel, Mesh};
use isoworld_core::ortho::OrthoSystem;
use isoworld_core::sprite::{SpriteFrame, SpriteType};
use isoworld_lanes::gbuffer::{draw_dense_model, draw_sprite, Higher, LinearNormals, NormalizedNormals};
use std::hint::black_box;

fn sprite_type() -> SpriteType {
    let frame = SpriteFrame {
        center_point: IVec2::new(32, 48),
        color: RgbaImage::from_pixel(64, 64, Rgba([200, 150, 100, 255])),
        normal: RgbaImage::from_pixel(64, 64, Rgba([128, 200, 200, 255])),
        height: create_height(64, 64, 0.5),
    };
    SpriteType {
        min_bound_mini: IVec3::new(-512, 0, -512),
        max_bound_mini: IVec3::new(512, 1024, 512),
        frames: vec![frame],
        shadow_model: None,
    }
}

/// A closed box of twelve triangles.
fn box_model() -> DenseModel {
    let points = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 != 0 { 1.0 } else { -1.0 },
                if i & 2 != 0 { 2.0 } else { 0.0 },
                if i & 4 != 0 { 1.0 } else { -1.0 },
            )
        })
        .collect();
    let faces = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    let triangles: Vec<[usize; 3]> = faces
        .iter()
        .flat_map(|f| [[f[0], f[1], f[2]], [f[0], f[2], f[3]]])
        .collect();
    DenseModel::from_mesh(&Mesh::from_triangles(points, &triangles, [0.8, 0.6, 0.4, 1.0]))
}

fn bench_kernels(c: &mut Criterion) {
    let ortho = OrthoSystem::new(-0.5, 32.0).expect("valid ortho");
    let view = ortho.view(0);
    let sprite = sprite_type();
    let model = box_model();
    let mut target = GBuffer::new(512, 512);

    let mut group = c.benchmark_group("G-buffer kernels");

    group.bench_function("Sprite 64x64", |b| {
        let instance = SpriteInstance::new(0, IVec3::ZERO);
        b.iter(|| {
            target.clear(true);
            black_box(draw_sprite::<Higher>(
                &mut target,
                None,
                view,
                IVec2::new(256, 256),
                &sprite,
                &instance,
            ));
        });
    });

    group.bench_function("Dense box, linear normals", |b| {
        b.iter(|| {
            target.clear(true);
            black_box(draw_dense_model::<Higher, LinearNormals>(
                &mut target,
                None,
                view,
                IVec2::new(256, 256),
                &model,
                &Transform3D::IDENTITY,
            ));
        });
    });

    group.bench_function("Dense box, normalized normals", |b| {
        b.iter(|| {
            target.clear(true);
            black_box(draw_dense_model::<Higher, NormalizedNormals>(
                &mut target,
                None,
                view,
                IVec2::new(256, 256),
                &model,
                &Transform3D::IDENTITY,
            ));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_kernels);
criterion_main!(benches);
