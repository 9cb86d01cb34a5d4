extern crate rand;
extern crate trellis;

use rand::{Rng, SeedableRng, XorShiftRng};

use trellis::prelude::*;
use trellis::renderer::cache::StateCache;

fn program(index: u32) -> ProgramHandle {
    Handle::new(index, 1).into()
}

fn texture(index: u32) -> TextureHandle {
    Handle::new(index, 1).into()
}

fn buffer(index: u32) -> BufferHandle {
    Handle::new(index, 1).into()
}

fn random_snapshot<R: Rng>(rng: &mut R) -> Snapshot {
    let state = if rng.gen() {
        RenderState::opaque()
    } else {
        RenderState::transparent()
    };

    let vertices = VertexSource {
        vertices: Some(buffer(rng.gen_range(0, 3))),
        indices: if rng.gen() { Some(buffer(3)) } else { None },
    };

    let mut snapshot = Snapshot::default()
        .with_program(program(rng.gen_range(0, 3)))
        .with_state(state)
        .with_vertices(vertices)
        .with_uniform("u_Alpha", rng.gen_range(0, 2) as f32);

    for unit in 0..rng.gen_range(0, 4) {
        snapshot.set_texture(unit, texture(rng.gen_range(0, 3)));
    }

    snapshot
}

#[test]
fn idempotent() {
    let mut rng = XorShiftRng::from_seed([7; 16]);
    let mut visitor = HeadlessVisitor::new();
    let mut cache = StateCache::new(8);

    for _ in 0..256 {
        let snapshot = random_snapshot(&mut rng);
        cache.apply(&mut visitor, &snapshot).unwrap();
        cache.verify(&snapshot).unwrap();

        let calls = cache.apply(&mut visitor, &snapshot).unwrap();
        assert!(calls.is_empty(), "{:?} issued {:?}", snapshot, calls);
    }
}

#[test]
fn minimal_delta() {
    let base = Snapshot::default()
        .with_program(program(0))
        .with_state(RenderState::transparent())
        .with_texture(1, texture(0))
        .with_vertices(VertexSource {
            vertices: Some(buffer(0)),
            indices: None,
        });

    let deltas: Vec<(Snapshot, Vec<NativeCall>)> = vec![
        (
            base.clone().with_program(program(1)),
            vec![NativeCall::BindProgram(Some(program(1)))],
        ),
        (
            base.clone().with_texture(1, texture(1)),
            vec![NativeCall::BindTexture(Some(texture(1)))],
        ),
        (
            base.clone().with_vertices(VertexSource {
                vertices: Some(buffer(0)),
                indices: Some(buffer(1)),
            }),
            vec![NativeCall::BindIndexBuffer(Some(buffer(1)))],
        ),
        (
            base.clone().with_state(RenderState {
                depth_write: true,
                ..RenderState::transparent()
            }),
            vec![NativeCall::DepthMask(true)],
        ),
        (
            base.clone().with_state(RenderState {
                color_mask: ColorMask::none(),
                ..RenderState::transparent()
            }),
            vec![NativeCall::ColorMask(ColorMask::none())],
        ),
        (
            base.clone().with_state(RenderState {
                blend: Some(Blend {
                    src: BlendFactor::One,
                    ..Blend::alpha()
                }),
                ..RenderState::transparent()
            }),
            vec![NativeCall::BlendFunc(
                BlendFactor::One,
                Blend::alpha().dst,
            )],
        ),
    ];

    for (snapshot, expected) in deltas {
        let mut visitor = HeadlessVisitor::new();
        let mut cache = StateCache::new(8);
        cache.apply(&mut visitor, &base).unwrap();

        let calls = cache.apply(&mut visitor, &snapshot).unwrap();
        assert_eq!(calls.as_slice(), expected.as_slice());
    }
}

#[test]
fn shared_program() {
    // Two renderables that only differ in vertex buffer.
    let manager = ::std::sync::Arc::new(UpdateManager::default());
    let scene = Scene::new(manager.clone());
    let visitor = HeadlessVisitor::new();
    let mut renderer = Renderer::new(
        manager,
        Box::new(visitor.clone()),
        RendererSettings::default(),
    );

    for i in 0..2 {
        let node = scene.create_node().unwrap();
        let snapshot = Snapshot::default()
            .with_program(program(0))
            .with_state(RenderState::opaque())
            .with_vertices(VertexSource {
                vertices: Some(buffer(i)),
                indices: None,
            });

        scene
            .attach_state(node, Renderable::new(snapshot, DrawParams::default()))
            .unwrap();
    }

    let diagnostics = renderer
        .synchronize_and_draw(&Frustum::unbounded())
        .unwrap();
    assert_eq!(diagnostics.draw_calls, 2);

    let binds = visitor.count(|v| match *v {
        NativeCall::BindProgram(_) => true,
        _ => false,
    });
    assert_eq!(binds, 1);

    let buffers = visitor.count(|v| match *v {
        NativeCall::BindVertexBuffer(_) => true,
        _ => false,
    });
    assert_eq!(buffers, 2);
}

#[test]
fn opaque_and_blended_share_program() {
    let manager = ::std::sync::Arc::new(UpdateManager::default());
    let scene = Scene::new(manager.clone());
    let visitor = HeadlessVisitor::new();
    let mut renderer = Renderer::new(
        manager,
        Box::new(visitor.clone()),
        RendererSettings::default(),
    );

    // The blended node is created first, it is still drawn after the opaque one.
    for &state in &[RenderState::transparent(), RenderState::opaque()] {
        let node = scene.create_node().unwrap();
        let snapshot = Snapshot::default()
            .with_program(program(0))
            .with_state(state);

        scene
            .attach_state(node, Renderable::new(snapshot, DrawParams::default()))
            .unwrap();
    }

    let diagnostics = renderer
        .synchronize_and_draw(&Frustum::unbounded())
        .unwrap();
    assert_eq!(diagnostics.draw_calls, 2);

    let binds = visitor.count(|v| match *v {
        NativeCall::BindProgram(_) => true,
        _ => false,
    });
    assert_eq!(binds, 1);

    let trace = visitor.trace();
    let position = |from: usize, func: &dyn Fn(&NativeCall) -> bool| {
        trace.as_slice()[from..]
            .iter()
            .position(|v| func(v))
            .map(|v| v + from)
            .unwrap()
    };

    let first_draw = position(0, &NativeCall::is_draw);
    let blend = position(0, &|v| *v == NativeCall::Enable(Capability::Blend));
    let second_draw = position(first_draw + 1, &NativeCall::is_draw);
    assert!(first_draw < blend);
    assert!(blend < second_draw);
}

#[test]
fn reset() {
    let snapshot = Snapshot::default()
        .with_program(program(0))
        .with_uniform("u_Alpha", 0.5f32)
        .with_state(RenderState::opaque());

    let mut visitor = HeadlessVisitor::new();
    let mut cache = StateCache::new(8);
    let first = cache.apply(&mut visitor, &snapshot).unwrap();
    assert!(cache.apply(&mut visitor, &snapshot).unwrap().is_empty());

    cache.reset();
    let second = cache.apply(&mut visitor, &snapshot).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().resets, 1);
}

#[test]
fn too_many_texture_units() {
    let snapshot = Snapshot::default().with_texture(4, texture(0));
    let mut visitor = HeadlessVisitor::new();
    let mut cache = StateCache::new(4);

    assert_eq!(
        cache.apply(&mut visitor, &snapshot),
        Err(Error::TooManyTextureUnits(5, 4))
    );
    assert!(visitor.is_empty());
}
