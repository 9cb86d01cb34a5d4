extern crate rand;
extern crate trellis;

use rand::{Rng, SeedableRng, XorShiftRng};

use trellis::prelude::*;
use trellis::renderer::draw::DrawStage;
use trellis::renderer::queue::QueueBuilder;

fn snapshot(program: u32, blended: bool) -> Snapshot {
    let state = if blended {
        RenderState::transparent()
    } else {
        RenderState::opaque()
    };

    Snapshot::default()
        .with_program(ProgramHandle::from(Handle::new(program, 1)))
        .with_state(state)
}

#[test]
fn ordering() {
    let mut rng = XorShiftRng::from_seed([3; 16]);

    for _ in 0..32 {
        let mut builder = QueueBuilder::new();
        let mut blended = Vec::new();

        for _ in 0..rng.gen_range(0, 64) {
            let is_blended = rng.gen_bool(0.3);
            let index = builder.push(
                snapshot(rng.gen_range(0, 4), is_blended),
                DrawParams::default(),
            );

            if is_blended {
                blended.push(index);
            }
        }

        let len = builder.len();
        let queue = builder.build();
        assert_eq!(queue.len(), len);

        let entries = queue.as_slice();
        let opaques = entries
            .iter()
            .take_while(|v| v.opacity() == OpacityClass::Opaque)
            .count();

        // Opaque entries come first, grouped by state.
        assert_eq!(opaques, len - blended.len());
        for pair in entries[..opaques].windows(2) {
            assert!(pair[0].snapshot.state_cmp(&pair[1].snapshot) != ::std::cmp::Ordering::Greater);
        }

        // Blended entries keep their traversal order.
        let indices: Vec<_> = entries[opaques..].iter().map(|v| v.index).collect();
        assert_eq!(indices, blended);
    }
}

#[test]
fn stable() {
    let mut builder = QueueBuilder::new();
    for i in 0..8 {
        builder.push(snapshot(i % 2, false), DrawParams::default());
    }

    let queue = builder.build();
    let indices: Vec<_> = queue.iter().map(|v| v.index).collect();
    assert_eq!(indices, vec![0, 2, 4, 6, 1, 3, 5, 7]);
}

#[test]
fn draw_in_queue_order() {
    let mut rng = XorShiftRng::from_seed([5; 16]);
    let mut builder = QueueBuilder::new();

    let mut counts: Vec<u32> = (1..17).map(|v| v * 3).collect();
    rng.shuffle(&mut counts);
    for &count in &counts {
        let draw = DrawParams::Arrays {
            primitive: Primitive::Triangles,
            first: 0,
            count,
        };

        builder.push(snapshot(0, true), draw);
    }

    let queue = builder.build();
    let visitor = HeadlessVisitor::new();
    let mut stage = DrawStage::new(Box::new(visitor.clone()), 8, true);
    let report = stage.draw(&queue);

    assert_eq!(report.draw_calls, counts.len());
    assert_eq!(report.primitives as u32, counts.iter().sum::<u32>() / 3);

    let drawn: Vec<_> = visitor
        .trace()
        .iter()
        .filter_map(|v| match *v {
            NativeCall::DrawArrays(_, _, count) => Some(count),
            _ => None,
        })
        .collect();

    assert_eq!(drawn, counts);
}
