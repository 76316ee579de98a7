//! End-to-end batching through the controller and the recording back end

use lumen::render::batch::{Batch, TEXTURE_SLOTS};
use lumen::render::headless::HeadlessRender;
use lumen::render::vertex::{self, Transform, Vertex, VertexGroup};
use lumen::render::{BatchController, Render, RenderMode, Shader, Texture};

fn quad(x: f32) -> VertexGroup {
    let v = |px: f32, py: f32| Vertex::colored(px, py, [1.0; 4]);
    VertexGroup::quad(v(x, 1.0), v(x + 1.0, 1.0), v(x + 1.0, 0.0), v(x, 0.0))
}

fn started(max_size: usize) -> (BatchController, HeadlessRender) {
    let mut render = HeadlessRender::new();
    let mut controller = BatchController::new(max_size);
    controller.start(&mut render).unwrap();
    (controller, render)
}

fn standalone_batch(max_size: usize) -> Batch {
    let mut render = HeadlessRender::new();
    let shader: Shader = render.create_batch_shader().unwrap();
    Batch::new(max_size, shader, RenderMode::Triangles, false)
}

#[test]
fn vertex_layout_is_contiguous() {
    let fields = [
        (vertex::POSITION_OFFSET, vertex::POSITION_SIZE),
        (vertex::ROTATION_OFFSET, vertex::ROTATION_SIZE),
        (vertex::ROTATION_ORIGIN_OFFSET, vertex::ROTATION_ORIGIN_SIZE),
        (vertex::COLOR_OFFSET, vertex::COLOR_SIZE),
        (vertex::UV_OFFSET, vertex::UV_SIZE),
        (vertex::TEX_ID_OFFSET, vertex::TEX_ID_SIZE),
        (vertex::USE_CAMERA_OFFSET, vertex::USE_CAMERA_SIZE),
        (vertex::TRANSFORM_ROTATION_OFFSET, vertex::TRANSFORM_ROTATION_SIZE),
        (vertex::TRANSFORM_TRANSLATE_OFFSET, vertex::TRANSFORM_TRANSLATE_SIZE),
        (vertex::TRANSFORM_ORIGIN_OFFSET, vertex::TRANSFORM_ORIGIN_SIZE),
        (vertex::IS_FONT_OFFSET, vertex::IS_FONT_SIZE),
    ];
    for pair in fields.windows(2) {
        let (offset, size) = pair[0];
        assert_eq!(offset + size, pair[1].0);
    }
    assert_eq!(vertex::VERTEX_SIZE_FLOATS, 19);
    assert_eq!(std::mem::size_of::<Vertex>(), vertex::VERTEX_SIZE_BYTES);
}

#[test]
fn single_quad_is_one_object() {
    let (mut controller, mut render) = started(100);
    controller.add_figure(&quad(0.0), &Transform::IDENTITY, false, false).unwrap();

    let batch = controller.batch(0).unwrap();
    assert_eq!(batch.vert_count(), 4);
    assert_eq!(batch.obj_count(), 1);
    assert_eq!(&batch.indices()[..6], &[0, 1, 2, 2, 3, 0]);

    controller.finish_and_render(&mut render).unwrap();
    let draws = render.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].indices, vec![0, 1, 2, 2, 3, 0]);
}

#[test]
fn triangle_is_padded_with_first_vertex() {
    let (mut controller, _render) = started(100);
    let a = Vertex::colored(0.0, 0.0, [1.0, 0.0, 0.0, 1.0]);
    let b = Vertex::colored(1.0, 0.0, [0.0, 1.0, 0.0, 1.0]);
    let c = Vertex::colored(0.0, 1.0, [0.0, 0.0, 1.0, 1.0]);
    controller.add_figure(&VertexGroup::triangle(a, b, c), &Transform::IDENTITY, false, false).unwrap();

    let batch = controller.batch(0).unwrap();
    assert_eq!(batch.vert_count(), 4);
    assert_eq!(batch.vertices()[3], batch.vertices()[0]);
    assert_eq!(&batch.indices()[..6], &[0, 1, 2, 2, 3, 0]);
}

#[test]
fn seventeenth_texture_rolls_into_next_batch() {
    let (mut controller, mut render) = started(1000);
    let textures: Vec<Texture> = (0..17).map(|_| render.solid_texture(4, 4)).collect();

    let slots: Vec<u32> = textures
        .iter()
        .map(|t| controller.add_textured_figure(&quad(0.0), t, &Transform::IDENTITY, false, false).unwrap())
        .collect();

    let expected: Vec<u32> = (1..=16).chain(std::iter::once(1)).collect();
    assert_eq!(slots, expected);
    assert_eq!(controller.batch(0).unwrap().textures().count(), TEXTURE_SLOTS);
    assert_eq!(controller.batch(1).unwrap().textures().collect::<Vec<_>>(), vec![&textures[16]]);

    controller.finish_and_render(&mut render).unwrap();
    assert_eq!(render.draws().len(), 2);
    assert_eq!(render.draws()[1].textures, vec![textures[16]]);
}

#[test]
fn admission_keeps_everything_that_fits() {
    let mut batch = standalone_batch(12);
    for i in 0..3 {
        assert!(!batch.is_full(4));
        assert!(batch.add_vertices(&quad(i as f32), false, &Transform::IDENTITY, false));
    }
    assert_eq!(batch.vert_count(), 12);
    assert!(!batch.rejected_write());
}

#[test]
fn admission_drops_the_overflowing_suffix() {
    let mut batch = standalone_batch(8);
    let accepted: Vec<bool> = (0..4)
        .map(|i| batch.add_vertices(&quad(i as f32), false, &Transform::IDENTITY, false))
        .collect();

    assert_eq!(accepted, vec![true, true, false, false]);
    assert_eq!(batch.vert_count(), 8);
    assert_eq!(batch.obj_count(), 2);
    assert!(batch.rejected_write());
}

#[test]
fn repeated_texture_keeps_its_slot() {
    let mut render = HeadlessRender::new();
    let mut batch = standalone_batch(100);
    let first = render.solid_texture(2, 2);
    let second = render.solid_texture(2, 2);

    for _ in 0..5 {
        assert_eq!(batch.add_texture(&first), Some(1));
    }
    assert_eq!(batch.add_texture(&second), Some(2));
    assert_eq!(batch.add_texture(&first), Some(1));
}

#[test]
fn sixteen_textures_fill_the_table() {
    let mut render = HeadlessRender::new();
    let mut batch = standalone_batch(100);
    for expected in 1..=16 {
        let texture = render.solid_texture(1, 1);
        assert_eq!(batch.add_texture(&texture), Some(expected));
    }
    assert!(batch.is_full_of_textures());
    let texture = render.solid_texture(1, 1);
    assert_eq!(batch.add_texture(&texture), None);
}

#[test]
fn submissions_flush_in_order_with_stencil_last() {
    let (mut controller, mut render) = started(8);
    controller.add_stencil_figure(&quad(100.0), &Transform::IDENTITY, false, false).unwrap();
    for i in 0..5 {
        controller.add_figure(&quad(i as f32), &Transform::IDENTITY, false, false).unwrap();
    }

    controller.finish_and_render(&mut render).unwrap();
    let draws = render.draws();

    assert_eq!(draws.len(), 4);
    let first_x: Vec<f32> = draws.iter().map(|d| d.vertices[0].position[0]).collect();
    assert_eq!(first_x, vec![0.0, 2.0, 4.0, 100.0]);
    assert!(draws[..3].iter().all(|d| !d.stencil));
    assert!(draws[3].stencil);
}

#[test]
fn next_frame_reuses_pooled_batches() {
    let (mut controller, mut render) = started(8);
    for _ in 0..2 {
        for i in 0..3 {
            controller.add_figure(&quad(i as f32), &Transform::IDENTITY, false, false).unwrap();
        }
        controller.finish_and_render(&mut render).unwrap();
    }

    assert_eq!(controller.batch_count(), 2);
    assert_eq!(render.draws().len(), 4);
    assert_eq!(controller.pending_vertices(), 0);
}
