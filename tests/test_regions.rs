use bubblepack::analysis::frame::{
    populate_canvas, process_frame, process_frame_split, smooth_angles, split_rectangle,
    FrameError, GradientField,
};
use bubblepack::analysis::regions::{
    bounding_rectangle, OctagonGrowth, RegionFinder, ScanlineSlicing, Slice, Slices,
};
use bubblepack::core::canvas::Canvas;
use bubblepack::core::domain::{FrameParams, RegionParams};
use bubblepack::core::geometry::{Point, Rectangle};
use crate::common::boxed_canvas;

mod common;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rectangle {
    Rectangle::new(Point::new(x0, y0), Point::new(x1, y1))
}

// --- Scanline ---

#[test]
fn test_scanline_empty_canvas_is_one_region() {
    let canvas = Canvas::new(100, 100);
    let regions = ScanlineSlicing { margin: 0.0 }.find_regions(&canvas, &canvas.bounds());
    assert_eq!(regions, vec![rect(0.0, 0.0, 99.0, 99.0)]);
}

#[test]
fn test_scanline_solid_block_leaves_one_region() {
    let mut canvas = Canvas::new(100, 100);
    canvas.fill_rectangle(&rect(30.0, 30.0, 60.0, 60.0));
    let regions = ScanlineSlicing::default().find_regions(&canvas, &canvas.bounds());
    assert_eq!(regions, vec![rect(-5.0, -5.0, 104.0, 104.0)]);
}

#[test]
fn test_scanline_outline_separates_inside() {
    let canvas = boxed_canvas((20.0, 20.0), (70.0, 70.0));
    let regions = ScanlineSlicing { margin: 0.0 }.find_regions(&canvas, &canvas.bounds());
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0], rect(0.0, 0.0, 99.0, 99.0));
    assert_eq!(regions[1], rect(21.0, 21.0, 69.0, 69.0));
}

#[test]
fn test_scanline_band_splits_canvas() {
    let mut canvas = Canvas::new(100, 100);
    canvas.fill_rectangle(&rect(0.0, 40.0, 99.0, 59.0));
    let regions = ScanlineSlicing { margin: 0.0 }.find_regions(&canvas, &canvas.bounds());
    assert_eq!(
        regions,
        vec![rect(0.0, 0.0, 99.0, 39.0), rect(0.0, 60.0, 99.0, 99.0)]
    );
}

#[test]
fn test_scanline_respects_area() {
    let canvas = Canvas::new(100, 100);
    let finder = ScanlineSlicing { margin: 0.0 };
    assert_eq!(
        finder.find_regions(&canvas, &rect(10.5, 10.0, 20.0, 30.5)),
        vec![rect(11.0, 10.0, 20.0, 30.0)]
    );
    assert!(finder
        .find_regions(&canvas, &rect(200.0, 200.0, 300.0, 300.0))
        .is_empty());
}

#[test]
fn test_slices_per_row() {
    let mut canvas = Canvas::new(10, 3);
    canvas.fill_rectangle(&rect(4.0, 0.0, 5.0, 0.0));
    let mut slices = Slices::deduce(&canvas, (0, 0, 9, 2));
    // row 0 is cut in two, rows 1 and 2 are whole
    assert_eq!(slices.len(), 4);

    let first = slices.pop_first().expect("slices left");
    assert_eq!(first.row, 0);
    assert_eq!(first.slice, Slice { start: 0, end: 3 });

    let object = slices.pop_object().expect("slices left");
    assert_eq!(object.len(), 3);
    assert_eq!(bounding_rectangle(&object), Some(rect(0.0, 0.0, 9.0, 2.0)));
    assert!(slices.is_empty());
    assert!(slices.pop_object().is_none());
}

#[test]
fn test_slice_touching_is_inclusive() {
    let a = Slice { start: 0, end: 4 };
    assert!(a.touches(&Slice { start: 4, end: 9 }));
    assert!(!a.touches(&Slice { start: 5, end: 9 }));
    assert!(bounding_rectangle(&[]).is_none());
}

// --- Octagon growth ---

#[test]
fn test_octagon_finds_inside_and_outside_of_box() {
    let mut canvas = Canvas::new(50, 50);
    canvas.draw_rectangle(&rect(11.0, 11.0, 31.0, 31.0));
    let finder = OctagonGrowth::from(RegionParams::default());
    let regions = finder.find_regions(&canvas, &canvas.bounds());

    assert_eq!(regions.len(), 2);
    // outside the wall: the whole canvas plus margin
    assert_eq!(regions[0], rect(-5.0, -5.0, 54.0, 54.0));
    assert_eq!(regions[1], rect(8.0, 8.0, 34.0, 34.0));
}

#[test]
fn test_octagon_one_region_per_side_of_default_box() {
    let canvas = boxed_canvas((20.0, 20.0), (70.0, 70.0));
    let regions = OctagonGrowth::default().find_regions(&canvas, &canvas.bounds());
    assert_eq!(
        regions,
        vec![rect(-5.0, -5.0, 104.0, 104.0), rect(16.0, 16.0, 74.0, 74.0)]
    );
    let scanline = ScanlineSlicing::default().find_regions(&canvas, &canvas.bounds());
    assert_eq!(regions.len(), scanline.len());
}

#[test]
fn test_octagon_one_region_per_side_of_small_box() {
    let canvas = boxed_canvas((40.0, 40.0), (60.0, 60.0));
    let regions = OctagonGrowth::default().find_regions(&canvas, &canvas.bounds());
    assert_eq!(
        regions,
        vec![rect(-5.0, -5.0, 104.0, 104.0), rect(36.0, 36.0, 62.0, 62.0)]
    );
}

#[test]
fn test_octagon_wall_corner_does_not_leak() {
    let canvas = boxed_canvas((20.0, 20.0), (70.0, 70.0));
    let finder = OctagonGrowth {
        margin: 0.0,
        ..Default::default()
    };
    let regions = finder.find_regions(&canvas, &canvas.bounds());
    assert_eq!(regions.len(), 2);
    // the inside cluster never reaches the wall
    let inside = regions[1];
    assert!(inside.tl.x > 20.0 && inside.tl.y > 20.0);
    assert!(inside.br.x < 70.0 && inside.br.y < 70.0);
}

#[test]
fn test_octagon_unaligned_canvases() {
    let finder = OctagonGrowth {
        margin: 0.0,
        ..Default::default()
    };
    for size in [20, 21, 22, 23, 100] {
        let canvas = Canvas::new(size, size);
        let edge = (size - 1) as f64;
        assert_eq!(
            finder.find_regions(&canvas, &canvas.bounds()),
            vec![rect(0.0, 0.0, edge, edge)],
            "canvas {size}x{size}"
        );
    }

    let mut canvas = Canvas::new(37, 53);
    canvas.draw_rectangle(&rect(5.0, 10.0, 30.0, 40.0));
    let regions = OctagonGrowth::default().find_regions(&canvas, &canvas.bounds());
    assert_eq!(
        regions,
        vec![rect(-5.0, -5.0, 41.0, 57.0), rect(4.0, 7.0, 34.0, 41.0)]
    );
}

#[test]
fn test_octagon_separate_boxes() {
    let mut canvas = Canvas::new(100, 100);
    canvas.draw_rectangle(&rect(10.0, 10.0, 40.0, 40.0));
    canvas.draw_rectangle(&rect(50.0, 50.0, 90.0, 90.0));
    let regions = OctagonGrowth::default().find_regions(&canvas, &canvas.bounds());
    assert_eq!(
        regions,
        vec![
            rect(-5.0, -5.0, 104.0, 104.0),
            rect(8.0, 7.0, 42.0, 41.0),
            rect(48.0, 47.0, 94.0, 93.0),
        ]
    );
}

#[test]
fn test_octagon_joins_floods_through_a_gap() {
    // the wall stops two rows short, so both sides are one area
    let mut canvas = Canvas::new(9, 9);
    canvas.fill_rectangle(&rect(4.0, 0.0, 4.0, 6.0));
    let finder = OctagonGrowth {
        margin: 0.0,
        ..Default::default()
    };
    assert_eq!(
        finder.find_regions(&canvas, &canvas.bounds()),
        vec![rect(0.0, 0.0, 8.0, 8.0)]
    );
}

#[test]
fn test_octagon_clips_to_area() {
    let canvas = boxed_canvas((20.0, 20.0), (70.0, 70.0));
    let regions = OctagonGrowth::default().find_regions(&canvas, &rect(10.0, 10.0, 45.0, 45.0));
    assert_eq!(
        regions,
        vec![rect(5.0, 5.0, 50.0, 50.0), rect(18.0, 17.0, 50.0, 50.0)]
    );
}

#[test]
fn test_octagon_filled_canvas_has_no_regions() {
    let mut canvas = Canvas::new(20, 20);
    canvas.fill_rectangle(&canvas.bounds());
    assert!(OctagonGrowth::default()
        .find_regions(&canvas, &canvas.bounds())
        .is_empty());
}

// --- Frame pipeline ---

fn block_field() -> GradientField {
    let mut field = GradientField::new(20, 20);
    for y in 8..=12 {
        for x in 8..=12 {
            field.set(x, y, 100, 45);
        }
    }
    field
}

#[test]
fn test_smoothing_thresholds() {
    let mut field = GradientField::new(20, 20);
    field.set(10, 10, 90, 0);
    let area = rect(0.0, 0.0, 19.0, 19.0);

    // a neighbour sees exactly 90 / 9 = 10
    let at_threshold = smooth_angles(&field, 1, 10.0, &area).expect("valid field");
    assert_eq!(at_threshold.get(11, 10), Some((10.0, 0.0)));
    assert!(at_threshold.is_flat(12, 10));

    let above = smooth_angles(&field, 1, 10.5, &area).expect("valid field");
    assert!(above.is_flat(11, 10));

    // border pixels are never smoothed
    assert_eq!(at_threshold.get(0, 0), Some((0.0, 0.0)));
    assert!(!at_threshold.is_flat(19, 5));
}

#[test]
fn test_smoothing_weights_angles_by_length() {
    let mut field = GradientField::new(10, 10);
    field.set(5, 5, 90, 40);
    field.set(6, 5, 90, 80);
    let smoothed = smooth_angles(&field, 1, 10.0, &rect(0.0, 0.0, 9.0, 9.0)).expect("valid");
    assert_eq!(smoothed.get(5, 5), Some((20.0, 60.0)));
}

#[test]
fn test_flat_pixels_become_obstacles() {
    let field = GradientField::new(20, 20);
    let area = rect(0.0, 0.0, 19.0, 19.0);
    let smoothed = smooth_angles(&field, 1, 10.0, &area).expect("valid");
    let canvas = populate_canvas(&smoothed, &area);
    assert_eq!(canvas.points().len(), 18 * 18);
    assert!(canvas.is_filled(1, 1));
    assert!(!canvas.is_filled(0, 0));
}

#[test]
fn test_frame_finds_bright_block() {
    let field = block_field();
    let params = FrameParams::default();
    let regions = process_frame(&field, &rect(0.0, 0.0, 19.0, 19.0), &params).expect("runs");

    assert_eq!(regions.len(), 2);
    // the unsmoothed border ring, then the block grown by one smoothing ring
    assert_eq!(regions[0], rect(-5.0, -5.0, 24.0, 24.0));
    assert_eq!(regions[1], rect(2.0, 2.0, 18.0, 18.0));
}

#[test]
fn test_frame_rejects_bad_input() {
    let mut field = GradientField::new(20, 20);
    field.len.pop();
    let err = process_frame(&field, &rect(0.0, 0.0, 19.0, 19.0), &FrameParams::default())
        .unwrap_err();
    assert_eq!(
        err,
        FrameError::BufferLength {
            buffer: "len",
            expected: 400,
            actual: 399,
            width: 20,
            height: 20,
        }
    );

    let far = rect(100.0, 100.0, 120.0, 120.0);
    assert_eq!(
        process_frame(&GradientField::new(20, 20), &far, &FrameParams::default()).unwrap_err(),
        FrameError::EmptyArea(far)
    );
}

#[test]
fn test_split_rectangle_covers_area() {
    let area = rect(0.0, 0.0, 9.0, 9.0);
    assert_eq!(split_rectangle(&area, 1), vec![area]);

    let tiles = split_rectangle(&area, 3);
    assert_eq!(tiles.len(), 9);
    assert_eq!(tiles[0], rect(0.0, 0.0, 2.0, 2.0));
    assert_eq!(tiles[8], rect(6.0, 6.0, 9.0, 9.0));
    let pixels: f64 = tiles
        .iter()
        .map(|t| (t.width() + 1.0) * (t.height() + 1.0))
        .sum();
    assert_eq!(pixels, 100.0);

    // more tiles than pixels
    assert_eq!(split_rectangle(&rect(0.0, 0.0, 1.0, 1.0), 4).len(), 4);
    assert_eq!(split_rectangle(&area, usize::MAX).len(), 100);
    assert_eq!(split_rectangle(&rect(0.0, 0.0, 0.0, 9.0), usize::MAX / 2).len(), 10);
}

#[test]
fn test_oversized_split_is_clamped_to_pixels() {
    let field = block_field();
    let area = rect(0.0, 0.0, 19.0, 19.0);
    let params = FrameParams {
        split: usize::MAX,
        ..FrameParams::default()
    };
    assert!(process_frame_split(&field, &area, &params).is_ok());
}

#[test]
fn test_split_of_one_matches_single_pass() {
    let field = block_field();
    let area = rect(0.0, 0.0, 19.0, 19.0);
    let params = FrameParams::default();
    assert_eq!(
        process_frame_split(&field, &area, &params).expect("runs"),
        process_frame(&field, &area, &params).expect("runs")
    );

    let split = FrameParams { split: 2, ..params };
    let tiled = process_frame_split(&field, &area, &split).expect("runs");
    assert!(tiled.len() >= 4);
}
