//! End-to-end tests for the geolocation transformer.

use geoloc_transform::testdata::{curved_grid_sources, regular_grid_sources};
use geoloc_transform::{
    GeolocTransformer, InMemorySource, InverseMode, TransformerConfig,
};

fn build(
    x_src: &InMemorySource,
    y_src: &InMemorySource,
    regular: bool,
    mode: InverseMode,
) -> GeolocTransformer {
    GeolocTransformer::new(x_src, y_src, regular, mode, TransformerConfig::default()).unwrap()
}

// ============================================================================
// The concrete 4x3 scenario
// ============================================================================

#[test]
fn test_4x3_forward() {
    let (x_src, y_src) = regular_grid_sources(4, 3);
    let transformer = build(&x_src, &y_src, true, InverseMode::BackMap);

    assert_eq!(transformer.forward(2.0, 1.0), Some((12.0, 101.0)));
}

#[test]
fn test_4x3_inverse_both_modes() {
    let (x_src, y_src) = regular_grid_sources(4, 3);

    for mode in [InverseMode::BackMap, InverseMode::QuadTree] {
        let transformer = build(&x_src, &y_src, true, mode);

        let (px, py) = transformer.inverse(12.0, 101.0).unwrap();
        assert!((px - 2.0).abs() < 1e-3, "{mode}: px = {px}");
        assert!((py - 1.0).abs() < 1e-3, "{mode}: py = {py}");

        assert_eq!(transformer.inverse(1000.0, 1000.0), None, "{mode}");
    }
}

// ============================================================================
// Forward reproduces the stored geolocation values
// ============================================================================

#[test]
fn test_forward_reproduces_all_vertices() {
    let (x_src, y_src) = curved_grid_sources(16, 12);
    let transformer = build(&x_src, &y_src, false, InverseMode::BackMap);
    let grid = transformer.grid();

    for row in 0..12 {
        for col in 0..16 {
            let stored = grid.ground_at(col, row).unwrap();
            let interpolated = transformer.forward(col as f64, row as f64).unwrap();
            assert_eq!(interpolated, stored, "vertex ({col},{row})");
        }
    }
}

// ============================================================================
// Inverse accuracy at grid vertices
// ============================================================================

#[test]
fn test_inverse_roundtrip_at_vertices_both_modes() {
    let (x_src, y_src) = curved_grid_sources(16, 12);

    for mode in [InverseMode::BackMap, InverseMode::QuadTree] {
        let transformer = build(&x_src, &y_src, false, mode);
        let grid = transformer.grid();

        for (col, row) in [(0usize, 0usize), (3, 7), (8, 4), (15, 11)] {
            let (gx, gy) = grid.ground_at(col, row).unwrap();
            let (px, py) = transformer.inverse(gx, gy).unwrap();
            assert!(
                (px - col as f64).abs() < 1e-3 && (py - row as f64).abs() < 1e-3,
                "{mode}: vertex ({col},{row}) resolved to ({px},{py})"
            );
        }
    }
}

#[test]
fn test_unrefined_quadtree_is_exact_at_vertices() {
    let (x_src, y_src) = curved_grid_sources(16, 12);
    let config = TransformerConfig {
        refine_inverse: false,
        ..TransformerConfig::default()
    };
    let transformer =
        GeolocTransformer::new(&x_src, &y_src, false, InverseMode::QuadTree, config).unwrap();
    let grid = transformer.grid();

    let (gx, gy) = grid.ground_at(8, 4).unwrap();
    assert_eq!(transformer.inverse(gx, gy), Some((8.0, 4.0)));
}

// ============================================================================
// Out-of-coverage behavior
// ============================================================================

#[test]
fn test_outside_footprint_is_none_both_modes() {
    let (x_src, y_src) = regular_grid_sources(8, 6);

    // Strictly outside the footprint on each side.
    let probes = [
        (9.0, 102.0),
        (18.5, 102.0),
        (13.5, 98.9),
        (13.5, 106.2),
        (-1000.0, -1000.0),
    ];

    for mode in [InverseMode::BackMap, InverseMode::QuadTree] {
        let transformer = build(&x_src, &y_src, true, mode);
        for (gx, gy) in probes {
            assert_eq!(transformer.inverse(gx, gy), None, "{mode}: ({gx},{gy})");
        }
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_rebuild_answers_identically() {
    let (x_src, y_src) = curved_grid_sources(16, 12);

    for mode in [InverseMode::BackMap, InverseMode::QuadTree] {
        let first = build(&x_src, &y_src, false, mode);
        let second = build(&x_src, &y_src, false, mode);

        // Probe a lattice over (and slightly past) the footprint.
        for i in 0..40 {
            for j in 0..30 {
                let gx = 8.0 + i as f64 * 0.5;
                let gy = 99.0 + j as f64 * 0.5;
                assert_eq!(
                    first.inverse(gx, gy),
                    second.inverse(gx, gy),
                    "{mode}: ({gx},{gy})"
                );
            }
        }
    }
}

// ============================================================================
// Regular-grid equivalence
// ============================================================================

#[test]
fn test_regular_and_dense_loads_agree() {
    use geoloc_transform::testdata::separable_dense_sources;

    let (x_reg, y_reg) = regular_grid_sources(8, 6);
    let (x_dense, y_dense) = separable_dense_sources(8, 6);

    let broadcast = build(&x_reg, &y_reg, true, InverseMode::BackMap);
    let dense = build(&x_dense, &y_dense, false, InverseMode::BackMap);

    for row in 0..6 {
        for col in 0..8 {
            assert_eq!(
                broadcast.grid().ground_at(col, row),
                dense.grid().ground_at(col, row)
            );
        }
    }

    // Identical inputs after load: identical query answers.
    for (gx, gy) in [(10.0, 100.0), (13.25, 102.5), (17.0, 105.0)] {
        assert_eq!(broadcast.inverse(gx, gy), dense.inverse(gx, gy));
    }
}

// ============================================================================
// Nodata coverage gaps
// ============================================================================

#[test]
fn test_nodata_gap_reported_out_of_coverage() {
    // 8x6 separable grid with a hole: the four center pixels carry no
    // geolocation.
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in 0..6 {
        for col in 0..8 {
            let hole = (3..=4).contains(&col) && (2..=3).contains(&row);
            xs.push(if hole { -999.0 } else { 10.0 + col as f64 });
            ys.push(100.0 + row as f64);
        }
    }
    let x_src = InMemorySource::new(xs, 8, 6).with_no_data(-999.0);
    let y_src = InMemorySource::new(ys, 8, 6);

    for mode in [InverseMode::BackMap, InverseMode::QuadTree] {
        let transformer = GeolocTransformer::new(
            &x_src,
            &y_src,
            false,
            mode,
            TransformerConfig {
                refine_inverse: false,
                ..TransformerConfig::default()
            },
        )
        .unwrap();

        // Pixels outside the hole still resolve.
        let (px, py) = transformer.inverse(11.0, 100.0).unwrap();
        assert!((px - 1.0).abs() < 1.5 && py < 1.5, "{mode}: ({px},{py})");

        // Forward over the hole fails.
        assert_eq!(transformer.forward(3.5, 2.5), None, "{mode}");
    }
}
