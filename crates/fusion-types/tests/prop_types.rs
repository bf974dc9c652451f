// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Property-Based Tests (proptest) for fusion-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for fusion-types using proptest.
//!
//! Covers: Grid1D construction invariants, CellVariable face
//! reconstruction, circular geometry monotonicity, state serialization.

use fusion_types::geometry::{build_circular_geometry, CircularGeometryParams};
use fusion_types::state::{CellVariable, Grid1D, RightFaceConstraint, MIN_CELLS};
use ndarray::Array1;
use proptest::prelude::*;

fn params(r_major: f64, a_minor: f64, kappa: f64) -> CircularGeometryParams {
    CircularGeometryParams {
        r_major,
        a_minor,
        b_0: 5.3,
        elongation_lcfs: kappa,
        ip_geometry: 15.0,
        ip_from_parameters: true,
    }
}

// ── Grid1D Construction Invariants ───────────────────────────────────

proptest! {
    /// Cell and face counts match the requested size.
    #[test]
    fn grid_dimensions_match(nx in MIN_CELLS..256) {
        let grid = Grid1D::new(nx).unwrap();
        prop_assert_eq!(grid.nx, nx);
        prop_assert_eq!(grid.cell_centers.len(), nx);
        prop_assert_eq!(grid.face_centers.len(), nx + 1);
        prop_assert!((grid.dx * nx as f64 - 1.0).abs() < 1e-12);
    }

    /// Faces span [0, 1] and every cell centre sits midway between its faces.
    #[test]
    fn grid_cells_between_faces(nx in MIN_CELLS..128) {
        let grid = Grid1D::new(nx).unwrap();
        prop_assert!(grid.face_centers[0].abs() < 1e-15);
        prop_assert!((grid.face_centers[nx] - 1.0).abs() < 1e-12);
        for i in 0..nx {
            let mid = 0.5 * (grid.face_centers[i] + grid.face_centers[i + 1]);
            prop_assert!((grid.cell_centers[i] - mid).abs() < 1e-12,
                "cell {} at {} but faces midpoint {}", i, grid.cell_centers[i], mid);
        }
    }

    /// Meshes below the minimum size are rejected.
    #[test]
    fn grid_too_small_rejected(nx in 0usize..MIN_CELLS) {
        prop_assert!(Grid1D::new(nx).is_err());
    }
}

// ── CellVariable Face Reconstruction ─────────────────────────────────

proptest! {
    /// A linear profile is reproduced exactly on interior faces, and the
    /// interior face gradient equals its slope.
    #[test]
    fn linear_profile_faces_exact(
        nx in MIN_CELLS..64,
        offset in -10.0f64..10.0,
        slope in -5.0f64..5.0,
    ) {
        let grid = Grid1D::new(nx).unwrap();
        let value = grid.cell_centers.mapv(|r| offset + slope * r);
        let var = CellVariable::new(value, grid.dx, slope, RightFaceConstraint::Gradient(slope)).unwrap();
        let faces = var.face_values();
        let grads = var.face_grad();
        for j in 0..=nx {
            let expected = offset + slope * grid.face_centers[j];
            prop_assert!((faces[j] - expected).abs() < 1e-9, "face {}: {} vs {}", j, faces[j], expected);
            prop_assert!((grads[j] - slope).abs() < 1e-9);
        }
    }

    /// A value constraint pins the edge face exactly.
    #[test]
    fn value_constraint_pins_edge(
        nx in MIN_CELLS..64,
        core in 0.1f64..20.0,
        edge in 0.01f64..5.0,
    ) {
        let var = CellVariable::with_edge_value(Array1::from_elem(nx, core), 1.0 / nx as f64, edge).unwrap();
        prop_assert_eq!(var.face_values()[nx], edge);
        prop_assert_eq!(var.right_face_value(), edge);
        prop_assert_eq!(var.face_grad()[0], 0.0);
    }
}

// ── Circular Geometry ────────────────────────────────────────────────

proptest! {
    /// Enclosed volume grows outward and vpr integrates to the total volume.
    #[test]
    fn circular_volume_monotone(
        nx in MIN_CELLS..64,
        r_major in 3.0f64..9.0,
        a_minor in 0.5f64..2.5,
        kappa in 1.0f64..2.0,
    ) {
        let grid = Grid1D::new(nx).unwrap();
        let geo = build_circular_geometry(&grid, &params(r_major, a_minor, kappa)).unwrap();
        for j in 1..=nx {
            prop_assert!(geo.volume_face[j] > geo.volume_face[j - 1]);
        }
        let integral = geo.volume_integral(&Array1::ones(nx));
        let rel = (integral - geo.volume_total()).abs() / geo.volume_total();
        // midpoint rule on a smooth quadratic-ish integrand
        prop_assert!(rel < 5.0 / (nx * nx) as f64, "relative error {}", rel);
    }

    /// Minor radius at or beyond the major radius is rejected.
    #[test]
    fn circular_rejects_inverted_aspect(r_major in 0.5f64..3.0, extra in 0.0f64..2.0) {
        let grid = Grid1D::new(10).unwrap();
        prop_assert!(build_circular_geometry(&grid, &params(r_major, r_major + extra, 1.5)).is_err());
    }
}

// ── Serialization ────────────────────────────────────────────────────

proptest! {
    /// CellVariable survives a JSON round trip.
    #[test]
    fn cell_variable_json_roundtrip(
        values in proptest::collection::vec(-1e3f64..1e3, MIN_CELLS..32),
        grad in -10.0f64..10.0,
    ) {
        let n = values.len();
        let var = CellVariable::new(Array1::from(values), 1.0 / n as f64, 0.0, RightFaceConstraint::Gradient(grad)).unwrap();
        let json = serde_json::to_string(&var).unwrap();
        let back: CellVariable = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, var);
    }
}
