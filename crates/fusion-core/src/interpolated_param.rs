// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Interpolated Parameters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time-varying parameter resolver.
//!
//! A schedule is a set of anchors (strictly increasing times, each with a
//! value) plus an interpolation mode. Evaluation is flat outside the anchor
//! range in every axis and reproduces anchor values exactly.
//!
//! [`InterpolatedVar1d`] carries a scalar (or a fixed-width vector) per
//! anchor time. [`InterpolatedVar2d`] carries a radial profile per anchor
//! time: space is interpolated first, then time.

use fusion_math::interp::{bracket, interp1d_array, is_strictly_increasing, step_index, Bracket};
use fusion_types::error::{FusionError, FusionResult};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    #[default]
    PiecewiseLinear,
    Step,
}

/// Anchor shape of a schedule. Two schedules with the same shape compile to
/// the same solver kernel whatever their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleShape {
    pub n_times: usize,
    /// Entries per anchor time: vector width for 1-D schedules, radial
    /// anchors for 2-D schedules.
    pub width: usize,
    pub mode: InterpolationMode,
}

fn check_times(times: &Array1<f64>) -> FusionResult<()> {
    let Some(slice) = times.as_slice() else {
        return Err(FusionError::ConfigError(
            "schedule times must be contiguous".to_string(),
        ));
    };
    if !is_strictly_increasing(slice) {
        return Err(FusionError::ConfigError(format!(
            "schedule times must be non-empty, finite and strictly increasing, got {times}"
        )));
    }
    Ok(())
}

fn check_finite(values: &Array2<f64>, what: &str) -> FusionResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FusionError::ConfigError(format!(
            "{what} values must be finite"
        )));
    }
    Ok(())
}

fn blend(lo: ndarray::ArrayView1<f64>, hi: ndarray::ArrayView1<f64>, frac: f64) -> Array1<f64> {
    Array1::from_iter(
        lo.iter()
            .zip(hi.iter())
            .map(|(a, b)| (1.0 - frac) * a + frac * b),
    )
}

// ── 1-D schedules ────────────────────────────────────────────────────

/// Scalar- or vector-valued function of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule1d", into = "RawSchedule1d")]
pub struct InterpolatedVar1d {
    times: Array1<f64>,
    /// `[n_times, width]`
    values: Array2<f64>,
    mode: InterpolationMode,
}

impl InterpolatedVar1d {
    pub fn new(
        times: Array1<f64>,
        values: Array2<f64>,
        mode: InterpolationMode,
    ) -> FusionResult<Self> {
        check_times(&times)?;
        if values.nrows() != times.len() {
            return Err(FusionError::ConfigError(format!(
                "schedule has {} times but {} value rows",
                times.len(),
                values.nrows()
            )));
        }
        if values.ncols() == 0 {
            return Err(FusionError::ConfigError(
                "schedule values must have width >= 1".to_string(),
            ));
        }
        check_finite(&values, "schedule")?;
        Ok(InterpolatedVar1d {
            times,
            values,
            mode,
        })
    }

    /// Scalar schedule from `(time, value)` anchors.
    pub fn scalar(times: Vec<f64>, values: Vec<f64>, mode: InterpolationMode) -> FusionResult<Self> {
        let n = values.len();
        let values = Array2::from_shape_vec((n, 1), values)
            .map_err(|e| FusionError::ConfigError(format!("schedule values: {e}")))?;
        Self::new(Array1::from(times), values, mode)
    }

    /// Time-independent scalar.
    pub fn constant(value: f64) -> Self {
        InterpolatedVar1d {
            times: Array1::zeros(1),
            values: Array2::from_elem((1, 1), value),
            mode: InterpolationMode::PiecewiseLinear,
        }
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    pub fn shape(&self) -> ScheduleShape {
        ScheduleShape {
            n_times: self.times.len(),
            width: self.width(),
            mode: self.mode,
        }
    }

    pub fn get_value(&self, t: f64) -> Array1<f64> {
        let times = self.times.as_slice().unwrap_or(&[]);
        match self.mode {
            InterpolationMode::Step => self.values.row(step_index(times, t)).to_owned(),
            InterpolationMode::PiecewiseLinear => match bracket(times, t) {
                Bracket::Knot(i) => self.values.row(i).to_owned(),
                Bracket::Between { lo, frac } => {
                    blend(self.values.row(lo), self.values.row(lo + 1), frac)
                }
            },
        }
    }

    /// First component of [`get_value`](Self::get_value); the value itself
    /// for scalar schedules.
    pub fn get_scalar(&self, t: f64) -> f64 {
        self.get_value(t)[0]
    }

    pub fn all_positive(&self) -> bool {
        self.values.iter().all(|v| *v > 0.0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSchedule1d {
    Constant(f64),
    Series {
        times: Vec<f64>,
        values: Vec<f64>,
        #[serde(default)]
        interpolation: InterpolationMode,
    },
    VectorSeries {
        times: Vec<f64>,
        values: Vec<Vec<f64>>,
        #[serde(default)]
        interpolation: InterpolationMode,
    },
}

impl TryFrom<RawSchedule1d> for InterpolatedVar1d {
    type Error = FusionError;

    fn try_from(raw: RawSchedule1d) -> FusionResult<Self> {
        match raw {
            RawSchedule1d::Constant(v) => {
                InterpolatedVar1d::scalar(vec![0.0], vec![v], InterpolationMode::PiecewiseLinear)
            }
            RawSchedule1d::Series {
                times,
                values,
                interpolation,
            } => InterpolatedVar1d::scalar(times, values, interpolation),
            RawSchedule1d::VectorSeries {
                times,
                values,
                interpolation,
            } => {
                let values = rows_to_array(values)?;
                InterpolatedVar1d::new(Array1::from(times), values, interpolation)
            }
        }
    }
}

impl From<InterpolatedVar1d> for RawSchedule1d {
    fn from(var: InterpolatedVar1d) -> Self {
        let times = var.times.to_vec();
        if var.width() == 1 {
            if times.len() == 1 && times[0] == 0.0 {
                return RawSchedule1d::Constant(var.values[[0, 0]]);
            }
            return RawSchedule1d::Series {
                times,
                values: var.values.column(0).to_vec(),
                interpolation: var.mode,
            };
        }
        RawSchedule1d::VectorSeries {
            times,
            values: var.values.outer_iter().map(|r| r.to_vec()).collect(),
            interpolation: var.mode,
        }
    }
}

fn rows_to_array(rows: Vec<Vec<f64>>) -> FusionResult<Array2<f64>> {
    let n = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != width) {
        return Err(FusionError::ConfigError(
            "schedule value rows must all have the same length".to_string(),
        ));
    }
    Array2::from_shape_vec((n, width), rows.into_iter().flatten().collect())
        .map_err(|e| FusionError::ConfigError(format!("schedule values: {e}")))
}

// ── 2-D schedules ────────────────────────────────────────────────────

/// Radial profile as a function of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule2d", into = "RawSchedule2d")]
pub struct InterpolatedVar2d {
    times: Array1<f64>,
    rho_norm: Array1<f64>,
    /// `[n_times, n_rho]`
    values: Array2<f64>,
    mode: InterpolationMode,
}

impl InterpolatedVar2d {
    pub fn new(
        times: Array1<f64>,
        rho_norm: Array1<f64>,
        values: Array2<f64>,
        mode: InterpolationMode,
    ) -> FusionResult<Self> {
        check_times(&times)?;
        let radii_ok = rho_norm.as_slice().is_some_and(is_strictly_increasing);
        if !radii_ok {
            return Err(FusionError::ConfigError(format!(
                "profile rho_norm must be non-empty, finite and strictly increasing, got {rho_norm}"
            )));
        }
        if values.dim() != (times.len(), rho_norm.len()) {
            return Err(FusionError::ConfigError(format!(
                "profile values have shape {:?}, expected ({}, {})",
                values.dim(),
                times.len(),
                rho_norm.len()
            )));
        }
        check_finite(&values, "profile")?;
        Ok(InterpolatedVar2d {
            times,
            rho_norm,
            values,
            mode,
        })
    }

    /// Time-independent profile.
    pub fn profile(rho_norm: Vec<f64>, values: Vec<f64>) -> FusionResult<Self> {
        let n = values.len();
        let values = Array2::from_shape_vec((1, n), values)
            .map_err(|e| FusionError::ConfigError(format!("profile values: {e}")))?;
        Self::new(
            Array1::zeros(1),
            Array1::from(rho_norm),
            values,
            InterpolationMode::PiecewiseLinear,
        )
    }

    /// Uniform value, defined at rho_norm = 0 only.
    pub fn constant(value: f64) -> Self {
        InterpolatedVar2d {
            times: Array1::zeros(1),
            rho_norm: Array1::zeros(1),
            values: Array2::from_elem((1, 1), value),
            mode: InterpolationMode::PiecewiseLinear,
        }
    }

    pub fn shape(&self) -> ScheduleShape {
        ScheduleShape {
            n_times: self.times.len(),
            width: self.rho_norm.len(),
            mode: self.mode,
        }
    }

    /// True iff the profile has an anchor at or beyond rho_norm = 1.
    pub fn right_boundary_defined(&self) -> bool {
        self.rho_norm
            .iter()
            .last()
            .is_some_and(|&r| r >= 1.0)
    }

    pub fn all_positive(&self) -> bool {
        self.values.iter().all(|v| *v > 0.0)
    }

    fn spatial(&self, row: usize, grid: &Array1<f64>) -> Array1<f64> {
        let rho = self.rho_norm.as_slice().unwrap_or(&[]);
        let vals = self.values.index_axis(Axis(0), row);
        let vals = vals.to_vec();
        interp1d_array(rho, &vals, grid)
    }

    /// Profile at time `t` on the radial points of `grid`.
    pub fn get_value(&self, t: f64, grid: &Array1<f64>) -> Array1<f64> {
        let times = self.times.as_slice().unwrap_or(&[]);
        match self.mode {
            InterpolationMode::Step => self.spatial(step_index(times, t), grid),
            InterpolationMode::PiecewiseLinear => match bracket(times, t) {
                Bracket::Knot(i) => self.spatial(i, grid),
                Bracket::Between { lo, frac } => {
                    let a = self.spatial(lo, grid);
                    let b = self.spatial(lo + 1, grid);
                    blend(a.view(), b.view(), frac)
                }
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSchedule2d {
    Constant(f64),
    Series {
        times: Vec<f64>,
        rho_norm: Vec<f64>,
        values: Vec<Vec<f64>>,
        #[serde(default)]
        interpolation: InterpolationMode,
    },
    Profile {
        rho_norm: Vec<f64>,
        values: Vec<f64>,
    },
}

impl TryFrom<RawSchedule2d> for InterpolatedVar2d {
    type Error = FusionError;

    fn try_from(raw: RawSchedule2d) -> FusionResult<Self> {
        match raw {
            RawSchedule2d::Constant(v) => {
                if !v.is_finite() {
                    return Err(FusionError::ConfigError(
                        "profile values must be finite".to_string(),
                    ));
                }
                Ok(InterpolatedVar2d::constant(v))
            }
            RawSchedule2d::Profile { rho_norm, values } => {
                InterpolatedVar2d::profile(rho_norm, values)
            }
            RawSchedule2d::Series {
                times,
                rho_norm,
                values,
                interpolation,
            } => InterpolatedVar2d::new(
                Array1::from(times),
                Array1::from(rho_norm),
                rows_to_array(values)?,
                interpolation,
            ),
        }
    }
}

impl From<InterpolatedVar2d> for RawSchedule2d {
    fn from(var: InterpolatedVar2d) -> Self {
        RawSchedule2d::Series {
            times: var.times.to_vec(),
            rho_norm: var.rho_norm.to_vec(),
            values: var.values.outer_iter().map(|r| r.to_vec()).collect(),
            interpolation: var.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_constant_everywhere() {
        let v = InterpolatedVar1d::constant(3.5);
        for t in [-1.0, 0.0, 2.0, 1e9] {
            assert_eq!(v.get_scalar(t), 3.5);
        }
    }

    #[test]
    fn test_linear_knots_midpoint_and_extrapolation() {
        let v = InterpolatedVar1d::scalar(vec![0.0, 1.5], vec![2.0, 200.0], InterpolationMode::PiecewiseLinear)
            .expect("valid schedule");
        assert_eq!(v.get_scalar(0.0), 2.0);
        assert_eq!(v.get_scalar(1.5), 200.0);
        assert!((v.get_scalar(0.75) - 101.0).abs() < 1e-12);
        assert_eq!(v.get_scalar(-3.0), 2.0);
        assert_eq!(v.get_scalar(10.0), 200.0);
    }

    #[test]
    fn test_step_mode_takes_greatest_anchor_below() {
        let v = InterpolatedVar1d::scalar(vec![0.0, 1.0, 2.0], vec![1.0, 5.0, 9.0], InterpolationMode::Step)
            .expect("valid schedule");
        assert_eq!(v.get_scalar(-0.5), 1.0);
        assert_eq!(v.get_scalar(0.99), 1.0);
        assert_eq!(v.get_scalar(1.0), 5.0);
        assert_eq!(v.get_scalar(1.7), 5.0);
        assert_eq!(v.get_scalar(3.0), 9.0);
    }

    #[test]
    fn test_unsorted_times_rejected_without_sorting() {
        let err = InterpolatedVar1d::scalar(vec![0.0, 2.0, 1.0], vec![1.0, 2.0, 3.0], InterpolationMode::PiecewiseLinear)
            .expect_err("unsorted anchors must fail");
        match err {
            FusionError::ConfigError(msg) => assert!(msg.contains("strictly increasing")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = InterpolatedVar1d::scalar(vec![0.0, 1.0], vec![1.0], InterpolationMode::PiecewiseLinear)
            .expect_err("mismatch must fail");
        assert!(matches!(err, FusionError::ConfigError(_)));
    }

    #[test]
    fn test_vector_valued_schedule() {
        let v = InterpolatedVar1d::new(
            array![0.0, 2.0],
            array![[0.0, 10.0, 20.0], [2.0, 30.0, 20.0]],
            InterpolationMode::PiecewiseLinear,
        )
        .expect("valid schedule");
        let mid = v.get_value(1.0);
        assert_eq!(mid.len(), 3);
        assert!((mid[0] - 1.0).abs() < 1e-12);
        assert!((mid[1] - 20.0).abs() < 1e-12);
        assert!((mid[2] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_space_then_time() {
        let p = InterpolatedVar2d::new(
            array![0.0, 1.0],
            array![0.0, 1.0],
            array![[10.0, 2.0], [20.0, 4.0]],
            InterpolationMode::PiecewiseLinear,
        )
        .expect("valid profile");
        let grid = array![0.0, 0.5, 1.0];
        let at0 = p.get_value(0.0, &grid);
        assert_eq!(at0, array![10.0, 6.0, 2.0]);
        let mid = p.get_value(0.5, &grid);
        assert!((mid[1] - 9.0).abs() < 1e-12, "mid={mid}");
        assert!(p.right_boundary_defined());
    }

    #[test]
    fn test_profile_flat_in_space() {
        let p = InterpolatedVar2d::profile(vec![0.2, 0.8], vec![5.0, 1.0]).expect("valid profile");
        let out = p.get_value(0.0, &array![0.0, 1.0]);
        assert_eq!(out, array![5.0, 1.0]);
        assert!(!p.right_boundary_defined());
    }

    #[test]
    fn test_scalar_profile_defined_at_axis_only() {
        let p = InterpolatedVar2d::constant(4.0);
        assert!(!p.right_boundary_defined());
        assert_eq!(p.get_value(7.0, &array![0.3, 0.9]), array![4.0, 4.0]);
    }

    #[test]
    fn test_shape_ignores_values() {
        let a = InterpolatedVar1d::scalar(vec![0.0, 1.0], vec![1.0, 2.0], InterpolationMode::PiecewiseLinear)
            .expect("valid");
        let b = InterpolatedVar1d::scalar(vec![5.0, 9.0], vec![-1.0, 8.0], InterpolationMode::PiecewiseLinear)
            .expect("valid");
        let c = InterpolatedVar1d::scalar(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0], InterpolationMode::PiecewiseLinear)
            .expect("valid");
        assert_eq!(a.shape(), b.shape());
        assert_ne!(a.shape(), c.shape());
    }

    #[test]
    fn test_serde_forms() {
        let c: InterpolatedVar1d = serde_json::from_str("15.0").expect("constant");
        assert_eq!(c.get_scalar(3.0), 15.0);

        let s: InterpolatedVar1d = serde_json::from_str(
            r#"{"times": [0.0, 1.0], "values": [1.0, 3.0], "interpolation": "step"}"#,
        )
        .expect("series");
        assert_eq!(s.mode(), InterpolationMode::Step);
        assert_eq!(s.get_scalar(0.5), 1.0);

        let bad = serde_json::from_str::<InterpolatedVar1d>(r#"{"times": [1.0, 0.0], "values": [1.0, 3.0]}"#);
        assert!(bad.is_err());

        let p: InterpolatedVar2d =
            serde_json::from_str(r#"{"rho_norm": [0.0, 1.0], "values": [15.0, 1.0]}"#).expect("profile");
        assert!(p.right_boundary_defined());

        let series: InterpolatedVar2d = serde_json::from_str(
            r#"{"times": [0.0, 2.0], "rho_norm": [0.0, 1.0], "values": [[15.0, 1.0], [10.0, 1.0]]}"#,
        )
        .expect("profile series");
        assert_eq!(series.shape().n_times, 2);
    }

    #[test]
    fn test_serde_round_trip_keeps_semantics() {
        let s = InterpolatedVar1d::scalar(vec![0.0, 1.0], vec![1.0, 3.0], InterpolationMode::Step)
            .expect("valid");
        let json = serde_json::to_string(&s).expect("serializes");
        let back: InterpolatedVar1d = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, s);
    }
}
