// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Solver Kernel Cache
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Single-entry cache of solver kernels keyed by the static slice.

use crate::runtime_params::StaticRuntimeParamsSlice;
use crate::solver::kernel::SolverKernel;
use fusion_types::error::FusionResult;
use log::debug;
use std::sync::Arc;

/// Holds the kernel of the most recent static slice. A lookup with an equal
/// slice reuses it; any other slice evicts it and builds a new one.
#[derive(Debug, Default)]
pub struct KernelCache {
    entry: Option<(StaticRuntimeParamsSlice, Arc<SolverKernel>)>,
    builds: usize,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, static_params: &StaticRuntimeParamsSlice) -> FusionResult<Arc<SolverKernel>> {
        if let Some((key, kernel)) = &self.entry {
            if key == static_params {
                debug!("solver kernel cache hit");
                return Ok(Arc::clone(kernel));
            }
        }
        let kernel = Arc::new(SolverKernel::build(static_params)?);
        self.builds += 1;
        debug!(
            "built solver kernel #{} for {} equations on {} cells",
            self.builds,
            kernel.evolved().len(),
            kernel.nx()
        );
        self.entry = Some((static_params.clone(), Arc::clone(&kernel)));
        Ok(kernel)
    }

    /// Number of kernels built since construction.
    pub fn build_count(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::interpolated_param::{InterpolatedVar1d, InterpolationMode};
    use crate::runtime_params::build_static_params;

    #[test]
    fn test_value_change_reuses_kernel() {
        let mut cache = KernelCache::new();
        let mut cfg = SimulationConfig::default();
        let a = cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        cfg.profile_conditions.ip = InterpolatedVar1d::constant(12.0);
        let b = cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.build_count(), 1);
    }

    #[test]
    fn test_structural_change_rebuilds() {
        let mut cache = KernelCache::new();
        let mut cfg = SimulationConfig::default();
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        cfg.numerics.evolve_current = true;
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        assert_eq!(cache.build_count(), 2);
        cfg.numerics.evolve_current = false;
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        assert_eq!(cache.build_count(), 3);
    }

    #[test]
    fn test_schedule_shape_change_rebuilds() {
        let mut cache = KernelCache::new();
        let mut cfg = SimulationConfig::default();
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        cfg.profile_conditions.ip =
            InterpolatedVar1d::scalar(vec![0.0, 1.0], vec![10.0, 15.0], InterpolationMode::PiecewiseLinear)
                .expect("schedule");
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        assert_eq!(cache.build_count(), 2);
    }

    #[test]
    fn test_clear_forces_rebuild() {
        let mut cache = KernelCache::new();
        let cfg = SimulationConfig::default();
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        cache.clear();
        cache.get_or_build(&build_static_params(&cfg)).expect("kernel");
        assert_eq!(cache.build_count(), 2);
    }
}
