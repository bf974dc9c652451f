// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Physics Model Bundle
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The transport, pedestal, source and conductivity models selected by one
//! static slice, evaluated together at a given state.

use crate::neoclassical::conductivity;
use crate::pedestal::{PedestalModel, PedestalOutput};
use crate::runtime_params::{DynamicRuntimeParamsSlice, StaticRuntimeParamsSlice};
use crate::source::SourceModels;
use crate::transport::{build_transport_model, TransportModel};
use fusion_types::error::FusionResult;
use fusion_types::geometry::Geometry;
use fusion_types::state::{CoreProfiles, CoreSources, CoreTransport};
use ndarray::Array1;

#[derive(Debug)]
pub struct PhysicsModels {
    pub transport: Box<dyn TransportModel>,
    pub pedestal: PedestalModel,
    pub sources: SourceModels,
}

/// Everything the discretization needs from the physics at one state.
#[derive(Debug, Clone)]
pub struct PhysicsSnapshot {
    pub pedestal: Option<PedestalOutput>,
    pub transport: CoreTransport,
    pub sources: CoreSources,
    pub conductivity: Array1<f64>,
}

impl PhysicsModels {
    pub fn from_static(static_params: &StaticRuntimeParamsSlice) -> Self {
        PhysicsModels {
            transport: build_transport_model(static_params.transport_model),
            pedestal: PedestalModel::from_kind(static_params.pedestal_model),
            sources: SourceModels::new(static_params.source_modes),
        }
    }

    pub fn evaluate(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        geo: &Geometry,
        profiles: &CoreProfiles,
    ) -> FusionResult<PhysicsSnapshot> {
        let pedestal = self.pedestal.compute(dynamic, geo)?;
        let transport = self.transport.compute(dynamic, geo, profiles, pedestal.as_ref())?;
        let sources = self.sources.compute(dynamic, geo, profiles)?;
        let conductivity = conductivity(dynamic, profiles)?;
        Ok(PhysicsSnapshot {
            pedestal,
            transport,
            sources,
            conductivity,
        })
    }
}
