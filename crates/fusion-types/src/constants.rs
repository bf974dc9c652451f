// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Vacuum permeability (H/m) - real SI value.
pub const MU0_SI: f64 = 1.2566370614e-6;

/// Elementary charge (C)
pub const Q_ELECTRON: f64 = 1.602176634e-19;

/// Energy of 1 keV in joules.
pub const KEV_TO_J: f64 = 1.0e3 * Q_ELECTRON;

/// Electron mass (kg)
pub const M_ELECTRON: f64 = 9.1093837015e-31;

/// Proton mass (kg)
pub const M_PROTON: f64 = 1.67262192369e-27;

/// Reference density: all densities are carried in units of 1e20 m^-3.
pub const DENSITY_REF: f64 = 1.0e20;

/// Coulomb logarithm used by the collisional exchange and Spitzer conductivity.
pub const COULOMB_LOG: f64 = 17.0;

/// Smallest positive value admitted in divisions by profile quantities.
pub const EPS: f64 = 1.0e-12;
