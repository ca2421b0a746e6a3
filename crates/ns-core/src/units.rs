// ns-core/src/units.rs
//
// Code units: G = c = 1 with lengths in kilometres. Masses are therefore
// lengths (km) and pressure/energy density carry units of km^-2.

use uom::si::f64::{MassDensity as UomMassDensity, Pressure as UomPressure};

// SI quantities accepted at the input boundary
pub type Pressure = UomPressure;
pub type Density = UomMassDensity;

/// One solar mass expressed as a geometric length, GM☉/c² [km].
pub const MSUN_KM: f64 = 1.4766;

/// Multiply a pressure or energy density in MeV·fm⁻³ by this to get code units.
pub const MEV_FM3_TO_CODE: f64 = 1.323_790e-6;

/// G/c⁴ in km⁻² per pascal.
pub const PA_TO_CODE: f64 = 8.262_445e-39;

/// G/c² in km⁻² per kg·m⁻³; converts a mass density to an energy density.
pub const KG_M3_TO_CODE: f64 = 7.425_915e-22;

/// Code-unit mass [km] to solar masses.
#[inline]
pub fn mass_to_solar(m_code: f64) -> f64 {
    m_code / MSUN_KM
}

/// Solar masses to code-unit mass [km].
#[inline]
pub fn solar_to_code(m_solar: f64) -> f64 {
    m_solar * MSUN_KM
}

/// MeV·fm⁻³ to code-unit pressure or energy density [km⁻²].
#[inline]
pub fn mev_fm3_to_code(v: f64) -> f64 {
    v * MEV_FM3_TO_CODE
}

#[inline]
pub fn dyn_cm2(v: f64) -> Pressure {
    use uom::si::pressure::dyne_per_square_centimeter;
    Pressure::new::<dyne_per_square_centimeter>(v)
}

#[inline]
pub fn g_cm3(v: f64) -> Density {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    Density::new::<gram_per_cubic_centimeter>(v)
}

/// Pressure in code units [km⁻²].
#[inline]
pub fn pressure_to_code(p: Pressure) -> f64 {
    use uom::si::pressure::pascal;
    p.get::<pascal>() * PA_TO_CODE
}

/// Energy density (ε = ρc²) in code units [km⁻²] from a mass density.
#[inline]
pub fn density_to_code(rho: Density) -> f64 {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    rho.get::<kilogram_per_cubic_meter>() * KG_M3_TO_CODE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_mass_round_trip() {
        let m = solar_to_code(1.4);
        assert!((m - 2.067_24).abs() < 1e-9);
        assert!((mass_to_solar(m) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn cgs_inputs_to_code_units() {
        let p = pressure_to_code(dyn_cm2(1.0));
        assert!((p / 8.262_445e-40 - 1.0).abs() < 1e-12);

        let e = density_to_code(g_cm3(1.0));
        assert!((e / 7.425_915e-19 - 1.0).abs() < 1e-12);

        // nuclear saturation density ~2.7e14 g/cm^3 is ~2e-4 km^-2
        let e_sat = density_to_code(g_cm3(2.7e14));
        assert!(e_sat > 1.9e-4 && e_sat < 2.1e-4, "e_sat = {e_sat}");
    }

    #[test]
    fn mev_factor_agrees_with_si_path() {
        use uom::si::pressure::pascal;

        // 1 MeV/fm^3 = 1.602176634e32 Pa
        let via_si = pressure_to_code(Pressure::new::<pascal>(1.602_176_634e32));
        assert!((via_si / mev_fm3_to_code(1.0) - 1.0).abs() < 1e-4);
    }
}
