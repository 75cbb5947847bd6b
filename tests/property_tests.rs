//! Property-based tests for quantization and tiling invariants.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated lenses and phases.

use std::f64::consts::TAU;

use proptest::prelude::*;

use metalens_mask::core::lattice::{LatticeGenerator, LatticeMode};
use metalens_mask::core::library::UnitCellLibrary;
use metalens_mask::core::params::{GenerationConfig, LensParameters};
use metalens_mask::core::phase::{wrap_phase, PhaseQuantizer};
use metalens_mask::engine::generate::Generator;
use metalens_mask::engine::verify::verify;

/// Margin kept between a sampled phase and the nearest bin edge.
const EDGE_MARGIN: f64 = 1e-6;

fn catalog(count: usize) -> UnitCellLibrary {
    UnitCellLibrary::from_sweep(0.1, 0.9, count).unwrap()
}

/// A phase in `[0, 2π)` at least `EDGE_MARGIN` away from every bin edge.
fn interior_phase(count: usize) -> impl Strategy<Value = f64> {
    let step = TAU / count as f64;
    (0..count, EDGE_MARGIN..(1.0 - EDGE_MARGIN)).prop_map(move |(bin, t)| (bin as f64 + t) * step)
}

/// Sector counts that divide the full turn evenly.
fn sector_count() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![4u32, 6, 8, 12, 18, 36, 72])
}

proptest! {
    /// Adding whole turns never changes the chosen design.
    #[test]
    fn quantize_ignores_whole_turns(
        (count, phase) in (2usize..40).prop_flat_map(|n| (Just(n), interior_phase(n))),
        turns in -60i32..60,
    ) {
        let library = catalog(count);
        let quantizer = PhaseQuantizer::new(&library, None).unwrap();
        let shifted = phase + f64::from(turns) * TAU;
        prop_assert_eq!(quantizer.quantize(phase).unwrap(), quantizer.quantize(shifted).unwrap());
    }

    /// A phase strictly inside bin i maps to design i.
    #[test]
    fn interior_phase_maps_to_its_bin(
        (count, phase) in (2usize..40).prop_flat_map(|n| (Just(n), interior_phase(n))),
    ) {
        let library = catalog(count);
        let quantizer = PhaseQuantizer::new(&library, None).unwrap();
        let bin = (phase / (TAU / count as f64)).floor() as usize;
        prop_assert_eq!(quantizer.quantize(phase).unwrap(), bin);
    }

    /// Every finite phase resolves to a design in the catalog.
    #[test]
    fn any_finite_phase_is_in_range(count in 2usize..64, phase in -1.0e5f64..1.0e5) {
        let library = catalog(count);
        let quantizer = PhaseQuantizer::new(&library, None).unwrap();
        let index = quantizer.quantize(phase).unwrap();
        prop_assert!(index < count);
        let wrapped = wrap_phase(phase);
        prop_assert!((0.0..TAU).contains(&wrapped));
    }

    /// Ring radii step by exactly one period, across the lattice seam too.
    #[test]
    fn rings_cover_the_aperture(
        period in 0.5f64..4.0,
        array_size in 10u32..400,
        inner_fraction in 0.0f64..0.9,
    ) {
        let params = LensParameters::new(1000.0, 1.0, period, array_size).unwrap();
        let inner = inner_fraction * params.aperture_radius();
        let config = GenerationConfig::new(&params, inner, 36, 10.0).unwrap();
        let lattice = LatticeGenerator::new(&params, &config);

        let full = lattice.full_disk_radii();
        let sector = lattice.sector_radii();
        prop_assert_eq!(full[0], 0.0);
        prop_assert!(full.iter().all(|&r| r < inner.max(period)));

        prop_assert!(sector[0] >= inner - period * 1e-9);

        let mut radii = full.clone();
        radii.extend(&sector);
        for (i, &r) in radii.iter().enumerate() {
            prop_assert!((r - i as f64 * period).abs() <= period * 1e-9);
        }
        for pair in radii.windows(2) {
            prop_assert!((pair[1] - pair[0] - period).abs() <= period * 1e-9);
        }
        let outer = *radii.last().unwrap();
        prop_assert!((outer - params.aperture_radius()).abs() <= period * 1e-9);
    }

    /// Sector rings sample at least the period along the arc.
    #[test]
    fn sector_sampling_is_dense_enough(
        radius in 1.0f64..5000.0,
        period in 0.5f64..4.0,
        count in sector_count(),
    ) {
        let params = LensParameters::new(1000.0, 1.0, period, 10_000).unwrap();
        let config = GenerationConfig::new(&params, 0.0, count, 360.0 / f64::from(count)).unwrap();
        let lattice = LatticeGenerator::new(&params, &config);

        let samples = lattice.angular_samples(radius, LatticeMode::Sector).unwrap();
        let arc = radius * config.sector_span_rad() / samples as f64;
        prop_assert!(arc <= period * (1.0 + 1e-9));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Generated layouts always pass verification.
    #[test]
    fn generated_layouts_verify(
        array_size in 10u32..70,
        inner_fraction in 0.0f64..0.8,
        count in sector_count(),
        designs in 2usize..24,
    ) {
        let params = LensParameters::new(300.0, 1.0, 1.0, array_size).unwrap();
        let inner = inner_fraction * params.aperture_radius();
        let config = GenerationConfig::new(&params, inner, count, 360.0 / f64::from(count)).unwrap();
        let library = catalog(designs);

        let layout = Generator::new(&params, &config, &library, None)
            .unwrap()
            .generate()
            .unwrap();
        prop_assert_eq!(verify(&layout, &params, &config, designs), Ok(()));
        prop_assert_eq!(
            layout.flatten().count(),
            layout.sector.len() * count as usize + layout.inner_disk.len()
        );
        for p in layout.flatten() {
            prop_assert!(p.position.norm() <= params.aperture_radius() + 1e-9);
        }
        // The two lattices stay a full period apart at the seam.
        let inner_max = layout.inner_disk.iter().map(|p| p.position.norm()).fold(0.0, f64::max);
        let sector_min = layout.sector.iter().map(|p| p.position.norm()).fold(f64::INFINITY, f64::min);
        prop_assert!(sector_min - inner_max >= 1.0 - 1e-9);
    }
}
