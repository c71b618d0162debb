// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use ar_depth_cloud::constants::DensityPreset;

#[test]
fn test_density_preset_values() {
    // Test that all presets exist (Sparse, Balanced, Dense)
    assert_eq!(DensityPreset::ALL.len(), 3);
}

#[test]
fn test_density_preset_ordering() {
    // Presets are ordered from sparsest to densest
    let mut prev_samples = 0usize;
    for preset in DensityPreset::ALL {
        let samples = preset.max_samples(256, 192);
        assert!(
            samples > prev_samples,
            "Presets should be ordered from sparsest to densest"
        );
        prev_samples = samples;
    }
}

#[test]
fn test_samples_scale_with_resolution() {
    let small = DensityPreset::Balanced.max_samples(160, 90);
    let large = DensityPreset::Balanced.max_samples(320, 180);
    assert!(small < large);
}

#[test]
fn test_density_preset_display_names() {
    for preset in DensityPreset::ALL {
        let name = preset.display_name();
        assert!(
            !name.is_empty(),
            "Preset {:?} has empty display name",
            preset
        );
    }
}
