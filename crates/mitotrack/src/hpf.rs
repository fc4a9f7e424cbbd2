//! Mitotic density arithmetic over high-power fields (HPF).
//!
//! Converts a scan's resolution metadata into an estimated HPF count, turns
//! the mitotic tally into the standard mitoses-per-10-HPF density, and maps
//! the density onto the three-tier grade. The caller supplies numeric
//! resolution values; reading them out of the slide file is a collaborator
//! concern.

use anyhow::{bail, Result};

/// Standard high-power field area in square millimeters.
const HPF_AREA_MM2: f64 = 0.237;

/// Aspect ratio of the HPF window.
const HPF_ASPECT_RATIO: f64 = 4.0 / 3.0;

/// Unit of the scanner's resolution metadata, following the TIFF
/// `ResolutionUnit` tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionUnit {
    Inch,
    Centimeter,
}

impl ResolutionUnit {
    /// Returns the unit for a TIFF `ResolutionUnit` tag value (2 = inch,
    /// 3 = centimeter). Tag value 1 means "no absolute unit" and cannot
    /// anchor a physical density, so it is rejected.
    pub fn from_tag(value: u16) -> Result<ResolutionUnit> {
        match value {
            2 => Ok(ResolutionUnit::Inch),
            3 => Ok(ResolutionUnit::Centimeter),
            _ => bail!("unsupported or undefined ResolutionUnit tag: {value}"),
        }
    }

    fn microns(&self) -> f64 {
        match self {
            ResolutionUnit::Inch => 25_400.0,
            ResolutionUnit::Centimeter => 10_000.0,
        }
    }
}

/// Returns the pixel pitch `(x, y)` in microns per pixel for resolution
/// values expressed in pixels per unit.
pub fn microns_per_pixel(
    x_resolution: f64,
    y_resolution: f64,
    unit: ResolutionUnit,
) -> Result<(f64, f64)> {
    if x_resolution <= 0.0 || y_resolution <= 0.0 {
        bail!("resolution values must be positive: {x_resolution}, {y_resolution}");
    }
    Ok((unit.microns() / x_resolution, unit.microns() / y_resolution))
}

/// Returns the HPF window dimensions `(width, height)` in whole pixels for
/// the given pixel pitch.
pub fn hpf_dimensions_in_pixels(x_mpp: f64, y_mpp: f64) -> (u32, u32) {
    let hpf_area_um2 = HPF_AREA_MM2 * 1e6;
    let hpf_width_um = (hpf_area_um2 * HPF_ASPECT_RATIO).sqrt();
    let hpf_height_um = hpf_width_um / HPF_ASPECT_RATIO;
    ((hpf_width_um / x_mpp) as u32, (hpf_height_um / y_mpp) as u32)
}

/// Returns the estimated number of HPFs covered by a scan that steps a
/// window across an image of the given dimensions.
///
/// # Parameters
///
/// * `image_width`, `image_height`: Scanned image dimensions in pixels.
/// * `step_x`, `step_y`: Scan step sizes in pixels.
/// * `hpf_width`, `hpf_height`: HPF window dimensions in pixels.
pub fn estimate_hpf_count(
    image_width: u32,
    image_height: u32,
    step_x: u32,
    step_y: u32,
    hpf_width: u32,
    hpf_height: u32,
) -> Result<u64> {
    if step_x == 0 || step_y == 0 {
        bail!("scan steps must be positive: {step_x}, {step_y}");
    }
    let hpf_area = hpf_width as u64 * hpf_height as u64;
    if hpf_area == 0 {
        bail!("HPF window is smaller than one pixel");
    }
    let total_scan_area = (image_width / step_x) as u64
        * (image_height / step_y) as u64
        * (step_x as u64 * step_y as u64);
    Ok(total_scan_area / hpf_area)
}

/// Returns the mitotic density as mitoses per 10 HPF. Zero when no fields
/// were scanned.
pub fn mitoses_per_10_hpf(mitotic_count: usize, hpf_count: u64) -> f64 {
    if hpf_count == 0 {
        0.0
    } else {
        mitotic_count as f64 / hpf_count as f64 * 10.0
    }
}

/// Returns the tumor grade for a mitotic density:
///
/// * Grade 1: fewer than 8 mitoses per 10 HPF
/// * Grade 2: 8 to 14 mitoses per 10 HPF
/// * Grade 3: 15 or more mitoses per 10 HPF
pub fn tumor_grade(mitoses_per_10_hpf: f64) -> u8 {
    if mitoses_per_10_hpf < 8.0 {
        1
    } else if mitoses_per_10_hpf < 15.0 {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn resolution_unit_tags() {
        assert_eq!(ResolutionUnit::from_tag(2).unwrap(), ResolutionUnit::Inch);
        assert_eq!(
            ResolutionUnit::from_tag(3).unwrap(),
            ResolutionUnit::Centimeter
        );
        assert!(ResolutionUnit::from_tag(1).is_err());
        assert!(ResolutionUnit::from_tag(0).is_err());
    }

    #[test]
    fn pixel_pitch_from_resolution() {
        let (x, y) = microns_per_pixel(25_400.0, 12_700.0, ResolutionUnit::Inch).unwrap();
        assert_approx_eq!(x, 1.0);
        assert_approx_eq!(y, 2.0);

        let (x, y) = microns_per_pixel(10_000.0, 10_000.0, ResolutionUnit::Centimeter).unwrap();
        assert_approx_eq!(x, 1.0);
        assert_approx_eq!(y, 1.0);

        assert!(microns_per_pixel(0.0, 1.0, ResolutionUnit::Inch).is_err());
    }

    #[test]
    fn hpf_window_at_unit_pitch() {
        // 0.237 mm^2 at 4:3 is a 562.14 x 421.60 um field
        assert_eq!(hpf_dimensions_in_pixels(1.0, 1.0), (562, 421));
        // coarser pitch shrinks the window in pixels
        assert_eq!(hpf_dimensions_in_pixels(2.0, 2.0), (281, 210));
    }

    #[test]
    fn hpf_count_for_exact_cover() {
        // scan area is exactly 100 HPF windows
        let count = estimate_hpf_count(5620, 4210, 10, 10, 562, 421).unwrap();
        assert_eq!(count, 100);

        assert!(estimate_hpf_count(5620, 4210, 0, 10, 562, 421).is_err());
        assert!(estimate_hpf_count(5620, 4210, 10, 10, 0, 421).is_err());
    }

    #[test]
    fn density_and_grade() {
        assert_approx_eq!(mitoses_per_10_hpf(30, 100), 3.0);
        assert_approx_eq!(mitoses_per_10_hpf(0, 100), 0.0);
        // no fields scanned resolves to zero rather than dividing by zero
        assert_approx_eq!(mitoses_per_10_hpf(30, 0), 0.0);

        assert_eq!(tumor_grade(0.0), 1);
        assert_eq!(tumor_grade(7.99), 1);
        assert_eq!(tumor_grade(8.0), 2);
        assert_eq!(tumor_grade(14.99), 2);
        assert_eq!(tumor_grade(15.0), 3);
        assert_eq!(tumor_grade(40.0), 3);
    }
}
