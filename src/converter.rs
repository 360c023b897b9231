use image::RgbaImage;
use log::debug;

use crate::cli::RampStyle;

/// ITU-R BT.601 luma weights, in thousandths so white sums to exactly 1.0
const LUMA_R: u32 = 299;
const LUMA_G: u32 = 587;
const LUMA_B: u32 = 114;

/// Ordered glyphs from visually sparsest to densest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRamp {
    glyphs: Vec<char>,
}

impl CharacterRamp {
    /// Build a ramp from a glyph sequence. Returns `None` for an empty sequence.
    pub fn new(glyphs: impl IntoIterator<Item = char>) -> Option<Self> {
        let glyphs: Vec<char> = glyphs.into_iter().collect();
        if glyphs.is_empty() {
            None
        } else {
            Some(Self { glyphs })
        }
    }

    /// Ramp for a palette style
    pub fn for_style(style: RampStyle) -> Self {
        let glyphs = match style {
            RampStyle::Ascii => crate::DEFAULT_ASCII_RAMP,
            RampStyle::Extended => crate::EXTENDED_ASCII_RAMP,
            RampStyle::Blocks => crate::BLOCK_ASCII_RAMP,
        };
        Self {
            glyphs: glyphs.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    pub fn first(&self) -> char {
        self.glyphs[0]
    }

    pub fn last(&self) -> char {
        self.glyphs[self.glyphs.len() - 1]
    }

    /// Glyph for an already contrast-adjusted brightness in [0, 1]
    pub fn glyph(&self, adjusted: f64) -> char {
        self.glyphs[char_index(adjusted, self.glyphs.len())]
    }
}

impl Default for CharacterRamp {
    fn default() -> Self {
        Self::for_style(RampStyle::Ascii)
    }
}

/// Perceptual brightness of an RGB triple, in [0, 1]
pub fn brightness(r: u8, g: u8, b: u8) -> f64 {
    let weighted = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32;
    weighted as f64 / 255_000.0
}

/// Apply the contrast curve `brightness^(1/contrast)`.
///
/// The input is clamped to [0, 1] first. A non-positive or non-finite
/// contrast leaves the brightness unchanged.
pub fn adjust_brightness(brightness: f64, contrast: f64) -> f64 {
    let brightness = if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 1.0)
    };
    if !(contrast.is_finite() && contrast > 0.0) {
        return brightness;
    }
    brightness.powf(1.0 / contrast)
}

/// Index into a ramp of `ramp_len` glyphs for an adjusted brightness
pub fn char_index(adjusted: f64, ramp_len: usize) -> usize {
    if ramp_len == 0 {
        return 0;
    }
    let max = ramp_len - 1;
    let index = (adjusted * max as f64).floor();
    if index.is_nan() || index < 0.0 {
        0
    } else {
        (index as usize).min(max)
    }
}

/// Map an RGBA pixel buffer to text, one glyph per pixel and a newline per row.
///
/// Alpha is ignored. The output holds `height * (width + 1)` chars.
pub fn map_pixels(pixels: &RgbaImage, contrast: f64, ramp: &CharacterRamp) -> String {
    let (width, height) = pixels.dimensions();
    let mut out = String::with_capacity((height as usize) * (width as usize + 1));

    for row in pixels.rows() {
        for pixel in row {
            let [r, g, b, _] = pixel.0;
            let adjusted = adjust_brightness(brightness(r, g, b), contrast);
            out.push(ramp.glyph(adjusted));
        }
        out.push('\n');
    }

    out
}

/// ASCII conversion configuration
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Character ramp to use
    pub ramp: CharacterRamp,
    /// Contrast exponent (1.0 = normal)
    pub contrast: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ramp: CharacterRamp::default(),
            contrast: crate::DEFAULT_CONTRAST,
        }
    }
}

/// Pixel buffer to ASCII converter holding the user-adjustable settings
#[derive(Debug, Clone, Default)]
pub struct FrameConverter {
    config: ConversionConfig,
}

impl FrameConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn contrast(&self) -> f64 {
        self.config.contrast
    }

    pub fn set_contrast(&mut self, contrast: f64) {
        debug!("Contrast set to {:.1}", contrast);
        self.config.contrast = contrast;
    }

    pub fn ramp(&self) -> &CharacterRamp {
        &self.config.ramp
    }

    /// Convert a sampled pixel buffer to its text block
    pub fn convert(&self, pixels: &RgbaImage) -> String {
        map_pixels(pixels, self.config.contrast, &self.config.ramp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn uniform(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_brightness_extremes() {
        assert_eq!(brightness(0, 0, 0), 0.0);
        assert!((brightness(255, 255, 255) - 1.0).abs() < 1e-9);

        // Green dominates red, red dominates blue
        assert!(brightness(0, 255, 0) > brightness(255, 0, 0));
        assert!(brightness(255, 0, 0) > brightness(0, 0, 255));
    }

    #[test]
    fn test_contrast_identity() {
        for step in 0..=20 {
            let b = step as f64 / 20.0;
            assert!((adjust_brightness(b, 1.0) - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_contrast_monotonic() {
        for &contrast in &[0.1, 0.5, 1.0, 1.7, 3.0] {
            let mut previous = -1.0;
            for step in 0..=100 {
                let adjusted = adjust_brightness(step as f64 / 100.0, contrast);
                assert!(adjusted >= previous, "contrast {} step {}", contrast, step);
                previous = adjusted;
            }
        }
    }

    #[test]
    fn test_contrast_direction() {
        assert!(adjust_brightness(0.5, 2.0) > 0.5);
        assert!(adjust_brightness(0.5, 0.5) < 0.5);
    }

    #[test]
    fn test_out_of_range_brightness_is_clamped() {
        assert_eq!(adjust_brightness(-0.3, 1.0), 0.0);
        assert_eq!(adjust_brightness(1.4, 2.0), 1.0);
        assert_eq!(adjust_brightness(f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_char_index_bounds() {
        assert_eq!(char_index(0.0, 10), 0);
        assert_eq!(char_index(1.0, 10), 9);
        assert_eq!(char_index(0.5, 10), 4);
        assert_eq!(char_index(1.0, 1), 0);
        assert_eq!(char_index(0.7, 0), 0);

        for &contrast in &[0.1, 1.0, 3.0] {
            for step in 0..=50 {
                let adjusted = adjust_brightness(step as f64 / 50.0, contrast);
                assert!(char_index(adjusted, 10) <= 9);
            }
        }
    }

    #[test]
    fn test_black_frame() {
        let ramp = CharacterRamp::default();
        for &contrast in &[0.1, 1.0, 3.0] {
            let text = map_pixels(&uniform(8, 3, 0), contrast, &ramp);
            assert_eq!(text.chars().count(), 3 * 9);
            assert_eq!(text.matches('\n').count(), 3);
            assert!(text.chars().filter(|c| *c != '\n').all(|c| c == ' '));
        }
    }

    #[test]
    fn test_white_frame() {
        let ramp = CharacterRamp::default();
        for &contrast in &[0.1, 1.0, 3.0] {
            let text = map_pixels(&uniform(5, 4, 255), contrast, &ramp);
            assert_eq!(text.matches('\n').count(), 4);
            assert!(text.chars().filter(|c| *c != '\n').all(|c| c == '@'));
        }
    }

    #[test]
    fn test_row_major_order() {
        let mut pixels = uniform(2, 2, 0);
        pixels.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        pixels.put_pixel(0, 1, Rgba([255, 255, 255, 255]));

        let text = map_pixels(&pixels, 1.0, &CharacterRamp::default());
        assert_eq!(text, " @\n@ \n");
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mut pixels = uniform(4, 2, 90);
        pixels.put_pixel(3, 1, Rgba([10, 200, 30, 0]));
        let converter = FrameConverter::default();
        assert_eq!(converter.convert(&pixels), converter.convert(&pixels));
    }

    #[test]
    fn test_multibyte_ramp() {
        let ramp = CharacterRamp::for_style(RampStyle::Blocks);
        let text = map_pixels(&uniform(3, 1, 255), 1.0, &ramp);
        assert_eq!(text, "███\n");
    }

    #[test]
    fn test_empty_ramp_rejected() {
        assert!(CharacterRamp::new(Vec::new()).is_none());
        let ramp = CharacterRamp::new("ab".chars()).unwrap();
        assert_eq!(ramp.first(), 'a');
        assert_eq!(ramp.last(), 'b');
    }
}
