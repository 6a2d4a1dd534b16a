use image::RgbaImage;

/// Separable Gaussian blur over straight RGBA8, radius in pixels.
///
/// Channels blur independently; for constant-color silhouettes (the shadow
/// path) this is exact. Radius 0 returns the input unchanged. Weights are
/// Q16 fixed-point and renormalized so each pass sums to exactly 1.0,
/// keeping the output byte-deterministic across platforms.
pub fn gaussian_blur(src: &RgbaImage, radius: u32, sigma: f32) -> RgbaImage {
    if radius == 0 || src.width() == 0 || src.height() == 0 {
        return src.clone();
    }
    let sigma = if sigma.is_finite() && sigma > 0.0 {
        sigma
    } else {
        (radius as f32) / 2.0
    };

    let kernel = gaussian_kernel_q16(radius, sigma);
    let (width, height) = src.dimensions();

    let mut tmp = vec![0u8; src.as_raw().len()];
    let mut out = RgbaImage::new(width, height);
    horizontal_pass(src.as_raw(), &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    out
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Vec<u32> {
    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;

    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Push rounding residue into the center tap so the kernel sums to 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }
    weights
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dx = ki as i32 - radius;
                let sx = (x + dx).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dy = ki as i32 - radius;
                let sy = (y + dy).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn radius_0_is_identity() {
        let src = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        assert_eq!(gaussian_blur(&src, 0, 1.0), src);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let src = RgbaImage::from_pixel(5, 4, Rgba([10, 20, 30, 40]));
        assert_eq!(gaussian_blur(&src, 3, 2.0), src);
    }

    #[test]
    fn energy_spreads_from_a_single_pixel() {
        let mut src = RgbaImage::new(5, 5);
        src.put_pixel(2, 2, Rgba([255, 255, 255, 255]));

        let out = gaussian_blur(&src, 2, 1.2);

        let nonzero = out.pixels().filter(|p| p.0[3] != 0).count();
        assert!(nonzero > 1);

        // Total alpha is preserved up to rounding.
        let sum_a: u32 = out.pixels().map(|p| u32::from(p.0[3])).sum();
        assert!((sum_a as i32 - 255).abs() <= 4, "sum = {sum_a}");
    }

    #[test]
    fn nonpositive_sigma_falls_back_to_half_radius() {
        let mut src = RgbaImage::new(5, 1);
        src.put_pixel(2, 0, Rgba([0, 0, 0, 255]));
        let a = gaussian_blur(&src, 2, 0.0);
        let b = gaussian_blur(&src, 2, 1.0);
        assert_eq!(a, b);
    }
}
