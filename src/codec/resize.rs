use image::imageops::FilterType;
use image::DynamicImage;

/// Fit-inside dimensions for a width cap: scale down preserving aspect ratio
/// so the width equals `max_width`, never enlarge.
pub fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scale = max_width as f64 / width as f64;
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    (max_width, new_height)
}

/// Resize to `max_width` with derived height, Lanczos3 filter.
///
/// Callers are expected to skip the call entirely when the image already
/// fits; this returns an untouched copy in that case.
pub fn resize_to_width(img: &DynamicImage, max_width: u32) -> DynamicImage {
    let (target_w, target_h) = fit_width(img.width(), img.height(), max_width);
    if (target_w, target_h) == (img.width(), img.height()) {
        return img.clone();
    }
    img.resize_exact(target_w, target_h, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_width_scales_down() {
        assert_eq!(fit_width(2400, 1600, 1200), (1200, 800));
        assert_eq!(fit_width(2000, 1000, 500), (500, 250));
    }

    #[test]
    fn test_fit_width_never_upscales() {
        assert_eq!(fit_width(800, 600, 2000), (800, 600));
        assert_eq!(fit_width(1200, 800, 1200), (1200, 800));
    }

    #[test]
    fn test_fit_width_guards_one_pixel_height() {
        // Extreme aspect ratios must not round height down to zero
        assert_eq!(fit_width(10_000, 1, 100), (100, 1));
    }

    #[test]
    fn test_resize_to_width() {
        let img = DynamicImage::new_rgb8(100, 50);
        let resized = resize_to_width(&img, 40);
        assert_eq!(resized.width(), 40);
        assert_eq!(resized.height(), 20);
    }

    #[test]
    fn test_resize_to_width_keeps_small_images() {
        let img = DynamicImage::new_rgb8(100, 50);
        let resized = resize_to_width(&img, 2000);
        assert_eq!(resized.width(), 100);
        assert_eq!(resized.height(), 50);
    }
}
