//! Coordinate conversion between extraction space and PDF drawing space.
//!
//! Extraction (viewport) space has its origin at the top-left of the page
//! with y growing downward. PDF drawing space has its origin at the
//! bottom-left with y growing upward. Every component that maps between the
//! two goes through this module so the sign convention lives in one place.

/// Convert a point from PDF drawing space to viewport (extraction) space.
///
/// The x axis is shared; only y flips.
pub fn pdf_to_viewport(x: f64, y: f64, page_height: f64) -> (f64, f64) {
    (x, page_height - y)
}

/// Convert the top-left corner of a box in viewport space to the
/// bottom-left corner of the same box in PDF drawing space.
///
/// `draw_y = page_height - y - box_height`, clamped so the box stays on
/// the page.
pub fn viewport_to_pdf(x: f64, y: f64, box_height: f64, page_height: f64) -> (f64, f64) {
    let draw_y = page_height - y - box_height;
    let max_y = (page_height - box_height).max(0.0);
    (x.max(0.0), draw_y.clamp(0.0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_pdf_to_viewport_flips_y() {
        let (x, y) = pdf_to_viewport(100.0, 700.0, 792.0);
        assert_eq!(x, 100.0);
        assert_eq!(y, 92.0);
    }

    #[test]
    fn test_viewport_to_pdf_accounts_for_box_height() {
        // A 20pt-tall box whose top edge sits 92pt from the top of a letter
        // page has its bottom edge at 792 - 92 - 20 = 680 in drawing space.
        let (x, y) = viewport_to_pdf(100.0, 92.0, 20.0, 792.0);
        assert_eq!(x, 100.0);
        assert_eq!(y, 680.0);
    }

    #[test]
    fn test_viewport_to_pdf_clamps_below_page() {
        let (_, y) = viewport_to_pdf(10.0, 800.0, 20.0, 792.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_viewport_to_pdf_clamps_above_page() {
        let (_, y) = viewport_to_pdf(10.0, -50.0, 20.0, 792.0);
        assert_eq!(y, 772.0);
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_page(
            x in 0.0f64..612.0,
            y in 0.0f64..772.0,
            h in 1.0f64..20.0,
        ) {
            // viewport -> pdf -> viewport recovers the original top edge
            // whenever the box already fits on the page.
            let (px, py) = viewport_to_pdf(x, y, h, 792.0);
            let (vx, vy) = pdf_to_viewport(px, py, 792.0);
            prop_assert!((vx - x).abs() < 1e-9);
            prop_assert!((vy - h - y).abs() < 1e-9);
        }

        #[test]
        fn prop_converted_box_stays_on_page(
            x in -100.0f64..800.0,
            y in -100.0f64..900.0,
            h in 1.0f64..50.0,
        ) {
            let (px, py) = viewport_to_pdf(x, y, h, 792.0);
            prop_assert!(px >= 0.0);
            prop_assert!(py >= 0.0);
            prop_assert!(py + h <= 792.0 + 1e-9);
        }
    }
}
