//! Static half-court geometry

use super::path::{Path, deg_to_rad};
use super::{Rect, Surface, Theme};
use crate::constants::*;
use crate::coords::CourtSize;

/// Clear the surface to the background and draw every court line.
pub fn draw_court<S: Surface>(surface: &mut S, size: &CourtSize, theme: &Theme) {
    surface.clear(theme.background);

    let ft = |feet: f64| size.feet_to_pixels(feet);
    let center = size.width / 2.0;
    let line_width = ft(LINE_WIDTH_FT);
    let basket_y = ft(BASKET_DISTANCE_TO_BACKLINE);
    let backboard_y = ft(BACKBOARD_DISTANCE_TO_BACKLINE);

    // Three-point line: corner straight, arc, corner straight
    let mut three = Path::new();
    three
        .move_to(ft(THREE_POINT_LINE_DISTANCE), 0.0)
        .line_to(ft(THREE_POINT_LINE_DISTANCE), ft(THREE_POINT_LINE_STRAIGHT_LENGTH))
        .arc(
            center,
            basket_y,
            ft(THREE_POINT_LINE_RADIUS),
            deg_to_rad(THREE_POINT_ARC_START_DEG),
            deg_to_rad(THREE_POINT_ARC_END_DEG),
            true,
        )
        .line_to(size.width - ft(THREE_POINT_LINE_DISTANCE), 0.0);
    surface.stroke_path(&three, theme.line, line_width);

    let mut backboard = Path::new();
    backboard
        .move_to(center - ft(BACKBOARD_WIDTH) / 2.0, backboard_y)
        .line_to(center + ft(BACKBOARD_WIDTH) / 2.0, backboard_y);
    surface.stroke_path(&backboard, theme.line, ft(BACKBOARD_DEPTH));

    let paint = Rect::new(
        center - ft(PAINTED_AREA_WIDTH) / 2.0,
        0.0,
        ft(PAINTED_AREA_WIDTH),
        ft(PAINTED_AREA_LENGTH),
    );
    surface.fill_rect(paint, theme.painted_area.with_alpha(theme.painted_alpha));
    surface.stroke_rect(paint, theme.line, line_width);

    let basket_radius = ft(BASKET_RADIUS);
    let mut connector = Path::new();
    connector
        .move_to(center, backboard_y)
        .line_to(center, basket_y - basket_radius);
    surface.stroke_path(&connector, theme.line, line_width);

    let mut basket = Path::new();
    basket.move_to(center + basket_radius, basket_y).arc(
        center,
        basket_y,
        basket_radius,
        0.0,
        std::f64::consts::TAU,
        false,
    );
    surface.stroke_path(&basket, theme.line, line_width);

    // Free-throw circle: solid half away from the basket, dashed half toward it
    let free_throw_y = ft(PAINTED_AREA_LENGTH);
    let free_throw_radius = ft(FREE_THROW_CIRCLE_RADIUS);
    let mut solid = Path::new();
    solid.move_to(center + free_throw_radius, free_throw_y).arc(
        center,
        free_throw_y,
        free_throw_radius,
        deg_to_rad(0.0),
        deg_to_rad(180.0),
        false,
    );
    surface.stroke_path(&solid, theme.line, line_width);

    let mut dashed = Path::new();
    dashed.move_to(center - free_throw_radius, free_throw_y).arc(
        center,
        free_throw_y,
        free_throw_radius,
        deg_to_rad(180.0),
        deg_to_rad(360.0),
        false,
    );
    let (on, off) = FREE_THROW_DASH;
    surface.stroke_path(&dashed.dashed(on, off), theme.line, line_width);

    let restricted_half = ft(RESTRICTED_AREA_WIDTH / 2.0);
    let mut restricted = Path::new();
    restricted
        .move_to(center - restricted_half, backboard_y)
        .line_to(center - restricted_half, backboard_y + ft(RESTRICTED_LINE_LENGTH))
        .arc(
            center,
            basket_y,
            ft(RESTRICTED_CIRCLE_RADIUS),
            deg_to_rad(180.0),
            deg_to_rad(360.0),
            true,
        )
        .line_to(center + restricted_half, backboard_y);
    surface.stroke_path(&restricted, theme.line, line_width);

    // Free-throw lane
    surface.stroke_rect(
        Rect::new(
            center - free_throw_radius,
            0.0,
            ft(2.0 * FREE_THROW_CIRCLE_RADIUS),
            free_throw_y,
        ),
        theme.line,
        line_width,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, RasterSurface};
    use image::Rgba;

    fn drawn(width: f64) -> (RasterSurface, CourtSize) {
        let size = CourtSize::from_width(width, 1.0);
        let mut surface = RasterSurface::new();
        surface.resize(&size);
        draw_court(&mut surface, &size, &Theme::default());
        (surface, size)
    }

    #[test]
    fn test_background_fills_far_corner() {
        let (surface, size) = drawn(500.0);
        let (w, h) = size.device_pixels();
        assert_eq!(surface.pixel(w - 1, h - 1), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_painted_area_is_tinted() {
        let (surface, size) = drawn(500.0);
        // Inside the paint, between lane line and basket
        let pixel = surface
            .pixel((size.width / 2.0 + 30.0) as u32, 150)
            .unwrap();
        assert!(pixel[0] < 255 && pixel[0] > 200, "got {:?}", pixel);
    }

    #[test]
    fn test_three_point_corner_is_stroked() {
        let (surface, size) = drawn(500.0);
        let x = size.feet_to_pixels(THREE_POINT_LINE_DISTANCE).round() as u32;
        let line = Theme::default().line;
        assert_eq!(surface.pixel(x, 50), Some(Rgba(line.to_rgba8())));
        assert_ne!(surface.pixel(x + 10, 50), Some(Rgba(line.to_rgba8())));
    }

    #[test]
    fn test_custom_background() {
        let size = CourtSize::from_width(200.0, 1.0);
        let mut surface = RasterSurface::new();
        surface.resize(&size);
        let theme = Theme {
            background: Color::rgb(10, 20, 30),
            ..Theme::default()
        };
        draw_court(&mut surface, &size, &theme);
        assert_eq!(surface.pixel(199, 149), Some(Rgba([10, 20, 30, 255])));
    }
}
