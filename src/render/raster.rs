//! In-memory RGBA raster backend built on `image` + `imageproc`

use std::path::Path as FsPath;

use image::{ImageResult, Rgba, RgbaImage, imageops};
use imageproc::drawing::{
    Canvas as PixelCanvas, draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut,
    draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect as PixelRect;

use super::path::Path;
use super::{Canvas, Color, Rect, Surface};
use crate::coords::CourtSize;

/// Strokes at or below this device width use a 1px Bresenham line
const HAIRLINE_WIDTH: f64 = 1.5;

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba8())
}

/// Porter-Duff source-over in integer arithmetic. An opaque destination
/// stays exactly opaque.
pub fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a_s = src[3] as u32;
    if a_s == 255 {
        return src;
    }
    if a_s == 0 {
        return dst;
    }
    let a_d = dst[3] as u32;
    // Alpha scaled by 255^2
    let alpha = a_s * 255 + a_d * (255 - a_s);
    if alpha == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let num = src[i] as u32 * a_s * 255 + dst[i] as u32 * a_d * (255 - a_s);
        ((num + alpha / 2) / alpha) as u8
    };
    Rgba([channel(0), channel(1), channel(2), ((alpha + 127) / 255) as u8])
}

/// RGBA image whose pixel writes composite with [`source_over`]
struct SourceOver(RgbaImage);

impl PixelCanvas for SourceOver {
    type Pixel = Rgba<u8>;

    fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.0.get_pixel(x, y)
    }

    fn draw_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let dst = self.0.get_pixel_mut(x, y);
        *dst = source_over(*dst, color);
    }
}

/// A blending RGBA image with a CSS-to-device scale
pub struct RasterSurface {
    canvas: SourceOver,
    scale: f64,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    pub fn new() -> Self {
        Self {
            canvas: SourceOver(RgbaImage::new(0, 0)),
            scale: 1.0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas.0
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas.0
    }

    /// Device-pixel lookup, `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        let image = &self.canvas.0;
        (x < image.width() && y < image.height()).then(|| *image.get_pixel(x, y))
    }

    pub fn save_png(&self, path: &FsPath) -> ImageResult<()> {
        self.canvas.0.save(path)
    }

    fn is_empty(&self) -> bool {
        self.canvas.0.width() == 0 || self.canvas.0.height() == 0
    }

    fn device(&self, v: f64) -> f64 {
        v * self.scale
    }

    /// Device-pixel bounds `(x0, y0, x1, y1)` with x0 <= x1 and y0 <= y1
    fn device_bounds(&self, rect: Rect) -> Option<(i32, i32, i32, i32)> {
        let coords = [
            self.device(rect.x),
            self.device(rect.y),
            self.device(rect.x + rect.width),
            self.device(rect.y + rect.height),
        ];
        if coords.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let [ax, ay, bx, by] = coords.map(|c| c.round() as i32);
        let (x0, x1) = (ax.min(bx), ax.max(bx));
        let (y0, y1) = (ay.min(by), ay.max(by));
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }

    fn stroke_segment(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba<u8>) {
        if width <= HAIRLINE_WIDTH {
            draw_line_segment_mut(
                &mut self.canvas,
                (from.0 as f32, from.1 as f32),
                (to.0 as f32, to.1 as f32),
                color,
            );
            return;
        }

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f64::EPSILON {
            return;
        }
        let half = width / 2.0;
        let (nx, ny) = (-dy / length * half, dx / length * half);
        let corner = |x: f64, y: f64| Point::new(x.round() as i32, y.round() as i32);
        let quad = [
            corner(from.0 + nx, from.1 + ny),
            corner(to.0 + nx, to.1 + ny),
            corner(to.0 - nx, to.1 - ny),
            corner(from.0 - nx, from.1 - ny),
        ];
        if quad[0] != quad[3] {
            draw_polygon_mut(&mut self.canvas, &quad, color);
        }
    }
}

impl Surface for RasterSurface {
    type Snapshot = RgbaImage;

    fn resize(&mut self, size: &CourtSize) {
        let (width, height) = size.device_pixels();
        self.canvas = SourceOver(RgbaImage::new(width, height));
        self.scale = size.pixel_ratio;
    }

    fn clear(&mut self, color: Color) {
        let pixel = rgba(color);
        for p in self.canvas.0.pixels_mut() {
            *p = pixel;
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if self.is_empty() {
            return;
        }
        if let Some((x0, y0, x1, y1)) = self.device_bounds(rect) {
            let pixel_rect = PixelRect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32);
            draw_filled_rect_mut(&mut self.canvas, pixel_rect, rgba(color));
        }
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f64, color: Color) {
        if self.is_empty() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.device_bounds(rect) else {
            return;
        };
        let (width, height) = ((x1 - x0) as f64, (y1 - y0) as f64);
        let r = self.device(radius).min(width / 2.0).min(height / 2.0).max(0.0);

        let pixel = rgba(color);
        let (max_x, max_y) = (self.canvas.0.width() as i32, self.canvas.0.height() as i32);
        // Per-pixel coverage so translucent fills blend exactly once
        for py in y0.max(0)..y1.min(max_y) {
            for px in x0.max(0)..x1.min(max_x) {
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;
                let qx = (cx - x0 as f64).min(x1 as f64 - cx);
                let qy = (cy - y0 as f64).min(y1 as f64 - cy);
                if qx < r && qy < r {
                    let (ox, oy) = (r - qx, r - qy);
                    if ox * ox + oy * oy > r * r {
                        continue;
                    }
                }
                self.canvas.draw_pixel(px as u32, py as u32, pixel);
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f64) {
        if self.is_empty() {
            return;
        }
        let width = self.device(line_width);
        let pixel = rgba(color);

        for points in path.subpaths() {
            let device: Vec<(f64, f64)> = points
                .iter()
                .map(|p| (self.device(p.x), self.device(p.y)))
                .collect();
            for pair in device.windows(2) {
                self.stroke_segment(pair[0], pair[1], width, pixel);
            }
            // Round joins keep thick polylines (arcs) free of notches
            if width >= 3.0 && device.len() > 2 {
                let radius = (width / 2.0).round() as i32;
                for &(x, y) in &device[1..device.len() - 1] {
                    draw_filled_circle_mut(
                        &mut self.canvas,
                        (x.round() as i32, y.round() as i32),
                        radius,
                        pixel,
                    );
                }
            }
        }
    }

    fn snapshot(&self) -> Option<RgbaImage> {
        Some(self.canvas.0.clone())
    }

    fn restore(&mut self, snapshot: &RgbaImage) {
        if self.canvas.0.dimensions() == snapshot.dimensions() {
            self.canvas.0.clone_from(snapshot);
        } else {
            imageops::replace(&mut self.canvas.0, snapshot, 0, 0);
        }
    }

    fn composite(&mut self, snapshot: &RgbaImage) {
        let (width, height) = self.canvas.0.dimensions();
        let width = width.min(snapshot.width());
        let height = height.min(snapshot.height());
        for y in 0..height {
            for x in 0..width {
                self.canvas.draw_pixel(x, y, *snapshot.get_pixel(x, y));
            }
        }
    }

    fn offscreen(&self) -> Option<Self> {
        Some(Self {
            canvas: SourceOver(RgbaImage::new(self.canvas.0.width(), self.canvas.0.height())),
            scale: self.scale,
        })
    }
}

/// Canvas handing out raster surfaces. A detached canvas has no 2D context.
#[derive(Debug, Clone, Default)]
pub struct RasterCanvas {
    detached: bool,
}

impl RasterCanvas {
    pub fn new() -> Self {
        Self { detached: false }
    }

    pub fn detached() -> Self {
        Self { detached: true }
    }
}

impl Canvas for RasterCanvas {
    type Surface = RasterSurface;

    fn context_2d(&mut self) -> Option<RasterSurface> {
        (!self.detached).then(RasterSurface::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: f64, ratio: f64) -> RasterSurface {
        let mut surface = RasterSurface::new();
        surface.resize(&CourtSize::from_width(width, ratio));
        surface
    }

    #[test]
    fn test_resize_uses_device_pixels() {
        let surface = surface(100.0, 2.0);
        assert_eq!(surface.image().dimensions(), (200, 150));
    }

    #[test]
    fn test_clear_and_fill_rect() {
        let mut surface = surface(100.0, 1.0);
        surface.clear(Color::rgb(255, 255, 255));
        surface.fill_rect(Rect::new(10.0, 10.0, 5.0, 5.0), Color::rgb(255, 0, 0));

        assert_eq!(surface.pixel(12, 12), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(surface.pixel(9, 9), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(surface.pixel(15, 15), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_fill_rect_is_scaled() {
        let mut surface = surface(100.0, 2.0);
        surface.fill_rect(Rect::new(10.0, 10.0, 5.0, 5.0), Color::rgb(0, 0, 255));
        assert_eq!(surface.pixel(29, 29), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(surface.pixel(30, 30), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut surface = surface(100.0, 1.0);
        surface.clear(Color::rgb(255, 255, 255));
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::rgb(0, 0, 0).with_alpha(0.5));
        let pixel = surface.pixel(5, 5).unwrap();
        assert!(pixel[0] > 100 && pixel[0] < 160, "got {:?}", pixel);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_source_over_keeps_opaque_destination_opaque() {
        let white = Rgba([255, 255, 255, 255]);
        for alpha in [1u8, 38, 64, 127, 128, 200, 254] {
            let out = source_over(white, Rgba([30, 90, 200, alpha]));
            assert_eq!(out[3], 255, "alpha {}", alpha);
        }
        assert_eq!(source_over(white, Rgba([0, 0, 0, 128])), Rgba([127, 127, 127, 255]));
        assert_eq!(source_over(white, Rgba([1, 2, 3, 0])), white);
        assert_eq!(
            source_over(Rgba([0, 0, 0, 0]), Rgba([10, 20, 30, 40])),
            Rgba([10, 20, 30, 40])
        );
        assert_eq!(
            source_over(Rgba([0, 0, 0, 0]), Rgba([0, 0, 0, 0])),
            Rgba([0, 0, 0, 0])
        );
    }

    #[test]
    fn test_translucent_composite_stays_opaque() {
        let mut surface = surface(20.0, 1.0);
        surface.clear(Color::rgb(255, 255, 255));
        let mut layer = surface.offscreen().unwrap();
        layer.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::rgb(255, 0, 0).with_alpha(0.25));

        surface.composite(layer.image());
        let pixel = surface.pixel(5, 5).unwrap();
        assert_eq!(pixel[3], 255);
        assert_eq!(pixel[0], 255);
        assert!(pixel[1] > 180 && pixel[1] < 200, "got {:?}", pixel);
        assert_eq!(surface.pixel(15, 5), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_round_rect_cuts_corners() {
        let mut surface = surface(100.0, 1.0);
        surface.fill_round_rect(Rect::new(10.0, 10.0, 20.0, 20.0), 8.0, Color::rgb(0, 255, 0));
        assert_eq!(surface.pixel(10, 10), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(surface.pixel(20, 20), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(surface.pixel(20, 10), Some(Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn test_stroke_path_hairline_and_thick() {
        let mut surface = surface(100.0, 1.0);
        let mut path = Path::new();
        path.move_to(5.0, 5.0).line_to(50.0, 5.0);
        surface.stroke_path(&path, Color::rgb(9, 9, 9), 1.0);
        assert_eq!(surface.pixel(30, 5), Some(Rgba([9, 9, 9, 255])));

        let mut thick = Path::new();
        thick.move_to(5.0, 40.0).line_to(50.0, 40.0);
        surface.stroke_path(&thick, Color::rgb(7, 7, 7), 6.0);
        assert_eq!(surface.pixel(30, 38), Some(Rgba([7, 7, 7, 255])));
        assert_eq!(surface.pixel(30, 42), Some(Rgba([7, 7, 7, 255])));
        assert_eq!(surface.pixel(30, 47), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_snapshot_restore_and_composite() {
        let mut surface = surface(100.0, 1.0);
        surface.clear(Color::rgb(1, 2, 3));
        let snapshot = surface.snapshot().unwrap();

        surface.clear(Color::rgb(200, 200, 200));
        surface.restore(&snapshot);
        assert_eq!(surface.pixel(50, 50), Some(Rgba([1, 2, 3, 255])));

        let mut layer = surface.offscreen().unwrap();
        assert_eq!(layer.image().dimensions(), surface.image().dimensions());
        layer.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::rgb(255, 0, 0));
        let overlay = layer.snapshot().unwrap();
        surface.composite(&overlay);
        assert_eq!(surface.pixel(5, 5), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(surface.pixel(50, 50), Some(Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_empty_surface_ignores_drawing() {
        let mut surface = RasterSurface::new();
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::rgb(1, 1, 1));
        surface.fill_round_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0, Color::rgb(1, 1, 1));
        assert_eq!(surface.pixel(0, 0), None);
    }

    #[test]
    fn test_detached_canvas_has_no_context() {
        assert!(RasterCanvas::detached().context_2d().is_none());
        assert!(RasterCanvas::new().context_2d().is_some());
    }
}
