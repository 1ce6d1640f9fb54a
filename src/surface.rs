use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};

/// Pixel-blending rule applied when a segment is stroked onto existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Paint over whatever is already on the surface.
    SourceOver,
    /// Cut the covered pixels out, leaving them transparent.
    DestinationOut,
}

/// Which of the live surfaces a buffer is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    Main,
    Grid,
    Drag,
}

/// An independently addressable raster buffer with its own dimensions.
///
/// Every mutation bumps `version`, which downstream texture upload uses to
/// skip re-uploading unchanged surfaces.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    version: u64,
}

impl Surface {
    /// Creates a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            version: 0,
        }
    }

    /// Creates a surface filled with a solid color.
    pub fn new_filled(width: u32, height: u32, color: Color32) -> Self {
        let mut surface = Self::new(width, height);
        surface.fill(color);
        surface
    }

    /// Wraps an existing bitmap.
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels, version: 0 }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// A surface with no pixels has no bound drawing target; all drawing
    /// operations on it are silent no-ops.
    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color32 {
        let p = self.pixels.get_pixel(x, y);
        Color32::from_rgba_unmultiplied(p[0], p[1], p[2], p[3])
    }

    /// Fills the whole surface with a solid color.
    pub fn fill(&mut self, color: Color32) {
        if self.is_empty() {
            return;
        }
        let src = to_rgba(color);
        for pixel in self.pixels.pixels_mut() {
            *pixel = src;
        }
        self.version += 1;
    }

    /// Erases the whole surface to transparent.
    pub fn clear(&mut self) {
        self.fill(Color32::TRANSPARENT);
    }

    /// Strokes one round-capped line segment.
    ///
    /// Coverage is capsule-based: a pixel is touched when its center lies
    /// within `width / 2` of the segment, which yields round caps and joins
    /// without any path state carried between calls.
    pub fn stroke_segment(
        &mut self,
        from: Pos2,
        to: Pos2,
        width: f32,
        op: Composite,
        color: Color32,
    ) {
        if self.is_empty() {
            return;
        }
        let radius = (width * 0.5).max(0.5);
        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min((self.width() - 1) as f32);
        let max_y = (from.y.max(to.y) + radius).ceil().min((self.height() - 1) as f32);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let src = to_rgba(color);
        let radius_sq = radius * radius;
        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
                if segment_distance_sq(center, from, to) <= radius_sq {
                    let dst = self.pixels.get_pixel_mut(x, y);
                    *dst = composite(op, src, *dst);
                }
            }
        }
        self.version += 1;
    }

    /// Draws a bitmap onto this surface with paint-over blending. Pixels that
    /// fall outside the surface are dropped.
    pub fn blit(&mut self, source: &RgbaImage, at: Pos2) {
        if self.is_empty() {
            return;
        }
        let ox = at.x.round() as i64;
        let oy = at.y.round() as i64;
        let (w, h) = (self.width() as i64, self.height() as i64);
        for (sx, sy, src) in source.enumerate_pixels() {
            let x = ox + sx as i64;
            let y = oy + sy as i64;
            if x >= 0 && y >= 0 && x < w && y < h {
                let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
                *dst = blend_over(*src, *dst);
            }
        }
        self.version += 1;
    }

    /// Writes a rectangle of pixels verbatim, without blending. Used for the
    /// grid overlay, where repeated draws must never deepen the alpha.
    pub fn write_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color32) {
        if self.is_empty() {
            return;
        }
        let src = to_rgba(color);
        let max_x = (x + width).min(self.width());
        let max_y = (y + height).min(self.height());
        for py in y..max_y {
            for px in x..max_x {
                self.pixels.put_pixel(px, py, src);
            }
        }
        self.version += 1;
    }
}

fn to_rgba(color: Color32) -> Rgba<u8> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Rgba([r, g, b, a])
}

/// Squared distance from a point to the closest point on segment `ab`.
fn segment_distance_sq(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab_x = b.x - a.x;
    let ab_y = b.y - a.y;
    let ap_x = p.x - a.x;
    let ap_y = p.y - a.y;
    let len_sq = ab_x * ab_x + ab_y * ab_y;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((ap_x * ab_x + ap_y * ab_y) / len_sq).clamp(0.0, 1.0)
    };
    let dx = ap_x - t * ab_x;
    let dy = ap_y - t * ab_y;
    dx * dx + dy * dy
}

fn composite(op: Composite, src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match op {
        Composite::SourceOver => blend_over(src, dst),
        Composite::DestinationOut => {
            let keep = 255 - src[3] as u32;
            Rgba([
                (dst[0] as u32 * keep / 255) as u8,
                (dst[1] as u32 * keep / 255) as u8,
                (dst[2] as u32 * keep / 255) as u8,
                (dst[3] as u32 * keep / 255) as u8,
            ])
        }
    }
}

/// Straight-alpha source-over blend.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let ch = |s: u8, d: u8| {
        let s = s as u32;
        let d = d as u32;
        ((s * sa + d * da * (255 - sa) / 255) / out_a) as u8
    };
    Rgba([
        ch(src[0], dst[0]),
        ch(src[1], dst[1]),
        ch(src[2], dst[2]),
        out_a as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn empty_surface_ignores_drawing() {
        let mut surface = Surface::new(0, 0);
        surface.stroke_segment(pos2(0.0, 0.0), pos2(10.0, 0.0), 4.0, Composite::SourceOver, Color32::RED);
        assert_eq!(surface.version(), 0);
    }

    #[test]
    fn pen_segment_paints_capsule() {
        let mut surface = Surface::new_filled(60, 20, Color32::WHITE);
        surface.stroke_segment(pos2(10.0, 10.0), pos2(50.0, 10.0), 10.0, Composite::SourceOver, Color32::RED);

        // On the spine and at both round caps.
        assert_eq!(surface.pixel(30, 10), Color32::RED);
        assert_eq!(surface.pixel(7, 10), Color32::RED);
        assert_eq!(surface.pixel(53, 10), Color32::RED);
        // Beyond the cap radius and far off the spine.
        assert_eq!(surface.pixel(2, 10), Color32::WHITE);
        assert_eq!(surface.pixel(30, 17), Color32::WHITE);
    }

    #[test]
    fn erase_clears_to_transparent_regardless_of_color() {
        let mut surface = Surface::new_filled(40, 20, Color32::BLUE);
        surface.stroke_segment(pos2(5.0, 10.0), pos2(35.0, 10.0), 10.0, Composite::DestinationOut, Color32::RED);

        assert_eq!(surface.pixel(20, 10).a(), 0);
        assert_eq!(surface.pixel(20, 2), Color32::BLUE);
    }

    #[test]
    fn zero_length_segment_stamps_a_dot() {
        let mut surface = Surface::new_filled(20, 20, Color32::WHITE);
        surface.stroke_segment(pos2(10.0, 10.0), pos2(10.0, 10.0), 10.0, Composite::SourceOver, Color32::BLACK);
        assert_eq!(surface.pixel(10, 10), Color32::BLACK);
        assert_eq!(surface.pixel(10, 17), Color32::WHITE);
    }

    #[test]
    fn off_canvas_segment_is_a_no_op() {
        let mut surface = Surface::new_filled(20, 20, Color32::WHITE);
        let before = surface.image().clone();
        surface.stroke_segment(pos2(100.0, 100.0), pos2(140.0, 100.0), 10.0, Composite::SourceOver, Color32::RED);
        assert_eq!(surface.image().as_raw(), before.as_raw());
    }

    #[test]
    fn blit_clips_to_bounds() {
        let mut surface = Surface::new_filled(10, 10, Color32::WHITE);
        let mut stamp = RgbaImage::new(4, 4);
        for p in stamp.pixels_mut() {
            *p = Rgba([0, 0, 0, 255]);
        }
        surface.blit(&stamp, pos2(8.0, 8.0));
        assert_eq!(surface.pixel(9, 9), Color32::BLACK);
        assert_eq!(surface.pixel(7, 7), Color32::WHITE);
    }

    #[test]
    fn write_rect_is_idempotent() {
        let mut surface = Surface::new(10, 10);
        let translucent = Color32::from_rgba_unmultiplied(211, 211, 211, 153);
        surface.write_rect(2, 0, 2, 10, translucent);
        surface.write_rect(2, 0, 2, 10, translucent);
        assert_eq!(surface.pixel(2, 5), translucent);
    }
}
