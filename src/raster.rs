use crate::error::{self, CertPressError};
use crate::font::{BUILTIN_GLYPH_COLS, BUILTIN_GLYPH_ROWS, ResolvedFont};
use crate::layout::{PlacedGlyph, place_glyphs};
use crate::shape::ShapedText;
use crate::types::{Color, Point};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

pub fn composite(
    image: &str,
    text: &ShapedText,
    font: &ResolvedFont,
    origin: Point,
    color: Color,
    shape_glyphs: bool,
) -> Result<Vec<u8>, CertPressError> {
    let mut pixmap = decode_background(image)?;
    draw_name(&mut pixmap, font, text, origin, color, shape_glyphs);
    encode_png(&pixmap)
}

// Splits "data:image/png;base64,XXXX" into the declared mime and the
// payload. A string without a comma is taken as a bare payload.
fn data_url_parts(image: &str) -> (Option<&str>, &str) {
    match image.split_once(',') {
        Some((header, payload)) => {
            let mime = header
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .filter(|mime| !mime.is_empty());
            (mime, payload)
        }
        None => (None, image),
    }
}

fn format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

pub fn decode_background(image: &str) -> Result<Pixmap, CertPressError> {
    let (mime, payload) = data_url_parts(image);
    let cleaned: Vec<u8> = payload
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(&cleaned)
        .map_err(|err| error::image_decode(format!("base64: {err}")))?;

    // The declared mime is a hint only; fall back to sniffing the bytes.
    let decoded = match mime.and_then(format_for_mime) {
        Some(format) => image::load_from_memory_with_format(&bytes, format)
            .or_else(|_| image::load_from_memory(&bytes)),
        None => image::load_from_memory(&bytes),
    }
    .map_err(|err| error::image_decode(err.to_string()))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| error::image_decode(format!("unusable dimensions {width}x{height}")))?;
    for (src, dst) in rgba
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let alpha = src[3];
        dst[0] = premul_u8(src[0], alpha);
        dst[1] = premul_u8(src[1], alpha);
        dst[2] = premul_u8(src[2], alpha);
        dst[3] = alpha;
    }
    Ok(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let product = channel as u16 * alpha as u16 + 127;
    ((product + (product >> 8)) >> 8) as u8
}

pub(crate) fn draw_name(
    pixmap: &mut Pixmap,
    font: &ResolvedFont,
    text: &ShapedText,
    origin: Point,
    color: Color,
    shape_glyphs: bool,
) {
    let glyphs = place_glyphs(font, text.as_str(), origin, shape_glyphs);
    if glyphs.is_empty() {
        return;
    }
    let paint = fill_paint(color);
    let face = font
        .file_data()
        .and_then(|data| Face::parse(data, 0).ok());
    for glyph in &glyphs {
        match glyph {
            PlacedGlyph::Outline {
                glyph_id,
                origin,
                scale,
            } => {
                let Some(face) = face.as_ref() else { continue };
                let mut builder = GlyphPathBuilder {
                    builder: PathBuilder::new(),
                    origin_x: origin.x,
                    origin_y: origin.y,
                    scale: *scale,
                };
                if face
                    .outline_glyph(GlyphId(*glyph_id), &mut builder)
                    .is_none()
                {
                    continue;
                }
                if let Some(path) = builder.builder.finish() {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            PlacedGlyph::Cell { rows, origin, unit } => {
                fill_cell(pixmap, rows, *origin, *unit, &paint);
            }
        }
    }
}

fn fill_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

// Maps font-unit outlines into pixel space. Font y grows upward, pixel y
// grows downward, so the vertical term flips around the baseline.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder
            .move_to(self.origin_x + x * self.scale, self.origin_y - y * self.scale);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder
            .line_to(self.origin_x + x * self.scale, self.origin_y - y * self.scale);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(
            self.origin_x + x1 * self.scale,
            self.origin_y - y1 * self.scale,
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.origin_x + x1 * self.scale,
            self.origin_y - y1 * self.scale,
            self.origin_x + x2 * self.scale,
            self.origin_y - y2 * self.scale,
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn fill_cell(
    pixmap: &mut Pixmap,
    rows: &[u8; BUILTIN_GLYPH_ROWS],
    origin: Point,
    unit: f32,
    paint: &Paint,
) {
    for (row_index, &row) in rows.iter().enumerate() {
        let y = origin.y + row_index as f32 * unit;
        let mut col = 0;
        while col < BUILTIN_GLYPH_COLS {
            if row & (1 << (BUILTIN_GLYPH_COLS - 1 - col)) == 0 {
                col += 1;
                continue;
            }
            let run_start = col;
            while col < BUILTIN_GLYPH_COLS && row & (1 << (BUILTIN_GLYPH_COLS - 1 - col)) != 0 {
                col += 1;
            }
            let x = origin.x + run_start as f32 * unit;
            let width = (col - run_start) as f32 * unit;
            if let Some(rect) = Rect::from_xywh(x, y, width, unit) {
                pixmap.fill_rect(rect, paint, Transform::identity(), None);
            }
        }
    }
}

pub(crate) fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, CertPressError> {
    pixmap
        .encode_png()
        .map_err(|err| error::png_encode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_payload(width: u32, height: u32) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    fn white_png_data_url(width: u32, height: u32) -> String {
        format!("data:image/png;base64,{}", png_payload(width, height))
    }

    fn has_non_white_pixel(pixmap: &Pixmap) -> bool {
        pixmap
            .data()
            .chunks_exact(4)
            .any(|px| px[0] != 255 || px[1] != 255 || px[2] != 255)
    }

    #[test]
    fn decode_background_keeps_dimensions_and_pixels() {
        let pixmap = decode_background(&white_png_data_url(40, 30)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (40, 30));
        assert!(!has_non_white_pixel(&pixmap));
    }

    #[test]
    fn decode_background_accepts_bare_base64() {
        let pixmap = decode_background(&png_payload(8, 8)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (8, 8));
    }

    #[test]
    fn decode_background_tolerates_whitespace_in_payload() {
        let mut payload = png_payload(8, 8);
        payload.insert(10, '\n');
        let url = format!("data:image/png;base64,{payload}");
        assert!(decode_background(&url).is_ok());
    }

    #[test]
    fn decode_background_decodes_jpeg() {
        let img = image::RgbImage::from_pixel(20, 10, image::Rgb([200, 10, 10]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Jpeg).unwrap();
        let url = format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(bytes.into_inner())
        );
        let pixmap = decode_background(&url).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (20, 10));
    }

    #[test]
    fn decode_background_reports_bad_base64() {
        let err = decode_background("data:image/png;base64,@@not-base64@@").unwrap_err();
        assert!(matches!(err, CertPressError::ImageDecode(_)), "{err}");
    }

    #[test]
    fn decode_background_reports_undecodable_bytes() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"not an image"));
        let err = decode_background(&url).unwrap_err();
        assert!(matches!(err, CertPressError::ImageDecode(_)), "{err}");
    }

    #[test]
    fn draw_name_leaves_ink_with_builtin_font() {
        let mut pixmap = decode_background(&white_png_data_url(64, 64)).unwrap();
        draw_name(
            &mut pixmap,
            &ResolvedFont::builtin(16.0),
            &ShapedText::from_raw("A"),
            Point::new(10.0, 10.0),
            Color::BLACK,
            true,
        );
        assert!(has_non_white_pixel(&pixmap));
        // Top-left corner sits outside the glyph cell.
        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!(
            (corner.red(), corner.green(), corner.blue()),
            (255, 255, 255)
        );
    }

    #[test]
    fn draw_name_honors_fill_color() {
        let mut pixmap = decode_background(&white_png_data_url(64, 64)).unwrap();
        draw_name(
            &mut pixmap,
            &ResolvedFont::builtin(16.0),
            &ShapedText::from_raw("H"),
            Point::new(8.0, 8.0),
            Color::rgb(255, 0, 0),
            true,
        );
        let found_red = pixmap
            .data()
            .chunks_exact(4)
            .any(|px| px[0] == 255 && px[1] == 0 && px[2] == 0);
        assert!(found_red);
    }

    #[test]
    fn composite_preserves_background_dimensions() {
        let png = composite(
            &white_png_data_url(80, 50),
            &ShapedText::from_raw("Jane"),
            &ResolvedFont::builtin(16.0),
            Point::new(4.0, 4.0),
            Color::BLACK,
            true,
        )
        .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 50));
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn composite_is_deterministic() {
        let url = white_png_data_url(32, 32);
        let font = ResolvedFont::builtin(16.0);
        let text = ShapedText::from_raw("Ada");
        let first =
            composite(&url, &text, &font, Point::new(2.0, 2.0), Color::BLACK, true).unwrap();
        let second =
            composite(&url, &text, &font, Point::new(2.0, 2.0), Color::BLACK, true).unwrap();
        assert_eq!(first, second);
    }
}
