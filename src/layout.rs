use crate::font::{
    BUILTIN_ADVANCE_UNITS, BUILTIN_ASCENT_UNITS, BUILTIN_GLYPH_COLS, BUILTIN_GLYPH_ROWS,
    BUILTIN_UNITS_PER_EM, ResolvedFont, builtin_glyph_rows,
};
use crate::shape::ShapedText;
use crate::types::{Alignment, Point};
use rustybuzz::{Direction, Face as HbFace, UnicodeBuffer};
use ttf_parser::{Face, GlyphId};

// One glyph ready to paint. `origin` is the outline origin on the baseline
// for file fonts, or the top-left corner of the bitmap cell for the builtin
// font. Measurement and drawing both consume this, so they cannot disagree
// on anchoring.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PlacedGlyph {
    Outline {
        glyph_id: u16,
        origin: Point,
        scale: f32,
    },
    Cell {
        rows: [u8; BUILTIN_GLYPH_ROWS],
        origin: Point,
        unit: f32,
    },
}

// Places `text` with its top-left ascent corner at `pen`. Text is expected
// in visual order; shaping runs left to right.
pub(crate) fn place_glyphs(
    font: &ResolvedFont,
    text: &str,
    pen: Point,
    shape_glyphs: bool,
) -> Vec<PlacedGlyph> {
    if text.is_empty() || font.size() <= 0.0 {
        return Vec::new();
    }
    match font.file_data() {
        Some(data) => place_file_glyphs(data, font.size(), text, pen, shape_glyphs),
        None => place_builtin_glyphs(font.size(), text, pen),
    }
}

fn place_file_glyphs(
    data: &[u8],
    size: f32,
    text: &str,
    pen: Point,
    shape_glyphs: bool,
) -> Vec<PlacedGlyph> {
    let Ok(face) = Face::parse(data, 0) else {
        return Vec::new();
    };
    let scale = size / face.units_per_em() as f32;
    let baseline_y = pen.y + face.ascender() as f32 * scale;
    if shape_glyphs {
        if let Some(glyphs) = place_shaped(data, text, pen.x, baseline_y, scale) {
            return glyphs;
        }
    }
    place_unshaped(&face, size, text, pen.x, baseline_y, scale)
}

fn place_shaped(
    data: &[u8],
    text: &str,
    pen_x: f32,
    baseline_y: f32,
    scale: f32,
) -> Option<Vec<PlacedGlyph>> {
    let face = HbFace::from_slice(data, 0)?;
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.set_direction(Direction::LeftToRight);
    let output = rustybuzz::shape(&face, &[], buffer);

    let mut glyphs = Vec::with_capacity(output.len());
    let mut x = pen_x;
    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        // Missing glyphs keep their advance but paint nothing.
        if info.glyph_id != 0 {
            glyphs.push(PlacedGlyph::Outline {
                glyph_id: info.glyph_id as u16,
                origin: Point::new(
                    x + pos.x_offset as f32 * scale,
                    baseline_y - pos.y_offset as f32 * scale,
                ),
                scale,
            });
        }
        x += pos.x_advance as f32 * scale;
    }
    Some(glyphs)
}

fn place_unshaped(
    face: &Face,
    size: f32,
    text: &str,
    pen_x: f32,
    baseline_y: f32,
    scale: f32,
) -> Vec<PlacedGlyph> {
    let mut glyphs = Vec::new();
    let mut x = pen_x;
    for ch in text.chars() {
        let Some(glyph_id) = face.glyph_index(ch) else {
            x += size * 0.5;
            continue;
        };
        glyphs.push(PlacedGlyph::Outline {
            glyph_id: glyph_id.0,
            origin: Point::new(x, baseline_y),
            scale,
        });
        let advance = face
            .glyph_hor_advance(glyph_id)
            .map(|advance| advance as f32 * scale)
            .unwrap_or(0.0);
        x += if advance > 0.0 { advance } else { size * 0.5 };
    }
    glyphs
}

fn place_builtin_glyphs(size: f32, text: &str, pen: Point) -> Vec<PlacedGlyph> {
    let unit = size / BUILTIN_UNITS_PER_EM;
    let baseline_y = pen.y + BUILTIN_ASCENT_UNITS * unit;
    let top = baseline_y - BUILTIN_GLYPH_ROWS as f32 * unit;
    let mut glyphs = Vec::new();
    let mut x = pen.x;
    for ch in text.chars() {
        let rows = builtin_glyph_rows(ch);
        if rows.iter().any(|&row| row != 0) {
            glyphs.push(PlacedGlyph::Cell {
                rows,
                origin: Point::new(x, top),
                unit,
            });
        }
        x += BUILTIN_ADVANCE_UNITS * unit;
    }
    glyphs
}

// Horizontal ink extent of placed glyphs as (min_x, max_x), None when
// nothing would leave ink.
pub(crate) fn ink_extent(font: &ResolvedFont, glyphs: &[PlacedGlyph]) -> Option<(f32, f32)> {
    let face = font
        .file_data()
        .and_then(|data| Face::parse(data, 0).ok());
    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    for glyph in glyphs {
        let span = match glyph {
            PlacedGlyph::Outline {
                glyph_id,
                origin,
                scale,
            } => face.as_ref().and_then(|face| {
                face.glyph_bounding_box(GlyphId(*glyph_id)).map(|bbox| {
                    (
                        origin.x + bbox.x_min as f32 * scale,
                        origin.x + bbox.x_max as f32 * scale,
                    )
                })
            }),
            PlacedGlyph::Cell { rows, origin, unit } => cell_span(rows, origin.x, *unit),
        };
        if let Some((lo, hi)) = span {
            min_x = min_x.min(lo);
            max_x = max_x.max(hi);
        }
    }
    (min_x <= max_x).then_some((min_x, max_x))
}

fn cell_span(rows: &[u8; BUILTIN_GLYPH_ROWS], origin_x: f32, unit: f32) -> Option<(f32, f32)> {
    let mut first = BUILTIN_GLYPH_COLS;
    let mut last = 0;
    let mut inked = false;
    for &row in rows {
        for col in 0..BUILTIN_GLYPH_COLS {
            if row & (1 << (BUILTIN_GLYPH_COLS - 1 - col)) != 0 {
                first = first.min(col);
                last = last.max(col);
                inked = true;
            }
        }
    }
    inked.then(|| {
        (
            origin_x + first as f32 * unit,
            origin_x + (last + 1) as f32 * unit,
        )
    })
}

pub fn measure_ink_width(font: &ResolvedFont, text: &ShapedText, shape_glyphs: bool) -> f32 {
    let glyphs = place_glyphs(font, text.as_str(), Point::new(0.0, 0.0), shape_glyphs);
    match ink_extent(font, &glyphs) {
        Some((min_x, max_x)) => (max_x - min_x).max(0.0),
        None => 0.0,
    }
}

// The anchor is interpreted against the measured ink width: start keeps the
// pen on the anchor, center and end shift it left by w/2 and w. The vertical
// coordinate passes through untouched and nothing clamps to the canvas.
pub fn layout_origin(
    font: &ResolvedFont,
    text: &ShapedText,
    anchor: Point,
    alignment: Alignment,
    shape_glyphs: bool,
) -> Point {
    let width = measure_ink_width(font, text, shape_glyphs);
    let x = match alignment {
        Alignment::Start => anchor.x,
        Alignment::Center => anchor.x - width / 2.0,
        Alignment::End => anchor.x - width,
    };
    Point::new(x, anchor.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin(size: f32) -> ResolvedFont {
        ResolvedFont::builtin(size)
    }

    fn shaped(text: &str) -> ShapedText {
        ShapedText::from_raw(text)
    }

    #[test]
    fn builtin_ink_width_scales_with_size() {
        // 'A' and 'B' both ink all five columns; the second cell starts one
        // advance (six units) in.
        let font = builtin(16.0);
        assert_eq!(measure_ink_width(&font, &shaped("AB"), true), 22.0);
        let font = builtin(8.0);
        assert_eq!(measure_ink_width(&font, &shaped("AB"), true), 11.0);
    }

    #[test]
    fn trailing_blank_cells_leave_no_ink() {
        let font = builtin(16.0);
        let bare = measure_ink_width(&font, &shaped("A"), true);
        let padded = measure_ink_width(&font, &shaped("A  "), true);
        assert_eq!(bare, padded);
    }

    #[test]
    fn narrow_glyph_measures_by_ink_not_advance() {
        // '!' only inks column two of its cell.
        let font = builtin(8.0);
        assert_eq!(measure_ink_width(&font, &shaped("!"), true), 1.0);
    }

    #[test]
    fn alignment_shifts_origin_by_measured_width() {
        let font = builtin(16.0);
        let text = shaped("AB");
        let anchor = Point::new(400.0, 300.0);
        let width = measure_ink_width(&font, &text, true);

        let start = layout_origin(&font, &text, anchor, Alignment::Start, true);
        assert_eq!((start.x, start.y), (400.0, 300.0));

        let center = layout_origin(&font, &text, anchor, Alignment::Center, true);
        assert_eq!((center.x, center.y), (400.0 - width / 2.0, 300.0));

        let end = layout_origin(&font, &text, anchor, Alignment::End, true);
        assert_eq!((end.x, end.y), (400.0 - width, 300.0));
    }

    #[test]
    fn empty_text_collapses_every_alignment_to_the_anchor() {
        let font = builtin(16.0);
        let anchor = Point::new(12.5, -4.0);
        for alignment in [Alignment::Start, Alignment::Center, Alignment::End] {
            let origin = layout_origin(&font, &shaped(""), anchor, alignment, true);
            assert_eq!((origin.x, origin.y), (anchor.x, anchor.y));
        }
    }

    #[test]
    fn offcanvas_anchor_is_not_clamped() {
        let font = builtin(16.0);
        let origin = layout_origin(
            &font,
            &shaped("AB"),
            Point::new(-50.0, -50.0),
            Alignment::End,
            true,
        );
        assert_eq!(origin.x, -72.0);
        assert_eq!(origin.y, -50.0);
    }

    #[test]
    fn zero_size_font_places_nothing() {
        let font = builtin(0.0);
        assert!(place_glyphs(&font, "AB", Point::new(0.0, 0.0), true).is_empty());
        assert_eq!(measure_ink_width(&font, &shaped("AB"), true), 0.0);
    }

    #[test]
    fn builtin_cell_top_sits_on_the_pen() {
        // Builtin ascent equals the cell height, so the cell top lands
        // exactly on the pen position.
        let font = builtin(16.0);
        let glyphs = place_glyphs(&font, "A", Point::new(10.0, 20.0), true);
        assert_eq!(glyphs.len(), 1);
        match glyphs[0] {
            PlacedGlyph::Cell { origin, unit, .. } => {
                assert_eq!((origin.x, origin.y), (10.0, 20.0));
                assert_eq!(unit, 2.0);
            }
            PlacedGlyph::Outline { .. } => panic!("builtin font must place cells"),
        }
    }
}
