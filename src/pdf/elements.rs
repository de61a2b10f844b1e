//! `genpdf` elements the report needs beyond the upstream set.
//!
//! [`CaptionedImage`] stacks a cached photograph over its caption and fits it
//! into a box; [`UnderlinedText`] draws a single underlined line, which plain
//! `genpdf` paragraphs cannot do.

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::style::{Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

use crate::images::EmbeddedImage;
use crate::model::HorizontalAlignment;
use crate::richtext::StyledSpan;

/// `genpdf` places images at this resolution when no scale is applied.
pub const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const DEFAULT_CAPTION_SPACING_MM: f64 = 2.0;
const DEFAULT_UNDERLINE_OFFSET_MM: f64 = 0.4;

pub fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Paragraph alignment in `genpdf` terms; justified text is set flush left.
pub fn alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left | HorizontalAlignment::Justified => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

/// Natural size of an image printed at [`DEFAULT_IMAGE_DPI`], in millimetres.
pub fn natural_size_mm(width_px: u32, height_px: u32) -> (f64, f64) {
    (
        MM_PER_INCH * f64::from(width_px) / DEFAULT_IMAGE_DPI,
        MM_PER_INCH * f64::from(height_px) / DEFAULT_IMAGE_DPI,
    )
}

/// Largest size with the image's aspect ratio that fits `max_width` x `max_height`.
pub fn fitted_size_mm(width_px: u32, height_px: u32, max_width: f64, max_height: f64) -> (f64, f64) {
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }
    let aspect = f64::from(height_px) / f64::from(width_px);
    let width = max_width.min(max_height / aspect);
    (width, width * aspect)
}

/// An image with a caption stacked underneath, scaled to fit a bounding box.
pub struct CaptionedImage {
    image: Image,
    caption: Paragraph,
    alignment: Alignment,
    natural_size: Size,
    pixel_size: (u32, u32),
    bounds: Option<(f64, f64)>,
    spacing: Mm,
}

impl CaptionedImage {
    /// Decodes a cached JPEG into a `genpdf` image.
    pub fn from_embedded(embedded: &EmbeddedImage, caption: Paragraph) -> Result<Self, Error> {
        let decoded = image::load_from_memory(embedded.bytes())
            .context("Failed to decode cached image")?;
        let pixel_size = (embedded.width(), embedded.height());
        let (width, height) = natural_size_mm(pixel_size.0, pixel_size.1);
        let image = Image::from_dynamic_image(decoded)?;

        let mut element = Self {
            image,
            caption,
            alignment: Alignment::Center,
            natural_size: Size::new(mm_from_f64(width), mm_from_f64(height)),
            pixel_size,
            bounds: None,
            spacing: mm_from_f64(DEFAULT_CAPTION_SPACING_MM),
        };
        element.apply_alignment();
        Ok(element)
    }

    /// Sets the horizontal alignment used by both the image and the caption.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self.apply_alignment();
        self
    }

    /// Scales the image into `width` x `height` millimetres, keeping its aspect ratio.
    pub fn with_bounds(mut self, width: f64, height: f64) -> Self {
        self.bounds = Some((width, height));
        self.apply_scale();
        self
    }

    fn apply_alignment(&mut self) {
        self.image.set_alignment(self.alignment);
        self.caption.set_alignment(self.alignment);
    }

    fn apply_scale(&mut self) {
        let natural = mm_to_f64(self.natural_size.width);
        match self.bounds {
            Some((max_width, max_height)) if natural > f64::EPSILON => {
                let (width, _) =
                    fitted_size_mm(self.pixel_size.0, self.pixel_size.1, max_width, max_height);
                let scale = width / natural;
                self.image.set_scale(Scale::new(scale, scale));
            }
            _ => self.image.set_scale(Scale::new(1.0, 1.0)),
        }
    }
}

impl Element for CaptionedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let image_result = self.image.render(context, area.clone(), style)?;
        result.size = result.size.stack_vertical(image_result.size);
        result.has_more |= image_result.has_more;

        area.add_offset(Position::new(0, image_result.size.height + self.spacing));
        result.size = result.size.stack_vertical(Size::new(0, self.spacing));

        let caption_result = self.caption.render(context, area, style)?;
        result.size = result.size.stack_vertical(caption_result.size);
        result.has_more |= caption_result.has_more;

        Ok(result)
    }
}

/// A single line of styled text with underlines drawn as thin strokes.
pub struct UnderlinedText {
    spans: Vec<StyledSpan>,
    alignment: Alignment,
    underline_offset: Mm,
}

impl UnderlinedText {
    pub fn new(spans: Vec<StyledSpan>) -> Self {
        Self {
            spans,
            alignment: Alignment::Left,
            underline_offset: mm_from_f64(DEFAULT_UNDERLINE_OFFSET_MM),
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

impl Element for UnderlinedText {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut prepared: Vec<(StyledString, bool, Mm)> = Vec::with_capacity(self.spans.len());
        let mut total_width = Mm::default();
        let mut max_line_height = style.line_height(&context.font_cache);
        let mut max_glyph_height = Mm::default();

        for span in &self.spans {
            let mut string = span.string.clone();
            string.style = style.and(string.style);
            let width = string.width(&context.font_cache);
            total_width += width;
            max_line_height = max_line_height.max(string.style.line_height(&context.font_cache));
            let glyph_height = string
                .style
                .font(&context.font_cache)
                .glyph_height(string.style.font_size());
            max_glyph_height = max_glyph_height.max(glyph_height);
            prepared.push((string, span.underline, width));
        }

        let mut result = RenderResult::default();
        if max_line_height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let available_width = area.size().width;
        let x_offset = match self.alignment {
            Alignment::Left => Mm::default(),
            Alignment::Center => (available_width - total_width) / 2.0,
            Alignment::Right => available_width - total_width,
        };

        match area.text_section(&context.font_cache, Position::new(x_offset, 0), style) {
            Some(mut section) => {
                for (string, _, _) in &prepared {
                    section.print_str(&string.s, string.style)?;
                }
            }
            None => {
                result.has_more = true;
                return Ok(result);
            }
        }

        let baseline = max_glyph_height + self.underline_offset;
        let mut cursor = x_offset;
        for (string, underline, width) in &prepared {
            if *underline {
                let mut line_style = Style::new();
                if let Some(color) = string.style.color().or(style.color()) {
                    line_style = line_style.with_color(color);
                }
                area.draw_line(
                    vec![
                        Position::new(cursor, baseline),
                        Position::new(cursor + *width, baseline),
                    ],
                    line_style,
                );
            }
            cursor += *width;
        }

        result.size = Size::new(total_width, max_line_height);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_image_is_limited_by_width() {
        let (width, height) = fitted_size_mm(800, 600, 80.0, 90.0);
        assert!((width - 80.0).abs() < 1e-9);
        assert!((height - 60.0).abs() < 1e-9);
    }

    #[test]
    fn portrait_image_is_limited_by_height() {
        let (width, height) = fitted_size_mm(600, 800, 80.0, 90.0);
        assert!((height - 90.0).abs() < 1e-9);
        assert!((width - 67.5).abs() < 1e-9);
    }

    #[test]
    fn natural_size_uses_default_dpi() {
        let (width, height) = natural_size_mm(300, 600);
        assert!((width - 25.4).abs() < 1e-9);
        assert!((height - 50.8).abs() < 1e-9);
    }

    #[test]
    fn justified_text_maps_to_left() {
        assert_eq!(alignment(HorizontalAlignment::Justified), Alignment::Left);
        assert_eq!(alignment(HorizontalAlignment::Center), Alignment::Center);
    }
}
