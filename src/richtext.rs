//! Styled text fragments shared by the PDF and DOCX back ends.
//!
//! A [`Span`] carries the inline decorations a report needs (bold, italic,
//! underline and color). The PDF side turns spans into `genpdf` styled strings,
//! the DOCX side into run properties.

use genpdf::style::{Color, Style, StyledString};

/// Dark blue used for the agency name and section headings.
pub const HEADING_COLOR: Color = Color::Rgb(31, 56, 100);

/// A slice of text together with inline style attributes.
///
/// `genpdf`'s [`StyledString`] has no underline, so the flag is carried
/// separately through [`StyledSpan`] and drawn by the element layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
    underline: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn is_underlined(&self) -> bool {
        self.underline
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Marks the span as underlined.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Assigns a color to the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        style
    }

    /// Converts the span to a [`StyledString`], dropping the underline flag.
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&str> for Span {
    fn from(text: &str) -> Self {
        Span::new(text)
    }
}

impl From<String> for Span {
    fn from(text: String) -> Self {
        Span::new(text)
    }
}

/// A styled span ready for `genpdf` elements, keeping the underline flag.
#[derive(Clone, Debug)]
pub struct StyledSpan {
    pub string: StyledString,
    pub underline: bool,
}

impl From<&Span> for StyledSpan {
    fn from(span: &Span) -> Self {
        StyledSpan {
            string: span.to_styled_string(),
            underline: span.underline,
        }
    }
}

/// Hex `RRGGBB` form of a color, as WordprocessingML expects it.
pub fn color_hex(color: Color) -> String {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Greyscale(level) => (level, level, level),
        Color::Cmyk(c, m, y, k) => {
            let channel = |value: u8| {
                let value = f64::from(value) / 255.0;
                let key = f64::from(k) / 255.0;
                (255.0 * (1.0 - value) * (1.0 - key)).round() as u8
            };
            (channel(c), channel(m), channel(y))
        }
    };
    format!("{r:02X}{g:02X}{b:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_to_style_reflects_flags() {
        let span = Span::new("Claim Summary")
            .bold()
            .italic()
            .colored(Color::Rgb(10, 20, 30));
        let styled = span.to_styled_string();
        assert_eq!(styled.s, "Claim Summary");
        assert!(styled.style.is_bold());
        assert!(styled.style.is_italic());
        assert_eq!(styled.style.color(), Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn styled_span_captures_underline_flag() {
        let span = Span::new("Subject").underline();
        let styled = StyledSpan::from(&span);
        assert_eq!(styled.string.s, "Subject");
        assert!(styled.underline);
    }

    #[test]
    fn colors_render_as_hex() {
        assert_eq!(color_hex(HEADING_COLOR), "1F3864");
        assert_eq!(color_hex(Color::Greyscale(255)), "FFFFFF");
        assert_eq!(color_hex(Color::Cmyk(0, 0, 0, 255)), "000000");
    }
}
