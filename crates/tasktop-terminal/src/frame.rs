//! Styled text lines and their crossterm output.
//!
//! The shell renders into a [`Frame`] first so layout can be tested as plain
//! text; [`Frame::write_to`] turns it into escape sequences.

use crossterm::cursor::MoveTo;
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{queue, QueueableCommand};
use std::io::{self, BufWriter, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Text attributes for one span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    /// Foreground color; terminal default when `None`.
    pub fg: Option<Color>,
    /// Background color; terminal default when `None`.
    pub bg: Option<Color>,
    /// Bold text.
    pub bold: bool,
    /// Swap foreground and background.
    pub reverse: bool,
}

impl Style {
    /// Unstyled text.
    pub const PLAIN: Self = Self {
        fg: None,
        bg: None,
        bold: false,
        reverse: false,
    };

    /// With a foreground color.
    #[must_use]
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// With a background color.
    #[must_use]
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Reversed.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Drop colors, keeping attributes.
    #[must_use]
    pub fn mono(self) -> Self {
        Self {
            fg: None,
            bg: None,
            ..self
        }
    }
}

/// A run of text in one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Text.
    pub text: String,
    /// Style.
    pub style: Style,
}

impl Span {
    /// Styled text.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::PLAIN)
    }
}

/// One terminal row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    /// Spans, left to right.
    pub spans: Vec<Span>,
}

impl Line {
    /// A line of spans.
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// A single unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![Span::plain(text)])
    }

    /// A single styled span.
    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self::new(vec![Span::new(text, style)])
    }

    /// Text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Display width in columns.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.width()).sum()
    }

    /// Cut to `width` columns.
    #[must_use]
    pub fn truncated(mut self, width: usize) -> Self {
        let mut remaining = width;
        let mut spans = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if remaining == 0 {
                break;
            }
            let text = truncate(&span.text, remaining);
            remaining -= text.width();
            spans.push(Span::new(text, span.style));
        }
        Self { spans }
    }
}

/// A full screen of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Rows, top to bottom.
    pub lines: Vec<Line>,
}

impl Frame {
    /// Plain text of every row.
    pub fn text(&self) -> Vec<String> {
        self.lines.iter().map(Line::text).collect()
    }

    /// Whether any row contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text().contains(needle))
    }

    /// Write the frame to a terminal.
    pub fn write_to<W: Write>(&self, writer: &mut W, color: bool) -> io::Result<()> {
        let mut out = BufWriter::with_capacity(16384, writer);
        for (y, line) in self.lines.iter().enumerate() {
            queue!(out, MoveTo(0, y as u16), ResetColor)?;
            for span in &line.spans {
                let style = if color { span.style } else { span.style.mono() };
                apply_style(&mut out, style)?;
                queue!(out, Print(&span.text))?;
            }
            queue!(
                out,
                SetAttribute(Attribute::Reset),
                ResetColor,
                Clear(ClearType::UntilNewLine)
            )?;
        }
        queue!(out, Clear(ClearType::FromCursorDown))?;
        out.flush()
    }
}

fn apply_style<W: Write>(writer: &mut W, style: Style) -> io::Result<()> {
    writer.queue(SetAttribute(Attribute::Reset))?;
    writer.queue(ResetColor)?;
    if let Some(fg) = style.fg {
        writer.queue(SetForegroundColor(fg))?;
    }
    if let Some(bg) = style.bg {
        writer.queue(SetBackgroundColor(bg))?;
    }
    if style.bold {
        writer.queue(SetAttribute(Attribute::Bold))?;
    }
    if style.reverse {
        writer.queue(SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

/// Cut `text` to at most `width` display columns.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// Cut or right-pad `text` to exactly `width` columns.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = truncate(text, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(pad));
    out
}

/// Cut or left-pad `text` to exactly `width` columns.
pub fn fit_right(text: &str, width: usize) -> String {
    let cut = truncate(text, width);
    let pad = width.saturating_sub(cut.width());
    format!("{}{cut}", " ".repeat(pad))
}

/// Parse `#rrggbb`.
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}
