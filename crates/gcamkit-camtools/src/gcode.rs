//! G-code line writer
//!
//! Collects program lines with a fixed number of decimals per number.
//! Negative zero is normalized so `-0.0000` never reaches the controller.

use gcamkit_core::Vec2;

/// Format a coordinate or feed with `decimals` fixed decimals.
pub fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Direction of a circular move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    /// G2
    Clockwise,
    /// G3
    CounterClockwise,
}

impl ArcDirection {
    /// Direction of an arc with signed `sweep` degrees.
    pub fn from_sweep(sweep: f64) -> Self {
        if sweep < 0.0 {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            Self::Clockwise => "G2",
            Self::CounterClockwise => "G3",
        }
    }
}

/// Accumulates G-code text.
#[derive(Debug, Clone)]
pub struct GcodeWriter {
    out: String,
    decimals: usize,
}

impl GcodeWriter {
    pub fn new(decimals: u8) -> Self {
        Self {
            out: String::new(),
            decimals: decimals as usize,
        }
    }

    pub fn num(&self, value: f64) -> String {
        format_number(value, self.decimals)
    }

    /// Append a raw line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Append a parenthesized comment. Nested parentheses are replaced since
    /// controllers do not allow them.
    pub fn comment(&mut self, text: &str) {
        let clean: String = text
            .chars()
            .map(|c| match c {
                '(' => '[',
                ')' => ']',
                '\n' | '\r' => ' ',
                other => other,
            })
            .collect();
        self.out.push_str(&format!("({})\n", clean));
    }

    pub fn rapid_z(&mut self, z: f64) {
        let line = format!("G0 Z{}", self.num(z));
        self.line(line);
    }

    pub fn rapid_xy(&mut self, p: Vec2) {
        let line = format!("G0 X{} Y{}", self.num(p.x), self.num(p.y));
        self.line(line);
    }

    pub fn feed_z(&mut self, z: f64, feed: f64) {
        let line = format!("G1 Z{} F{}", self.num(z), self.num(feed));
        self.line(line);
    }

    pub fn feed_xy(&mut self, p: Vec2, feed: Option<f64>) {
        let mut line = format!("G1 X{} Y{}", self.num(p.x), self.num(p.y));
        if let Some(f) = feed {
            line.push_str(&format!(" F{}", self.num(f)));
        }
        self.line(line);
    }

    pub fn feed_xyz(&mut self, p: Vec2, z: f64, feed: Option<f64>) {
        let mut line = format!(
            "G1 X{} Y{} Z{}",
            self.num(p.x),
            self.num(p.y),
            self.num(z)
        );
        if let Some(f) = feed {
            line.push_str(&format!(" F{}", self.num(f)));
        }
        self.line(line);
    }

    /// Circular move to `end`; `center` is relative to the current position.
    pub fn arc(
        &mut self,
        direction: ArcDirection,
        end: Vec2,
        center: Vec2,
        z: Option<f64>,
        feed: Option<f64>,
    ) {
        let mut line = format!(
            "{} X{} Y{} I{} J{}",
            direction.word(),
            self.num(end.x),
            self.num(end.y),
            self.num(center.x),
            self.num(center.y)
        );
        if let Some(z) = z {
            line.push_str(&format!(" Z{}", self.num(z)));
        }
        if let Some(f) = feed {
            line.push_str(&format!(" F{}", self.num(f)));
        }
        self.line(line);
    }

    pub fn feed(&mut self, feed: f64) {
        let line = format!("F{}", self.num(feed));
        self.line(line);
    }

    /// Append text produced elsewhere, adding a trailing newline if missing.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.out.push_str(text);
        if !text.ends_with('\n') {
            self.out.push('\n');
        }
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}
