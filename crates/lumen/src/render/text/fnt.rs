//! Reader for the text flavour of the BMFont `.fnt` format
//!
//! Four kinds of lines matter:
//!
//! ```text
//! common lineHeight=32 base=26 scaleW=256 scaleH=256 pages=1
//! chars count=95
//! char id=65 x=0 y=0 width=16 height=24 xoffset=1 yoffset=2 xadvance=18 page=0
//! kerning first=65 second=86 amount=-2
//! ```
//!
//! Runs of whitespace separate tokens and unknown keys are ignored. Keys
//! absent from a `char` or `kerning` line read as 0. Other lines (`info`,
//! `page`, `kernings`) are skipped.

use crate::render::text::FontError;

/// The `common` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FntCommon {
    /// Distance between baselines in atlas pixels
    pub line_height: i32,
    /// Atlas width in pixels
    pub scale_w: u32,
    /// Atlas height in pixels
    pub scale_h: u32,
}

impl Default for FntCommon {
    fn default() -> Self {
        Self {
            line_height: 0,
            scale_w: 1,
            scale_h: 1,
        }
    }
}

/// One `char` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FntChar {
    /// Character code
    pub id: u32,
    /// Atlas x
    pub x: i32,
    /// Atlas y, from the top of the image
    pub y: i32,
    /// Atlas width
    pub width: i32,
    /// Atlas height
    pub height: i32,
    /// Horizontal placement offset
    pub x_offset: i32,
    /// Vertical placement offset, from the top of the line
    pub y_offset: i32,
    /// Pen advance after this character
    pub x_advance: i32,
}

/// One `kerning` line: the pen moves by `amount` between `first` and `second`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FntKerning {
    /// Character code on the left
    pub first: u32,
    /// Character code on the right
    pub second: u32,
    /// Advance adjustment in atlas pixels
    pub amount: i32,
}

/// A parsed `.fnt` file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FntFile {
    /// Atlas dimensions and line height
    pub common: FntCommon,
    /// Characters in file order
    pub chars: Vec<FntChar>,
    /// Non-zero kerning pairs in file order
    pub kernings: Vec<FntKerning>,
}

/// Value of `key` in a whitespace-separated `key=value` line
pub fn attribute<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, value)| value)
}

fn int_attribute(line: &str, number: usize, key: &'static str) -> Result<i32, FontError> {
    let value = attribute(line, key).ok_or_else(|| FontError::Parse {
        line: number,
        reason: format!("missing `{key}`"),
    })?;
    value.trim_matches('"').parse().map_err(|_| FontError::Parse {
        line: number,
        reason: format!("`{key}` is not an integer: {value}"),
    })
}

fn optional_int_attribute(line: &str, number: usize, key: &'static str) -> Result<i32, FontError> {
    match attribute(line, key) {
        Some(_) => int_attribute(line, number, key),
        None => Ok(0),
    }
}

fn line_kind(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Parse `.fnt` text
///
/// The `chars count=N` line must be present; the N `char` lines that follow
/// it are read, other lines in between are skipped.
pub fn parse(text: &str) -> Result<FntFile, FontError> {
    let mut common = FntCommon::default();
    let mut expected = None;
    let mut chars = Vec::new();
    let mut kernings = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        match line_kind(line) {
            Some("common") => {
                common = FntCommon {
                    line_height: int_attribute(line, number, "lineHeight")?,
                    scale_w: int_attribute(line, number, "scaleW")?.max(1) as u32,
                    scale_h: int_attribute(line, number, "scaleH")?.max(1) as u32,
                };
            }
            Some("chars") => {
                let count = int_attribute(line, number, "count")?;
                expected = Some(count.max(0) as usize);
                chars.reserve(count.max(0) as usize);
            }
            Some("char") => {
                let Some(count) = expected else {
                    return Err(FontError::Parse {
                        line: number,
                        reason: "`char` before `chars count=`".to_string(),
                    });
                };
                if chars.len() == count {
                    continue;
                }
                chars.push(FntChar {
                    id: optional_int_attribute(line, number, "id")?.max(0) as u32,
                    x: optional_int_attribute(line, number, "x")?,
                    y: optional_int_attribute(line, number, "y")?,
                    width: optional_int_attribute(line, number, "width")?,
                    height: optional_int_attribute(line, number, "height")?,
                    x_offset: optional_int_attribute(line, number, "xoffset")?,
                    y_offset: optional_int_attribute(line, number, "yoffset")?,
                    x_advance: optional_int_attribute(line, number, "xadvance")?,
                });
            }
            Some("kerning") => {
                let kerning = FntKerning {
                    first: optional_int_attribute(line, number, "first")?.max(0) as u32,
                    second: optional_int_attribute(line, number, "second")?.max(0) as u32,
                    amount: optional_int_attribute(line, number, "amount")?,
                };
                if kerning.amount != 0 {
                    kernings.push(kerning);
                }
            }
            _ => {}
        }
    }

    match expected {
        None => Err(FontError::Parse {
            line: 0,
            reason: "no `chars count=` line".to_string(),
        }),
        Some(count) if chars.len() < count => Err(FontError::Parse {
            line: 0,
            reason: format!("expected {count} chars, found {}", chars.len()),
        }),
        Some(_) => Ok(FntFile {
            common,
            chars,
            kernings,
        }),
    }
}
