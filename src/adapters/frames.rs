//! Decoders for the frame dumps produced by the camera board, and a
//! synthetic test pattern.
//!
//! The serial dumps (`Hex`, `CompactHex`) carry each RGB565 word with its
//! bytes swapped; decoding swaps them back. `Binary` dumps are raw
//! big-endian words and `Decimal` dumps hold the words as plain integers.

use crate::core::pixel::rgb888_to_rgb565;
use crate::domain::model::Frame;
use crate::utils::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const START_MARKER: &str = "START IMAGE";
const END_MARKER: &str = "END IMAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum FrameFormat {
    /// Pick the format from the file extension.
    #[default]
    Auto,
    Binary,
    Hex,
    CompactHex,
    Decimal,
}

impl FrameFormat {
    /// Concrete format for a file name. `.bin` files are compact hex dumps,
    /// which is how the capture tool names them.
    pub fn resolve(self, name: &str) -> Result<FrameFormat> {
        if self != FrameFormat::Auto {
            return Ok(self);
        }

        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("bin") => Ok(FrameFormat::CompactHex),
            Some("raw") | Some("rgb565") => Ok(FrameFormat::Binary),
            Some("hex") | Some("txt") | Some("log") => Ok(FrameFormat::Hex),
            Some("dec") => Ok(FrameFormat::Decimal),
            _ => Err(VisionError::FrameDecodeError {
                source_name: name.to_string(),
                message: "cannot infer frame format from extension, pass --format".to_string(),
            }),
        }
    }
}

fn decode_error(name: &str, message: impl Into<String>) -> VisionError {
    VisionError::FrameDecodeError {
        source_name: name.to_string(),
        message: message.into(),
    }
}

fn take_pixels(name: &str, words: Vec<u16>, width: u32, height: u32) -> Result<Frame> {
    let needed = width as usize * height as usize;
    if words.len() < needed {
        return Err(decode_error(
            name,
            format!("read only {} pixels instead of {}", words.len(), needed),
        ));
    }
    if words.len() > needed {
        tracing::debug!("{}: ignoring {} trailing pixels", name, words.len() - needed);
    }
    let mut words = words;
    words.truncate(needed);
    Frame::new(name, width, height, words)
}

fn parse_hex_word(name: &str, token: &str) -> Result<u16> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u16::from_str_radix(digits, 16)
        .map_err(|e| decode_error(name, format!("invalid hex word '{}': {}", token, e)))
}

fn as_text<'a>(name: &str, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| decode_error(name, format!("not a text dump: {}", e)))
}

fn decode_binary(name: &str, bytes: &[u8], width: u32, height: u32) -> Result<Frame> {
    let needed = width as usize * height as usize * 2;
    if bytes.len() < needed {
        return Err(decode_error(
            name,
            format!("read only {} bytes instead of {}", bytes.len(), needed),
        ));
    }
    let words = bytes[..needed]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    take_pixels(name, words, width, height)
}

fn decode_hex_block(name: &str, bytes: &[u8], width: u32, height: u32) -> Result<Frame> {
    let text = as_text(name, bytes)?;
    let mut words = Vec::with_capacity(width as usize * height as usize);
    let mut in_block = false;
    let mut seen_start = false;

    for line in text.lines() {
        let line = line.trim_end();
        if line == START_MARKER {
            in_block = true;
            seen_start = true;
            continue;
        }
        if line == END_MARKER {
            break;
        }
        if in_block {
            for token in line.split_whitespace() {
                words.push(parse_hex_word(name, token)?.swap_bytes());
            }
        }
    }

    if !seen_start {
        return Err(decode_error(name, format!("no '{}' marker", START_MARKER)));
    }
    take_pixels(name, words, width, height)
}

fn decode_compact_hex(name: &str, bytes: &[u8], width: u32, height: u32) -> Result<Frame> {
    let text = as_text(name, bytes)?;
    let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 4 != 0 {
        return Err(decode_error(
            name,
            format!("{} hex digits is not a whole number of pixels", digits.len()),
        ));
    }

    let words = digits
        .chunks(4)
        .map(|chunk| {
            let token: String = chunk.iter().collect();
            parse_hex_word(name, &token).map(u16::swap_bytes)
        })
        .collect::<Result<Vec<u16>>>()?;
    take_pixels(name, words, width, height)
}

fn decode_decimal(name: &str, bytes: &[u8], width: u32, height: u32) -> Result<Frame> {
    let text = as_text(name, bytes)?;
    let words = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<u16>()
                .map_err(|e| decode_error(name, format!("invalid pixel '{}': {}", token, e)))
        })
        .collect::<Result<Vec<u16>>>()?;
    take_pixels(name, words, width, height)
}

/// Decode one frame dump.
pub fn decode_frame(name: &str, bytes: &[u8], format: FrameFormat, width: u32, height: u32) -> Result<Frame> {
    match format.resolve(name)? {
        FrameFormat::Binary => decode_binary(name, bytes, width, height),
        FrameFormat::Hex => decode_hex_block(name, bytes, width, height),
        FrameFormat::CompactHex => decode_compact_hex(name, bytes, width, height),
        FrameFormat::Decimal => decode_decimal(name, bytes, width, height),
        FrameFormat::Auto => Err(decode_error(name, "frame format could not be resolved")),
    }
}

/// Six vertical bars: red, green, blue, yellow, cyan, magenta.
pub fn color_bars(width: u32, height: u32) -> Frame {
    const COLORS: [u16; 6] = [
        rgb888_to_rgb565(255, 0, 0),
        rgb888_to_rgb565(0, 255, 0),
        rgb888_to_rgb565(0, 0, 255),
        rgb888_to_rgb565(255, 255, 0),
        rgb888_to_rgb565(0, 255, 255),
        rgb888_to_rgb565(255, 0, 255),
    ];

    let mut frame = Frame::filled("color_bars", width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let bar = ((x as usize * COLORS.len()) / width as usize).min(COLORS.len() - 1);
            frame.set_pixel(x, y, COLORS[bar]);
        }
    }
    frame
}

pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    extensions.is_empty() || extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

/// Inverse of the compact hex decoder, used to produce fixtures and to
/// re-export frames in the capture format.
pub fn encode_compact_hex(frame: &Frame) -> String {
    frame
        .pixels
        .chunks(frame.width.max(1) as usize)
        .map(|row| {
            row.iter()
                .map(|word| format!("{:04X}", word.swap_bytes()))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
