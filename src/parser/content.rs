//! Content stream interpretation.
//!
//! Turns the operator sequence of one page into blocks, lines and runs in
//! source order. Text objects that continue the current baseline extend the
//! current line; a baseline change starts a new line, or a new block when it
//! happens at the start of a text object. Every text-showing operator
//! contributes a run, and `Do` / `BI` produce image (or ignored) blocks.
//! Positions and sizes are taken in device space (text matrix times CTM).

use std::collections::{BTreeMap, HashMap};

use lopdf::content::Operation;
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::model::{Block, ImageRef, Line, Run};

/// TJ adjustment (thousandths of an em) above which a word space is assumed.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Fraction of the font size a baseline may drift before a new line starts.
const LINE_TOLERANCE: f32 = 0.3;

/// Deepest `q` nesting tracked; deeper saves are dropped.
const MAX_GRAPHICS_DEPTH: usize = 64;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Approximate advance of one glyph, as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// Horizontal gap, as a fraction of the font size, that separates two words.
const WORD_GAP: f32 = 0.1;

/// What a named XObject on the page refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XObjectKind {
    /// Image XObject with its object number
    Image(u32),
    /// Form or unknown XObject
    Other,
}

/// Font resources of a page keyed by resource name.
pub(crate) struct PageFonts<'a> {
    dicts: BTreeMap<Vec<u8>, &'a Dictionary>,
    base_names: HashMap<Vec<u8>, String>,
}

impl<'a> PageFonts<'a> {
    pub(crate) fn new(dicts: BTreeMap<Vec<u8>, &'a Dictionary>) -> Self {
        let base_names = dicts
            .iter()
            .map(|(name, dict)| {
                let base = dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)).to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                (name.clone(), base)
            })
            .collect();
        Self { dicts, base_names }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    fn base_name(&self, resource: &[u8]) -> String {
        self.base_names
            .get(resource)
            .cloned()
            .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string())
    }
}

/// Interprets the operations of a single content stream.
pub(crate) struct ContentInterpreter<'a> {
    doc: &'a LopdfDocument,
    fonts: &'a PageFonts<'a>,
    xobjects: &'a HashMap<Vec<u8>, XObjectKind>,
}

impl<'a> ContentInterpreter<'a> {
    pub(crate) fn new(
        doc: &'a LopdfDocument,
        fonts: &'a PageFonts<'a>,
        xobjects: &'a HashMap<Vec<u8>, XObjectKind>,
    ) -> Self {
        Self {
            doc,
            fonts,
            xobjects,
        }
    }

    /// Walk the operations and return the page's blocks in source order.
    pub(crate) fn interpret(&self, operations: &[Operation]) -> Vec<Block> {
        let mut state = TextState::default();
        let mut saved: Vec<TextState> = Vec::new();
        let mut dropped_saves = 0usize;
        let mut blocks = Vec::new();
        let mut builder = BlockBuilder::default();
        let mut in_text = false;

        for op in operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => {
                    if saved.len() < MAX_GRAPHICS_DEPTH {
                        saved.push(state.clone());
                    } else {
                        dropped_saves += 1;
                    }
                }
                "Q" if dropped_saves > 0 => dropped_saves -= 1,
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        state = TextState {
                            matrix: state.matrix,
                            ..previous
                        };
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        state.ctm = multiply(m, state.ctm);
                    }
                }
                "BT" => {
                    in_text = true;
                    builder.begin_object();
                    state.matrix = TextMatrix::default();
                }
                "ET" => in_text = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            state.font_resource = name.clone();
                            state.font_name = self.fonts.base_name(name);
                        }
                        state.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        state.matrix.translate(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        state.matrix.set(m);
                    }
                }
                "T*" => state.matrix.translate(0.0, -state.leading),
                "Tj" | "TJ" if in_text => {
                    let text = self.decode_show_operand(&state, op);
                    builder.push_text(text, &state, &mut blocks);
                }
                "'" | "\"" if in_text => {
                    state.matrix.translate(0.0, -state.leading);
                    let text_idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = operands.get(text_idx) {
                        let text = self.decode_bytes(&state.font_resource, bytes);
                        builder.push_text(text, &state, &mut blocks);
                    }
                }
                "Do" => {
                    builder.flush_into(&mut blocks);
                    let kind = match operands.first() {
                        Some(Object::Name(name)) => self.xobjects.get(name).copied(),
                        _ => None,
                    };
                    blocks.push(match kind {
                        Some(XObjectKind::Image(xref)) => Block::image(xref),
                        Some(XObjectKind::Other) => Block::Ignored,
                        None => Block::Image(ImageRef::unresolved()),
                    });
                }
                "BI" => {
                    builder.flush_into(&mut blocks);
                    blocks.push(Block::Image(ImageRef::unresolved()));
                }
                _ => {}
            }
        }

        builder.flush_into(&mut blocks);
        blocks
    }

    /// Decode the string operand(s) of a `Tj` or `TJ` operation.
    fn decode_show_operand(&self, state: &TextState, op: &Operation) -> String {
        if op.operator == "Tj" {
            return match op.operands.first() {
                Some(Object::String(bytes, _)) => self.decode_bytes(&state.font_resource, bytes),
                _ => String::new(),
            };
        }

        let Some(Object::Array(items)) = op.operands.first() else {
            return String::new();
        };

        // Numbers are positioning adjustments in thousandths of an em;
        // large negative values move right far enough to be a word space.
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    combined.push_str(&self.decode_bytes(&state.font_resource, bytes));
                }
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = -get_number(item).unwrap_or(0.0);
                    if adjustment > TJ_SPACE_THRESHOLD && needs_separator(&combined) {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }
        combined
    }

    fn decode_bytes(&self, font_resource: &[u8], bytes: &[u8]) -> String {
        let encoding = self
            .fonts
            .dicts
            .get(font_resource)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        match encoding {
            Some(enc) => LopdfDocument::decode_text(&enc, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        }
    }
}

/// Graphics-state values that affect text.
#[derive(Debug, Clone)]
struct TextState {
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    matrix: TextMatrix,
    /// Current transformation matrix
    ctm: [f32; 6],
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 12.0,
            matrix: TextMatrix::default(),
            ctm: IDENTITY,
        }
    }
}

impl TextState {
    /// Text rendering matrix without the font size: Tm × CTM.
    fn rendering_matrix(&self) -> [f32; 6] {
        multiply(self.matrix.tm, self.ctm)
    }

    fn effective_size(&self) -> f32 {
        self.font_size * vertical_scale(&self.rendering_matrix())
    }
}

/// Accumulates lines until an image or a new baseline at the start of a
/// text object closes the block.
#[derive(Debug, Default)]
struct BlockBuilder {
    lines: Vec<Line>,
    current: Vec<Run>,
    baseline: Option<f32>,
    pen_end: Option<f32>,
    /// Set by `BT` until the text object shows its first string.
    object_start: bool,
}

impl BlockBuilder {
    fn begin_object(&mut self) {
        self.object_start = true;
    }

    fn push_text(&mut self, text: String, state: &TextState, blocks: &mut Vec<Block>) {
        if text.is_empty() {
            return;
        }

        let rendering = state.rendering_matrix();
        let (x, y) = (rendering[4], rendering[5]);
        let size = state.effective_size();
        let tolerance = (size.abs() * LINE_TOLERANCE).max(0.5);

        if std::mem::take(&mut self.object_start) {
            let continues = self
                .baseline
                .is_some_and(|baseline| (y - baseline).abs() <= tolerance);
            if !continues {
                self.flush_into(blocks);
            }
        }

        match self.baseline {
            Some(baseline) if (y - baseline).abs() > tolerance => {
                self.finish_line();
                self.baseline = Some(y);
            }
            Some(_) => {
                if let Some(end) = self.pen_end {
                    let gap = x - end;
                    let prev_ends_blank = self
                        .current
                        .last()
                        .map(|r| r.text.ends_with(char::is_whitespace))
                        .unwrap_or(true);
                    if gap > size * WORD_GAP
                        && !prev_ends_blank
                        && !text.starts_with(char::is_whitespace)
                    {
                        self.push_run(Run::new(" ", size, state.font_name.clone()));
                    }
                }
            }
            None => self.baseline = Some(y),
        }

        let advance = text.chars().count() as f32 * size * AVG_CHAR_WIDTH;
        self.push_run(Run::new(text, size, state.font_name.clone()));
        self.pen_end = Some(x + advance);
    }

    /// Append a run, merging it into the previous one when both carry
    /// visible text in the same font and size.
    fn push_run(&mut self, run: Run) {
        if let Some(last) = self.current.last_mut() {
            if !last.is_whitespace()
                && !run.is_whitespace()
                && last.font_name == run.font_name
                && last.font_size == run.font_size
            {
                last.text.push_str(&run.text);
                return;
            }
        }
        self.current.push(run);
    }

    fn finish_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::new(std::mem::take(&mut self.current)));
        }
        self.pen_end = None;
    }

    /// Emit the accumulated lines as one text block and start over.
    fn flush_into(&mut self, blocks: &mut Vec<Block>) {
        self.finish_line();
        self.baseline = None;
        if !self.lines.is_empty() {
            blocks.push(Block::text(std::mem::take(&mut self.lines)));
        }
    }
}

/// Text and text-line matrices for tracking position in a content stream.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    tm: [f32; 6],
    line: [f32; 6],
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            tm: IDENTITY,
            line: IDENTITY,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        self.tm = m;
        self.line = m;
    }

    /// Move to the start of the next line, offset from the start of the current line.
    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.tm = self.line;
    }
}

/// Product `m × n` of two affine matrices in PDF `[a b c d e f]` form.
fn multiply(m: [f32; 6], n: [f32; 6]) -> [f32; 6] {
    let [a, b, c, d, e, f] = m;
    let [na, nb, nc, nd, ne, nf] = n;
    [
        a * na + b * nc,
        a * nb + b * nd,
        c * na + d * nc,
        c * nb + d * nd,
        e * na + f * nc + ne,
        e * nb + f * nd + nf,
    ]
}

/// Vertical scale factor a matrix applies to the font size.
fn vertical_scale(m: &[f32; 6]) -> f32 {
    let [_, _, c, d, _, _] = *m;
    let scale = (c * c + d * d).sqrt();
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn matrix_operands(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    Some([
        get_number(&operands[0]).unwrap_or(1.0),
        get_number(&operands[1]).unwrap_or(0.0),
        get_number(&operands[2]).unwrap_or(0.0),
        get_number(&operands[3]).unwrap_or(1.0),
        get_number(&operands[4]).unwrap_or(0.0),
        get_number(&operands[5]).unwrap_or(0.0),
    ])
}

/// Helper to extract a number from a PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Whether a word space should be appended after `text`.
fn needs_separator(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && !is_spaceless_script_char(c),
        None => false,
    }
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

/// Drop the six-letter subset tag (`ABCDEF+`) embedded fonts carry.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// Simple text decoding fallback when no encoding is available.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with byte order mark
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
