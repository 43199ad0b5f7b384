//! PDF export of the BRD.
//!
//! Built-in Helvetica on A4. Plain lines become word-wrapped paragraphs;
//! a line containing `|` becomes a row of bordered fixed-width cells.

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};

use crate::errors::TestgenResult;

use super::{export_error, ExportFormat};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 7.0;
const CELL_WIDTH: f32 = 40.0;
const CELL_HEIGHT: f32 = 10.0;
const CELL_PADDING: f32 = 1.5;
/// Helvetica 12pt averages about 2.1 mm per glyph.
const CHARS_PER_LINE: usize = 90;
const CHARS_PER_CELL: usize = 17;
const LAYER_NAME: &str = "Layer 1";

/// Replace every character outside Latin-1 with `?`.
pub fn sanitize_latin1(text: &str) -> String {
    text.chars()
        .map(|c| if u32::from(c) <= 0xFF { c } else { '?' })
        .collect()
}

pub fn export_pdf(text: &str) -> TestgenResult<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Business Requirements Document",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        LAYER_NAME,
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| export_error(ExportFormat::Pdf, e))?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut writer = PageWriter {
        doc,
        font,
        layer,
        y: PAGE_HEIGHT - MARGIN,
    };

    for line in sanitize_latin1(text).lines() {
        if line.contains('|') {
            writer.cell_row(line);
        } else {
            writer.paragraph(line);
        }
    }

    writer
        .doc
        .save_to_bytes()
        .map_err(|e| export_error(ExportFormat::Pdf, e))
}

/// Cursor over the current page; adds pages as content overflows.
struct PageWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    layer: PdfLayerReference,
    /// Top of the next line, in mm from the page bottom
    y: f32,
}

impl PageWriter {
    fn ensure_space(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn paragraph(&mut self, line: &str) {
        let wrapped = wrap(line, CHARS_PER_LINE);
        if wrapped.is_empty() {
            self.ensure_space(LINE_HEIGHT);
            self.y -= LINE_HEIGHT;
            return;
        }

        for chunk in wrapped {
            self.ensure_space(LINE_HEIGHT);
            self.y -= LINE_HEIGHT;
            self.layer
                .use_text(chunk, FONT_SIZE, Mm(MARGIN), Mm(self.y + 2.0), &self.font);
        }
    }

    fn cell_row(&mut self, line: &str) {
        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        if cells.is_empty() {
            return;
        }

        self.ensure_space(CELL_HEIGHT);
        let mut x = MARGIN;
        for cell in cells {
            if x + CELL_WIDTH > PAGE_WIDTH - MARGIN {
                self.y -= CELL_HEIGHT;
                self.ensure_space(CELL_HEIGHT);
                x = MARGIN;
            }
            self.bordered_cell(x, cell);
            x += CELL_WIDTH;
        }
        self.y -= CELL_HEIGHT;
    }

    fn bordered_cell(&self, x: f32, text: &str) {
        let top = self.y;
        let bottom = self.y - CELL_HEIGHT;
        let corners = [
            (x, bottom),
            (x + CELL_WIDTH, bottom),
            (x + CELL_WIDTH, top),
            (x, top),
        ];
        self.layer.add_line(Line {
            points: corners
                .iter()
                .map(|&(px, py)| (Point::new(Mm(px), Mm(py)), false))
                .collect(),
            is_closed: true,
        });

        let text: String = text.chars().take(CHARS_PER_CELL).collect();
        self.layer.use_text(
            text,
            FONT_SIZE,
            Mm(x + CELL_PADDING),
            Mm(bottom + 3.5),
            &self.font,
        );
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
