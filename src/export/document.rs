//! Document-table (pdf) renderer
//!
//! Landscape A4 pages holding one table. The header row is bold on a shaded
//! band and repeats at the top of every continuation page.
//!
//! Text is set in the builtin Helvetica faces, which only cover WinAnsi
//! (cp1252). Any other character is printed as `?`.

use super::projection::ExportRecord;
use super::ExportError;

#[cfg(feature = "pdf")]
mod layout {
    use printpdf::{
        BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
    };

    use super::{ExportError, ExportRecord};

    const PAGE_WIDTH: f32 = 297.0;
    const PAGE_HEIGHT: f32 = 210.0;
    const MARGIN: f32 = 12.0;
    const ROW_HEIGHT: f32 = 7.0;
    const TITLE_SIZE: f32 = 14.0;
    const CELL_SIZE: f32 = 9.0;
    // Approximate Helvetica advance at CELL_SIZE
    const CHAR_WIDTH: f32 = 1.9;
    const LAYER: &str = "table";

    struct Fonts {
        regular: IndirectFontRef,
        bold: IndirectFontRef,
    }

    fn document_error(e: impl std::fmt::Debug) -> ExportError {
        ExportError::Document(format!("{:?}", e))
    }

    pub fn write(
        title: &str,
        headers: &[&str],
        records: &[ExportRecord],
    ) -> Result<Vec<u8>, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(document_error)?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(document_error)?,
        };

        let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / headers.len().max(1) as f32;
        let max_chars = ((column_width / CHAR_WIDTH) as usize).max(1);

        let mut layer = doc.get_page(page).get_layer(layer);
        layer.use_text(win_ansi(title), TITLE_SIZE, Mm(MARGIN), Mm(PAGE_HEIGHT - MARGIN), &fonts.bold);

        let mut y = PAGE_HEIGHT - MARGIN - 2.0 * ROW_HEIGHT;
        draw_header(&layer, &fonts, headers, y, column_width, max_chars);
        y -= ROW_HEIGHT;

        for record in records {
            if y < MARGIN {
                let (page, next) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
                layer = doc.get_page(page).get_layer(next);
                y = PAGE_HEIGHT - MARGIN - ROW_HEIGHT;
                draw_header(&layer, &fonts, headers, y, column_width, max_chars);
                y -= ROW_HEIGHT;
            }

            for (col, value) in record.values().enumerate() {
                let x = MARGIN + col as f32 * column_width + 1.0;
                let text = clip(&value.to_text(), max_chars);
                layer.use_text(text, CELL_SIZE, Mm(x), Mm(y), &fonts.regular);
            }
            y -= ROW_HEIGHT;
        }

        doc.save_to_bytes().map_err(document_error)
    }

    fn draw_header(
        layer: &PdfLayerReference,
        fonts: &Fonts,
        headers: &[&str],
        y: f32,
        column_width: f32,
        max_chars: usize,
    ) {
        layer.set_fill_color(Color::Rgb(Rgb::new(0.82, 0.82, 0.82, None)));
        layer.add_rect(Rect::new(
            Mm(MARGIN),
            Mm(y - 2.0),
            Mm(PAGE_WIDTH - MARGIN),
            Mm(y + ROW_HEIGHT - 2.0),
        ));
        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

        for (col, header) in headers.iter().enumerate() {
            let x = MARGIN + col as f32 * column_width + 1.0;
            layer.use_text(clip(header, max_chars), CELL_SIZE, Mm(x), Mm(y), &fonts.bold);
        }
    }

    fn clip(text: &str, max_chars: usize) -> String {
        win_ansi(&text.chars().take(max_chars).collect::<String>())
    }

    /// Replace characters the builtin fonts cannot encode with `?`.
    pub(super) fn win_ansi(text: &str) -> String {
        text.chars()
            .map(|c| if is_win_ansi(c) { c } else { '?' })
            .collect()
    }

    fn is_win_ansi(c: char) -> bool {
        matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
            || matches!(
                c,
                '€' | '‚' | 'ƒ' | '„' | '…' | '†' | '‡' | 'ˆ' | '‰' | 'Š' | '‹' | 'Œ' | 'Ž'
                    | '‘' | '’' | '“' | '”' | '•' | '–' | '—' | '˜' | '™' | 'š' | '›' | 'œ'
                    | 'ž' | 'Ÿ'
            )
    }
}

/// Render records as a titled document table.
#[cfg(feature = "pdf")]
pub fn write_document(
    title: &str,
    headers: &[&str],
    records: &[ExportRecord],
) -> Result<Vec<u8>, ExportError> {
    layout::write(title, headers, records)
}

/// Built without the `pdf` feature: there is no document backend.
#[cfg(not(feature = "pdf"))]
pub fn write_document(
    _title: &str,
    _headers: &[&str],
    _records: &[ExportRecord],
) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::CapabilityUnavailable(super::ExportFormat::Document))
}

/// Whether this build carries a document backend
pub const fn compiled_in() -> bool {
    cfg!(feature = "pdf")
}
