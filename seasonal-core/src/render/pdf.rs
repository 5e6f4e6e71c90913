//! A4 pagination and PDF output using printpdf's built-in fonts.

use super::layout::{Block, DocumentLayout, FOOTER_TEXT};
use super::RenderError;
use printpdf::{BuiltinFont, Mm, PdfDocument};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const FOOTER_Y_MM: f32 = 12.0;
/// Lowest baseline for body text; below this is the footer area.
const CONTENT_BOTTOM_MM: f32 = 24.0;
const FOOTER_SIZE: f32 = 8.0;
const SPACER_MM: f32 = 3.0;
const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub size: f32,
    pub weight: Weight,
    pub indent_mm: f32,
    pub space_before_mm: f32,
}

impl Line {
    fn height_mm(&self) -> f32 {
        self.size * PT_TO_MM * LINE_SPACING
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub line: Line,
    /// Baseline, measured from the bottom of the page.
    pub y_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// Rough Helvetica advance width.
fn text_width_mm(text: &str, size: f32, weight: Weight) -> f32 {
    let em = match weight {
        Weight::Regular => 0.5,
        Weight::Bold => 0.55,
    };
    text.chars().count() as f32 * size * PT_TO_MM * em
}

fn max_chars(size: f32, weight: Weight, indent_mm: f32) -> usize {
    let width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM - indent_mm;
    let per_char = text_width_mm("x", size, weight);
    ((width / per_char) as usize).max(10)
}

/// Greedy word wrap. Words longer than a line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Map text onto the ASCII subset the built-in fonts render reliably.
pub fn pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c),
            '\t' | '\n' | '\r' => out.push(' '),
            '\u{2018}' | '\u{2019}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' | '\u{2022}' | '\u{00B7}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00BC}' => out.push_str("1/4"),
            '\u{00BD}' => out.push_str("1/2"),
            '\u{00BE}' => out.push_str("3/4"),
            '\u{2153}' => out.push_str("1/3"),
            '\u{2154}' => out.push_str("2/3"),
            '\u{00B0}' => out.push_str(" degrees"),
            '\u{00A0}' => out.push(' '),
            _ => out.push(fold_accent(c)),
        }
    }
    out
}

fn fold_accent(c: char) -> char {
    let folded = match c.to_lowercase().next().unwrap_or(c) {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => return '?',
    };
    if c.is_uppercase() {
        folded.to_ascii_uppercase()
    } else {
        folded
    }
}

fn wrapped(
    text: &str,
    size: f32,
    weight: Weight,
    indent_mm: f32,
    hang_mm: f32,
    space_before_mm: f32,
) -> Vec<Line> {
    let text = pdf_text(text).split_whitespace().collect::<Vec<_>>().join(" ");
    let first_width = max_chars(size, weight, indent_mm);
    let rest_width = max_chars(size, weight, indent_mm + hang_mm);

    let mut lines = Vec::new();
    let mut remaining = text.as_str();
    if let Some(first) = wrap(remaining, first_width).into_iter().next() {
        lines.push(Line {
            text: first.clone(),
            size,
            weight,
            indent_mm,
            space_before_mm,
        });
        remaining = remaining[first.len()..].trim_start();
    }
    for rest in wrap(remaining, rest_width) {
        lines.push(Line {
            text: rest,
            size,
            weight,
            indent_mm: indent_mm + hang_mm,
            space_before_mm: 0.0,
        });
    }
    lines
}

/// Lines for one block. Spacers produce none; [`paginate`] handles them.
pub fn block_lines(block: &Block) -> Vec<Line> {
    match block {
        Block::Title(text) => wrapped(text, 20.0, Weight::Bold, 0.0, 0.0, 2.0),
        Block::Heading(text) => wrapped(text, 14.0, Weight::Bold, 0.0, 0.0, 3.0),
        Block::Subheading(text) => wrapped(text, 11.5, Weight::Bold, 0.0, 0.0, 2.0),
        Block::Paragraph(text) => wrapped(text, 11.0, Weight::Regular, 0.0, 0.0, 1.0),
        Block::Note(text) => wrapped(text, 9.0, Weight::Regular, 0.0, 0.0, 0.5),
        Block::Bullet(text) => wrapped(&format!("- {}", text), 11.0, Weight::Regular, 3.0, 3.0, 0.5),
        Block::Numbered(n, text) => {
            wrapped(&format!("{}. {}", n, text), 11.0, Weight::Regular, 3.0, 5.0, 1.0)
        }
        Block::Labeled(label, value) => {
            wrapped(&format!("{}: {}", label, value), 11.0, Weight::Regular, 0.0, 3.0, 0.5)
        }
        Block::Spacer => Vec::new(),
    }
}

/// Lay the document out on A4 pages. Each group starts a new page and
/// overflows onto as many pages as it needs.
pub fn paginate(layout: &DocumentLayout) -> Vec<Page> {
    let top = PAGE_HEIGHT_MM - MARGIN_MM;
    let mut pages = Vec::new();

    for group in &layout.groups {
        let mut page = Page::default();
        let mut y = top;
        let mut gap = 0.0;

        for block in &group.blocks {
            if *block == Block::Spacer {
                gap += SPACER_MM;
                continue;
            }
            for line in block_lines(block) {
                let at_top = page.lines.is_empty();
                let before = if at_top { 0.0 } else { gap + line.space_before_mm };
                let needed = before + line.height_mm();

                if y - needed < CONTENT_BOTTOM_MM && !at_top {
                    pages.push(std::mem::take(&mut page));
                    y = top - line.height_mm();
                } else {
                    y -= needed;
                }
                gap = 0.0;
                page.lines.push(PlacedLine { line, y_mm: y });
            }
        }
        pages.push(page);
    }

    if pages.is_empty() {
        pages.push(Page::default());
    }
    pages
}

fn pdf_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(e.to_string())
}

/// Render `layout` to PDF bytes.
pub fn render_pdf(layout: &DocumentLayout) -> Result<Vec<u8>, RenderError> {
    let pages = paginate(layout);
    let total = pages.len();

    let (doc, first_page, first_layer) = PdfDocument::new(
        pdf_text(&layout.title),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for placed in &page.lines {
            let font = match placed.line.weight {
                Weight::Regular => &regular,
                Weight::Bold => &bold,
            };
            layer.use_text(
                placed.line.text.as_str(),
                placed.line.size,
                Mm(MARGIN_MM + placed.line.indent_mm),
                Mm(placed.y_mm),
                font,
            );
        }

        layer.use_text(FOOTER_TEXT, FOOTER_SIZE, Mm(MARGIN_MM), Mm(FOOTER_Y_MM), &regular);
        let number = format!("Page {} of {}", index + 1, total);
        let x = PAGE_WIDTH_MM - MARGIN_MM - text_width_mm(&number, FOOTER_SIZE, Weight::Regular);
        layer.use_text(number.as_str(), FOOTER_SIZE, Mm(x), Mm(FOOTER_Y_MM), &regular);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::PageGroup;

    fn layout(groups: Vec<Vec<Block>>) -> DocumentLayout {
        DocumentLayout {
            title: "Test".to_string(),
            groups: groups
                .into_iter()
                .map(|blocks| PageGroup { blocks })
                .collect(),
        }
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_pdf_text_is_ascii() {
        assert_eq!(pdf_text("Crème brûlée – ½ cup • 350°"), "Creme brulee - 1/2 cup - 350 degrees");
        assert_eq!(pdf_text("“Easy”"), "\"Easy\"");
        assert!(pdf_text("🍂 leaves").is_ascii());
    }

    #[test]
    fn test_each_group_starts_a_page() {
        let pages = paginate(&layout(vec![
            vec![Block::Title("One".to_string())],
            vec![Block::Title("Two".to_string())],
        ]));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines[0].line.text, "Two");
    }

    #[test]
    fn test_long_group_overflows() {
        let blocks: Vec<Block> = (1..=120)
            .map(|n| Block::Numbered(n, format!("Step number {}", n)))
            .collect();
        let pages = paginate(&layout(vec![blocks]));
        assert!(pages.len() > 1);
        for page in &pages {
            for placed in &page.lines {
                assert!(placed.y_mm >= CONTENT_BOTTOM_MM);
                assert!(placed.y_mm <= PAGE_HEIGHT_MM - MARGIN_MM);
            }
        }
        let total: usize = pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn test_long_bullet_hangs() {
        let text = "word ".repeat(60);
        let lines = block_lines(&Block::Bullet(text));
        assert!(lines.len() > 1);
        assert!(lines[0].text.starts_with("- "));
        assert!(lines[1].indent_mm > lines[0].indent_mm);
    }

    #[test]
    fn test_empty_layout_still_has_a_page() {
        assert_eq!(paginate(&layout(vec![])).len(), 1);
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_pdf(&layout(vec![vec![
            Block::Title("Roasted Squash".to_string()),
            Block::Spacer,
            Block::Bullet("1 squash".to_string()),
        ]]))
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
