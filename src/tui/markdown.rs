//! Markdown → ratatui `Text` renderer.
//!
//! Walks `pulldown_cmark` events and builds owned `Line`s. Council answers
//! lean on headings, emphasis, lists, fenced code and tables, so those get
//! real treatment; raw HTML, footnotes and images are dropped.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use unicode_width::UnicodeWidthStr;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";
const TAB: &str = "    ";

/// Render markdown into styled, owned `Text`. Unstyled text uses `base_fg`.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_TABLES);

    let mut writer = Writer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        writer.handle(event);
    }
    writer.finish()
}

struct CodeBlock {
    lang: String,
    source: String,
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    cell: Option<String>,
}

struct Writer {
    base: Style,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    /// Inline style stack; each entry is already patched onto its parent.
    styles: Vec<Style>,
    quote_depth: usize,
    /// `None` = bullet list, `Some(n)` = ordered list whose next item is `n`.
    lists: Vec<Option<u64>>,
    /// True right after an item marker, until the item's first content.
    item_open: bool,
    code: Option<CodeBlock>,
    table: Option<Table>,
    link: Option<String>,
    gap: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            base: Style::default().fg(base_fg),
            lines: Vec::new(),
            spans: Vec::new(),
            styles: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            item_open: false,
            code: None,
            table: None,
            link: None,
            gap: false,
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush();
        Text::from(self.lines)
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn prefix(&self) -> Vec<Span<'static>> {
        (0..self.quote_depth)
            .map(|_| Span::styled("│ ", Style::default().fg(Color::DarkGray)))
            .collect()
    }

    /// Ends the line being built, if it has anything on it.
    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = self.prefix();
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    fn push_line(&mut self, spans: Vec<Span<'static>>) {
        self.flush();
        let mut line = self.prefix();
        line.extend(spans);
        self.lines.push(Line::from(line));
    }

    fn block_start(&mut self) {
        if self.item_open {
            // First block of a list item continues the marker's line
            return;
        }
        self.flush();
        if self.gap && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.gap = false;
    }

    fn block_end(&mut self) {
        self.flush();
        self.gap = true;
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.block_start();
                self.push_line(vec![Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )]);
                self.block_end();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.spans.push(Span::styled(marker, self.style()));
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.block_start(),
            Tag::Heading { level, .. } => {
                self.block_start();
                let style = heading_style(self.base, level);
                self.spans
                    .push(Span::styled(format!("{} ", "#".repeat(level as usize)), style));
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.block_start();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.block_start();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => {
                        lang.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some(CodeBlock {
                    lang,
                    source: String::new(),
                });
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.block_start();
                } else {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                self.item_open = true;
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.spans
                    .push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Table(_) => {
                self.block_start();
                self.table = Some(Table::default());
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.block_end(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.block_end();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.emit_code(code);
                }
                self.block_end();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.item_open = false;
                if self.lists.is_empty() {
                    self.block_end();
                } else {
                    self.flush();
                }
            }
            TagEnd::Item => {
                self.item_open = false;
                self.flush();
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.emit_table(table);
                }
                self.block_end();
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut()
                    && let Some(cell) = table.cell.take()
                    && let Some(row) = table.rows.last_mut()
                {
                    row.push(cell.trim().to_string());
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link.take() {
                    self.spans.push(Span::styled(
                        format!(" <{url}>"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.source.push_str(text);
            return;
        }
        if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(text);
            return;
        }
        self.item_open = false;
        let style = self.style();
        self.spans.push(Span::styled(text.replace('\t', TAB), style));
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(code);
            return;
        }
        self.item_open = false;
        self.spans.push(Span::styled(
            code.to_string(),
            Style::default().fg(Color::Yellow).bg(Color::Black),
        ));
    }

    fn emit_code(&mut self, code: CodeBlock) {
        let gutter = Style::default().fg(Color::DarkGray);
        if !code.lang.is_empty() {
            self.push_line(vec![Span::styled(
                code.lang.clone(),
                gutter.add_modifier(Modifier::ITALIC),
            )]);
        }
        let body = highlight(&code.lang, &code.source).unwrap_or_else(|| {
            code.source
                .lines()
                .map(|l| Line::from(Span::styled(l.replace('\t', TAB), Style::default().fg(Color::White))))
                .collect()
        });
        for line in body {
            let mut spans = vec![Span::styled("▏ ", gutter)];
            spans.extend(line.spans);
            self.push_line(spans);
        }
    }

    fn emit_table(&mut self, table: Table) {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let border = Style::default().fg(Color::DarkGray);
        for (r, row) in table.rows.iter().enumerate() {
            let cell_style = if r < table.header_rows {
                self.base.add_modifier(Modifier::BOLD)
            } else {
                self.base
            };
            let mut spans = Vec::new();
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", border));
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(cell.width());
                spans.push(Span::styled(format!("{cell}{}", " ".repeat(pad)), cell_style));
            }
            self.push_line(spans);

            if r + 1 == table.header_rows {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.push_line(vec![Span::styled(rule, border)]);
            }
        }
    }
}

fn highlight(lang: &str, source: &str) -> Option<Vec<Line<'static>>> {
    if lang.is_empty() {
        return None;
    }
    let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;
    let theme = THEME_SET.themes.get(CODE_THEME)?;
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut lines = Vec::new();
    for raw in LinesWithEndings::from(source) {
        let ranges = highlighter.highlight_line(raw, &SYNTAX_SET).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .filter_map(|(style, fragment)| {
                let fragment = fragment.trim_end_matches(['\n', '\r']).replace('\t', TAB);
                if fragment.is_empty() {
                    return None;
                }
                let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                Some(Span::styled(fragment, Style::default().fg(fg)))
            })
            .collect();
        lines.push(Line::from(spans));
    }
    Some(lines)
}

fn heading_style(base: Style, level: HeadingLevel) -> Style {
    let modifiers = match level {
        HeadingLevel::H1 => Modifier::BOLD | Modifier::UNDERLINED,
        HeadingLevel::H2 => Modifier::BOLD,
        _ => Modifier::BOLD | Modifier::ITALIC,
    };
    base.add_modifier(modifiers)
}

/// Flattens a line to its visible text. Handy for assertions.
#[cfg(test)]
pub(crate) fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
