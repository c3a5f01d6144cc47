use crate::model::{BracketPadding, NodeKind};
use crate::options::{EolStyle, Options};

/// Accumulates output one line at a time.
///
/// Segments are buffered until the line ends, so trailing whitespace can be
/// dropped before the line is committed to the document.
#[derive(Debug, Default)]
pub struct LineWriter {
    line: Vec<String>,
    doc: Vec<String>,
    trim_trailing: bool,
}

impl LineWriter {
    pub fn new(trim_trailing: bool) -> Self {
        Self {
            line: Vec::new(),
            doc: Vec::new(),
            trim_trailing,
        }
    }

    pub fn add(&mut self, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.line.push(value.to_string());
        }
        self
    }

    pub fn spaces(&mut self, count: usize) -> &mut Self {
        if count > 0 {
            self.line.push(" ".repeat(count));
        }
        self
    }

    pub fn end_line(&mut self, eol: &str) -> &mut Self {
        self.commit_line(eol);
        self
    }

    /// Commits a final partial line, if any, without a line ending.
    pub fn flush(&mut self) -> &mut Self {
        self.commit_line("");
        self
    }

    pub fn take(&mut self) -> String {
        let text = self.doc.join("");
        self.doc.clear();
        text
    }

    fn commit_line(&mut self, eol: &str) {
        if self.line.is_empty() && eol.is_empty() {
            return;
        }

        let mut line = self.line.join("");
        if self.trim_trailing {
            while line.ends_with(|c: char| c.is_whitespace()) {
                line.pop();
            }
        }

        self.doc.push(format!("{}{}", line, eol));
        self.line.clear();
    }
}

/// The measured widths a [`crate::table::ColumnSchema`] needs; a plain
/// `Copy` extract of [`Separators`] so schemas stay free of borrows.
#[derive(Debug, Clone, Copy)]
pub struct SepWidths {
    pub comma: usize,
    pub colon: usize,
    pub comment: usize,
    pub null_lit: usize,
    pub open: [usize; 3],
    pub close: [usize; 3],
}

/// Separator strings built once per formatting call from the options, with
/// their display widths precomputed, plus the indentation cache.
#[derive(Debug, Clone)]
pub struct Separators {
    comma: String,
    colon: String,
    comment: String,
    eol: String,
    ghost_comma: String,
    comma_w: usize,
    colon_w: usize,
    comment_w: usize,
    null_w: usize,
    prefix_w: usize,
    arr_open: [String; 3],
    arr_close: [String; 3],
    obj_open: [String; 3],
    obj_close: [String; 3],
    open_w: [usize; 3],
    close_w: [usize; 3],
    indent_w: usize,
    indents: Vec<String>,
}

impl Separators {
    pub fn new(opts: &Options, width: &dyn Fn(&str) -> usize) -> Self {
        let simple_pad = opts.simple_bracket_padding;
        let nested_pad = opts.nested_bracket_padding;

        let arr_open = [
            "[".to_string(),
            if simple_pad { "[ " } else { "[" }.to_string(),
            if nested_pad { "[ " } else { "[" }.to_string(),
        ];
        let arr_close = [
            "]".to_string(),
            if simple_pad { " ]" } else { "]" }.to_string(),
            if nested_pad { " ]" } else { "]" }.to_string(),
        ];
        let obj_open = [
            "{".to_string(),
            if simple_pad { "{ " } else { "{" }.to_string(),
            if nested_pad { "{ " } else { "{" }.to_string(),
        ];
        let obj_close = [
            "}".to_string(),
            if simple_pad { " }" } else { "}" }.to_string(),
            if nested_pad { " }" } else { "}" }.to_string(),
        ];

        let comma = if opts.comma_padding { ", " } else { "," }.to_string();
        let colon = if opts.colon_padding { ": " } else { ":" }.to_string();
        let comment = if opts.comment_padding { " " } else { "" }.to_string();
        let eol = match opts.eol_style {
            EolStyle::Crlf => "\r\n",
            EolStyle::Lf => "\n",
        }
        .to_string();

        // Array and object brackets are the same width, so one table serves both.
        let open_w = [
            width(&arr_open[0]),
            width(&arr_open[1]),
            width(&arr_open[2]),
        ];
        let close_w = [
            width(&arr_close[0]),
            width(&arr_close[1]),
            width(&arr_close[2]),
        ];

        let indent_unit = if opts.use_tab_to_indent {
            "\t".to_string()
        } else {
            " ".repeat(opts.indent_spaces)
        };
        let indent_w = width(&indent_unit);

        let comma_w = width(&comma);

        Self {
            ghost_comma: " ".repeat(comma_w),
            comma_w,
            colon_w: width(&colon),
            comment_w: width(&comment),
            null_w: width("null"),
            prefix_w: width(&opts.prefix_string),
            comma,
            colon,
            comment,
            eol,
            arr_open,
            arr_close,
            obj_open,
            obj_close,
            open_w,
            close_w,
            indent_w,
            indents: vec![String::new(), indent_unit],
        }
    }

    pub fn comma(&self) -> &str {
        &self.comma
    }
    pub fn colon(&self) -> &str {
        &self.colon
    }
    pub fn comment_pad(&self) -> &str {
        &self.comment
    }
    pub fn eol(&self) -> &str {
        &self.eol
    }
    /// Spaces occupying the width of a comma, for keeping columns aligned
    /// where no comma belongs.
    pub fn ghost_comma(&self) -> &str {
        &self.ghost_comma
    }

    pub fn comma_width(&self) -> usize {
        self.comma_w
    }
    pub fn colon_width(&self) -> usize {
        self.colon_w
    }
    pub fn comment_width(&self) -> usize {
        self.comment_w
    }
    pub fn prefix_width(&self) -> usize {
        self.prefix_w
    }
    pub fn indent_width(&self) -> usize {
        self.indent_w
    }

    pub fn open(&self, kind: NodeKind, pad: BracketPadding) -> &str {
        if kind == NodeKind::Array {
            &self.arr_open[pad as usize]
        } else {
            &self.obj_open[pad as usize]
        }
    }

    pub fn close(&self, kind: NodeKind, pad: BracketPadding) -> &str {
        if kind == NodeKind::Array {
            &self.arr_close[pad as usize]
        } else {
            &self.obj_close[pad as usize]
        }
    }

    pub fn open_width(&self, pad: BracketPadding) -> usize {
        self.open_w[pad as usize]
    }

    pub fn close_width(&self, pad: BracketPadding) -> usize {
        self.close_w[pad as usize]
    }

    pub fn widths(&self) -> SepWidths {
        SepWidths {
            comma: self.comma_w,
            colon: self.colon_w,
            comment: self.comment_w,
            null_lit: self.null_w,
            open: self.open_w,
            close: self.close_w,
        }
    }

    pub fn indent(&mut self, level: usize) -> String {
        if level >= self.indents.len() {
            let unit = self.indents[1].clone();
            for i in self.indents.len()..=level {
                let next = format!("{}{}", self.indents[i - 1], unit);
                self.indents.push(next);
            }
        }
        self.indents[level].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_whitespace_when_enabled() {
        let mut writer = LineWriter::new(true);
        writer.add("value").spaces(4).end_line("\n");
        assert_eq!(writer.take(), "value\n");
    }

    #[test]
    fn keeps_trailing_whitespace_when_disabled() {
        let mut writer = LineWriter::new(false);
        writer.add("value").spaces(2).end_line("\n");
        assert_eq!(writer.take(), "value  \n");
    }

    #[test]
    fn flush_commits_partial_line_without_eol() {
        let mut writer = LineWriter::new(true);
        writer.add("a").end_line("\n");
        writer.add("b").flush();
        assert_eq!(writer.take(), "a\nb");
    }

    #[test]
    fn indent_cache_grows_on_demand() {
        let opts = Options::default();
        let width = |s: &str| s.chars().count();
        let mut seps = Separators::new(&opts, &width);
        assert_eq!(seps.indent(0), "");
        assert_eq!(seps.indent(3), " ".repeat(12));
    }
}
