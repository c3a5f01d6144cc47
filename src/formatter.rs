use crate::builder::TreeBuilder;
use crate::convert::node_from_value;
use crate::error::{ErrorKind, FoldError};
use crate::model::{BracketPadding, LayoutKind, Node, NodeKind};
use crate::options::{NumberListAlignment, Options, TableCommaPlacement};
use crate::table::ColumnSchema;
use crate::writer::{LineWriter, Separators};

/// The formatter: parses JSON(-with-comments) text and re-emits it with
/// layout chosen per container.
///
/// Each container in the document is rendered the first way that fits, in
/// order: on a single line; as a column-aligned table when its children
/// share a shape; as compact rows of several array items per line; or
/// expanded with one child per line. The thresholds for each mode live in
/// [`Options`].
///
/// A `Formatter` holds its options plus per-call scratch state. The
/// scratch is reset at the start of every call, so one instance can be
/// reused for document after document, but a single instance must not be
/// handed two overlapping documents from two threads. Independent
/// instances share nothing.
///
/// # Example
///
/// ```rust
/// use jsonfold::Formatter;
///
/// let mut formatter = Formatter::new();
/// let output = formatter.reformat(r#"{"a":[1,2],"b":3}"#, 0).unwrap();
/// assert_eq!(output, "{ \"a\": [1, 2], \"b\": 3 }\n");
/// ```
pub struct Formatter {
    /// The configuration consumed by each call. Read, never written, while
    /// a call is in progress.
    pub options: Options,
    string_width: Box<dyn Fn(&str) -> usize>,
    writer: LineWriter,
    seps: Separators,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let string_width: Box<dyn Fn(&str) -> usize> = Box::new(|s: &str| s.chars().count());
        let seps = Separators::new(&options, string_width.as_ref());
        let writer = LineWriter::new(options.omit_trailing_whitespace);
        Self {
            options,
            string_width,
            writer,
            seps,
        }
    }

    /// Replaces the function used to measure the display width of a
    /// string. The default counts `char`s; supply something like
    /// `unicode_width::UnicodeWidthStr::width` when East Asian wide
    /// characters should count as two columns.
    pub fn set_string_width(&mut self, width: impl Fn(&str) -> usize + 'static) {
        self.string_width = Box::new(width);
    }

    /// Reformats JSON text. `starting_depth` sets the indentation level of
    /// the root value, for embedding the output inside other indented
    /// content.
    pub fn reformat(&mut self, input: &str, starting_depth: usize) -> Result<String, FoldError> {
        let roots = TreeBuilder::new(self.options.clone()).parse_top_level(input, true)?;
        Ok(self.format_roots(roots, starting_depth))
    }

    /// Re-emits JSON text as small as possible: no whitespace, no
    /// comments, no blank lines. The comment policy still decides whether
    /// comments in the input are accepted at all.
    pub fn minify(&mut self, input: &str) -> Result<String, FoldError> {
        let roots = TreeBuilder::new(self.options.clone()).parse_top_level(input, true)?;
        let mut out = String::new();
        for root in &roots {
            if root.kind.is_trivia() {
                continue;
            }
            write_minified(&mut out, root);
        }
        Ok(out)
    }

    /// Formats any serializable value directly, without a round trip
    /// through JSON text. `recursion_limit` bounds the conversion depth so
    /// a cyclic structure fails instead of recursing forever.
    pub fn serialize<T: serde::Serialize>(
        &mut self,
        value: &T,
        starting_depth: usize,
        recursion_limit: usize,
    ) -> Result<String, FoldError> {
        let json = serde_json::to_value(value)
            .map_err(|e| FoldError::new(ErrorKind::Structural, e.to_string(), None))?;
        let root = node_from_value(&json, None, recursion_limit)?;
        Ok(self.format_roots(vec![root], starting_depth))
    }

    fn format_roots(&mut self, mut roots: Vec<Node>, depth: usize) -> String {
        self.begin_call();
        for root in &mut roots {
            self.measure(root);
        }
        for root in &mut roots {
            self.format_item(root, depth, false);
        }
        self.writer.take()
    }

    /// Rebuilds the per-call scratch from the current options.
    fn begin_call(&mut self) {
        self.seps = Separators::new(&self.options, self.string_width.as_ref());
        self.writer = LineWriter::new(self.options.omit_trailing_whitespace);
    }

    // -- Metrics pass --

    /// Bottom-up width and complexity bookkeeping. Children are always
    /// finalized before their parent reads them.
    fn measure(&self, node: &mut Node) {
        for child in &mut node.children {
            self.measure(child);
        }

        let width = self.string_width.as_ref();
        node.key_width = width(&node.key);
        node.leading_comment_width = width(&node.leading_comment);
        node.inner_comment_width = width(&node.inner_comment);
        node.trailing_comment_width = width(&node.trailing_comment);

        // True when the node's own content cannot sit on one line. A
        // trailing line comment on the node itself is excluded: it is fine
        // at the end of a line, just not in the middle of one, which is
        // why children with one poison their parent instead.
        node.requires_multiline = match node.kind {
            NodeKind::BlankLine | NodeKind::LineComment => true,
            NodeKind::BlockComment => node.text.contains('\n'),
            _ => false,
        } || node.inner_comment_spans_lines
            || node
                .children
                .iter()
                .any(|c| c.requires_multiline || c.trailing_comment_is_line_style);

        node.text_width = if node.kind.is_container() {
            self.inline_core_width(node)
        } else {
            width(&node.text)
        };

        let mut decorated = node.text_width;
        if node.key_width > 0 {
            decorated += node.key_width + self.seps.colon_width();
        }
        if node.leading_comment_width > 0 {
            decorated += node.leading_comment_width + self.seps.comment_width();
        }
        if node.inner_comment_width > 0 {
            decorated += node.inner_comment_width + self.seps.comment_width();
        }
        if node.trailing_comment_width > 0 {
            decorated += node.trailing_comment_width + self.seps.comment_width();
        }
        node.inline_width = decorated;
    }

    fn inline_core_width(&self, node: &Node) -> usize {
        if node.children.is_empty() {
            return self.seps.open_width(BracketPadding::Empty)
                + self.seps.close_width(BracketPadding::Empty);
        }
        let pad = node.bracket_padding();
        let mut total = self.seps.open_width(pad) + self.seps.close_width(pad);
        let mut value_count = 0usize;
        for child in &node.children {
            if child.kind.is_trivia() {
                total += child.text_width + self.seps.comment_width();
            } else {
                total += child.inline_width;
                value_count += 1;
            }
        }
        total + self.seps.comma_width() * value_count.saturating_sub(1)
    }

    // -- Layout selection --

    fn format_item(&mut self, node: &mut Node, depth: usize, include_comma: bool) {
        match node.kind {
            NodeKind::Object | NodeKind::Array => {
                self.format_container(node, depth, include_comma)
            }
            NodeKind::BlankLine => {
                node.record_layout(LayoutKind::Expanded);
                self.writer.add(&self.options.prefix_string);
                self.writer.end_line(self.seps.eol());
            }
            NodeKind::LineComment | NodeKind::BlockComment => {
                node.record_layout(LayoutKind::Expanded);
                self.write_standalone_comment(node, depth);
            }
            _ => {
                node.record_layout(LayoutKind::Inline);
                self.write_leaf(node, depth, include_comma);
            }
        }
    }

    fn format_container(&mut self, node: &mut Node, depth: usize, include_comma: bool) {
        let force_expand = self.options.always_expand_depth >= 0
            && depth as isize <= self.options.always_expand_depth;
        if !force_expand {
            if self.try_inline(node, depth, include_comma) {
                return;
            }
            if self.try_table(node, depth, include_comma) {
                return;
            }
            if node.kind == NodeKind::Array && self.try_compact(node, depth, include_comma) {
                return;
            }
        }
        self.write_expanded(node, depth, include_comma);
    }

    fn try_inline(&mut self, node: &mut Node, depth: usize, include_comma: bool) -> bool {
        let cap = self.options.max_inline_complexity;
        if cap < 0 || node.complexity as isize > cap {
            return false;
        }
        if node.requires_multiline {
            return false;
        }

        let budget = self
            .available_width(depth)
            .min(self.options.max_inline_length);
        let comma_width = if include_comma { 1 } else { 0 };
        if node.inline_width + comma_width > budget {
            return false;
        }

        // The estimate said it might fit; the rendered text is the
        // authority.
        let text = self.decorated_line(node, include_comma);
        if (self.string_width)(&text) > budget {
            return false;
        }

        node.record_layout(LayoutKind::Inline);
        self.begin_line(depth);
        self.writer.add(&text);
        self.writer.end_line(self.seps.eol());
        true
    }

    fn try_table(&mut self, node: &mut Node, depth: usize, include_comma: bool) -> bool {
        let cap = self.options.max_table_row_complexity;
        if cap < 0 {
            return false;
        }

        let mut value_rows = 0usize;
        for row in &node.children {
            if row.kind.is_trivia() {
                continue;
            }
            if !row.kind.is_container() && row.kind != NodeKind::Null {
                return false;
            }
            if row.complexity as isize > cap {
                return false;
            }
            value_rows += 1;
        }
        if value_rows < 2 {
            return false;
        }

        let Some(mut schema) = ColumnSchema::for_rows(
            &node.children,
            self.seps.widths(),
            self.options.number_list_alignment,
        ) else {
            return false;
        };

        if schema.key_width > 0
            && schema.key_width.saturating_sub(schema.key_width_min)
                > self.options.max_key_padding
        {
            return false;
        }

        if !schema.fit_within(self.available_width(depth + 1)) {
            return false;
        }

        self.write_table(node, depth, include_comma, &schema);
        true
    }

    fn try_compact(&mut self, node: &mut Node, depth: usize, include_comma: bool) -> bool {
        let cap = self.options.max_compact_array_complexity;
        if cap < 0 || node.complexity as isize > cap {
            return false;
        }
        if node.requires_multiline || node.children.len() < 2 {
            return false;
        }
        // Packed rows leave no good place for a comment to land.
        let carries_comments = node.children.iter().any(|c| {
            c.kind.is_trivia()
                || !c.leading_comment.is_empty()
                || !c.inner_comment.is_empty()
                || !c.trailing_comment.is_empty()
        });
        if carries_comments {
            return false;
        }

        let budget = self.available_width(depth + 1);
        let schema = ColumnSchema::for_list(
            &node.children,
            self.seps.widths(),
            self.options.number_list_alignment,
        );
        let number_slots =
            schema.is_number_column() && schema.alignment() != NumberListAlignment::Left;

        let widest = if number_slots {
            schema.composite_width
        } else {
            node.children.iter().map(|c| c.inline_width).max().unwrap_or(0)
        };
        let slot = (widest + self.seps.comma_width()).max(1);
        let per_line = (budget + self.seps.comma_width()) / slot;
        if per_line < self.options.min_compact_array_row_items.max(1) {
            return false;
        }

        node.record_layout(LayoutKind::CompactArray);
        self.write_open_line(node, depth);

        let n = node.children.len();
        if number_slots {
            let mut i = 0;
            while i < n {
                self.begin_line(depth + 1);
                let end = (i + per_line).min(n);
                for j in i..end {
                    let comma = if j + 1 < n { self.seps.comma() } else { "" };
                    schema.write_number(&mut self.writer, &node.children[j], comma);
                }
                self.writer.end_line(self.seps.eol());
                i = end;
            }
        } else {
            self.begin_line(depth + 1);
            let mut used = 0usize;
            for (j, child) in node.children.iter().enumerate() {
                let piece = self.decorated_line(child, false);
                let piece_width = (self.string_width)(&piece);
                if used > 0 && used + piece_width > budget {
                    self.writer.end_line(self.seps.eol());
                    self.begin_line(depth + 1);
                    used = 0;
                }
                self.writer.add(&piece);
                used += piece_width;
                if j + 1 < n {
                    self.writer.add(self.seps.comma());
                    used += self.seps.comma_width();
                }
            }
            self.writer.end_line(self.seps.eol());
        }

        self.write_close_line(node, depth, include_comma);
        true
    }

    // -- Rendering --

    fn write_expanded(&mut self, node: &mut Node, depth: usize, include_comma: bool) {
        node.record_layout(LayoutKind::Expanded);

        if node.children.is_empty() {
            // Nothing to expand; a bare bracket pair is emitted as-is.
            let text = self.decorated_line(node, include_comma);
            self.begin_line(depth);
            self.writer.add(&text);
            self.writer.end_line(self.seps.eol());
            return;
        }

        self.write_open_line(node, depth);
        let last_value = node.children.iter().rposition(|c| !c.kind.is_trivia());
        for (i, child) in node.children.iter_mut().enumerate() {
            let child_comma = !child.kind.is_trivia() && Some(i) != last_value;
            self.format_item(child, depth + 1, child_comma);
        }
        self.write_close_line(node, depth, include_comma);
    }

    fn write_table(
        &mut self,
        node: &mut Node,
        depth: usize,
        include_comma: bool,
        schema: &ColumnSchema,
    ) {
        node.record_layout(LayoutKind::Table);
        self.write_open_line(node, depth);

        let last_value = node.children.iter().rposition(|c| !c.kind.is_trivia());
        for (i, row) in node.children.iter().enumerate() {
            match row.kind {
                NodeKind::BlankLine => {
                    self.writer.add(&self.options.prefix_string);
                    self.writer.end_line(self.seps.eol());
                }
                NodeKind::LineComment | NodeKind::BlockComment => {
                    self.write_standalone_comment(row, depth + 1);
                }
                _ => {
                    self.begin_line(depth + 1);
                    let comma = if Some(i) != last_value {
                        ","
                    } else if schema.trailing_comment_width > 0 {
                        " "
                    } else {
                        ""
                    };
                    self.write_table_cell(row, schema, comma);
                    self.writer.end_line(self.seps.eol());
                }
            }
        }

        self.write_close_line(node, depth, include_comma);
    }

    /// One cell of a table row: comment and key slots padded to the
    /// column's widths, then the value, then the trailing-comment slot.
    /// `comma` is this cell's separator, placed relative to the value
    /// padding per the comma-placement policy.
    fn write_table_cell(&mut self, item: &Node, col: &ColumnSchema, comma: &str) {
        if col.leading_comment_width > 0 {
            if item.leading_comment.is_empty() {
                self.writer
                    .spaces(col.leading_comment_width + self.seps.comment_width());
            } else {
                self.writer.add(&item.leading_comment);
                self.writer.spaces(
                    col.leading_comment_width - item.leading_comment_width
                        + self.seps.comment_width(),
                );
            }
        }

        if col.key_width > 0 {
            if item.key.is_empty() {
                self.writer.spaces(col.key_width + self.seps.colon_width());
            } else if self.options.colon_before_key_padding {
                self.writer.add(&item.key);
                self.writer.add(self.seps.colon());
                self.writer.spaces(col.key_width - item.key_width);
            } else {
                self.writer.add(&item.key);
                self.writer.spaces(col.key_width - item.key_width);
                self.writer.add(self.seps.colon());
            }
        }

        if col.inner_comment_width > 0 {
            if item.inner_comment.is_empty() {
                self.writer
                    .spaces(col.inner_comment_width + self.seps.comment_width());
            } else {
                self.writer.add(&item.inner_comment);
                self.writer.spaces(
                    col.inner_comment_width - item.inner_comment_width
                        + self.seps.comment_width(),
                );
            }
        }

        self.write_cell_value(item, col, comma);

        if col.trailing_comment_width > 0 {
            if item.trailing_comment.is_empty() {
                self.writer
                    .spaces(col.trailing_comment_width + self.seps.comment_width());
            } else {
                self.writer.add(self.seps.comment_pad());
                self.writer.add(&item.trailing_comment);
                self.writer
                    .spaces(col.trailing_comment_width - item.trailing_comment_width);
            }
        }
    }

    fn write_cell_value(&mut self, item: &Node, col: &ColumnSchema, comma: &str) {
        // A null standing in for a whole composite column.
        if item.kind == NodeKind::Null && !col.columns.is_empty() {
            self.writer.add(&item.text);
            self.writer.add(comma);
            self.writer
                .spaces(col.composite_width.saturating_sub(item.text_width));
            return;
        }

        if !col.columns.is_empty() && item.kind.is_container() {
            let comma_text = self.seps.comma().to_string();
            let ghost = self.seps.ghost_comma().to_string();
            self.writer.add(self.seps.open(item.kind, col.pad));

            let members: Vec<Option<&Node>> = col
                .columns
                .iter()
                .enumerate()
                .map(|(j, sub)| lookup_member(item, sub.key.as_deref(), j))
                .collect();
            let last_present = members.iter().rposition(|m| m.is_some());
            let column_count = col.columns.len();

            for (j, sub) in col.columns.iter().enumerate() {
                match members[j] {
                    Some(member) => {
                        let sub_comma = if Some(j) != last_present {
                            comma_text.as_str()
                        } else if j + 1 < column_count {
                            ghost.as_str()
                        } else {
                            ""
                        };
                        self.write_table_cell(member, sub, sub_comma);
                    }
                    None => {
                        let gap = if j + 1 < column_count {
                            self.seps.comma_width()
                        } else {
                            0
                        };
                        self.writer.spaces(sub.total_width + gap);
                    }
                }
            }

            self.writer.add(self.seps.close(item.kind, col.pad));
            self.writer.spaces(col.null_shim);
            self.writer.add(comma);
            return;
        }

        if col.is_number_column() && matches!(item.kind, NodeKind::Number | NodeKind::Null) {
            let comma_after_padding = matches!(
                self.options.table_comma_placement,
                TableCommaPlacement::AfterPadding
                    | TableCommaPlacement::BeforePaddingExceptNumbers
            );
            if comma_after_padding {
                col.write_number(&mut self.writer, item, "");
                self.writer.add(comma);
            } else {
                col.write_number(&mut self.writer, item, comma);
            }
            return;
        }

        let value = if item.kind.is_container() {
            self.inline_core(item)
        } else {
            item.text.clone()
        };
        let pad = col.composite_width.saturating_sub(item.text_width);
        self.writer.add(&value);
        if self.options.table_comma_placement == TableCommaPlacement::AfterPadding {
            self.writer.spaces(pad);
            self.writer.add(comma);
        } else {
            self.writer.add(comma);
            self.writer.spaces(pad);
        }
    }

    fn write_leaf(&mut self, node: &Node, depth: usize, include_comma: bool) {
        self.begin_line(depth);
        if !node.leading_comment.is_empty() {
            self.writer.add(&node.leading_comment);
            self.writer.add(self.seps.comment_pad());
        }
        if !node.key.is_empty() {
            self.writer.add(&node.key);
            self.writer.add(self.seps.colon());
        }
        if !node.inner_comment.is_empty() {
            self.write_inner_comment(node, depth);
        }
        self.writer.add(&node.text);
        if include_comma {
            self.writer.add(",");
        }
        if !node.trailing_comment.is_empty() {
            self.writer.add(self.seps.comment_pad());
            self.writer.add(&node.trailing_comment);
        }
        self.writer.end_line(self.seps.eol());
    }

    fn write_standalone_comment(&mut self, node: &Node, depth: usize) {
        for line in node.text.split('\n') {
            self.begin_line(depth);
            self.writer.add(line);
            self.writer.end_line(self.seps.eol());
        }
    }

    /// Emits the comment sitting between a key and its value. Multi-line
    /// comments continue on fresh lines one level deeper, leaving the
    /// value to follow the final comment line.
    fn write_inner_comment(&mut self, node: &Node, depth: usize) {
        if !node.inner_comment_spans_lines {
            self.writer.add(&node.inner_comment);
            self.writer.add(self.seps.comment_pad());
            return;
        }
        let mut lines = node.inner_comment.split('\n').peekable();
        while let Some(line) = lines.next() {
            self.writer.add(line);
            if lines.peek().is_some() {
                self.writer.end_line(self.seps.eol());
                self.begin_line(depth + 1);
            }
        }
        self.writer.add(self.seps.comment_pad());
    }

    fn write_open_line(&mut self, node: &Node, depth: usize) {
        self.begin_line(depth);
        if !node.leading_comment.is_empty() {
            self.writer.add(&node.leading_comment);
            self.writer.add(self.seps.comment_pad());
        }
        if !node.key.is_empty() {
            self.writer.add(&node.key);
            self.writer.add(self.seps.colon());
        }
        if !node.inner_comment.is_empty() {
            self.write_inner_comment(node, depth);
        }
        self.writer
            .add(if node.kind == NodeKind::Array { "[" } else { "{" });
        self.writer.end_line(self.seps.eol());
    }

    fn write_close_line(&mut self, node: &Node, depth: usize, include_comma: bool) {
        self.begin_line(depth);
        self.writer
            .add(if node.kind == NodeKind::Array { "]" } else { "}" });
        if include_comma {
            self.writer.add(",");
        }
        if !node.trailing_comment.is_empty() {
            self.writer.add(self.seps.comment_pad());
            self.writer.add(&node.trailing_comment);
        }
        self.writer.end_line(self.seps.eol());
    }

    /// The node with its comments, key, value, and optional comma, as one
    /// line of text without indentation.
    fn decorated_line(&self, node: &Node, include_comma: bool) -> String {
        let mut text = String::new();
        if !node.leading_comment.is_empty() {
            text.push_str(&node.leading_comment);
            text.push_str(self.seps.comment_pad());
        }
        if !node.key.is_empty() {
            text.push_str(&node.key);
            text.push_str(self.seps.colon());
        }
        if !node.inner_comment.is_empty() {
            text.push_str(&node.inner_comment);
            text.push_str(self.seps.comment_pad());
        }
        text.push_str(&self.inline_core(node));
        if include_comma {
            text.push(',');
        }
        if !node.trailing_comment.is_empty() {
            text.push_str(self.seps.comment_pad());
            text.push_str(&node.trailing_comment);
        }
        text
    }

    /// The value portion of a node on a single line: the literal text for
    /// leaves, the full bracketed rendering for containers.
    fn inline_core(&self, node: &Node) -> String {
        if !node.kind.is_container() {
            return node.text.clone();
        }
        if node.children.is_empty() {
            let mut text = String::from(self.seps.open(node.kind, BracketPadding::Empty));
            text.push_str(self.seps.close(node.kind, BracketPadding::Empty));
            return text;
        }

        let pad = node.bracket_padding();
        let mut text = String::from(self.seps.open(node.kind, pad));
        let last_value = node.children.iter().rposition(|c| !c.kind.is_trivia());
        for (i, child) in node.children.iter().enumerate() {
            if child.kind.is_trivia() {
                text.push_str(&child.text);
                text.push_str(self.seps.comment_pad());
                continue;
            }
            text.push_str(&self.decorated_line(child, false));
            if Some(i) != last_value {
                text.push_str(self.seps.comma());
            }
        }
        text.push_str(self.seps.close(node.kind, pad));
        text
    }

    fn begin_line(&mut self, depth: usize) {
        let indent = self.seps.indent(depth);
        self.writer.add(&self.options.prefix_string);
        self.writer.add(&indent);
    }

    fn available_width(&self, depth: usize) -> usize {
        self.options
            .max_total_line_length
            .saturating_sub(self.seps.prefix_width() + self.seps.indent_width() * depth)
    }
}

fn lookup_member<'a>(container: &'a Node, key: Option<&str>, position: usize) -> Option<&'a Node> {
    let mut values = container.children.iter().filter(|c| !c.kind.is_trivia());
    match key {
        Some(key) => values.find(|c| c.key == key),
        None => values.nth(position),
    }
}

fn write_minified(out: &mut String, node: &Node) {
    if !node.key.is_empty() {
        out.push_str(&node.key);
        out.push(':');
    }
    match node.kind {
        NodeKind::Object | NodeKind::Array => {
            let (open, close) = if node.kind == NodeKind::Array {
                ('[', ']')
            } else {
                ('{', '}')
            };
            out.push(open);
            let mut first = true;
            for child in &node.children {
                if child.kind.is_trivia() {
                    continue;
                }
                if !first {
                    out.push(',');
                }
                first = false;
                write_minified(out, child);
            }
            out.push(close);
        }
        _ => out.push_str(&node.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reformat(input: &str) -> String {
        Formatter::new().reformat(input, 0).unwrap()
    }

    #[test]
    fn short_values_stay_inline() {
        assert_eq!(reformat("[1, 2, 3]"), "[1, 2, 3]\n");
        assert_eq!(reformat("{\"a\":1}"), "{\"a\": 1}\n");
    }

    #[test]
    fn empty_containers_render_bare() {
        assert_eq!(reformat("{}"), "{}\n");
        assert_eq!(reformat("[ ]"), "[]\n");
    }

    #[test]
    fn nested_bracket_padding_applies_to_complex_containers() {
        assert_eq!(reformat("[[1, 2]]"), "[ [1, 2] ]\n");
    }

    #[test]
    fn minify_drops_all_trivia() {
        let mut formatter = Formatter::new();
        formatter.options.comment_policy = crate::options::CommentPolicy::Preserve;
        formatter.options.preserve_blank_lines = true;
        let out = formatter
            .minify("{\n  // note\n  \"a\": [1, 2], \n\n  \"b\": {}\n}")
            .unwrap();
        assert_eq!(out, r#"{"a":[1,2],"b":{}}"#);
    }

    #[test]
    fn serialize_formats_rust_values() {
        #[derive(serde::Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        let out = Formatter::new().serialize(&Point { x: 1, y: 2 }, 0, 16).unwrap();
        assert_eq!(out, "{\"x\": 1, \"y\": 2}\n");
    }

    #[test]
    fn serialize_reports_depth_limit() {
        let nested: Vec<Vec<Vec<i32>>> = vec![vec![vec![1]]];
        let err = Formatter::new().serialize(&nested, 0, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
    }

    #[test]
    fn prefix_string_lands_on_every_line() {
        let mut formatter = Formatter::new();
        formatter.options.prefix_string = "  * ".to_string();
        formatter.options.max_total_line_length = 16;
        let out = formatter.reformat(r#"{"alpha": 1, "beta": 2}"#, 0).unwrap();
        for line in out.lines() {
            assert!(line.starts_with("  *"), "line {:?}", line);
        }
    }

    #[test]
    fn starting_depth_indents_the_root() {
        let out = Formatter::new().reformat("[1, 2]", 2).unwrap();
        assert_eq!(out, "        [1, 2]\n");
    }
}
