use std::collections::HashSet;

use crate::model::{BracketPadding, ColumnKind, Node, NodeKind};
use crate::options::NumberListAlignment;
use crate::writer::{LineWriter, SepWidths};

/// A shared column layout derived from a run of structurally similar
/// sibling nodes.
///
/// Building a schema is a pure function of the siblings plus the separator
/// widths: [`ColumnSchema::for_rows`] returns `Some` only when the rows are
/// all containers of the same kind (nulls permitted as placeholders) and at
/// least two rows qualify. Object rows unify into the union of their keys
/// in first-seen order; array rows align positionally. The schema can then
/// be narrowed with [`ColumnSchema::fit_within`], which drops nested column
/// detail until the widest row fits the available budget.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    /// Owning object key for this column, quotes included. `None` for the
    /// root schema and for positional array columns.
    pub key: Option<String>,
    pub kind: ColumnKind,
    pub row_count: usize,
    pub key_width: usize,
    pub key_width_min: usize,
    pub value_width: usize,
    pub leading_comment_width: usize,
    pub inner_comment_width: usize,
    pub trailing_comment_width: usize,
    pub pad: BracketPadding,
    pub requires_multiline: bool,
    /// Width of the value portion of a cell once padding and sub-columns
    /// are accounted for.
    pub composite_width: usize,
    /// Width of a full cell: comments, key, colon, and value.
    pub total_width: usize,
    /// Extra spaces so a bare `null` row is no narrower than the composite
    /// rows around it.
    pub null_shim: usize,
    pub contains_null: bool,
    pub columns: Vec<ColumnSchema>,
    seps: SepWidths,
    alignment: NumberListAlignment,
    digits_before_dot: usize,
    digits_after_dot: usize,
}

impl ColumnSchema {
    fn new(seps: SepWidths, alignment: NumberListAlignment) -> Self {
        Self {
            key: None,
            kind: ColumnKind::Unknown,
            row_count: 0,
            key_width: 0,
            key_width_min: usize::MAX,
            value_width: 0,
            leading_comment_width: 0,
            inner_comment_width: 0,
            trailing_comment_width: 0,
            pad: BracketPadding::Simple,
            requires_multiline: false,
            composite_width: 0,
            total_width: 0,
            null_shim: 0,
            contains_null: false,
            columns: Vec::new(),
            seps,
            alignment,
            digits_before_dot: 0,
            digits_after_dot: 0,
        }
    }

    /// Derives the shared schema for a table whose rows are `siblings`.
    /// Trivia siblings are skipped; they sit between rows without
    /// affecting the columns.
    pub fn for_rows(
        siblings: &[Node],
        seps: SepWidths,
        alignment: NumberListAlignment,
    ) -> Option<Self> {
        let mut schema = Self::new(seps, alignment);
        for row in siblings {
            schema.measure_row(row, true);
        }
        schema.recompute(usize::MAX);

        let qualifies = schema.row_count >= 2
            && !schema.requires_multiline
            && matches!(schema.kind, ColumnKind::Array | ColumnKind::Object);
        if qualifies {
            Some(schema)
        } else {
            None
        }
    }

    /// Measures a flat list of array items without descending into them,
    /// for compact packed rows where every item gets the same slot width.
    pub fn for_list(items: &[Node], seps: SepWidths, alignment: NumberListAlignment) -> Self {
        let mut schema = Self::new(seps, alignment);
        for item in items {
            schema.measure_row(item, false);
        }
        schema.recompute(usize::MAX);
        schema
    }

    /// Drops nested column detail until the widest row fits in
    /// `budget`, or reports that even fully flattened rows do not fit.
    pub fn fit_within(&mut self, budget: usize) -> bool {
        let mut depth = self.schema_depth();
        loop {
            if self.total_width <= budget {
                return true;
            }
            if depth == 0 {
                return false;
            }
            depth -= 1;
            self.recompute(depth);
        }
    }

    /// Writes a number cell justified per the alignment mode, with
    /// `comma` placed directly after the value text. Padding to the
    /// composite width surrounds the value as the mode requires.
    pub fn write_number(&self, writer: &mut LineWriter, item: &Node, comma: &str) {
        match self.alignment {
            NumberListAlignment::Left => {
                writer
                    .add(&item.text)
                    .add(comma)
                    .spaces(self.composite_width.saturating_sub(item.text_width));
                return;
            }
            NumberListAlignment::Right => {
                writer
                    .spaces(self.composite_width.saturating_sub(item.text_width))
                    .add(&item.text)
                    .add(comma);
                return;
            }
            _ => {}
        }

        if item.kind == NodeKind::Null {
            writer
                .spaces(self.digits_before_dot.saturating_sub(item.text_width))
                .add(&item.text)
                .add(comma)
                .spaces(self.composite_width.saturating_sub(self.digits_before_dot));
            return;
        }

        if self.alignment == NumberListAlignment::Normalize {
            let parsed: f64 = item.text.parse().unwrap_or(f64::NAN);
            let rewritten = format!("{:.*}", self.digits_after_dot, parsed);
            writer
                .spaces(self.composite_width.saturating_sub(rewritten.len()))
                .add(&rewritten)
                .add(comma);
            return;
        }

        // Decimal: line the values up on the dot, or where the dot would be.
        let (left_pad, right_pad) = match dot_or_exp_index(&item.text) {
            Some(dot) => {
                let left = self.digits_before_dot.saturating_sub(dot);
                let right = self
                    .composite_width
                    .saturating_sub(left + item.text_width);
                (left, right)
            }
            None => {
                let left = self.digits_before_dot.saturating_sub(item.text_width);
                let right = self.composite_width.saturating_sub(self.digits_before_dot);
                (left, right)
            }
        };
        writer
            .spaces(left_pad)
            .add(&item.text)
            .add(comma)
            .spaces(right_pad);
    }

    fn measure_row(&mut self, row: &Node, recursive: bool) {
        if row.kind.is_trivia() {
            return;
        }

        let row_kind = match row.kind {
            NodeKind::Null => ColumnKind::Unknown,
            NodeKind::Number => ColumnKind::Number,
            NodeKind::Array => ColumnKind::Array,
            NodeKind::Object => ColumnKind::Object,
            _ => ColumnKind::Simple,
        };

        if self.kind == ColumnKind::Unknown {
            self.kind = row_kind;
        } else if row_kind != ColumnKind::Unknown && self.kind != row_kind {
            self.kind = ColumnKind::Mixed;
        }

        if row.kind == NodeKind::Null {
            self.digits_before_dot = self.digits_before_dot.max(self.seps.null_lit);
            self.contains_null = true;
        }

        if row.requires_multiline {
            self.requires_multiline = true;
            self.kind = ColumnKind::Mixed;
        }

        self.row_count += 1;
        self.key_width = self.key_width.max(row.key_width);
        self.key_width_min = self.key_width_min.min(row.key_width);
        self.value_width = self.value_width.max(row.text_width);
        self.leading_comment_width = self.leading_comment_width.max(row.leading_comment_width);
        self.inner_comment_width = self.inner_comment_width.max(row.inner_comment_width);
        self.trailing_comment_width = self.trailing_comment_width.max(row.trailing_comment_width);

        if row.complexity >= 2 {
            self.pad = BracketPadding::Nested;
        }

        if self.requires_multiline || row.kind == NodeKind::Null {
            return;
        }

        // A standalone comment or blank line inside a row has no column to
        // live in; such rows cannot be tabled.
        if recursive
            && row.kind.is_container()
            && row.children.iter().any(|c| c.kind.is_trivia())
        {
            self.kind = ColumnKind::Mixed;
            return;
        }

        if self.kind == ColumnKind::Array && recursive {
            for (i, child) in row.children.iter().enumerate() {
                if self.columns.len() <= i {
                    self.columns.push(Self::new(self.seps, self.alignment));
                }
                self.columns[i].measure_row(child, true);
            }
        } else if self.kind == ColumnKind::Object && recursive {
            if has_duplicate_keys(&row.children) {
                self.kind = ColumnKind::Simple;
                return;
            }

            for member in &row.children {
                if member.kind.is_trivia() {
                    continue;
                }
                let existing = self
                    .columns
                    .iter()
                    .position(|c| c.key.as_deref() == Some(member.key.as_str()));
                match existing {
                    Some(i) => self.columns[i].measure_row(member, true),
                    None => {
                        let mut column = Self::new(self.seps, self.alignment);
                        column.key = Some(member.key.clone());
                        column.measure_row(member, true);
                        self.columns.push(column);
                    }
                }
            }
        }

        let skip_digits = self.kind != ColumnKind::Number
            || matches!(
                self.alignment,
                NumberListAlignment::Left | NumberListAlignment::Right
            );
        if skip_digits {
            return;
        }

        let mut digit_text = row.text.clone();
        if self.alignment == NumberListAlignment::Normalize {
            let parsed: f64 = digit_text.parse().unwrap_or(f64::NAN);
            digit_text = parsed.to_string();

            let survives_rewrite = parsed.is_finite()
                && digit_text.len() <= 16
                && !digit_text.contains('e')
                && (parsed != 0.0 || is_literal_zero(&row.text));
            if !survives_rewrite {
                self.alignment = NumberListAlignment::Left;
                return;
            }
        }

        let dot = dot_or_exp_index(&digit_text);
        let before = dot.unwrap_or(digit_text.len());
        let after = match dot {
            Some(i) => digit_text.len().saturating_sub(i + 1),
            None => 0,
        };
        self.digits_before_dot = self.digits_before_dot.max(before);
        self.digits_after_dot = self.digits_after_dot.max(after);
    }

    fn recompute(&mut self, max_depth: usize) {
        let drop_columns = max_depth == 0
            || !matches!(self.kind, ColumnKind::Array | ColumnKind::Object)
            || self.row_count < 2;
        if drop_columns {
            self.columns.clear();
        }

        for column in &mut self.columns {
            column.recompute(max_depth.saturating_sub(1));
        }

        if self.kind == ColumnKind::Number {
            self.composite_width = self.number_field_width();
        } else if !self.columns.is_empty() {
            let column_total: usize = self.columns.iter().map(|c| c.total_width).sum();
            self.composite_width = column_total
                + self
                    .seps
                    .comma
                    .saturating_mul(self.columns.len().saturating_sub(1))
                + self.seps.open[self.pad as usize]
                + self.seps.close[self.pad as usize];
            if self.contains_null && self.composite_width < self.seps.null_lit {
                self.null_shim = self.seps.null_lit - self.composite_width;
                self.composite_width = self.seps.null_lit;
            }
        } else {
            self.composite_width = self.value_width;
        }

        self.total_width = (if self.leading_comment_width > 0 {
            self.leading_comment_width + self.seps.comment
        } else {
            0
        }) + (if self.key_width > 0 {
            self.key_width + self.seps.colon
        } else {
            0
        }) + (if self.inner_comment_width > 0 {
            self.inner_comment_width + self.seps.comment
        } else {
            0
        }) + self.composite_width
            + if self.trailing_comment_width > 0 {
                self.trailing_comment_width + self.seps.comment
            } else {
                0
            };
    }

    fn schema_depth(&self) -> usize {
        match self.columns.iter().map(|c| c.schema_depth()).max() {
            Some(deepest) => 1 + deepest,
            None => 0,
        }
    }

    fn number_field_width(&self) -> usize {
        if matches!(
            self.alignment,
            NumberListAlignment::Decimal | NumberListAlignment::Normalize
        ) {
            let dot = if self.digits_after_dot > 0 { 1 } else { 0 };
            return self.digits_before_dot + dot + self.digits_after_dot;
        }
        self.value_width
    }

    /// True when number cells should be written through [`write_number`]
    /// rather than as plain left-aligned text.
    ///
    /// [`write_number`]: ColumnSchema::write_number
    pub fn is_number_column(&self) -> bool {
        self.kind == ColumnKind::Number
    }

    pub fn alignment(&self) -> NumberListAlignment {
        self.alignment
    }
}

fn dot_or_exp_index(value: &str) -> Option<usize> {
    value.find(['.', 'e', 'E'])
}

/// True for `0`, `-0.000`, `0e5`, and friends: values whose every digit is
/// zero, so parsing to `0.0` loses nothing.
fn is_literal_zero(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut saw_digit = false;
    for ch in digits.chars() {
        if ch == 'e' || ch == 'E' {
            return saw_digit;
        }
        if ch != '0' && ch != '.' {
            return false;
        }
        saw_digit = true;
    }
    saw_digit
}

fn has_duplicate_keys(members: &[Node]) -> bool {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|m| !m.kind.is_trivia())
        .any(|m| !seen.insert(m.key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::options::Options;
    use crate::writer::Separators;

    fn measured_children(input: &str) -> Vec<Node> {
        let options = Options::default();
        let roots = TreeBuilder::new(options)
            .parse_top_level(input, true)
            .unwrap();
        let mut root = roots.into_iter().next().unwrap();
        // The schema only needs widths, not the full metrics pass.
        fill_widths(&mut root);
        root.children
    }

    fn fill_widths(node: &mut Node) {
        for child in &mut node.children {
            fill_widths(child);
        }
        node.key_width = node.key.chars().count();
        node.text_width = if node.kind.is_container() {
            // Rough single-line width: brackets plus keys, colons, values,
            // and separators.
            2 + node
                .children
                .iter()
                .map(|c| c.key_width + c.text_width + 4)
                .sum::<usize>()
        } else {
            node.text.chars().count()
        };
    }

    fn default_seps() -> SepWidths {
        let options = Options::default();
        let width = |s: &str| s.chars().count();
        Separators::new(&options, &width).widths()
    }

    #[test]
    fn object_rows_share_key_union_in_first_seen_order() {
        let rows = measured_children(r#"[{"x":1,"y":2},{"y":3,"z":4}]"#);
        let schema =
            ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).unwrap();
        let keys: Vec<&str> = schema
            .columns
            .iter()
            .map(|c| c.key.as_deref().unwrap())
            .collect();
        assert_eq!(keys, vec!["\"x\"", "\"y\"", "\"z\""]);
    }

    #[test]
    fn array_rows_align_positionally() {
        let rows = measured_children("[[1,22,333],[4444,5,6]]");
        let schema =
            ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Right).unwrap();
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.columns[0].composite_width, 4);
        assert_eq!(schema.columns[1].composite_width, 2);
    }

    #[test]
    fn single_row_yields_no_schema() {
        let rows = measured_children(r#"[{"x":1}]"#);
        assert!(ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).is_none());
    }

    #[test]
    fn mixed_row_kinds_yield_no_schema() {
        let rows = measured_children(r#"[{"x":1},[2]]"#);
        assert!(ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).is_none());
    }

    #[test]
    fn leaf_rows_yield_no_schema() {
        let rows = measured_children("[1,2,3]");
        assert!(ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).is_none());
    }

    #[test]
    fn null_rows_are_tolerated_as_placeholders() {
        let rows = measured_children(r#"[{"x":1},null,{"x":2}]"#);
        let schema =
            ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).unwrap();
        assert!(schema.contains_null);
        assert_eq!(schema.columns.len(), 1);
    }

    #[test]
    fn duplicate_keys_in_a_row_disqualify_objects() {
        let rows = measured_children(r#"[{"k":1,"k":2},{"k":3}]"#);
        assert!(ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).is_none());
    }

    #[test]
    fn decimal_alignment_tracks_digits_either_side_of_the_dot() {
        let rows = measured_children(r#"[{"v":1.25},{"v":100},{"v":0.5}]"#);
        let schema =
            ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).unwrap();
        let v = &schema.columns[0];
        assert_eq!(v.digits_before_dot, 3);
        assert_eq!(v.digits_after_dot, 2);
        // "100" plus ".25" worth of alignment: 3 + 1 + 2
        assert_eq!(v.composite_width, 6);
    }

    #[test]
    fn normalize_falls_back_to_left_for_lossy_values() {
        let rows = measured_children(r#"[{"v":1e300},{"v":2}]"#);
        let schema =
            ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Normalize).unwrap();
        assert_eq!(schema.columns[0].alignment, NumberListAlignment::Left);
    }

    #[test]
    fn fit_within_prunes_nested_detail_before_giving_up() {
        let rows = measured_children(
            r#"[{"a":{"long_key_one":1,"long_key_two":2}},{"a":{"long_key_one":3,"long_key_two":4}}]"#,
        );
        let mut schema =
            ColumnSchema::for_rows(&rows, default_seps(), NumberListAlignment::Decimal).unwrap();
        let full = schema.total_width;
        assert!(schema.fit_within(full));
        assert!(schema.fit_within(full - 1));
        assert!(schema.total_width < full);
        assert!(!schema.fit_within(1));
    }

    #[test]
    fn is_literal_zero_accepts_only_zero_digits() {
        assert!(is_literal_zero("0"));
        assert!(is_literal_zero("-0.000"));
        assert!(is_literal_zero("0e5"));
        assert!(!is_literal_zero("0.001"));
        assert!(!is_literal_zero("-"));
    }
}
