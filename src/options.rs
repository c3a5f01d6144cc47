/// Line ending style for the formatted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolStyle {
    /// Windows-style line endings (`\r\n`).
    Crlf,
    /// Unix-style line endings (`\n`).
    Lf,
}

/// Policy for handling comments in JSON input.
///
/// Standard JSON does not support comments, but many JSON-like formats
/// (such as JSONC used by VS Code) do allow them. This enum controls how
/// comments found in the input are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPolicy {
    /// Return an error if comments are encountered in the input.
    /// This is the default, enforcing strict JSON compliance.
    TreatAsError,
    /// Silently remove any comments from the output.
    Remove,
    /// Keep comments in the output, preserving their relative positions.
    Preserve,
}

/// Alignment style for number columns.
///
/// When numbers end up stacked in a column - in a table, or in a compact
/// multi-line array - this setting controls how they line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberListAlignment {
    /// Left-align numbers; no justification.
    Left,
    /// Right-align numbers to the widest value in the column.
    Right,
    /// Align numbers on the decimal point (integers get an implied one).
    /// Usually the most readable choice for mixed integer/decimal data.
    Decimal,
    /// Rewrite numbers to a shared precision and align on the decimal
    /// point. Falls back to [`NumberListAlignment::Left`] for values that
    /// do not survive the rewrite losslessly.
    Normalize,
}

/// Controls where commas sit relative to column padding in table output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCommaPlacement {
    /// Commas immediately after values, before any padding.
    /// Example: `"name",    "value"`
    BeforePadding,
    /// Commas after the padding, at the end of the padded column.
    /// Example: `"name"    ,"value"`
    AfterPadding,
    /// Commas before padding for most values, but after padding for
    /// number columns, which are usually right-justified anyway.
    BeforePaddingExceptNumbers,
}

/// Configuration for one formatting call.
///
/// An `Options` value is consumed as a whole, immutably, by each call on
/// [`crate::Formatter`]; build one, adjust the fields you care about, and
/// hand it to [`crate::Formatter::with_options`].
///
/// # Example
///
/// ```rust
/// use jsonfold::{CommentPolicy, Options};
///
/// let mut options = Options::default();
/// options.max_total_line_length = 80;
/// options.indent_spaces = 2;
/// options.comment_policy = CommentPolicy::Preserve;
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Line ending style for the output. Default: [`EolStyle::Lf`].
    pub eol_style: EolStyle,

    /// Maximum length of a line before it is broken into multiple lines.
    /// Default: 120.
    pub max_total_line_length: usize,

    /// Maximum length for any single value rendered inline, regardless of
    /// how much room the line has. Default: effectively unlimited.
    pub max_inline_length: usize,

    /// Maximum nesting depth for arrays/objects to be written on a single
    /// line. 0 permits only primitive values; 1 allows containers of
    /// primitives; -1 disables inline formatting entirely.
    /// Default: 2.
    pub max_inline_complexity: isize,

    /// Maximum nesting depth for arrays to use compact multi-line
    /// formatting (several items per line). Set to -1 to disable.
    /// Default: 2.
    pub max_compact_array_complexity: isize,

    /// Maximum nesting depth for a row of a table. Set to -1 to disable
    /// table formatting. Default: 2.
    pub max_table_row_complexity: isize,

    /// Minimum number of items per line for an array to be worth packing
    /// in compact multi-line form. Default: 3.
    pub min_compact_array_row_items: usize,

    /// Depth at which containers are always expanded, no matter how small.
    /// Containers at this depth or shallower are always written one child
    /// per line; -1 disables. Default: -1.
    pub always_expand_depth: isize,

    /// Maximum number of spaces of key padding in a table. If aligning the
    /// keys of a container would need more padding than this, key
    /// alignment is skipped for that container. Default: 16.
    pub max_key_padding: usize,

    /// If true, the colon comes before the key padding.
    /// Example with true: `"a":   1`; with false: `"a"  : 1`.
    /// Default: false.
    pub colon_before_key_padding: bool,

    /// Where commas sit relative to column padding in tables.
    /// Default: [`TableCommaPlacement::BeforePaddingExceptNumbers`].
    pub table_comma_placement: TableCommaPlacement,

    /// Spaces inside brackets of containers that hold other containers:
    /// `[ [1, 2] ]` vs `[[1, 2]]`. Default: true.
    pub nested_bracket_padding: bool,

    /// Spaces inside brackets of containers that hold only primitives:
    /// `[ 1, 2 ]` vs `[1, 2]`. Default: false.
    pub simple_bracket_padding: bool,

    /// A space after colons: `"key": value` vs `"key":value`.
    /// Default: true.
    pub colon_padding: bool,

    /// A space after commas: `[1, 2]` vs `[1,2]`. Default: true.
    pub comma_padding: bool,

    /// A space between values and comments: `value /*c*/` vs `value/*c*/`.
    /// Default: true.
    pub comment_padding: bool,

    /// Alignment style for number columns.
    /// Default: [`NumberListAlignment::Decimal`].
    pub number_list_alignment: NumberListAlignment,

    /// Spaces per indentation level. Ignored if `use_tab_to_indent` is
    /// set. Default: 4.
    pub indent_spaces: usize,

    /// Use one tab per indentation level instead of spaces.
    /// Default: false.
    pub use_tab_to_indent: bool,

    /// A string prepended to every output line. Useful for embedding
    /// formatted JSON inside other content. Default: empty.
    pub prefix_string: String,

    /// How to handle comments in the input.
    /// Default: [`CommentPolicy::TreatAsError`].
    pub comment_policy: CommentPolicy,

    /// Reproduce blank lines from the input in the output.
    /// Default: false.
    pub preserve_blank_lines: bool,

    /// Accept trailing commas in the input (non-standard JSON).
    /// Default: false.
    pub allow_trailing_commas: bool,

    /// Trim trailing whitespace from emitted lines. Default: true.
    pub omit_trailing_whitespace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            eol_style: EolStyle::Lf,
            max_total_line_length: 120,
            max_inline_length: 2_000_000_000,
            max_inline_complexity: 2,
            max_compact_array_complexity: 2,
            max_table_row_complexity: 2,
            min_compact_array_row_items: 3,
            always_expand_depth: -1,
            max_key_padding: 16,
            colon_before_key_padding: false,
            table_comma_placement: TableCommaPlacement::BeforePaddingExceptNumbers,
            nested_bracket_padding: true,
            simple_bracket_padding: false,
            colon_padding: true,
            comma_padding: true,
            comment_padding: true,
            number_list_alignment: NumberListAlignment::Decimal,
            indent_spaces: 4,
            use_tab_to_indent: false,
            prefix_string: String::new(),
            comment_policy: CommentPolicy::TreatAsError,
            preserve_blank_lines: false,
            allow_trailing_commas: false,
            omit_trailing_whitespace: true,
        }
    }
}

impl Options {
    /// Creates an `Options` with the recommended settings.
    ///
    /// Currently identical to [`Default::default()`], but may pick up
    /// improved defaults in future versions without breaking
    /// compatibility.
    pub fn recommended() -> Self {
        Self::default()
    }
}
