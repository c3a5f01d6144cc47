use crate::error::FoldError;
use crate::model::{Node, NodeKind, Position, Token, TokenKind};
use crate::options::{CommentPolicy, Options};
use crate::scanner::Tokens;

/// Single-token cursor over any token source. The builder only ever looks
/// at the current token; there is no token buffering or rewind.
pub struct TokenCursor<I>
where
    I: Iterator<Item = Result<Token, FoldError>>,
{
    tokens: I,
    current: Option<Token>,
}

impl<I> TokenCursor<I>
where
    I: Iterator<Item = Result<Token, FoldError>>,
{
    pub fn new(tokens: I) -> Self {
        Self { tokens, current: None }
    }

    pub fn current(&self) -> Result<&Token, FoldError> {
        self.current
            .as_ref()
            .ok_or_else(|| FoldError::structural("Token cursor read before first advance", None))
    }

    pub fn advance(&mut self) -> Result<bool, FoldError> {
        match self.tokens.next() {
            None => {
                self.current = None;
                Ok(false)
            }
            Some(Ok(token)) => {
                self.current = Some(token);
                Ok(true)
            }
            Some(Err(err)) => Err(err),
        }
    }
}

/// Builds a [`Node`] tree from the token stream, attaching comments and
/// blank lines to the nearest value by source position.
pub struct TreeBuilder {
    options: Options,
}

impl TreeBuilder {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Parses a whole document. With `stop_after_first` set, anything but
    /// trivia after the root value is a structural error.
    pub fn parse_top_level(
        &self,
        input: &str,
        stop_after_first: bool,
    ) -> Result<Vec<Node>, FoldError> {
        let mut cursor = TokenCursor::new(Tokens::new(input));
        self.parse_top_level_from_cursor(&mut cursor, stop_after_first)
    }

    fn parse_top_level_from_cursor<I>(
        &self,
        cursor: &mut TokenCursor<I>,
        stop_after_first: bool,
    ) -> Result<Vec<Node>, FoldError>
    where
        I: Iterator<Item = Result<Token, FoldError>>,
    {
        let mut roots: Vec<Node> = Vec::new();
        let mut value_seen = false;

        loop {
            if !cursor.advance()? {
                return Ok(roots);
            }

            let node = self.parse_value(cursor)?;
            match node.kind {
                NodeKind::BlankLine => {
                    if self.options.preserve_blank_lines {
                        roots.push(node);
                    }
                }
                NodeKind::LineComment | NodeKind::BlockComment => {
                    if self.keep_comment_at(node.position)? {
                        roots.push(node);
                    }
                }
                _ => {
                    if stop_after_first && value_seen {
                        return Err(FoldError::structural(
                            "Unexpected content after the root value",
                            Some(node.position),
                        ));
                    }
                    roots.push(node);
                    value_seen = true;
                }
            }
        }
    }

    fn parse_value<I>(&self, cursor: &mut TokenCursor<I>) -> Result<Node, FoldError>
    where
        I: Iterator<Item = Result<Token, FoldError>>,
    {
        let current = cursor.current()?.clone();
        match current.kind {
            TokenKind::BeginArray => self.parse_array(cursor),
            TokenKind::BeginObject => self.parse_object(cursor),
            _ => leaf_from_token(&current),
        }
    }

    fn parse_array<I>(&self, cursor: &mut TokenCursor<I>) -> Result<Node, FoldError>
    where
        I: Iterator<Item = Result<Token, FoldError>>,
    {
        let open_position = cursor.current()?.position;

        let mut children: Vec<Node> = Vec::new();
        let mut complexity = 0usize;
        let mut separator = SeparatorState::Empty;

        // A comment we have seen but not yet tied to an element, and the
        // element still waiting for a possible trailing comment.
        let mut unplaced_comment: Option<Node> = None;
        let mut trailing_target: Option<usize> = None;
        let mut trailing_target_row: Option<usize> = None;

        loop {
            let token = next_token_or_fail(cursor, open_position)?;

            let unplaced_needs_home = unplaced_comment
                .as_ref()
                .map(|c| c.position.row != token.position.row || token.kind == TokenKind::EndArray)
                .unwrap_or(false);
            if unplaced_needs_home {
                let comment = unplaced_comment.take().unwrap_or_default();
                match trailing_target {
                    Some(idx) => {
                        if let Some(elem) = children.get_mut(idx) {
                            elem.trailing_comment = comment.text;
                            elem.trailing_comment_is_line_style = comment.kind == NodeKind::LineComment;
                        }
                    }
                    None => children.push(comment),
                }
            }

            if trailing_target.is_some() && trailing_target_row != Some(token.position.row) {
                trailing_target = None;
            }

            match token.kind {
                TokenKind::EndArray => {
                    if separator == SeparatorState::CommaSeen && !self.options.allow_trailing_commas {
                        return Err(FoldError::structural(
                            "Array may not end with a comma with current options",
                            Some(token.position),
                        ));
                    }
                    break;
                }
                TokenKind::Comma => {
                    if separator != SeparatorState::ValueSeen {
                        return Err(FoldError::structural(
                            "Unexpected comma in array",
                            Some(token.position),
                        ));
                    }
                    separator = SeparatorState::CommaSeen;
                }
                TokenKind::BlankLine => {
                    if self.options.preserve_blank_lines {
                        children.push(leaf_from_token(&token)?);
                    }
                }
                TokenKind::BlockComment => {
                    if !self.keep_comment_at(token.position)? {
                        continue;
                    }
                    if let Some(pending) = unplaced_comment.take() {
                        children.push(pending);
                    }

                    let comment = leaf_from_token(&token)?;
                    if comment.text.contains('\n') {
                        // Multiline block comments always stand alone.
                        children.push(comment);
                        continue;
                    }

                    if let Some(idx) = trailing_target {
                        if separator == SeparatorState::ValueSeen {
                            if let Some(elem) = children.get_mut(idx) {
                                elem.trailing_comment = comment.text;
                                elem.trailing_comment_is_line_style = false;
                            }
                            trailing_target = None;
                            continue;
                        }
                    }

                    unplaced_comment = Some(comment);
                }
                TokenKind::LineComment => {
                    if !self.keep_comment_at(token.position)? {
                        continue;
                    }
                    if let Some(pending) = unplaced_comment.take() {
                        children.push(pending);
                        children.push(leaf_from_token(&token)?);
                        continue;
                    }

                    if let Some(idx) = trailing_target {
                        if let Some(elem) = children.get_mut(idx) {
                            elem.trailing_comment = token.text.clone();
                            elem.trailing_comment_is_line_style = true;
                        }
                        trailing_target = None;
                        continue;
                    }

                    children.push(leaf_from_token(&token)?);
                }
                TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::BeginArray
                | TokenKind::BeginObject => {
                    if separator == SeparatorState::ValueSeen {
                        return Err(FoldError::structural(
                            "Comma missing while processing array",
                            Some(token.position),
                        ));
                    }

                    let mut element = self.parse_value(cursor)?;
                    separator = SeparatorState::ValueSeen;
                    complexity = complexity.max(element.complexity + 1);

                    if let Some(pending) = unplaced_comment.take() {
                        element.leading_comment = pending.text;
                    }

                    children.push(element);
                    trailing_target = Some(children.len() - 1);
                    trailing_target_row = Some(cursor.current()?.position.row);
                }
                _ => {
                    return Err(FoldError::structural(
                        "Unexpected token in array",
                        Some(token.position),
                    ));
                }
            }
        }

        let mut array = Node::default();
        array.kind = NodeKind::Array;
        array.position = open_position;
        array.complexity = complexity;
        array.children = children;
        Ok(array)
    }

    fn parse_object<I>(&self, cursor: &mut TokenCursor<I>) -> Result<Node, FoldError>
    where
        I: Iterator<Item = Result<Token, FoldError>>,
    {
        let open_position = cursor.current()?.position;

        let mut children: Vec<Node> = Vec::new();
        let mut complexity = 0usize;
        let mut phase = MemberPhase::BeforeKey;

        // Pieces of the member currently being assembled.
        let mut member_key: Option<Token> = None;
        let mut member_value: Option<Node> = None;
        let mut value_end_row: Option<usize> = None;
        let mut before_comments: Vec<Node> = Vec::new();
        let mut inner_comments: Vec<Token> = Vec::new();
        let mut after_comment: Option<Node> = None;
        let mut after_comment_followed_comma = false;

        loop {
            let token = next_token_or_fail(cursor, open_position)?;

            let on_new_line = value_end_row != Some(token.position.row);
            let at_object_end = token.kind == TokenKind::EndObject;
            let starting_next_key = token.kind == TokenKind::String && phase == MemberPhase::AfterComma;
            let surplus_after_comment = after_comment.is_some()
                && matches!(token.kind, TokenKind::BlockComment | TokenKind::LineComment);

            let flush_member = member_key.is_some()
                && member_value.is_some()
                && (on_new_line || at_object_end || starting_next_key || surplus_after_comment);

            if flush_member {
                // A comment between the comma and the next key, all on one
                // line, belongs to the next member rather than this one.
                let mut held_for_next: Option<Node> = None;
                if starting_next_key && after_comment_followed_comma && !on_new_line {
                    held_for_next = after_comment.take();
                }

                let value = member_value.take().unwrap_or_default();
                complexity = complexity.max(value.complexity + 1);
                attach_member(
                    &mut children,
                    member_key.take().unwrap_or_else(|| Token {
                        kind: TokenKind::String,
                        text: String::new(),
                        position: Position::default(),
                    }),
                    value,
                    value_end_row,
                    &mut before_comments,
                    &mut inner_comments,
                    after_comment.take(),
                );

                if let Some(comment) = held_for_next {
                    before_comments.push(comment);
                }
            }

            match token.kind {
                TokenKind::BlankLine => {
                    if !self.options.preserve_blank_lines {
                        continue;
                    }
                    if matches!(phase, MemberPhase::AfterKey | MemberPhase::AfterColon) {
                        continue;
                    }
                    children.append(&mut before_comments);
                    children.push(leaf_from_token(&token)?);
                }
                TokenKind::BlockComment | TokenKind::LineComment => {
                    if !self.keep_comment_at(token.position)? {
                        continue;
                    }
                    if phase == MemberPhase::BeforeKey || member_key.is_none() {
                        before_comments.push(leaf_from_token(&token)?);
                    } else if matches!(phase, MemberPhase::AfterKey | MemberPhase::AfterColon) {
                        inner_comments.push(token);
                    } else {
                        after_comment = Some(leaf_from_token(&token)?);
                        after_comment_followed_comma = phase == MemberPhase::AfterComma;
                    }
                }
                TokenKind::EndObject => {
                    if matches!(phase, MemberPhase::AfterKey | MemberPhase::AfterColon) {
                        return Err(FoldError::structural(
                            "Unexpected end of object",
                            Some(token.position),
                        ));
                    }
                    if phase == MemberPhase::AfterComma && !self.options.allow_trailing_commas {
                        return Err(FoldError::structural(
                            "Object may not end with a comma with current options",
                            Some(token.position),
                        ));
                    }
                    break;
                }
                TokenKind::String => match phase {
                    MemberPhase::BeforeKey | MemberPhase::AfterComma => {
                        member_key = Some(token);
                        phase = MemberPhase::AfterKey;
                    }
                    MemberPhase::AfterColon => {
                        member_value = Some(self.parse_value(cursor)?);
                        value_end_row = Some(cursor.current()?.position.row);
                        phase = MemberPhase::AfterValue;
                    }
                    _ => {
                        return Err(FoldError::structural(
                            "Unexpected string found while processing object",
                            Some(token.position),
                        ));
                    }
                },
                TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Number
                | TokenKind::BeginArray
                | TokenKind::BeginObject => {
                    if phase != MemberPhase::AfterColon {
                        return Err(FoldError::structural(
                            "Unexpected element while processing object",
                            Some(token.position),
                        ));
                    }
                    member_value = Some(self.parse_value(cursor)?);
                    value_end_row = Some(cursor.current()?.position.row);
                    phase = MemberPhase::AfterValue;
                }
                TokenKind::Colon => {
                    if phase != MemberPhase::AfterKey {
                        return Err(FoldError::structural(
                            "Unexpected colon while processing object",
                            Some(token.position),
                        ));
                    }
                    phase = MemberPhase::AfterColon;
                }
                TokenKind::Comma => {
                    if phase != MemberPhase::AfterValue {
                        return Err(FoldError::structural(
                            "Unexpected comma while processing object",
                            Some(token.position),
                        ));
                    }
                    phase = MemberPhase::AfterComma;
                }
                _ => {
                    return Err(FoldError::structural(
                        "Unexpected token while processing object",
                        Some(token.position),
                    ));
                }
            }
        }

        let mut object = Node::default();
        object.kind = NodeKind::Object;
        object.position = open_position;
        object.complexity = complexity;
        object.children = children;
        Ok(object)
    }

    /// Applies the comment policy: `Ok(true)` keep, `Ok(false)` drop.
    fn keep_comment_at(&self, position: Position) -> Result<bool, FoldError> {
        match self.options.comment_policy {
            CommentPolicy::TreatAsError => Err(FoldError::structural(
                "Comments not allowed with current options",
                Some(position),
            )),
            CommentPolicy::Remove => Ok(false),
            CommentPolicy::Preserve => Ok(true),
        }
    }
}

fn next_token_or_fail<I>(
    cursor: &mut TokenCursor<I>,
    container_start: Position,
) -> Result<Token, FoldError>
where
    I: Iterator<Item = Result<Token, FoldError>>,
{
    if !cursor.advance()? {
        return Err(FoldError::structural(
            "Unexpected end of input inside the container starting",
            Some(container_start),
        ));
    }
    Ok(cursor.current()?.clone())
}

fn leaf_from_token(token: &Token) -> Result<Node, FoldError> {
    let kind = match token.kind {
        TokenKind::Null => NodeKind::Null,
        TokenKind::True => NodeKind::True,
        TokenKind::False => NodeKind::False,
        TokenKind::String => NodeKind::String,
        TokenKind::Number => NodeKind::Number,
        TokenKind::BlankLine => NodeKind::BlankLine,
        TokenKind::LineComment => NodeKind::LineComment,
        TokenKind::BlockComment => NodeKind::BlockComment,
        _ => {
            return Err(FoldError::structural(
                "Unexpected token",
                Some(token.position),
            ));
        }
    };

    let mut node = Node::default();
    node.kind = kind;
    node.position = token.position;
    node.text = if kind == NodeKind::BlockComment {
        normalize_block_comment(&token.text, token.position.column)
    } else {
        token.text.clone()
    };
    Ok(node)
}

/// Strips the original indentation from the continuation lines of a
/// multiline block comment, so the renderer can re-indent it wherever the
/// comment lands. Relative indentation beyond the comment's own column is
/// kept.
fn normalize_block_comment(text: &str, column: usize) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }

    let mut lines = text.split('\n');
    let mut out = String::from(lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        let mut rest = line;
        let mut removed = 0;
        while removed < column {
            match rest.as_bytes().first() {
                Some(b' ') | Some(b'\t') => {
                    rest = &rest[1..];
                    removed += 1;
                }
                _ => break,
            }
        }
        out.push_str(rest);
    }
    out
}

/// Joins the comments found between a key and its value into one string,
/// then attaches everything collected for a member to the value node and
/// appends it (plus any standalone comments) to the child list.
fn attach_member(
    children: &mut Vec<Node>,
    key: Token,
    mut value: Node,
    value_end_row: Option<usize>,
    before_comments: &mut Vec<Node>,
    inner_comments: &mut Vec<Token>,
    after_comment: Option<Node>,
) {
    value.key = key.text;

    if !inner_comments.is_empty() {
        let mut combined = String::new();
        for (i, comment) in inner_comments.iter().enumerate() {
            combined.push_str(&comment.text);
            if i < inner_comments.len() - 1 || comment.kind == TokenKind::LineComment {
                combined.push('\n');
            }
        }
        value.inner_comment_spans_lines = combined.contains('\n');
        value.inner_comment = combined;
        inner_comments.clear();
    }

    if let Some(last) = before_comments.pop() {
        let attaches = last.kind == NodeKind::BlockComment && last.position.row == value.position.row;
        if attaches {
            value.leading_comment = last.text;
            children.append(before_comments);
        } else {
            children.append(before_comments);
            children.push(last);
        }
    }

    if let Some(after) = after_comment {
        let is_multiline = after.kind == NodeKind::BlockComment && after.text.contains('\n');
        if !is_multiline && Some(after.position.row) == value_end_row {
            value.trailing_comment = after.text;
            value.trailing_comment_is_line_style = after.kind == NodeKind::LineComment;
            children.push(value);
        } else {
            children.push(value);
            children.push(after);
        }
    } else {
        children.push(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeparatorState {
    Empty,
    ValueSeen,
    CommaSeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberPhase {
    BeforeKey,
    AfterKey,
    AfterColon,
    AfterValue,
    AfterComma,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn builder_with(adjust: impl FnOnce(&mut Options)) -> TreeBuilder {
        let mut options = Options::default();
        adjust(&mut options);
        TreeBuilder::new(options)
    }

    fn parse_one(input: &str) -> Node {
        let roots = builder_with(|_| {}).parse_top_level(input, true).unwrap();
        assert_eq!(roots.len(), 1);
        roots.into_iter().next().unwrap()
    }

    #[test]
    fn parses_nested_values_with_complexity() {
        let root = parse_one(r#"{"a": {"b": [1, 2]}, "c": 3}"#);
        assert_eq!(root.kind, NodeKind::Object);
        assert_eq!(root.complexity, 3);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].key, "\"a\"");
        assert_eq!(root.children[0].complexity, 2);
        assert_eq!(root.children[1].text, "3");
    }

    #[test]
    fn preserves_duplicate_keys_in_order() {
        let root = parse_one(r#"{"k": 1, "k": 2}"#);
        let keys: Vec<&str> = root.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["\"k\"", "\"k\""]);
        assert_eq!(root.children[1].text, "2");
    }

    #[test]
    fn empty_containers_have_zero_complexity() {
        assert_eq!(parse_one("{}").complexity, 0);
        assert_eq!(parse_one("[]").complexity, 0);
    }

    #[test]
    fn missing_colon_is_structural() {
        let err = builder_with(|_| {})
            .parse_top_level(r#"{"a" 1}"#, true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
    }

    #[test]
    fn missing_comma_is_structural() {
        let err = builder_with(|_| {})
            .parse_top_level("[1 2]", true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
    }

    #[test]
    fn unclosed_bracket_reports_container_start() {
        let err = builder_with(|_| {})
            .parse_top_level("[1, 2", true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.position.unwrap().index, 0);
    }

    #[test]
    fn content_after_root_is_structural() {
        let err = builder_with(|_| {})
            .parse_top_level("1 2", true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.position.unwrap().index, 2);
    }

    #[test]
    fn trailing_comma_rejected_by_default() {
        for input in ["[1, 2,]", r#"{"a": 1,}"#] {
            let err = builder_with(|_| {}).parse_top_level(input, true).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Structural, "for {}", input);
        }
    }

    #[test]
    fn trailing_comma_accepted_when_enabled() {
        let builder = builder_with(|o| o.allow_trailing_commas = true);
        assert!(builder.parse_top_level("[1, 2,]", true).is_ok());
        assert!(builder.parse_top_level(r#"{"a": 1,}"#, true).is_ok());
    }

    #[test]
    fn comments_error_by_default() {
        let err = builder_with(|_| {})
            .parse_top_level("[1] // done", true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
    }

    #[test]
    fn comments_removed_under_remove_policy() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Remove);
        let roots = builder
            .parse_top_level("[1, /* mid */ 2] // done", true)
            .unwrap();
        let root = &roots[0];
        assert_eq!(root.children.len(), 2);
        assert!(root.children[1].leading_comment.is_empty());
    }

    #[test]
    fn leading_comment_attaches_to_next_value() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Preserve);
        let roots = builder.parse_top_level("[/* a */ 1]", true).unwrap();
        assert_eq!(roots[0].children[0].leading_comment, "/* a */");
    }

    #[test]
    fn trailing_line_comment_attaches_to_value() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Preserve);
        let roots = builder.parse_top_level("[\n1, // one\n2\n]", true).unwrap();
        let first = &roots[0].children[0];
        assert_eq!(first.trailing_comment, "// one");
        assert!(first.trailing_comment_is_line_style);
    }

    #[test]
    fn inner_comment_sits_between_key_and_value() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Preserve);
        let roots = builder
            .parse_top_level(r#"{"a": /* why */ 1}"#, true)
            .unwrap();
        assert_eq!(roots[0].children[0].inner_comment, "/* why */");
    }

    #[test]
    fn object_member_trailing_comment_after_comma() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Preserve);
        let roots = builder
            .parse_top_level("{\n\"a\": 1, // first\n\"b\": 2\n}", true)
            .unwrap();
        let first = &roots[0].children[0];
        assert_eq!(first.trailing_comment, "// first");
        assert_eq!(roots[0].children[1].trailing_comment, "");
    }

    #[test]
    fn standalone_comment_line_becomes_child() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Preserve);
        let roots = builder
            .parse_top_level("{\n// section\n\"a\": 1\n}", true)
            .unwrap();
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].kind, NodeKind::LineComment);
        assert_eq!(roots[0].children[0].text, "// section");
    }

    #[test]
    fn blank_lines_kept_only_when_enabled() {
        let input = "{\n\"a\": 1,\n\n\"b\": 2\n}";

        let kept = builder_with(|o| o.preserve_blank_lines = true)
            .parse_top_level(input, true)
            .unwrap();
        assert_eq!(kept[0].children.len(), 3);
        assert_eq!(kept[0].children[1].kind, NodeKind::BlankLine);

        let dropped = builder_with(|_| {}).parse_top_level(input, true).unwrap();
        assert_eq!(dropped[0].children.len(), 2);
    }

    #[test]
    fn multiline_block_comment_indentation_is_normalized() {
        let builder = builder_with(|o| o.comment_policy = CommentPolicy::Preserve);
        let roots = builder
            .parse_top_level("[\n    /* one\n       two */\n    1\n]", true)
            .unwrap();
        let comment = &roots[0].children[0];
        assert_eq!(comment.kind, NodeKind::BlockComment);
        assert_eq!(comment.text, "/* one\n   two */");
    }
}
