use crate::error::FoldError;
use crate::model::{Position, Token, TokenKind};

/// Documents with more characters than this are rejected with an overflow
/// error rather than risking position counters wrapping.
const MAX_DOC_LEN: usize = 2_000_000_000;

/// A demand-driven lexical scanner over the input text.
///
/// The scanner walks the input strictly forward. It never backtracks: the
/// only lookahead is the single unconsumed character exposed by `peek`,
/// which lets a token (a number, say) end cleanly when a character that
/// belongs to the next token shows up.
pub struct Scanner {
    text: String,
    chars: Vec<char>,
    byte_offsets: Vec<usize>,
    pos: Position,
    token_start: Position,
    line_has_content: bool,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        let mut chars: Vec<char> = Vec::new();
        let mut byte_offsets: Vec<usize> = Vec::new();
        for (offset, ch) in text.char_indices() {
            byte_offsets.push(offset);
            chars.push(ch);
        }
        byte_offsets.push(text.len());

        Self {
            text: text.to_string(),
            chars,
            byte_offsets,
            pos: Position::default(),
            token_start: Position::default(),
            line_has_content: false,
        }
    }

    /// Scans the next token, or `Ok(None)` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, FoldError> {
        loop {
            let ch = match self.peek() {
                None => return Ok(None),
                Some(c) => c,
            };

            match ch {
                ' ' | '\t' | '\r' => self.advance(true)?,
                '\n' => {
                    let line_was_blank = !self.line_has_content;
                    if line_was_blank {
                        let token = self.token_with_text(TokenKind::BlankLine, "\n");
                        self.advance_line()?;
                        self.begin_token();
                        return Ok(Some(token));
                    }
                    self.advance_line()?;
                    self.begin_token();
                }
                '{' => return self.scan_punct(TokenKind::BeginObject, "{").map(Some),
                '}' => return self.scan_punct(TokenKind::EndObject, "}").map(Some),
                '[' => return self.scan_punct(TokenKind::BeginArray, "[").map(Some),
                ']' => return self.scan_punct(TokenKind::EndArray, "]").map(Some),
                ':' => return self.scan_punct(TokenKind::Colon, ":").map(Some),
                ',' => return self.scan_punct(TokenKind::Comma, ",").map(Some),
                't' => return self.scan_keyword("true", TokenKind::True).map(Some),
                'f' => return self.scan_keyword("false", TokenKind::False).map(Some),
                'n' => return self.scan_keyword("null", TokenKind::Null).map(Some),
                '/' => return self.scan_comment().map(Some),
                '"' => return self.scan_string().map(Some),
                '-' | '0'..='9' => return self.scan_number().map(Some),
                _ => return Err(self.lex_error("Unexpected character")),
            }
        }
    }

    /// The single unconsumed lookahead character.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos.index).copied()
    }

    fn at_end(&self) -> bool {
        self.pos.index >= self.chars.len()
    }

    fn advance(&mut self, is_whitespace: bool) -> Result<(), FoldError> {
        if self.pos.index >= MAX_DOC_LEN {
            return Err(FoldError::overflow("Maximum document length exceeded", self.pos));
        }
        self.pos.index += 1;
        self.pos.column += 1;
        if !is_whitespace {
            self.line_has_content = true;
        }
        Ok(())
    }

    fn advance_line(&mut self) -> Result<(), FoldError> {
        if self.pos.index >= MAX_DOC_LEN {
            return Err(FoldError::overflow("Maximum document length exceeded", self.pos));
        }
        self.pos.index += 1;
        self.pos.row += 1;
        self.pos.column = 0;
        self.line_has_content = false;
        Ok(())
    }

    fn begin_token(&mut self) {
        self.token_start = self.pos;
    }

    /// A token whose text is the consumed span, optionally with trailing
    /// whitespace dropped (line comments).
    fn token_from_span(&self, kind: TokenKind, trim_end: bool) -> Token {
        let start = self.byte_offsets[self.token_start.index];
        let end = self.byte_offsets[self.pos.index];
        let mut text = self.text[start..end].to_string();
        if trim_end {
            text.truncate(text.trim_end().len());
        }
        Token {
            kind,
            text,
            position: self.token_start,
        }
    }

    fn token_with_text(&self, kind: TokenKind, text: &str) -> Token {
        Token {
            kind,
            text: text.to_string(),
            position: self.token_start,
        }
    }

    fn lex_error(&self, message: &str) -> FoldError {
        FoldError::lex(message, self.pos)
    }

    fn scan_punct(&mut self, kind: TokenKind, text: &str) -> Result<Token, FoldError> {
        self.begin_token();
        let token = self.token_with_text(kind, text);
        self.advance(false)?;
        Ok(token)
    }

    fn scan_keyword(&mut self, keyword: &'static str, kind: TokenKind) -> Result<Token, FoldError> {
        self.begin_token();
        for expected in keyword.chars() {
            match self.peek() {
                None => return Err(self.lex_error("Unexpected end of input while reading keyword")),
                Some(ch) if ch == expected => self.advance(false)?,
                Some(_) => return Err(self.lex_error("Unrecognized keyword")),
            }
        }
        Ok(self.token_with_text(kind, keyword))
    }

    fn scan_comment(&mut self) -> Result<Token, FoldError> {
        self.begin_token();
        self.advance(false)?;

        let is_block = match self.peek() {
            Some('*') => true,
            Some('/') => false,
            _ => return Err(self.lex_error("Expected '/' or '*' to start a comment")),
        };
        self.advance(false)?;

        let mut prev_was_star = false;
        loop {
            match self.peek() {
                None => {
                    if is_block {
                        return Err(self.lex_error("Unexpected end of input inside block comment"));
                    }
                    // A line comment running to end of input is fine.
                    return Ok(self.token_from_span(TokenKind::LineComment, true));
                }
                Some('\n') => {
                    if !is_block {
                        // The newline stays unconsumed for the main loop.
                        return Ok(self.token_from_span(TokenKind::LineComment, true));
                    }
                    self.advance_line()?;
                    prev_was_star = false;
                }
                Some(ch) => {
                    self.advance(false)?;
                    if ch == '/' && prev_was_star {
                        return Ok(self.token_from_span(TokenKind::BlockComment, false));
                    }
                    prev_was_star = ch == '*';
                }
            }
        }
    }

    fn scan_string(&mut self) -> Result<Token, FoldError> {
        self.begin_token();
        self.advance(false)?;

        let mut in_escape = false;
        let mut pending_hex = 0usize;
        loop {
            let ch = match self.peek() {
                None => return Err(self.lex_error("Unexpected end of input inside string")),
                Some(c) => c,
            };

            if pending_hex > 0 {
                if !ch.is_ascii_hexdigit() {
                    return Err(self.lex_error("Bad unicode escape in string"));
                }
                pending_hex -= 1;
                self.advance(false)?;
                continue;
            }

            if in_escape {
                if !is_escapable(ch) {
                    return Err(self.lex_error("Bad escaped character in string"));
                }
                if ch == 'u' {
                    pending_hex = 4;
                }
                in_escape = false;
                self.advance(false)?;
                continue;
            }

            if is_control(ch) {
                return Err(self.lex_error("Control characters are not allowed in strings"));
            }

            self.advance(false)?;
            match ch {
                '"' => return Ok(self.token_from_span(TokenKind::String, false)),
                '\\' => in_escape = true,
                _ => {}
            }
        }
    }

    fn scan_number(&mut self) -> Result<Token, FoldError> {
        self.begin_token();
        let mut phase = NumberPhase::Start;
        loop {
            let ch = match self.peek() {
                None => {
                    if phase.is_accepting() {
                        return Ok(self.token_from_span(TokenKind::Number, false));
                    }
                    return Err(self.lex_error("Unexpected end of input inside number"));
                }
                Some(c) => c,
            };

            let next_phase = match phase {
                NumberPhase::Start => match ch {
                    '-' => Some(NumberPhase::AfterSign),
                    '0' => Some(NumberPhase::WholeZero),
                    '1'..='9' => Some(NumberPhase::WholeDigits),
                    _ => None,
                },
                NumberPhase::AfterSign => match ch {
                    '0' => Some(NumberPhase::WholeZero),
                    '1'..='9' => Some(NumberPhase::WholeDigits),
                    _ => None,
                },
                NumberPhase::WholeZero => match ch {
                    '.' => Some(NumberPhase::AfterDot),
                    'e' | 'E' => Some(NumberPhase::AfterExpMarker),
                    _ => None,
                },
                NumberPhase::WholeDigits => match ch {
                    '0'..='9' => Some(NumberPhase::WholeDigits),
                    '.' => Some(NumberPhase::AfterDot),
                    'e' | 'E' => Some(NumberPhase::AfterExpMarker),
                    _ => None,
                },
                NumberPhase::AfterDot => match ch {
                    '0'..='9' => Some(NumberPhase::FracDigits),
                    _ => None,
                },
                NumberPhase::FracDigits => match ch {
                    '0'..='9' => Some(NumberPhase::FracDigits),
                    'e' | 'E' => Some(NumberPhase::AfterExpMarker),
                    _ => None,
                },
                NumberPhase::AfterExpMarker => match ch {
                    '+' | '-' => Some(NumberPhase::AfterExpSign),
                    '0'..='9' => Some(NumberPhase::ExpDigits),
                    _ => None,
                },
                NumberPhase::AfterExpSign | NumberPhase::ExpDigits => match ch {
                    '0'..='9' => Some(NumberPhase::ExpDigits),
                    _ => None,
                },
            };

            match next_phase {
                Some(p) => {
                    self.advance(false)?;
                    phase = p;
                }
                None if phase.is_accepting() => {
                    // The character belongs to the next token; leave it
                    // unconsumed for the next scan step.
                    return Ok(self.token_from_span(TokenKind::Number, false));
                }
                None => return Err(self.lex_error("Bad character in number")),
            }
        }
    }
}

/// Iterator adapter producing tokens on demand.
pub struct Tokens {
    scanner: Scanner,
}

impl Tokens {
    pub fn new(text: &str) -> Self {
        Self {
            scanner: Scanner::new(text),
        }
    }
}

impl Iterator for Tokens {
    type Item = Result<Token, FoldError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.scanner.at_end() {
            return None;
        }
        self.scanner.next_token().transpose()
    }
}

/// States of the number automaton. The accepting states are exactly the
/// ones where strict JSON allows a number to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberPhase {
    Start,
    AfterSign,
    WholeZero,
    WholeDigits,
    AfterDot,
    FracDigits,
    AfterExpMarker,
    AfterExpSign,
    ExpDigits,
}

impl NumberPhase {
    fn is_accepting(self) -> bool {
        matches!(
            self,
            NumberPhase::WholeZero
                | NumberPhase::WholeDigits
                | NumberPhase::FracDigits
                | NumberPhase::ExpDigits
        )
    }
}

fn is_escapable(ch: char) -> bool {
    matches!(ch, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')
}

fn is_control(ch: char) -> bool {
    let code = ch as u32;
    code <= 0x1F || code == 0x7F || (0x80..=0x9F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    fn scan_all(input: &str) -> Result<Vec<Token>, FoldError> {
        Tokens::new(input).collect()
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        scan_all(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_structural_tokens() {
        assert_eq!(
            kinds("{}[]:,"),
            vec![
                TokenKind::BeginObject,
                TokenKind::EndObject,
                TokenKind::BeginArray,
                TokenKind::EndArray,
                TokenKind::Colon,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn scans_keywords() {
        assert_eq!(
            kinds("true false null"),
            vec![TokenKind::True, TokenKind::False, TokenKind::Null]
        );
    }

    #[test]
    fn keyword_divergence_reports_exact_position() {
        let err = scan_all("tru}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.position.unwrap().index, 3);
    }

    #[test]
    fn keyword_truncated_at_end_of_input_fails() {
        let err = scan_all("fals").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.position.unwrap().index, 4);
    }

    #[test]
    fn scans_numbers_and_leaves_next_char_unconsumed() {
        let tokens = scan_all("123,").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "123");
        assert_eq!(tokens[1].kind, TokenKind::Comma);
        assert_eq!(tokens[1].position.index, 3);
    }

    #[test]
    fn accepts_full_number_grammar() {
        for text in ["0", "-0", "12", "-3.25", "0.5", "1e4", "1E-4", "2.5e+10"] {
            let tokens = scan_all(text).unwrap();
            assert_eq!(tokens.len(), 1, "for {}", text);
            assert_eq!(tokens[0].text, text);
        }
    }

    #[test]
    fn rejects_bad_numbers() {
        for text in ["-", "1.", "2e", "3e+", ".5", "-.5", "1.e4"] {
            let err = scan_all(text).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lex, "for {}", text);
        }
    }

    #[test]
    fn leading_zero_splits_tokens() {
        // Strict JSON forbids 05; it scans as two numbers for the tree
        // builder to reject.
        let tokens = scan_all("05").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "0");
        assert_eq!(tokens[1].text, "5");
    }

    #[test]
    fn scans_strings_with_escapes() {
        let tokens = scan_all(r#""a\n\"bé""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, r#""a\n\"bé""#);
    }

    #[test]
    fn rejects_bad_strings() {
        for text in [r#""abc"#, r#""\q""#, r#""\u12g4""#, "\"a\tb\""] {
            let err = scan_all(text).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lex, "for {:?}", text);
        }
    }

    #[test]
    fn scans_line_comment_trimmed() {
        let tokens = scan_all("// note   \n1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[0].text, "// note");
        assert_eq!(tokens[1].text, "1");
    }

    #[test]
    fn line_comment_at_end_of_input_is_valid() {
        let tokens = scan_all("// tail").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[0].text, "// tail");
    }

    #[test]
    fn block_comment_may_span_lines() {
        let tokens = scan_all("/* a\n b */").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::BlockComment);
        assert_eq!(tokens[0].text, "/* a\n b */");
    }

    #[test]
    fn unterminated_block_comment_fails() {
        let err = scan_all("/* oops").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
    }

    #[test]
    fn lone_slash_fails() {
        let err = scan_all("/ 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.position.unwrap().index, 1);
    }

    #[test]
    fn blank_line_token_sits_at_line_start() {
        let tokens = scan_all("1\n\n2").unwrap();
        assert_eq!(tokens[0].text, "1");
        assert_eq!(tokens[1].kind, TokenKind::BlankLine);
        assert_eq!(tokens[1].position, Position { index: 2, row: 1, column: 0 });
        assert_eq!(tokens[2].text, "2");
    }

    #[test]
    fn whitespace_only_line_counts_as_blank() {
        let tokens = scan_all("1\n   \t\n2").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::BlankLine);
        assert_eq!(tokens[1].position.row, 1);
    }

    #[test]
    fn crlf_and_lf_scan_identically() {
        let lf: Vec<_> = scan_all("{\n\"a\": 1\n}").unwrap();
        let crlf: Vec<_> = scan_all("{\r\n\"a\": 1\r\n}").unwrap();
        let lf_kinds: Vec<_> = lf.iter().map(|t| t.kind).collect();
        let crlf_kinds: Vec<_> = crlf.iter().map(|t| t.kind).collect();
        assert_eq!(lf_kinds, crlf_kinds);
        assert_eq!(lf[2].position.row, crlf[2].position.row);
    }

    #[test]
    fn positions_track_rows_and_columns() {
        let tokens = scan_all("{\n  \"a\": 1\n}").unwrap();
        let string = &tokens[1];
        assert_eq!(string.position, Position { index: 4, row: 1, column: 2 });
    }

    #[test]
    fn unrecognized_character_fails() {
        let err = scan_all("  #").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.position.unwrap().index, 2);
    }

    // -- Fuzz property: any whitespace-separated token sequence scans
    //    cleanly and comes back with text intact. --

    #[derive(Debug, Clone)]
    enum Piece {
        Punct(&'static str, TokenKind),
        Keyword(&'static str, TokenKind),
        Number(String),
        Str(String),
        LineComment(String),
        BlockComment(String),
    }

    impl Piece {
        fn text(&self) -> String {
            match self {
                Piece::Punct(t, _) | Piece::Keyword(t, _) => (*t).to_string(),
                Piece::Number(t) | Piece::Str(t) | Piece::LineComment(t) | Piece::BlockComment(t) => {
                    t.clone()
                }
            }
        }

        fn kind(&self) -> TokenKind {
            match self {
                Piece::Punct(_, k) | Piece::Keyword(_, k) => *k,
                Piece::Number(_) => TokenKind::Number,
                Piece::Str(_) => TokenKind::String,
                Piece::LineComment(_) => TokenKind::LineComment,
                Piece::BlockComment(_) => TokenKind::BlockComment,
            }
        }
    }

    fn piece_strategy() -> impl Strategy<Value = Piece> {
        prop_oneof![
            prop_oneof![
                Just(Piece::Punct("{", TokenKind::BeginObject)),
                Just(Piece::Punct("}", TokenKind::EndObject)),
                Just(Piece::Punct("[", TokenKind::BeginArray)),
                Just(Piece::Punct("]", TokenKind::EndArray)),
                Just(Piece::Punct(":", TokenKind::Colon)),
                Just(Piece::Punct(",", TokenKind::Comma)),
            ],
            prop_oneof![
                Just(Piece::Keyword("true", TokenKind::True)),
                Just(Piece::Keyword("false", TokenKind::False)),
                Just(Piece::Keyword("null", TokenKind::Null)),
            ],
            proptest::string::string_regex("-?(0|[1-9][0-9]{0,6})(\\.[0-9]{1,4})?([eE][+-]?[0-9]{1,3})?")
                .unwrap()
                .prop_map(Piece::Number),
            proptest::string::string_regex("\"[ -!#-\\[\\]-~]{0,12}\"")
                .unwrap()
                .prop_map(Piece::Str),
            proptest::string::string_regex("// ?[ -~]{0,10}[!-~]")
                .unwrap()
                .prop_map(Piece::LineComment),
            proptest::string::string_regex("/\\* ?[ -)+.-~]{0,10} ?\\*/")
                .unwrap()
                .prop_map(Piece::BlockComment),
        ]
    }

    fn whitespace_strategy() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[ \t]{1,3}(\r?\n[ \t]{0,2})?").unwrap()
    }

    proptest! {
        #[test]
        fn token_stream_reconstructs_input(
            pieces in proptest::collection::vec((piece_strategy(), whitespace_strategy()), 0..24)
        ) {
            let mut input = String::new();
            for (piece, ws) in &pieces {
                input.push_str(&piece.text());
                // a line comment owns the rest of its line
                if matches!(piece, Piece::LineComment(_)) {
                    input.push('\n');
                }
                input.push_str(ws);
            }

            let scanned = scan_all(&input).unwrap();
            let meaningful: Vec<&Token> = scanned
                .iter()
                .filter(|t| t.kind != TokenKind::BlankLine)
                .collect();

            prop_assert_eq!(meaningful.len(), pieces.len());
            for (token, (piece, _)) in meaningful.iter().zip(&pieces) {
                prop_assert_eq!(token.kind, piece.kind());
                prop_assert_eq!(&token.text, &piece.text());
                // the position must point at the token's first character
                let source_char = input.chars().nth(token.position.index).unwrap();
                prop_assert_eq!(source_char, piece.text().chars().next().unwrap());
            }
        }
    }
}
