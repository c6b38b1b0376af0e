//! Text decoding: a tokenizer and a recursive-descent parser that drives
//! builder calls.
//!
//! Grammar, informally:
//!
//! ```text
//! root     := [STRING ':'] compound
//! compound := '{' [member (',' member)*] '}'
//! member   := STRING ':' value
//! value    := compound | list | packed | STRING | INTEGER | REAL
//! list     := '[' [value (',' value)*] ']'
//! packed   := ('[B;' | '[I;' | '[L;') [INTEGER (',' INTEGER)*] ']'
//! ```

use std::borrow::Cow;
use std::str::FromStr;

use bytes::Buf;

use super::stream::MemoryStream;
use crate::builder::Builder;
use crate::error::NbtError;
use crate::tag::Tag;

const WHITESPACE: &[u8] = b" \t\r\n";
const STRING_TERMINATORS: &[u8] = b",[]{}: \t\r\n";
const NUMBER_SUFFIXES: &[u8] = b"bBsSlLfFdD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    CompoundBegin,
    CompoundEnd,
    ListBegin,
    ListEnd,
    NameDelim,
    ContainerDelim,
    String,
    Integer,
    Real,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) text: Cow<'a, str>,
    /// Numeric suffix, or the element kind (`B`, `I`, `L`) of a packed array open.
    pub(crate) type_indicator: Option<u8>,
    pub(crate) quoted: bool,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, text: impl Into<Cow<'a, str>>) -> Self {
        Self {
            kind,
            text: text.into(),
            type_indicator: None,
            quoted: false,
        }
    }

    fn with_indicator(mut self, indicator: Option<u8>) -> Self {
        self.type_indicator = indicator;
        self
    }
}

/// Splits text input into tokens up front, then serves them to the parser.
#[derive(Debug)]
pub(crate) struct TextTokenizer<'a> {
    stream: MemoryStream<'a>,
    tokens: Vec<Token<'a>>,
    current: usize,
}

impl<'a> TextTokenizer<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            stream: MemoryStream::new(text.as_bytes()),
            tokens: Vec::new(),
            current: 0,
        }
    }

    pub(crate) fn tokenize(&mut self) -> Result<(), NbtError> {
        loop {
            self.stream.skip_bytes(WHITESPACE);
            if !self.stream.has_contents() {
                return Ok(());
            }
            let token = self.parse_token()?;
            self.tokens.push(token);
        }
    }

    pub(crate) fn current(&self) -> Option<&Token<'a>> {
        self.lookahead(0)
    }

    pub(crate) fn lookahead(&self, offset: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.current + offset)
    }

    /// Consumes the current token if it is of `kind`.
    pub(crate) fn matches(&mut self, kind: TokenKind) -> bool {
        self.take(kind).is_some()
    }

    /// Consumes and returns the current token if it is of `kind`.
    pub(crate) fn take(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        if self.current()?.kind != kind {
            return None;
        }
        self.next_token()
    }

    pub(crate) fn next_token(&mut self) -> Option<Token<'a>> {
        let token = self.current()?.clone();
        self.current += 1;
        Some(token)
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn parse_token(&mut self) -> Result<Token<'a>, NbtError> {
        let position = self.stream.position();
        let punctuation = match self.stream.current_byte() {
            Some(b'{') => Some(TokenKind::CompoundBegin),
            Some(b'}') => Some(TokenKind::CompoundEnd),
            Some(b']') => Some(TokenKind::ListEnd),
            Some(b':') => Some(TokenKind::NameDelim),
            Some(b',') => Some(TokenKind::ContainerDelim),
            Some(b'[') => return self.parse_list_open(),
            _ => None,
        };
        if let Some(kind) = punctuation {
            return Ok(Token::new(kind, self.stream.retrieve_str(1)?));
        }
        if let Some(token) = self.try_parse_number()? {
            return Ok(token);
        }
        if let Some(token) = self.try_parse_string()? {
            return Ok(token);
        }
        Err(NbtError::parse(format!(
            "unexpected character at byte {position}"
        )))
    }

    fn parse_list_open(&mut self) -> Result<Token<'a>, NbtError> {
        let packed = match (self.stream.lookahead_byte(1), self.stream.lookahead_byte(2)) {
            (Some(kind @ (b'B' | b'I' | b'L')), Some(b';')) => Some(kind),
            _ => None,
        };
        let len = if packed.is_some() { 3 } else { 1 };
        let text = self.stream.retrieve_str(len)?;
        Ok(Token::new(TokenKind::ListBegin, text).with_indicator(packed))
    }

    /// A number is an optional sign, digits with at most one `.`, and an
    /// optional one-letter suffix, ending at a terminator. Anything else is
    /// left for the string rule.
    fn try_parse_number(&mut self) -> Result<Option<Token<'a>>, NbtError> {
        let mut len = usize::from(matches!(self.stream.current_byte(), Some(b'+' | b'-')));
        let int_digits = self.count_digits(len);
        len += int_digits;

        let mut kind = TokenKind::Integer;
        let mut frac_digits = 0;
        if self.stream.lookahead_byte(len) == Some(b'.') {
            frac_digits = self.count_digits(len + 1);
            kind = TokenKind::Real;
            len += 1 + frac_digits;
        }
        if int_digits + frac_digits == 0 {
            return Ok(None);
        }

        let suffix = self
            .stream
            .lookahead_byte(len)
            .filter(|b| NUMBER_SUFFIXES.contains(b));
        let end = len + usize::from(suffix.is_some());
        if self
            .stream
            .lookahead_byte(end)
            .is_some_and(|b| !STRING_TERMINATORS.contains(&b))
        {
            return Ok(None);
        }

        let text = self.stream.retrieve_str(len)?;
        if suffix.is_some() {
            self.stream.advance(1);
        }
        Ok(Some(Token::new(kind, text).with_indicator(suffix)))
    }

    fn count_digits(&self, offset: usize) -> usize {
        let mut n = 0;
        while self
            .stream
            .lookahead_byte(offset + n)
            .is_some_and(|b| b.is_ascii_digit())
        {
            n += 1;
        }
        n
    }

    fn try_parse_string(&mut self) -> Result<Option<Token<'a>>, NbtError> {
        if let Some(quote @ (b'"' | b'\'')) = self.stream.current_byte() {
            return self.parse_quoted(quote).map(Some);
        }
        let mut len = 0;
        while self
            .stream
            .lookahead_byte(len)
            .is_some_and(|b| !STRING_TERMINATORS.contains(&b))
        {
            len += 1;
        }
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(Token::new(TokenKind::String, self.stream.retrieve_str(len)?)))
    }

    fn parse_quoted(&mut self, quote: u8) -> Result<Token<'a>, NbtError> {
        let start = self.stream.position();
        let mut len = 0;
        let mut escaped = false;
        loop {
            match self.stream.lookahead_byte(1 + len) {
                None => {
                    return Err(NbtError::parse(format!(
                        "unterminated quoted string starting at byte {start}"
                    )));
                }
                Some(b'\\') => {
                    escaped = true;
                    len += 2;
                }
                Some(b) if b == quote => break,
                Some(_) => len += 1,
            }
        }

        self.stream.advance(1);
        let raw = self.stream.retrieve_str(len)?;
        self.stream.advance(1);
        let text = if escaped {
            Cow::Owned(unescape(raw))
        } else {
            Cow::Borrowed(raw)
        };
        let mut token = Token::new(TokenKind::String, text);
        token.quoted = true;
        Ok(token)
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | '"' | '\'')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parses a whole text tree into `builder`. The root is left open.
pub(crate) fn parse_text_stream(text: &str, builder: &mut Builder) -> Result<(), NbtError> {
    let mut tokens = TextTokenizer::new(text);
    tokens.tokenize()?;
    TextParser { tokens, builder }.parse_root()
}

struct TextParser<'a, 'b> {
    tokens: TextTokenizer<'a>,
    builder: &'b mut Builder,
}

impl TextParser<'_, '_> {
    fn parse_root(&mut self) -> Result<(), NbtError> {
        let named = self
            .tokens
            .current()
            .is_some_and(|t| t.kind == TokenKind::String)
            && self
                .tokens
                .lookahead(1)
                .is_some_and(|t| t.kind == TokenKind::NameDelim);
        let root_name = if named {
            let name = self.tokens.next_token().map(|t| t.text).unwrap_or_default();
            self.expect(TokenKind::NameDelim, "':'")?;
            name
        } else {
            Cow::Borrowed("")
        };

        self.expect(TokenKind::CompoundBegin, "'{'")?;
        self.builder.begin(&root_name)?;
        self.parse_members()?;
        if !self.tokens.is_exhausted() {
            return Err(self.unexpected("end of input"));
        }
        Ok(())
    }

    /// Members of a compound whose `{` has been consumed, through the `}`.
    fn parse_members(&mut self) -> Result<(), NbtError> {
        if self.tokens.matches(TokenKind::CompoundEnd) {
            return Ok(());
        }
        loop {
            self.parse_text_named_tag()?;
            if !self.tokens.matches(TokenKind::ContainerDelim) {
                break;
            }
        }
        self.expect(TokenKind::CompoundEnd, "',' or '}'")
    }

    fn parse_text_named_tag(&mut self) -> Result<Tag, NbtError> {
        let Some(name) = self.tokens.take(TokenKind::String) else {
            return Err(self.unexpected("a tag name"));
        };
        self.expect(TokenKind::NameDelim, "':'")?;
        self.parse_text_payload(&name.text)
    }

    fn parse_text_payload(&mut self, name: &str) -> Result<Tag, NbtError> {
        let Some(token) = self.tokens.next_token() else {
            return Err(NbtError::parse("unexpected end of input, expected a value"));
        };
        match token.kind {
            TokenKind::CompoundBegin => {
                self.builder.begin_compound(name)?;
                self.parse_members()?;
                self.builder.end_compound()?;
                Ok(Tag::Compound)
            }
            TokenKind::ListBegin => match token.type_indicator {
                Some(b'B') => {
                    self.parse_packed(name, b"bB", Builder::write_byte_array)?;
                    Ok(Tag::ByteArray)
                }
                Some(b'I') => {
                    self.parse_packed(name, b"", Builder::write_int_array)?;
                    Ok(Tag::IntArray)
                }
                Some(b'L') => {
                    self.parse_packed(name, b"lL", Builder::write_long_array)?;
                    Ok(Tag::LongArray)
                }
                _ => self.parse_list(name),
            },
            TokenKind::String if !token.quoted && token.text == "true" => {
                self.builder.write_byte(1, name)?;
                Ok(Tag::Byte)
            }
            TokenKind::String if !token.quoted && token.text == "false" => {
                self.builder.write_byte(0, name)?;
                Ok(Tag::Byte)
            }
            TokenKind::String => {
                self.builder.write_string(&token.text, name)?;
                Ok(Tag::String)
            }
            TokenKind::Integer => self.write_integer(&token, name),
            TokenKind::Real => self.write_real(&token, name),
            kind => Err(NbtError::parse(format!(
                "unexpected {kind:?} token {:?}, expected a value",
                token.text
            ))),
        }
    }

    fn parse_list(&mut self, name: &str) -> Result<Tag, NbtError> {
        self.builder.begin_list(name)?;
        if !self.tokens.matches(TokenKind::ListEnd) {
            loop {
                self.parse_text_payload("")?;
                if !self.tokens.matches(TokenKind::ContainerDelim) {
                    break;
                }
            }
            self.expect(TokenKind::ListEnd, "',' or ']'")?;
        }
        self.builder.end_list()?;
        Ok(Tag::List)
    }

    /// Packed array elements. When `suffixes` is non-empty every element
    /// must carry one of them.
    fn parse_packed<T: FromStr>(
        &mut self,
        name: &str,
        suffixes: &[u8],
        write: fn(&mut Builder, &[T], &str) -> Result<(), NbtError>,
    ) -> Result<(), NbtError> {
        let mut values = Vec::new();
        if !self.tokens.matches(TokenKind::ListEnd) {
            loop {
                let Some(token) = self.tokens.take(TokenKind::Integer) else {
                    return Err(self.unexpected("an integer array element"));
                };
                let suffixed = token.type_indicator.is_some_and(|s| suffixes.contains(&s));
                if !suffixes.is_empty() && !suffixed {
                    return Err(NbtError::parse(format!(
                        "array element {} must carry a '{}' suffix",
                        token.text, suffixes[0] as char
                    )));
                }
                values.push(parse_number::<T>(&token.text)?);
                if !self.tokens.matches(TokenKind::ContainerDelim) {
                    break;
                }
            }
            self.expect(TokenKind::ListEnd, "',' or ']'")?;
        }
        write(self.builder, &values, name)
    }

    fn write_integer(&mut self, token: &Token<'_>, name: &str) -> Result<Tag, NbtError> {
        let text = &token.text;
        match token.type_indicator {
            None => self.builder.write_int(parse_number(text)?, name).map(|()| Tag::Int),
            Some(b'b' | b'B') => self.builder.write_byte(parse_number(text)?, name).map(|()| Tag::Byte),
            Some(b's' | b'S') => self.builder.write_short(parse_number(text)?, name).map(|()| Tag::Short),
            Some(b'l' | b'L') => self.builder.write_long(parse_number(text)?, name).map(|()| Tag::Long),
            Some(b'f' | b'F') => self.builder.write_float(parse_number(text)?, name).map(|()| Tag::Float),
            Some(b'd' | b'D') => {
                self.builder.write_double(parse_number(text)?, name).map(|()| Tag::Double)
            }
            Some(other) => Err(unknown_suffix(text, other)),
        }
    }

    fn write_real(&mut self, token: &Token<'_>, name: &str) -> Result<Tag, NbtError> {
        let text = &token.text;
        match token.type_indicator {
            Some(b'f' | b'F') => self.builder.write_float(parse_number(text)?, name).map(|()| Tag::Float),
            None | Some(b'd' | b'D') => {
                self.builder.write_double(parse_number(text)?, name).map(|()| Tag::Double)
            }
            Some(other) => Err(unknown_suffix(text, other)),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), NbtError> {
        if self.tokens.matches(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> NbtError {
        match self.tokens.current() {
            Some(token) => NbtError::parse(format!(
                "expected {expected}, found {:?} token {:?}",
                token.kind, token.text
            )),
            None => NbtError::parse(format!("expected {expected}, found end of input")),
        }
    }
}

fn parse_number<T: FromStr>(text: &str) -> Result<T, NbtError> {
    text.parse()
        .map_err(|_| NbtError::parse(format!("number literal {text:?} is out of range")))
}

fn unknown_suffix(text: &str, suffix: u8) -> NbtError {
    NbtError::parse(format!(
        "number {text} has an invalid suffix '{}'",
        suffix as char
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{ListRef, TagPayload};

    fn tokens(text: &str) -> Vec<Token<'_>> {
        let mut tokenizer = TextTokenizer::new(text);
        tokenizer.tokenize().unwrap();
        tokenizer.tokens
    }

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokens(text).into_iter().map(|t| t.kind).collect()
    }

    fn parse(text: &str) -> Result<Builder, NbtError> {
        let mut builder = Builder::new();
        parse_text_stream(text, &mut builder)?;
        Ok(builder)
    }

    fn payload(builder: &Builder, name: &str) -> TagPayload {
        builder
            .store()
            .named_tags()
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.data_tag.payload)
            .unwrap()
    }

    #[test]
    fn punctuation_and_values() {
        use TokenKind::*;
        assert_eq!(
            kinds("{a:[1,2.5], b : 'x'}"),
            vec![
                CompoundBegin, String, NameDelim, ListBegin, Integer, ContainerDelim, Real,
                ListEnd, ContainerDelim, String, NameDelim, String, CompoundEnd,
            ]
        );
    }

    #[test]
    fn number_suffixes() {
        let t = tokens("12b -3s 4L 1.5f 2.0 7d");
        assert_eq!(t[0].text, "12");
        assert_eq!(t[0].type_indicator, Some(b'b'));
        assert_eq!(t[1].text, "-3");
        assert_eq!(t[2].type_indicator, Some(b'L'));
        assert_eq!((t[3].kind, t[3].type_indicator), (TokenKind::Real, Some(b'f')));
        assert_eq!((t[4].kind, t[4].type_indicator), (TokenKind::Real, None));
        assert_eq!((t[5].kind, t[5].type_indicator), (TokenKind::Integer, Some(b'd')));
    }

    #[test]
    fn digits_followed_by_letters_are_strings() {
        let t = tokens("1st 12abc -");
        assert!(t.iter().all(|t| t.kind == TokenKind::String));
        assert_eq!(t[1].text, "12abc");
        assert_eq!(t[2].text, "-");
    }

    #[test]
    fn packed_array_opens() {
        let t = tokens("[B; [I; [L; [x;");
        assert_eq!(t[0].type_indicator, Some(b'B'));
        assert_eq!(t[1].type_indicator, Some(b'I'));
        assert_eq!(t[2].type_indicator, Some(b'L'));
        assert_eq!(t[3].type_indicator, None);
        assert_eq!(t[4].text, "x;");
    }

    #[test]
    fn quoted_strings_unescape() {
        let t = tokens(r#""a \"q\" \\ b" 'it\'s' "" "c\n""#);
        assert_eq!(t[0].text, r#"a "q" \ b"#);
        assert!(t[0].quoted);
        assert_eq!(t[1].text, "it's");
        assert_eq!(t[2].text, "");
        assert_eq!(t[3].text, r"c\n");
        assert!(matches!(t[2].text, Cow::Borrowed(_)));
    }

    #[test]
    fn unquoted_strings_stop_at_terminators() {
        let t = tokens("hello:world,x\ty");
        assert_eq!(t[0].text, "hello");
        assert_eq!(t[2].text, "world");
        assert_eq!(t[4].text, "x");
        assert_eq!(t[5].text, "y");
    }

    #[test]
    fn unterminated_quote_fails() {
        let mut tokenizer = TextTokenizer::new("{a:\"oops}");
        assert!(matches!(tokenizer.tokenize(), Err(NbtError::Parse(_))));
        let mut tokenizer = TextTokenizer::new("\"trailing\\");
        assert!(tokenizer.tokenize().is_err());
    }

    #[test]
    fn parses_scalars_by_suffix() {
        let b = parse("{b:1b,s:2s,i:3,l:4l,f:1.5f,d:2.5,d2:7d,f2:3f,t:true,n:false}").unwrap();
        assert_eq!(payload(&b, "b"), TagPayload::Byte(1));
        assert_eq!(payload(&b, "s"), TagPayload::Short(2));
        assert_eq!(payload(&b, "i"), TagPayload::Int(3));
        assert_eq!(payload(&b, "l"), TagPayload::Long(4));
        assert_eq!(payload(&b, "f"), TagPayload::Float(1.5));
        assert_eq!(payload(&b, "d"), TagPayload::Double(2.5));
        assert_eq!(payload(&b, "d2"), TagPayload::Double(7.0));
        assert_eq!(payload(&b, "f2"), TagPayload::Float(3.0));
        assert_eq!(payload(&b, "t"), TagPayload::Byte(1));
        assert_eq!(payload(&b, "n"), TagPayload::Byte(0));
    }

    #[test]
    fn quoted_true_stays_a_string() {
        let b = parse(r#"{t:"true"}"#).unwrap();
        let TagPayload::String(s) = payload(&b, "t") else {
            panic!("not a string");
        };
        assert_eq!(b.store().string(s).unwrap(), "true");
    }

    #[test]
    fn out_of_range_literal_fails() {
        assert!(parse("{b:300b}").is_err());
        assert!(parse("{i:3000000000}").is_err());
        assert!(parse("{l:3000000000l}").is_ok());
    }

    #[test]
    fn packed_arrays() {
        let b = parse("{b:[B;1b,-2B],i:[I;1,2,3],l:[L;5l],e:[B;]}").unwrap();
        let TagPayload::ByteArray(bytes) = payload(&b, "b") else {
            panic!("not a byte array");
        };
        assert_eq!(b.store().pool_slice::<i8>(bytes.pool_index, bytes.count).unwrap(), &[1, -2]);
        let TagPayload::IntArray(ints) = payload(&b, "i") else {
            panic!("not an int array");
        };
        assert_eq!(ints.count, 3);
        let TagPayload::ByteArray(empty) = payload(&b, "e") else {
            panic!("not a byte array");
        };
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn packed_array_requires_suffix() {
        assert!(parse("{b:[B;1b,2]}").is_err());
        assert!(parse("{l:[L;1]}").is_err());
        assert!(parse("{l:[L;1b]}").is_err());
        assert!(parse("{i:[I;1.5]}").is_err());
    }

    #[test]
    fn optional_root_name() {
        let b = parse(r#""level":{x:1}"#).unwrap();
        assert_eq!(b.root().unwrap().name(), "level");
        let b = parse("{}").unwrap();
        assert_eq!(b.root().unwrap().name(), "");
    }

    #[test]
    fn nested_lists_and_compounds() {
        let b = parse("{outer:[{x:1},{x:2}],m:[[1s],[]],e:[]}").unwrap();
        let TagPayload::List(outer) = payload(&b, "outer") else {
            panic!("not a list");
        };
        assert_eq!((outer.element_type, outer.count), (Tag::Compound, 2));
        let TagPayload::List(m) = payload(&b, "m") else {
            panic!("not a list");
        };
        assert_eq!((m.element_type, m.count), (Tag::List, 2));
        assert_eq!(payload(&b, "e"), TagPayload::List(ListRef::default()));
    }

    #[test]
    fn heterogeneous_list_fails() {
        assert!(matches!(
            parse("{l:[1,2s]}"),
            Err(NbtError::InvalidStructure(_))
        ));
    }

    #[test]
    fn malformed_input_fails() {
        for text in ["", "{", "{a}", "{a:}", "{a:1,}", "{a:1} extra", "[1]", "{a:1 b:2}", "{:1}"] {
            assert!(parse(text).is_err(), "accepted {text:?}");
        }
    }
}
