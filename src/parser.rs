use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::json_value::{JsonValue, Map};

/// Nesting limit used by [`ParserConfig::default`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Hard ceiling on [`ParserConfig::max_depth`]. Larger limits are clamped to it so that
/// nesting always fails with an error before the call stack runs out.
pub const MAX_DEPTH_CEILING: usize = 512;

/// Knobs for [`JsonParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// How many arrays/objects may be nested inside each other. Going deeper fails with
    /// [`JsonParseErrorKind::DepthLimitExceeded`] instead of growing the call stack. Values
    /// above [`MAX_DEPTH_CEILING`] act as the ceiling.
    pub max_depth: usize,
    /// Accept the bare literals `null`, `true` and `false`. Off by default, in which case
    /// they are rejected like any other unrecognized leading byte.
    pub keyword_literals: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            keyword_literals: false,
        }
    }
}

impl ParserConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_CEILING);
        self
    }

    pub fn with_keyword_literals(mut self, keyword_literals: bool) -> Self {
        self.keyword_literals = keyword_literals;
        self
    }
}

/// Why a parse failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonParseErrorKind {
    /// A sign without digits, e.g. `+` or `-.`, or a value too large for an `f64`.
    MalformedNumber,
    UnterminatedString,
    UnterminatedArray,
    UnterminatedObject,
    /// An object key decoded to something other than a string.
    NonStringKey { found: &'static str },
    /// No dispatch branch accepts this byte.
    UnexpectedByte(u8),
    /// The input (or the rest of it) was empty or whitespace where a value was expected.
    UnexpectedEof,
    InvalidUtf8,
    DepthLimitExceeded { limit: usize },
    /// Only reported when the whole buffer must be a single document.
    TrailingBytes,
}

impl fmt::Display for JsonParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonParseErrorKind::MalformedNumber => write!(f, "Malformed number literal"),
            JsonParseErrorKind::UnterminatedString => write!(f, "Unterminated string literal"),
            JsonParseErrorKind::UnterminatedArray => {
                write!(f, "Unexpected EOF in array, expected ']'")
            }
            JsonParseErrorKind::UnterminatedObject => {
                write!(f, "Unexpected EOF in object, expected '}}'")
            }
            JsonParseErrorKind::NonStringKey { found } => {
                write!(f, "Key of object must be string but found {found}")
            }
            JsonParseErrorKind::UnexpectedByte(b) => write!(f, "Invalid byte: {b:#x}"),
            JsonParseErrorKind::UnexpectedEof => write!(f, "Unexpected EOF"),
            JsonParseErrorKind::InvalidUtf8 => write!(f, "Invalid UTF-8 in string"),
            JsonParseErrorKind::DepthLimitExceeded { limit } => {
                write!(f, "Nesting is deeper than the limit of {limit}")
            }
            JsonParseErrorKind::TrailingBytes => write!(f, "Expected EOF but found more bytes"),
        }
    }
}

/// The error type of this crate. Comes with the byte offset, relative to the buffer handed
/// to the top-level call, at which the offending element starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonParseError {
    kind: JsonParseErrorKind,
    offset: usize,
}

impl JsonParseError {
    pub fn new(kind: JsonParseErrorKind, offset: usize) -> JsonParseError {
        JsonParseError { kind, offset }
    }

    pub fn kind(&self) -> JsonParseErrorKind {
        self.kind
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for JsonParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error at offset {}: {}", self.offset, self.kind)
    }
}

impl std::error::Error for JsonParseError {}

/// A type alias for `Result<T, JsonParseError>`.
pub type JsonParseResult<T> = Result<T, JsonParseError>;

// Note: wider than JSON's own whitespace set. Vertical tab, form feed and NUL are skipped too.
fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\r' | b'\t' | 0x0b | 0x0c | 0x00)
}

fn err<T>(kind: JsonParseErrorKind, offset: usize) -> JsonParseResult<T> {
    Err(JsonParseError::new(kind, offset))
}

/// Decodes one value from the front of a byte span.
#[derive(Debug, Clone, Default)]
pub struct JsonParser {
    config: ParserConfig,
}

impl JsonParser {
    pub fn new(config: ParserConfig) -> Self {
        JsonParser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses the value at the front of `input` and returns it together with the number of
    /// bytes it occupied, leading whitespace included. Bytes after the value are not looked at.
    pub fn parse(&self, input: impl AsRef<[u8]>) -> JsonParseResult<(JsonValue, usize)> {
        let bytes = input.as_ref();
        let result = Cursor {
            bytes,
            config: &self.config,
        }
        .parse_any(0, 0);

        match &result {
            Ok((value, consumed)) => debug!(
                consumed,
                len = bytes.len(),
                kind = value.type_name(),
                "parsed json value"
            ),
            Err(e) => debug!(offset = e.offset(), error = %e.kind(), "json parse failed"),
        }
        result
    }

    /// Parses `input` as exactly one document. Only whitespace may follow the value.
    pub fn parse_document(&self, input: impl AsRef<[u8]>) -> JsonParseResult<JsonValue> {
        let bytes = input.as_ref();
        let (value, consumed) = self.parse(bytes)?;
        match bytes[consumed..].iter().position(|&b| !is_whitespace(b)) {
            Some(pos) => err(JsonParseErrorKind::TrailingBytes, consumed + pos),
            None => Ok(value),
        }
    }
}

/// [`JsonParser::parse`] with the default configuration.
///
/// ```
/// use json_prefix::{parse, JsonValue};
///
/// let (value, consumed) = parse("[985, 211] trailing").unwrap();
/// assert_eq!(value, JsonValue::Array(vec![JsonValue::Int(985), JsonValue::Int(211)]));
/// assert_eq!(consumed, 10);
/// ```
pub fn parse(input: impl AsRef<[u8]>) -> JsonParseResult<(JsonValue, usize)> {
    JsonParser::default().parse(input)
}

/// [`JsonParser::parse_document`] with the default configuration.
pub fn parse_document(input: impl AsRef<[u8]>) -> JsonParseResult<JsonValue> {
    JsonParser::default().parse_document(input)
}

impl FromStr for JsonValue {
    type Err = JsonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_document(s)
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Raw,
    Escaped,
}

fn unescaped_byte(c: u8) -> u8 {
    match c {
        b'n' => b'\n',
        b'r' => b'\r',
        b'0' => 0x00,
        b't' => b'\t',
        b'v' => 0x0b,
        b'f' => 0x0c,
        b'b' => 0x08,
        b'a' => 0x07,
        c => c,
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Length of the longest number literal at the front of `bytes`:
/// `[+-]?[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?`
fn match_number(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    if let Some(b'+') | Some(b'-') = bytes.first() {
        i += 1;
    }

    let digits = count_digits(&bytes[i..]);
    if digits == 0 {
        return None;
    }
    i += digits;

    if bytes.get(i) == Some(&b'.') {
        i += 1;
        i += count_digits(&bytes[i..]);
    }

    if let Some(b'e') | Some(b'E') = bytes.get(i) {
        let mut j = i + 1;
        if let Some(b'+') | Some(b'-') = bytes.get(j) {
            j += 1;
        }
        // A dangling exponent marker is left for the caller.
        let exp_digits = count_digits(&bytes[j..]);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }

    Some(i)
}

/// One parse over one buffer. Positions are absolute offsets into `bytes`; every step returns
/// the value it decoded and how many bytes from its start position it consumed.
struct Cursor<'a> {
    bytes: &'a [u8],
    config: &'a ParserConfig,
}

impl Cursor<'_> {
    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while let Some(&c) = self.bytes.get(pos) {
            if !is_whitespace(c) {
                break;
            }
            pos += 1;
        }
        pos
    }

    fn enter(&self, start: usize, depth: usize) -> JsonParseResult<usize> {
        let limit = self.config.max_depth.min(MAX_DEPTH_CEILING);
        if depth >= limit {
            trace!(start, limit, "nesting limit reached");
            return err(JsonParseErrorKind::DepthLimitExceeded { limit }, start);
        }
        Ok(depth + 1)
    }

    fn parse_any(&self, start: usize, depth: usize) -> JsonParseResult<(JsonValue, usize)> {
        let Some(&c) = self.bytes.get(start) else {
            return err(JsonParseErrorKind::UnexpectedEof, start);
        };

        match c {
            c if is_whitespace(c) => {
                let skipped = self.skip_whitespace(start) - start;
                let (value, eaten) = self.parse_any(start + skipped, depth)?;
                Ok((value, eaten + skipped))
            }
            b'0'..=b'9' | b'+' | b'-' => self.parse_number(start),
            b'"' => self.parse_string(start),
            b'[' => self.parse_array(start, depth),
            b'{' => self.parse_object(start, depth),
            b'n' | b't' | b'f' if self.config.keyword_literals => self.parse_keyword(start),
            c => {
                trace!(start, byte = c, "no dispatch branch for byte");
                err(JsonParseErrorKind::UnexpectedByte(c), start)
            }
        }
    }

    fn parse_number(&self, start: usize) -> JsonParseResult<(JsonValue, usize)> {
        let rest = &self.bytes[start..];
        let Some(len) = match_number(rest) else {
            return err(JsonParseErrorKind::MalformedNumber, start);
        };
        let Ok(text) = std::str::from_utf8(&rest[..len]) else {
            return err(JsonParseErrorKind::MalformedNumber, start);
        };

        if let Ok(n) = text.parse::<i64>() {
            return Ok((JsonValue::Int(n), len));
        }
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => return Ok((JsonValue::Double(n), len)),
            _ => {}
        }
        err(JsonParseErrorKind::MalformedNumber, start)
    }

    fn parse_string(&self, start: usize) -> JsonParseResult<(JsonValue, usize)> {
        let mut s = SmallVec::<[u8; 16]>::new();
        let mut phase = Phase::Raw;
        let mut i = start + 1;
        loop {
            let Some(&c) = self.bytes.get(i) else {
                return err(JsonParseErrorKind::UnterminatedString, start);
            };
            i += 1;
            match phase {
                Phase::Raw => match c {
                    b'\\' => phase = Phase::Escaped,
                    b'"' => break,
                    c => s.push(c),
                },
                Phase::Escaped => {
                    s.push(unescaped_byte(c));
                    phase = Phase::Raw;
                }
            }
        }

        let s = String::from_utf8(s.into_vec())
            .or_else(|_| err(JsonParseErrorKind::InvalidUtf8, start))?;
        Ok((JsonValue::String(s), i - start))
    }

    fn parse_array(&self, start: usize, depth: usize) -> JsonParseResult<(JsonValue, usize)> {
        let depth = self.enter(start, depth)?;
        let mut v = Vec::new();
        let mut i = start + 1;
        loop {
            i = self.skip_whitespace(i);
            match self.bytes.get(i) {
                None => return err(JsonParseErrorKind::UnterminatedArray, start),
                Some(b']') => {
                    i += 1;
                    break;
                }
                Some(_) => {}
            }

            let (value, eaten) = self.parse_any(i, depth)?;
            v.push(value);
            i = self.skip_whitespace(i + eaten);
            // Separators are optional: `[1 2]` and `[1,]` are accepted.
            if self.bytes.get(i) == Some(&b',') {
                i += 1;
            }
        }
        Ok((JsonValue::Array(v), i - start))
    }

    fn parse_object(&self, start: usize, depth: usize) -> JsonParseResult<(JsonValue, usize)> {
        let depth = self.enter(start, depth)?;
        let mut m = Map::default();
        let mut i = start + 1;
        loop {
            i = self.skip_whitespace(i);
            match self.bytes.get(i) {
                None => return err(JsonParseErrorKind::UnterminatedObject, start),
                Some(b'}') => {
                    i += 1;
                    break;
                }
                Some(_) => {}
            }

            let (key, eaten) = self.parse_any(i, depth)?;
            let key = match key {
                JsonValue::String(s) => s,
                other => {
                    let found = other.type_name();
                    return err(JsonParseErrorKind::NonStringKey { found }, i);
                }
            };
            i = self.skip_whitespace(i + eaten);
            if self.bytes.get(i) == Some(&b':') {
                i += 1;
            }

            let (value, eaten) = self.parse_any(i, depth)?;
            // Later duplicates overwrite earlier ones.
            m.insert(key, value);
            i = self.skip_whitespace(i + eaten);
            if self.bytes.get(i) == Some(&b',') {
                i += 1;
            }
        }
        Ok((JsonValue::Object(m), i - start))
    }

    fn parse_keyword(&self, start: usize) -> JsonParseResult<(JsonValue, usize)> {
        let rest = &self.bytes[start..];
        let (value, len) = if rest.starts_with(b"null") {
            (JsonValue::Null, 4)
        } else if rest.starts_with(b"true") {
            (JsonValue::Bool(true), 4)
        } else if rest.starts_with(b"false") {
            (JsonValue::Bool(false), 5)
        } else {
            return err(JsonParseErrorKind::UnexpectedByte(rest[0]), start);
        };
        Ok((value, len))
    }
}
