//! Decodes one JSON value from the front of a byte span.
//!
//! [`parse`] returns the decoded [`JsonValue`] together with the number of bytes it
//! occupied, so a caller can keep reading whatever follows. [`parse_document`] additionally
//! insists that nothing but whitespace follows the value.
//!
//! ```
//! use json_prefix::{parse, JsonValue, Map};
//!
//! let s = r#"{"work":996,"school":[985,[211,101]]}"#;
//! let (value, consumed) = parse(s).unwrap();
//! assert_eq!(consumed, s.len());
//! assert!(value.is::<Map>());
//! assert_eq!(value["work"].get::<i64>().unwrap(), &996);
//! assert_eq!(value["school"][1][0], JsonValue::Int(211));
//! ```
//!
//! Any malformed element fails the whole parse; the error says what went wrong and at which
//! byte offset.
//!
//! ```
//! use json_prefix::{parse, JsonParseErrorKind};
//!
//! let err = parse("[1,}]").unwrap_err();
//! assert_eq!(err.kind(), JsonParseErrorKind::UnexpectedByte(b'}'));
//! assert_eq!(err.offset(), 3);
//! ```

mod json_value;
mod parser;

pub use json_value::{InnerAsRef, InnerAsRefMut, JsonValue, Map, UnexpectedValue};
pub use parser::*;
