use std::fmt;
use std::ops::{Index, IndexMut};

const NULL: () = ();

/// The map type backing [`JsonValue::Object`].
///
/// Iteration order is unspecified unless the `preserve_order` feature is enabled, in which
/// case keys iterate in first-insertion order.
#[cfg(not(feature = "preserve_order"))]
pub type Map = rustc_hash::FxHashMap<String, JsonValue>;

/// The map type backing [`JsonValue::Object`].
///
/// Iteration order is unspecified unless the `preserve_order` feature is enabled, in which
/// case keys iterate in first-insertion order.
#[cfg(feature = "preserve_order")]
pub type Map = indexmap::IndexMap<String, JsonValue, rustc_hash::FxBuildHasher>;

/// A decoded JSON value. Exactly one variant is active; containers own their children.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    /// A number literal that fits in an `i64`.
    Int(i64),
    /// A number literal that has a fraction or exponent, or does not fit in an `i64`.
    Double(f64),
    String(String),
    Array(Vec<JsonValue>),
    Object(Map),
}

pub trait InnerAsRef {
    /// Name of the variant carrying `Self`, as reported by [`JsonValue::type_name`].
    const TYPE_NAME: &'static str;

    fn json_value_as(v: &JsonValue) -> Option<&Self>;
}

macro_rules! impl_inner_ref {
    ($to:ty, $name:literal, $pat:pat => $val:expr) => {
        impl InnerAsRef for $to {
            const TYPE_NAME: &'static str = $name;

            fn json_value_as(v: &JsonValue) -> Option<&$to> {
                use JsonValue::*;
                match v {
                    $pat => Some($val),
                    _ => None,
                }
            }
        }
    };
}

impl_inner_ref!((), "null", Null => &NULL);
impl_inner_ref!(bool, "bool", Bool(b) => b);
impl_inner_ref!(i64, "int", Int(n) => n);
impl_inner_ref!(f64, "double", Double(n) => n);
impl_inner_ref!(String, "string", String(s) => s);
impl_inner_ref!(Vec<JsonValue>, "array", Array(a) => a);
impl_inner_ref!(Map, "object", Object(m) => m);

pub trait InnerAsRefMut: InnerAsRef {
    fn json_value_as_mut(v: &mut JsonValue) -> Option<&mut Self>;
}

macro_rules! impl_inner_ref_mut {
    ($to:ty, $pat:pat => $val:expr) => {
        impl InnerAsRefMut for $to {
            fn json_value_as_mut(v: &mut JsonValue) -> Option<&mut $to> {
                use JsonValue::*;
                match v {
                    $pat => Some($val),
                    _ => None,
                }
            }
        }
    };
}

impl_inner_ref_mut!(bool, Bool(b) => b);
impl_inner_ref_mut!(i64, Int(n) => n);
impl_inner_ref_mut!(f64, Double(n) => n);
impl_inner_ref_mut!(String, String(s) => s);
impl_inner_ref_mut!(Vec<JsonValue>, Array(a) => a);
impl_inner_ref_mut!(Map, Object(m) => m);

macro_rules! is_xxx {
    ($name:ident, $variant:pat) => {
        pub fn $name(&self) -> bool {
            matches!(self, $variant)
        }
    };
}

impl JsonValue {
    /// Returns the payload if the active variant carries a `T`.
    ///
    /// ```
    /// use json_prefix::JsonValue;
    ///
    /// let v = JsonValue::Int(996);
    /// assert_eq!(v.get::<i64>().unwrap(), &996);
    /// assert!(v.get::<String>().is_err());
    /// ```
    pub fn get<T: InnerAsRef>(&self) -> Result<&T, UnexpectedValue> {
        match T::json_value_as(self) {
            Some(inner) => Ok(inner),
            None => Err(UnexpectedValue::new(None, T::TYPE_NAME, self.type_name())),
        }
    }

    pub fn get_mut<T: InnerAsRefMut>(&mut self) -> Result<&mut T, UnexpectedValue> {
        let found = self.type_name();
        T::json_value_as_mut(self).ok_or_else(|| UnexpectedValue::new(None, T::TYPE_NAME, found))
    }

    /// True iff the active variant carries a `T`.
    pub fn is<T: InnerAsRef>(&self) -> bool {
        T::json_value_as(self).is_some()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "bool",
            JsonValue::Int(_) => "int",
            JsonValue::Double(_) => "double",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    /// Numeric view of an `Int` or `Double`. Large integers lose precision.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            JsonValue::Int(n) => Some(n as f64),
            JsonValue::Double(n) => Some(n),
            _ => None,
        }
    }

    is_xxx!(is_null, JsonValue::Null);
    is_xxx!(is_bool, JsonValue::Bool(_));
    is_xxx!(is_int, JsonValue::Int(_));
    is_xxx!(is_double, JsonValue::Double(_));
    is_xxx!(is_number, JsonValue::Int(_) | JsonValue::Double(_));
    is_xxx!(is_string, JsonValue::String(_));
    is_xxx!(is_array, JsonValue::Array(_));
    is_xxx!(is_object, JsonValue::Object(_));
}

macro_rules! impl_from {
    ($from:ty, $v:ident => $val:expr) => {
        impl From<$from> for JsonValue {
            fn from($v: $from) -> Self {
                $val
            }
        }
    };
}

impl_from!((), _v => JsonValue::Null);
impl_from!(bool, b => JsonValue::Bool(b));
impl_from!(i64, n => JsonValue::Int(n));
impl_from!(i32, n => JsonValue::Int(i64::from(n)));
impl_from!(f64, n => JsonValue::Double(n));
impl_from!(String, s => JsonValue::String(s));
impl_from!(&str, s => JsonValue::String(s.to_owned()));
impl_from!(Vec<JsonValue>, a => JsonValue::Array(a));
impl_from!(Map, m => JsonValue::Object(m));

impl<'a> Index<&'a str> for JsonValue {
    type Output = JsonValue;

    /// # Panics
    ///
    /// Panics if `self` is not an object or has no such key. Use [`JsonValue::get`] for
    /// checked access.
    fn index(&self, key: &'a str) -> &Self::Output {
        let obj = match self {
            JsonValue::Object(o) => o,
            _ => panic!(
                "Attempted to access to an object with key '{}' but actually it was {:?}",
                key, self
            ),
        };

        match obj.get(key) {
            Some(json) => json,
            None => panic!("Key '{}' was not found in {:?}", key, self),
        }
    }
}

impl Index<usize> for JsonValue {
    type Output = JsonValue;

    fn index(&self, index: usize) -> &'_ Self::Output {
        let array = match self {
            JsonValue::Array(a) => a,
            _ => panic!(
                "Attempted to access to an array with index {} but actually the value was {:?}",
                index, self,
            ),
        };
        &array[index]
    }
}

impl<'a> IndexMut<&'a str> for JsonValue {
    fn index_mut(&mut self, key: &'a str) -> &mut Self::Output {
        let obj = match self {
            JsonValue::Object(o) => o,
            _ => panic!(
                "Attempted to access to an object with key '{}' but actually it was {:?}",
                key, self
            ),
        };

        if let Some(json) = obj.get_mut(key) {
            json
        } else {
            panic!("Key '{}' was not found in object", key)
        }
    }
}

impl IndexMut<usize> for JsonValue {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let array = match self {
            JsonValue::Array(a) => a,
            _ => panic!(
                "Attempted to access to an array with index {} but actually the value was {:?}",
                index, self,
            ),
        };

        &mut array[index]
    }
}

/// A value was accessed or converted as a variant it does not hold.
#[derive(Debug)]
pub struct UnexpectedValue {
    value: Option<JsonValue>,
    expected: &'static str,
    found: &'static str,
}

impl UnexpectedValue {
    fn new(value: Option<JsonValue>, expected: &'static str, found: &'static str) -> Self {
        UnexpectedValue {
            value,
            expected,
            found,
        }
    }

    pub fn expected(&self) -> &'static str {
        self.expected
    }

    pub fn found(&self) -> &'static str {
        self.found
    }

    /// Gives back the rejected value of a failed `TryFrom` conversion. Borrowing accessors
    /// don't carry one.
    pub fn into_value(self) -> Option<JsonValue> {
        self.value
    }
}

impl fmt::Display for UnexpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(
                f,
                "Unexpected JSON value: {:?}. Expected {} value",
                v, self.expected
            ),
            None => write!(
                f,
                "Unexpected JSON {} value. Expected {} value",
                self.found, self.expected
            ),
        }
    }
}

impl std::error::Error for UnexpectedValue {}

macro_rules! impl_try_from {
    ($ty:ty, $pat:pat => $val:expr) => {
        impl TryFrom<JsonValue> for $ty {
            type Error = UnexpectedValue;

            fn try_from(value: JsonValue) -> Result<$ty, UnexpectedValue> {
                match value {
                    $pat => Ok($val),
                    v => {
                        let found = v.type_name();
                        Err(UnexpectedValue::new(
                            Some(v),
                            <$ty as InnerAsRef>::TYPE_NAME,
                            found,
                        ))
                    }
                }
            }
        }
    };
}

impl_try_from!((), JsonValue::Null => ());
impl_try_from!(bool, JsonValue::Bool(b) => b);
impl_try_from!(i64, JsonValue::Int(n) => n);
impl_try_from!(f64, JsonValue::Double(n) => n);
impl_try_from!(String, JsonValue::String(s) => s);
impl_try_from!(Vec<JsonValue>, JsonValue::Array(a) => a);
impl_try_from!(Map, JsonValue::Object(o) => o);

#[cfg(test)]
mod test {
    use super::*;

    fn sample_object() -> JsonValue {
        let mut m = Map::default();
        m.insert("work".to_string(), JsonValue::Int(996));
        m.insert(
            "school".to_string(),
            JsonValue::Array(vec![JsonValue::Int(985), JsonValue::from("mit")]),
        );
        JsonValue::Object(m)
    }

    #[test]
    fn test_is_matches_only_active_variant() {
        let v = JsonValue::Double(2.75);
        assert!(v.is::<f64>());
        assert!(!v.is::<i64>());
        assert!(!v.is::<()>());
        assert!(JsonValue::Null.is::<()>());
        assert!(JsonValue::from(true).is::<bool>());
        assert!(sample_object().is::<Map>());
    }

    #[test]
    fn test_get_reports_mismatch() {
        let v = JsonValue::from("hello");
        assert_eq!(v.get::<String>().unwrap(), "hello");

        let err = v.get::<Vec<JsonValue>>().unwrap_err();
        assert_eq!(err.expected(), "array");
        assert_eq!(err.found(), "string");
        assert!(err.into_value().is_none());
    }

    #[test]
    fn test_get_mut_updates_payload() {
        let mut v = sample_object();
        v.get_mut::<Map>()
            .unwrap()
            .insert("age".to_string(), JsonValue::Int(35));
        *v["work"].get_mut::<i64>().unwrap() = 955;

        assert_eq!(v["age"], JsonValue::Int(35));
        assert_eq!(v["work"], JsonValue::Int(955));
        assert!(v["work"].get_mut::<f64>().is_err());
    }

    #[test]
    fn test_index_into_nested_values() {
        let v = sample_object();
        assert_eq!(v["school"][1], JsonValue::String("mit".to_string()));
        assert_eq!(v["school"][0].as_f64(), Some(985.0));
    }

    #[test]
    #[should_panic(expected = "was not found")]
    fn test_index_missing_key_panics() {
        let v = sample_object();
        let _ = &v["salary"];
    }

    #[test]
    fn test_try_from_gives_back_rejected_value() {
        let n: i64 = JsonValue::Int(42).try_into().unwrap();
        assert_eq!(n, 42);

        let err = String::try_from(JsonValue::Int(42)).unwrap_err();
        assert_eq!(err.to_string(), "Unexpected JSON value: Int(42). Expected string value");
        assert_eq!(err.into_value(), Some(JsonValue::Int(42)));
    }

    #[test]
    fn test_type_predicates() {
        assert!(JsonValue::Int(1).is_number());
        assert!(JsonValue::Double(1.5).is_number());
        assert!(!JsonValue::from("1").is_number());
        assert!(JsonValue::from(()).is_null());
        assert!(JsonValue::from(vec![]).is_array());
        assert_eq!(JsonValue::from(Map::default()).type_name(), "object");
    }
}
