//! Precision-preserving JSON codec.
//!
//! Numbers are decoded as literal tokens (serde_json's `arbitrary_precision`)
//! so large integers and long decimals written in policy input survive a
//! decode/encode cycle with their exact digit sequence.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Broad category of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The input is not a JSON value.
    Malformed,
    /// A valid value was followed by another token.
    TrailingData,
}

/// Errors produced while decoding JSON.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("decode error: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("decode error: unexpected end of input")]
    Empty,

    #[error("invalid character '{token}' after top-level value")]
    TrailingData { token: String, offset: usize },
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::Malformed(_) | DecodeError::Empty => DecodeErrorKind::Malformed,
            DecodeError::TrailingData { .. } => DecodeErrorKind::TrailingData,
        }
    }
}

/// Error produced while encoding a value to JSON.
#[derive(Error, Debug)]
#[error("encode error: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Errors from [`round_trip`] and [`to_structural`].
#[derive(Error, Debug)]
pub enum RoundTripError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Error from [`parse_parameter`].
#[derive(Error, Debug)]
#[error("parameter contains malformed input document: {0}")]
pub struct ParameterError(#[source] pub DecodeError);

/// Decode exactly one JSON document into `T`.
///
/// Anything other than whitespace after the first value is rejected with
/// [`DecodeError::TrailingData`], naming the offending token.
pub fn unmarshal_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<T>();

    let value = match stream.next() {
        Some(result) => result?,
        None => return Err(DecodeError::Empty),
    };

    let consumed = stream.byte_offset();
    let rest = &bytes[consumed..];
    if let Some(start) = rest.iter().position(|b| !is_json_whitespace(*b)) {
        return Err(DecodeError::TrailingData {
            token: next_token(&rest[start..]),
            offset: consumed + start,
        });
    }

    Ok(value)
}

/// Decode exactly one JSON document into a structural value.
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    unmarshal_json(bytes)
}

/// Encode a value as compact JSON.
pub fn marshal_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(value)?)
}

/// Encode `value` and decode the bytes back into it.
///
/// On failure `value` may or may not have been replaced; callers must not
/// rely on its contents.
pub fn round_trip<T>(value: &mut T) -> Result<(), RoundTripError>
where
    T: Serialize + DeserializeOwned,
{
    let bytes = marshal_json(value)?;
    *value = unmarshal_json(&bytes)?;
    Ok(())
}

/// A host value that may sit behind one level of ownership.
#[derive(Debug)]
pub enum Reference<'a, T: ?Sized> {
    Borrowed(&'a T),
    Owned(Box<T>),
}

impl<T: ?Sized> Reference<'_, T> {
    /// The underlying value, whichever way it is held.
    pub fn dereference(&self) -> &T {
        match self {
            Reference::Borrowed(value) => value,
            Reference::Owned(value) => value,
        }
    }
}

impl<'a, T: ?Sized> From<&'a T> for Reference<'a, T> {
    fn from(value: &'a T) -> Self {
        Reference::Borrowed(value)
    }
}

impl<T> From<Box<T>> for Reference<'_, T> {
    fn from(value: Box<T>) -> Self {
        Reference::Owned(value)
    }
}

/// Convert a host value into a structural value by round-tripping it
/// through JSON.
pub fn to_structural<'a, T>(value: impl Into<Reference<'a, T>>) -> Result<Value, RoundTripError>
where
    T: Serialize + ?Sized + 'a,
{
    let reference = value.into();
    let bytes = marshal_json(reference.dereference())?;
    Ok(decode(&bytes)?)
}

/// Parse an ad hoc string parameter (for example a query argument) into a
/// structural value.
pub fn parse_parameter(raw: &str) -> Result<Value, ParameterError> {
    decode(raw.as_bytes()).map_err(ParameterError)
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'{' | b'}' | b'[' | b']' | b',' | b':' | b'"')
}

/// The lexical token at the start of `rest`.
///
/// A string token is returned without its quotes.
fn next_token(rest: &[u8]) -> String {
    let token = match rest.first() {
        Some(b'"') => {
            let body = &rest[1..];
            let mut escaped = false;
            let mut end = body.len();
            for (i, b) in body.iter().enumerate() {
                match b {
                    b'\\' if !escaped => escaped = true,
                    b'"' if !escaped => {
                        end = i;
                        break;
                    }
                    _ => escaped = false,
                }
            }
            &body[..end]
        }
        Some(b) if is_delimiter(*b) => &rest[..1],
        _ => {
            let end = rest
                .iter()
                .position(|b| is_json_whitespace(*b) || is_delimiter(*b))
                .unwrap_or(rest.len());
            &rest[..end]
        }
    };
    String::from_utf8_lossy(token).into_owned()
}

/// Panicking helpers for tests and fixtures.
///
/// Never call these from production code paths; use the `Result`-returning
/// functions instead.
pub mod testing {
    use super::*;

    /// Decode `bytes`, panicking on failure.
    pub fn must_unmarshal_json(bytes: &[u8]) -> Value {
        match decode(bytes) {
            Ok(value) => value,
            Err(e) => panic!("must_unmarshal_json: {e}"),
        }
    }

    /// Encode `value`, panicking on failure.
    pub fn must_marshal_json<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
        match marshal_json(value) {
            Ok(bytes) => bytes,
            Err(e) => panic!("must_marshal_json: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_decode_single_value() {
        let value = decode(br#"{"a": [1, "two", null, true]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, "two", null, true]}));
    }

    #[test]
    fn test_trailing_whitespace_allowed() {
        assert!(decode(b"{\"a\": 1}\n\t  \r\n").is_ok());
    }

    #[test]
    fn test_trailing_garbage_names_token() {
        let err = decode(b"{}garbage").unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::TrailingData);
        match &err {
            DecodeError::TrailingData { token, offset } => {
                assert_eq!(token, "garbage");
                assert_eq!(*offset, 2);
            }
            other => panic!("Expected TrailingData, got {other:?}"),
        }
        assert_eq!(err.to_string(), "invalid character 'garbage' after top-level value");
    }

    #[test]
    fn test_second_document_rejected() {
        let err = decode(b"{\"a\":1} {\"b\":2}").unwrap_err();
        assert!(matches!(err, DecodeError::TrailingData { ref token, .. } if token == "{"));

        let err = decode(b"1 \"next\"").unwrap_err();
        assert!(matches!(err, DecodeError::TrailingData { ref token, .. } if token == "next"));
        assert_eq!(err.to_string(), "invalid character 'next' after top-level value");
    }

    #[test]
    fn test_trailing_string_with_escaped_quote() {
        let err = decode(br#"{} "say \"hi\"" 2"#).unwrap_err();
        match err {
            DecodeError::TrailingData { token, offset } => {
                assert_eq!(token, r#"say \"hi\""#);
                assert_eq!(offset, 3);
            }
            other => panic!("Expected TrailingData, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_input() {
        let err = decode(b"{\"a\": }").unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Malformed);
        assert!(err.to_string().starts_with("decode error"));
    }

    #[test]
    fn test_empty_input() {
        let err = decode(b"   ").unwrap_err();
        assert!(matches!(err, DecodeError::Empty));
        assert_eq!(err.kind(), DecodeErrorKind::Malformed);
    }

    #[test]
    fn test_large_numbers_keep_digits() {
        let input = br#"{"big":123456789012345678901234567890,"pi":3.14159265358979323846264338327950288}"#;
        let value = decode(input).unwrap();
        let encoded = marshal_json(&value).unwrap();
        assert_eq!(encoded, input.to_vec());
    }

    #[test]
    fn test_round_trip_value() {
        let mut value = json!({"n": 1.5, "list": [1, 2]});
        let before = value.clone();
        round_trip(&mut value).unwrap();
        assert_eq!(value, before);
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Request {
        method: String,
        size: u64,
    }

    #[test]
    fn test_round_trip_struct() {
        let mut request = Request { method: "GET".to_string(), size: 42 };
        round_trip(&mut request).unwrap();
        assert_eq!(request, Request { method: "GET".to_string(), size: 42 });
    }

    #[test]
    fn test_to_structural_borrowed_and_owned() {
        let request = Request { method: "POST".to_string(), size: 7 };
        let expected = json!({"method": "POST", "size": 7});

        assert_eq!(to_structural(&request).unwrap(), expected);
        assert_eq!(to_structural(Box::new(request)).unwrap(), expected);
    }

    #[test]
    fn test_dereference() {
        let owned: Reference<'_, str> = Reference::Owned("abc".into());
        assert_eq!(owned.dereference(), "abc");

        let n = 5;
        assert_eq!(*Reference::from(&n).dereference(), 5);
    }

    #[test]
    fn test_parse_parameter() {
        let mask = r#"[{"/input/attributes/request/http/body": [true]}]"#;
        assert!(parse_parameter(mask).unwrap().is_array());

        let err = parse_parameter("{not json").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("parameter contains malformed input document"));
    }

    #[test]
    #[should_panic(expected = "must_unmarshal_json")]
    fn test_must_unmarshal_panics() {
        testing::must_unmarshal_json(b"[1,");
    }
}
