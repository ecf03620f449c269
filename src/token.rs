//! Tokens carried by inbound sequence messages
//!
//! A sequence message is a flat list of OSC arguments. Each argument becomes a
//! [`Token`]: either the group sentinel or an opaque scalar value. Payloads
//! that cannot be read as a flat list of scalars are rejected as a whole.

use rosc::OscType;
use std::fmt;

/// String value that separates groups in a flattened sequence
pub const SENTINEL: &str = "START";

/// One element of a flattened sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Group separator
    Start,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
}

impl Token {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s == SENTINEL {
            Token::Start
        } else {
            Token::Text(s)
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Token::Start)
    }

    /// Numeric view of the token, parsing text when it holds a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Int(i) => Some(*i as f64),
            Token::Float(f) => Some(*f),
            Token::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::Text(s) => Some(s),
            Token::Start => Some(SENTINEL),
            _ => None,
        }
    }

    /// Encode the token as an OSC argument
    pub fn to_osc(&self) -> OscType {
        match self {
            Token::Start => OscType::String(SENTINEL.to_string()),
            Token::Text(s) => OscType::String(s.clone()),
            Token::Int(i) => match i32::try_from(*i) {
                Ok(small) => OscType::Int(small),
                Err(_) => OscType::Long(*i),
            },
            Token::Float(f) => OscType::Float(*f as f32),
            Token::Bool(b) => OscType::Bool(*b),
            Token::Nil => OscType::Nil,
        }
    }
}

/// Text coercion: nil renders empty, numbers render in their shortest form
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Start => write!(f, "{}", SENTINEL),
            Token::Text(s) => write!(f, "{}", s),
            Token::Int(i) => write!(f, "{}", i),
            Token::Float(x) => write!(f, "{}", x),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Nil => Ok(()),
        }
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::text(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::text(s)
    }
}

impl From<i64> for Token {
    fn from(i: i64) -> Self {
        Token::Int(i)
    }
}

impl From<i32> for Token {
    fn from(i: i32) -> Self {
        Token::Int(i as i64)
    }
}

impl From<f64> for Token {
    fn from(f: f64) -> Self {
        Token::Float(f)
    }
}

impl From<bool> for Token {
    fn from(b: bool) -> Self {
        Token::Bool(b)
    }
}

/// Why an inbound payload is not a flat token array
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// An argument was itself an array
    Nested,
    /// An argument type that has no token form
    Unsupported(&'static str),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Nested => write!(f, "nested array argument"),
            PayloadError::Unsupported(kind) => write!(f, "unsupported argument type: {}", kind),
        }
    }
}

impl std::error::Error for PayloadError {}

impl TryFrom<&OscType> for Token {
    type Error = PayloadError;

    fn try_from(arg: &OscType) -> Result<Self, Self::Error> {
        match arg {
            OscType::String(s) => Ok(Token::text(s.as_str())),
            OscType::Char(c) => Ok(Token::text(c.to_string())),
            OscType::Int(i) => Ok(Token::Int(*i as i64)),
            OscType::Long(l) => Ok(Token::Int(*l)),
            OscType::Float(f) => Ok(Token::Float(*f as f64)),
            OscType::Double(d) => Ok(Token::Float(*d)),
            OscType::Bool(b) => Ok(Token::Bool(*b)),
            OscType::Nil => Ok(Token::Nil),
            OscType::Array(_) => Err(PayloadError::Nested),
            OscType::Blob(_) => Err(PayloadError::Unsupported("blob")),
            OscType::Time(_) => Err(PayloadError::Unsupported("timetag")),
            OscType::Color(_) => Err(PayloadError::Unsupported("color")),
            OscType::Midi(_) => Err(PayloadError::Unsupported("midi")),
            OscType::Inf => Err(PayloadError::Unsupported("impulse")),
        }
    }
}

/// Read message arguments as a flat token array.
///
/// A message whose only argument is an OSC array is unwrapped first, so both
/// `/synth "START" "synth" ...` and `/synth ["START" "synth" ...]` are accepted.
pub fn payload_tokens(args: &[OscType]) -> Result<Vec<Token>, PayloadError> {
    let items = match args {
        [OscType::Array(array)] => array.content.as_slice(),
        _ => args,
    };
    items.iter().map(Token::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::OscArray;

    #[test]
    fn test_sentinel_string_becomes_start() {
        assert_eq!(Token::from("START"), Token::Start);
        assert_eq!(Token::from("start"), Token::Text("start".to_string()));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(Token::Int(2).as_number(), Some(2.0));
        assert_eq!(Token::Float(0.5).as_number(), Some(0.5));
        assert_eq!(Token::from("0.25").as_number(), Some(0.25));
        assert_eq!(Token::from("").as_number(), None);
        assert_eq!(Token::Nil.as_number(), None);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(Token::Int(60).to_string(), "60");
        assert_eq!(Token::from("C4").to_string(), "C4");
        assert_eq!(Token::Nil.to_string(), "");
    }

    #[test]
    fn test_flat_payload() {
        let args = vec![
            OscType::String("START".to_string()),
            OscType::String("synth".to_string()),
            OscType::Int(1),
            OscType::Float(0.5),
        ];
        let tokens = payload_tokens(&args).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Start, Token::from("synth"), Token::Int(1), Token::Float(0.5)]
        );
    }

    #[test]
    fn test_single_array_argument_is_unwrapped() {
        let args = vec![OscType::Array(OscArray {
            content: vec![OscType::String("START".to_string()), OscType::Double(2.0)],
        })];
        assert_eq!(payload_tokens(&args).unwrap(), vec![Token::Start, Token::Float(2.0)]);
    }

    #[test]
    fn test_nested_payload_rejected() {
        let args = vec![
            OscType::String("START".to_string()),
            OscType::Array(OscArray { content: vec![] }),
        ];
        assert_eq!(payload_tokens(&args), Err(PayloadError::Nested));
    }

    #[test]
    fn test_blob_payload_rejected() {
        let args = vec![OscType::Blob(vec![1, 2, 3])];
        assert_eq!(payload_tokens(&args), Err(PayloadError::Unsupported("blob")));
    }

    #[test]
    fn test_empty_payload_is_flat() {
        assert_eq!(payload_tokens(&[]).unwrap(), Vec::<Token>::new());
    }

    #[test]
    fn test_large_int_encodes_as_long() {
        assert_eq!(Token::Int(1 << 40).to_osc(), OscType::Long(1 << 40));
        assert_eq!(Token::Int(7).to_osc(), OscType::Int(7));
    }
}
