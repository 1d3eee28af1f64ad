//! Field name syntax
//!
//! A field name is a dot-separated list of segments with an optional
//! bracketed argument, e.g. `evt.num`, `evt.arg[seq]` or `payload.word[2]`.

use crate::error::{Error, Result};
use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{all_consuming, opt, recognize},
    multi::separated_list1,
    sequence::delimited,
};
use std::fmt;

/// A parsed field name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// The dotted name without the argument
    pub name: String,
    /// The bracketed argument, if any
    pub arg: Option<String>,
}

impl FieldRef {
    /// Parse a field name
    pub fn parse(input: &str) -> Result<Self> {
        match all_consuming((field_name, opt(field_arg))).parse(input) {
            Ok((_, (name, arg))) => Ok(Self {
                name: name.to_string(),
                arg: arg.map(str::to_string),
            }),
            Err(e) => Err(Error::InvalidFieldName {
                name: input.to_string(),
                reason: describe(input, e),
            }),
        }
    }

    /// The argument interpreted as a numeric index
    pub fn arg_index(&self) -> Option<u64> {
        self.arg.as_deref().and_then(|a| a.parse().ok())
    }

    /// First segment of the name (`evt` in `evt.num`)
    pub fn class(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}[{}]", self.name, arg),
            None => f.write_str(&self.name),
        }
    }
}

fn segment(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)
}

fn field_name(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), segment)).parse(input)
}

fn field_arg(input: &str) -> IResult<&str, &str> {
    delimited(
        char('['),
        take_while1(|c: char| c != '[' && c != ']'),
        char(']'),
    )
    .parse(input)
}

fn describe(input: &str, err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let pos = input.len() - e.input.len();
            if input.is_empty() {
                "empty field name".to_string()
            } else if e.input.is_empty() {
                "unexpected end of field name".to_string()
            } else {
                format!("unexpected input at position {}", pos)
            }
        }
        nom::Err::Incomplete(_) => "unexpected end of field name".to_string(),
    }
}
