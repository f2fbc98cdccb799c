use hearth_utils::parse::{
    parse_channel_mention, parse_flag, parse_user_mention, split_token_spans, split_tokens,
};

use crate::command::{ArgumentDecl, ArgumentKind};
use crate::error::ArgumentError;

/// A bound argument value.
///
/// `Unset` marks an optional argument that was not supplied, which is not the
/// same as an empty string (`""` can be passed explicitly with quotes).
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Unset,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(u64),
    Channel(u64),
}

static UNSET: ArgValue = ArgValue::Unset;

impl ArgValue {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_user_id(&self) -> Option<u64> {
        match self {
            Self::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_channel_id(&self) -> Option<u64> {
        match self {
            Self::Channel(id) => Some(*id),
            _ => None,
        }
    }
}

/// Values bound to a command's argument schema, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, ArgValue)>,
}

impl Arguments {
    /// Value at `index`, or [`ArgValue::Unset`] past the end of the schema.
    pub fn get(&self, index: usize) -> &ArgValue {
        self.values
            .get(index)
            .map_or(&UNSET, |(_, value)| value)
    }

    pub fn by_name(&self, name: &str) -> &ArgValue {
        self.values
            .iter()
            .find(|(declared, _)| declared == name)
            .map_or(&UNSET, |(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Split message text into argument tokens.
pub fn tokenize(raw: &str) -> Vec<String> {
    split_tokens(raw)
}

/// Message text after the prefix, tokenized, with the raw text kept so a
/// [`ArgumentKind::Rest`] argument can take it verbatim.
#[derive(Clone, Debug)]
pub struct ArgInput<'a> {
    raw: &'a str,
    tokens: Vec<String>,
    starts: Vec<usize>,
}

impl<'a> ArgInput<'a> {
    pub fn new(raw: &'a str) -> Self {
        let (starts, tokens) = split_token_spans(raw).into_iter().unzip();
        Self {
            raw,
            tokens,
            starts,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Raw text from token `index` to the end, trailing whitespace trimmed.
    fn rest_from(&self, index: usize) -> &'a str {
        self.starts
            .get(index)
            .map_or("", |&start| self.raw[start..].trim_end())
    }
}

/// Bind the tokens from index `first` onwards to a schema.
///
/// Each declaration consumes one token, except [`ArgumentKind::Rest`] which
/// takes the remaining raw text unchanged. Tokens beyond the schema are
/// ignored.
pub fn bind(
    input: &ArgInput<'_>,
    first: usize,
    schema: &[ArgumentDecl],
) -> Result<Arguments, ArgumentError> {
    let tokens = input.tokens();
    let mut values = Vec::with_capacity(schema.len());
    let mut cursor = first.min(tokens.len());

    for decl in schema {
        let Some(token) = tokens.get(cursor) else {
            if decl.required {
                return Err(ArgumentError::Missing {
                    name: decl.name.clone(),
                });
            }
            values.push((decl.name.clone(), ArgValue::Unset));
            continue;
        };

        let value = if decl.kind == ArgumentKind::Rest {
            let rest = input.rest_from(cursor);
            cursor = tokens.len();
            ArgValue::String(rest.to_owned())
        } else {
            cursor += 1;
            convert(decl, token)?
        };

        values.push((decl.name.clone(), value));
    }

    Ok(Arguments { values })
}

fn convert(decl: &ArgumentDecl, token: &str) -> Result<ArgValue, ArgumentError> {
    let value = match decl.kind {
        ArgumentKind::String | ArgumentKind::Rest => Some(ArgValue::String(token.to_owned())),
        ArgumentKind::Integer => token.parse::<i64>().ok().map(ArgValue::Integer),
        ArgumentKind::Number => token
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(ArgValue::Number),
        ArgumentKind::Boolean => parse_flag(token).map(ArgValue::Boolean),
        ArgumentKind::User => parse_user_mention(token).map(ArgValue::User),
        ArgumentKind::Channel => parse_channel_mention(token).map(ArgValue::Channel),
    };

    value.ok_or_else(|| ArgumentError::Invalid {
        name: decl.name.clone(),
        token: token.to_owned(),
    })
}
