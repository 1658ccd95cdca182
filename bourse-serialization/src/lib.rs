// Copyright (c) 2024 BOURSE LABS

//! Binary serialization primitives shared by every wire-visible type of the ledger.
//!
//! Serialization is push-based (`Serializer` appends to a buffer) and
//! deserialization is built on `nom` parsers so that composite types can be
//! assembled with `tuple`, `context` and friends while keeping precise error traces.
//! Every integer is encoded as an unsigned LEB128 varint; signed integers are zigzag-encoded first.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

use displaydoc::Display;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::{IResult, Parser};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

#[cfg(test)]
use paste as _;

/// Errors raised while serializing a value
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// String too big to be serialized: {0}
    StringTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Trait for types that push the binary representation of a `T` into a buffer
pub trait Serializer<T> {
    /// Appends the binary representation of `value` to `buffer`
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Trait for types that parse a `T` out of a byte buffer
pub trait Deserializer<T> {
    /// Parses a `T` from the front of `buffer` and returns the rest of the buffer
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Error type accumulating the `nom` context trace of a failed deserialization
#[derive(Debug)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], String)>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, kind.description().to_string())],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, kind.description().to_string()));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx.to_string()));
        other
    }
}

impl fmt::Display for DeserializeError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trace: Vec<&str> = self.errors.iter().rev().map(|(_, e)| e.as_str()).collect();
        write!(f, "{}", trace.join(" / "))
    }
}

/// Builds the `nom` error returned when a value falls outside of its allowed range
fn out_of_range<'a, E: ParseError<&'a [u8]>>(input: &'a [u8]) -> nom::Err<E> {
    nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify))
}

macro_rules! gen_varint {
    ($($type:ident, $ser:ident, $deser:ident, $buffer:ident);* $(;)?) => {
        $(
            #[doc = concat!("Serializer for `", stringify!($type), "` as an unsigned varint")]
            #[derive(Debug, Clone, Default)]
            pub struct $ser;

            impl $ser {
                #[doc = concat!("Creates a new `", stringify!($ser), "`")]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$type> for $ser {
                fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    buffer.extend_from_slice(unsigned_varint::encode::$type(
                        *value,
                        &mut unsigned_varint::encode::$buffer(),
                    ));
                    Ok(())
                }
            }

            #[doc = concat!("Deserializer for `", stringify!($type), "` varints with an inclusive/exclusive range check")]
            #[derive(Debug, Clone)]
            pub struct $deser {
                range: (Bound<$type>, Bound<$type>),
            }

            impl $deser {
                #[doc = concat!("Creates a new `", stringify!($deser), "` accepting values within `(min, max)`")]
                pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Deserializer<$type> for $deser {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $type, E> {
                    context(concat!("Failed ", stringify!($type), " deserialization"), |input: &'a [u8]| {
                        let (value, rest) = unsigned_varint::decode::$type(input)
                            .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Fail)))?;
                        if !self.range.contains(&value) {
                            return Err(out_of_range(input));
                        }
                        Ok((rest, value))
                    })
                    .parse(buffer)
                }
            }
        )*
    };
}

gen_varint! {
    u16, U16VarIntSerializer, U16VarIntDeserializer, u16_buffer;
    u32, U32VarIntSerializer, U32VarIntDeserializer, u32_buffer;
    u64, U64VarIntSerializer, U64VarIntDeserializer, u64_buffer;
    u128, U128VarIntSerializer, U128VarIntDeserializer, u128_buffer;
}

/// Serializer for `i64` values (zigzag then unsigned varint)
#[derive(Debug, Clone, Default)]
pub struct I64VarIntSerializer {
    inner: U64VarIntSerializer,
}

impl I64VarIntSerializer {
    /// Creates a new `I64VarIntSerializer`
    pub const fn new() -> Self {
        Self {
            inner: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<i64> for I64VarIntSerializer {
    fn serialize(&self, value: &i64, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let zigzag = ((*value << 1) ^ (*value >> 63)) as u64;
        self.inner.serialize(&zigzag, buffer)
    }
}

/// Deserializer for zigzag-encoded `i64` values
#[derive(Debug, Clone)]
pub struct I64VarIntDeserializer {
    inner: U64VarIntDeserializer,
    range: (Bound<i64>, Bound<i64>),
}

impl I64VarIntDeserializer {
    /// Creates a new `I64VarIntDeserializer` accepting values within `(min, max)`
    pub const fn new(min: Bound<i64>, max: Bound<i64>) -> Self {
        Self {
            inner: U64VarIntDeserializer::new(Bound::Unbounded, Bound::Unbounded),
            range: (min, max),
        }
    }
}

impl Deserializer<i64> for I64VarIntDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], i64, E> {
        context("Failed i64 deserialization", |input: &'a [u8]| {
            let (rest, zigzag) = self.inner.deserialize::<E>(input)?;
            let value = ((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64);
            if !self.range.contains(&value) {
                return Err(out_of_range(input));
            }
            Ok((rest, value))
        })
        .parse(buffer)
    }
}

/// Serializer for booleans (one byte, 0 or 1)
#[derive(Debug, Clone, Default)]
pub struct BoolSerializer;

impl BoolSerializer {
    /// Creates a new `BoolSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<bool> for BoolSerializer {
    fn serialize(&self, value: &bool, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(u8::from(*value));
        Ok(())
    }
}

/// Deserializer for booleans
#[derive(Debug, Clone, Default)]
pub struct BoolDeserializer;

impl BoolDeserializer {
    /// Creates a new `BoolDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<bool> for BoolDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], bool, E> {
        context("Failed bool deserialization", |input: &'a [u8]| match input.first() {
            Some(0) => Ok((&input[1..], false)),
            Some(1) => Ok((&input[1..], true)),
            Some(_) => Err(out_of_range(input)),
            None => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Eof))),
        })
        .parse(buffer)
    }
}

/// Serializer for byte vectors prefixed by their varint length
#[derive(Debug, Clone, Default)]
pub struct VecU8Serializer {
    len_serializer: U64VarIntSerializer,
}

impl VecU8Serializer {
    /// Creates a new `VecU8Serializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Vec<u8>> for VecU8Serializer {
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u64 = value.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many bytes in vector: {}", err))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        buffer.extend_from_slice(value);
        Ok(())
    }
}

/// Deserializer for length-prefixed byte vectors
#[derive(Debug, Clone)]
pub struct VecU8Deserializer {
    len_deserializer: U64VarIntDeserializer,
}

impl VecU8Deserializer {
    /// Creates a new `VecU8Deserializer` accepting lengths within `(min, max)`
    pub const fn new(min_length: Bound<u64>, max_length: Bound<u64>) -> Self {
        Self {
            len_deserializer: U64VarIntDeserializer::new(min_length, max_length),
        }
    }
}

impl Deserializer<Vec<u8>> for VecU8Deserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        context("Failed Vec<u8> deserialization", |input: &'a [u8]| {
            let (rest, len) = self.len_deserializer.deserialize::<E>(input)?;
            let len = usize::try_from(len).map_err(|_| out_of_range(input))?;
            if rest.len() < len {
                return Err(nom::Err::Error(E::from_error_kind(rest, ErrorKind::Eof)));
            }
            Ok((&rest[len..], rest[..len].to_vec()))
        })
        .parse(buffer)
    }
}

/// Serializer for UTF-8 strings prefixed by their varint byte length
#[derive(Debug, Clone, Default)]
pub struct StringSerializer {
    bytes_serializer: VecU8Serializer,
}

impl StringSerializer {
    /// Creates a new `StringSerializer`
    pub const fn new() -> Self {
        Self {
            bytes_serializer: VecU8Serializer::new(),
        }
    }
}

impl Serializer<String> for StringSerializer {
    fn serialize(&self, value: &String, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.bytes_serializer
            .serialize(&value.as_bytes().to_vec(), buffer)
    }
}

/// Deserializer for length-prefixed UTF-8 strings
#[derive(Debug, Clone)]
pub struct StringDeserializer {
    bytes_deserializer: VecU8Deserializer,
}

impl StringDeserializer {
    /// Creates a new `StringDeserializer` accepting at most `max_length` bytes
    pub const fn new(max_length: u64) -> Self {
        Self {
            bytes_deserializer: VecU8Deserializer::new(
                Bound::Included(0),
                Bound::Included(max_length),
            ),
        }
    }
}

impl Deserializer<String> for StringDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        context("Failed String deserialization", |input: &'a [u8]| {
            let (rest, bytes) = self.bytes_deserializer.deserialize::<E>(input)?;
            let value = String::from_utf8(bytes)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Char)))?;
            Ok((rest, value))
        })
        .parse(buffer)
    }
}

/// Serializer for `Option<T>`: a presence byte followed by the value if present
#[derive(Debug, Clone)]
pub struct OptionSerializer<T, ST: Serializer<T>> {
    presence_serializer: BoolSerializer,
    inner: ST,
    phantom_t: PhantomData<T>,
}

impl<T, ST: Serializer<T>> OptionSerializer<T, ST> {
    /// Creates a new `OptionSerializer` wrapping `inner`
    pub const fn new(inner: ST) -> Self {
        Self {
            presence_serializer: BoolSerializer::new(),
            inner,
            phantom_t: PhantomData,
        }
    }
}

impl<T, ST: Serializer<T>> Serializer<Option<T>> for OptionSerializer<T, ST> {
    fn serialize(&self, value: &Option<T>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        match value {
            Some(inner) => {
                self.presence_serializer.serialize(&true, buffer)?;
                self.inner.serialize(inner, buffer)
            }
            None => self.presence_serializer.serialize(&false, buffer),
        }
    }
}

/// Deserializer for `Option<T>`
#[derive(Debug, Clone)]
pub struct OptionDeserializer<T, DT: Deserializer<T>> {
    presence_deserializer: BoolDeserializer,
    inner: DT,
    phantom_t: PhantomData<T>,
}

impl<T, DT: Deserializer<T>> OptionDeserializer<T, DT> {
    /// Creates a new `OptionDeserializer` wrapping `inner`
    pub const fn new(inner: DT) -> Self {
        Self {
            presence_deserializer: BoolDeserializer::new(),
            inner,
            phantom_t: PhantomData,
        }
    }
}

impl<T, DT: Deserializer<T>> Deserializer<Option<T>> for OptionDeserializer<T, DT> {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Option<T>, E> {
        context("Failed Option deserialization", |input: &'a [u8]| {
            let (rest, present) = self.presence_deserializer.deserialize::<E>(input)?;
            if present {
                let (rest, value) = self.inner.deserialize::<E>(rest)?;
                Ok((rest, Some(value)))
            } else {
                Ok((rest, None))
            }
        })
        .parse(buffer)
    }
}
