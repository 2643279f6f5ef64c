//! Conversion between application values and stored bytes
//!
//! The encoding rule is fixed:
//!
//! - text (`str`, `String`) is stored as its UTF-8 bytes,
//! - bytes (`[u8]`, `Vec<u8>`) are stored unchanged,
//! - numbers and booleans are stored in their textual form,
//! - anything else goes through the cache's [`Serializer`] when wrapped in
//!   [`Structured`].
//!
//! Nothing about the original type is recorded next to the value, so the
//! reader picks the target type when decoding.

use serde::{de::DeserializeOwned, Serialize};

use crate::{Result, Serializer};

/// A value that can be written to the store
pub trait Encode {
    /// Produce the stored byte form of `self`
    fn encode<S: Serializer>(&self, serializer: &S) -> Result<Vec<u8>>;
}

impl Encode for str {
    fn encode<S: Serializer>(&self, _serializer: &S) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl Encode for String {
    fn encode<S: Serializer>(&self, serializer: &S) -> Result<Vec<u8>> {
        self.as_str().encode(serializer)
    }
}

impl Encode for [u8] {
    fn encode<S: Serializer>(&self, _serializer: &S) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl Encode for Vec<u8> {
    fn encode<S: Serializer>(&self, serializer: &S) -> Result<Vec<u8>> {
        self.as_slice().encode(serializer)
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode<S: Serializer>(&self, serializer: &S) -> Result<Vec<u8>> {
        self.as_slice().encode(serializer)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<S: Serializer>(&self, serializer: &S) -> Result<Vec<u8>> {
        (**self).encode(serializer)
    }
}

macro_rules! impl_encode_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode<S: Serializer>(&self, _serializer: &S) -> Result<Vec<u8>> {
                    Ok(self.to_string().into_bytes())
                }
            }
        )*
    };
}

impl_encode_display!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool
);

/// Wrapper that stores a value through the cache's [`Serializer`]
///
/// ```
/// use rcache_core::{Encode, JsonSerializer, Structured};
///
/// #[derive(serde::Serialize)]
/// struct User {
///     name: String,
/// }
///
/// let bytes = Structured(User { name: "Ann".into() })
///     .encode(&JsonSerializer)
///     .unwrap();
/// assert_eq!(bytes, br#"{"name":"Ann"}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Structured<T>(pub T);

impl<T: Serialize> Encode for Structured<T> {
    fn encode<S: Serializer>(&self, serializer: &S) -> Result<Vec<u8>> {
        serializer.serialize(&self.0)
    }
}

/// Parse stored bytes into `T`
pub fn decode<T, S>(bytes: &[u8], serializer: &S) -> Result<T>
where
    T: DeserializeOwned,
    S: Serializer,
{
    serializer.deserialize(bytes)
}
