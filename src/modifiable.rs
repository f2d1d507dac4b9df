//! Field values with runtime-attachable overrides.
//!
//! A [`Modifiable`] is created unset when a message is constructed. A parser
//! or preparator writes its base value once. Attack code may attach a
//! [`Modification`] at any time before serialization, and the serializer
//! reads the effective value through [`Modifiable::get`].

use std::fmt;
use std::ops::BitXor;
use std::sync::Arc;

use crate::Error;

type TransformFn<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

/// An override applied to a field's base value.
#[derive(Clone)]
pub enum Modification<T> {
    /// Replace the value outright. Works on an unset field.
    Explicit(T),
    /// Derive the effective value from the base value.
    Transform(TransformFn<T>),
}

impl<T> Modification<T> {
    pub fn explicit(value: T) -> Self {
        Modification::Explicit(value)
    }

    pub fn transform(f: impl Fn(&T) -> T + Send + Sync + 'static) -> Self {
        Modification::Transform(Arc::new(f))
    }
}

impl<T: Clone> Modification<T> {
    fn apply(&self, base: Option<&T>) -> Result<T, Error> {
        match self {
            Modification::Explicit(v) => Ok(v.clone()),
            Modification::Transform(f) => base.map(|b| f(b)).ok_or(Error::UnsetValue),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Modification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modification::Explicit(v) => f.debug_tuple("Explicit").field(v).finish(),
            Modification::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Unsigned wire integers that take arithmetic overrides.
pub trait WireInt:
    sealed::Sealed + Copy + BitXor<Output = Self> + Send + Sync + 'static
{
    fn wrapping_add(self, other: Self) -> Self;
}

macro_rules! wire_int {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl WireInt for $t {
                fn wrapping_add(self, other: Self) -> Self {
                    <$t>::wrapping_add(self, other)
                }
            }
        )*
    };
}

wire_int!(u8, u16, u32, u64, usize);

impl<T: WireInt> Modification<T> {
    /// Wrapping addition to the base value.
    pub fn add(delta: T) -> Self {
        Self::transform(move |v: &T| v.wrapping_add(delta))
    }

    pub fn xor(mask: T) -> Self {
        Self::transform(move |v: &T| *v ^ mask)
    }
}

impl Modification<Vec<u8>> {
    /// XOR `mask` into the base value, starting at byte 0. Bytes beyond the
    /// end of the base value are ignored.
    pub fn xor_bytes(mask: Vec<u8>) -> Self {
        Self::transform(move |v: &Vec<u8>| {
            let mut out = v.clone();
            for (b, m) in out.iter_mut().zip(mask.iter()) {
                *b ^= m;
            }
            out
        })
    }

    pub fn append(suffix: Vec<u8>) -> Self {
        Self::transform(move |v: &Vec<u8>| {
            let mut out = v.clone();
            out.extend_from_slice(&suffix);
            out
        })
    }

    pub fn prepend(prefix: Vec<u8>) -> Self {
        Self::transform(move |v: &Vec<u8>| {
            let mut out = prefix.clone();
            out.extend_from_slice(v);
            out
        })
    }

    pub fn truncate(len: usize) -> Self {
        Self::transform(move |v: &Vec<u8>| v[..len.min(v.len())].to_vec())
    }

    /// Remove `count` bytes starting at `start`, clamped to the base value.
    pub fn delete(start: usize, count: usize) -> Self {
        Self::transform(move |v: &Vec<u8>| {
            let start = start.min(v.len());
            let end = start.saturating_add(count).min(v.len());
            let mut out = v[..start].to_vec();
            out.extend_from_slice(&v[end..]);
            out
        })
    }

    pub fn insert(pos: usize, bytes: Vec<u8>) -> Self {
        Self::transform(move |v: &Vec<u8>| {
            let pos = pos.min(v.len());
            let mut out = v[..pos].to_vec();
            out.extend_from_slice(&bytes);
            out.extend_from_slice(&v[pos..]);
            out
        })
    }
}

/// A wire field: a base value plus an optional override.
#[derive(Clone)]
pub struct Modifiable<T> {
    base: Option<T>,
    modification: Option<Modification<T>>,
}

impl<T> Default for Modifiable<T> {
    fn default() -> Self {
        Modifiable {
            base: None,
            modification: None,
        }
    }
}

impl<T> From<T> for Modifiable<T> {
    fn from(value: T) -> Self {
        Modifiable {
            base: Some(value),
            modification: None,
        }
    }
}

impl<T: Clone> Modifiable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective value: the override applied to the base, or the base alone.
    pub fn get(&self) -> Result<T, Error> {
        match &self.modification {
            Some(m) => m.apply(self.base.as_ref()),
            None => self.base.clone().ok_or(Error::UnsetValue),
        }
    }

    /// Whether [`get`](Self::get) would yield a value.
    pub fn is_set(&self) -> bool {
        match &self.modification {
            Some(Modification::Explicit(_)) => true,
            _ => self.base.is_some(),
        }
    }

    pub fn base(&self) -> Option<&T> {
        self.base.as_ref()
    }

    pub fn set_base(&mut self, value: T) {
        self.base = Some(value);
    }

    pub fn clear_base(&mut self) {
        self.base = None;
    }

    /// Attach an override, replacing any previous one.
    pub fn set_modification(&mut self, modification: Modification<T>) {
        self.modification = Some(modification);
    }

    pub fn clear_modification(&mut self) {
        self.modification = None;
    }

    pub fn modification(&self) -> Option<&Modification<T>> {
        self.modification.as_ref()
    }

    pub fn is_modified(&self) -> bool {
        self.modification.is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Modifiable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.modification {
            None => write!(f, "{:?}", self.base),
            Some(m) => f
                .debug_struct("Modifiable")
                .field("base", &self.base)
                .field("modification", m)
                .finish(),
        }
    }
}
