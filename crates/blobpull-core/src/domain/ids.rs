//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID
//! 1 回の pull 実行（invocation）をログ上で追跡するための ID。
//! `Id<T>` の T は PhantomData のマーカー型で、実行時にはメモリを消費しない。
//!
//! ビルド番号は host 側の採番をそのまま使うので `BuildNumber` は u32 の newtype。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "inv-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Invocation のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Invocation {}

impl IdMarker for Invocation {
    fn prefix() -> &'static str {
        "inv-"
    }
}

/// Identifier of one pull invocation (select -> resolve -> filter -> download -> report).
pub type InvocationId = Id<Invocation>;

/// Build number as assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildNumber(u32);

impl BuildNumber {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for BuildNumber {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BuildNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_id_has_prefix() {
        let ulid = Ulid::new();
        let id = InvocationId::from_ulid(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert!(id.to_string().starts_with("inv-"));
    }

    #[test]
    fn invocation_id_is_as_small_as_ulid() {
        use std::mem::size_of;
        assert_eq!(size_of::<InvocationId>(), size_of::<Ulid>());
    }

    #[test]
    fn build_number_parses_trimmed_input() {
        assert_eq!(" 42 ".parse::<BuildNumber>().unwrap(), BuildNumber::new(42));
        assert!("forty-two".parse::<BuildNumber>().is_err());
        assert!("".parse::<BuildNumber>().is_err());
    }

    #[test]
    fn build_number_serializes_as_plain_integer() {
        let s = serde_json::to_string(&BuildNumber::new(7)).unwrap();
        assert_eq!(s, "7");
    }
}
