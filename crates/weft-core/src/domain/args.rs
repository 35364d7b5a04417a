//! Args - 位置引数とキーワード引数のペア
//!
//! wire 上は `[positional, keyword]` の 2 要素配列です。
//! キーワード引数は挿入順を保持します（serde_json の `preserve_order`）。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::errors::CodecError;

/// Remote call / Task invocation の引数
///
/// # 使用例
/// ```ignore
/// let args = weft_core::args![77, 2; "verbose" => true];
/// let (n, i): (u64, u64) = args.decode()?;
/// let verbose: Option<bool> = args.kwarg("verbose")?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: Map<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(positional: Vec<Value>, keyword: Map<String, Value>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    /// 位置引数を 1 つ追加
    pub fn push<T: Serialize>(mut self, value: T) -> Result<Self, CodecError> {
        let value = serde_json::to_value(value).map_err(CodecError::Encode)?;
        self.positional.push(value);
        Ok(self)
    }

    /// キーワード引数を追加（同じ名前なら上書き、位置は最初の挿入のまま）
    pub fn with<T: Serialize>(mut self, name: impl Into<String>, value: T) -> Result<Self, CodecError> {
        let value = serde_json::to_value(value).map_err(CodecError::Encode)?;
        self.keyword.insert(name.into(), value);
        Ok(self)
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &Map<String, Value> {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Value>, Map<String, Value>) {
        (self.positional, self.keyword)
    }

    /// `index` 番目の位置引数を `T` として取り出す。無ければエラー。
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, CodecError> {
        self.opt_arg(index)?
            .ok_or(CodecError::MissingArgument(index))
    }

    /// `index` 番目の位置引数。省略（または null）なら `None`。
    pub fn opt_arg<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, CodecError> {
        match self.positional.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(CodecError::Decode),
        }
    }

    /// キーワード引数。省略（または null）なら `None`。
    pub fn kwarg<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, CodecError> {
        match self.keyword.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(CodecError::Decode),
        }
    }

    /// 位置引数の配列全体を `T`（タプルや tuple struct）としてデコード
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let list = Value::Array(self.positional.clone());
        T::deserialize(list).map_err(CodecError::Decode)
    }
}

impl Serialize for Args {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.positional, &self.keyword).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Args {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (positional, keyword) = <(Vec<Value>, Map<String, Value>)>::deserialize(deserializer)?;
        Ok(Self {
            positional,
            keyword,
        })
    }
}
