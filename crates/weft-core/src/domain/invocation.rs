use serde::{Deserialize, Serialize};

use super::Args;
use super::errors::CodecError;
use crate::typed::codec;

/// Worker が受け取った 1 件の仕事（serialized input + task token）
///
/// 生成後は不変。1 回のライフサイクル呼び出しが終わったら捨てられます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    input: String,
    token: String,
}

impl Invocation {
    pub fn new(input: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            token: token.into(),
        }
    }

    /// `Args` を wire 形式にして Invocation を作る（テストやローカル実行用）
    pub fn from_args(args: &Args, token: impl Into<String>) -> Result<Self, CodecError> {
        Ok(Self::new(codec::serialize_args(args)?, token))
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}
