// 题目文件：{question, options?, solution}
// 每个字段可以是字符串、嵌套列表，或 {"type": "math", "value": "..."}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    List(Vec<Content>),
    Math(MathValue),
    /// 无法识别的值原样保留，显示时忽略
    Other(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathTag {
    Math,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathValue {
    #[serde(rename = "type")]
    pub tag: MathTag,
    pub value: String,
}

#[cfg(test)]
impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    pub fn math(value: impl Into<String>) -> Self {
        Content::Math(MathValue {
            tag: MathTag::Math,
            value: value.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Content>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Content>,
    /// 抽题时写入 `subject/chapter/exercise/file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionRecord {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn with_source(mut self, source: String) -> Self {
        self.source = Some(source);
        self
    }
}
