// 静态数据源：map.json 与 subjects/... 题目文件
// 目录（本地 public/data）或 HTTP 基地址二选一，均按相对路径读取

use std::{fs, io, path::PathBuf};

use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("非法路径片段: {0:?}")]
    InvalidPath(String),
    #[error("无效的数据地址 {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("资源不存在: {0}")]
    NotFound(String),
    #[error("读取失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {path}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },
    #[error("解析 JSON 失败 {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait DataSource {
    /// 读取数据根下的相对路径，如 `map.json`
    fn fetch(&self, rel: &str) -> Result<Vec<u8>, FetchError>;

    /// 人类可读的位置，用于日志与顶栏
    fn describe(&self) -> String;
}

pub fn fetch_json<T: DeserializeOwned>(src: &dyn DataSource, rel: &str) -> Result<T, FetchError> {
    let bytes = src.fetch(rel)?;
    serde_json::from_slice(&bytes).map_err(|source| FetchError::Json {
        path: rel.to_string(),
        source,
    })
}

/// 拼接 `subjects/{subject}/{chapter}/{exercise}/{file}`，拒绝含分隔符或 `..` 的片段
pub fn question_path(
    subject: &str,
    chapter: &str,
    exercise: &str,
    file: &str,
) -> Result<String, FetchError> {
    for seg in [subject, chapter, exercise, file] {
        if seg.is_empty() || seg == "." || seg == ".." || seg.contains(['/', '\\']) {
            return Err(FetchError::InvalidPath(seg.to_string()));
        }
    }
    Ok(format!("subjects/{subject}/{chapter}/{exercise}/{file}"))
}

// ---------------- 本地目录 ----------------
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for DirSource {
    fn fetch(&self, rel: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(rel);
        fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                FetchError::NotFound(path.display().to_string())
            } else {
                FetchError::Io {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// ---------------- HTTP ----------------
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// 只接受 http/https 的绝对地址
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: base.to_string(),
            reason,
        };
        let url = Url::parse(base.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(invalid(format!("不支持的协议 {}", url.scheme())));
        }
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { base: url, client })
    }

    /// 在基地址路径后逐段追加，各段由 Url 负责百分号编码
    fn url_for(&self, rel: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.pop_if_empty().extend(rel.split('/'));
        }
        url
    }
}

impl DataSource for HttpSource {
    fn fetch(&self, rel: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(self.url_for(rel)).send()?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(rel.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                path: rel.to_string(),
                status,
            });
        }
        Ok(resp.bytes()?.to_vec())
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
