// 题库目录：subject → chapter → exercise → [文件名]
// 启动时读取一次 map.json，之后只读；保持 JSON 中的键顺序

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::source::{fetch_json, DataSource};

pub type Exercises = IndexMap<String, Vec<String>>;
pub type Chapters = IndexMap<String, Exercises>;

pub const MAP_PATH: &str = "map.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    subjects: IndexMap<String, Chapters>,
}

impl Catalog {
    /// 读取失败或格式错误时返回空目录，只记录日志
    pub fn load(src: &dyn DataSource) -> Self {
        match fetch_json::<Catalog>(src, MAP_PATH) {
            Ok(c) => {
                log::info!(
                    "catalog loaded from {}: {} subjects",
                    src.describe(),
                    c.subjects.len()
                );
                c
            }
            Err(e) => {
                log::error!("error loading {}: {}", MAP_PATH, e);
                Catalog::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn chapters(&self, subject: &str) -> Option<&Chapters> {
        self.subjects.get(subject)
    }

    pub fn exercises(&self, subject: &str, chapter: &str) -> Option<&Exercises> {
        self.chapters(subject)?.get(chapter)
    }

    pub fn files(&self, subject: &str, chapter: &str, exercise: &str) -> &[String] {
        self.exercises(subject, chapter)
            .and_then(|e| e.get(exercise))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn file_count(&self) -> usize {
        self.subjects
            .values()
            .flat_map(|c| c.values())
            .flat_map(|e| e.values())
            .map(Vec::len)
            .sum()
    }
}
