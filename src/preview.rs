// 单题预览：科目 → 章节 → 练习 → 文件 逐级单选
// 改动上级会清空所有下级与已载入的题目

use crate::{
    catalog::Catalog,
    question::QuestionRecord,
    source::{question_path, DataSource, FetchError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewLevel {
    Subject,
    Chapter,
    Exercise,
    File,
}

impl PreviewLevel {
    pub const ALL: [PreviewLevel; 4] = [
        PreviewLevel::Subject,
        PreviewLevel::Chapter,
        PreviewLevel::Exercise,
        PreviewLevel::File,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn title(&self) -> &'static str {
        match self {
            PreviewLevel::Subject => "Subject",
            PreviewLevel::Chapter => "Chapter",
            PreviewLevel::Exercise => "Exercise",
            PreviewLevel::File => "File",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Preview {
    choices: [Option<String>; 4],
    question: Option<QuestionRecord>,
}

impl Preview {
    pub fn choice(&self, level: PreviewLevel) -> Option<&str> {
        self.choices[level.index()].as_deref()
    }

    pub fn question(&self) -> Option<&QuestionRecord> {
        self.question.as_ref()
    }

    /// 选择某一级，下级全部清空
    pub fn choose(&mut self, level: PreviewLevel, value: Option<String>) {
        let i = level.index();
        self.choices[i] = value.filter(|v| !v.is_empty());
        for lower in self.choices.iter_mut().skip(i + 1) {
            *lower = None;
        }
        self.question = None;
    }

    /// 上级未选时为空
    pub fn options(&self, level: PreviewLevel, catalog: &Catalog) -> Vec<String> {
        let [s, c, e, _] = &self.choices;
        let keys = |it: Option<Vec<String>>| it.unwrap_or_default();
        match level {
            PreviewLevel::Subject => catalog.subjects().map(str::to_string).collect(),
            PreviewLevel::Chapter => keys(
                s.as_deref()
                    .and_then(|s| catalog.chapters(s))
                    .map(|m| m.keys().cloned().collect()),
            ),
            PreviewLevel::Exercise => keys(match (s, c) {
                (Some(s), Some(c)) => catalog
                    .exercises(s, c)
                    .map(|m| m.keys().cloned().collect()),
                _ => None,
            }),
            PreviewLevel::File => match (s, c, e) {
                (Some(s), Some(c), Some(e)) => catalog.files(s, c, e).to_vec(),
                _ => Vec::new(),
            },
        }
    }

    /// 四级未选全时不做任何事；失败时显示为未载入
    pub fn load(&mut self, src: &dyn DataSource) -> bool {
        let [Some(s), Some(c), Some(e), Some(f)] = &self.choices else {
            return false;
        };
        let result = question_path(s, c, e, f).and_then(|path| {
            let bytes = src.fetch(&path)?;
            QuestionRecord::from_slice(&bytes).map_err(|source| FetchError::Json { path, source })
        });
        match result {
            Ok(q) => {
                self.question = Some(q);
                true
            }
            Err(err) => {
                log::error!("failed to load question {}/{}/{}/{}: {}", s, c, e, f, err);
                self.question = None;
                false
            }
        }
    }
}
