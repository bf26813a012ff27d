// 组卷选择：科目 / 章节 / 练习 三级有序集合
// 不变量：章节的科目必在科目集合中，练习的章节必在章节集合中
// 删除上级时级联删除下级；添加时父级缺失直接忽略

use std::fmt;

use indexmap::IndexSet;

use crate::catalog::Catalog;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterKey {
    pub subject: String,
    pub chapter: String,
}

impl ChapterKey {
    pub fn new(subject: impl Into<String>, chapter: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            chapter: chapter.into(),
        }
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject, self.chapter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExerciseKey {
    pub subject: String,
    pub chapter: String,
    pub exercise: String,
}

impl ExerciseKey {
    pub fn new(
        subject: impl Into<String>,
        chapter: impl Into<String>,
        exercise: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            chapter: chapter.into(),
            exercise: exercise.into(),
        }
    }

    pub fn in_chapter(&self, c: &ChapterKey) -> bool {
        self.subject == c.subject && self.chapter == c.chapter
    }
}

impl fmt::Display for ExerciseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.subject, self.chapter, self.exercise)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Subject,
    Chapter,
    Exercise,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Subject, Level::Chapter, Level::Exercise];

    pub fn title(&self) -> &'static str {
        match self {
            Level::Subject => "Subject",
            Level::Chapter => "Chapter",
            Level::Exercise => "Exercise",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Subject(String),
    Chapter(ChapterKey),
    Exercise(ExerciseKey),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Subject(s) => f.write_str(s),
            Item::Chapter(c) => fmt::Display::fmt(c, f),
            Item::Exercise(e) => fmt::Display::fmt(e, f),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    subjects: IndexSet<String>,
    chapters: IndexSet<ChapterKey>,
    exercises: IndexSet<ExerciseKey>,
    pending_subject: Option<String>,
    pending_chapter: Option<ChapterKey>,
    pending_exercise: Option<ExerciseKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &String> {
        self.subjects.iter()
    }

    pub fn chapters(&self) -> impl Iterator<Item = &ChapterKey> {
        self.chapters.iter()
    }

    pub fn exercises(&self) -> impl Iterator<Item = &ExerciseKey> {
        self.exercises.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.chapters.is_empty() && self.exercises.is_empty()
    }

    pub fn contains(&self, item: &Item) -> bool {
        match item {
            Item::Subject(s) => self.subjects.contains(s),
            Item::Chapter(c) => self.chapters.contains(c),
            Item::Exercise(e) => self.exercises.contains(e),
        }
    }

    pub fn has_subject(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    pub fn has_chapter(&self, subject: &str, chapter: &str) -> bool {
        self.chapters.iter().any(|c| c.subject == subject && c.chapter == chapter)
    }

    pub fn has_exercise(&self, subject: &str, chapter: &str, exercise: &str) -> bool {
        self.exercises
            .iter()
            .any(|e| e.subject == subject && e.chapter == chapter && e.exercise == exercise)
    }

    /// 已存在则不动；父级未选时拒绝。返回是否真正插入
    pub fn add(&mut self, item: Item) -> bool {
        match item {
            Item::Subject(s) => self.subjects.insert(s),
            Item::Chapter(c) => {
                if !self.has_subject(&c.subject) {
                    return false;
                }
                self.chapters.insert(c)
            }
            Item::Exercise(e) => {
                if !self.has_chapter(&e.subject, &e.chapter) {
                    return false;
                }
                self.exercises.insert(e)
            }
        }
    }

    /// 删除并级联清理下级，返回该项是否存在
    pub fn remove(&mut self, item: &Item) -> bool {
        let removed = match item {
            Item::Subject(s) => {
                let hit = self.subjects.shift_remove(s);
                self.chapters.retain(|c| &c.subject != s);
                self.exercises.retain(|e| &e.subject != s);
                hit
            }
            Item::Chapter(c) => {
                let hit = self.chapters.shift_remove(c);
                self.exercises.retain(|e| !e.in_chapter(c));
                hit
            }
            Item::Exercise(e) => self.exercises.shift_remove(e),
        };
        self.drop_orphan_pending();
        removed
    }

    pub fn clear(&mut self) {
        self.subjects.clear();
        self.chapters.clear();
        self.exercises.clear();
        self.pending_subject = None;
        self.pending_chapter = None;
        self.pending_exercise = None;
    }

    // ---------------- 待添加项 ----------------
    pub fn set_pending(&mut self, item: Option<Item>, level: Level) {
        match level {
            Level::Subject => {
                self.pending_subject = match item {
                    Some(Item::Subject(s)) => Some(s),
                    _ => None,
                }
            }
            Level::Chapter => {
                self.pending_chapter = match item {
                    Some(Item::Chapter(c)) => Some(c),
                    _ => None,
                }
            }
            Level::Exercise => {
                self.pending_exercise = match item {
                    Some(Item::Exercise(e)) => Some(e),
                    _ => None,
                }
            }
        }
    }

    pub fn pending(&self, level: Level) -> Option<Item> {
        match level {
            Level::Subject => self.pending_subject.clone().map(Item::Subject),
            Level::Chapter => self.pending_chapter.clone().map(Item::Chapter),
            Level::Exercise => self.pending_exercise.clone().map(Item::Exercise),
        }
    }

    pub fn add_pending(&mut self, level: Level) -> bool {
        match self.pending(level) {
            Some(item) => self.add(item),
            None => false,
        }
    }

    fn drop_orphan_pending(&mut self) {
        if let Some(c) = &self.pending_chapter {
            if !self.subjects.contains(&c.subject) {
                self.pending_chapter = None;
            }
        }
        if let Some(e) = &self.pending_exercise {
            if !self.has_chapter(&e.subject, &e.chapter) {
                self.pending_exercise = None;
            }
        }
    }

    // ---------------- 候选项（下拉列表内容） ----------------
    pub fn candidates(&self, level: Level, catalog: &Catalog) -> Vec<Item> {
        match level {
            Level::Subject => catalog
                .subjects()
                .map(|s| Item::Subject(s.to_string()))
                .collect(),
            Level::Chapter => self
                .subjects
                .iter()
                .flat_map(|s| {
                    catalog
                        .chapters(s)
                        .into_iter()
                        .flat_map(|c| c.keys())
                        .map(move |chap| Item::Chapter(ChapterKey::new(s.clone(), chap.clone())))
                })
                .collect(),
            Level::Exercise => self
                .chapters
                .iter()
                .flat_map(|c| {
                    catalog
                        .exercises(&c.subject, &c.chapter)
                        .into_iter()
                        .flat_map(|e| e.keys())
                        .map(move |ex| {
                            Item::Exercise(ExerciseKey::new(
                                c.subject.clone(),
                                c.chapter.clone(),
                                ex.clone(),
                            ))
                        })
                })
                .collect(),
        }
    }

    pub fn selected(&self, level: Level) -> Vec<Item> {
        match level {
            Level::Subject => self.subjects.iter().cloned().map(Item::Subject).collect(),
            Level::Chapter => self.chapters.iter().cloned().map(Item::Chapter).collect(),
            Level::Exercise => self.exercises.iter().cloned().map(Item::Exercise).collect(),
        }
    }

    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        self.chapters.iter().all(|c| self.subjects.contains(&c.subject))
            && self
                .exercises
                .iter()
                .all(|e| self.has_chapter(&e.subject, &e.chapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn subj(s: &str) -> Item {
        Item::Subject(s.into())
    }
    fn chap(s: &str, c: &str) -> Item {
        Item::Chapter(ChapterKey::new(s, c))
    }
    fn ex(s: &str, c: &str, e: &str) -> Item {
        Item::Exercise(ExerciseKey::new(s, c, e))
    }

    fn catalog() -> Catalog {
        serde_json::from_str(
            r#"{
                "Math": {"Ch1": {"Ex1": ["q1.json"], "Ex2": []}, "Ch2": {"Ex1": []}},
                "Physics": {"Waves": {"Ex1": ["w.json"]}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_keys_display_colon_joined() {
        assert_eq!(chap("Math", "Ch1").to_string(), "Math:Ch1");
        assert_eq!(ex("Math", "Ch1", "Ex1").to_string(), "Math:Ch1:Ex1");
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut s = Selection::new();
        assert!(s.add(subj("Math")));
        assert!(!s.add(subj("Math")));
        assert!(s.add(chap("Math", "Ch1")));
        assert!(!s.add(chap("Math", "Ch1")));
        assert_eq!(s.subjects().count(), 1);
        assert_eq!(s.chapters().count(), 1);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut s = Selection::new();
        s.add(subj("Physics"));
        s.add(subj("Math"));
        s.add(subj("Art"));
        s.remove(&subj("Math"));
        s.add(subj("Math"));
        let v: Vec<_> = s.subjects().cloned().collect();
        assert_eq!(v, vec!["Physics", "Art", "Math"]);
    }

    #[test]
    fn test_add_rejects_orphans() {
        let mut s = Selection::new();
        assert!(!s.add(chap("Math", "Ch1")));
        s.add(subj("Math"));
        assert!(!s.add(ex("Math", "Ch1", "Ex1")));
        assert!(!s.is_empty());
        assert_eq!(s.exercises().count(), 0);
    }

    #[test]
    fn test_removing_subject_cascades() {
        let mut s = Selection::new();
        s.add(subj("Math"));
        s.add(chap("Math", "Ch1"));
        s.add(ex("Math", "Ch1", "Ex1"));
        assert!(s.remove(&subj("Math")));
        assert!(s.is_empty());
    }

    #[test]
    fn test_removing_chapter_keeps_siblings() {
        let mut s = Selection::new();
        s.add(subj("Math"));
        s.add(chap("Math", "Ch1"));
        s.add(chap("Math", "Ch2"));
        s.add(ex("Math", "Ch1", "Ex1"));
        s.add(ex("Math", "Ch2", "Ex1"));
        s.remove(&chap("Math", "Ch1"));
        assert!(s.has_subject("Math"));
        assert!(s.has_chapter("Math", "Ch2"));
        assert!(!s.has_exercise("Math", "Ch1", "Ex1"));
        assert!(s.has_exercise("Math", "Ch2", "Ex1"));
    }

    #[test]
    fn test_cascade_matches_whole_names_only() {
        let mut s = Selection::new();
        s.add(subj("Math"));
        s.add(subj("Math2"));
        s.add(chap("Math2", "Ch1"));
        s.remove(&subj("Math"));
        assert!(s.has_chapter("Math2", "Ch1"));
    }

    #[test]
    fn test_clear_resets_pending() {
        let mut s = Selection::new();
        s.add(subj("Math"));
        s.set_pending(Some(subj("Math")), Level::Subject);
        s.set_pending(Some(chap("Math", "Ch1")), Level::Chapter);
        s.clear();
        assert!(s.is_empty());
        for level in Level::ALL {
            assert!(s.pending(level).is_none());
        }
    }

    #[test]
    fn test_remove_drops_orphaned_pending() {
        let mut s = Selection::new();
        s.add(subj("Math"));
        s.add(chap("Math", "Ch1"));
        s.set_pending(Some(chap("Math", "Ch2")), Level::Chapter);
        s.set_pending(Some(ex("Math", "Ch1", "Ex1")), Level::Exercise);
        s.remove(&subj("Math"));
        assert!(s.pending(Level::Chapter).is_none());
        assert!(s.pending(Level::Exercise).is_none());
        assert!(!s.add_pending(Level::Chapter));
    }

    #[test]
    fn test_candidates_follow_selection() {
        let c = catalog();
        let mut s = Selection::new();
        assert_eq!(s.candidates(Level::Subject, &c).len(), 2);
        assert!(s.candidates(Level::Chapter, &c).is_empty());
        s.add(subj("Physics"));
        s.add(subj("Math"));
        let chapters: Vec<_> = s
            .candidates(Level::Chapter, &c)
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(chapters, vec!["Physics:Waves", "Math:Ch1", "Math:Ch2"]);
        s.add(chap("Math", "Ch1"));
        let exercises: Vec<_> = s
            .candidates(Level::Exercise, &c)
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(exercises, vec!["Math:Ch1:Ex1", "Math:Ch1:Ex2"]);
    }

    #[test]
    fn test_invariant_holds_for_random_sequences() {
        let names = ["A", "B"];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut s = Selection::new();
            for _ in 0..40 {
                let a = names[rng.gen_range(0..2)];
                let b = names[rng.gen_range(0..2)];
                let c = names[rng.gen_range(0..2)];
                let item = match rng.gen_range(0..3) {
                    0 => subj(a),
                    1 => chap(a, b),
                    _ => ex(a, b, c),
                };
                if rng.gen_bool(0.6) {
                    s.add(item);
                } else {
                    s.remove(&item);
                }
                assert!(s.is_consistent(), "broken after {:?}", s);
            }
        }
    }
}
