// 组卷抽题：
// 1. 找出三级都被选中的 (科目, 章节, 练习)
// 2. 按目录顺序逐个读取题目文件，坏文件记日志后跳过
// 3. 均匀洗牌后截取 min(请求数, 25)

use rand::{seq::SliceRandom, Rng};

use crate::{
    catalog::Catalog,
    question::QuestionRecord,
    selection::Selection,
    source::{question_path, DataSource, FetchError},
};

pub const MAX_QUESTIONS: usize = 25;
pub const DEFAULT_QUESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedExercise<'a> {
    pub subject: &'a str,
    pub chapter: &'a str,
    pub exercise: &'a str,
    pub files: &'a [String],
}

/// 科目按选择顺序，章节与练习按目录顺序
pub fn selected_exercises<'a>(
    selection: &'a Selection,
    catalog: &'a Catalog,
) -> Vec<SelectedExercise<'a>> {
    let mut out = Vec::new();
    for subject in selection.subjects() {
        let Some(chapters) = catalog.chapters(subject) else {
            continue;
        };
        for (chapter, exercises) in chapters {
            if !selection.has_chapter(subject, chapter) {
                continue;
            }
            for (exercise, files) in exercises {
                if selection.has_exercise(subject, chapter, exercise) {
                    out.push(SelectedExercise {
                        subject,
                        chapter,
                        exercise,
                        files,
                    });
                }
            }
        }
    }
    out
}

fn fetch_question(
    src: &dyn DataSource,
    ex: &SelectedExercise<'_>,
    file: &str,
) -> Result<QuestionRecord, FetchError> {
    let path = question_path(ex.subject, ex.chapter, ex.exercise, file)?;
    let bytes = src.fetch(&path)?;
    let q = QuestionRecord::from_slice(&bytes).map_err(|source| FetchError::Json {
        path: path.clone(),
        source,
    })?;
    Ok(q.with_source(format!(
        "{}/{}/{}/{}",
        ex.subject, ex.chapter, ex.exercise, file
    )))
}

/// 顺序逐个读取，失败的文件只记 warn
pub fn collect_questions(
    src: &dyn DataSource,
    selected: &[SelectedExercise<'_>],
) -> Vec<QuestionRecord> {
    let mut out = Vec::new();
    for ex in selected {
        for file in ex.files {
            match fetch_question(src, ex, file) {
                Ok(q) => out.push(q),
                Err(e) => log::warn!(
                    "skipped invalid question file {}/{}/{}/{}: {}",
                    ex.subject,
                    ex.chapter,
                    ex.exercise,
                    file,
                    e
                ),
            }
        }
    }
    out
}

pub fn clamp_count(requested: usize) -> usize {
    requested.clamp(1, MAX_QUESTIONS)
}

pub fn sample<R: Rng + ?Sized>(
    mut questions: Vec<QuestionRecord>,
    requested: usize,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    questions.shuffle(rng);
    questions.truncate(clamp_count(requested));
    questions
}

pub fn build_test<R: Rng + ?Sized>(
    src: &dyn DataSource,
    selection: &Selection,
    catalog: &Catalog,
    requested: usize,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    let selected = selected_exercises(selection, catalog);
    let pool = collect_questions(src, &selected);
    let pool_len = pool.len();
    let picked = sample(pool, requested, rng);
    log::info!(
        "sampled {} of {} questions from {} exercises (requested {})",
        picked.len(),
        pool_len,
        selected.len(),
        requested
    );
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        question::Content,
        selection::{ChapterKey, ExerciseKey, Item},
        source::testing::MemorySource,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn select(sel: &mut Selection, s: &str, c: &str, e: &str) {
        sel.add(Item::Subject(s.into()));
        sel.add(Item::Chapter(ChapterKey::new(s, c)));
        sel.add(Item::Exercise(ExerciseKey::new(s, c, e)));
    }

    fn question_json(text: &str) -> String {
        serde_json::json!({"question": text, "solution": "s"}).to_string()
    }

    #[test]
    fn test_single_file_example() {
        let catalog: Catalog =
            serde_json::from_str(r#"{"Math": {"Ch1": {"Ex1": ["q1.json"]}}}"#).unwrap();
        let q1 = question_json("q1");
        let src = MemorySource::with(&[("subjects/Math/Ch1/Ex1/q1.json", q1.as_str())]);
        let mut sel = Selection::new();
        select(&mut sel, "Math", "Ch1", "Ex1");
        let mut rng = StdRng::seed_from_u64(1);
        let qs = build_test(&src, &sel, &catalog, 5, &mut rng);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].source.as_deref(), Some("Math/Ch1/Ex1/q1.json"));
        assert_eq!(
            *src.fetched.borrow(),
            vec!["subjects/Math/Ch1/Ex1/q1.json".to_string()]
        );
    }

    #[test]
    fn test_never_exceeds_limit() {
        let files: Vec<String> = (0..30).map(|i| format!("q{i}.json")).collect();
        let catalog: Catalog =
            serde_json::from_value(serde_json::json!({"Math": {"Ch1": {"Ex1": files}}})).unwrap();
        let entries: Vec<(String, String)> = files
            .iter()
            .map(|f| (format!("subjects/Math/Ch1/Ex1/{f}"), question_json(f)))
            .collect();
        let refs: Vec<(&str, &str)> = entries.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let src = MemorySource::with(&refs);
        let mut sel = Selection::new();
        select(&mut sel, "Math", "Ch1", "Ex1");
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(build_test(&src, &sel, &catalog, 40, &mut rng).len(), 25);
        assert_eq!(build_test(&src, &sel, &catalog, 3, &mut rng).len(), 3);
        assert_eq!(build_test(&src, &sel, &catalog, 0, &mut rng).len(), 1);
    }

    #[test]
    fn test_only_fully_selected_triples() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "Math": {"Ch1": {"Ex1": ["a.json"], "Ex2": ["b.json"]}, "Ch2": {"Ex1": ["c.json"]}},
                "Physics": {"Waves": {"Ex1": ["d.json"]}}
            }"#,
        )
        .unwrap();
        let mut sel = Selection::new();
        select(&mut sel, "Math", "Ch1", "Ex1");
        sel.add(Item::Chapter(ChapterKey::new("Math", "Ch2")));
        sel.add(Item::Subject("Physics".into()));
        let picked = selected_exercises(&sel, &catalog);
        assert_eq!(picked.len(), 1);
        assert_eq!(
            (picked[0].subject, picked[0].chapter, picked[0].exercise),
            ("Math", "Ch1", "Ex1")
        );
    }

    #[test]
    fn test_enumeration_order_and_bad_files_skipped() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "Math": {"Ch1": {"Ex1": ["a.json", "broken.json", "missing.json"]}},
                "Physics": {"Waves": {"Ex1": ["d.json"]}}
            }"#,
        )
        .unwrap();
        let (a, d) = (question_json("a"), question_json("d"));
        let src = MemorySource::with(&[
            ("subjects/Math/Ch1/Ex1/a.json", a.as_str()),
            ("subjects/Math/Ch1/Ex1/broken.json", "{oops"),
            ("subjects/Physics/Waves/Ex1/d.json", d.as_str()),
        ]);
        let mut sel = Selection::new();
        select(&mut sel, "Physics", "Waves", "Ex1");
        select(&mut sel, "Math", "Ch1", "Ex1");
        let qs = collect_questions(&src, &selected_exercises(&sel, &catalog));
        let texts: Vec<_> = qs.iter().map(|q| q.question.clone()).collect();
        assert_eq!(texts, vec![Some(Content::text("d")), Some(Content::text("a"))]);
        assert_eq!(src.fetched.borrow().len(), 4);
    }

    #[test]
    fn test_sample_is_a_permutation() {
        let qs: Vec<QuestionRecord> = (0..10)
            .map(|i| QuestionRecord::default().with_source(i.to_string()))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let mut got: Vec<_> = sample(qs, 25, &mut rng)
            .into_iter()
            .filter_map(|q| q.source)
            .collect();
        got.sort_by_key(|s| s.parse::<u32>().unwrap());
        assert_eq!(got, (0..10).map(|i| i.to_string()).collect::<Vec<_>>());
    }
}
