// 进行中的测试：题目列表 + 当前位置
// 每次变化整体写入本地存储 `custom-test`，重启后恢复

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{question::QuestionRecord, store::LocalStore};

pub const SESSION_KEY: &str = "custom-test";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSession {
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub current_index: usize,
    /// 是否显示解析，不持久化
    #[serde(skip)]
    pub show_solution: bool,
}

impl TestSession {
    /// 空题目列表不构成测试
    pub fn new(questions: Vec<QuestionRecord>) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        Some(Self {
            questions,
            current_index: 0,
            show_solution: false,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn current(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current_index)
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current_index += 1;
        self.show_solution = false;
        true
    }

    pub fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current_index -= 1;
        self.show_solution = false;
        true
    }

    pub fn toggle_solution(&mut self) {
        self.show_solution = !self.show_solution;
    }

    fn clamp(mut self) -> Self {
        self.current_index = self.current_index.min(self.questions.len().saturating_sub(1));
        self
    }
}

pub fn load_session(store: &LocalStore) -> Option<TestSession> {
    let raw = store.get_item(SESSION_KEY)?;
    match serde_json::from_str::<TestSession>(raw) {
        Ok(s) if !s.questions.is_empty() => {
            log::info!(
                "restored test session: {} questions at {}",
                s.questions.len(),
                s.current_index
            );
            Some(s.clamp())
        }
        Ok(_) => None,
        Err(e) => {
            log::error!("ignoring unreadable {}: {}", SESSION_KEY, e);
            None
        }
    }
}

pub fn save_session(store: &mut LocalStore, session: &TestSession) -> Result<()> {
    let s = serde_json::to_string(session)?;
    store.set_item(SESSION_KEY, s)
}

pub fn clear_session(store: &mut LocalStore) -> Result<()> {
    store.remove_item(SESSION_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::Content;

    fn questions(n: usize) -> Vec<QuestionRecord> {
        (0..n)
            .map(|i| QuestionRecord {
                question: Some(Content::text(format!("q{i}"))),
                solution: Some(Content::text(format!("s{i}"))),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_empty_is_not_a_session() {
        assert!(TestSession::new(vec![]).is_none());
    }

    #[test]
    fn test_navigation_is_bounded_and_hides_solution() {
        let mut s = TestSession::new(questions(2)).unwrap();
        assert!(!s.prev());
        s.toggle_solution();
        assert!(s.next());
        assert!(!s.show_solution);
        assert_eq!(s.current_index, 1);
        s.toggle_solution();
        assert!(!s.next());
        assert!(s.show_solution);
        assert!(s.prev());
        assert_eq!(s.current_index, 0);
    }

    #[test]
    fn test_wire_format() {
        let mut s = TestSession::new(questions(1)).unwrap();
        s.show_solution = true;
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["currentIndex"], 0);
        assert_eq!(v["questions"][0]["question"], "q0");
        assert!(v.get("showSolution").is_none());
    }

    #[test]
    fn test_persist_restore_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open_in(dir.path()).unwrap();
        let mut s = TestSession::new(questions(3)).unwrap();
        s.next();
        save_session(&mut store, &s).unwrap();

        let reopened = LocalStore::open_in(dir.path()).unwrap();
        let restored = load_session(&reopened).unwrap();
        assert_eq!(restored.current_index, 1);
        assert_eq!(restored.len(), 3);

        clear_session(&mut store).unwrap();
        let reopened = LocalStore::open_in(dir.path()).unwrap();
        assert!(load_session(&reopened).is_none());
    }

    #[test]
    fn test_restore_clamps_position_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open_in(dir.path()).unwrap();
        store
            .set_item(
                SESSION_KEY,
                r#"{"questions": [{"question": "a"}], "currentIndex": 9}"#.into(),
            )
            .unwrap();
        assert_eq!(load_session(&store).unwrap().current_index, 0);

        store.set_item(SESSION_KEY, "not json".into()).unwrap();
        assert!(load_session(&store).is_none());

        store
            .set_item(SESSION_KEY, r#"{"questions": [], "currentIndex": 0}"#.into())
            .unwrap();
        assert!(load_session(&store).is_none());
    }
}
