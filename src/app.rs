// 界面状态与按键处理（不含绘制）

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::Rng;

use crate::{
    catalog::Catalog,
    keymap::KeyAction,
    preview::{Preview, PreviewLevel},
    sampler::{self, clamp_count},
    selection::{Item, Level, Selection},
    session::{self, TestSession},
    source::DataSource,
    store::LocalStore,
    theme::Theme,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// 测试进行中时显示为测试页
    Builder,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Builder,
    Test,
    Preview,
}

pub struct App {
    pub source: Box<dyn DataSource>,
    pub catalog: Catalog,
    pub selection: Selection,
    pub question_count: usize,
    pub session: Option<TestSession>,
    pub store: LocalStore,
    pub preview: Preview,
    pub screen: Screen,
    pub builder_focus: Level,
    pub builder_cursor: [usize; 3],
    pub preview_focus: PreviewLevel,
    pub preview_cursor: [usize; 4],
    pub scroll: u16,
    pub status: Option<String>,
    pub theme: Theme,
    pub keymap: HashMap<char, KeyAction>,
}

fn level_index(level: Level) -> usize {
    match level {
        Level::Subject => 0,
        Level::Chapter => 1,
        Level::Exercise => 2,
    }
}

fn preview_index(level: PreviewLevel) -> usize {
    match level {
        PreviewLevel::Subject => 0,
        PreviewLevel::Chapter => 1,
        PreviewLevel::Exercise => 2,
        PreviewLevel::File => 3,
    }
}

impl App {
    pub fn new(
        source: Box<dyn DataSource>,
        store: LocalStore,
        question_count: usize,
        theme: Theme,
        keymap: HashMap<char, KeyAction>,
    ) -> Self {
        let catalog = Catalog::load(source.as_ref());
        let session = session::load_session(&store);
        let mut app = Self {
            source,
            catalog,
            selection: Selection::new(),
            question_count: clamp_count(question_count),
            session,
            store,
            preview: Preview::default(),
            screen: Screen::Builder,
            builder_focus: Level::Subject,
            builder_cursor: [0; 3],
            preview_focus: PreviewLevel::Subject,
            preview_cursor: [0; 4],
            scroll: 0,
            status: None,
            theme,
            keymap,
        };
        app.sync_pending();
        if app.catalog.is_empty() {
            app.status = Some(format!("目录为空或无法读取：{}", app.source.describe()));
        }
        app
    }

    pub fn view(&self) -> View {
        match (self.screen, &self.session) {
            (Screen::Preview, _) => View::Preview,
            (Screen::Builder, Some(_)) => View::Test,
            (Screen::Builder, None) => View::Builder,
        }
    }

    // ---------------- 组卷 ----------------
    pub fn builder_candidates(&self, level: Level) -> Vec<Item> {
        self.selection.candidates(level, &self.catalog)
    }

    pub fn builder_cursor(&self, level: Level) -> usize {
        self.builder_cursor[level_index(level)]
    }

    /// 候选列表变化后修正光标，并把高亮项同步为待添加项
    fn sync_pending(&mut self) {
        for level in Level::ALL {
            let items = self.builder_candidates(level);
            let i = level_index(level);
            if self.builder_cursor[i] >= items.len() {
                self.builder_cursor[i] = items.len().saturating_sub(1);
            }
            let pending = items.get(self.builder_cursor[i]).cloned();
            self.selection.set_pending(pending, level);
        }
    }

    fn builder_move(&mut self, delta: isize) {
        let n = self.builder_candidates(self.builder_focus).len();
        let i = level_index(self.builder_focus);
        self.builder_cursor[i] = step(self.builder_cursor[i], delta, n);
        self.sync_pending();
    }

    fn builder_focus_step(&mut self, delta: isize) {
        let i = step(level_index(self.builder_focus), delta, Level::ALL.len());
        self.builder_focus = Level::ALL[i];
    }

    pub fn add_highlighted(&mut self) {
        let level = self.builder_focus;
        if self.selection.add_pending(level) {
            if let Some(item) = self.selection.pending(level) {
                self.status = Some(format!("已添加 {}", item));
            }
            // 自动跳到下一列，方便继续选择
            if level != Level::Exercise {
                self.builder_focus_step(1);
            }
        }
        self.sync_pending();
    }

    pub fn remove_highlighted(&mut self) {
        if let Some(item) = self.selection.pending(self.builder_focus) {
            if self.selection.remove(&item) {
                self.status = Some(format!("已移除 {}", item));
            }
        }
        self.sync_pending();
    }

    pub fn clear_selections(&mut self) {
        self.selection.clear();
        self.builder_cursor = [0; 3];
        self.builder_focus = Level::Subject;
        self.sync_pending();
        self.status = Some("已清空选择".into());
    }

    pub fn change_count(&mut self, delta: isize) {
        self.question_count = clamp_count(self.question_count.saturating_add_signed(delta));
    }

    pub fn start_test(&mut self) {
        let mut rng = rand::thread_rng();
        self.start_test_with(&mut rng);
    }

    pub fn start_test_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let picked = sampler::build_test(
            self.source.as_ref(),
            &self.selection,
            &self.catalog,
            self.question_count,
            rng,
        );
        match TestSession::new(picked) {
            Some(s) => {
                self.status = Some(format!("测试开始，共 {} 题", s.len()));
                self.session = Some(s);
                self.scroll = 0;
                self.persist_session();
            }
            None => {
                self.status = Some("没有可用的题目，请检查所选练习".into());
            }
        }
    }

    // ---------------- 测试 ----------------
    fn persist_session(&mut self) {
        let Some(s) = &self.session else { return };
        if let Err(e) = session::save_session(&mut self.store, s) {
            log::error!("failed to persist test session: {:#}", e);
            self.status = Some(format!("保存失败: {}", e));
        }
    }

    fn navigate(&mut self, forward: bool) {
        let moved = match self.session.as_mut() {
            Some(s) if forward => s.next(),
            Some(s) => s.prev(),
            None => false,
        };
        if moved {
            self.scroll = 0;
            self.persist_session();
        }
    }

    pub fn toggle_solution(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.toggle_solution();
        }
    }

    /// 本地存储删除失败时保留当前测试，避免下次启动又恢复出来
    pub fn end_test(&mut self) {
        if let Err(e) = session::clear_session(&mut self.store) {
            log::error!("failed to clear test session: {:#}", e);
            self.status = Some(format!("结束测试失败: {}", e));
            return;
        }
        if self.session.take().is_some() {
            log::info!("test session ended");
            self.scroll = 0;
            self.status = Some("测试已结束".into());
        }
    }

    // ---------------- 预览 ----------------
    pub fn preview_options(&self, level: PreviewLevel) -> Vec<String> {
        self.preview.options(level, &self.catalog)
    }

    pub fn preview_cursor(&self, level: PreviewLevel) -> usize {
        self.preview_cursor[preview_index(level)]
    }

    fn preview_move(&mut self, delta: isize) {
        let n = self.preview_options(self.preview_focus).len();
        let i = preview_index(self.preview_focus);
        self.preview_cursor[i] = step(self.preview_cursor[i], delta, n);
    }

    fn preview_focus_step(&mut self, delta: isize) {
        let i = step(preview_index(self.preview_focus), delta, PreviewLevel::ALL.len());
        self.preview_focus = PreviewLevel::ALL[i];
    }

    /// 选定高亮项；在文件列上同时载入题目
    pub fn preview_choose(&mut self) {
        let level = self.preview_focus;
        let i = preview_index(level);
        let Some(value) = self.preview_options(level).get(self.preview_cursor[i]).cloned() else {
            return;
        };
        self.preview.choose(level, Some(value));
        for lower in self.preview_cursor.iter_mut().skip(i + 1) {
            *lower = 0;
        }
        self.scroll = 0;
        if level == PreviewLevel::File {
            if !self.preview.load(self.source.as_ref()) {
                self.status = Some("题目载入失败".into());
            }
        } else {
            self.preview_focus_step(1);
        }
    }

    // ---------------- 通用 ----------------
    pub fn reload(&mut self) {
        self.catalog = Catalog::load(self.source.as_ref());
        self.preview = Preview::default();
        self.preview_cursor = [0; 4];
        self.sync_pending();
        self.status = Some(if self.catalog.is_empty() {
            format!("目录为空或无法读取：{}", self.source.describe())
        } else {
            format!("目录已重载：{} 个科目", self.catalog.subjects().count())
        });
    }

    fn switch_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Builder => Screen::Preview,
            Screen::Preview => Screen::Builder,
        };
        self.scroll = 0;
    }

    /// 返回 true 表示退出；Ctrl-C 总是退出，其余字符走键位表
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let view = self.view();
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Tab => self.apply_action(KeyAction::SwitchScreen),
            KeyCode::Up => self.apply_action(KeyAction::MoveUp),
            KeyCode::Down => self.apply_action(KeyAction::MoveDown),
            KeyCode::Left if view == View::Test => self.apply_action(KeyAction::PrevQuestion),
            KeyCode::Right if view == View::Test => self.apply_action(KeyAction::NextQuestion),
            KeyCode::Left => self.apply_action(KeyAction::FocusLeft),
            KeyCode::Right => self.apply_action(KeyAction::FocusRight),
            KeyCode::PageDown => {
                self.scroll_by(10);
                false
            }
            KeyCode::PageUp => {
                self.scroll_by(-10);
                false
            }
            KeyCode::Enter | KeyCode::Char(' ') => match view {
                View::Builder => self.apply_action(KeyAction::Add),
                View::Test => self.apply_action(KeyAction::ToggleSolution),
                View::Preview => {
                    self.preview_choose();
                    false
                }
            },
            KeyCode::Backspace | KeyCode::Delete if view == View::Builder => {
                self.apply_action(KeyAction::Remove)
            }
            KeyCode::Char(ch) => match self.keymap.get(&ch).copied() {
                Some(action) => self.apply_action(action),
                None => false,
            },
            _ => false,
        }
    }

    /// 返回 true 表示退出
    pub fn apply_action(&mut self, action: KeyAction) -> bool {
        let view = self.view();
        match (view, action) {
            (_, KeyAction::Quit) => return true,
            (_, KeyAction::SwitchScreen) => self.switch_screen(),
            (_, KeyAction::Reload) => self.reload(),
            (_, KeyAction::ScrollDown) => self.scroll_by(1),
            (_, KeyAction::ScrollUp) => self.scroll_by(-1),

            (View::Builder, KeyAction::MoveUp) => self.builder_move(-1),
            (View::Builder, KeyAction::MoveDown) => self.builder_move(1),
            (View::Builder, KeyAction::FocusLeft) => self.builder_focus_step(-1),
            (View::Builder, KeyAction::FocusRight) => self.builder_focus_step(1),
            (View::Builder, KeyAction::Add) => self.add_highlighted(),
            (View::Builder, KeyAction::Remove) => self.remove_highlighted(),
            (View::Builder, KeyAction::ClearSelections) => self.clear_selections(),
            (View::Builder, KeyAction::CountUp) => self.change_count(1),
            (View::Builder, KeyAction::CountDown) => self.change_count(-1),
            (View::Builder, KeyAction::StartTest) => self.start_test(),

            (View::Test, KeyAction::NextQuestion) => self.navigate(true),
            (View::Test, KeyAction::PrevQuestion) => self.navigate(false),
            (View::Test, KeyAction::ToggleSolution) => self.toggle_solution(),
            (View::Test, KeyAction::EndTest) => self.end_test(),
            (View::Test, KeyAction::MoveDown) => self.scroll_by(1),
            (View::Test, KeyAction::MoveUp) => self.scroll_by(-1),

            (View::Preview, KeyAction::MoveUp) => self.preview_move(-1),
            (View::Preview, KeyAction::MoveDown) => self.preview_move(1),
            (View::Preview, KeyAction::FocusLeft) => self.preview_focus_step(-1),
            (View::Preview, KeyAction::FocusRight) => self.preview_focus_step(1),
            (View::Preview, KeyAction::Add) => self.preview_choose(),
            _ => {}
        }
        false
    }

    fn scroll_by(&mut self, delta: i32) {
        self.scroll = (self.scroll as i32 + delta).clamp(0, u16::MAX as i32) as u16;
    }
}

/// 在 [0, n) 内移动，不回绕
fn step(cur: usize, delta: isize, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    cur.saturating_add_signed(delta).min(n - 1)
}
