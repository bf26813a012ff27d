// 绘制：顶栏 + 主区 + 底栏
// 主区按视图分为 组卷 / 测试 / 预览

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, View},
    mathtext::{latex_to_unicode, layout, Rendered, Segment},
    preview::PreviewLevel,
    question::{Content, QuestionRecord},
    sampler::MAX_QUESTIONS,
    selection::Level,
    theme::Theme,
};

pub fn ui(f: &mut Frame, app: &App) {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, v[0], app);
    match app.view() {
        View::Builder => draw_builder(f, v[1], app),
        View::Test => draw_test(f, v[1], app),
        View::Preview => draw_preview(f, v[1], app),
    }
    draw_footer(f, v[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let view = match app.view() {
        View::Builder => "Custom Test",
        View::Test => "Test",
        View::Preview => "Preview",
    };
    let mut segs = vec![
        Span::styled(
            " StudyTK ",
            Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled("· ", Style::default().fg(th.muted)),
        Span::styled(view, Style::default().fg(th.fg)),
        Span::styled(" | data:", Style::default().fg(th.muted)),
        Span::styled(app.source.describe(), Style::default().fg(th.fg)),
        Span::styled(" | catalog:", Style::default().fg(th.muted)),
        Span::styled(
            format!(
                " {} subjects / {} files",
                app.catalog.subjects().count(),
                app.catalog.file_count()
            ),
            Style::default().fg(th.fg),
        ),
    ];
    if let Some(msg) = &app.status {
        segs.push(Span::styled(" | ", Style::default().fg(th.muted)));
        segs.push(Span::styled(msg.clone(), Style::default().fg(th.warn)));
    }
    let para = Paragraph::new(Line::from(segs)).style(Style::default().bg(th.bar_bg).fg(th.fg));
    f.render_widget(para, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let tips = match app.view() {
        View::Builder => {
            " [q]退出  [h/l]切换列  [j/k]上下  [Enter]添加  [d]移除  [C]清空  [+/-]题数  [s]开始  [Tab]预览  [R]重载 "
        }
        View::Test => " [q]退出  [n/→]下一题  [p/←]上一题  [a/Space]解析  [j/k]滚动  [E]结束测试  [Tab]预览 ",
        View::Preview => " [q]退出  [h/l]切换列  [j/k]上下  [Enter]选择/载入  [J/K]滚动  [Tab]返回 ",
    };
    let help = Paragraph::new(Line::from(Span::styled(tips, Style::default().fg(th.muted))))
        .style(Style::default().bg(th.bar_bg));
    f.render_widget(help, area);
}

fn titled_block(title: String, th: Theme, focused: bool) -> Block<'static> {
    let border = if focused { th.accent } else { th.muted };
    Block::default()
        .title(Span::styled(title, Style::default().fg(th.accent)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn column_widths(n: u32) -> Vec<Constraint> {
    (0..n).map(|_| Constraint::Ratio(1, n)).collect()
}

// ---------------- 组卷 ----------------
fn draw_builder(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(column_widths(3))
        .split(v[0]);

    for (level, col) in Level::ALL.into_iter().zip(cols.iter()) {
        let focused = app.builder_focus == level;
        let candidates = app.builder_candidates(level);
        let inner_w = col.width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = candidates
            .iter()
            .map(|item| {
                let picked = app.selection.contains(item);
                let (mark, color) = if picked {
                    ("[x] ", th.good)
                } else {
                    ("[ ] ", th.muted)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(color)),
                    Span::styled(
                        truncate_to_width(&item.to_string(), inner_w.saturating_sub(4)),
                        Style::default().fg(th.fg),
                    ),
                ]))
            })
            .collect();
        let selected = app.selection.selected(level).len();
        let title = format!(" Select {} ({} selected) ", level.title(), selected);
        let list = List::new(items)
            .block(titled_block(title, th, focused))
            .highlight_style(
                Style::default()
                    .bg(th.selection_bg)
                    .fg(th.fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if focused { "▸ " } else { "  " });
        let mut state = ListState::default();
        if !candidates.is_empty() {
            state.select(Some(app.builder_cursor(level)));
        }
        f.render_stateful_widget(list, *col, &mut state);
    }

    let summary = vec![
        Line::from(vec![
            Span::styled(
                format!("Number of Questions (max {}): ", MAX_QUESTIONS),
                Style::default().fg(th.info),
            ),
            Span::styled(
                app.question_count.to_string(),
                Style::default().fg(th.fg).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!(
                "已选: {} 科目 / {} 章节 / {} 练习",
                app.selection.subjects().count(),
                app.selection.chapters().count(),
                app.selection.exercises().count()
            ),
            Style::default().fg(th.muted),
        )),
    ];
    let para = Paragraph::new(summary).block(titled_block(" Create Custom Test ".into(), th, false));
    f.render_widget(para, v[1]);
}

// ---------------- 测试 ----------------
fn draw_test(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let Some(s) = &app.session else { return };
    let Some(q) = s.current() else { return };
    let title = format!(" Question {} of {} ", s.current_index + 1, s.len());
    let mut lines = Vec::new();
    if let Some(src) = &q.source {
        lines.push(Line::from(Span::styled(
            src.clone(),
            Style::default().fg(th.muted),
        )));
        lines.push(Line::from(""));
    }
    lines.extend(question_lines(q, th, s.show_solution));
    if !s.show_solution {
        lines.push(Line::from(Span::styled(
            "[a] Show Solution",
            Style::default().fg(th.muted),
        )));
    }
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(titled_block(title, th, true))
        .scroll((app.scroll, 0));
    f.render_widget(para, area);
}

// ---------------- 预览 ----------------
fn draw_preview(f: &mut Frame, area: Rect, app: &App) {
    let th = app.theme;
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Min(5)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(column_widths(4))
        .split(v[0]);

    for (level, col) in PreviewLevel::ALL.into_iter().zip(cols.iter()) {
        let focused = app.preview_focus == level;
        let options = app.preview_options(level);
        let chosen = app.preview.choice(level);
        let inner_w = col.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = options
            .iter()
            .map(|o| {
                let style = if chosen == Some(o.as_str()) {
                    Style::default().fg(th.good).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(th.fg)
                };
                ListItem::new(Span::styled(truncate_to_width(o, inner_w), style))
            })
            .collect();
        let title = format!(" {} ", level.title());
        let list = List::new(items)
            .block(titled_block(title, th, focused))
            .highlight_style(Style::default().bg(th.selection_bg))
            .highlight_symbol(if focused { "▸ " } else { "  " });
        let mut state = ListState::default();
        if !options.is_empty() {
            state.select(Some(app.preview_cursor(level)));
        }
        f.render_stateful_widget(list, *col, &mut state);
    }

    let lines = match app.preview.question() {
        Some(q) => question_lines(q, th, true),
        None => vec![Line::from(Span::styled(
            "No question loaded",
            Style::default().fg(th.muted),
        ))],
    };
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(titled_block(" Preview a Question File ".into(), th, false))
        .scroll((app.scroll, 0));
    f.render_widget(para, v[1]);
}

// ---------------- 题目排版 ----------------
pub fn question_lines(q: &QuestionRecord, th: Theme, show_solution: bool) -> Vec<Line<'static>> {
    let heading = |s: &str, color: Color| {
        Line::from(Span::styled(
            s.to_string(),
            Style::default().add_modifier(Modifier::BOLD).fg(color),
        ))
    };
    let mut lines = vec![heading("Question:", th.info)];
    if let Some(c) = &q.question {
        lines.extend(content_lines(c, th));
    }
    if let Some(opts) = &q.options {
        lines.push(heading("Options:", th.info));
        for (i, opt) in opts.iter().enumerate() {
            let mut body = content_lines(opt, th);
            let label = Span::styled(format!("{}. ", option_label(i)), Style::default().fg(th.accent));
            match body.first_mut() {
                Some(first) => first.spans.insert(0, label),
                None => body.push(Line::from(label)),
            }
            // 选项之间不留空行
            while body.last().is_some_and(|l| l.width() == 0) {
                body.pop();
            }
            lines.extend(body);
        }
        lines.push(Line::from(""));
    }
    if show_solution {
        lines.push(heading("Solution:", th.good));
        if let Some(c) = &q.solution {
            lines.extend(content_lines(c, th));
        }
    }
    lines
}

fn option_label(i: usize) -> String {
    if i < 26 {
        ((b'A' + i as u8) as char).to_string()
    } else {
        (i + 1).to_string()
    }
}

pub fn content_lines(c: &Content, th: Theme) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    push_rendered(&layout(c), th, &mut out);
    out
}

fn push_rendered(r: &Rendered, th: Theme, out: &mut Vec<Line<'static>>) {
    match r {
        Rendered::Paragraphs(ps) => {
            for p in ps {
                push_paragraph(p, th, out);
                out.push(Line::from(""));
            }
        }
        Rendered::List(items) => {
            for item in items {
                push_rendered(item, th, out);
            }
        }
        Rendered::BlockMath(m) => {
            push_block_math(m, th, out);
            out.push(Line::from(""));
        }
        Rendered::Empty => {}
    }
}

fn push_paragraph(segments: &[Segment], th: Theme, out: &mut Vec<Line<'static>>) {
    let math_style = Style::default().fg(th.math);
    let mut cur: Vec<Span<'static>> = Vec::new();
    for seg in segments {
        match seg {
            Segment::Text(t) => {
                let mut parts = t.split('\n');
                if let Some(first) = parts.next() {
                    cur.push(Span::raw(first.to_string()));
                }
                for part in parts {
                    out.push(Line::from(std::mem::take(&mut cur)));
                    cur.push(Span::raw(part.to_string()));
                }
            }
            Segment::InlineMath(m) => {
                let s = latex_to_unicode(m).replace('\n', " ");
                cur.push(Span::styled(s, math_style));
            }
            Segment::BlockMath(m) => {
                if !cur.is_empty() {
                    out.push(Line::from(std::mem::take(&mut cur)));
                }
                push_block_math(m, th, out);
            }
        }
    }
    if !cur.is_empty() {
        out.push(Line::from(cur));
    }
}

fn push_block_math(m: &str, th: Theme, out: &mut Vec<Line<'static>>) {
    let style = Style::default().fg(th.math);
    for l in latex_to_unicode(m).lines() {
        out.push(Line::from(Span::styled(format!("    {}", l.trim()), style)));
    }
}

fn truncate_to_width(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut w = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if w + cw + 1 > max {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{select_math, test_app};
    use crate::theme::{theme_of, ThemeKind};
    use rand::{rngs::StdRng, SeedableRng};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buf = terminal.backend().buffer();
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    fn text_of(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| {
                l.spans
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_builder_lists_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let screen = render(&app);
        assert!(screen.contains("Math"));
        assert!(screen.contains("Physics"));
        assert!(screen.contains("Number of Questions (max 25): 5"));
    }

    #[test]
    fn test_test_view_shows_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        select_math(&mut app);
        app.start_test_with(&mut StdRng::seed_from_u64(4));
        let screen = render(&app);
        assert!(screen.contains("Question 1 of 2"));
        assert!(!screen.contains("Solution:"));
        app.toggle_solution();
        assert!(render(&app).contains("Solution:"));
    }

    #[test]
    fn test_preview_without_question() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Tab,
            crossterm::event::KeyModifiers::NONE,
        ));
        assert!(render(&app).contains("No question loaded"));
    }

    #[test]
    fn test_inline_math_rendered_in_line() {
        let th = theme_of(ThemeKind::Dark);
        let lines = content_lines(&Content::text("Solve $x^2=4$ now"), th);
        assert_eq!(text_of(&lines[..1]), "Solve x²=4 now");
        assert_eq!(lines[0].spans[1].style.fg, Some(th.math));
    }

    #[test]
    fn test_block_math_on_own_line() {
        let th = theme_of(ThemeKind::Dark);
        let lines = content_lines(&Content::text("Compute $$\\alpha$$ here"), th);
        assert_eq!(text_of(&lines[..3]), "Compute \n    α\n here");
    }

    #[test]
    fn test_question_lines_with_options_and_solution() {
        let th = theme_of(ThemeKind::Dark);
        let q: QuestionRecord = serde_json::from_str(
            r#"{"question": "Pick", "options": ["one", {"type": "math", "value": "2"}], "solution": "one"}"#,
        )
        .unwrap();
        let text = text_of(&question_lines(&q, th, true));
        assert!(text.contains("A. one"));
        assert!(text.contains("B.     2"));
        assert!(text.contains("Solution:"));
        let hidden = text_of(&question_lines(&q, th, false));
        assert!(!hidden.contains("Solution:"));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
    }
}
