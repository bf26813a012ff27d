// 基于 ratatui + crossterm 的组卷练习 TUI
// 功能：
// - 从 map.json 读取 科目/章节/练习/题目文件 目录
// - 逐级选择科目、章节、练习，随机抽题组成测试（最多 25 题）
// - 测试进度写入本地存储，下次启动时恢复
// - 单题预览：逐级选择到文件并显示题目

mod app;
mod catalog;
mod config;
mod keymap;
mod logging;
mod mathtext;
mod preview;
mod question;
mod sampler;
mod selection;
mod session;
mod source;
mod store;
mod theme;
mod ui;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::{
    app::App,
    config::{load_config, Cli, DataLocation, Settings},
    source::{DataSource, DirSource, HttpSource},
    store::LocalStore,
    theme::theme_of,
    ui::ui,
};

fn open_source(data: &DataLocation) -> Result<Box<dyn DataSource>> {
    Ok(match data {
        DataLocation::Dir(dir) => Box::new(DirSource::new(dir.clone())),
        DataLocation::Url(url) => {
            Box::new(HttpSource::new(url).with_context(|| format!("无效的数据地址: {}", url))?)
        }
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file = load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file);
    let log_path = logging::init(&settings.state_dir, settings.log_level)?;
    log::info!(
        "studytk-tui {} starting, log file {}",
        env!("CARGO_PKG_VERSION"),
        log_path.display()
    );

    let source = open_source(&settings.data)?;
    log::info!("data source: {}", source.describe());
    let store = LocalStore::open_in(&settings.state_dir)?;
    let keymap = settings.keymap();

    // TUI 初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        source,
        store,
        settings.question_count,
        theme_of(settings.theme),
        keymap,
    );
    let res = run_app(&mut terminal, &mut app);

    // 退出还原
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    if let Err(e) = &res {
        log::error!("exited with error: {:#}", e);
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;
        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(k) = event::read()? {
                // Windows 下松开按键也会产生事件
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(k) {
                    break;
                }
            }
        }
    }
    Ok(())
}
