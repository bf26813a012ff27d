// 命令行 + studytk.toml 配置
// 优先级：命令行 > 环境变量 > 配置文件 > 自动探测

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;

use crate::{
    keymap::{parse_keymap, KeyAction},
    logging::parse_level,
    sampler::{clamp_count, DEFAULT_QUESTIONS},
    theme::ThemeKind,
};

pub const CONFIG_FILE: &str = "studytk.toml";
pub const DATA_ENV: &str = "STUDYTK_DATA";
pub const STATE_ENV: &str = "STUDYTK_STATE";

#[derive(Debug, Clone, Parser, Default)]
#[command(name = "studytk-tui", about = "StudyTK 组卷练习 TUI", version)]
pub struct Cli {
    /// 数据目录（含 map.json 与 subjects/），默认读取环境变量 STUDYTK_DATA 或自动探测
    #[arg(long, short = 'd', conflicts_with = "url")]
    pub data: Option<PathBuf>,

    /// 数据的 HTTP 地址，例如 http://localhost:5173/data/
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// 状态目录（本地存储与日志），默认读取环境变量 STUDYTK_STATE
    #[arg(long = "state-dir")]
    pub state_dir: Option<PathBuf>,

    /// 组卷题数（1-25）
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// 主题（外观）：dark | light
    #[arg(long, value_enum)]
    pub theme: Option<ThemeKind>,

    /// 日志级别：error | warn | info | debug | trace | off
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// 配置文件路径，默认在当前目录及上级目录查找 studytk.toml
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub question_count: Option<usize>,
    pub theme: Option<ThemeKind>,
    pub log_level: Option<String>,
    pub keys: HashMap<String, String>,
}

impl FileConfig {
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("解析 studytk.toml 失败")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Dir(PathBuf),
    Url(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data: DataLocation,
    pub state_dir: PathBuf,
    pub question_count: usize,
    pub theme: ThemeKind,
    pub log_level: LevelFilter,
    keys: HashMap<String, String>,
}

/// 显式指定的配置必须存在；自动探测不到时使用默认值
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match find_upwards(&[CONFIG_FILE]) {
            Some(p) => p,
            None => return Ok(FileConfig::default()),
        },
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("读取配置失败: {}", path.display()))?;
    FileConfig::parse(&content).with_context(|| format!("配置文件: {}", path.display()))
}

fn find_upwards(rels: &[&str]) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .flat_map(|anc| rels.iter().map(move |r| anc.join(r)))
        .find(|p| p.exists())
}

/// 自动探测：从当前目录向上查找 public/data/map.json 或 data/map.json
fn detect_data_dir() -> PathBuf {
    find_upwards(&["public/data/map.json", "data/map.json"])
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_state_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/share/studytk"),
        None => PathBuf::from(".studytk"),
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        Self::resolve_with_env(cli, file, env_path(DATA_ENV), env_path(STATE_ENV))
    }

    fn resolve_with_env(
        cli: &Cli,
        file: FileConfig,
        data_env: Option<PathBuf>,
        state_env: Option<PathBuf>,
    ) -> Self {
        let data = if let Some(url) = &cli.url {
            DataLocation::Url(url.clone())
        } else if let Some(dir) = cli.data.clone().or(data_env) {
            DataLocation::Dir(dir)
        } else if let Some(url) = file.base_url.clone() {
            DataLocation::Url(url)
        } else {
            DataLocation::Dir(file.data_dir.clone().unwrap_or_else(detect_data_dir))
        };
        let state_dir = cli
            .state_dir
            .clone()
            .or(state_env)
            .or(file.state_dir.clone())
            .unwrap_or_else(default_state_dir);
        let question_count = clamp_count(
            cli.count
                .or(file.question_count)
                .unwrap_or(DEFAULT_QUESTIONS),
        );
        let log_level = cli
            .log_level
            .as_deref()
            .or(file.log_level.as_deref())
            .and_then(parse_level)
            .unwrap_or(LevelFilter::Info);
        Self {
            data,
            state_dir,
            question_count,
            theme: cli.theme.or(file.theme).unwrap_or_default(),
            log_level,
            keys: file.keys,
        }
    }

    /// 放在日志初始化之后调用，无效键位才能记录下来
    pub fn keymap(&self) -> HashMap<char, KeyAction> {
        parse_keymap(&self.keys)
    }
}
