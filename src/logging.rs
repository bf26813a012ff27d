// 日志写入 state 目录下的文件，终端留给界面

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use log::LevelFilter;

pub const LOG_FILE: &str = "studytk.log";

pub fn parse_level(s: &str) -> Option<LevelFilter> {
    s.trim().parse().ok()
}

pub fn init(state_dir: &Path, level: LevelFilter) -> Result<PathBuf> {
    fs::create_dir_all(state_dir)
        .with_context(|| format!("创建状态目录失败: {}", state_dir.display()))?;
    let path = state_dir.join(LOG_FILE);
    let file = fern::log_file(&path)
        .with_context(|| format!("打开日志文件失败: {}", path.display()))?;
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // HTTP 客户端内部日志太吵
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .chain(file)
        .apply()
        .context("初始化日志失败")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
