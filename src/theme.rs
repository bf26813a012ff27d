// ---------------- 主题与样式 ----------------

use clap::ValueEnum;
use ratatui::style::Color;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub bar_bg: Color,
    pub selection_bg: Color,
    pub good: Color,
    pub warn: Color,
    pub info: Color,
    /// 公式
    pub math: Color,
}

// 深色偏暖灰，浅色偏纸白；公式单独一种颜色，和正文区分开
pub fn theme_of(kind: ThemeKind) -> Theme {
    match kind {
        ThemeKind::Dark => Theme {
            fg: Color::Rgb(228, 224, 214),
            muted: Color::Rgb(128, 124, 116),
            accent: Color::Rgb(240, 170, 80),
            bar_bg: Color::Rgb(30, 32, 38),
            selection_bg: Color::Rgb(58, 56, 66),
            good: Color::Rgb(150, 205, 110),
            warn: Color::Rgb(245, 120, 100),
            info: Color::Rgb(110, 190, 210),
            math: Color::Rgb(200, 150, 250),
        },
        ThemeKind::Light => Theme {
            fg: Color::Rgb(40, 38, 34),
            muted: Color::Rgb(130, 126, 118),
            accent: Color::Rgb(190, 100, 20),
            bar_bg: Color::Rgb(244, 240, 230),
            selection_bg: Color::Rgb(228, 220, 200),
            good: Color::Rgb(50, 140, 70),
            warn: Color::Rgb(200, 60, 40),
            info: Color::Rgb(30, 110, 150),
            math: Color::Rgb(120, 50, 170),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_color_stands_out() {
        for kind in [ThemeKind::Dark, ThemeKind::Light] {
            let th = theme_of(kind);
            assert_ne!(th.math, th.fg);
            assert_ne!(th.math, th.muted);
            assert_ne!(th.fg, th.bar_bg);
        }
    }
}
