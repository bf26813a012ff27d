// ---------------- Keymap ----------------
// 单字符按键 → 动作；可在 studytk.toml 的 [keys] 中覆盖

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // 光标 / 焦点
    MoveUp,
    MoveDown,
    FocusLeft,
    FocusRight,
    ScrollUp,
    ScrollDown,
    SwitchScreen,
    // 组卷
    Add,
    Remove,
    ClearSelections,
    CountUp,
    CountDown,
    StartTest,
    // 测试
    NextQuestion,
    PrevQuestion,
    ToggleSolution,
    EndTest,
    // 其他
    Reload,
    Quit,
}

pub fn action_from_str(s: &str) -> Option<KeyAction> {
    use KeyAction::*;
    Some(match s {
        "up" => MoveUp,
        "down" => MoveDown,
        "left" => FocusLeft,
        "right" => FocusRight,
        "scroll_up" => ScrollUp,
        "scroll_down" => ScrollDown,
        "switch_screen" => SwitchScreen,
        "add" => Add,
        "remove" => Remove,
        "clear" => ClearSelections,
        "count_up" => CountUp,
        "count_down" => CountDown,
        "start" => StartTest,
        "next" => NextQuestion,
        "prev" => PrevQuestion,
        "toggle_solution" => ToggleSolution,
        "end" => EndTest,
        "reload" => Reload,
        "quit" => Quit,
        _ => return None,
    })
}

/// 配置中的条目覆盖默认键位，无效条目记 warn 后忽略
pub fn parse_keymap(map: &HashMap<String, String>) -> HashMap<char, KeyAction> {
    let mut out = default_keymap();
    let mut applied = 0;
    for (k, v) in map {
        let mut chars = k.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            log::warn!("ignoring key binding {:?}: not a single character", k);
            continue;
        };
        match action_from_str(v) {
            Some(act) => {
                out.insert(ch, act);
                applied += 1;
            }
            None => log::warn!("ignoring key binding {:?}: unknown action {:?}", k, v),
        }
    }
    if applied > 0 {
        log::debug!("applied {} custom key bindings", applied);
    }
    out
}

pub fn default_keymap() -> HashMap<char, KeyAction> {
    use KeyAction::*;
    let mut m = HashMap::new();
    m.insert('k', MoveUp);
    m.insert('j', MoveDown);
    m.insert('h', FocusLeft);
    m.insert('l', FocusRight);
    m.insert('K', ScrollUp);
    m.insert('J', ScrollDown);
    m.insert('d', Remove);
    m.insert('C', ClearSelections); // 大写 C
    m.insert('+', CountUp);
    m.insert('=', CountUp);
    m.insert('-', CountDown);
    m.insert('s', StartTest);
    m.insert('n', NextQuestion);
    m.insert('p', PrevQuestion);
    m.insert('a', ToggleSolution);
    m.insert('E', EndTest); // 大写 E
    m.insert('R', Reload); // 大写 R
    m.insert('q', Quit);
    m
}
