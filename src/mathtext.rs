// 含公式文本的切分：
// - 先按空行切段落
// - 段内用单个正则切出 $$...$$ / $...$ / \begin{X}...\end{X}
// - 其余为普通文本
// 已知限制：行内公式中不能出现 `$`，不支持嵌套或转义的分隔符

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::question::Content;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph regex"));

// 同一位置上 $$ 优先于 $（leftmost-first）
static MATH_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<block>\$\$[^$]*\$\$)|(?P<inline>\$[^$]*\$)|(?P<env>\\begin\{[^}]+\}[\s\S]*?\\end\{[^}]+\})",
    )
    .expect("math span regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    InlineMath(String),
    BlockMath(String),
}

pub type Paragraph = Vec<Segment>;

/// 一个 Content 的排版结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Paragraphs(Vec<Paragraph>),
    /// 列表中每一项独立排版
    List(Vec<Rendered>),
    BlockMath(String),
    Empty,
}

pub fn layout(content: &Content) -> Rendered {
    match content {
        Content::Text(s) => Rendered::Paragraphs(split_paragraphs(s)),
        Content::List(items) => Rendered::List(items.iter().map(layout).collect()),
        Content::Math(m) => Rendered::BlockMath(m.value.clone()),
        Content::Other(_) => Rendered::Empty,
    }
}

pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    PARAGRAPH_BREAK.split(text).map(split_segments).collect()
}

pub fn split_segments(paragraph: &str) -> Paragraph {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in MATH_SPAN.captures_iter(paragraph) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            out.push(Segment::Text(paragraph[last..whole.start()].to_string()));
        }
        out.push(classify(&caps));
        last = whole.end();
    }
    if last < paragraph.len() {
        out.push(Segment::Text(paragraph[last..].to_string()));
    }
    out
}

// 以 $$ 开头且结尾的都算块公式，单独的 `$$` 是空的块公式
fn classify(caps: &Captures) -> Segment {
    if caps.name("env").is_some() {
        // \begin{..}...\end{..} 整体作为块公式
        return Segment::BlockMath(caps[0].to_string());
    }
    let s = &caps[0];
    if s.starts_with("$$") && s.ends_with("$$") {
        Segment::BlockMath(s.get(2..s.len() - 2).unwrap_or_default().to_string())
    } else {
        Segment::InlineMath(s[1..s.len() - 1].to_string())
    }
}

// ---------------- 终端显示：LaTeX → Unicode 近似 ----------------
static SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("alpha", "α"),
        ("beta", "β"),
        ("gamma", "γ"),
        ("delta", "δ"),
        ("epsilon", "ε"),
        ("varepsilon", "ε"),
        ("zeta", "ζ"),
        ("eta", "η"),
        ("theta", "θ"),
        ("lambda", "λ"),
        ("mu", "μ"),
        ("nu", "ν"),
        ("xi", "ξ"),
        ("pi", "π"),
        ("rho", "ρ"),
        ("sigma", "σ"),
        ("tau", "τ"),
        ("phi", "φ"),
        ("varphi", "φ"),
        ("chi", "χ"),
        ("psi", "ψ"),
        ("omega", "ω"),
        ("Gamma", "Γ"),
        ("Delta", "Δ"),
        ("Theta", "Θ"),
        ("Lambda", "Λ"),
        ("Pi", "Π"),
        ("Sigma", "Σ"),
        ("Phi", "Φ"),
        ("Omega", "Ω"),
        ("cdot", "·"),
        ("times", "×"),
        ("div", "÷"),
        ("pm", "±"),
        ("mp", "∓"),
        ("le", "≤"),
        ("leq", "≤"),
        ("ge", "≥"),
        ("geq", "≥"),
        ("ne", "≠"),
        ("neq", "≠"),
        ("approx", "≈"),
        ("equiv", "≡"),
        ("sim", "∼"),
        ("infty", "∞"),
        ("sum", "∑"),
        ("prod", "∏"),
        ("int", "∫"),
        ("oint", "∮"),
        ("partial", "∂"),
        ("nabla", "∇"),
        ("sqrt", "√"),
        ("in", "∈"),
        ("notin", "∉"),
        ("subset", "⊂"),
        ("subseteq", "⊆"),
        ("cup", "∪"),
        ("cap", "∩"),
        ("emptyset", "∅"),
        ("forall", "∀"),
        ("exists", "∃"),
        ("neg", "¬"),
        ("land", "∧"),
        ("lor", "∨"),
        ("to", "→"),
        ("rightarrow", "→"),
        ("leftarrow", "←"),
        ("Rightarrow", "⇒"),
        ("Leftrightarrow", "⇔"),
        ("implies", "⇒"),
        ("iff", "⇔"),
        ("mapsto", "↦"),
        ("degree", "°"),
        ("circ", "∘"),
        ("ldots", "…"),
        ("cdots", "⋯"),
        ("dots", "…"),
        ("quad", "  "),
        ("qquad", "    "),
        ("left", ""),
        ("right", ""),
        ("displaystyle", ""),
        ("mathbb", ""),
        ("mathrm", ""),
        ("text", ""),
    ])
});

static FRAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\d?frac\{([^{}]*)\}\{([^{}]*)\}").expect("frac regex"));
static SQRT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\sqrt\{([^{}]*)\}").expect("sqrt regex"));
static ENV_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:begin|end)\{[^}]+\}").expect("env regex"));
static COMMAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([A-Za-z]+)").expect("command regex"));
static SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\^_])(?:\{([^{}]*)\}|([0-9A-Za-z+\-=()]))").expect("script regex"));

/// 终端无法排版公式，这里只做常见符号的近似替换
pub fn latex_to_unicode(src: &str) -> String {
    let s = ENV_TAG.replace_all(src, "");
    let s = s.replace(r"\\", "\n").replace('&', "  ");
    let s = s.replace(r"\,", " ").replace(r"\;", " ").replace(r"\!", "");
    let s = FRAC.replace_all(&s, "($1)/($2)");
    let s = SQRT.replace_all(&s, "√($1)");
    let s = COMMAND.replace_all(&s, |caps: &Captures| match SYMBOLS.get(&caps[1]) {
        Some(sym) => sym.to_string(),
        None => caps[0].to_string(),
    });
    let s = SCRIPT.replace_all(&s, |caps: &Captures| {
        let body = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");
        let table: fn(char) -> Option<char> = if &caps[1] == "^" {
            superscript
        } else {
            subscript
        };
        match body.chars().map(table).collect::<Option<String>>() {
            Some(mapped) => mapped,
            None => format!("{}({})", &caps[1], body),
        }
    });
    s.trim().to_string()
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'n' => 'ⁿ',
        'i' => 'ⁱ',
        'x' => 'ˣ',
        'T' => 'ᵀ',
        _ => return None,
    })
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'n' => 'ₙ',
        'k' => 'ₖ',
        'x' => 'ₓ',
        _ => return None,
    })
}
