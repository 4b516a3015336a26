use std::cell::Cell;

use colored::*;
use nfusion_common::logging::PRINT_TARGET;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;

thread_local! {
    static KEY_WIDTH: Cell<usize> = const { Cell::new(0) }
}

/// Emits a line verbatim through the print target.
pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

const BANNER: &str = r#"
          _   _ _____ _   _ ____ ___ ___  _   _
         | \ | |  ___| | | / ___|_ _/ _ \| \ | |
         |  \| | |_  | | | \___ \| | | | |  \| |
         | |\  |  _| | |_| |___) | | |_| | |\  |
         |_| \_|_|    \___/|____/___\___/|_| \_|
"#;

/// `label` centered in a line of `fill`, padded to [`TOTAL_WIDTH`].
fn rule(fill: &str, label: ColoredString, label_width: usize) -> String {
    let pad = TOTAL_WIDTH.saturating_sub(label_width);
    let left = pad / 2;
    format!(
        "{}{}{}",
        fill.repeat(left).color(colors::SEPARATOR),
        label,
        fill.repeat(pad - left).color(colors::SEPARATOR)
    )
}

pub fn banner(no_banner: bool, q_level: u8) {
    if no_banner || q_level > 0 {
        return;
    }

    let title = format!("⟦ NFUSION v{} ⟧", env!("CARGO_PKG_VERSION"));
    let width = title.width();
    print(&BANNER.bright_green().to_string());
    print(&rule("═", title.bright_green().bold(), width));
}

pub fn header(msg: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }

    let title = format!("⟦ {} ⟧", msg.to_uppercase());
    let width = title.width();
    print(&rule("─", title.bright_green(), width));
}

/// Sets the key column width used by [`aligned_line`].
pub fn set_key_width<'a>(keys: impl IntoIterator<Item = &'a str>) {
    KEY_WIDTH.set(keys.into_iter().map(str::len).max().unwrap_or(0));
}

fn dotted_key(key: &str, width: usize, key_color: Color) -> String {
    format!(
        "{}{}{}",
        key.color(key_color),
        ".".repeat((width + 1).saturating_sub(key.len())).color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR)
    )
}

pub fn aligned_line(key: &str, value: impl Into<ColoredString>) {
    let key = dotted_key(key, KEY_WIDTH.get(), colors::PRIMARY);
    print_status(format!("{key} {}", value.into()));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    print(&format!(
        "{} {}",
        ">".color(colors::SEPARATOR),
        msg.as_ref().color(colors::TEXT_DEFAULT)
    ));
}

pub fn tree_head(idx: usize, name: &str) {
    print(&format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        idx.to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    ));
}

/// Prints `key: value` rows as one tree level with dotted key padding.
pub fn as_tree_one_level(rows: Vec<(String, ColoredString)>) {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let last = rows.len().saturating_sub(1);
    for (i, (key, value)) in rows.into_iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        print(&format!(
            " {} {} {}",
            branch.bright_black(),
            dotted_key(&key, width, colors::TEXT_DEFAULT),
            value
        ));
    }
}

/// Indented continuation line under a tree entry.
pub fn tree_leaf(last: bool, msg: &str) {
    let branch = if last { "   └─" } else { "   ├─" };
    print(&format!("{} {}", branch.bright_black(), msg));
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{space}{msg}{space}"));
}

pub fn no_results() {
    centerln(&"no hosts survived normalization".red().bold().to_string());
}

pub fn end_of_program(q_level: u8) {
    if q_level == 0 {
        print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
    }
}
