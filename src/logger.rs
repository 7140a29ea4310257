/// Set to false to hide date in logs
const LOG_SHOW_DATE: bool = false;
/// Set to false to hide time in logs
const LOG_SHOW_TIME: bool = true;

/// Log format character widths (hardcoded for precise alignment)
const TAG_WIDTH: usize = 8;
const LOG_TYPE_WIDTH: usize = 10;
const BRACKET_SPACE_WIDTH: usize = 3;
const TOTAL_PREFIX_WIDTH: usize = TAG_WIDTH + LOG_TYPE_WIDTH + BRACKET_SPACE_WIDTH * 2;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 155;

use chrono::Local;
use colored::*;

/// Log tags for categorizing log messages.
#[derive(Debug)]
pub enum LogTag {
    Monitor,
    Enrich,
    Score,
    Stream,
    Api,
    Rpc,
    Price,
    Server,
    Websocket,
    System,
    Other(String),
}

impl LogTag {
    fn label(&self) -> &str {
        match self {
            LogTag::Monitor => "MONITOR",
            LogTag::Enrich => "ENRICH",
            LogTag::Score => "SCORE",
            LogTag::Stream => "STREAM",
            LogTag::Api => "API",
            LogTag::Rpc => "RPC",
            LogTag::Price => "PRICE",
            LogTag::Server => "SERVER",
            LogTag::Websocket => "WS",
            LogTag::System => "SYSTEM",
            LogTag::Other(s) => s,
        }
    }

    fn colored_label(&self) -> ColoredString {
        let padded = format!("{:<width$}", self.label(), width = TAG_WIDTH);
        match self {
            LogTag::Monitor => padded.bright_cyan().bold(),
            LogTag::Enrich => padded.bright_blue().bold(),
            LogTag::Score => padded.bright_green().bold(),
            LogTag::Stream => padded.bright_magenta().bold(),
            LogTag::Api => padded.cyan().bold(),
            LogTag::Rpc => padded.blue().bold(),
            LogTag::Price => padded.yellow().bold(),
            LogTag::Server => padded.magenta().bold(),
            LogTag::Websocket => padded.bright_white().bold(),
            LogTag::System => padded.bright_yellow().bold(),
            LogTag::Other(_) => padded.white().bold(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.colored_label())
    }
}

/// Logs a message with time, tag, log type, and message.
pub fn log(tag: LogTag, log_type: &str, message: &str) {
    let now = Local::now();
    let date = now.format("%Y-%m-%d").to_string();
    let time = now.format("%H:%M:%S").to_string();
    let mut prefix = String::new();
    if LOG_SHOW_DATE && LOG_SHOW_TIME {
        prefix = format!("{} {} ", date, time);
    } else if LOG_SHOW_DATE {
        prefix = format!("{} ", date);
    } else if LOG_SHOW_TIME {
        prefix = format!("{} ", time);
    }
    let prefix = if !prefix.is_empty() { prefix.dimmed().to_string() } else { String::new() };

    let tag_str = tag.colored_label();

    let log_type_str = match log_type.to_uppercase().as_str() {
        "ERROR" => format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_red().bold(),
        "WARN" | "WARNING" =>
            format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_yellow().bold(),
        "SUCCESS" | "PASSED" =>
            format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_green().bold(),
        "INFO" => format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_blue().bold(),
        "DEBUG" => format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_black().bold(),
        "FILTERED" =>
            format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_magenta().bold(),
        "RECONNECT" | "SUBSCRIBE" | "CONNECT" =>
            format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).bright_cyan().bold(),
        _ => format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH).white().bold(),
    };

    let base_line = format!("{}[{}] [{}] ", prefix, tag_str, log_type_str);

    let base_length = strip_ansi_codes(&base_line)
        .len()
        .max(TOTAL_PREFIX_WIDTH + prefix.len());
    let available_space = if MAX_LINE_LENGTH > base_length {
        MAX_LINE_LENGTH - base_length
    } else {
        50
    };

    let message_chunks = wrap_text(message, available_space);

    println!("{}{}", base_line, message_chunks[0].bright_white());

    if message_chunks.len() > 1 {
        let continuation_prefix = format!(
            "{}{}",
            " ".repeat(prefix.len()),
            " ".repeat(TOTAL_PREFIX_WIDTH)
        );
        for chunk in &message_chunks[1..] {
            println!("{}{}", continuation_prefix, chunk.bright_white());
        }
    }
}

/// Helper function to remove ANSI color codes for length calculation
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;

    for ch in text.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape && ch == 'm' {
            in_escape = false;
        } else if !in_escape {
            result.push(ch);
        }
    }
    result
}

/// Helper function to wrap text at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.len() <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + word.len() + 1 <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        let colored = format!("{}", "hello".bright_red().bold());
        assert_eq!(strip_ansi_codes(&colored), "hello");
    }

    #[test]
    fn test_wrap_text_short() {
        assert_eq!(wrap_text("short", 100), vec!["short".to_string()]);
    }

    #[test]
    fn test_wrap_text_long() {
        let chunks = wrap_text("one two three four five", 9);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 9);
        }
    }
}
