use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", rule(title).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Underline matching the displayed width of `title`
fn rule(title: &str) -> String {
    "─".repeat(title.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_counts_chars() {
        assert_eq!(rule("nomad_cluster"), "─".repeat(13));
        assert_eq!(rule("ℹ x"), "───");
        assert_eq!(rule(""), "");
    }
}
