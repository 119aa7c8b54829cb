use crate::cache::UsageTotals;
use crate::config::UsageConfig;
use crate::conversation::ChatLine;
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
}

pub fn print_line(line: &ChatLine) {
    let Some(prefix) = line.prefix() else {
        println!("{}", line.text().bright_black());
        return;
    };

    let prefix = format!("{}:", prefix);
    let prefix = match line {
        ChatLine::Question(_) => prefix.yellow().bold(),
        ChatLine::Answer(_) => prefix.green().bold(),
        ChatLine::Error(_) => prefix.red().bold(),
        ChatLine::System(_) | ChatLine::Raw(_) => prefix.bright_black(),
    };
    println!("{} {}", prefix, line.text());
}

pub fn print_usage(totals: &UsageTotals, rates: &UsageConfig) {
    let tokens = &totals.tokens;
    println!(
        "{} prompt {} / completion {} / total {}",
        "Tokens:".bold(),
        tokens.prompt_tokens,
        tokens.completion_tokens,
        tokens.total_tokens
    );
    println!("{} ${:.6}", "Estimated cost:".bold(), totals.total_cost);
    println!(
        "{} ${} per prompt token / ${} per completion token",
        "Rates:".bold(),
        rates.input_rate,
        rates.output_rate
    );
}

pub fn print_matches(query: &str, matches: &[String]) {
    if matches.is_empty() {
        print_info(&format!("No results found for '{}'", query));
        return;
    }
    for line in matches {
        println!("  {}", line);
    }
}
