use anyhow::{bail, Context, Result};
use bingo_core::UserId;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern compiles"));

/// Collects player ids from chat mentions (`<@123>`, `<@!123>`) or bare
/// numeric ids. Order is kept; repeats are left for the engine to collapse.
pub fn parse_players(inputs: &[String]) -> Result<Vec<UserId>> {
    let mut players = Vec::new();

    for input in inputs {
        let mut found = false;
        for caps in MENTION_REGEX.captures_iter(input) {
            players.push(parse_user_id(&caps[1])?);
            found = true;
        }
        if found {
            continue;
        }

        for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            players.push(parse_user_id(token)?);
        }
    }

    Ok(players)
}

pub fn parse_user_id(input: &str) -> Result<UserId> {
    let trimmed = input.trim();
    let digits = MENTION_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    match digits.parse::<UserId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => bail!("'{}' is not a user mention or id", input),
    }
}

/// One description per CSV record. Only the first column is used; blank
/// records and `#` comments are skipped.
pub fn parse_events(contents: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut events = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed events record {}", index + 1))?;
        if let Some(event) = record.get(0).filter(|event| !event.is_empty()) {
            events.push(event.to_string());
        }
    }

    Ok(events)
}

pub async fn read_events_file(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read events file {}", path.display()))?;
    parse_events(&contents)
}
