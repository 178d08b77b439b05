//! Classification of one line of raw user input.

use super::types::Provider;

/// What a line of input means given the current session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    SelectProvider(Provider),
    Query(String),
    Unrecognized,
}

const START_PHRASE: &str = "start ai";
const SWITCH_KEYWORD: &str = "use";

impl Command {
    /// Parse `input`. Returns `None` when the trimmed input is empty.
    ///
    /// The switch command is checked before query interpretation, so
    /// `use perplexity` always switches once a session is started, even
    /// while another provider is active.
    pub fn parse(input: &str, started: bool, active: Option<Provider>) -> Option<Command> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if !started {
            return Some(if is_start(trimmed) {
                Command::Start
            } else {
                Command::Unrecognized
            });
        }

        if let Some(provider) = parse_switch(trimmed) {
            return Some(Command::SelectProvider(provider));
        }

        Some(match active {
            Some(_) => Command::Query(trimmed.to_string()),
            None => Command::Unrecognized,
        })
    }
}

fn is_start(trimmed: &str) -> bool {
    trimmed.eq_ignore_ascii_case(START_PHRASE)
}

/// `use <provider>` with exactly one token after the keyword.
fn parse_switch(trimmed: &str) -> Option<Provider> {
    let mut tokens = trimmed.split_whitespace();
    let keyword = tokens.next()?;
    let target = tokens.next()?;
    if tokens.next().is_some() || !keyword.eq_ignore_ascii_case(SWITCH_KEYWORD) {
        return None;
    }
    target.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(Command::parse("", false, None), None);
        assert_eq!(Command::parse("   \t\n", true, Some(Provider::Gemini)), None);
    }

    #[test]
    fn start_is_case_insensitive_and_trimmed() {
        assert_eq!(Command::parse("start ai", false, None), Some(Command::Start));
        assert_eq!(Command::parse("  START AI  ", false, None), Some(Command::Start));
        assert_eq!(Command::parse("Start Ai", false, None), Some(Command::Start));
    }

    #[test]
    fn anything_else_before_start_is_unrecognized() {
        for input in ["hello", "use gemini", "start", "start ai now", "startai"] {
            assert_eq!(
                Command::parse(input, false, None),
                Some(Command::Unrecognized),
                "input: {input}"
            );
        }
    }

    #[test]
    fn switch_is_recognized_once_started() {
        assert_eq!(
            Command::parse("use gemini", true, None),
            Some(Command::SelectProvider(Provider::Gemini))
        );
        assert_eq!(
            Command::parse("USE   Perplexity", true, None),
            Some(Command::SelectProvider(Provider::Perplexity))
        );
    }

    #[test]
    fn switch_takes_precedence_over_query() {
        assert_eq!(
            Command::parse("use perplexity", true, Some(Provider::Gemini)),
            Some(Command::SelectProvider(Provider::Perplexity))
        );
        assert_eq!(
            Command::parse("use gemini", true, Some(Provider::Gemini)),
            Some(Command::SelectProvider(Provider::Gemini))
        );
    }

    #[test]
    fn near_miss_switch_hits_gate_without_provider() {
        for input in ["use", "use bogus", "use gemini now", "usegemini"] {
            assert_eq!(
                Command::parse(input, true, None),
                Some(Command::Unrecognized),
                "input: {input}"
            );
        }
    }

    #[test]
    fn near_miss_switch_is_query_with_provider() {
        for input in ["use", "use bogus", "use gemini now"] {
            assert_eq!(
                Command::parse(input, true, Some(Provider::Gemini)),
                Some(Command::Query(input.to_string())),
                "input: {input}"
            );
        }
    }

    #[test]
    fn query_is_trimmed() {
        assert_eq!(
            Command::parse("  what is rust?  ", true, Some(Provider::Perplexity)),
            Some(Command::Query("what is rust?".into()))
        );
    }

    #[test]
    fn start_after_started_is_not_a_command() {
        assert_eq!(Command::parse("start ai", true, None), Some(Command::Unrecognized));
        assert_eq!(
            Command::parse("start ai", true, Some(Provider::Gemini)),
            Some(Command::Query("start ai".into()))
        );
    }
}
