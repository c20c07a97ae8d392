use crate::commands::COMMAND_NAMES;
use reedline::{Completer, Span, Suggestion};

/// Completes shell commands, and table ids after `\use`
pub struct CommandCompleter {
    table_ids: Vec<String>,
}

impl CommandCompleter {
    pub fn new(table_ids: Vec<String>) -> Self {
        Self { table_ids }
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let word_start = input.rfind(' ').map_or(0, |i| i + 1);
        let partial = &input[word_start..];

        let (candidates, append_whitespace): (Vec<&str>, bool) =
            if input.trim_start().starts_with("\\use ") {
                (self.table_ids.iter().map(String::as_str).collect(), false)
            } else if word_start == 0 {
                (COMMAND_NAMES.to_vec(), true)
            } else {
                (Vec::new(), false)
            };

        candidates
            .into_iter()
            .filter(|c| c.starts_with(partial))
            .map(|value| Suggestion {
                value: value.to_string(),
                description: None,
                extra: None,
                span: Span {
                    start: word_start,
                    end: pos,
                },
                style: None,
                append_whitespace,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_commands_and_tables() {
        let mut completer = CommandCompleter::new(vec!["sales.orders".into(), "hr.employees".into()]);

        let commands = completer.complete("\\se", 3);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].value, "\\search");

        let tables = completer.complete("\\use sa", 7);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].value, "sales.orders");
        assert_eq!(tables[0].span.start, 5);
    }
}
