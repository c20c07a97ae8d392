/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Schemas,
    Use(String),
    Sort(usize),
    Search(String),
    Next,
    Prev,
    Page(usize),
    Rows(usize),
    Show,
    Reload,
    Export(String),
    Logs(usize),
    Help,
    Clear,
    Quit,
}

pub const COMMAND_NAMES: &[&str] = &[
    "\\schemas", "\\use", "\\sort", "\\search", "\\next", "\\prev", "\\page", "\\rows", "\\show",
    "\\reload", "\\export", "\\logs", "\\help", "\\clear", "\\quit",
];

const DEFAULT_LOG_LINES: usize = 20;

fn number(arg: &str, usage: &str) -> Result<usize, String> {
    arg.parse()
        .map_err(|_| format!("Usage: {} (got '{}')", usage, arg))
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match name {
            "\\schemas" | "\\tables" => Command::Schemas,
            "\\use" if !arg.is_empty() => Command::Use(arg.to_string()),
            "\\use" => return Err("Usage: \\use <schema.table>".to_string()),
            "\\sort" => Command::Sort(number(arg, "\\sort <column number>")?),
            "\\search" => Command::Search(arg.to_string()),
            "\\next" => Command::Next,
            "\\prev" => Command::Prev,
            "\\page" => Command::Page(number(arg, "\\page <n>")?),
            "\\rows" => Command::Rows(number(arg, "\\rows <page size>")?),
            "\\show" => Command::Show,
            "\\reload" => Command::Reload,
            "\\export" if !arg.is_empty() => Command::Export(arg.to_string()),
            "\\export" => return Err("Usage: \\export <filename.csv>".to_string()),
            "\\logs" if arg.is_empty() => Command::Logs(DEFAULT_LOG_LINES),
            "\\logs" => Command::Logs(number(arg, "\\logs [n]")?),
            "\\help" | "\\?" => Command::Help,
            "\\clear" => Command::Clear,
            "\\quit" | "\\q" | "exit" => Command::Quit,
            // bare text searches the current table
            _ if !name.starts_with('\\') => Command::Search(line.to_string()),
            _ => return Err(format!("Unknown command '{}'; try \\help", name)),
        };
        Ok(command)
    }
}
