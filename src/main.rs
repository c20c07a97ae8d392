use anyhow::Context;
use crossterm::style::Stylize;
use dbpres_viewer::config::Config;
use dbpres_viewer::data::Catalog;
use dbpres_viewer::services::{TableService, TableViewController};
use dbpres_viewer::solr::HttpTransport;
use dbpres_viewer::utils::app_paths::AppPaths;
use dbpres_viewer::utils::logging::{get_log_buffer, init_tracing};
use dbpres_viewer::ViewerError;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};
use std::borrow::Cow;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing::info;

mod commands;
mod completer;
mod table_display;

use commands::Command;
use completer::CommandCompleter;
use table_display::{display_catalog, display_table, export_to_csv};

type Controller = TableViewController<HttpTransport>;

struct ViewerPrompt {
    table_id: Option<String>,
}

impl Prompt for ViewerPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match &self.table_id {
            Some(id) => Cow::Owned(format!("{} ", id)),
            None => Cow::Borrowed("dbpres "),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn print_usage() {
    println!("{}", "dbpres-viewer - browse preserved databases".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  dbpres-viewer [OPTIONS]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}  - Read configuration from PATH", "--config PATH".green());
    println!("  {}    - Override the backend base URL", "--url URL".green());
    println!("  {} - Override the collection", "--collection NAME".green());
    println!("  {} - Write a commented default config", "--generate-config".green());
    println!("  {}           - Show this help", "--help".green());
    println!();
}

fn print_help() {
    println!("{}", "Commands:".yellow());
    println!("  {} - List schemas and tables", "\\schemas".green());
    println!("  {} - Show a table", "\\use <schema.table>".green());
    println!("  {} - Sort by column n (again to reverse)", "\\sort <n>".green());
    println!("  {} - Search the table (no text clears)", "\\search [text]".green());
    println!("  {} - Next / previous page", "\\next, \\prev".green());
    println!("  {} - Jump to page n", "\\page <n>".green());
    println!("  {} - Set the page size", "\\rows <n>".green());
    println!("  {} - Show the current table again", "\\show".green());
    println!("  {} - Rediscover schemas and tables", "\\reload".green());
    println!("  {} - Export the current page to CSV", "\\export <file.csv>".green());
    println!("  {} - Show recent log entries", "\\logs [n]".green());
    println!("  {} - Clear screen", "\\clear".green());
    println!("  {} - Exit (or Ctrl+D)", "\\quit".green());
    println!("  Any other text searches the current table.");
    println!();
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}

fn load_config(args: &[String]) -> anyhow::Result<Config> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => Config::load_from(&PathBuf::from(&path))
            .with_context(|| format!("loading config from {}", path))?,
        None => Config::load().context("loading default config")?,
    };
    if let Some(url) = arg_value(args, "--url") {
        config.backend.base_url = url;
    }
    if let Some(collection) = arg_value(args, "--collection") {
        config.backend.collection = collection;
    }
    config.validate()?;
    Ok(config)
}

fn generate_config() -> anyhow::Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::create_default_with_comments())?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn report(err: &ViewerError) {
    if !err.is_superseded() {
        eprintln!("{}", format!("Error: {}", err).red());
    }
}

fn discover(rt: &Runtime, controller: &Controller, config: &Config) -> Catalog {
    match rt.block_on(controller.discover_and_show(config.discovery_options())) {
        Ok(discovery) => {
            display_catalog(&discovery.catalog, Some(&discovery.initial_table));
            println!();
            display_table(&controller.state(), config.display.max_cell_width);
            discovery.catalog
        }
        Err(err) => {
            report(&err);
            Catalog::default()
        }
    }
}

fn build_editor(catalog: &Catalog) -> anyhow::Result<Reedline> {
    let history_file = AppPaths::history_file()?;
    let history = Box::new(
        FileBackedHistory::with_file(200, history_file)
            .map_err(|e| anyhow::anyhow!("configuring history: {}", e))?,
    );

    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_completion")
            .with_columns(1)
            .with_column_width(None)
            .with_column_padding(2),
    );

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Menu("command_completion".to_string()),
    );

    Ok(Reedline::create()
        .with_completer(Box::new(CommandCompleter::new(catalog.table_ids())))
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_history(history)
        .with_edit_mode(Box::new(Emacs::new(keybindings))))
}

fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        print_help();
        return Ok(());
    }
    if args.iter().any(|a| a == "--generate-config") {
        return generate_config();
    }

    let config = load_config(&args)?;
    let rt = Runtime::new()?;
    let transport = HttpTransport::new(&config.select_url(), config.timeout())?;
    let controller = TableViewController::new(
        TableService::new(transport),
        config.display.default_page_size,
    );

    println!("{}", format!("Backend: {}", config.select_url()).cyan());
    info!(target: "system", "Using backend {}", config.select_url());

    let mut catalog = discover(&rt, &controller, &config);
    let mut line_editor = build_editor(&catalog)?;

    loop {
        let prompt = ViewerPrompt {
            table_id: controller.state().table_id,
        };
        let buffer = match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => buffer,
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nGoodbye!");
                break;
            }
        };
        if buffer.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&buffer) {
            Ok(command) => command,
            Err(usage) => {
                eprintln!("{}", usage.red());
                continue;
            }
        };

        let outcome = match command {
            Command::Quit => {
                println!("Goodbye!");
                break;
            }
            Command::Help => {
                print_help();
                continue;
            }
            Command::Clear => {
                print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
                continue;
            }
            Command::Schemas => {
                display_catalog(&catalog, controller.state().table_id.as_deref());
                continue;
            }
            Command::Logs(count) => {
                if let Some(buffer) = get_log_buffer() {
                    for entry in buffer.get_recent(count) {
                        println!("{}", entry.format_for_display());
                    }
                }
                continue;
            }
            Command::Export(filename) => {
                match export_to_csv(&controller.state(), &filename) {
                    Ok(rows) => println!("{}", format!("Exported {} rows to {}", rows, filename).green()),
                    Err(e) => eprintln!("{}", format!("Export error: {}", e).red()),
                }
                continue;
            }
            Command::Reload => {
                catalog = discover(&rt, &controller, &config);
                line_editor = build_editor(&catalog)?;
                continue;
            }
            Command::Show => Ok(()),
            Command::Use(table_id) => {
                if !catalog.schemas.is_empty() && catalog.table(&table_id).is_none() {
                    eprintln!("{}", format!("Unknown table '{}'; see \\schemas", table_id).red());
                    continue;
                }
                rt.block_on(controller.select_table(&table_id))
            }
            Command::Sort(column) => rt.block_on(controller.sort_by(column)),
            Command::Search(text) => rt.block_on(controller.search(&text)),
            Command::Next => rt.block_on(controller.next_page()),
            Command::Prev => rt.block_on(controller.prev_page()),
            Command::Page(page) => rt.block_on(controller.go_to_page(page)),
            Command::Rows(rows) => {
                let sizes = &config.display.page_sizes;
                if !sizes.is_empty() && !sizes.contains(&rows) {
                    eprintln!("{}", format!("Page size must be one of {:?}", sizes).red());
                    continue;
                }
                rt.block_on(controller.set_page_size(rows))
            }
        };

        match outcome {
            Ok(()) => display_table(&controller.state(), config.display.max_cell_width),
            Err(err) => report(&err),
        }
    }

    Ok(())
}
