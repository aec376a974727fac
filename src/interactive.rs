use std::{
    fmt,
    io::{self, Write},
    time::Duration,
};

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, InquireError, Select, Text};

use crate::{
    config::EnvironmentContext,
    printer::{describe_options, mask, render_descriptor, render_history, render_result},
    session::{is_cors_error, Session},
    template::render_export_template,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

pub async fn run_interactive(environment: &EnvironmentContext) -> Result<()> {
    let mut ui = InquireUi::default();
    run_interactive_with_ui(environment, &mut ui).await
}

pub(crate) async fn run_interactive_with_ui(
    environment: &EnvironmentContext,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    let mut session = environment.session();
    ui.print(&format!("apilab v{} (built {})", VERSION, BUILD_TIMESTAMP));

    let ids: Vec<String> = session.catalog().ids().map(str::to_string).collect();
    if ids.is_empty() {
        ui.print("No APIs in the catalog");
        return Ok(());
    }

    let mut cursor = 0;
    loop {
        let mut labels: Vec<String> = session
            .catalog()
            .iter()
            .map(|api| {
                let auth = if api.auth_required { " 🔑" } else { "" };
                format!("{} · {}{}", api.display_name(), api.category, auth)
            })
            .collect();
        labels.push("Quit".to_string());

        let index = ui.select("Choose an API", &labels, cursor)?;
        let Some(id) = ids.get(index) else {
            break;
        };
        cursor = index;

        session.select(id)?;
        run_sandbox(&mut session, ui).await?;
    }

    Ok(())
}

#[derive(Clone)]
enum SandboxItem {
    Run,
    FixCors,
    SetKey(Option<String>),
    ToggleMock(bool),
    EditMock,
    ToggleProxy(bool),
    Guide,
    History(usize),
    ClearHistory,
    Export,
    Back,
}

impl fmt::Display for SandboxItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxItem::Run => write!(f, "▶ Run"),
            SandboxItem::FixCors => write!(f, "⇢ Fix with proxy"),
            SandboxItem::SetKey(Some(masked)) => write!(f, "Set API key ({masked})"),
            SandboxItem::SetKey(None) => write!(f, "Set API key (none)"),
            SandboxItem::ToggleMock(on) => write!(f, "Mock mode: {}", on_off(*on)),
            SandboxItem::EditMock => write!(f, "Edit mock body"),
            SandboxItem::ToggleProxy(on) => write!(f, "CORS proxy: {}", on_off(*on)),
            SandboxItem::Guide => write!(f, "Show guide"),
            SandboxItem::History(count) => write!(f, "↻ History ({count})"),
            SandboxItem::ClearHistory => write!(f, "Clear history"),
            SandboxItem::Export => write!(f, "Export js-fetch snippet"),
            SandboxItem::Back => write!(f, "← Back"),
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn sandbox_menu(session: &Session) -> Vec<SandboxItem> {
    let options = session.options();
    let mut items = vec![SandboxItem::Run];
    if session.last_result().is_some_and(is_cors_error) {
        items.push(SandboxItem::FixCors);
    }
    items.extend([
        SandboxItem::SetKey(options.credential().map(mask)),
        SandboxItem::ToggleMock(options.mock_mode_enabled),
        SandboxItem::EditMock,
        SandboxItem::ToggleProxy(options.proxy_enabled),
        SandboxItem::Guide,
        SandboxItem::History(session.history().len()),
        SandboxItem::ClearHistory,
        SandboxItem::Export,
        SandboxItem::Back,
    ]);
    items
}

async fn run_sandbox(session: &mut Session, ui: &mut dyn InteractiveUi) -> Result<()> {
    let title = match session.descriptor() {
        Some(descriptor) => {
            ui.print(&render_descriptor(descriptor));
            descriptor.display_name().to_string()
        }
        None => return Ok(()),
    };

    loop {
        let items = sandbox_menu(session);
        let labels: Vec<String> = items.iter().map(|item| item.to_string()).collect();
        let index = ui.select(&title, &labels, 0)?;
        let choice = items
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("invalid menu selection"))?;

        match choice {
            SandboxItem::Run => run_and_show(session, ui, false).await?,
            SandboxItem::FixCors => run_and_show(session, ui, true).await?,
            SandboxItem::SetKey(_) => {
                let current = session.options().credential.clone();
                if let Some(value) = ui.input("API key (empty to clear)", current.as_deref())? {
                    session.set_credential(Some(value.trim().to_string()));
                }
            }
            SandboxItem::ToggleMock(on) => session.set_mock_mode(!on),
            SandboxItem::EditMock => {
                ui.print("Current mock body:");
                ui.print(&session.options().editable_mock_body);
                ui.print("Paste the new JSON body. Finish with an empty line.");
                match ui.read_multiline("json>")? {
                    Some(body) => {
                        session.set_mock_body(body);
                        session.set_mock_mode(true);
                        ui.print("Mock body updated; mock mode is on.");
                    }
                    None => ui.print("Edit cancelled."),
                }
            }
            SandboxItem::ToggleProxy(on) => session.set_proxy(!on),
            SandboxItem::Guide => {
                if let Some(descriptor) = session.descriptor() {
                    ui.print(&render_descriptor(descriptor));
                }
            }
            SandboxItem::History(_) => handle_history(session, ui)?,
            SandboxItem::ClearHistory => {
                if session.history().is_empty() {
                    ui.print("History is already empty.");
                } else if ui.confirm("Clear all history entries?", false)? {
                    session.clear_history();
                    ui.print("History cleared.");
                }
            }
            SandboxItem::Export => {
                if let Some(descriptor) = session.descriptor() {
                    ui.print(&render_export_template(
                        "js-fetch",
                        descriptor,
                        session.options(),
                        session.proxy_base(),
                    )?);
                }
            }
            SandboxItem::Back => break,
        }
    }

    Ok(())
}

async fn run_and_show(
    session: &mut Session,
    ui: &mut dyn InteractiveUi,
    fix_cors: bool,
) -> Result<()> {
    ui.start_pending("Running request...");
    let outcome = if fix_cors {
        session.fix_cors().await
    } else {
        session.run().await
    };
    ui.finish_pending();

    let result = outcome?;
    ui.print(&render_result(&result, session.descriptor()));
    if fix_cors && session.cors_hint_visible() {
        ui.print("The CORS relay is now on: it re-issues the request server-side, so browser cross-origin rules no longer apply.");
    }
    Ok(())
}

fn handle_history(session: &mut Session, ui: &mut dyn InteractiveUi) -> Result<()> {
    if session.history().is_empty() {
        ui.print("No runs yet.");
        return Ok(());
    }

    ui.print(&render_history(session.history()));
    let ids: Vec<u64> = session.history().entries().map(|entry| entry.id).collect();
    let mut labels: Vec<String> = session
        .history()
        .entries()
        .map(|entry| {
            format!(
                "Restore #{} ({} {}, {})",
                entry.id,
                entry.status_code,
                entry.source,
                describe_options(&entry.snapshot_options)
            )
        })
        .collect();
    labels.push("← Back".to_string());

    let index = ui.select("Replay options from", &labels, 0)?;
    if let Some(id) = ids.get(index) {
        let restored = describe_options(session.restore(*id)?);
        ui.print(&format!(
            "Options restored ({restored}). Choose Run to execute again."
        ));
    }
    Ok(())
}

pub(crate) trait InteractiveUi {
    fn print(&mut self, message: &str);
    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<usize>;
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
    fn read_multiline(&mut self, prompt: &str) -> Result<Option<String>>;
    fn start_pending(&mut self, message: &str);
    fn finish_pending(&mut self);
}

#[derive(Default)]
struct InquireUi {
    spinner: Option<ProgressBar>,
}

impl InteractiveUi for InquireUi {
    fn print(&mut self, message: &str) {
        println!("{}", message);
    }

    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<usize> {
        let choice = Select::new(prompt, items.to_vec())
            .with_page_size(12)
            .with_starting_cursor(start)
            .prompt()?;
        items
            .iter()
            .position(|item| item == &choice)
            .ok_or_else(|| anyhow!("selection not found"))
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>> {
        let mut builder = Text::new(prompt);
        if let Some(value) = default {
            builder = builder.with_default(value);
        }
        match builder.prompt() {
            Ok(value) => Ok(Some(value)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        match Confirm::new(prompt).with_default(default).prompt() {
            Ok(value) => Ok(value),
            Err(other) => Err(other.into()),
        }
    }

    fn read_multiline(&mut self, prompt: &str) -> Result<Option<String>> {
        read_multiline_from_stdin(prompt)
    }

    fn start_pending(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    fn finish_pending(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

fn read_multiline_from_stdin(prompt: &str) -> Result<Option<String>> {
    let stdin = io::stdin();
    let mut lines = Vec::new();

    loop {
        print!("{} ", prompt);
        io::stdout().flush()?;

        let mut buffer = String::new();
        let bytes = stdin.read_line(&mut buffer)?;
        if bytes == 0 {
            // EOF
            return Ok(None);
        }

        let trimmed = buffer.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() {
            if lines.is_empty() {
                return Ok(None);
            }
            break;
        }

        lines.push(trimmed.to_string());
    }

    Ok(Some(lines.join("\n")))
}
