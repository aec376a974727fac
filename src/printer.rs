use colored::{Color, Colorize};

use crate::{
    catalog::{ApiDescriptor, Catalog},
    engine::{ExecutionResult, ResultSource, RunOptions},
    explain::{annotate, Annotation},
    history::HistoryLog,
    session::{error_suggestion, is_cors_error},
    template::code_snippet,
};

pub fn print_execution_result(result: &ExecutionResult, descriptor: Option<&ApiDescriptor>) {
    println!("{}", render_result(result, descriptor));
}

pub fn render_result(result: &ExecutionResult, descriptor: Option<&ApiDescriptor>) -> String {
    let status_color = if result.status_code == 0 || result.status_code >= 400 {
        Color::Red
    } else if result.status_code >= 300 {
        Color::Yellow
    } else {
        Color::Green
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "{} {} {} {}",
        "Status:".bold(),
        format!("{}", result.status_code).color(status_color),
        format!("[{}]", result.source).color(source_color(result.source)),
        format!("({} ms)", result.duration_ms).dimmed()
    ));

    if !result.success {
        lines.push(format!(
            "{} {}",
            "Hint:".bold(),
            error_suggestion(result.status_code).yellow()
        ));
        if is_cors_error(result) && result.source != ResultSource::Proxy {
            lines.push(format!(
                "{} {}",
                "Tip:".bold(),
                "Retry through the CORS relay (--proxy, or \"Fix with proxy\" in the sandbox).".dimmed()
            ));
        }
    }

    lines.push("Body".bold().to_string());
    lines.push(
        serde_json::to_string_pretty(&result.payload)
            .unwrap_or_else(|_| result.payload.to_string()),
    );

    if let Some(descriptor) = descriptor {
        if result.success && !descriptor.json_explanation.is_empty() {
            lines.push(render_annotations(&annotate(
                &result.payload,
                &descriptor.json_explanation,
            )));
        }
    }

    lines.join("\n")
}

pub fn render_annotations(annotations: &[Annotation]) -> String {
    let mut lines = vec!["Fields".bold().to_string()];
    for annotation in annotations {
        let value = match &annotation.value {
            Some(value) => truncate(&value.to_string(), 60),
            None => "(not present)".dimmed().to_string(),
        };
        lines.push(format!(
            "  {} = {}  {}",
            annotation.path.cyan(),
            value,
            annotation.explanation.dimmed()
        ));
    }
    lines.join("\n")
}

pub fn render_descriptor(descriptor: &ApiDescriptor) -> String {
    let mut lines = vec![format!(
        "{} {}",
        descriptor.display_name().bold(),
        format!("({})", descriptor.id).dimmed()
    )];
    if !descriptor.category.is_empty() {
        lines.push(format!("{} {}", "Category:".bold(), descriptor.category));
    }
    if !descriptor.description.is_empty() {
        lines.push(descriptor.description.clone());
    }
    lines.push(format!("{} GET {}", "Endpoint:".bold(), descriptor.endpoint.cyan()));
    let auth = if descriptor.auth_required {
        format!("{} (required)", descriptor.auth_type).yellow().to_string()
    } else {
        "None".green().to_string()
    };
    lines.push(format!("{} {}", "Auth:".bold(), auth));
    if let Some(docs) = &descriptor.docs_url {
        lines.push(format!("{} {}", "Docs:".bold(), docs));
    }

    if !descriptor.json_explanation.is_empty() {
        lines.push("Response fields".bold().to_string());
        for (path, explanation) in &descriptor.json_explanation {
            lines.push(format!("  {}  {}", path.cyan(), explanation));
        }
    }

    if !descriptor.security_checklist.is_empty() {
        lines.push("Security checklist".bold().to_string());
        for item in &descriptor.security_checklist {
            lines.push(format!("  - {}", item));
        }
    }

    if let Some(exercise) = &descriptor.exercise {
        lines.push(format!("{} {}", "Exercise:".bold(), exercise));
    }

    lines.push("Code".bold().to_string());
    lines.push(code_snippet(descriptor).trim_end().dimmed().to_string());
    lines.join("\n")
}

pub fn render_catalog(catalog: &Catalog) -> String {
    catalog
        .iter()
        .map(|api| {
            let auth = if api.auth_required {
                api.auth_type.to_string().yellow().to_string()
            } else {
                "open".green().to_string()
            };
            format!(
                "{:<18} {:<22} {:<12} {}",
                api.id.cyan(),
                api.display_name(),
                api.category.dimmed(),
                auth
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_history(history: &HistoryLog) -> String {
    if history.is_empty() {
        return "No runs yet.".dimmed().to_string();
    }
    history
        .entries()
        .map(|entry| {
            let status = if entry.succeeded() {
                entry.status_code.to_string().green()
            } else {
                entry.status_code.to_string().red()
            };
            format!(
                "#{:<4} {} {:>3} {:<12} {:>6} ms  {}",
                entry.id,
                entry.timestamp.format("%H:%M:%S"),
                status,
                entry.source.to_string(),
                entry.duration_ms,
                describe_options(&entry.snapshot_options).dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn describe_options(options: &RunOptions) -> String {
    let mut parts = Vec::new();
    if options.mock_mode_enabled {
        parts.push("mock".to_string());
    }
    if let Some(credential) = options.credential() {
        parts.push(format!("key {}", mask(credential)));
    }
    if options.proxy_enabled {
        parts.push("proxy".to_string());
    }
    if parts.is_empty() {
        "direct".to_string()
    } else {
        parts.join(", ")
    }
}

pub(crate) fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(2).collect();
    format!("{visible}***")
}

fn source_color(source: ResultSource) -> Color {
    match source {
        ResultSource::Live => Color::Green,
        ResultSource::Proxy => Color::Blue,
        ResultSource::Mock | ResultSource::CustomMock => Color::Magenta,
    }
}

fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        value.to_string()
    } else {
        let head: String = value.chars().take(limit).collect();
        format!("{head}...")
    }
}
