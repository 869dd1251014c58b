use std::{io::IsTerminal, path::Path};

use {
    anyhow::{Result, bail},
    voicewatch_config::{Diagnostic, Severity, ValidationResult, validate},
};

/// Validate the config and print a report to stderr. Errors fail the command.
pub fn handle_check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);
    let color = std::io::stderr().is_terminal();
    eprint!("{}", render_report(&result, verbose, color));

    let errors = result.count(Severity::Error);
    if errors > 0 {
        bail!("{errors} configuration error(s)");
    }
    Ok(())
}

/// Errors first, then warnings, then (with `verbose`) info.
fn render_report(result: &ValidationResult, verbose: bool, color: bool) -> String {
    let mut out = match result.config_path {
        Some(ref path) => format!("Checking {}\n\n", path.display()),
        None => "No config file found; checking defaults and environment.\n\n".to_string(),
    };

    let mut shown: Vec<&Diagnostic> = result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .collect();
    shown.sort_by_key(|d| d.severity);

    for d in &shown {
        out.push_str("  ");
        out.push_str(&label(d.severity, color));
        if !d.path.is_empty() {
            out.push(' ');
            out.push_str(&d.path);
            out.push(':');
        }
        out.push(' ');
        out.push_str(&d.message);
        out.push('\n');
    }
    if !shown.is_empty() {
        out.push('\n');
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        out.push_str("No issues found.\n");
    } else {
        out.push_str(&format!("{errors} error(s), {warnings} warning(s)\n"));
    }
    out
}

fn label(severity: Severity, color: bool) -> String {
    let (code, name) = match severity {
        Severity::Error => ("31", "error"),
        Severity::Warning => ("33", "warning"),
        Severity::Info => ("36", "info"),
    };
    if color {
        format!("\x1b[1;{code}m{name}\x1b[0m")
    } else {
        name.to_string()
    }
}
