use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use authsync_core::keys;
use authsync_reconciler::{Diagnostic, Severity};

use crate::cli::OutputFormat;
use crate::state::StateFile;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let msg = format!("{}: {}", diag.summary, diag.detail);
        match diag.severity {
            Severity::Error => print_error(&msg),
            Severity::Warning => print_warning(&msg),
        }
    }
}

pub fn print_state(state: &StateFile, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({"id": state.id, "attributes": state.attributes});
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            );
        }
        OutputFormat::Table => print_as_table(state),
    }
}

fn print_as_table(state: &StateFile) {
    let method_type = state
        .attributes
        .get(keys::TYPE)
        .and_then(Value::as_str)
        .unwrap_or("-");
    println!("{} {} ({})", "Auth method:".cyan(), state.id.cyan(), method_type);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, value) in &state.attributes {
        builder.push_record([key.clone(), display_value(key, value)]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn display_value(key: &str, value: &Value) -> String {
    match value {
        _ if key == keys::OIDC_CLIENT_SECRET => "(sensitive)".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), |s| s.trim().to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value("client_secret", &json!("s3cr3t")), "(sensitive)");
        assert_eq!(display_value("issuer", &json!("https://idp")), "https://idp");
        assert_eq!(display_value("idp_ca_certs", &json!(["A\n", "B"])), "A, B");
        assert_eq!(display_value("max_age", &json!(60)), "60");
    }
}
