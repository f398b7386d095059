//! CLI commands
//!
//! Commands understood by the REPL and by `--command`.

use crate::core::{PageError, Result};
use crate::dom::{Document, MemoryDocument};
use crate::page::{PageHost, DEFAULT_LISTING_LIMIT};

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle one command line
pub fn handle_command(input: &str, host: &mut PageHost<MemoryDocument>) -> Result<CommandResult> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(CommandResult::None);
    }
    let (cmd, args) = match input.split_once(' ') {
        Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
        None => (input.to_lowercase(), ""),
    };

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "analyze" => {
            let result = host.install().analyze();
            Ok(CommandResult::Handled(serde_json::to_string_pretty(&result)?))
        }

        "list" | "ls" => {
            let Some(limit) = parse_arg(args, DEFAULT_LISTING_LIMIT) else {
                return Ok(usage("list [limit]"));
            };
            let mut session = host.install();
            let result = match session.last_result() {
                Some(result) => result.clone(),
                None => session.analyze(),
            };
            Ok(CommandResult::Handled(result.render_listing(limit)))
        }

        "mark" => {
            let mut session = host.install();
            let Some(count) = session.last_result().map(|r| r.len()) else {
                return Ok(CommandResult::Handled(
                    "Nothing to mark. Run 'analyze' first.".to_string(),
                ));
            };
            session.mark();
            Ok(CommandResult::Handled(format!(
                "Marked {} ({})",
                counted(count, "element"),
                counted(session.overlay_count(), "overlay node")
            )))
        }

        "unmark" => {
            host.install().unmark();
            Ok(CommandResult::Handled("Overlays removed".to_string()))
        }

        "overlays" => Ok(CommandResult::Handled(format!(
            "{} in document",
            counted(host.document().overlay_nodes().len(), "overlay node")
        ))),

        "selector" | "sel" => {
            let Some(ordinal) = args.parse::<usize>().ok() else {
                return Ok(usage("selector <ordinal>"));
            };
            let session = host.install();
            let output = match session.get_selector(ordinal) {
                Some(selector) => selector,
                None => {
                    let desc = session
                        .last_result()
                        .map(|r| r.describe(ordinal))
                        .unwrap_or_else(|| format!("[{}] (unknown element)", ordinal));
                    format!("No selector for {}", desc)
                }
            };
            Ok(CommandResult::Handled(output))
        }

        "text" => {
            let session = host.install();
            let text = if args.is_empty() {
                session.extract_text_default()
            } else {
                match args.parse::<usize>() {
                    Ok(max) if max > 0 => session.extract_text(max),
                    _ => return Ok(usage("text [max-length]")),
                }
            };
            Ok(CommandResult::Handled(text))
        }

        "load" | "open" => {
            if args.is_empty() {
                return Ok(usage("load <fixture.json>"));
            }
            let document = MemoryDocument::load(args)?;
            let summary = format!("Loaded {} ({})", document.url(), document.title());
            host.navigate(document);
            Ok(CommandResult::Handled(format!("{}; session reset", summary)))
        }

        "status" => Ok(CommandResult::Handled(status_text(host))),

        "config" => {
            let toml = toml::to_string_pretty(host.config())
                .map_err(|e| PageError::config(e.to_string()))?;
            Ok(CommandResult::Handled(toml))
        }

        _ => Ok(CommandResult::Handled(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            cmd
        ))),
    }
}

/// Parse an optional positive count, falling back to `default` when absent
fn parse_arg(args: &str, default: usize) -> Option<usize> {
    if args.is_empty() {
        return Some(default);
    }
    args.parse::<usize>().ok().filter(|&n| n > 0)
}

fn usage(text: &str) -> CommandResult {
    CommandResult::Handled(format!("Usage: {}", text))
}

/// `1 element`, `3 elements`
fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn status_text(host: &mut PageHost<MemoryDocument>) -> String {
    let installed = host.is_installed();
    let doc = host.document();
    let (url, title, viewport) = (doc.url(), doc.title(), doc.viewport());
    let overlay_nodes = doc.overlay_nodes().len();

    let elements = if installed {
        host.install()
            .last_result()
            .map(|r| r.len().to_string())
            .unwrap_or_else(|| "not analyzed".to_string())
    } else {
        "not installed".to_string()
    };

    format!(
        "Page Status:\n\
         ─────────────────────────────\n\
         URL:       {}\n\
         Title:     {}\n\
         Viewport:  {}x{}\n\
         Elements:  {}\n\
         Overlays:  {} nodes",
        url, title, viewport.width, viewport.height, elements, overlay_nodes
    )
}

/// Generate help text
fn help_text() -> String {
    r#"pagemark Commands:
─────────────────────────────────────────────
  help, ?            Show this help message
  exit, quit, q      Exit pagemark
  analyze            Analyze the page and print the snapshot as JSON
  list [n]           List up to n elements of the last snapshot
  mark               Draw numbered overlays for the last snapshot
  unmark             Remove all overlays
  overlays           Count overlay nodes in the document
  selector <n>       Print the selector of element n
  text [max]         Print readable page text
  load <path>        Load another page fixture (resets the session)
  status             Show page and session status
  config             Show the active configuration
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    const PAGE: &str = r#"{
        "url": "https://example.com/login",
        "title": "Login",
        "body": [
            { "tag": "input", "attrs": { "name": "user", "placeholder": "Username" },
              "rect": { "x": 20, "y": 40, "width": 200, "height": 24 } },
            { "tag": "button", "attrs": { "id": "submit" },
              "rect": { "x": 20, "y": 90, "width": 80, "height": 24 },
              "children": ["Sign in"] },
            { "tag": "p", "children": ["Forgot your password?"] }
        ]
    }"#;

    fn host() -> PageHost<MemoryDocument> {
        PageHost::new(MemoryDocument::from_json(PAGE).unwrap(), Config::default())
    }

    fn output(result: Result<CommandResult>) -> String {
        match result.unwrap() {
            CommandResult::Handled(text) => text,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_exit_and_blank() {
        let mut host = host();
        assert_eq!(handle_command("  ", &mut host).unwrap(), CommandResult::None);
        assert_eq!(handle_command("QUIT", &mut host).unwrap(), CommandResult::Exit);
    }

    #[test]
    fn test_analyze_outputs_json() {
        let mut host = host();
        let json = output(handle_command("analyze", &mut host));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["elements"].as_array().unwrap().len(), 2);
        assert_eq!(value["elements"][1]["selector"], "#submit");
        assert_eq!(value["focusedOrdinal"], serde_json::Value::Null);
    }

    #[test]
    fn test_list_analyzes_on_demand() {
        let mut host = host();
        let listing = output(handle_command("list", &mut host));
        assert_eq!(
            listing,
            "[1] input \"Username\" @(20,40)\n[2] button \"Sign in\" @(20,90)"
        );
        assert!(output(handle_command("list 0", &mut host)).starts_with("Usage"));
    }

    #[test]
    fn test_mark_unmark_cycle() {
        let mut host = host();
        assert!(output(handle_command("mark", &mut host)).contains("analyze"));
        handle_command("analyze", &mut host).unwrap();
        assert_eq!(
            output(handle_command("mark", &mut host)),
            "Marked 2 elements (4 overlay nodes)"
        );
        assert_eq!(output(handle_command("overlays", &mut host)), "4 overlay nodes in document");
        handle_command("unmark", &mut host).unwrap();
        assert_eq!(output(handle_command("overlays", &mut host)), "0 overlay nodes in document");
    }

    #[test]
    fn test_counts_pluralise() {
        assert_eq!(counted(1, "element"), "1 element");
        assert_eq!(counted(0, "element"), "0 elements");
        assert_eq!(counted(2, "overlay node"), "2 overlay nodes");
    }

    #[test]
    fn test_selector_lookup() {
        let mut host = host();
        handle_command("analyze", &mut host).unwrap();
        assert_eq!(output(handle_command("selector 1", &mut host)), "input[name=\"user\"]");
        assert_eq!(
            output(handle_command("selector 9", &mut host)),
            "No selector for [9] (unknown element)"
        );
        assert!(output(handle_command("selector x", &mut host)).starts_with("Usage"));
    }

    #[test]
    fn test_text_command() {
        let mut host = host();
        assert_eq!(
            output(handle_command("text", &mut host)),
            "Sign in Forgot your password?"
        );
        assert_eq!(output(handle_command("text 7", &mut host)), "Sign in...");
    }

    #[test]
    fn test_load_resets_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("next.json");
        std::fs::write(&path, r#"{ "url": "https://example.com/next", "title": "Next" }"#).unwrap();

        let mut host = host();
        handle_command("analyze", &mut host).unwrap();
        let loaded = output(handle_command(&format!("load {}", path.display()), &mut host));
        assert!(loaded.contains("https://example.com/next"));
        assert!(!host.is_installed());

        assert!(handle_command("load /definitely/missing.json", &mut host).is_err());
    }

    #[test]
    fn test_status_and_unknown() {
        let mut host = host();
        let status = output(handle_command("status", &mut host));
        assert!(status.contains("https://example.com/login"));
        assert!(status.contains("not installed"));
        assert!(output(handle_command("frobnicate", &mut host)).starts_with("Unknown command"));
    }
}
