//! Interactive REPL for pagemark
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use crate::cli::commands::{handle_command, CommandResult};
use crate::core::Result;
use crate::dom::{Document, MemoryDocument};
use crate::page::PageHost;

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    host: PageHost<MemoryDocument>,
}

impl Repl {
    pub fn new(host: PageHost<MemoryDocument>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &PageHost<MemoryDocument> {
        &self.host
    }

    /// Run the REPL on stdin/stdout
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        self.run_with(stdin.lock(), &mut stdout)
    }

    /// Run the REPL over arbitrary input and output streams
    pub fn run_with<R: BufRead, W: Write>(&mut self, mut input: R, output: &mut W) -> Result<()> {
        self.print_banner(output)?;

        loop {
            write!(output, "pagemark> ")?;
            output.flush()?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    writeln!(output, "\nGoodbye!")?;
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            match handle_command(&line, &mut self.host) {
                Ok(CommandResult::Exit) => {
                    writeln!(output, "Goodbye!")?;
                    break;
                }
                Ok(CommandResult::Handled(text)) => writeln!(output, "{}\n", text)?,
                Ok(CommandResult::None) => continue,
                Err(e) => writeln!(output, "Command error: {}\n", e)?,
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner<W: Write>(&self, output: &mut W) -> Result<()> {
        let doc = self.host.document();
        let viewport = doc.viewport();
        writeln!(output, "pagemark - interactive element map")?;
        writeln!(output, "Page:     {}", doc.url())?;
        if !doc.title().is_empty() {
            writeln!(output, "Title:    {}", doc.title())?;
        }
        writeln!(output, "Viewport: {}x{}", viewport.width, viewport.height)?;
        writeln!(output)?;
        writeln!(output, "Commands: analyze, list, mark, unmark, selector, text, help, exit")?;
        writeln!(output, "─────────────────────────────────────────────")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, Rect};
    use crate::dom::ElementSpec;

    fn repl() -> Repl {
        let mut doc = MemoryDocument::new("https://example.com/", "Example");
        let body = doc.body_id();
        doc.append_element(
            body,
            ElementSpec::new("a")
                .attr("href", "/about")
                .rect(Rect::new(10.0, 10.0, 60.0, 20.0))
                .text("About"),
        );
        Repl::new(PageHost::new(doc, Config::default()))
    }

    #[test]
    fn test_scripted_session() {
        let mut repl = repl();
        let script = "list\n\nselector 1\nmark\nbogus\nexit\nlist\n";
        let mut out = Vec::new();
        repl.run_with(script.as_bytes(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Page:     https://example.com/"));
        assert!(out.contains("[1] a \"About\" @(10,10)"));
        assert!(out.contains("pagemark> a\n"));
        assert!(out.contains("Marked 1 element (2 overlay nodes)"));
        assert!(out.contains("Unknown command: bogus"));
        assert!(out.trim_end().ends_with("Goodbye!"));
        assert!(repl.host().is_installed());
    }

    #[test]
    fn test_eof_ends_session() {
        let mut repl = repl();
        let mut out = Vec::new();
        repl.run_with("status\n".as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Page Status"));
        assert!(out.ends_with("Goodbye!\n"));
    }
}
