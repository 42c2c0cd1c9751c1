// UI layer: the `ledis> ` prompt loop. Each line typed by the operator is
// sent to the server as-is and the answer is printed before prompting
// again. Interactive sessions get a `dialoguer` prompt and an `indicatif`
// spinner; piped input is read line by line with no decoration.

use crate::api::{LedisClient, Outcome, Transport};
use anyhow::{Context, Result};
use dialoguer::console::Term;
use dialoguer::theme::Theme;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;
use tracing::debug;

/// Prompt shown before every query.
pub const PROMPT: &str = "ledis> ";

/// Printed when the server cannot be reached.
pub const CONNECTION_ERROR: &str = "Connection error";

/// Where queries come from.
pub trait LineSource {
    /// Show the prompt and block for the next line. `None` means the
    /// operator closed the input.
    fn read_query(&mut self, out: &mut dyn Write) -> Result<Option<String>>;
}

/// Line-by-line reader for non-interactive input. The prompt goes to the
/// same writer as the results.
pub struct PipedInput<R> {
    reader: R,
}

impl<R: BufRead> PipedInput<R> {
    pub fn new(reader: R) -> Self {
        PipedInput { reader }
    }
}

impl<R: BufRead> LineSource for PipedInput<R> {
    fn read_query(&mut self, out: &mut dyn Write) -> Result<Option<String>> {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .context("Failed to read query")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}

/// Interactive prompt backed by `dialoguer::Input` on stdout.
pub struct TerminalInput {
    term: Term,
    theme: PromptTheme,
}

impl TerminalInput {
    pub fn new() -> Self {
        TerminalInput {
            term: Term::stdout(),
            theme: PromptTheme,
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for TerminalInput {
    fn read_query(&mut self, out: &mut dyn Write) -> Result<Option<String>> {
        out.flush()?;
        // Empty lines are valid queries and are forwarded like any other.
        let read = Input::<String>::with_theme(&self.theme)
            .with_prompt(PROMPT.trim_end())
            .allow_empty(true)
            .interact_text_on(&self.term);
        match read {
            Ok(query) => Ok(Some(query)),
            Err(err) if is_end_of_input(&err) => Ok(None),
            Err(err) => Err(err).context("Failed to read query"),
        }
    }
}

/// Ctrl-C in raw mode and a closed terminal both end the session.
fn is_end_of_input(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
    )
}

/// Renders the bare `ledis> ` prompt instead of dialoguer's `prompt: `.
pub struct PromptTheme;

impl Theme for PromptTheme {
    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        _default: Option<&str>,
    ) -> fmt::Result {
        write!(f, "{} ", prompt)
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        write!(f, "{} {}", prompt, sel)
    }
}

/// Entry point used by the binary: picks the terminal or piped front-end
/// depending on stdin and runs until input ends.
pub fn repl(api: LedisClient) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if io::stdin().is_terminal() {
        run(&api, &mut TerminalInput::new(), &mut out, true)
    } else {
        let stdin = io::stdin();
        run(&api, &mut PipedInput::new(stdin.lock()), &mut out, false)
    }
}

/// Read, send, print, forever. Returns when `input` is exhausted or a
/// failure other than a connection error occurs.
pub fn run<T, L, W>(api: &T, input: &mut L, out: &mut W, spinner: bool) -> Result<()>
where
    T: Transport,
    L: LineSource,
    W: Write,
{
    loop {
        let Some(query) = input.read_query(&mut *out)? else {
            debug!("input closed");
            return Ok(());
        };

        let pb = if spinner { Some(start_spinner()?) } else { None };
        let outcome = api.query(&query);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        writeln!(out, "{}", render(&outcome?))?;
        out.flush()?;
    }
}

/// The single line (or block) printed for one round trip.
pub fn render(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Response { status: 200, body } => body.clone(),
        Outcome::Response { status, body } => format!("Error {}: {}", status, body),
        Outcome::ConnectionError => CONNECTION_ERROR.to_string(),
    }
}

fn start_spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Waiting for server...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
