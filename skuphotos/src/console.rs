use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Mutex, PoisonError};

use time::format_description::well_known::Rfc3339;

use crate::view::{FolderContentsView, FolderListView, Presenter, Prompt};

pub fn format_folder_list(view: &FolderListView) -> String {
    if view.folders.is_empty() {
        return "No SKU folders yet.\n".to_string();
    }
    let mut out = String::new();
    for (index, summary) in view.folders.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", index + 1, summary.label()));
        if let Some(thumbnail) = &summary.latest_thumbnail {
            out.push_str(&format!("     latest: {thumbnail}\n"));
        }
    }
    out
}

pub fn format_folder_contents(view: &FolderContentsView) -> String {
    let mut out = format!("{}: {}\n", view.folder.name, view.count_label());
    for photo in &view.photos {
        let created = photo.created_at.format(&Rfc3339).unwrap_or_default();
        out.push_str(&format!("  {}  id={}  {}\n", photo.name, photo.id, created));
    }
    for (name, url) in view.view_urls() {
        out.push_str(&format!("  view {name}: {url}\n"));
    }
    out
}

/// Prints snapshots to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn render_folder_list(&self, view: &FolderListView) {
        print!("{}", format_folder_list(view));
    }

    fn render_folder_contents(&self, view: &FolderContentsView) {
        print!("{}", format_folder_contents(view));
    }
}

/// Line-oriented prompt. The shell reads its commands through the same
/// reader so buffered input is never split between two consumers.
pub struct LinePrompt {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl LinePrompt {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Next input line without its terminator; `None` at end of input.
    pub fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    pub fn write_prompt(&self, text: &str) {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        // Prompt echo is best-effort; a closed stdout must not abort input.
        let _ = write!(output, "{text}");
        let _ = output.flush();
    }
}

impl Prompt for LinePrompt {
    fn confirm(&self, message: &str) -> bool {
        self.write_prompt(&format!("{message} [y/N] "));
        self.read_line()
            .map(|answer| {
                matches!(
                    answer.trim().to_ascii_lowercase().as_str(),
                    "y" | "yes"
                )
            })
            .unwrap_or(false)
    }

    fn prompt_text(&self, message: &str, default: &str) -> Option<String> {
        self.write_prompt(&format!("{message} [{default}]: "));
        let answer = self.read_line()?;
        let answer = answer.trim();
        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer.to_string())
        }
    }
}
