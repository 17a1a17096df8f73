//! Interactive menu, modelled as a small state machine.
//!
//! Input is read one line at a time through a [`Prompter`]; end of input in
//! any state cancels the run.
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use crate::logging::Log;
use crate::modules::registry::Toggle;

/// Line-oriented user interaction.
pub trait Prompter {
    /// Show `text` to the user.
    fn show(&mut self, text: &str);

    /// Print `prompt` and read one line. `None` on end of input.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// [`Prompter`] over the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdioPrompter;

impl Prompter for StdioPrompter {
    fn show(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{text}");
    }

    fn read_line(&mut self, prompt: &str) -> Option<String> {
        {
            let mut out = io::stdout().lock();
            let _ = write!(out, "{prompt}");
            let _ = out.flush();
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Toggles excluded by the "Quick" preset.
pub const QUICK_EXCLUDES: [Toggle; 2] = [Toggle::Drivers, Toggle::Wsl];

/// What the menu settled on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuChoice {
    /// Excluded toggles.
    pub excluded: BTreeSet<Toggle>,
    /// Preview only.
    pub dry_run: bool,
}

/// Menu states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    /// Preset list.
    Main,
    /// Per-toggle checklist.
    Custom(MenuChoice),
    /// Selection made.
    Confirmed(MenuChoice),
    /// User quit, or input ended.
    Cancelled,
}

impl MenuState {
    /// `true` once no more input is needed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Cancelled)
    }

    /// Next state after reading `input` (`None` = end of input).
    #[must_use]
    pub fn step(self, input: Option<&str>, log: &dyn Log) -> Self {
        let Some(input) = input.map(str::trim) else {
            return Self::Cancelled;
        };
        match self {
            Self::Main => match input {
                "1" => Self::Confirmed(MenuChoice::default()),
                "2" => Self::Confirmed(MenuChoice {
                    dry_run: true,
                    ..MenuChoice::default()
                }),
                "3" => Self::Custom(MenuChoice::default()),
                "4" => Self::Confirmed(MenuChoice {
                    excluded: QUICK_EXCLUDES.into_iter().collect(),
                    dry_run: false,
                }),
                "q" | "Q" => Self::Cancelled,
                other => {
                    log.warn(&format!(
                        "unrecognised choice '{other}', running full provisioning"
                    ));
                    Self::Confirmed(MenuChoice::default())
                }
            },
            Self::Custom(mut choice) => match input {
                "s" | "S" => Self::Confirmed(choice),
                "b" | "B" => Self::Main,
                "d" | "D" => {
                    choice.dry_run = !choice.dry_run;
                    Self::Custom(choice)
                }
                other => {
                    let toggle = other
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| Toggle::ALL.get(i).copied());
                    match toggle {
                        Some(t) => {
                            if !choice.excluded.remove(&t) {
                                choice.excluded.insert(t);
                            }
                        }
                        None => log.warn(&format!("unrecognised choice '{other}'")),
                    }
                    Self::Custom(choice)
                }
            },
            terminal @ (Self::Confirmed(_) | Self::Cancelled) => terminal,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Main => [
                "",
                "Workstation provisioning",
                "  1) Full provisioning",
                "  2) Dry-run preview",
                "  3) Custom selection",
                "  4) Quick (skip drivers and WSL)",
                "  q) Quit",
            ]
            .join("\n"),
            Self::Custom(choice) => {
                let mut lines = vec![String::new(), "Custom selection".to_string()];
                for (i, toggle) in Toggle::ALL.iter().enumerate() {
                    let mark = if choice.excluded.contains(toggle) {
                        ' '
                    } else {
                        'x'
                    };
                    lines.push(format!("  [{mark}] {}) {}", i + 1, toggle.label()));
                }
                let dry = if choice.dry_run { 'x' } else { ' ' };
                lines.push(format!("  [{dry}] d) Dry run"));
                lines.push("  s) Start    b) Back".to_string());
                lines.join("\n")
            }
            Self::Confirmed(_) | Self::Cancelled => String::new(),
        }
    }

    const fn prompt(&self) -> &'static str {
        match self {
            Self::Custom(_) => "Toggle [1-8/d], s to start: ",
            _ => "Select [1-4/q]: ",
        }
    }
}

/// Drive the menu until a selection is confirmed or cancelled.
///
/// Returns `None` when the user quits or input ends.
pub fn run_menu(prompter: &mut dyn Prompter, log: &dyn Log) -> Option<MenuChoice> {
    let mut state = MenuState::Main;
    while !state.is_terminal() {
        prompter.show(&state.render());
        let input = prompter.read_line(state.prompt());
        state = state.step(input.as_deref(), log);
    }
    match state {
        MenuState::Confirmed(choice) => Some(choice),
        _ => None,
    }
}
