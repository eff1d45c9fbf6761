use std::fmt::Display;
use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use pathrec::eval::ExperimentObserver;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let paint = match theme {
            Theme::Plain => false,
            Theme::Auto | Theme::Light | Theme::Dark => stdout_is_tty,
        } && !quiet;

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };

        Self {
            palette,
            paint,
            quiet,
        }
    }

    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(String, String)> = rows
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                println!(
                    "  {} {}",
                    self.palette.key.paint(format!("{key:>key_width$}:")),
                    self.palette.value.paint(value)
                );
            } else {
                println!("  {key:>key_width$}: {value}");
            }
        }
    }

    pub fn ranked<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let entries: Vec<(String, f64)> = entries.into_iter().collect();
        self.heading(title);
        if entries.is_empty() {
            println!("  (no recommendations)");
            return;
        }
        let width = entries.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
        for (rank, (item_id, score)) in entries.iter().enumerate() {
            let rank = format!("{:>2}.", rank + 1);
            if self.paint {
                println!(
                    "  {} {} {}",
                    self.palette.bullet.paint(rank),
                    self.palette.value.paint(format!("{item_id:<width$}")),
                    self.palette.key.paint(format!("{score:.6}"))
                );
            } else {
                println!("  {rank} {item_id:<width$} {score:.6}");
            }
        }
    }

    pub fn success(&self, message: &str) {
        if self.quiet {
            println!("{message}");
            return;
        }
        let prefix = if self.paint {
            self.palette.success.paint(SUCCESS_ICON)
        } else {
            Style::new().paint(SUCCESS_ICON)
        };
        println!("{prefix} {message}");
    }

    pub fn warn(&self, message: &str) {
        if self.quiet {
            eprintln!("{message}");
            return;
        }
        let prefix = if self.paint {
            self.palette.warn.paint(WARNING_ICON)
        } else {
            Style::new().paint(WARNING_ICON)
        };
        eprintln!("{prefix} {message}");
    }

    pub fn task<'a>(&'a self, label: impl Into<String>) -> TaskGuard<'a> {
        let label = label.into();
        let pb = (!self.quiet).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(spinner_style());
            pb.set_prefix(self.progress_prefix());
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    /// Observer that renders experiment phases as progress bars.
    pub fn experiment_progress(&self) -> ExperimentProgress {
        ExperimentProgress {
            enabled: !self.quiet,
            prefix: self.progress_prefix(),
            bar: Mutex::new(None),
        }
    }

    fn progress_prefix(&self) -> String {
        if self.paint {
            self.palette.info.paint(PROGRESS_ICON).to_string()
        } else {
            PROGRESS_ICON.to_string()
        }
    }

    fn heading(&self, title: &str) {
        if self.quiet {
            println!("{title}");
            return;
        }
        let formatted = format!("{HEADING_ICON} {title}");
        if self.paint {
            println!("{}", self.palette.heading.paint(formatted));
        } else {
            println!("{formatted}");
        }
    }
}

pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl<'a> TaskGuard<'a> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        elapsed
    }
}

impl<'a> Drop for TaskGuard<'a> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = format_duration(self.start.elapsed());
        if let Some(pb) = self.pb.take() {
            pb.abandon_with_message(format!("{} interrupted after {elapsed}", self.label));
        } else {
            self.ui
                .warn(&format!("{} interrupted after {elapsed}", self.label));
        }
    }
}

/// One bar per experiment phase; the bar of the previous phase is cleared
/// when the next one starts.
pub struct ExperimentProgress {
    enabled: bool,
    prefix: String,
    bar: Mutex<Option<ProgressBar>>,
}

impl ExperimentProgress {
    fn advance(&self, done: usize, total: usize) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
            }
        }
    }

    pub fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl ExperimentObserver for ExperimentProgress {
    fn phase(&self, name: &str) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style());
        bar.set_prefix(self.prefix.clone());
        bar.set_message(name.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn neighbours_progress(&self, done: usize, total: usize) {
        self.advance(done, total);
    }

    fn evaluation_progress(&self, done: usize, total: usize) {
        self.advance(done, total);
    }
}

impl Drop for ExperimentProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} {spinner} {msg:<10} [{bar:30}] {pos}/{len} users")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .progress_chars("=> ")
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    bullet: Style,
    info: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            bullet: Style::new().fg(Color::LightBlue),
            info: Style::new().fg(Color::LightCyan),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Blue).bold(),
            key: Style::new().fg(Color::Black).bold(),
            value: Style::new().fg(Color::Black),
            bullet: Style::new().fg(Color::Blue),
            info: Style::new().fg(Color::Purple),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            bullet: Style::new(),
            info: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const WARNING_ICON: &str = "⚠";
const PROGRESS_ICON: &str = "▶";
