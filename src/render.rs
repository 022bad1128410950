//! Output rendering for the chat loop.
//!
//! Replies are printed raw while they stream in. Once a turn completes the
//! screen is cleared and the whole conversation is drawn again, each message
//! under a role label with its content rendered as markdown by `termimad`.

use std::io::{self, Stdout, Write};

use termimad::MadSkin;
use termimad::crossterm::QueueableCommand;
use termimad::crossterm::cursor::MoveTo;
use termimad::crossterm::style::{Color, Stylize, style};
use termimad::crossterm::terminal::{self, Clear, ClearType};

use crate::chat::Conversation;
use crate::types::Role;

/// Width used when the terminal size cannot be determined.
const FALLBACK_WIDTH: usize = 80;

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Markdown with ANSI styling on a terminal
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer {
    /// Print a chunk of streamed response text.
    ///
    /// This is called incrementally as tokens are streamed from the API and
    /// must make the text visible immediately.
    fn print_text(&mut self, text: &str);

    /// Called when a streamed response is complete.
    fn finish_response(&mut self);

    /// Clear the display and draw the whole conversation from the start,
    /// followed by an extra blank line.
    fn render_conversation(&mut self, conversation: &Conversation);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);
}

/// Build the text of a full transcript.
///
/// Each message becomes a role label line, its content rendered as markdown
/// at `width` columns, and a blank separator line. The result depends only
/// on its arguments, so the same conversation always renders identically.
pub fn render_transcript(
    conversation: &Conversation,
    skin: &MadSkin,
    width: usize,
    use_color: bool,
) -> String {
    let mut out = String::new();
    for message in conversation.messages() {
        out.push_str(&role_label(message.role, use_color));
        out.push('\n');
        out.push_str(&skin.text(&message.content, Some(width)).to_string());
        out.push('\n');
    }
    out
}

/// The label printed above a message.
///
/// User and assistant labels are bold green and bold blue; the system
/// prompt is dimmed.
pub fn role_label(role: Role, use_color: bool) -> String {
    if !use_color {
        return role.as_str().to_string();
    }
    match role {
        Role::User => style(role.as_str()).with(Color::Green).bold().to_string(),
        Role::Assistant => style(role.as_str()).with(Color::Blue).bold().to_string(),
        Role::System => style(role.as_str()).dim().to_string(),
    }
}

/// Build the markdown skin used for message content.
pub fn make_skin(use_color: bool) -> MadSkin {
    if !use_color {
        return MadSkin::no_style();
    }
    let mut skin = MadSkin::default();
    skin.inline_code.set_fg(Color::Yellow);
    skin
}

/// Terminal renderer with optional ANSI styling.
///
/// Writes to stdout by default; any [`Write`] can stand in for it.
pub struct TerminalRenderer<W: Write = Stdout> {
    out: W,
    skin: MadSkin,
    use_color: bool,
    width: Option<usize>,
    clear_screen: bool,
}

impl TerminalRenderer<Stdout> {
    /// Creates a new TerminalRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new TerminalRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for TerminalRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            skin: make_skin(use_color),
            use_color,
            width: None,
            clear_screen: true,
        }
    }

    /// Render at a fixed width instead of the terminal's current width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Skip clearing the display before each re-render.
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    /// Returns whether ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Consumes the renderer and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            terminal::size()
                .map(|(columns, _)| columns as usize)
                .ok()
                .filter(|columns| *columns > 0)
                .unwrap_or(FALLBACK_WIDTH)
        })
    }

    /// Flushes output to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn clear(&mut self) -> io::Result<()> {
        self.out.queue(Clear(ClearType::All))?;
        self.out.queue(Clear(ClearType::Purge))?;
        self.out.queue(MoveTo(0, 0))?;
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn print_text(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        self.flush();
    }

    fn finish_response(&mut self) {
        let _ = writeln!(self.out);
        self.flush();
    }

    fn render_conversation(&mut self, conversation: &Conversation) {
        if self.clear_screen {
            let _ = self.clear();
        }
        let width = self.width();
        let transcript = render_transcript(conversation, &self.skin, width, self.use_color);
        let _ = self.out.write_all(transcript.as_bytes());
        let _ = writeln!(self.out);
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        let _ = writeln!(self.out, "{info}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.flush();
        eprintln!("\nError: {error}");
    }
}
