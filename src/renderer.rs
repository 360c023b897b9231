use crate::host::OutputSurface;
use crate::playback::{Progress, Status};
use colorgrad::{CustomGradient, Gradient};
use crossterm::{
    execute, queue,
    style::{Color, Print, SetForegroundColor, SetBackgroundColor, ResetColor},
    cursor::{MoveTo, Hide, Show},
    terminal::{Clear, ClearType, enable_raw_mode, disable_raw_mode},
};
use std::io::{stdout, Write, Stdout};
use anyhow::{Result, anyhow};
use log::debug;

/// Rows taken by the header line above the ASCII block
const HEADER_ROWS: u16 = 1;
/// Rows taken by status bar, progress bar and prompt below it
const FOOTER_ROWS: u16 = 3;

/// Everything the terminal view shows, independent of the terminal itself
#[derive(Debug, Clone)]
pub struct ViewState {
    pub frame: String,
    pub status: Status,
    pub fps: Option<u32>,
    pub progress: Option<Progress>,
    pub resolution: Option<(u32, u32)>,
    pub grid_width: u32,
    pub contrast: f64,
    pub source_name: Option<String>,
    pub prompt: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            frame: String::new(),
            status: Status::SystemReady,
            fps: None,
            progress: None,
            resolution: None,
            grid_width: crate::DEFAULT_GRID_WIDTH,
            contrast: crate::DEFAULT_CONTRAST,
            source_name: None,
            prompt: None,
        }
    }
}

impl ViewState {
    /// Header imitating the command that started playback
    pub fn command_line(&self) -> String {
        match &self.source_name {
            Some(name) => format!("$ ./ascii_player \"{}\"", name),
            None => "$ ./ascii_player".to_string(),
        }
    }

    pub fn status_line(&self) -> String {
        let fps = self.fps.map_or_else(|| "-- FPS".to_string(), |fps| format!("{} FPS", fps));
        let resolution = self
            .resolution
            .map_or_else(|| "---x---".to_string(), |(w, h)| format!("{}x{}", w, h));
        format!(
            "[{}] {} | {} | width {} | contrast {:.1}",
            self.status, fps, resolution, self.grid_width, self.contrast
        )
    }

    /// Number of progress bar cells filled out of `cells`
    pub fn filled_cells(&self, cells: u16) -> u16 {
        let percent = self.progress.as_ref().map_or(0.0, |p| p.percent);
        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
        ((percent / 100.0) * cells as f64).round() as u16
    }
}

/// Terminal renderer for the ASCII block and its labels
pub struct Renderer {
    stdout: Stdout,
    use_colors: bool,
    center_output: bool,
    terminal_width: u16,
    terminal_height: u16,
    gradient: Gradient,
    view: ViewState,
    dirty: bool,
    active: bool,
}

impl Renderer {
    /// Create a new renderer
    pub fn new(use_colors: bool) -> Result<Self> {
        let (terminal_width, terminal_height) = crossterm::terminal::size()?;

        // Phosphor green, dark to bright
        let gradient = CustomGradient::new()
            .html_colors(&["#003b00", "#008f11", "#00ff41"])
            .build()
            .map_err(|e| anyhow!("Failed to build progress gradient: {}", e))?;

        Ok(Self {
            stdout: stdout(),
            use_colors,
            center_output: true,
            terminal_width,
            terminal_height,
            gradient,
            view: ViewState::default(),
            dirty: true,
            active: false,
        })
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.stdout, Hide, Clear(ClearType::All))?;
        self.active = true;
        debug!("Terminal initialized for rendering");
        Ok(())
    }

    /// Restore terminal to normal state
    pub fn cleanup(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        execute!(self.stdout, Show, ResetColor, Clear(ClearType::All), MoveTo(0, 0))?;
        disable_raw_mode()?;
        self.active = false;
        debug!("Terminal restored to normal state");
        Ok(())
    }

    /// Update terminal dimensions
    pub fn update_dimensions(&mut self) -> Result<(u16, u16)> {
        let (width, height) = crossterm::terminal::size()?;
        self.terminal_width = width;
        self.terminal_height = height;
        self.dirty = true;
        debug!("Terminal dimensions updated: {}x{}", width, height);
        Ok((width, height))
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Show or hide the path prompt
    pub fn set_prompt(&mut self, prompt: Option<&str>) {
        let prompt = prompt.map(str::to_string);
        if self.view.prompt != prompt {
            self.view.prompt = prompt;
            self.dirty = true;
        }
    }

    /// Repaint the screen if anything changed since the last call
    pub fn present(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let start_time = std::time::Instant::now();

        queue!(self.stdout, Clear(ClearType::All))?;
        self.draw_header()?;
        self.draw_frame()?;
        self.draw_footer()?;
        self.stdout.flush()?;
        self.dirty = false;

        debug!("Screen presented in {}ms", start_time.elapsed().as_millis());
        Ok(())
    }

    fn draw_header(&mut self) -> Result<()> {
        let line = truncate(&self.view.command_line(), self.terminal_width);
        queue!(self.stdout, MoveTo(0, 0))?;
        if self.use_colors {
            queue!(self.stdout, SetForegroundColor(Color::Green))?;
        }
        queue!(self.stdout, Print(line))?;
        if self.use_colors {
            queue!(self.stdout, ResetColor)?;
        }
        Ok(())
    }

    fn draw_frame(&mut self) -> Result<()> {
        let available = self.terminal_height.saturating_sub(HEADER_ROWS + FOOTER_ROWS);
        let lines: Vec<&str> = self.view.frame.lines().take(available as usize).collect();
        let frame_width = lines.first().map_or(0, |l| l.chars().count()) as u16;

        // Calculate centering offsets
        let (offset_x, offset_y) = if self.center_output {
            let offset_x = self.terminal_width.saturating_sub(frame_width) / 2;
            let offset_y = available.saturating_sub(lines.len() as u16) / 2;
            (offset_x, offset_y)
        } else {
            (0, 0)
        };

        if self.use_colors {
            queue!(self.stdout, SetForegroundColor(Color::Green))?;
        }
        for (row, line) in lines.iter().enumerate() {
            let visible = truncate(line, self.terminal_width.saturating_sub(offset_x));
            queue!(
                self.stdout,
                MoveTo(offset_x, HEADER_ROWS + offset_y + row as u16),
                Print(visible)
            )?;
        }
        if self.use_colors {
            queue!(self.stdout, ResetColor)?;
        }
        Ok(())
    }

    fn draw_footer(&mut self) -> Result<()> {
        let base = self.terminal_height.saturating_sub(FOOTER_ROWS);

        // Status bar
        let status = truncate(&self.view.status_line(), self.terminal_width);
        queue!(self.stdout, MoveTo(0, base))?;
        if self.use_colors {
            queue!(self.stdout, SetForegroundColor(Color::White), SetBackgroundColor(Color::DarkGrey))?;
        }
        queue!(self.stdout, Print(status))?;
        if self.use_colors {
            queue!(self.stdout, ResetColor)?;
        }

        // Progress bar and time label
        let label = self
            .view
            .progress
            .as_ref()
            .map_or_else(|| "00:00 / 00:00".to_string(), |p| p.label.clone());
        let bar_cells = self.terminal_width.saturating_sub(label.len() as u16 + 3);
        let filled = self.view.filled_cells(bar_cells);
        queue!(self.stdout, MoveTo(0, base + 1), Print("["))?;
        for cell in 0..bar_cells {
            if cell < filled {
                if self.use_colors {
                    let t = cell as f64 / bar_cells.max(1) as f64;
                    let [r, g, b, _] = self.gradient.at(t).to_rgba8();
                    queue!(self.stdout, SetForegroundColor(Color::Rgb { r, g, b }))?;
                }
                queue!(self.stdout, Print('█'))?;
            } else {
                if self.use_colors {
                    queue!(self.stdout, ResetColor)?;
                }
                queue!(self.stdout, Print('·'))?;
            }
        }
        if self.use_colors {
            queue!(self.stdout, ResetColor)?;
        }
        queue!(self.stdout, Print("] "), Print(label))?;

        // Prompt, or key help
        queue!(self.stdout, MoveTo(0, base + 2))?;
        match &self.view.prompt {
            Some(text) => {
                let line = format!("open> {}_", text);
                queue!(self.stdout, Print(truncate(&line, self.terminal_width)))?;
            }
            None => {
                if self.use_colors {
                    queue!(self.stdout, SetForegroundColor(Color::DarkGrey))?;
                }
                queue!(self.stdout, Print(truncate(crate::input::HELP_TEXT, self.terminal_width)))?;
                if self.use_colors {
                    queue!(self.stdout, ResetColor)?;
                }
            }
        }
        Ok(())
    }
}

impl OutputSurface for Renderer {
    fn show_frame(&mut self, text: &str) {
        self.view.frame.clear();
        self.view.frame.push_str(text);
        self.dirty = true;
    }

    fn set_status(&mut self, status: Status) {
        self.view.status = status;
        self.dirty = true;
    }

    fn set_fps(&mut self, fps: u32) {
        self.view.fps = Some(fps);
        self.dirty = true;
    }

    fn set_progress(&mut self, progress: &Progress) {
        self.view.progress = Some(progress.clone());
        self.dirty = true;
    }

    fn set_resolution(&mut self, width: u32, height: u32) {
        self.view.resolution = Some((width, height));
        self.dirty = true;
    }

    fn set_grid_width(&mut self, width: u32) {
        self.view.grid_width = width;
        self.dirty = true;
    }

    fn set_contrast(&mut self, contrast: f64) {
        self.view.contrast = contrast;
        self.dirty = true;
    }

    fn set_source_name(&mut self, name: &str) {
        self.view.source_name = Some(name.to_string());
        self.dirty = true;
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Ensure terminal is restored on drop
        let _ = self.cleanup();
    }
}

/// Cut a line to at most `width` chars
fn truncate(line: &str, width: u16) -> String {
    line.chars().take(width as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let view = ViewState {
            status: Status::Playing,
            fps: Some(59),
            resolution: Some((1920, 1080)),
            grid_width: 120,
            contrast: 1.5,
            ..Default::default()
        };
        assert_eq!(
            view.status_line(),
            "[PLAYING] 59 FPS | 1920x1080 | width 120 | contrast 1.5"
        );
    }

    #[test]
    fn test_initial_status_line() {
        let view = ViewState::default();
        assert_eq!(
            view.status_line(),
            "[SYSTEM READY] -- FPS | ---x--- | width 80 | contrast 1.0"
        );
    }

    #[test]
    fn test_command_line() {
        let mut view = ViewState::default();
        assert_eq!(view.command_line(), "$ ./ascii_player");
        view.source_name = Some("clip.mp4".to_string());
        assert_eq!(view.command_line(), "$ ./ascii_player \"clip.mp4\"");
    }

    #[test]
    fn test_progress_fill() {
        let mut view = ViewState::default();
        assert_eq!(view.filled_cells(40), 0);

        view.progress = Progress::compute(60.0, 120.0);
        assert_eq!(view.filled_cells(40), 20);

        // Positions past the end never overflow the bar
        view.progress = Progress::compute(500.0, 120.0);
        assert_eq!(view.filled_cells(40), 40);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("░▒▓█", 2), "░▒");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
