//! Caret-style rendering of diagnostics with `ariadne`.

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

use crate::Diagnostic;

/// Whether rendered reports carry ANSI colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Colors when `is_tty` says the stream is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Render `diagnostic` against the expression `source` it was raised for.
///
/// Spans past the end of `source` (end-of-input errors) are clamped onto the
/// last character.
pub fn render(source: &str, diagnostic: &Diagnostic, colors: bool) -> String {
    if source.is_empty() {
        return render_short(diagnostic);
    }
    let len = source.len();
    let start = (diagnostic.span.start as usize).min(len - 1);
    let end = (diagnostic.span.end as usize).clamp(start + 1, len);

    let label_color = if colors { Color::Red } else { Color::Primary };
    let report = Report::build(ReportKind::Error, (), start)
        .with_config(
            Config::default()
                .with_color(colors)
                .with_index_type(IndexType::Byte),
        )
        .with_code(diagnostic.code())
        .with_message(diagnostic.text())
        .with_label(
            Label::new(start..end)
                .with_message(diagnostic.text())
                .with_color(label_color),
        )
        .finish();

    let mut out = Vec::new();
    if report.write(Source::from(source), &mut out).is_err() {
        return diagnostic.to_string();
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// One-line form used when no source is available.
pub fn render_short(diagnostic: &Diagnostic) -> String {
    diagnostic.to_string()
}
