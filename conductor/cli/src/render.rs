//! Message Rendering
//!
//! Turns conductor messages into terminal lines, or JSON lines with `--json`.

use std::io::{self, Write};

use lesson_core::{
    ExplanationStatus, ImageView, NotifyLevel, QuestionStatus, SessionSnapshot, SlideRecord,
    TutorMessage,
};

/// Shown in place of a slide that has no text
const EMPTY_SLIDE: &str = "(Empty slide)";

fn has_content(slide: &SlideRecord) -> bool {
    slide.content.as_deref().is_some_and(|c| !c.is_empty())
}

/// Writes conductor messages to an output stream
pub struct Renderer<W: Write> {
    out: W,
    json: bool,
}

impl<W: Write> Renderer<W> {
    /// Render to `out`, as JSON lines when `json` is set
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    /// Render one message
    pub fn render(&mut self, msg: &TutorMessage) -> io::Result<()> {
        if self.json {
            let line = serde_json::to_string(msg).map_err(io::Error::other)?;
            writeln!(self.out, "{line}")?;
            return self.out.flush();
        }

        match msg {
            TutorMessage::State { state } => {
                writeln!(self.out, "[{}]", state.description())?;
            }
            TutorMessage::Notify { level, message } => {
                let tag = match level {
                    NotifyLevel::Info => "info",
                    NotifyLevel::Warning => "warning",
                    NotifyLevel::Error => "error",
                };
                writeln!(self.out, "{tag}: {message}")?;
            }
            TutorMessage::Snapshot { snapshot } => self.snapshot(snapshot)?,
            TutorMessage::Quit { message } => {
                if let Some(message) = message {
                    writeln!(self.out, "{message}")?;
                }
            }
            TutorMessage::DeckSelected { deck_id } => match deck_id {
                Some(deck) => writeln!(self.out, "Deck {deck} selected")?,
                None => writeln!(self.out, "No deck selected")?,
            },
            TutorMessage::SlidesLoading { .. } => writeln!(self.out, "Loading slides...")?,
            TutorMessage::SlidesLoaded { count, .. } => {
                if *count == 0 {
                    writeln!(self.out, "No slides found for this deck.")?;
                }
            }
            TutorMessage::SlideListError { message } => writeln!(self.out, "error: {message}")?,
            TutorMessage::SlideChanged { count, slide, .. } => {
                writeln!(self.out)?;
                writeln!(self.out, "── Slide {} of {count} ──", slide.number)?;
                if has_content(slide) {
                    writeln!(self.out, "{}", slide.title().unwrap_or_default())?;
                    if let Some(body) = slide.body() {
                        writeln!(self.out, "{body}")?;
                    }
                } else {
                    writeln!(self.out, "{EMPTY_SLIDE}")?;
                }
            }
            TutorMessage::ImageLoading { .. } => writeln!(self.out, "(loading image...)")?,
            TutorMessage::ImageReady { bytes, .. } => {
                writeln!(self.out, "(image: {bytes} bytes)")?;
            }
            TutorMessage::ImageUnavailable { .. } => writeln!(self.out, "(Image unavailable)")?,
            TutorMessage::Avatar { caption, .. } => writeln!(self.out, "Teacher: {caption}")?,
            TutorMessage::ExplanationPending { .. } | TutorMessage::QuestionPending { .. } => {}
            TutorMessage::Explanation { text, .. } => writeln!(self.out, "{text}")?,
            TutorMessage::ExplanationFailed { message }
            | TutorMessage::QuestionFailed { message } => {
                writeln!(self.out, "error: {message}")?;
            }
            TutorMessage::ExplanationCleared => {}
            TutorMessage::Answer { answer } => {
                let cached = if answer.cached { ", cached" } else { "" };
                writeln!(self.out, "Tutor ({}{cached}): {}", answer.provider, answer.answer)?;
            }
        }

        self.out.flush()
    }

    /// Print a line that didn't come from the conductor
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        if self.json {
            let line = serde_json::json!({ "type": "local", "message": text });
            writeln!(self.out, "{line}")?;
        } else {
            writeln!(self.out, "{text}")?;
        }
        self.out.flush()
    }

    fn snapshot(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let Some(deck) = snapshot.deck_id else {
            return writeln!(self.out, "No deck selected");
        };
        writeln!(self.out, "Deck {deck}")?;

        if snapshot.loading_slides {
            writeln!(self.out, "Loading slides...")?;
        }
        if let Some(ref error) = snapshot.list_error {
            writeln!(self.out, "error: {error}")?;
        }
        if let (Some(label), Some(slide)) = (&snapshot.position_label, &snapshot.current_slide) {
            let title = if has_content(slide) {
                slide.title().unwrap_or_default()
            } else {
                EMPTY_SLIDE
            };
            writeln!(self.out, "{label}: {title}")?;
        }

        match &snapshot.image {
            ImageView::NoImage => {}
            ImageView::Loading => writeln!(self.out, "(loading image...)")?,
            ImageView::Ready { bytes, .. } => writeln!(self.out, "(image: {bytes} bytes)")?,
            ImageView::Unavailable => writeln!(self.out, "(Image unavailable)")?,
        }

        writeln!(self.out, "Teacher: {}", snapshot.avatar.caption())?;
        match &snapshot.explanation {
            ExplanationStatus::Fulfilled(text) => writeln!(self.out, "{text}")?,
            ExplanationStatus::Failed(message) => writeln!(self.out, "error: {message}")?,
            ExplanationStatus::None | ExplanationStatus::Pending => {}
        }
        if let QuestionStatus::Answered(answer) = &snapshot.question {
            writeln!(self.out, "Last answer: {}", answer.answer)?;
        }
        Ok(())
    }
}
