//! Karaoke-style ASS output.
//!
//! Each phrase becomes one `Dialogue` event per word. The event shows the
//! whole phrase in the `Default` style with the current word switched to
//! `Highlight`. An event runs from its word's start to the next word's
//! start, and the last word's event runs to the phrase end, so events
//! inside a phrase tile it exactly.

use reelsmith_project_model::style::{CaptionAnimation, CaptionStyle};
use reelsmith_project_model::transcript::Phrase;

use crate::timestamp::format_ass_time;

/// One timed, styled line of the karaoke track.
#[derive(Debug, Clone, PartialEq)]
pub struct KaraokeEvent {
    pub start: f64,
    pub end: f64,
    /// ASS text body, override tags included.
    pub text: String,
}

impl KaraokeEvent {
    pub fn to_dialogue(&self) -> String {
        format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            format_ass_time(self.start),
            format_ass_time(self.end),
            self.text
        )
    }
}

/// Build the per-word highlight events for every phrase.
pub fn karaoke_events(phrases: &[Phrase], style: &CaptionStyle) -> Vec<KaraokeEvent> {
    let mut events = Vec::new();

    for phrase in phrases {
        let tokens: Vec<String> = phrase.words.iter().map(|w| escape_text(&w.text)).collect();

        for (i, word) in phrase.words.iter().enumerate() {
            let start = word.start;
            let end = match phrase.words.get(i + 1) {
                Some(next) => next.start,
                None => phrase.end,
            }
            .max(start);

            let body = tokens
                .iter()
                .enumerate()
                .map(|(j, token)| {
                    if j == i {
                        format!("{}{token}{{\\r}}", highlight_tag(style.animation))
                    } else {
                        token.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");

            let lead = if i == 0 && style.animation == CaptionAnimation::Fade {
                "{\\fad(80,0)}"
            } else {
                ""
            };

            events.push(KaraokeEvent {
                start,
                end,
                text: format!("{lead}{body}"),
            });
        }
    }

    events
}

/// Full ASS document sized for a `width`x`height` frame.
pub fn generate_karaoke_ass(
    phrases: &[Phrase],
    style: &CaptionStyle,
    width: u32,
    height: u32,
) -> String {
    let mut doc = ass_header(style, width, height);
    for event in karaoke_events(phrases, style) {
        doc.push_str(&event.to_dialogue());
        doc.push('\n');
    }
    doc
}

/// `[Script Info]`, `[V4+ Styles]` with `Default` and `Highlight`, and the
/// `[Events]` format line.
pub fn ass_header(style: &CaptionStyle, width: u32, height: u32) -> String {
    let style_line = |name: &str, primary: String| {
        format!(
            "Style: {name},{font},{size},{primary},{primary},{outline_color},&H64000000,-1,0,0,0,100,100,0,0,1,{outline},{shadow},2,60,60,{margin_v},1",
            font = style.font_name,
            size = style.font_size,
            outline_color = style.outline_color.to_ass(),
            outline = style.outline,
            shadow = style.shadow,
            margin_v = style.margin_v,
        )
    };

    format!(
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         \n\
         [V4+ Styles]\n\
         Format: Name,Fontname,Fontsize,PrimaryColour,SecondaryColour,OutlineColour,BackColour,Bold,Italic,Underline,StrikeOut,ScaleX,ScaleY,Spacing,Angle,BorderStyle,Outline,Shadow,Alignment,MarginL,MarginR,MarginV,Encoding\n\
         {default}\n\
         {highlight}\n\
         \n\
         [Events]\n\
         Format: Layer,Start,End,Style,Name,MarginL,MarginR,MarginV,Effect,Text\n",
        default = style_line("Default", style.primary_color.to_ass()),
        highlight = style_line("Highlight", style.highlight_color.to_ass()),
    )
}

fn highlight_tag(animation: CaptionAnimation) -> &'static str {
    match animation {
        CaptionAnimation::Pop => {
            "{\\rHighlight\\t(0,80,\\fscx115\\fscy115)\\t(80,160,\\fscx100\\fscy100)}"
        }
        _ => "{\\rHighlight}",
    }
}

/// Keep transcript text from being read as override blocks or line breaks.
fn escape_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '{' | '}'))
        .collect::<String>()
        .replace('\\', "")
        .replace(['\n', '\r'], " ")
}
