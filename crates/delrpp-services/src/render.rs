//! Rendering of clip instances to MIDI messages

use delrpp_core::{expand, to_trigger_events, unroll, Expansion, Note};

use crate::clip::InstrumentClip;
use crate::config::RenderConfig;
use crate::error::Warning;
use crate::midi::{encode_events, MidiMessage};
use crate::time::pulses_to_seconds;

/// MIDI content for one placement of a clip
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    pub messages: Vec<MidiMessage>,
    /// Loop length of the MIDI source in pulses
    pub content_length: u64,
    /// Conditions were resolved over the instance length
    pub expanded: bool,
    pub warnings: Vec<Warning>,
}

impl RenderedClip {
    /// MIDI source lines, in order
    pub fn lines(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.to_line()).collect()
    }

    /// Length of the MIDI source in seconds
    pub fn duration_secs(&self, tempo: f64) -> f64 {
        pulses_to_seconds(self.content_length, tempo)
    }
}

/// Renders clip instances, keeping one random source for a whole project
pub struct ClipRenderer {
    config: RenderConfig,
    rng: fastrand::Rng,
}

impl Default for ClipRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl ClipRenderer {
    pub fn new(config: RenderConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render an instance of `clip` lasting `instance_length` pulses
    pub fn render_clip(&mut self, clip: &InstrumentClip, instance_length: u64) -> RenderedClip {
        let built = clip.notes();
        let mut rendered =
            self.render_notes(clip.channel, &built.notes, clip.length, instance_length);

        let mut warnings = built.warnings;
        warnings.append(&mut rendered.warnings);
        rendered.warnings = warnings;
        rendered
    }

    /// Render already linked notes on `channel`
    pub fn render_notes(
        &mut self,
        channel: u8,
        notes: &[Note],
        clip_length: u64,
        instance_length: u64,
    ) -> RenderedClip {
        let Expansion {
            notes,
            content_length,
            expanded,
        } = if self.config.always_expand {
            unroll(notes, clip_length, instance_length, &mut self.rng)
        } else {
            expand(notes, clip_length, instance_length, &mut self.rng)
        };

        let events = to_trigger_events(&notes, content_length);
        let mut warnings = Vec::new();
        let messages = encode_events(channel, &events, &mut warnings);

        tracing::debug!(
            "Rendered {} notes as {} messages, content length {}{}",
            notes.len(),
            messages.len(),
            content_length,
            if expanded { " (expanded)" } else { "" }
        );

        RenderedClip {
            messages,
            content_length,
            expanded,
            warnings,
        }
    }
}
