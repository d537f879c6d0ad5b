use super::styles::StyleRegistry;

/// Per-field behaviour switches.
#[derive(Clone, Debug)]
pub struct EditorOptions {
    /// Speak region text bare instead of wrapped in its style's start/end labels.
    pub speech_shorthand: bool,
    pub styles: StyleRegistry,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            speech_shorthand: true,
            styles: StyleRegistry::standard(),
        }
    }
}

impl EditorOptions {
    pub fn with_speech_shorthand(mut self, enabled: bool) -> Self {
        self.speech_shorthand = enabled;
        self
    }
}
