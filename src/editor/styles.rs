/// Presentation of one family of text regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    /// Canonical control sequence, backslash included.
    pub control_sequence: &'static str,
    pub tag: &'static str,
    pub attributes: &'static str,
    /// Accessibility label; speech wraps region text in `Start<label>`/`End<label>`.
    pub label: &'static str,
}

impl TextStyle {
    pub fn speech_start(&self) -> String {
        format!("Start{}", self.label)
    }

    pub fn speech_end(&self) -> String {
        format!("End{}", self.label)
    }
}

const TEXT: TextStyle = TextStyle {
    control_sequence: "\\text",
    tag: "span",
    attributes: "class=\"mq-text-mode\"",
    label: "Text",
};

const ITALIC: TextStyle = TextStyle {
    control_sequence: "\\textit",
    tag: "i",
    attributes: "class=\"mq-text-mode\"",
    label: "Italic",
};

const BOLD: TextStyle = TextStyle {
    control_sequence: "\\textbf",
    tag: "b",
    attributes: "class=\"mq-text-mode\"",
    label: "Bold",
};

const SANS_SERIF: TextStyle = TextStyle {
    control_sequence: "\\textsf",
    tag: "span",
    attributes: "class=\"mq-sans-serif mq-text-mode\"",
    label: "Sans serif font",
};

const MONOSPACE: TextStyle = TextStyle {
    control_sequence: "\\texttt",
    tag: "span",
    attributes: "class=\"mq-monospace mq-text-mode\"",
    label: "Mono space font",
};

const SMALL_CAPS: TextStyle = TextStyle {
    control_sequence: "\\textsc",
    tag: "span",
    attributes: "style=\"font-variant:small-caps\" class=\"mq-text-mode\"",
    label: "Variable font",
};

const UPPERCASE: TextStyle = TextStyle {
    control_sequence: "\\uppercase",
    tag: "span",
    attributes: "style=\"text-transform:uppercase\" class=\"mq-text-mode\"",
    label: "Uppercase",
};

const LOWERCASE: TextStyle = TextStyle {
    control_sequence: "\\lowercase",
    tag: "span",
    attributes: "style=\"text-transform:lowercase\" class=\"mq-text-mode\"",
    label: "Lowercase",
};

/// Control words (without backslash) that open a text region, mapped to their style.
#[derive(Clone, Debug)]
pub struct StyleRegistry {
    entries: Vec<(&'static str, TextStyle)>,
}

impl StyleRegistry {
    pub fn standard() -> Self {
        let families: [(TextStyle, &[&'static str]); 8] = [
            (TEXT, &["textnormal", "textrm", "textup", "textmd"]),
            (ITALIC, &["em", "italic", "italics", "emph", "textsl"]),
            (BOLD, &["strong", "bold"]),
            (SANS_SERIF, &["sf"]),
            (MONOSPACE, &["tt"]),
            (SMALL_CAPS, &[]),
            (UPPERCASE, &[]),
            (LOWERCASE, &[]),
        ];

        let mut entries = Vec::new();
        for (style, aliases) in families {
            entries.push((style.control_sequence.trim_start_matches('\\'), style));
            entries.extend(aliases.iter().map(|alias| (*alias, style)));
        }
        Self { entries }
    }

    /// Style opened by `\name`; `name` may be given with or without its backslash.
    pub fn lookup(&self, name: &str) -> Option<TextStyle> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        self.entries
            .iter()
            .find(|(word, _)| *word == name)
            .map(|(_, style)| *style)
    }

    /// The plain `\text` style, used for the mode-switch character in math.
    pub fn plain(&self) -> TextStyle {
        TEXT
    }

    pub fn control_words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(word, _)| *word)
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "style_tests.rs"]
mod style_tests;
