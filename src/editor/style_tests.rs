use super::*;

#[test]
fn aliases_resolve_to_canonical_style() {
    let registry = StyleRegistry::standard();

    for alias in ["em", "italic", "italics", "emph", "textsl", "textit"] {
        let style = registry.lookup(alias).unwrap();
        assert_eq!(style.control_sequence, "\\textit");
        assert_eq!(style.tag, "i");
    }
    assert_eq!(registry.lookup("\\textrm").unwrap().control_sequence, "\\text");
    assert_eq!(registry.lookup("tt").unwrap().label, "Mono space font");
}

#[test]
fn unknown_words_are_not_text_commands() {
    let registry = StyleRegistry::standard();
    assert!(registry.lookup("alpha").is_none());
    assert!(registry.lookup("").is_none());
}

#[test]
fn speech_templates_wrap_the_label() {
    let registry = StyleRegistry::standard();
    let bold = registry.lookup("textbf").unwrap();
    assert_eq!(bold.speech_start(), "StartBold");
    assert_eq!(bold.speech_end(), "EndBold");
}

#[test]
fn every_family_carries_text_mode_class() {
    let registry = StyleRegistry::standard();
    for word in registry.control_words() {
        let style = registry.lookup(word).unwrap();
        assert!(style.attributes.contains("mq-text-mode"), "{word}");
    }
    assert_eq!(registry.control_words().count(), 21);
}
