//! LaTeX reading and writing for math fields, text fields and text regions.
//!
//! Readers produce a small syntax tree that the editor turns into nodes, so a
//! failed parse never touches the document.

use chumsky::error::SimpleReason;
use chumsky::prelude::*;

use super::error::LatexError;
use super::styles::{StyleRegistry, TextStyle};
use super::tree::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MathItem {
    Symbol(Symbol),
    Region { style: TextStyle, body: Vec<BodyPiece> },
}

/// One stretch of a text region's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyPiece {
    Text(String),
    Math(Vec<MathItem>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextItem {
    Char(char),
    Math(Vec<MathItem>),
}

fn whitespace() -> impl Parser<char, (), Error = Simple<char>> + Clone {
    filter(|c: &char| c.is_whitespace()).ignored()
}

/// `{` followed by everything up to a `}` that ends the input. Inner braces are
/// not balanced.
fn bracket_body() -> impl Parser<char, String, Error = Simple<char>> + Clone {
    whitespace()
        .repeated()
        .ignore_then(just('{'))
        .ignore_then(take_until(just('}').then_ignore(end())))
        .map(|(body, _)| body.into_iter().collect())
}

fn region_body<'a>(
    registry: &'a StyleRegistry,
) -> impl Parser<char, Vec<BodyPiece>, Error = Simple<char>> + Clone + 'a {
    let escaped = just('\\').ignore_then(one_of("\\{}$")).map(|c| vec![c]);
    let literal_pair = just('\\').chain::<char, _, _>(any());
    let lone_backslash = just('\\').then_ignore(end()).map(|c| vec![c]);
    let plain = filter(|c: &char| *c != '\\' && *c != '$').map(|c| vec![c]);

    let text = escaped
        .or(literal_pair)
        .or(lone_backslash)
        .or(plain)
        .repeated()
        .at_least(1)
        .flatten()
        .collect::<String>()
        .map(BodyPiece::Text);

    let math_mode = just('$')
        .ignore_then(math(registry))
        .then_ignore(just('$').ignored().or(end()))
        .map(BodyPiece::Math);

    text.or(math_mode).repeated().then_ignore(end())
}

fn math<'a>(
    registry: &'a StyleRegistry,
) -> impl Parser<char, Vec<MathItem>, Error = Simple<char>> + Clone + 'a {
    recursive(move |items| {
        let word = just('\\').ignore_then(
            filter(|c: &char| c.is_ascii_alphabetic())
                .repeated()
                .at_least(1)
                .collect::<String>(),
        );

        // Unescaped braces nest: math embedded in the body may hold groups
        // and text commands of its own.
        let argument = whitespace().repeated().ignore_then(
            recursive(|braced| {
                just('{')
                    .chain::<char, _, _>(
                        just('\\')
                            .chain::<char, _, _>(any())
                            .or(braced)
                            .or(filter(|c: &char| !matches!(c, '{' | '}' | '\\'))
                                .map(|c| vec![c]))
                            .repeated()
                            .flatten(),
                    )
                    .chain::<char, _, _>(just('}'))
            })
            .collect::<String>(),
        );

        let text_command = word
            .clone()
            .try_map(move |name, span| {
                registry
                    .lookup(&name)
                    .ok_or_else(|| Simple::custom(span, format!("\\{name} is not a text command")))
            })
            .then(argument)
            .try_map(move |(style, source), span| {
                parse_region_argument(&source, registry)
                    .map(|body| MathItem::Region { style, body })
                    .map_err(|err| Simple::custom(span, err.to_string()))
            });

        let word_symbol = word.try_map(move |name, span| {
            if registry.lookup(&name).is_some() {
                Err(Simple::custom(
                    span,
                    LatexError::MissingArgument(format!("\\{name}")).to_string(),
                ))
            } else {
                Ok(MathItem::Symbol(control_word_symbol(&name)))
            }
        });

        let escaped = just('\\')
            .ignore_then(filter(|c: &char| !c.is_ascii_alphabetic()))
            .map(|c| MathItem::Symbol(escaped_symbol(c)));

        let plain = filter(|c: &char| !matches!(c, '{' | '}' | '$' | '\\') && !c.is_whitespace())
            .map(|c| MathItem::Symbol(plain_math_symbol(c)));

        let single = text_command
            .or(word_symbol)
            .or(escaped)
            .or(plain)
            .map(|item| vec![item]);
        let group = items.delimited_by(just('{'), just('}'));

        whitespace().repeated().ignore_then(
            single
                .or(group)
                .then_ignore(whitespace().repeated())
                .repeated()
                .flatten(),
        )
    })
}

fn text_items<'a>(
    registry: &'a StyleRegistry,
) -> impl Parser<char, Vec<TextItem>, Error = Simple<char>> + Clone + 'a {
    let math_mode = just('$')
        .ignore_then(math(registry))
        .then_ignore(just('$').ignored().or(end()))
        .map(TextItem::Math);
    let escaped_dollar = just('\\').ignore_then(just('$')).map(TextItem::Char);
    // A control word swallows the single space separating it from what follows.
    let backslash = just("\\backslash")
        .then_ignore(just(' ').or_not())
        .to(TextItem::Char('\\'));
    let text_char = filter(|c: &char| *c != '$').map(TextItem::Char);

    math_mode
        .or(escaped_dollar)
        .or(backslash)
        .or(text_char)
        .repeated()
        .then_ignore(end())
}

pub fn parse_math(source: &str, registry: &StyleRegistry) -> Result<Vec<MathItem>, LatexError> {
    math(registry)
        .then_ignore(end())
        .parse(source)
        .map_err(first_error)
}

pub fn parse_text(source: &str, registry: &StyleRegistry) -> Result<Vec<TextItem>, LatexError> {
    text_items(registry).parse(source).map_err(first_error)
}

/// Extracts the braced argument of a text command and splits it into text and
/// embedded math.
pub fn parse_region_argument(
    source: &str,
    registry: &StyleRegistry,
) -> Result<Vec<BodyPiece>, LatexError> {
    let body = bracket_body().parse(source).map_err(first_error)?;
    region_body(registry)
        .parse(body.as_str())
        .map_err(first_error)
}

fn first_error(errors: Vec<Simple<char>>) -> LatexError {
    match errors.into_iter().next() {
        Some(error) => LatexError::Syntax {
            offset: error.span().start,
            message: describe(&error),
        },
        None => LatexError::Syntax {
            offset: 0,
            message: "unknown error".to_string(),
        },
    }
}

fn describe(error: &Simple<char>) -> String {
    match error.reason() {
        SimpleReason::Unexpected => {
            let found = error
                .found()
                .map(|c| format!("'{c}'"))
                .unwrap_or_else(|| "end of input".to_string());
            let expected: Vec<_> = error
                .expected()
                .filter_map(|exp| exp.as_ref().map(|c| format!("'{c}'")))
                .collect();
            if expected.is_empty() {
                format!("unexpected {found}")
            } else {
                format!("expected {}, found {}", expected.join(" or "), found)
            }
        }
        SimpleReason::Unclosed { delimiter, .. } => format!("unclosed delimiter '{delimiter}'"),
        SimpleReason::Custom(message) => message.clone(),
    }
}

fn glyph(word: &str) -> Option<&'static str> {
    Some(match word {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "theta" => "θ",
        "lambda" => "λ",
        "mu" => "μ",
        "pi" => "π",
        "sigma" => "σ",
        "phi" => "ϕ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Omega" => "Ω",
        "times" => "×",
        "cdot" => "·",
        "div" => "÷",
        "pm" => "±",
        "le" | "leq" => "≤",
        "ge" | "geq" => "≥",
        "ne" | "neq" => "≠",
        "infty" => "∞",
        "to" | "rightarrow" => "→",
        "leftarrow" => "←",
        "sum" => "∑",
        "prod" => "∏",
        "int" => "∫",
        "backslash" => "\\",
        _ => return None,
    })
}

fn control_word_symbol(word: &str) -> Symbol {
    Symbol::new(format!("\\{word}"), glyph(word).unwrap_or(word))
}

fn escaped_symbol(ch: char) -> Symbol {
    let symbol = Symbol::new(format!("\\{ch}"), ch.to_string());
    match ch {
        '&' => symbol.with_html("&amp;"),
        _ => symbol,
    }
}

fn plain_math_symbol(ch: char) -> Symbol {
    let symbol = Symbol::new(ch.to_string(), ch.to_string());
    match ch {
        '<' => symbol.with_html("&lt;"),
        '>' => symbol.with_html("&gt;"),
        _ => symbol,
    }
}

/// The symbol a keystroke produces in math mode.
pub fn typed_math_symbol(ch: char) -> Symbol {
    match ch {
        '\\' => control_word_symbol("backslash"),
        '{' | '}' | '%' | '&' | '#' | '_' | '~' | '^' | ' ' => escaped_symbol(ch),
        _ => plain_math_symbol(ch),
    }
}

/// The symbol a character becomes at the top level of a text field.
pub fn text_symbol(ch: char) -> Symbol {
    match ch {
        '$' => Symbol::new("\\$", "$"),
        '\\' => Symbol::new("\\backslash", "\\"),
        '<' => Symbol::new("<", "<").with_html("&lt;"),
        '>' => Symbol::new(">", ">").with_html("&gt;"),
        _ => Symbol::new(ch.to_string(), ch.to_string()),
    }
}

/// Escapes region text: backslashes first, then braces and the mode-switch character.
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('$', "\\$")
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn ends_with_control_word(latex: &str) -> bool {
    let stem = latex.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    stem.len() < latex.len() && stem.ends_with('\\') && !stem.ends_with("\\\\")
}

/// Concatenates exported pieces, separating a control word from a following
/// letter or whitespace.
pub fn join_latex<I>(pieces: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut latex = String::new();
    for piece in pieces {
        if piece.is_empty() {
            continue;
        }
        let needs_separator = piece
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c.is_whitespace());
        if needs_separator && ends_with_control_word(&latex) {
            latex.push(' ');
        }
        latex.push_str(&piece);
    }
    latex
}

#[cfg(test)]
#[path = "latex_tests.rs"]
mod latex_tests;
