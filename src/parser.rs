//! This module provides the parser for machine definitions, utilizing the `pest` crate.
//! It reads the keyword-prefixed text format described in `grammar.pest` and hands the raw
//! fields to a [`DefinitionBuilder`] for validation.

use crate::definition::{DefinitionBuilder, MachineDefinition, RawTransition, ValidationOptions};
use crate::types::TuringMachineError;
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the definition grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// Parses and validates a machine definition with the default (lenient) options.
///
/// # Returns
///
/// * `Ok(MachineDefinition)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * Any validation error from [`DefinitionBuilder::build`].
pub fn parse(input: &str) -> Result<MachineDefinition, TuringMachineError> {
    parse_with_options(input, ValidationOptions::default())
}

/// Parses and validates a machine definition with the given validation options.
pub fn parse_with_options(
    input: &str,
    options: ValidationOptions,
) -> Result<MachineDefinition, TuringMachineError> {
    parse_fields(input)?.options(options).build()
}

/// Parses a machine definition into an unvalidated [`DefinitionBuilder`].
///
/// Only the text format is checked here: syntax, duplicate fields, the presence of `NAME:`,
/// and the number of tokens in each transition record.
pub fn parse_fields(input: &str) -> Result<DefinitionBuilder, TuringMachineError> {
    let root = DefinitionParser::parse(Rule::program, input)
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TuringMachineError::MissingRequiredField("NAME".into()))?;

    parse_program(root)
}

/// Parses the top-level structure of a definition from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<DefinitionBuilder, TuringMachineError> {
    let mut builder = DefinitionBuilder::new();
    let mut name: Option<String> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        builder = match rule {
            Rule::name => {
                name = Some(parse_label(p));
                builder
            }
            Rule::states => builder.states(parse_tokens(p)),
            Rule::input_alphabet => builder.input_alphabet(parse_tokens(p)),
            Rule::tape_alphabet => builder.tape_alphabet(parse_tokens(p)),
            Rule::blank => builder.blank(parse_single_token(p)),
            Rule::start => builder.start(parse_single_token(p)),
            Rule::accept => builder.accept(parse_single_token(p)),
            Rule::reject => builder.reject(parse_single_token(p)),
            Rule::delta => builder.transitions(parse_transitions(p)?),
            _ => builder,
        };
    }

    let name = check_required_rule(name, "NAME")?;

    Ok(builder.name(name))
}

/// Parses every transition record of the `DELTA:` section.
fn parse_transitions(pair: Pair<Rule>) -> Result<Vec<RawTransition>, TuringMachineError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::transition)
        .map(parse_transition)
        .collect()
}

/// Parses a single transition line into a 3- or 5-token record.
fn parse_transition(pair: Pair<Rule>) -> Result<RawTransition, TuringMachineError> {
    let span = pair.as_span();
    let tokens = parse_tokens(pair);

    RawTransition::from_tokens(tokens.as_slice()).ok_or_else(|| {
        parse_error(
            &format!(
                "Transition must have 3 or 5 tokens, found {}: {}",
                tokens.len(),
                tokens.join(" ")
            ),
            span,
        )
    })
}

/// Collects every `token` below the given pair.
fn parse_tokens(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::token)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Extracts the single token of a `START:`-style field.
fn parse_single_token(pair: Pair<Rule>) -> String {
    parse_tokens(pair).into_iter().next().unwrap_or_default()
}

/// Extracts the trimmed free-text label of the `NAME:` field.
fn parse_label(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a given field has already been declared, ensuring uniqueness.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), TuringMachineError> {
    let Some(keyword) = field_keyword(rule) else {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{keyword}\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required field is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, TuringMachineError> {
    value.ok_or_else(|| TuringMachineError::MissingRequiredField(name.to_string()))
}

/// The keyword that introduces a field in the text format.
fn field_keyword(rule: Rule) -> Option<&'static str> {
    match rule {
        Rule::name => Some("NAME:"),
        Rule::states => Some("STATE:"),
        Rule::input_alphabet => Some("SIGMA:"),
        Rule::tape_alphabet => Some("GAMMA:"),
        Rule::blank => Some("BLANK:"),
        Rule::start => Some("START:"),
        Rule::accept => Some("ACCEPT:"),
        Rule::reject => Some("REJECT:"),
        Rule::delta => Some("DELTA:"),
        _ => None,
    }
}
