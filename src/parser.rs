//! This module provides the parser for tabular machine definitions, utilizing the `pest` crate.
//! The grammar in `grammar.pest` splits the input into comma-separated records; this module
//! interprets the seven header records and the transition records that follow them.

use crate::{
    analyzer::{analyze, unknown_directions, unreachable_states},
    machine::Machine,
    types::{Direction, Transition, TuringMachineError, MAX_MACHINE_SIZE},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Derives a `PestParser` for the tabular grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TabularParser;

/// A single field. Bare fields are trimmed; quoted fields keep their text as written.
struct Field {
    value: String,
    quoted: bool,
}

/// A parsed record: its position in the source and its unquoted fields.
struct Record<'i> {
    span: Span<'i>,
    fields: Vec<Field>,
}

impl Record<'_> {
    /// Returns the first field, or `None` when the record is blank.
    fn first(&self) -> Option<&str> {
        self.fields
            .first()
            .map(|field| field.value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Checks whether every field of the record is empty, as in a `,,,,` padding row.
    fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.value.is_empty())
    }

    /// Returns every comma-separated item of the record, whether the commas separated fields
    /// or appeared inside a quoted field. A quoted field without commas is a single item.
    fn items(&self) -> Vec<&str> {
        self.fields
            .iter()
            .flat_map(|field| {
                if field.quoted && !field.value.contains(',') {
                    vec![field.value.as_str()]
                } else {
                    field.value.split(',').map(str::trim).collect()
                }
            })
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Parses the given input string into a validated `Machine`.
///
/// This is the main entry point for reading machine definitions. Records after the header
/// with fewer than five fields, or with only empty fields, are skipped. Transition records sharing a
/// `(state, symbol)` key accumulate in file order.
///
/// # Arguments
///
/// * `input` - A string slice containing the machine definition.
///
/// # Returns
///
/// * `Ok(Machine)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are syntax errors or missing header records.
/// * `Err(TuringMachineError::ValidationError)` if the machine fails validation.
pub fn parse(input: &str) -> Result<Machine, TuringMachineError> {
    if input.len() > MAX_MACHINE_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Machine definition is {} bytes, the limit is {} bytes",
            input.len(),
            MAX_MACHINE_SIZE
        )));
    }

    let root = TabularParser::parse(Rule::machine, input.trim())
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| {
            TuringMachineError::ValidationError("Empty machine definition".to_string())
        })?;

    let machine = parse_machine(root)?;

    analyze(&machine)?;

    let unreachable = unreachable_states(&machine);
    if !unreachable.is_empty() {
        warn!(machine = %machine.name, states = ?unreachable, "unreachable states");
    }

    for (state, symbol) in unknown_directions(&machine) {
        warn!(machine = %machine.name, %state, %symbol, "transition has an invalid direction");
    }

    Ok(machine)
}

/// Builds a `Machine` from the top-level `Pair<Rule::machine>`.
fn parse_machine(pair: Pair<Rule>) -> Result<Machine, TuringMachineError> {
    let span = pair.as_span();
    let mut records = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::record)
        .map(parse_record);

    let mut header = |section: &str| {
        records
            .next()
            .ok_or_else(|| parse_error(&format!("Missing {section} record"), span))
    };

    let name = required_first(header("machine name")?, "machine name")?;
    let states = header("states")?;
    let input_alphabet = header("input alphabet")?;
    let tape_alphabet = header("tape alphabet")?;
    let start_state = required_first(header("start state")?, "start state")?;
    let accept_state = required_first(header("accept state")?, "accept state")?;
    let reject_state = required_first(header("reject state")?, "reject state")?;

    let mut machine = Machine::new(name);
    machine.states = states.items().into_iter().map(String::from).collect();
    machine.input_alphabet = parse_alphabet(&input_alphabet)?;
    machine.tape_alphabet = parse_alphabet(&tape_alphabet)?;
    machine.start_state = start_state;
    machine.accept_state = accept_state;
    machine.reject_state = reject_state;

    for record in records {
        match record.fields.as_slice() {
            _ if record.is_blank() => debug!(
                line = record.span.start_pos().line_col().0,
                "skipping blank record"
            ),
            [state, read, next_state, write, direction, ..] => {
                let read = parse_symbol(&read.value, record.span)?;
                let write = parse_symbol(&write.value, record.span)?;

                machine.add_transition(
                    state.value.as_str(),
                    read,
                    Transition::new(
                        next_state.value.as_str(),
                        write,
                        Direction::from_token(&direction.value),
                    ),
                );
            }
            _ => debug!(
                line = record.span.start_pos().line_col().0,
                "skipping short record"
            ),
        }
    }

    Ok(machine)
}

/// Converts a `Pair<Rule::record>` into a `Record` of field values.
fn parse_record(pair: Pair<Rule>) -> Record {
    let span = pair.as_span();
    let fields = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::field)
        .map(parse_field)
        .collect();

    Record { span, fields }
}

/// Extracts the value of a `Pair<Rule::field>`, unescaping doubled quotes in quoted fields.
fn parse_field(pair: Pair<Rule>) -> Field {
    match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted => Field {
            value: inner.as_str().replace("\"\"", "\""),
            quoted: true,
        },
        Some(inner) => Field {
            value: inner.as_str().trim().to_string(),
            quoted: false,
        },
        None => Field {
            value: String::new(),
            quoted: false,
        },
    }
}

/// Parses the alphabet declared by a header record.
fn parse_alphabet(record: &Record) -> Result<HashSet<char>, TuringMachineError> {
    record
        .items()
        .into_iter()
        .map(|item| parse_symbol(item, record.span))
        .collect()
}

/// Parses a tape symbol, which must be exactly one character.
fn parse_symbol(input: &str, span: Span) -> Result<char, TuringMachineError> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(parse_error(
            &format!("Symbol must be a single character, found '{input}'"),
            span,
        )),
    }
}

/// Returns the first field of a header record, failing if the record is blank.
fn required_first(record: Record, section: &str) -> Result<String, TuringMachineError> {
    record
        .first()
        .map(String::from)
        .ok_or_else(|| parse_error(&format!("Empty {section} record"), record.span))
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
