extern crate pest;

use pest::error::Error;
use pest::error::ErrorVariant;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::result;

#[derive(Parser)]
#[grammar = "zones/preprocessor.pest"]
pub struct ZonePreprocessor;

type Result<T> = result::Result<T, Error<Rule>>;

fn custom_error(pair: &Pair<Rule>, message: &str) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pair.as_span(),
    )
}

fn parse_tokens(pair: Pair<Rule>) -> Result<String> {
    assert_eq!(pair.as_rule(), Rule::tokens);

    let mut result = String::new();
    let mut opens = 0;
    let mut last_open = None;

    for pair in pair.into_inner() {
        match pair.as_rule() {
            Rule::open => {
                if opens > 0 {
                    return Err(custom_error(&pair, "nested parentheses are not allowed"));
                }
                opens += 1;
                result.push_str(pair.as_str());
                last_open = Some(pair);
            }
            Rule::close => {
                if opens == 0 {
                    return Err(custom_error(&pair, "unbalanced ')'"));
                }
                opens -= 1;
                result.push_str(pair.as_str());
            }
            Rule::newline | Rule::comment => {
                if opens > 0 {
                    // Replace newlines or comments with spaces
                    for _i in 0..pair.as_str().len() {
                        result.push(' ');
                    }
                } else {
                    result.push_str(pair.as_str());
                }
            }
            _ => result.push_str(pair.as_str()),
        }
    }

    if opens > 0 {
        if let Some(open) = last_open {
            return Err(custom_error(&open, "unbalanced '('"));
        }
    }

    Ok(result)
}

/// Preprocess the input to handle braces. Specifically
/// ( and ) allow a record to span multiple lines, so this
/// replaces new lines with spaces when they are within braces.
pub(crate) fn preprocess(input: &str) -> Result<String> {
    let mut result = String::new();

    let file = match ZonePreprocessor::parse(Rule::file, input)?.next() {
        Some(file) => file,
        None => return Ok(result),
    };

    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::tokens => result.push_str(&parse_tokens(pair)?),
            Rule::EOI => (), // Nothing
            _ => unreachable!("Unexpected rule: {:?}", pair.as_rule()),
        }
    }
    Ok(result)
}
