use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::models::reservation::VisitType;
use crate::services::time_slots::{parse_date, parse_slot};
use crate::services::validation::Field;

pub const HELP: &str = "\
commands:
  visit first|revisit    choose the visit type
  menu <id>              choose a treatment menu
  date YYYY-MM-DD        choose a date
  time HH:MM             choose a time slot
  name <text>            set your name
  phone <text>           set your phone number
  symptom <text>         describe your symptoms (optional)
  memo <text>            anything else we should know (optional)
  check <field>          validate one field now (name, phone, symptomNote, memo, ...)
  next | back | edit     move between steps
  submit | retry         send the reservation
  show                   print the current step
  help | quit";

// One line of terminal input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Visit(VisitType),
    Menu(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Name(String),
    Phone(String),
    Symptom(String),
    Memo(String),
    Check(Field),
    Next,
    Back,
    Edit,
    Submit,
    Retry,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

fn required<'a>(name: &'static str, rest: &'a str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(name))
    } else {
        Ok(rest)
    }
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "visit" => required("visit", rest)?
            .parse()
            .map(Command::Visit)
            .map_err(CommandError::InvalidArgument),
        "menu" => Ok(Command::Menu(required("menu", rest)?.to_string())),
        "date" => parse_date(required("date", rest)?)
            .map(Command::Date)
            .map_err(CommandError::InvalidArgument),
        "time" => parse_slot(required("time", rest)?)
            .map(Command::Time)
            .map_err(CommandError::InvalidArgument),
        // Text fields may be cleared by giving no argument
        "name" => Ok(Command::Name(rest.to_string())),
        "phone" => Ok(Command::Phone(rest.to_string())),
        "symptom" => Ok(Command::Symptom(rest.to_string())),
        "memo" => Ok(Command::Memo(rest.to_string())),
        "check" => required("check", rest)?
            .parse()
            .map(Command::Check)
            .map_err(CommandError::InvalidArgument),
        "next" => Ok(Command::Next),
        "back" => Ok(Command::Back),
        "edit" => Ok(Command::Edit),
        "submit" | "confirm" => Ok(Command::Submit),
        "retry" => Ok(Command::Retry),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
