pub mod reading;
pub mod session;
pub mod settings;

use std::path::PathBuf;
use std::str::FromStr;

use crate::controller::{EventOutcome, PlaybackController};
use crate::engine::{PlaybackEvent, SpeechEngine, VoiceGender};

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Prepare(Option<String>),
    Text(String),
    Name(String),
    Start,
    Toggle,
    Stop,
    Previous,
    Next,
    SentenceStart,
    SentenceEnd,
    Jump(usize),
    Repeat,
    Reset,
    Rate(f32),
    Voice(Option<String>),
    Gender(Option<VoiceGender>),
    Voices,
    Export,
    ExportText,
    Import(PathBuf),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let arg = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", verb, what))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "prepare" => Command::Prepare((!rest.is_empty()).then(|| rest.to_string())),
            "text" => Command::Text(rest.to_string()),
            "name" => Command::Name(rest.to_string()),
            "start" => Command::Start,
            "toggle" | "p" | "play" | "pause" => Command::Toggle,
            "stop" | "s" => Command::Stop,
            "prev" | "previous" | "b" => Command::Previous,
            "next" | "n" => Command::Next,
            "sentence-start" | "ss" => Command::SentenceStart,
            "sentence-end" | "se" => Command::SentenceEnd,
            "jump" | "j" => {
                let position = arg("a word position")?;
                let position = position
                    .parse::<usize>()
                    .map_err(|_| format!("Not a word position: {}", position))?;
                Command::Jump(position)
            }
            "repeat" | "r" => Command::Repeat,
            "reset" => Command::Reset,
            "rate" => {
                let rate = arg("a rate")?;
                let rate = rate.parse::<f32>().map_err(|_| format!("Not a rate: {}", rate))?;
                Command::Rate(rate)
            }
            "voice" => match arg("a voice id or 'default'")?.as_str() {
                "default" => Command::Voice(None),
                id => Command::Voice(Some(id.to_string())),
            },
            "gender" => match arg("'female', 'male' or 'any'")?.to_ascii_lowercase().as_str() {
                "female" | "f" => Command::Gender(Some(VoiceGender::Female)),
                "male" | "m" => Command::Gender(Some(VoiceGender::Male)),
                "any" => Command::Gender(None),
                other => return Err(format!("Not a voice gender: {}", other)),
            },
            "voices" => Command::Voices,
            "export" => Command::Export,
            "export-text" => Command::ExportText,
            "import" => Command::Import(PathBuf::from(arg("a file path")?)),
            "status" | "?" => Command::Status,
            "help" | "h" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{}', try 'help'", other)),
        };
        Ok(command)
    }
}

pub enum Reply {
    Message(String),
    Silent,
    Quit,
}

/// Controller plus the bits of application context commands need
pub struct Reader<E> {
    pub controller: PlaybackController<E>,
    pub settings_path: Option<PathBuf>,
}

impl<E: SpeechEngine> Reader<E> {
    pub fn new(controller: PlaybackController<E>, settings_path: Option<PathBuf>) -> Self {
        Self { controller, settings_path }
    }
}

pub fn execute<E: SpeechEngine>(reader: &mut Reader<E>, command: Command) -> Result<Reply, String> {
    match command {
        Command::Prepare(text) => reading::prepare(reader, text),
        Command::Text(text) => reading::set_text(reader, text),
        Command::Name(name) => session::set_name(reader, name),
        Command::Start => reading::start(reader),
        Command::Toggle => reading::toggle(reader),
        Command::Stop => reading::stop(reader),
        Command::Previous => reading::previous(reader),
        Command::Next => reading::next(reader),
        Command::SentenceStart => reading::sentence_start(reader),
        Command::SentenceEnd => reading::sentence_end(reader),
        Command::Jump(position) => reading::jump(reader, position),
        Command::Repeat => reading::repeat(reader),
        Command::Reset => reading::reset(reader),
        Command::Rate(rate) => settings::set_rate(reader, rate),
        Command::Voice(id) => settings::set_voice(reader, id),
        Command::Gender(gender) => settings::set_gender(reader, gender),
        Command::Voices => settings::list_voices(reader),
        Command::Export => session::export(reader),
        Command::ExportText => session::export_text(reader),
        Command::Import(path) => session::import(reader, &path),
        Command::Status => reading::status(reader),
        Command::Help => Ok(Reply::Message(HELP.to_string())),
        Command::Quit => Ok(Reply::Quit),
    }
}

/// Feed an engine event to the controller and describe what the user should see
pub fn handle_event<E: SpeechEngine>(
    reader: &mut Reader<E>,
    event: PlaybackEvent,
) -> Option<String> {
    let controller = &mut reader.controller;
    match controller.handle_event(event) {
        Ok(EventOutcome::Advanced(index)) => Some(reading::word_line(controller, index)),
        Ok(EventOutcome::Done) => Some("Done.".to_string()),
        Ok(_) => None,
        Err(e) => Some(format!("Error: {}", e)),
    }
}

pub const HELP: &str = "\
Commands:
  text <words...>      replace the text (clears preparation)
  prepare [words...]   tokenize the text (optionally replacing it first)
  name <label>         name the document
  start                read from the first word
  toggle | p           play / pause / resume
  stop | s             stop and return to the start
  prev | next          step one word back / forward
  ss | se              jump to sentence start / end
  jump <n>             jump to word n
  repeat | r           speak the current word again
  reset                back to the first word
  rate <0.5-2.0>       speech rate
  voice <id|default>   choose a voice
  gender <f|m|any>     preferred voice gender
  voices               list voices
  export | export-text save <name>_quasselo.json / <name>.txt
  import <path>        load a session file
  status | help | quit";
