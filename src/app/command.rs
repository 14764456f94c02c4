//! The interactive shell's command grammar.

/// The leading word of a shell command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// `help [command]`
    Help,
    /// `exit`
    Exit,
    /// `chrono <set|unset> <define|analyze|all>`
    Chrono,
    /// `define <background|object [name]>`
    Define,
    /// `set <param> <value>`
    Set,
    /// `discard <millis>`
    Discard,
    /// `object <describe|save|load|csv> ...`
    Object,
    /// `model <new|describe|save|load|csv> ...`
    Model,
    /// `info`
    Info,
    /// `list <objects|models>`
    List,
    /// `analyze <object> <model>`
    Analyze,
    /// Anything else.
    Unknown,
}

/// One parsed shell line: the command word plus its arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    kind: CommandKind,
    args: Vec<String>,
}

impl Command {
    /// Parses a line of shell input.
    ///
    /// # Examples
    ///
    /// ```
    /// use lidar_anomaly::app::{Command, CommandKind};
    /// let command = Command::parse("define object my-part");
    /// assert_eq!(CommandKind::Define, command.kind());
    /// assert_eq!(Some("object"), command.arg(0));
    /// assert_eq!(Some("my-part"), command.arg(1));
    /// ```
    pub fn parse(line: &str) -> Command {
        let mut words = line.split_whitespace();
        let kind = match words.next() {
            Some("help") => CommandKind::Help,
            Some("exit") => CommandKind::Exit,
            Some("chrono") => CommandKind::Chrono,
            Some("define") => CommandKind::Define,
            Some("set") => CommandKind::Set,
            Some("discard") => CommandKind::Discard,
            Some("object") => CommandKind::Object,
            Some("model") => CommandKind::Model,
            Some("info") => CommandKind::Info,
            Some("list") => CommandKind::List,
            Some("analyze") => CommandKind::Analyze,
            _ => CommandKind::Unknown,
        };
        Command {
            kind,
            args: words.map(str::to_string).collect(),
        }
    }

    /// Returns the command word.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Returns the nth argument after the command word.
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.args.get(n).map(String::as_str)
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true when the command has no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
