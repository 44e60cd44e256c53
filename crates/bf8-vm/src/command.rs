use std::fmt;

/// One of the eight bf8 commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Inc,
    Dec,
    Left,
    Right,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Inc,
        Command::Dec,
        Command::Left,
        Command::Right,
        Command::Output,
        Command::Input,
        Command::LoopStart,
        Command::LoopEnd,
    ];

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'+' => Some(Command::Inc),
            b'-' => Some(Command::Dec),
            b'<' => Some(Command::Left),
            b'>' => Some(Command::Right),
            b'.' => Some(Command::Output),
            b',' => Some(Command::Input),
            b'[' => Some(Command::LoopStart),
            b']' => Some(Command::LoopEnd),
            _ => None,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        if c.is_ascii() {
            Self::from_byte(c as u8)
        } else {
            None
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Command::Inc => b'+',
            Command::Dec => b'-',
            Command::Left => b'<',
            Command::Right => b'>',
            Command::Output => b'.',
            Command::Input => b',',
            Command::LoopStart => b'[',
            Command::LoopEnd => b']',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Contribution to the structural nesting depth: `[` opens, `]` closes.
    pub fn bracket_delta(self) -> i64 {
        match self {
            Command::LoopStart => 1,
            Command::LoopEnd => -1,
            _ => 0,
        }
    }

    /// True for the pairs that undo each other when adjacent (`+-`, `-+`, `<>`, `><`).
    pub fn cancels(self, next: Command) -> bool {
        matches!(
            (self, next),
            (Command::Inc, Command::Dec)
                | (Command::Dec, Command::Inc)
                | (Command::Left, Command::Right)
                | (Command::Right, Command::Left)
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Drops every character that is not one of the eight commands.
pub fn filter_commands(text: &str) -> Vec<Command> {
    text.bytes().filter_map(Command::from_byte).collect()
}

pub fn render(commands: &[Command]) -> String {
    commands.iter().map(|c| c.as_char()).collect()
}
