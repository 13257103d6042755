/// Log tags identify the subsystem a message comes from.
///
/// Each tag maps to a `--debug-<key>` flag that enables its debug output.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Hub,
    Connection,
    Webserver,
    Test,
}

impl LogTag {
    /// Key used by `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Hub => "hub",
            LogTag::Connection => "connection",
            LogTag::Webserver => "webserver",
            LogTag::Test => "test",
        }
        .to_string()
    }

    /// Uppercase label without colors (file output)
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }

    /// All tags, used when listing available debug flags
    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Config,
            LogTag::Hub,
            LogTag::Connection,
            LogTag::Webserver,
            LogTag::Test,
        ]
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
