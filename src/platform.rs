/// Host operating system family. Launch commands, quoting and path
/// separators are all chosen per platform, so functions take it explicitly
/// instead of reading `cfg!` inline; tests can then cover every platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    pub fn separator(self) -> char {
        match self {
            Self::Windows => '\\',
            Self::MacOs | Self::Linux => '/',
        }
    }

    pub fn is_windows(self) -> bool {
        self == Self::Windows
    }
}
