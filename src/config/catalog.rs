//! Known guest operating systems

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Linux,
    Windows,
    Bsd,
    Other,
}

impl OsType {
    pub const ALL: [OsType; 4] = [OsType::Linux, OsType::Windows, OsType::Bsd, OsType::Other];

    /// Label stored in the `OSType` field
    pub fn label(self) -> &'static str {
        match self {
            OsType::Linux => "GNU/Linux",
            OsType::Windows => "Microsoft Windows",
            OsType::Bsd => "BSD",
            OsType::Other => "Other",
        }
    }

    pub fn versions(self) -> &'static [&'static str] {
        match self {
            OsType::Linux => &[
                "Debian", "Ubuntu", "Fedora", "OpenSuse", "Mageia", "Gentoo", "Arch Linux", "Linux",
            ],
            OsType::Windows => &[
                "Microsoft 95",
                "Microsoft 98",
                "Microsoft 2000",
                "Microsoft XP",
                "Microsoft Vista",
                "Microsoft 7",
                "Microsoft 8",
                "Microsoft 10",
            ],
            OsType::Bsd => &["FreeBSD", "OpenBSD", "NetBSD"],
            OsType::Other => &["Debian GNU Hurd", "Arch Hurd", "Redox", "ReactOS"],
        }
    }

    pub fn default_version(self) -> &'static str {
        self.versions()[0]
    }

    /// Case-insensitive lookup of a version; returns the canonical spelling
    pub fn find_version(self, version: &str) -> Option<&'static str> {
        self.versions()
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(version))
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "linux" | "gnu/linux" => Ok(OsType::Linux),
            "windows" | "microsoft windows" => Ok(OsType::Windows),
            "bsd" => Ok(OsType::Bsd),
            "other" => Ok(OsType::Other),
            _ => Err(format!(
                "Unknown OS type '{s}' (expected linux, windows, bsd or other)"
            )),
        }
    }
}
