use std::fmt;
use std::str::FromStr;

/// Consequence labels that take part in resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consequence {
    Stopgain,
    Stoploss,
    Nonsynonymous,
    Synonymous,
}

impl Consequence {
    /// Match an annotation label exactly; anything else is `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "stopgain" => Some(Self::Stopgain),
            "stoploss" => Some(Self::Stoploss),
            "nonsynonymous SNV" => Some(Self::Nonsynonymous),
            "synonymous SNV" => Some(Self::Synonymous),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Stopgain => 1,
            Self::Stoploss => 1 << 1,
            Self::Nonsynonymous => 1 << 2,
            Self::Synonymous => 1 << 3,
        }
    }
}

/// Set of consequences seen for one gene in one sample.
///
/// Only membership is recorded, so the resolved category cannot depend on
/// the order or multiplicity of observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedConsequences(u8);

impl ObservedConsequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, consequence: Consequence) {
        self.0 |= consequence.bit();
    }

    /// Record a raw label. Unrecognised labels are ignored.
    pub fn observe(&mut self, label: &str) {
        if let Some(consequence) = Consequence::from_label(label) {
            self.insert(consequence);
        }
    }

    pub fn contains(&self, consequence: Consequence) -> bool {
        self.0 & consequence.bit() != 0
    }

    pub fn resolve(&self, mode: Mode) -> Category {
        match mode {
            Mode::Binary => Category::Binary(self.resolve_binary()),
            Mode::Multiple => Category::Multiple(self.resolve_multiple()),
        }
    }

    fn resolve_binary(&self) -> BinaryCategory {
        let damaging = [
            Consequence::Stopgain,
            Consequence::Stoploss,
            Consequence::Nonsynonymous,
        ];
        if damaging.iter().any(|&c| self.contains(c)) {
            BinaryCategory::Mutated
        } else {
            BinaryCategory::Wildtype
        }
    }

    // First match wins
    fn resolve_multiple(&self) -> MultipleCategory {
        if self.contains(Consequence::Stopgain) {
            MultipleCategory::Nonsense
        } else if self.contains(Consequence::Stoploss) {
            MultipleCategory::Nonstop
        } else if self.contains(Consequence::Nonsynonymous) {
            MultipleCategory::Missense
        } else if self.contains(Consequence::Synonymous) {
            MultipleCategory::Silent
        } else {
            MultipleCategory::Wildtype
        }
    }
}

impl<'a> Extend<&'a str> for ObservedConsequences {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, labels: I) {
        for label in labels {
            self.observe(label);
        }
    }
}

impl<'a> FromIterator<&'a str> for ObservedConsequences {
    fn from_iter<I: IntoIterator<Item = &'a str>>(labels: I) -> Self {
        let mut observed = Self::new();
        observed.extend(labels);
        observed
    }
}

/// Resolve a collection of raw labels to a single category
pub fn resolve<'a>(labels: impl IntoIterator<Item = &'a str>, mode: Mode) -> Category {
    labels
        .into_iter()
        .collect::<ObservedConsequences>()
        .resolve(mode)
}

/// Category vocabulary used for the output matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// wildtype or mutated
    #[default]
    Binary,
    /// wildtype, missense, nonsense, nonstop or silent
    Multiple,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Binary => write!(f, "binary"),
            Mode::Multiple => write!(f, "multiple"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryCategory {
    Wildtype,
    Mutated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultipleCategory {
    Wildtype,
    Missense,
    Nonsense,
    Nonstop,
    Silent,
}

/// Resolved mutation state of one gene in one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Binary(BinaryCategory),
    Multiple(MultipleCategory),
}

impl BinaryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wildtype => "wildtype",
            Self::Mutated => "mutated",
        }
    }
}

impl MultipleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wildtype => "wildtype",
            Self::Missense => "missense",
            Self::Nonsense => "nonsense",
            Self::Nonstop => "nonstop",
            Self::Silent => "silent",
        }
    }
}

impl Category {
    pub fn wildtype(mode: Mode) -> Self {
        match mode {
            Mode::Binary => Self::Binary(BinaryCategory::Wildtype),
            Mode::Multiple => Self::Multiple(MultipleCategory::Wildtype),
        }
    }

    pub fn is_wildtype(&self) -> bool {
        matches!(
            self,
            Self::Binary(BinaryCategory::Wildtype) | Self::Multiple(MultipleCategory::Wildtype)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary(c) => c.as_str(),
            Self::Multiple(c) => c.as_str(),
        }
    }

    /// Parse a matrix cell written in either vocabulary
    pub fn parse(value: &str, mode: Mode) -> Option<Self> {
        match mode {
            Mode::Binary => value.parse().ok().map(Self::Binary),
            Mode::Multiple => value.parse().ok().map(Self::Multiple),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mutation category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for BinaryCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "wildtype" => Ok(Self::Wildtype),
            "mutated" => Ok(Self::Mutated),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

impl FromStr for MultipleCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "wildtype" => Ok(Self::Wildtype),
            "missense" => Ok(Self::Missense),
            "nonsense" => Ok(Self::Nonsense),
            "nonstop" => Ok(Self::Nonstop),
            "silent" => Ok(Self::Silent),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}
