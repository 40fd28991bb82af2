/// How a free-text ballot name was tagged.
#[derive(Debug, Clone, PartialEq)]
pub enum NameTag {
    /// A person's name, decomposed into parts.
    Person(PersonName),
    /// A recognizable non-person entity (party, committee, etc.).
    NonPerson,
    /// Could not be tagged with any confidence.
    Unparseable,
}

/// Structured parts of a person's name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonName {
    pub given: Option<String>,
    pub family: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
}

/// Injected name-parsing capability. Callers branch on the returned tag
/// rather than catching errors; a parser never fails a row.
pub trait NameParser: Send + Sync {
    fn tag(&self, text: &str) -> NameTag;
}

const GENERATIONAL_SUFFIXES: [&str; 6] = ["jr", "sr", "ii", "iii", "iv", "v"];

const ORGANIZATION_KEYWORDS: [&str; 8] = [
    "party",
    "committee",
    "commission",
    "association",
    "organization",
    "coalition",
    "council",
    "board",
];

/// Token-based name tagger. Good enough to drive the transform end to end;
/// swap in a smarter implementation behind the same trait if needed.
pub struct HeuristicNameParser;

impl HeuristicNameParser {
    pub fn new() -> Self {
        Self
    }

    /// Pull a quoted nickname ("Bobby") out of the text, returning the
    /// remaining text and the nickname if one was present.
    fn split_nickname(text: &str) -> (String, Option<String>) {
        if let Some(start) = text.find('"') {
            if let Some(len) = text[start + 1..].find('"') {
                let nickname = text[start + 1..start + 1 + len].to_string();
                let mut rest = String::with_capacity(text.len());
                rest.push_str(&text[..start]);
                rest.push_str(&text[start + len + 2..]);
                return (rest, Some(nickname));
            }
        }
        (text.to_string(), None)
    }

    fn clean_token(token: &str) -> String {
        token
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
            .to_string()
    }
}

impl Default for HeuristicNameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NameParser for HeuristicNameParser {
    fn tag(&self, text: &str) -> NameTag {
        let (rest, nickname) = Self::split_nickname(text.trim());

        let mut tokens: Vec<String> = rest
            .split_whitespace()
            .map(Self::clean_token)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens
            .iter()
            .any(|t| ORGANIZATION_KEYWORDS.contains(&t.to_lowercase().as_str()))
        {
            return NameTag::NonPerson;
        }

        let has_suffix = tokens
            .last()
            .map(|last| GENERATIONAL_SUFFIXES.contains(&last.to_lowercase().as_str()))
            .unwrap_or(false);
        let suffix = if has_suffix { tokens.pop() } else { None };

        if tokens.len() < 2 {
            return NameTag::Unparseable;
        }

        let family = tokens.pop();
        let given = Some(tokens.remove(0));

        NameTag::Person(PersonName {
            given,
            family,
            suffix,
            nickname,
        })
    }
}
