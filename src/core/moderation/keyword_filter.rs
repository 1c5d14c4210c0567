// Local keyword fallback used when the remote classifier can't answer.
//
// This is a blunt substring match on the lowercased text. Short terms such as
// "die" or "war" also match inside unrelated words ("diet", "software").

/// Terms that mark a message as unsafe when the classifier is unavailable.
pub const BANNED_TERMS: &[&str] = &[
    // Violence / threats
    "kill", "murder", "bomb", "shoot", "stab", "hang", "terror", "attack", "destroy", "suicide",
    "die", "death", "hurt", "fight", "explode",
    // Hate / harassment
    "hate", "racist", "slur", "nazi", "slave", "stupid", "idiot", "fool", "retard", "bitch",
    "bastard", "ugly", "pig", "moron",
    // Drugs / weapons
    "cocaine", "heroin", "weed", "marijuana", "meth", "drug", "smuggle", "gun", "weapon", "knife",
    "shooting",
    // Extremism
    "isis", "terrorist", "extremist", "kill all", "massacre", "war",
    // Self-harm
    "i want to die", "kill myself", "no reason to live", "cut myself",
];

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    terms: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Returns the first banned term found in `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn is_safe(&self, text: &str) -> bool {
        self.first_match(text).is_none()
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(BANNED_TERMS)
    }
}
