use std::collections::BTreeSet;
use std::fmt;

pub const MATCH_CONFIDENCE: f32 = 0.8;
pub const UNCERTAIN_CONFIDENCE: f32 = 0.3;

/// Component kinds a query can ask for. Declaration order is the catalog
/// order used to break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentCategory {
    Navbar,
    Hero,
    Pricing,
    Testimonial,
    Form,
    Button,
    Card,
    Animation,
    Responsive,
}

impl IntentCategory {
    pub const CATALOG: [IntentCategory; 9] = [
        Self::Navbar,
        Self::Hero,
        Self::Pricing,
        Self::Testimonial,
        Self::Form,
        Self::Button,
        Self::Card,
        Self::Animation,
        Self::Responsive,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Navbar => &["nav", "navbar", "menu", "header", "navigation"],
            Self::Hero => &["hero", "landing", "banner", "header section", "main section"],
            Self::Pricing => &["price", "pricing", "plan", "subscription"],
            Self::Testimonial => &["testimonial", "review", "customer", "feedback"],
            Self::Form => &["form", "contact", "signup", "login"],
            Self::Button => &["button", "cta", "call to action"],
            Self::Card => &["card", "product", "feature"],
            Self::Animation => &["animate", "animation", "motion", "transition"],
            Self::Responsive => &["responsive", "mobile", "tablet", "adaptive"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navbar => "navbar",
            Self::Hero => "hero",
            Self::Pricing => "pricing",
            Self::Testimonial => "testimonial",
            Self::Form => "form",
            Self::Button => "button",
            Self::Card => "card",
            Self::Animation => "animation",
            Self::Responsive => "responsive",
        }
    }

    fn matches(self, lowered: &str) -> bool {
        self.keywords()
            .iter()
            .any(|keyword| lowered.contains(keyword))
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstantReply {
    pub response: &'static str,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResult {
    CategoryMatch {
        category: IntentCategory,
        confidence: f32,
    },
    InstantReply(InstantReply),
    Uncertain {
        confidence: f32,
    },
}

impl ClassificationResult {
    /// Instant replies carry no confidence; they bypass the request path.
    pub fn confidence(&self) -> Option<f32> {
        match self {
            Self::CategoryMatch { confidence, .. } | Self::Uncertain { confidence } => {
                Some(*confidence)
            }
            Self::InstantReply(_) => None,
        }
    }

    pub fn category(&self) -> Option<IntentCategory> {
        match self {
            Self::CategoryMatch { category, .. } => Some(*category),
            _ => None,
        }
    }
}

const HELP_TRIGGERS: &[&str] = &["help", "how"];
const EXAMPLE_TRIGGERS: &[&str] = &["example", "examples", "sample", "samples"];

pub const HELP_REPLY: InstantReply = InstantReply {
    response: "I'm ready to generate production-ready components! Ask me to create navbars, hero sections, pricing tables, or attach your project files for analysis.",
    suggestion: "Try: 'Create responsive navbar' or attach your project files!",
};

pub const EXAMPLES_REPLY: InstantReply = InstantReply {
    response: "Here are popular components I can create:\n• Responsive Navbar\n• Hero Section\n• Pricing Cards\n• Testimonial Carousel\n• Contact Forms",
    suggestion: "Pick one or describe your component!",
};

pub fn classify(text: &str) -> ClassificationResult {
    let lowered = text.to_lowercase();
    let tokens = token_set(&lowered);
    let has_any = |words: &[&str]| words.iter().any(|word| tokens.contains(word));

    if has_any(HELP_TRIGGERS) {
        return ClassificationResult::InstantReply(HELP_REPLY);
    }
    if has_any(EXAMPLE_TRIGGERS) {
        return ClassificationResult::InstantReply(EXAMPLES_REPLY);
    }

    IntentCategory::CATALOG
        .into_iter()
        .find(|category| category.matches(&lowered))
        .map_or(
            ClassificationResult::Uncertain {
                confidence: UNCERTAIN_CONFIDENCE,
            },
            |category| ClassificationResult::CategoryMatch {
                category,
                confidence: MATCH_CONFIDENCE,
            },
        )
}

fn token_set(text: &str) -> BTreeSet<&str> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}
