//! The quiz model.
//!
//! A [`Quiz`] is one of three kinds. Each carries a [`QuizId`] derived only
//! from the fields that define what is being asked, so two structurally
//! identical quizzes built from different blocks share an id and collapse
//! into one graph node. Annotation fields (translation, lede, part of
//! speech) never take part in identity.

pub mod factory;

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use serde::Serialize;
use serde_json::json;

use crate::furigana::Furigana;

/// Language code → text.
pub type Translation = BTreeMap<String, String>;

/// Content-derived identity of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuizId(String);

impl QuizId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for QuizId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for QuizId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    Card,
    Cloze,
    Match,
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizKind::Card => f.write_str("card"),
            QuizKind::Cloze => f.write_str("cloze"),
            QuizKind::Match => f.write_str("match"),
        }
    }
}

/// Fields shared by every quiz kind that do not affect identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub translation: Option<Translation>,
    pub lede: Option<Vec<Furigana>>,
}

impl Annotations {
    /// Field-wise merge: whatever `incoming` has replaces ours.
    fn absorb(&mut self, incoming: Annotations) {
        if incoming.translation.is_some() {
            self.translation = incoming.translation;
        }
        if incoming.lede.is_some() {
            self.lede = incoming.lede;
        }
    }
}

/// A flashcard. `inverted` cards show the responses and ask for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: QuizId,
    prompt: String,
    responses: Vec<String>,
    passive: bool,
    pub inverted: bool,
    pub part_of_speech: Option<Vec<String>>,
    pub annotations: Annotations,
}

impl Card {
    pub fn new(prompt: impl Into<String>, responses: Vec<String>, passive: bool, inverted: bool) -> Self {
        let prompt = prompt.into();
        let id = QuizId(
            json!({ "prompt": prompt, "responses": responses, "passive": passive }).to_string(),
        );
        Card {
            id,
            prompt,
            responses,
            passive,
            inverted,
            part_of_speech: None,
            annotations: Annotations::default(),
        }
    }

    pub fn id(&self) -> &QuizId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    fn absorb(&mut self, incoming: Card) {
        self.inverted = incoming.inverted;
        if incoming.part_of_speech.is_some() {
            self.part_of_speech = incoming.part_of_speech;
        }
        self.annotations.absorb(incoming.annotations);
    }
}

/// One piece of a cloze sentence. Serializes as a string or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ClozeContext {
    Text(String),
    Blank,
}

/// Which rule produced a cloze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClozeSubkind {
    /// A `@fill` bullet: a blank the header sentence is quizzed on directly.
    Fill,
    /// Vocabulary blank with no hint.
    SeeNothing,
    /// Vocabulary blank hinted with the vocabulary prompt.
    SeePrompt,
    /// Vocabulary blank hinted with the vocabulary responses.
    SeeResponse,
}

/// A fill-in-the-blank quiz.
///
/// `contexts` holds one [`ClozeContext::Blank`] per entry of `clozes`, in
/// order; each entry of `clozes` lists every acceptable answer for that
/// blank. `prompts`, when present, has one hint per blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cloze {
    id: QuizId,
    contexts: Vec<ClozeContext>,
    clozes: Vec<Vec<String>>,
    prompts: Option<Vec<String>>,
    pub subkind: ClozeSubkind,
    pub annotations: Annotations,
}

impl Cloze {
    pub fn new(
        contexts: Vec<ClozeContext>,
        clozes: Vec<Vec<String>>,
        prompts: Option<Vec<String>>,
        subkind: ClozeSubkind,
    ) -> Self {
        let id = QuizId(
            json!({ "contexts": contexts, "clozes": clozes, "prompts": prompts }).to_string(),
        );
        Cloze {
            id,
            contexts,
            clozes,
            prompts,
            subkind,
            annotations: Annotations::default(),
        }
    }

    pub fn id(&self) -> &QuizId {
        &self.id
    }

    pub fn contexts(&self) -> &[ClozeContext] {
        &self.contexts
    }

    pub fn clozes(&self) -> &[Vec<String>] {
        &self.clozes
    }

    pub fn prompts(&self) -> Option<&[String]> {
        self.prompts.as_deref()
    }

    fn absorb(&mut self, incoming: Cloze) {
        self.subkind = incoming.subkind;
        self.annotations.absorb(incoming.annotations);
    }
}

/// One reading/translation pair of a matching quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchPair {
    pub text: Vec<Furigana>,
    pub translation: Translation,
}

/// A matching quiz over the vocabulary of one sentence. Its lede is part of
/// its identity, so annotations are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    id: QuizId,
    pairs: Vec<MatchPair>,
    annotations: Annotations,
}

impl Match {
    pub fn new(pairs: Vec<MatchPair>, annotations: Annotations) -> Self {
        let id = QuizId(json!({ "lede": annotations.lede, "pairs": pairs }).to_string());
        Match {
            id,
            pairs,
            annotations,
        }
    }

    pub fn id(&self) -> &QuizId {
        &self.id
    }

    pub fn pairs(&self) -> &[MatchPair] {
        &self.pairs
    }

    fn absorb(&mut self, incoming: Match) {
        self.annotations.absorb(incoming.annotations);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quiz {
    Card(Card),
    Cloze(Cloze),
    Match(Match),
}

impl Quiz {
    pub fn id(&self) -> &QuizId {
        match self {
            Quiz::Card(card) => card.id(),
            Quiz::Cloze(cloze) => cloze.id(),
            Quiz::Match(m) => m.id(),
        }
    }

    pub fn kind(&self) -> QuizKind {
        match self {
            Quiz::Card(_) => QuizKind::Card,
            Quiz::Cloze(_) => QuizKind::Cloze,
            Quiz::Match(_) => QuizKind::Match,
        }
    }

    pub fn annotations(&self) -> &Annotations {
        match self {
            Quiz::Card(card) => &card.annotations,
            Quiz::Cloze(cloze) => &cloze.annotations,
            Quiz::Match(m) => &m.annotations,
        }
    }

    pub fn as_card(&self) -> Option<&Card> {
        match self {
            Quiz::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn as_cloze(&self) -> Option<&Cloze> {
        match self {
            Quiz::Cloze(cloze) => Some(cloze),
            _ => None,
        }
    }

    pub fn as_match(&self) -> Option<&Match> {
        match self {
            Quiz::Match(m) => Some(m),
            _ => None,
        }
    }

    /// Merge `incoming` (same id) into `self`: every optional field that
    /// `incoming` sets replaces ours, everything else is kept.
    pub fn absorb(&mut self, incoming: Quiz) {
        match (self, incoming) {
            (Quiz::Card(existing), Quiz::Card(incoming)) => existing.absorb(incoming),
            (Quiz::Cloze(existing), Quiz::Cloze(incoming)) => existing.absorb(incoming),
            (Quiz::Match(existing), Quiz::Match(incoming)) => existing.absorb(incoming),
            (existing, incoming) => *existing = incoming,
        }
    }
}

impl From<Card> for Quiz {
    fn from(card: Card) -> Self {
        Quiz::Card(card)
    }
}

impl From<Cloze> for Quiz {
    fn from(cloze: Cloze) -> Self {
        Quiz::Cloze(cloze)
    }
}

impl From<Match> for Quiz {
    fn from(m: Match) -> Self {
        Quiz::Match(m)
    }
}
